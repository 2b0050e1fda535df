#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod geometry;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod parser;
pub mod render;
pub mod style;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, LayoutConfig, load_config};
pub use error::{ConvertError, ParseError};
pub use ir::{Diagram, DiagramKind};
pub use layout::{Layout, compute_layout};
pub use parser::{ParseOutput, detect_diagram_kind, parse_mermaid};
pub use render::render_drawio;
pub use theme::Theme;

/// Parses, lays out and serializes one diagram.
pub fn convert(input: &str, kind: Option<DiagramKind>, config: &Config) -> Result<String, ConvertError> {
    let parsed = parse_mermaid(input, kind)?;
    let layout = compute_layout(&parsed.diagram, &config.theme, &config.layout);
    render_drawio(&layout)
}
