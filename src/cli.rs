use crate::config::{Config, apply_init_theme, load_config};
use crate::error::ConvertError;
use crate::ir::DiagramKind;
use crate::layout::compute_layout;
use crate::layout_dump::write_layout_dump;
use crate::parser::parse_mermaid;
use crate::render::{render_drawio, write_output};
use anyhow::Result;
use clap::Parser;
use log::{debug, info};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "mmd2drawio", version, about = "Convert Mermaid diagrams into draw.io documents")]
pub struct Args {
    /// Diagram type. Detected from the header line when omitted.
    #[arg(value_enum)]
    pub kind: Option<DiagramKind>,

    /// Input file (.mmd or .md) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,

    /// Output file. Each diagram type has its own default name.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Config JSON file (theme, themeVariables, layout constants)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Also write the computed layout as JSON
    #[arg(long = "dump-layout")]
    pub dump_layout: Option<PathBuf>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long = "log-level", default_value = "warn")]
    pub log_level: String,
}

struct Rendered {
    kind: DiagramKind,
    xml: String,
    layout: crate::layout::Layout,
}

pub fn run() -> Result<()> {
    run_with(&Args::parse())
}

pub fn run_with(args: &Args) -> Result<()> {
    let base_config = load_config(args.config.as_deref())?;

    let (input, is_markdown) = read_input(&args.input)?;
    let diagrams = if is_markdown {
        extract_mermaid_blocks(&input)
    } else {
        vec![input]
    };
    if diagrams.is_empty() {
        return Err(anyhow::anyhow!("No Mermaid diagrams found in input"));
    }

    // Everything is rendered before any file is written.
    let mut rendered = Vec::with_capacity(diagrams.len());
    for diagram in &diagrams {
        let parsed = parse_mermaid(diagram, args.kind).map_err(ConvertError::from)?;
        let mut config = base_config.clone();
        if let Some(init_cfg) = parsed.init_config {
            config = merge_init_config(config, init_cfg);
        }
        let layout = compute_layout(&parsed.diagram, &config.theme, &config.layout);
        let xml = render_drawio(&layout)?;
        rendered.push(Rendered {
            kind: parsed.diagram.kind(),
            xml,
            layout,
        });
    }

    if let [single] = rendered.as_slice() {
        let output = args
            .output
            .clone()
            .unwrap_or_else(|| single.kind.default_output(&args.input));
        write_output(&single.xml, Some(&output))?;
        if let Some(dump) = &args.dump_layout {
            write_layout_dump(dump, &single.layout)?;
        }
        info!(output:? = output, kind:? = single.kind; "diagram written");
        return Ok(());
    }

    let base = args
        .output
        .clone()
        .unwrap_or_else(|| args.input.with_extension("drawio"));
    let outputs = numbered_paths(&base, "drawio", rendered.len());
    let dumps = args
        .dump_layout
        .as_deref()
        .map(|dump| numbered_paths(dump, "json", rendered.len()));
    for (idx, diagram) in rendered.iter().enumerate() {
        write_output(&diagram.xml, Some(&outputs[idx]))?;
        if let Some(dumps) = &dumps {
            write_layout_dump(&dumps[idx], &diagram.layout)?;
        }
        info!(output:? = outputs[idx], kind:? = diagram.kind; "diagram written");
    }
    Ok(())
}

fn read_input(path: &Path) -> Result<(String, bool), ConvertError> {
    if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .map_err(|source| ConvertError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        return Ok((buf, false));
    }
    if !path.exists() {
        return Err(ConvertError::InputNotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path).map_err(|source| ConvertError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let is_md = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|ext| matches!(ext, "md" | "markdown"))
        .unwrap_or(false);
    debug!(path:? = path, markdown = is_md; "input read");
    Ok((content, is_md))
}

fn extract_mermaid_blocks(input: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut in_block = false;
    let mut current = Vec::new();
    let mut fence = String::new();

    for line in input.lines() {
        let trimmed = line.trim();
        if !in_block {
            if let Some(start_fence) = detect_mermaid_fence(trimmed) {
                in_block = true;
                fence = start_fence;
            }
            continue;
        }
        if is_fence_end(trimmed, &fence) {
            in_block = false;
            blocks.push(current.join("\n"));
            current.clear();
            continue;
        }
        current.push(line.to_string());
    }

    blocks
}

fn detect_mermaid_fence(line: &str) -> Option<String> {
    for marker in ["```", "~~~", ":::"] {
        if let Some(rest) = line.strip_prefix(marker) {
            let first = marker.chars().next()?;
            if rest.trim_start_matches(first).trim().starts_with("mermaid") {
                return Some(marker.to_string());
            }
        }
    }
    None
}

fn is_fence_end(line: &str, fence: &str) -> bool {
    line.strip_prefix(fence)
        .is_some_and(|rest| rest.trim().is_empty())
}

/// `out.drawio` becomes `out-1.drawio`, `out-2.drawio`...; a directory gets
/// `diagram-N` files inside it.
fn numbered_paths(base: &Path, ext: &str, count: usize) -> Vec<PathBuf> {
    if base.is_dir() {
        return (1..=count)
            .map(|idx| base.join(format!("diagram-{idx}.{ext}")))
            .collect();
    }
    let stem = base.file_stem().and_then(|s| s.to_str()).unwrap_or("diagram");
    let parent = base.parent().unwrap_or_else(|| Path::new("."));
    (1..=count)
        .map(|idx| parent.join(format!("{stem}-{idx}.{ext}")))
        .collect()
}

fn merge_init_config(mut config: Config, init: serde_json::Value) -> Config {
    apply_init_theme(&mut config, &init);
    config
}
