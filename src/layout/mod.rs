use crate::config::LayoutConfig;
use crate::geometry::{Bounds, Point};
use crate::ir::{Diagram, DiagramKind};
use crate::style::Style;
use crate::theme::Theme;
use log::{debug, warn};

mod barchart;
mod flowchart;
mod gantt;
mod journey;
mod kanban;
mod orgchart;
mod pie;
mod sequence;
mod swot;
mod timeline;

pub(crate) mod types;

pub use barchart::{axis_step, axis_top};
pub use flowchart::{
    DagreLayouter, GraphLayoutOptions, GraphLayouter, LayoutGraph, LayoutNode, PositionedGraph,
    RankedLayouter,
};
pub use gantt::gantt_date_range;
pub use types::*;

pub fn compute_layout(diagram: &Diagram, theme: &Theme, config: &LayoutConfig) -> Layout {
    let layout = match diagram {
        Diagram::Bar(chart) => barchart::compute_bar_chart_layout(chart, theme, config),
        Diagram::Flowchart(chart) => flowchart::compute_flowchart_layout(chart, theme, config),
        Diagram::Gantt(chart) => gantt::compute_gantt_layout(chart, theme, config),
        Diagram::Kanban(board) => kanban::compute_kanban_layout(board, theme, config),
        Diagram::Org(chart) => orgchart::compute_org_chart_layout(chart, theme, config),
        Diagram::Pie(chart) => pie::compute_pie_layout(chart, theme, config),
        Diagram::Sequence(diagram) => sequence::compute_sequence_layout(diagram, theme, config),
        Diagram::Swot(swot) => swot::compute_swot_layout(swot, theme, config),
        Diagram::Timeline(timeline) => timeline::compute_timeline_layout(timeline, theme, config),
        Diagram::Journey(journey) => journey::compute_journey_layout(journey, theme, config),
    };
    debug!(
        kind:? = layout.kind,
        cells = layout.cells.len(),
        width = layout.width,
        height = layout.height;
        "layout computed"
    );
    layout
}

/// Free-standing text cell with no fill or border.
fn text_style(theme: &Theme) -> Style {
    Style::parse("text;html=1;strokeColor=none;fillColor=none;align=center;verticalAlign=middle;whiteSpace=wrap;rounded=0;")
        .set("fontFamily", &theme.font_family)
}

/// Connector drawn between two fixed points, with no arrow heads.
fn plain_line(id: String, style: Style, from: Point, to: Point) -> EdgeCell {
    EdgeCell::new(id, "", style.set("endArrow", "none")).with_terminal_points(from, to)
}
