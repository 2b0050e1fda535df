use chrono::NaiveDate;
use serde::Serialize;
use std::ops::Range;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum DiagramKind {
    #[cfg_attr(feature = "cli", value(alias = "barchart", alias = "xychart"))]
    Bar,
    #[cfg_attr(feature = "cli", value(alias = "graph"))]
    Flowchart,
    Gantt,
    Kanban,
    #[cfg_attr(feature = "cli", value(alias = "orgchart"))]
    Org,
    Pie,
    Sequence,
    Swot,
    Timeline,
    #[cfg_attr(feature = "cli", value(alias = "userjourney"))]
    Journey,
}

impl DiagramKind {
    pub fn page_name(self) -> &'static str {
        match self {
            Self::Bar => "Bar Chart",
            Self::Flowchart => "Flowchart",
            Self::Gantt => "Gantt Chart",
            Self::Kanban => "Kanban Board",
            Self::Org => "Org Chart",
            Self::Pie => "Pie Chart",
            Self::Sequence => "Sequence Diagram",
            Self::Swot => "SWOT Analysis",
            Self::Timeline => "Timeline",
            Self::Journey => "Journey Map",
        }
    }

    /// Output path used when none is given on the command line.
    pub fn default_output(self, input: &Path) -> PathBuf {
        match self {
            Self::Bar => PathBuf::from("barchart.drawio"),
            Self::Flowchart => PathBuf::from("flowchart.drawio"),
            Self::Gantt | Self::Kanban => PathBuf::from("output.drawio"),
            Self::Org => PathBuf::from("org_chart.drawio"),
            Self::Pie => PathBuf::from("piechart.drawio"),
            Self::Sequence => {
                let stem = input
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .filter(|stem| *stem != "-")
                    .unwrap_or("sequence");
                input.with_file_name(format!("{stem}_diagram.drawio.xml"))
            }
            Self::Swot => PathBuf::from("swot_pro.drawio"),
            Self::Timeline => PathBuf::from("timeline.drawio"),
            Self::Journey => PathBuf::from("journey.drawio"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Direction {
    #[default]
    TopDown,
    BottomTop,
    LeftRight,
    RightLeft,
}

impl Direction {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_uppercase().as_str() {
            "TD" | "TB" => Some(Self::TopDown),
            "BT" => Some(Self::BottomTop),
            "LR" => Some(Self::LeftRight),
            "RL" => Some(Self::RightLeft),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeShape {
    Rectangle,
    Diamond,
    Ellipse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum EdgeStyle {
    #[default]
    Solid,
    Dashed,
    Thick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ArrowKind {
    None,
    #[default]
    Classic,
    Block,
    Open,
    Cross,
}

#[derive(Debug, Clone, Serialize)]
pub struct FlowNode {
    pub id: String,
    pub label: String,
    pub shape: NodeShape,
}

#[derive(Debug, Clone, Serialize)]
pub struct FlowEdge {
    pub from: String,
    pub to: String,
    pub label: Option<String>,
    pub style: EdgeStyle,
    pub arrow: ArrowKind,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Flowchart {
    pub direction: Direction,
    pub nodes: Vec<FlowNode>,
    pub edges: Vec<FlowEdge>,
}

impl Flowchart {
    pub fn node(&self, id: &str) -> Option<&FlowNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OrgNode {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrgEdge {
    pub parent: String,
    pub child: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct OrgChart {
    pub nodes: Vec<OrgNode>,
    pub edges: Vec<OrgEdge>,
}

impl OrgChart {
    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == id)
    }

    /// Declares a node. A label that still equals the key is replaced by a
    /// later explicit label.
    pub fn ensure_node(&mut self, id: &str, label: Option<&str>) {
        match self.node_index(id) {
            Some(idx) => {
                let node = &mut self.nodes[idx];
                if let Some(label) = label
                    && node.label == node.id
                {
                    node.label = label.to_string();
                }
            }
            None => self.nodes.push(OrgNode {
                id: id.to_string(),
                label: label.unwrap_or(id).to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GanttStatus {
    Done,
    Active,
    Crit,
    Milestone,
}

impl GanttStatus {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "done" => Some(Self::Done),
            "active" => Some(Self::Active),
            "crit" => Some(Self::Crit),
            "milestone" => Some(Self::Milestone),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GanttTask {
    pub id: Option<String>,
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub status: Vec<GanttStatus>,
}

impl GanttTask {
    pub fn duration_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GanttSection {
    pub name: String,
    pub tasks: Vec<GanttTask>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GanttChart {
    pub title: String,
    pub sections: Vec<GanttSection>,
}

impl GanttChart {
    pub fn tasks(&self) -> impl Iterator<Item = &GanttTask> {
        self.sections.iter().flat_map(|s| s.tasks.iter())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TimelinePeriod {
    pub period: String,
    pub events: Vec<String>,
    pub section: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Timeline {
    pub title: String,
    pub sections: Vec<String>,
    pub periods: Vec<TimelinePeriod>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Participant {
    pub id: String,
    pub label: String,
    pub actor: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub from: String,
    pub to: String,
    pub text: String,
    pub arrow: ArrowKind,
    pub dashed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FrameKind {
    Loop,
    Alt,
    Opt,
    Par,
    Critical,
    Break,
}

impl FrameKind {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "loop" => Some(Self::Loop),
            "alt" => Some(Self::Alt),
            "opt" => Some(Self::Opt),
            "par" => Some(Self::Par),
            "critical" => Some(Self::Critical),
            "break" => Some(Self::Break),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Loop => "loop",
            Self::Alt => "alt",
            Self::Opt => "opt",
            Self::Par => "par",
            Self::Critical => "critical",
            Self::Break => "break",
        }
    }
}

/// A frame covers the messages in `messages`. A frame closed before any
/// message was added covers an empty range.
#[derive(Debug, Clone, Serialize)]
pub struct Frame {
    pub kind: FrameKind,
    pub label: String,
    pub messages: Range<usize>,
}

impl Frame {
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum NotePlacement {
    Over(Vec<String>),
    LeftOf(String),
    RightOf(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct Note {
    pub placement: NotePlacement,
    pub text: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SequenceDiagram {
    pub participants: Vec<Participant>,
    pub messages: Vec<Message>,
    pub frames: Vec<Frame>,
    pub notes: Vec<Note>,
}

impl SequenceDiagram {
    pub fn participant_index(&self, id: &str) -> Option<usize> {
        self.participants.iter().position(|p| p.id == id)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PieSlice {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PieChart {
    pub title: String,
    pub show_data: bool,
    pub slices: Vec<PieSlice>,
}

impl PieChart {
    pub fn total(&self) -> f64 {
        self.slices.iter().map(|s| s.value).sum()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BarChart {
    pub title: String,
    pub categories: Vec<String>,
    pub y_title: Option<String>,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct KanbanTask {
    pub id: String,
    pub description: String,
    pub metadata: Vec<(String, String)>,
}

impl KanbanTask {
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct KanbanColumn {
    pub id: String,
    pub title: String,
    pub tasks: Vec<KanbanTask>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Kanban {
    pub columns: Vec<KanbanColumn>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SwotQuadrant {
    pub title: String,
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Swot {
    pub quadrants: [SwotQuadrant; 4],
}

impl Default for Swot {
    fn default() -> Self {
        let quadrant = |title: &str| SwotQuadrant {
            title: title.to_string(),
            items: Vec::new(),
        };
        Self {
            quadrants: [
                quadrant("Strengths"),
                quadrant("Weaknesses"),
                quadrant("Opportunities"),
                quadrant("Threats"),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JourneyTask {
    pub name: String,
    pub score: u8,
    pub actors: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JourneySection {
    pub name: String,
    pub tasks: Vec<JourneyTask>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Journey {
    pub title: Option<String>,
    /// Actors in order of first appearance.
    pub actors: Vec<String>,
    pub sections: Vec<JourneySection>,
}

#[derive(Debug, Clone, Serialize)]
pub enum Diagram {
    Bar(BarChart),
    Flowchart(Flowchart),
    Gantt(GanttChart),
    Kanban(Kanban),
    Org(OrgChart),
    Pie(PieChart),
    Sequence(SequenceDiagram),
    Swot(Swot),
    Timeline(Timeline),
    Journey(Journey),
}

impl Diagram {
    pub fn kind(&self) -> DiagramKind {
        match self {
            Self::Bar(_) => DiagramKind::Bar,
            Self::Flowchart(_) => DiagramKind::Flowchart,
            Self::Gantt(_) => DiagramKind::Gantt,
            Self::Kanban(_) => DiagramKind::Kanban,
            Self::Org(_) => DiagramKind::Org,
            Self::Pie(_) => DiagramKind::Pie,
            Self::Sequence(_) => DiagramKind::Sequence,
            Self::Swot(_) => DiagramKind::Swot,
            Self::Timeline(_) => DiagramKind::Timeline,
            Self::Journey(_) => DiagramKind::Journey,
        }
    }
}
