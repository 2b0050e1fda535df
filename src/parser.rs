use crate::error::ParseError;
use crate::ir::{
    ArrowKind, BarChart, Diagram, DiagramKind, Direction, EdgeStyle, FlowEdge, FlowNode, Flowchart,
    Frame, FrameKind, GanttChart, GanttSection, GanttStatus, GanttTask, Journey, JourneySection,
    JourneyTask, Kanban, KanbanColumn, KanbanTask, Message, NodeShape, Note, NotePlacement,
    OrgChart, OrgEdge, Participant, PieChart, PieSlice, SequenceDiagram, Swot, Timeline,
    TimelinePeriod,
};
use chrono::{Days, NaiveDate};
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

type Result<T> = std::result::Result<T, ParseError>;

static INIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^%%\{\s*init\s*:\s*(\{.*\})\s*\}%%").unwrap());
static FLOW_HEADER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:graph|flowchart)\b\s*(\S+)?").unwrap());
static FLOW_NODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([A-Za-z0-9_]+)\s*(?:\[([^\]]*)\]|\{([^}]*)\}|\(([^)]*)\))?").unwrap()
});
static FLOW_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(-{2,}>|-\.+->|={2,}>|-{3,})\s*(?:\|([^|]*)\|)?").unwrap());
static ORG_LINK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"-->|---").unwrap());
static ORG_NODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Za-z0-9_]+)\s*[\[\(\{](.*?)[\}\)\]]").unwrap());
static ORG_BARE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([A-Za-z0-9_]+)").unwrap());
static EDGE_LABEL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\|[^|]*\|").unwrap());
static DURATION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)\s*([dw])$").unwrap());
static PARTICIPANT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(participant|actor)\s+(.+?)(?:\s+as\s+(.+))?$").unwrap());
static NOTE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^note\s+(over|left of|right of)\s+([^:]+?)\s*:\s*(.*)$").unwrap());
static FRAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(loop|alt|opt|par|critical|break)\b\s*(.*)$").unwrap());
static MESSAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<from>[^:]+?)\s*(?P<arrow>-->>|->>|-->|->|--x|-x|--\)|-\))\s*(?P<to>[^:]+?)\s*:\s*(?P<text>.*)$")
        .unwrap()
});
static BRACKET_LIST_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[(.*?)\]").unwrap());
static QUOTED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#""([^"]*)""#).unwrap());
static KANBAN_COLUMN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\w+)?\[([^\]]+)\]$").unwrap());
static KANBAN_TASK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\w+)?\[([^\]]+)\](?:@\{([^}]+)\})?$").unwrap());
static QUADRANT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^quadrant-(\d+)\s*(.*)$").unwrap());

#[derive(Debug)]
pub struct ParseOutput {
    pub diagram: Diagram,
    pub init_config: Option<serde_json::Value>,
}

/// A meaningful source line together with its 1-based line number.
#[derive(Debug, Clone)]
struct SourceLine {
    number: usize,
    text: String,
}

pub fn parse_mermaid(input: &str, kind: Option<DiagramKind>) -> Result<ParseOutput> {
    let kind = match kind {
        Some(kind) => kind,
        None => detect_diagram_kind(input).ok_or_else(|| {
            ParseError::document("unable to detect the diagram type from the header line")
        })?,
    };
    debug!(kind:?; "parsing diagram");

    let (lines, init_config) = preprocess_input(input, kind == DiagramKind::Kanban);
    let diagram = match kind {
        DiagramKind::Bar => Diagram::Bar(parse_bar_chart(&lines)?),
        DiagramKind::Flowchart => Diagram::Flowchart(parse_flowchart(&lines)),
        DiagramKind::Gantt => Diagram::Gantt(parse_gantt(&lines)?),
        DiagramKind::Kanban => Diagram::Kanban(parse_kanban(&lines)?),
        DiagramKind::Org => Diagram::Org(parse_org_chart(&lines)),
        DiagramKind::Pie => Diagram::Pie(parse_pie(&lines)?),
        DiagramKind::Sequence => Diagram::Sequence(parse_sequence(&lines)),
        DiagramKind::Swot => Diagram::Swot(parse_swot(&lines)),
        DiagramKind::Timeline => Diagram::Timeline(parse_timeline(&lines)),
        DiagramKind::Journey => Diagram::Journey(parse_journey(&lines)?),
    };
    Ok(ParseOutput {
        diagram,
        init_config,
    })
}

/// Detects the diagram family from the first meaningful line.
pub fn detect_diagram_kind(input: &str) -> Option<DiagramKind> {
    for raw_line in input.lines() {
        let trimmed = raw_line.trim();
        if trimmed.is_empty() || trimmed.starts_with("%%") {
            continue;
        }
        let without_comment = strip_trailing_comment(trimmed, false);
        let lower = without_comment.to_ascii_lowercase();
        let word = lower.split_whitespace().next()?;
        return match word {
            w if w.starts_with("xychart") => Some(DiagramKind::Bar),
            "bar" => Some(DiagramKind::Bar),
            "graph" | "flowchart" => Some(DiagramKind::Flowchart),
            "orgchart" => Some(DiagramKind::Org),
            "gantt" => Some(DiagramKind::Gantt),
            "kanban" => Some(DiagramKind::Kanban),
            "pie" => Some(DiagramKind::Pie),
            "sequencediagram" => Some(DiagramKind::Sequence),
            "swot" => Some(DiagramKind::Swot),
            w if w.starts_with("quadrant-") => Some(DiagramKind::Swot),
            "timeline" => Some(DiagramKind::Timeline),
            "journey" => Some(DiagramKind::Journey),
            _ => None,
        };
    }
    None
}

fn preprocess_input(input: &str, keep_indent: bool) -> (Vec<SourceLine>, Option<serde_json::Value>) {
    let mut init_config = None;
    let mut lines = Vec::new();

    for (idx, raw_line) in input.lines().enumerate() {
        let trimmed = raw_line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(caps) = INIT_RE.captures(trimmed) {
            if let Some(json_str) = caps.get(1).map(|m| m.as_str()) {
                match serde_json::from_str::<serde_json::Value>(json_str) {
                    Ok(value) => init_config = Some(value),
                    Err(_) => match json5::from_str::<serde_json::Value>(json_str) {
                        Ok(value) => init_config = Some(value),
                        Err(err) => warn!("line {}: ignoring unreadable init directive: {err}", idx + 1),
                    },
                }
            }
            continue;
        }
        if trimmed.starts_with("%%") {
            continue;
        }
        let text = strip_trailing_comment(raw_line, keep_indent);
        if text.trim().is_empty() {
            continue;
        }
        lines.push(SourceLine {
            number: idx + 1,
            text,
        });
    }

    (lines, init_config)
}

/// Drops a `%%` comment outside of quotes. Leading indentation survives when
/// `keep_indent` is set.
fn strip_trailing_comment(line: &str, keep_indent: bool) -> String {
    let mut quote: Option<char> = None;
    let mut chars = line.chars().peekable();
    let mut out = String::new();
    while let Some(ch) = chars.next() {
        if let Some(q) = quote {
            if ch == q {
                quote = None;
            }
            out.push(ch);
            continue;
        }
        if ch == '"' || ch == '\'' {
            quote = Some(ch);
            out.push(ch);
            continue;
        }
        if ch == '%'
            && let Some('%') = chars.peek().copied()
        {
            break;
        }
        out.push(ch);
    }
    if keep_indent {
        out.trim_end().to_string()
    } else {
        out.trim().to_string()
    }
}

fn strip_quotes(value: &str) -> String {
    let trimmed = value.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| trimmed.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(trimmed);
    unquoted.trim().to_string()
}

fn starts_with_keyword(line: &str, keyword: &str) -> bool {
    let Some(head) = line.get(..keyword.len()) else {
        return false;
    };
    head.eq_ignore_ascii_case(keyword)
        && line[keyword.len()..]
            .chars()
            .next()
            .is_none_or(char::is_whitespace)
}

fn keyword_argument<'a>(line: &'a str, keyword: &str) -> &'a str {
    line.get(keyword.len()..).unwrap_or("").trim()
}

// ---------------------------------------------------------------------------
// Flowchart
// ---------------------------------------------------------------------------

struct NodeToken {
    id: String,
    label: Option<String>,
    shape: NodeShape,
}

const FLOWCHART_IGNORED: [&str; 8] = [
    "subgraph", "end", "style", "classDef", "class", "linkStyle", "click", "direction",
];

fn parse_flowchart(lines: &[SourceLine]) -> Flowchart {
    let mut chart = Flowchart::default();
    let mut labelled: HashSet<String> = HashSet::new();

    for line in lines {
        let text = line.text.trim().trim_end_matches(';').trim();
        if let Some(caps) = FLOW_HEADER_RE.captures(text) {
            if let Some(token) = caps.get(1) {
                match Direction::from_token(token.as_str()) {
                    Some(direction) => chart.direction = direction,
                    None => warn!(
                        "line {}: unknown flowchart direction '{}', using TB",
                        line.number,
                        token.as_str()
                    ),
                }
            }
            continue;
        }
        if FLOWCHART_IGNORED
            .iter()
            .any(|keyword| starts_with_keyword(text, keyword))
        {
            warn!("line {}: ignoring unsupported flowchart statement '{text}'", line.number);
            continue;
        }
        if !parse_flow_statement(text, &mut chart, &mut labelled) {
            warn!("line {}: could not parse flowchart statement '{text}'", line.number);
        }
    }

    debug!(
        "flowchart with {} nodes and {} edges",
        chart.nodes.len(),
        chart.edges.len()
    );
    chart
}

/// Parses `A[x] --> B --> C{y}` style chains. Returns false when the line
/// does not start with a node or a link cannot be read; anything declared
/// before that point is kept.
fn parse_flow_statement(text: &str, chart: &mut Flowchart, labelled: &mut HashSet<String>) -> bool {
    let Some((first, mut rest)) = take_flow_node(text) else {
        return false;
    };
    let mut previous = first.id.clone();
    declare_flow_node(chart, labelled, first);

    while !rest.trim().is_empty() {
        let Some(caps) = FLOW_LINK_RE.captures(rest) else {
            return false;
        };
        let operator = caps.get(1).map_or("", |m| m.as_str());
        let label = caps
            .get(2)
            .map(|m| strip_quotes(m.as_str()))
            .filter(|label| !label.is_empty());
        let consumed = caps.get(0).map_or(0, |m| m.end());
        let Some((node, remainder)) = take_flow_node(&rest[consumed..]) else {
            return false;
        };
        let (style, arrow) = flow_link_kind(operator);
        let target = node.id.clone();
        declare_flow_node(chart, labelled, node);
        chart.edges.push(FlowEdge {
            from: previous,
            to: target.clone(),
            label,
            style,
            arrow,
        });
        previous = target;
        rest = remainder;
    }
    true
}

fn take_flow_node(text: &str) -> Option<(NodeToken, &str)> {
    let caps = FLOW_NODE_RE.captures(text)?;
    let id = caps.get(1)?.as_str().to_string();
    let (label, shape) = if let Some(m) = caps.get(2) {
        (Some(m.as_str()), NodeShape::Rectangle)
    } else if let Some(m) = caps.get(3) {
        (Some(m.as_str()), NodeShape::Diamond)
    } else if let Some(m) = caps.get(4) {
        (Some(m.as_str()), NodeShape::Ellipse)
    } else {
        (None, NodeShape::Rectangle)
    };
    let end = caps.get(0)?.end();
    Some((
        NodeToken {
            id,
            label: label.map(strip_quotes),
            shape,
        },
        &text[end..],
    ))
}

/// The first labelled occurrence of a key fixes its label and shape; bare
/// references only create a default rectangle.
fn declare_flow_node(chart: &mut Flowchart, labelled: &mut HashSet<String>, token: NodeToken) {
    let existing = chart.nodes.iter().position(|n| n.id == token.id);
    match (token.label, existing) {
        (Some(label), Some(idx)) => {
            if labelled.insert(token.id) {
                chart.nodes[idx].label = label;
                chart.nodes[idx].shape = token.shape;
            }
        }
        (Some(label), None) => {
            labelled.insert(token.id.clone());
            chart.nodes.push(FlowNode {
                id: token.id,
                label,
                shape: token.shape,
            });
        }
        (None, Some(_)) => {}
        (None, None) => chart.nodes.push(FlowNode {
            label: token.id.clone(),
            id: token.id,
            shape: NodeShape::Rectangle,
        }),
    }
}

fn flow_link_kind(operator: &str) -> (EdgeStyle, ArrowKind) {
    if operator.starts_with('=') {
        (EdgeStyle::Thick, ArrowKind::Classic)
    } else if operator.contains('.') {
        (EdgeStyle::Dashed, ArrowKind::Classic)
    } else if operator.ends_with('>') {
        (EdgeStyle::Solid, ArrowKind::Classic)
    } else {
        (EdgeStyle::Solid, ArrowKind::None)
    }
}

// ---------------------------------------------------------------------------
// Org chart
// ---------------------------------------------------------------------------

fn parse_org_chart(lines: &[SourceLine]) -> OrgChart {
    let mut chart = OrgChart::default();

    for line in lines {
        let text = line.text.trim().trim_end_matches(';').trim();
        if ["graph", "flowchart", "orgchart"]
            .iter()
            .any(|keyword| starts_with_keyword(text, keyword))
        {
            continue;
        }

        if ORG_LINK_RE.is_match(text) {
            let parts: Vec<&str> = ORG_LINK_RE.split(text).collect();
            let mut ids = Vec::with_capacity(parts.len());
            for part in &parts {
                let part = EDGE_LABEL_RE.replace(part, "");
                match parse_org_node(&part) {
                    Some((id, label)) => {
                        chart.ensure_node(&id, label.as_deref());
                        ids.push(id);
                    }
                    None => {
                        warn!("line {}: missing node in link '{text}'", line.number);
                        ids.clear();
                        break;
                    }
                }
            }
            for pair in ids.windows(2) {
                chart.edges.push(OrgEdge {
                    parent: pair[0].clone(),
                    child: pair[1].clone(),
                });
            }
            continue;
        }

        match parse_org_node(text) {
            Some((id, label)) => {
                if chart.node_index(&id).is_none() {
                    chart.ensure_node(&id, label.as_deref());
                }
            }
            None => warn!("line {}: skipping unrecognised line '{text}'", line.number),
        }
    }

    chart
}

fn parse_org_node(text: &str) -> Option<(String, Option<String>)> {
    if let Some(caps) = ORG_NODE_RE.captures(text) {
        let id = caps.get(1)?.as_str().to_string();
        let label = caps.get(2).map(|m| strip_quotes(m.as_str()));
        return Some((id, label));
    }
    let caps = ORG_BARE_RE.captures(text)?;
    Some((caps.get(1)?.as_str().to_string(), None))
}

// ---------------------------------------------------------------------------
// Gantt
// ---------------------------------------------------------------------------

const GANTT_IGNORED: [&str; 7] = [
    "axisFormat",
    "excludes",
    "includes",
    "todayMarker",
    "tickInterval",
    "weekday",
    "inclusiveEndDates",
];

fn parse_gantt(lines: &[SourceLine]) -> Result<GanttChart> {
    let mut chart = GanttChart {
        title: "Gantt Chart".to_string(),
        sections: Vec::new(),
    };
    let mut date_format = "%Y-%m-%d".to_string();
    let mut current = GanttSection {
        name: String::new(),
        tasks: Vec::new(),
    };
    let mut ends: HashMap<String, NaiveDate> = HashMap::new();
    let mut previous_end: Option<NaiveDate> = None;

    for line in lines {
        let text = line.text.trim();
        if starts_with_keyword(text, "gantt") {
            continue;
        }
        if starts_with_keyword(text, "title") {
            chart.title = keyword_argument(text, "title").to_string();
            continue;
        }
        if starts_with_keyword(text, "dateFormat") {
            date_format = chrono_date_format(keyword_argument(text, "dateFormat"));
            continue;
        }
        if GANTT_IGNORED
            .iter()
            .any(|keyword| starts_with_keyword(text, keyword))
        {
            debug!("line {}: ignoring '{text}'", line.number);
            continue;
        }
        if starts_with_keyword(text, "section") {
            let next = GanttSection {
                name: keyword_argument(text, "section").to_string(),
                tasks: Vec::new(),
            };
            let finished = std::mem::replace(&mut current, next);
            if !finished.tasks.is_empty() {
                chart.sections.push(finished);
            }
            continue;
        }
        let Some((name, spec)) = text.split_once(':') else {
            warn!("line {}: skipping unrecognised gantt line '{text}'", line.number);
            continue;
        };
        let task = parse_gantt_task(
            line.number,
            name.trim(),
            spec,
            &date_format,
            &ends,
            previous_end,
        )?;
        if let Some(id) = &task.id {
            ends.insert(id.clone(), task.end);
        }
        previous_end = Some(task.end);
        current.tasks.push(task);
    }

    if !current.tasks.is_empty() {
        chart.sections.push(current);
    }
    if chart.sections.is_empty() {
        return Err(ParseError::document("gantt chart has no tasks"));
    }
    Ok(chart)
}

fn parse_gantt_task(
    number: usize,
    name: &str,
    spec: &str,
    date_format: &str,
    ends: &HashMap<String, NaiveDate>,
    previous_end: Option<NaiveDate>,
) -> Result<GanttTask> {
    let mut tokens: Vec<&str> = spec
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();
    let mut status = Vec::new();
    while let Some(first) = tokens.first() {
        match GanttStatus::from_token(first) {
            Some(s) => {
                status.push(s);
                tokens.remove(0);
            }
            None => break,
        }
    }

    let is_start = |token: &str| {
        token.starts_with("after ") || NaiveDate::parse_from_str(token, date_format).is_ok()
    };
    let (id, start_token, end_token) = match tokens.as_slice() {
        [id, start, end] => (Some(*id), Some(*start), *end),
        [start, end] if is_start(*start) => (None, Some(*start), *end),
        [id, end] => (Some(*id), None, *end),
        [end] => (None, None, *end),
        [] => {
            return Err(ParseError::new(number, format!("task '{name}' needs a start and an end")));
        }
        _ => {
            return Err(ParseError::new(number, format!("task '{name}' has too many fields")));
        }
    };

    let start = match start_token {
        Some(token) => parse_gantt_start(number, token, date_format, ends)?,
        None => previous_end.ok_or_else(|| {
            ParseError::new(
                number,
                format!("task '{name}' has no start and no earlier task to follow"),
            )
        })?,
    };
    let end = parse_gantt_end(number, end_token, start, date_format)?;
    if end < start {
        return Err(ParseError::new(number, format!("task '{name}' ends before it starts")));
    }

    Ok(GanttTask {
        id: id.map(str::to_string),
        name: name.to_string(),
        start,
        end,
        status,
    })
}

fn parse_gantt_start(
    number: usize,
    token: &str,
    date_format: &str,
    ends: &HashMap<String, NaiveDate>,
) -> Result<NaiveDate> {
    if let Some(refs) = token.strip_prefix("after ") {
        let mut latest: Option<NaiveDate> = None;
        for reference in refs.split_whitespace() {
            let end = ends.get(reference).ok_or_else(|| {
                ParseError::new(number, format!("unknown task '{reference}' in 'after'"))
            })?;
            latest = Some(latest.map_or(*end, |l| l.max(*end)));
        }
        return latest.ok_or_else(|| ParseError::new(number, "'after' needs a task id"));
    }
    NaiveDate::parse_from_str(token, date_format)
        .map_err(|err| ParseError::new(number, format!("invalid date '{token}': {err}")))
}

fn parse_gantt_end(number: usize, token: &str, start: NaiveDate, date_format: &str) -> Result<NaiveDate> {
    if let Some(caps) = DURATION_RE.captures(token) {
        let amount: u64 = caps[1]
            .parse()
            .map_err(|_| ParseError::new(number, format!("invalid duration '{token}'")))?;
        let days = if &caps[2] == "w" { amount * 7 } else { amount };
        return start
            .checked_add_days(Days::new(days))
            .ok_or_else(|| ParseError::new(number, format!("duration '{token}' is out of range")));
    }
    NaiveDate::parse_from_str(token, date_format).map_err(|err| {
        ParseError::new(number, format!("invalid end date or duration '{token}': {err}"))
    })
}

/// Translates Mermaid/dayjs date tokens into a chrono format string.
fn chrono_date_format(format: &str) -> String {
    const TOKENS: [(&str, &str); 13] = [
        ("YYYY", "%Y"),
        ("YY", "%y"),
        ("MMMM", "%B"),
        ("MMM", "%b"),
        ("MM", "%m"),
        ("M", "%m"),
        ("DD", "%d"),
        ("D", "%d"),
        ("HH", "%H"),
        ("H", "%H"),
        ("mm", "%M"),
        ("ss", "%S"),
        ("%", "%%"),
    ];
    let mut out = String::new();
    let mut rest = format.trim();
    'outer: while !rest.is_empty() {
        for (token, replacement) in TOKENS {
            if let Some(remaining) = rest.strip_prefix(token) {
                out.push_str(replacement);
                rest = remaining;
                continue 'outer;
            }
        }
        let mut chars = rest.chars();
        if let Some(ch) = chars.next() {
            out.push(ch);
        }
        rest = chars.as_str();
    }
    out
}

// ---------------------------------------------------------------------------
// Timeline
// ---------------------------------------------------------------------------

fn parse_timeline(lines: &[SourceLine]) -> Timeline {
    let mut timeline = Timeline {
        title: "Timeline".to_string(),
        sections: Vec::new(),
        periods: Vec::new(),
    };

    for line in lines {
        let text = line.text.trim();
        if starts_with_keyword(text, "timeline") {
            continue;
        }
        if starts_with_keyword(text, "title") {
            timeline.title = keyword_argument(text, "title").to_string();
            continue;
        }
        if starts_with_keyword(text, "section") {
            timeline
                .sections
                .push(keyword_argument(text, "section").to_string());
            continue;
        }
        if let Some(continuation) = text.strip_prefix(':') {
            let events = split_events(continuation);
            match timeline.periods.last_mut() {
                Some(period) => period.events.extend(events),
                None => warn!("line {}: event continuation without a period", line.number),
            }
            continue;
        }

        let mut parts = text.splitn(2, ':');
        let period = parts.next().unwrap_or("").trim();
        if period.is_empty() {
            warn!("line {}: skipping timeline line without a period", line.number);
            continue;
        }
        let events = parts.next().map(split_events).unwrap_or_default();
        timeline.periods.push(TimelinePeriod {
            period: period.to_string(),
            events,
            section: timeline.sections.len().checked_sub(1),
        });
    }

    timeline
}

fn split_events(raw: &str) -> Vec<String> {
    raw.split(':')
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// Sequence
// ---------------------------------------------------------------------------

fn parse_sequence(lines: &[SourceLine]) -> SequenceDiagram {
    let mut diagram = SequenceDiagram::default();
    let mut open_frames: Vec<(FrameKind, String, usize)> = Vec::new();

    for line in lines {
        let text = line.text.trim();
        if starts_with_keyword(text, "sequenceDiagram") {
            continue;
        }

        if let Some(caps) = PARTICIPANT_RE.captures(text) {
            let actor = &caps[1] == "actor";
            let id = caps[2].trim().to_string();
            let label = caps
                .get(3)
                .map(|m| strip_quotes(m.as_str()))
                .unwrap_or_else(|| id.clone());
            match diagram.participant_index(&id) {
                Some(idx) => {
                    warn!("line {}: participant '{id}' declared twice", line.number);
                    diagram.participants[idx].label = label;
                    diagram.participants[idx].actor = actor;
                }
                None => diagram.participants.push(Participant { id, label, actor }),
            }
            continue;
        }

        if let Some(caps) = NOTE_RE.captures(text) {
            let targets: Vec<String> = caps[2]
                .split(',')
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect();
            let placement = match caps[1].to_ascii_lowercase().as_str() {
                "over" => Some(NotePlacement::Over(targets)),
                "left of" => targets.into_iter().next().map(NotePlacement::LeftOf),
                _ => targets.into_iter().next().map(NotePlacement::RightOf),
            };
            match placement {
                Some(placement) => diagram.notes.push(Note {
                    placement,
                    text: caps[3].trim().to_string(),
                }),
                None => warn!("line {}: note without a participant", line.number),
            }
            continue;
        }

        if let Some(caps) = FRAME_RE.captures(text)
            && let Some(kind) = FrameKind::from_keyword(&caps[1])
        {
            open_frames.push((kind, caps[2].trim().to_string(), diagram.messages.len()));
            continue;
        }

        if starts_with_keyword(text, "else") || starts_with_keyword(text, "and") {
            debug!("line {}: frame divider ignored", line.number);
            continue;
        }

        if text == "end" {
            match open_frames.pop() {
                Some((kind, label, start)) => diagram.frames.push(Frame {
                    kind,
                    label,
                    messages: start..diagram.messages.len(),
                }),
                None => warn!("line {}: 'end' without an open frame", line.number),
            }
            continue;
        }

        if let Some(caps) = MESSAGE_RE.captures(text) {
            let arrow = &caps["arrow"];
            let to = caps["to"].trim_start_matches(['+', '-']).trim().to_string();
            diagram.messages.push(Message {
                from: caps["from"].trim().to_string(),
                to,
                text: caps["text"].trim().to_string(),
                arrow: sequence_arrow(arrow),
                dashed: arrow.starts_with("--"),
            });
            continue;
        }

        warn!("line {}: skipping unrecognised sequence line '{text}'", line.number);
    }

    while let Some((kind, label, start)) = open_frames.pop() {
        warn!("frame '{}' is never closed, closing at the last message", kind.keyword());
        diagram.frames.push(Frame {
            kind,
            label,
            messages: start..diagram.messages.len(),
        });
    }

    let mut implicit = Vec::new();
    for message in &diagram.messages {
        for id in [&message.from, &message.to] {
            if diagram.participant_index(id).is_none() && !implicit.contains(id) {
                implicit.push(id.clone());
            }
        }
    }
    diagram
        .participants
        .extend(implicit.into_iter().map(|id| Participant {
            label: id.clone(),
            id,
            actor: false,
        }));

    diagram
}

fn sequence_arrow(arrow: &str) -> ArrowKind {
    if arrow.ends_with(">>") || arrow.ends_with(')') {
        ArrowKind::Open
    } else if arrow.ends_with('>') {
        ArrowKind::Block
    } else {
        ArrowKind::Cross
    }
}

// ---------------------------------------------------------------------------
// Pie
// ---------------------------------------------------------------------------

fn parse_pie(lines: &[SourceLine]) -> Result<PieChart> {
    let mut chart = PieChart {
        title: "Pie Chart".to_string(),
        show_data: false,
        slices: Vec::new(),
    };

    for line in lines {
        let text = line.text.trim();
        let lower = text.to_ascii_lowercase();
        if starts_with_keyword(text, "pie") {
            if lower.contains("showdata") {
                chart.show_data = true;
            }
            if let Some(pos) = lower.find("title") {
                let title = text[pos + "title".len()..].trim();
                if !title.is_empty() {
                    chart.title = title.to_string();
                }
            }
            continue;
        }
        if starts_with_keyword(text, "showData") {
            chart.show_data = true;
            continue;
        }
        if starts_with_keyword(text, "title") {
            chart.title = keyword_argument(text, "title").to_string();
            continue;
        }
        let Some((label, value)) = text.rsplit_once(':') else {
            warn!("line {}: skipping unrecognised pie line '{text}'", line.number);
            continue;
        };
        let label = strip_quotes(label);
        if label.is_empty() {
            return Err(ParseError::new(line.number, "pie slice has no label"));
        }
        let value: f64 = value.trim().parse().map_err(|_| {
            ParseError::new(line.number, format!("invalid value for slice '{label}'"))
        })?;
        if !value.is_finite() || value < 0.0 {
            return Err(ParseError::new(
                line.number,
                format!("slice '{label}' must have a non-negative value"),
            ));
        }
        chart.slices.push(PieSlice { label, value });
    }

    if chart.slices.is_empty() {
        return Err(ParseError::document("no valid pie chart data found"));
    }
    if chart.total() <= 0.0 {
        return Err(ParseError::document("pie chart values add up to zero"));
    }
    Ok(chart)
}

// ---------------------------------------------------------------------------
// Bar chart
// ---------------------------------------------------------------------------

fn parse_bar_chart(lines: &[SourceLine]) -> Result<BarChart> {
    let mut chart = BarChart {
        title: "Bar Chart".to_string(),
        categories: Vec::new(),
        y_title: None,
        values: Vec::new(),
    };
    let mut has_series = false;

    for line in lines {
        let text = line.text.trim();
        let lower = text.to_ascii_lowercase();
        if lower.starts_with("xychart") {
            continue;
        }
        if starts_with_keyword(text, "title") {
            chart.title = keyword_argument(text, "title").replace('"', "").trim().to_string();
            continue;
        }
        if starts_with_keyword(text, "x-axis") {
            match BRACKET_LIST_RE.captures(text) {
                Some(caps) => {
                    chart.categories = caps[1]
                        .split(',')
                        .map(|c| c.trim().replace('"', ""))
                        .collect();
                }
                None => debug!("line {}: numeric x-axis ignored", line.number),
            }
            continue;
        }
        if starts_with_keyword(text, "y-axis") {
            chart.y_title = QUOTED_RE
                .captures(text)
                .map(|caps| caps[1].trim().to_string())
                .filter(|t| !t.is_empty());
            continue;
        }
        if starts_with_keyword(text, "bar") {
            if has_series {
                warn!("line {}: only the first bar series is drawn", line.number);
                continue;
            }
            let caps = BRACKET_LIST_RE.captures(text).ok_or_else(|| {
                ParseError::new(line.number, "bar series must be a [v1, v2, ...] list")
            })?;
            chart.values = caps[1]
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| {
                    v.parse::<f64>()
                        .ok()
                        .filter(|n| n.is_finite())
                        .ok_or_else(|| ParseError::new(line.number, format!("invalid bar value '{v}'")))
                })
                .collect::<Result<Vec<_>>>()?;
            has_series = true;
            continue;
        }
        if starts_with_keyword(text, "line") {
            warn!("line {}: line series are not drawn", line.number);
            continue;
        }
        warn!("line {}: skipping unrecognised bar chart line '{text}'", line.number);
    }

    if chart.values.is_empty() {
        return Err(ParseError::document("bar chart has no bar data"));
    }
    Ok(chart)
}

// ---------------------------------------------------------------------------
// Kanban
// ---------------------------------------------------------------------------

fn indent_of(text: &str) -> usize {
    text.len() - text.trim_start().len()
}

fn parse_kanban(lines: &[SourceLine]) -> Result<Kanban> {
    let Some((header, body)) = lines.split_first() else {
        return Err(ParseError::document("empty kanban input"));
    };
    if !header.text.trim().eq_ignore_ascii_case("kanban") {
        return Err(ParseError::new(header.number, "kanban input must start with 'kanban'"));
    }

    let mut board = Kanban::default();
    let Some(column_indent) = body.iter().map(|line| indent_of(&line.text)).min() else {
        return Ok(board);
    };

    for line in body {
        let indent = indent_of(&line.text);
        let text = line.text.trim();
        if indent == column_indent {
            let column_number = board.columns.len();
            let (id, title) = match KANBAN_COLUMN_RE.captures(text) {
                Some(caps) => (
                    caps.get(1).map(|m| m.as_str().to_string()),
                    caps[2].trim().to_string(),
                ),
                None => (None, text.to_string()),
            };
            board.columns.push(KanbanColumn {
                id: id.unwrap_or_else(|| format!("col_{column_number}")),
                title,
                tasks: Vec::new(),
            });
            continue;
        }

        let Some(column) = board.columns.last_mut() else {
            continue;
        };
        match KANBAN_TASK_RE.captures(text) {
            Some(caps) => {
                let id = caps
                    .get(1)
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_else(|| format!("task_{}", column.tasks.len()));
                column.tasks.push(KanbanTask {
                    id,
                    description: caps[2].trim().to_string(),
                    metadata: caps
                        .get(3)
                        .map(|m| parse_kanban_metadata(m.as_str()))
                        .unwrap_or_default(),
                });
            }
            None => warn!("line {}: skipping invalid task line '{text}'", line.number),
        }
    }

    Ok(board)
}

fn parse_kanban_metadata(raw: &str) -> Vec<(String, String)> {
    raw.split(',')
        .filter_map(|pair| {
            let (key, value) = pair.split_once(':')?;
            let key = key.trim().replace(['\'', '"'], "");
            let value = value.trim().replace(['\'', '"'], "");
            (!key.is_empty() && !value.is_empty()).then_some((key, value))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// SWOT
// ---------------------------------------------------------------------------

fn parse_swot(lines: &[SourceLine]) -> Swot {
    let mut swot = Swot::default();
    let mut current: Option<usize> = None;

    for line in lines {
        let text = line.text.trim();
        if starts_with_keyword(text, "swot") {
            continue;
        }
        if let Some(caps) = QUADRANT_RE.captures(text) {
            match caps[1].parse::<usize>() {
                Ok(n @ 1..=4) => {
                    let title = caps[2].trim();
                    if !title.is_empty() {
                        swot.quadrants[n - 1].title = title.to_string();
                    }
                    current = Some(n - 1);
                }
                _ => {
                    warn!("line {}: unknown quadrant '{}'", line.number, &caps[1]);
                    current = None;
                }
            }
            continue;
        }
        if let Some(item) = text.strip_prefix('-') {
            match current {
                Some(idx) => swot.quadrants[idx].items.push(item.trim().to_string()),
                None => warn!("line {}: list item outside of a quadrant", line.number),
            }
            continue;
        }
        warn!("line {}: skipping unrecognised swot line '{text}'", line.number);
    }

    swot
}

// ---------------------------------------------------------------------------
// User journey
// ---------------------------------------------------------------------------

fn parse_journey(lines: &[SourceLine]) -> Result<Journey> {
    let mut journey = Journey::default();

    for line in lines {
        let text = line.text.trim();
        if starts_with_keyword(text, "journey") {
            continue;
        }
        if starts_with_keyword(text, "title") {
            journey.title = Some(keyword_argument(text, "title").to_string());
            continue;
        }
        if starts_with_keyword(text, "section") {
            journey.sections.push(JourneySection {
                name: keyword_argument(text, "section").to_string(),
                tasks: Vec::new(),
            });
            continue;
        }

        let parts: Vec<&str> = text.splitn(3, ':').map(str::trim).collect();
        let [name, score, actors] = parts.as_slice() else {
            warn!("line {}: skipping journey line without 'task: score: actors'", line.number);
            continue;
        };
        let score: u8 = score.parse().map_err(|_| {
            ParseError::new(line.number, format!("score '{score}' of task '{name}' is not an integer"))
        })?;
        let actors: Vec<String> = actors
            .split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string)
            .collect();
        for actor in &actors {
            if !journey.actors.contains(actor) {
                journey.actors.push(actor.clone());
            }
        }
        if journey.sections.is_empty() {
            journey.sections.push(JourneySection {
                name: "Start".to_string(),
                tasks: Vec::new(),
            });
        }
        if let Some(section) = journey.sections.last_mut() {
            section.tasks.push(JourneyTask {
                name: name.to_string(),
                score,
                actors,
            });
        }
    }

    Ok(journey)
}
