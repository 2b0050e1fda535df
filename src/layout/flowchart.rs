use super::*;
use crate::config::{FlowchartConfig, GraphEngine};
use crate::geometry::trim_waypoints;
use crate::ir::{ArrowKind, Direction, EdgeStyle, Flowchart, NodeShape};
use dagre_rust::{
    GraphConfig as DagreConfig, GraphEdge as DagreEdge, GraphNode as DagreNode,
    layout as dagre_layout,
};
use graphlib_rust::{Graph as DagreGraph, GraphOption};
use std::collections::{HashMap, HashSet};

/// Input to a layered graph layout: sized nodes and directed edges, both in
/// declaration order.
#[derive(Debug, Clone, Default)]
pub struct LayoutGraph {
    pub nodes: Vec<LayoutNode>,
    pub edges: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct LayoutNode {
    pub id: String,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone)]
pub struct GraphLayoutOptions {
    pub direction: Direction,
    pub node_spacing: f32,
    pub rank_spacing: f32,
    pub edge_spacing: f32,
    pub align: Option<String>,
    pub margin: f32,
}

impl GraphLayoutOptions {
    pub fn from_config(direction: Direction, config: &FlowchartConfig) -> Self {
        Self {
            direction,
            node_spacing: config.node_spacing,
            rank_spacing: config.rank_spacing,
            edge_spacing: config.edge_spacing,
            align: config.align.clone(),
            margin: config.margin,
        }
    }
}

/// Node centers and edge routes. Routes start and end at the node centers.
#[derive(Debug, Clone, Default)]
pub struct PositionedGraph {
    pub centers: HashMap<String, Point>,
    pub routes: HashMap<(String, String), Vec<Point>>,
}

pub trait GraphLayouter {
    fn layout(&self, graph: &LayoutGraph, options: &GraphLayoutOptions) -> PositionedGraph;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DagreLayouter;

impl GraphLayouter for DagreLayouter {
    fn layout(&self, graph: &LayoutGraph, options: &GraphLayoutOptions) -> PositionedGraph {
        let mut dagre_graph: DagreGraph<DagreConfig, DagreNode, DagreEdge> =
            DagreGraph::new(Some(GraphOption {
                directed: Some(true),
                multigraph: Some(false),
                compound: Some(false),
            }));

        let mut graph_config = DagreConfig::default();
        graph_config.rankdir = Some(dagre_rankdir(options.direction).to_string());
        graph_config.nodesep = Some(options.node_spacing);
        graph_config.ranksep = Some(options.rank_spacing);
        graph_config.edgesep = Some(options.edge_spacing);
        graph_config.align = options.align.clone();
        graph_config.marginx = Some(options.margin);
        graph_config.marginy = Some(options.margin);
        dagre_graph.set_graph(graph_config);

        for node in &graph.nodes {
            let mut dagre_node = DagreNode::default();
            dagre_node.width = node.width;
            dagre_node.height = node.height;
            dagre_graph.set_node(node.id.clone(), Some(dagre_node));
        }
        for (from, to) in &graph.edges {
            let _ = dagre_graph.set_edge(from, to, Some(DagreEdge::default()), None);
        }

        dagre_layout::run_layout(&mut dagre_graph);

        let mut positioned = PositionedGraph::default();
        for node in &graph.nodes {
            if let Some(dagre_node) = dagre_graph.node(&node.id) {
                positioned
                    .centers
                    .insert(node.id.clone(), Point::new(dagre_node.x, dagre_node.y));
            }
        }
        for (from, to) in &graph.edges {
            let Some(edge) = dagre_graph.edge(from, to, None) else {
                continue;
            };
            let points: Vec<Point> = edge
                .points
                .iter()
                .flatten()
                .map(|p| Point::new(p.x, p.y))
                .collect();
            positioned.routes.insert((from.clone(), to.clone()), points);
        }
        positioned
    }
}

fn dagre_rankdir(direction: Direction) -> &'static str {
    match direction {
        Direction::TopDown => "tb",
        Direction::BottomTop => "bt",
        Direction::LeftRight => "lr",
        Direction::RightLeft => "rl",
    }
}

/// Longest-path ranking with declaration order inside each rank. Cycles are
/// broken by ignoring edges that close them during a depth-first walk.
#[derive(Debug, Clone, Copy, Default)]
pub struct RankedLayouter;

impl GraphLayouter for RankedLayouter {
    fn layout(&self, graph: &LayoutGraph, options: &GraphLayoutOptions) -> PositionedGraph {
        let index: HashMap<&str, usize> = graph
            .nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| (node.id.as_str(), idx))
            .collect();
        let mut successors: Vec<Vec<usize>> = vec![Vec::new(); graph.nodes.len()];
        for (from, to) in &graph.edges {
            if let (Some(&a), Some(&b)) = (index.get(from.as_str()), index.get(to.as_str()))
                && a != b
            {
                successors[a].push(b);
            }
        }

        let forward = acyclic_edges(&successors);
        let mut ranks = vec![0usize; graph.nodes.len()];
        for &node in topological_order(&forward).iter() {
            for &next in &forward[node] {
                ranks[next] = ranks[next].max(ranks[node] + 1);
            }
        }

        let rank_count = ranks.iter().copied().max().map_or(0, |r| r + 1);
        let mut rows: Vec<Vec<usize>> = vec![Vec::new(); rank_count];
        for (node, &rank) in ranks.iter().enumerate() {
            rows[rank].push(node);
        }

        let horizontal = matches!(options.direction, Direction::LeftRight | Direction::RightLeft);
        // Along-rank extent is width for vertical flows, height for horizontal ones.
        let breadth = |n: usize| {
            if horizontal {
                graph.nodes[n].height
            } else {
                graph.nodes[n].width
            }
        };
        let depth = |n: usize| {
            if horizontal {
                graph.nodes[n].width
            } else {
                graph.nodes[n].height
            }
        };

        let row_breadths: Vec<f32> = rows
            .iter()
            .map(|row| {
                let sum: f32 = row.iter().map(|&n| breadth(n)).sum();
                sum + options.node_spacing * row.len().saturating_sub(1) as f32
            })
            .collect();
        let widest = row_breadths.iter().copied().fold(0.0_f32, f32::max);

        let mut centers = vec![Point::default(); graph.nodes.len()];
        let mut rank_cursor = options.margin;
        let mut rank_mid = vec![0.0_f32; rank_count];
        for (rank, row) in rows.iter().enumerate() {
            let thickness = row.iter().map(|&n| depth(n)).fold(0.0_f32, f32::max);
            let mut along = options.margin + (widest - row_breadths[rank]) / 2.0;
            for &node in row {
                let main = along + breadth(node) / 2.0;
                let cross = rank_cursor + thickness / 2.0;
                centers[node] = if horizontal {
                    Point::new(cross, main)
                } else {
                    Point::new(main, cross)
                };
                along += breadth(node) + options.node_spacing;
            }
            rank_mid[rank] = rank_cursor + thickness + options.rank_spacing / 2.0;
            rank_cursor += thickness + options.rank_spacing;
        }

        let total_depth = (rank_cursor - options.rank_spacing).max(0.0) + options.margin;
        if matches!(options.direction, Direction::BottomTop | Direction::RightLeft) {
            for center in &mut centers {
                if horizontal {
                    center.x = total_depth + options.margin - center.x;
                } else {
                    center.y = total_depth + options.margin - center.y;
                }
            }
        }

        let mut positioned = PositionedGraph::default();
        for (idx, node) in graph.nodes.iter().enumerate() {
            positioned.centers.insert(node.id.clone(), centers[idx]);
        }
        for (from, to) in &graph.edges {
            let (Some(&a), Some(&b)) = (index.get(from.as_str()), index.get(to.as_str())) else {
                continue;
            };
            let (start, end) = (centers[a], centers[b]);
            let mid = if horizontal {
                (start.x + end.x) / 2.0
            } else {
                (start.y + end.y) / 2.0
            };
            let route = if horizontal {
                vec![start, Point::new(mid, start.y), Point::new(mid, end.y), end]
            } else {
                vec![start, Point::new(start.x, mid), Point::new(end.x, mid), end]
            };
            positioned.routes.insert((from.clone(), to.clone()), route);
        }
        positioned
    }
}

/// Drops the edges that close a cycle, walking nodes in declaration order.
fn acyclic_edges(successors: &[Vec<usize>]) -> Vec<Vec<usize>> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        New,
        Active,
        Done,
    }
    let mut marks = vec![Mark::New; successors.len()];
    let mut forward: Vec<Vec<usize>> = vec![Vec::new(); successors.len()];
    for root in 0..successors.len() {
        if marks[root] != Mark::New {
            continue;
        }
        let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
        marks[root] = Mark::Active;
        while let Some((node, cursor)) = stack.pop() {
            if let Some(&next) = successors[node].get(cursor) {
                stack.push((node, cursor + 1));
                match marks[next] {
                    Mark::Active => {}
                    Mark::Done => forward[node].push(next),
                    Mark::New => {
                        forward[node].push(next);
                        marks[next] = Mark::Active;
                        stack.push((next, 0));
                    }
                }
            } else {
                marks[node] = Mark::Done;
            }
        }
    }
    forward
}

fn topological_order(forward: &[Vec<usize>]) -> Vec<usize> {
    let mut indegree = vec![0usize; forward.len()];
    for targets in forward {
        for &t in targets {
            indegree[t] += 1;
        }
    }
    let mut ready: std::collections::VecDeque<usize> =
        (0..forward.len()).filter(|&n| indegree[n] == 0).collect();
    let mut order = Vec::with_capacity(forward.len());
    while let Some(node) = ready.pop_front() {
        order.push(node);
        for &next in &forward[node] {
            indegree[next] -= 1;
            if indegree[next] == 0 {
                ready.push_back(next);
            }
        }
    }
    order
}

/// True when any two placed node boxes intersect.
fn has_overlaps(graph: &LayoutGraph, positioned: &PositionedGraph) -> bool {
    let boxes: Vec<Bounds> = graph
        .nodes
        .iter()
        .filter_map(|node| {
            let center = positioned.centers.get(&node.id)?;
            Some(Bounds::from_center(*center, node.width, node.height))
        })
        .collect();
    boxes.iter().enumerate().any(|(i, a)| {
        boxes[i + 1..].iter().any(|b| {
            a.overlaps_horizontally(b) && a.y < b.bottom() && b.y < a.bottom()
        })
    })
}

fn node_size(shape: NodeShape, config: &FlowchartConfig) -> (f32, f32) {
    match shape {
        NodeShape::Diamond => (config.diamond_width, config.diamond_height),
        NodeShape::Rectangle | NodeShape::Ellipse => (config.rect_width, config.rect_height),
    }
}

fn node_style(shape: NodeShape, theme: &Theme) -> Style {
    let base = match shape {
        NodeShape::Rectangle => Style::parse("whiteSpace=wrap;html=1;"),
        NodeShape::Diamond => Style::parse("shape=rhombus;perimeter=rhombusPerimeter;whiteSpace=wrap;html=1;"),
        NodeShape::Ellipse => Style::parse("shape=ellipse;perimeter=ellipsePerimeter;whiteSpace=wrap;html=1;"),
    };
    let style = base
        .set("fontSize", theme.font_size)
        .set("fillColor", &theme.primary_color)
        .set("strokeColor", &theme.primary_border_color);
    if shape == NodeShape::Rectangle {
        style.set("rounded", 1)
    } else {
        style
    }
}

fn edge_style(style: EdgeStyle, arrow: ArrowKind, theme: &Theme) -> Style {
    let base = Style::parse(
        "edgeStyle=orthogonalEdgeStyle;rounded=1;curved=1;html=1;endArrow=classic;strokeWidth=2;spacing=10;",
    )
    .set("labelBackgroundColor", &theme.edge_label_background)
    .set("strokeColor", &theme.line_color);
    let base = match arrow {
        ArrowKind::None => base.set("endArrow", "none"),
        _ => base,
    };
    match style {
        EdgeStyle::Solid => base,
        EdgeStyle::Dashed => base.set("dashed", 1),
        EdgeStyle::Thick => base.set("strokeWidth", 3),
    }
}

pub(super) fn compute_flowchart_layout(
    chart: &Flowchart,
    theme: &Theme,
    config: &LayoutConfig,
) -> Layout {
    let flow = &config.flowchart;

    // Endpoints that were never declared become default rectangles.
    let mut shapes: Vec<(String, String, NodeShape)> = chart
        .nodes
        .iter()
        .map(|n| (n.id.clone(), n.label.clone(), n.shape))
        .collect();
    let mut known: HashSet<String> = shapes.iter().map(|(id, _, _)| id.clone()).collect();
    for edge in &chart.edges {
        for id in [&edge.from, &edge.to] {
            if known.insert(id.clone()) {
                shapes.push((id.clone(), id.clone(), NodeShape::Rectangle));
            }
        }
    }

    let mut graph = LayoutGraph::default();
    for (id, _, shape) in &shapes {
        let (width, height) = node_size(*shape, flow);
        graph.nodes.push(LayoutNode {
            id: id.clone(),
            width,
            height,
        });
    }
    let mut seen_edges = HashSet::new();
    for edge in &chart.edges {
        if edge.from != edge.to && seen_edges.insert((edge.from.clone(), edge.to.clone())) {
            graph.edges.push((edge.from.clone(), edge.to.clone()));
        }
    }

    let options = GraphLayoutOptions::from_config(chart.direction, flow);
    let mut positioned = match flow.engine {
        GraphEngine::Dagre => DagreLayouter.layout(&graph, &options),
        GraphEngine::Ranked => RankedLayouter.layout(&graph, &options),
    };
    if positioned.centers.len() < graph.nodes.len() {
        warn!("graph layout left nodes unplaced, using ranked placement");
        positioned = RankedLayouter.layout(&graph, &options);
    } else if has_overlaps(&graph, &positioned) {
        warn!("graph layout stacked nodes on each other, using ranked placement");
        positioned = RankedLayouter.layout(&graph, &options);
    }

    let mut builder = LayoutBuilder::new(DiagramKind::Flowchart);
    let mut cell_ids: HashMap<String, String> = HashMap::new();
    for ((id, label, shape), node) in shapes.iter().zip(&graph.nodes) {
        let center = positioned.centers.get(id).copied().unwrap_or_default();
        let cell_id = builder.ids.claim(id);
        builder.add_vertex(
            1,
            VertexCell::new(
                cell_id.clone(),
                label.as_str(),
                node_style(*shape, theme),
                Bounds::from_center(center, node.width, node.height),
            ),
        );
        cell_ids.insert(id.clone(), cell_id);
    }

    for edge in &chart.edges {
        let (Some(source), Some(target)) = (cell_ids.get(&edge.from), cell_ids.get(&edge.to))
        else {
            continue;
        };
        let route = positioned
            .routes
            .get(&(edge.from.clone(), edge.to.clone()))
            .map(|points| trim_waypoints(points))
            .unwrap_or_default();
        let id = builder.ids.next("edge");
        builder.add_edge(
            0,
            EdgeCell::new(
                id,
                edge.label.clone().unwrap_or_default(),
                edge_style(edge.style, edge.arrow, theme),
            )
            .connect(source, target)
            .with_waypoints(route),
        );
    }

    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{FlowEdge, FlowNode};

    fn chain(direction: Direction) -> Flowchart {
        let node = |id: &str, shape| FlowNode {
            id: id.to_string(),
            label: id.to_string(),
            shape,
        };
        let edge = |from: &str, to: &str| FlowEdge {
            from: from.to_string(),
            to: to.to_string(),
            label: None,
            style: EdgeStyle::Solid,
            arrow: ArrowKind::Classic,
        };
        Flowchart {
            direction,
            nodes: vec![
                node("A", NodeShape::Rectangle),
                node("B", NodeShape::Diamond),
                node("C", NodeShape::Rectangle),
            ],
            edges: vec![edge("A", "B"), edge("B", "C"), edge("C", "A"), edge("B", "D")],
        }
    }

    fn ranked_config() -> LayoutConfig {
        let mut config = LayoutConfig::default();
        config.flowchart.engine = GraphEngine::Ranked;
        config
    }

    #[test]
    fn ranked_layout_tolerates_cycles_and_synthesizes_endpoints() {
        let layout = compute_flowchart_layout(&chain(Direction::TopDown), &Theme::default(), &ranked_config());
        let a = layout.vertex("A").unwrap().bounds;
        let b = layout.vertex("B").unwrap().bounds;
        let c = layout.vertex("C").unwrap().bounds;
        let d = layout.vertex("D").unwrap();
        assert_eq!(d.value, "D");
        assert_eq!((b.width, b.height), (160.0, 100.0));
        assert!(a.bottom() < b.y);
        assert!(b.bottom() < c.y);
        assert_eq!(c.y, d.bounds.y);
        assert!(!c.overlaps_horizontally(&d.bounds));
        assert_eq!(layout.edges().count(), 4);
        assert!(layout.validate().is_ok());
    }

    #[test]
    fn ranked_layout_respects_direction() {
        let layout = compute_flowchart_layout(&chain(Direction::LeftRight), &Theme::default(), &ranked_config());
        let a = layout.vertex("A").unwrap().bounds;
        let b = layout.vertex("B").unwrap().bounds;
        assert!(a.right() < b.x);

        let layout = compute_flowchart_layout(&chain(Direction::BottomTop), &Theme::default(), &ranked_config());
        let a = layout.vertex("A").unwrap().bounds;
        let b = layout.vertex("B").unwrap().bounds;
        assert!(b.bottom() < a.y);
    }

    #[test]
    fn edges_carry_trimmed_bends_and_styles() {
        let mut chart = chain(Direction::TopDown);
        chart.edges[0].style = EdgeStyle::Dashed;
        chart.edges[1].arrow = ArrowKind::None;
        let layout = compute_flowchart_layout(&chart, &Theme::default(), &ranked_config());
        let first = layout.edge("edge_0").unwrap();
        assert_eq!(first.source.as_deref(), Some("A"));
        assert_eq!(first.waypoints.len(), 2);
        assert_eq!(first.style.get("dashed"), Some("1"));
        assert_eq!(layout.edge("edge_1").unwrap().style.get("endArrow"), Some("none"));
    }

    #[test]
    fn ranked_layout_is_deterministic() {
        let chart = chain(Direction::TopDown);
        let a = compute_flowchart_layout(&chart, &Theme::default(), &ranked_config());
        let b = compute_flowchart_layout(&chart, &Theme::default(), &ranked_config());
        assert_eq!(a, b);
    }

    fn parsed(src: &str) -> Flowchart {
        match crate::parser::parse_mermaid(src, None).unwrap().diagram {
            Diagram::Flowchart(chart) => chart,
            other => panic!("unexpected {:?}", other.kind()),
        }
    }

    fn assert_no_overlaps(layout: &Layout) {
        let boxes: Vec<(&str, Bounds)> = layout.vertices().map(|v| (v.id.as_str(), v.bounds)).collect();
        for (i, (a_id, a)) in boxes.iter().enumerate() {
            for (b_id, b) in &boxes[i + 1..] {
                let disjoint = !a.overlaps_horizontally(b) || a.bottom() <= b.y || b.bottom() <= a.y;
                assert!(disjoint, "{a_id} {a:?} overlaps {b_id} {b:?}");
            }
        }
    }

    #[test]
    fn default_engine_keeps_siblings_apart() {
        let layout = compute_flowchart_layout(
            &parsed("graph TD\nA --> B\nA --> C"),
            &Theme::default(),
            &LayoutConfig::default(),
        );
        let a = layout.vertex("A").unwrap().bounds;
        let b = layout.vertex("B").unwrap().bounds;
        let c = layout.vertex("C").unwrap().bounds;
        assert!(a.bottom() <= b.y);
        assert_eq!(b.y, c.y);
        assert_ne!(b.center(), c.center());
        assert_no_overlaps(&layout);

        let layout = compute_flowchart_layout(
            &parsed("graph LR\nA --> B\nA --> C"),
            &Theme::default(),
            &LayoutConfig::default(),
        );
        let b = layout.vertex("B").unwrap().bounds;
        let c = layout.vertex("C").unwrap().bounds;
        assert_eq!(b.x, c.x);
        assert_ne!(b.center(), c.center());
        assert_no_overlaps(&layout);
    }

    #[test]
    fn default_engine_spreads_a_wider_graph() {
        let src = "flowchart TD\nA --> B\nA --> C\nA --> D\nB --> E\nB --> F\nC --> G\nD --> H\nD --> I\nI --> J\nE --> J";
        let layout = compute_flowchart_layout(&parsed(src), &Theme::default(), &LayoutConfig::default());
        assert_eq!(layout.vertices().count(), 10);
        assert_no_overlaps(&layout);
    }

    #[test]
    fn stacked_placements_are_detected() {
        let graph = LayoutGraph {
            nodes: ["A", "B"]
                .iter()
                .map(|id| LayoutNode {
                    id: id.to_string(),
                    width: 140.0,
                    height: 70.0,
                })
                .collect(),
            edges: Vec::new(),
        };
        let mut positioned = PositionedGraph::default();
        positioned.centers.insert("A".into(), Point::new(70.0, 35.0));
        positioned.centers.insert("B".into(), Point::new(70.0, 35.0));
        assert!(has_overlaps(&graph, &positioned));

        positioned.centers.insert("B".into(), Point::new(330.0, 35.0));
        assert!(!has_overlaps(&graph, &positioned));
    }
}
