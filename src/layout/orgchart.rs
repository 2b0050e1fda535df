use super::*;
use crate::ir::OrgChart;
use std::collections::{HashMap, VecDeque};

/// Depth of every node, in the order nodes were first reached.
///
/// Roots (nodes never named as a child) are walked breadth-first in
/// declaration order; a node keeps the depth of its first visit. Nodes left
/// unvisited afterwards only sit on cycles and start traversals of their own.
fn assign_levels(chart: &OrgChart) -> Vec<Vec<usize>> {
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); chart.nodes.len()];
    let mut has_parent = vec![false; chart.nodes.len()];
    for edge in &chart.edges {
        if let (Some(parent), Some(child)) =
            (chart.node_index(&edge.parent), chart.node_index(&edge.child))
        {
            children[parent].push(child);
            has_parent[child] = true;
        }
    }

    let mut depth: Vec<Option<usize>> = vec![None; chart.nodes.len()];
    let mut levels: Vec<Vec<usize>> = Vec::new();
    let roots = (0..chart.nodes.len()).filter(|&n| !has_parent[n]);
    let leftovers = 0..chart.nodes.len();
    for root in roots.chain(leftovers) {
        if depth[root].is_some() {
            continue;
        }
        depth[root] = Some(0);
        let mut queue = VecDeque::from([root]);
        while let Some(node) = queue.pop_front() {
            let level = depth[node].unwrap_or_default();
            if levels.len() <= level {
                levels.resize_with(level + 1, Vec::new);
            }
            levels[level].push(node);
            for &child in &children[node] {
                if depth[child].is_none() {
                    depth[child] = Some(level + 1);
                    queue.push_back(child);
                }
            }
        }
    }
    levels
}

pub(super) fn compute_org_chart_layout(
    chart: &OrgChart,
    theme: &Theme,
    config: &LayoutConfig,
) -> Layout {
    let org = &config.orgchart;
    let mut builder = LayoutBuilder::new(DiagramKind::Org);
    let mut cell_ids: HashMap<&str, String> = HashMap::new();

    for (depth, level) in assign_levels(chart).iter().enumerate() {
        let count = level.len() as f32;
        let total_width = count * org.node_width + (count - 1.0).max(0.0) * org.sibling_gap;
        let start_x = org.canvas_center_x - total_width / 2.0;
        let y = org.base_y + depth as f32 * org.level_height;

        let mut style = Style::parse(
            "rounded=1;whiteSpace=wrap;html=1;fontStyle=1;glass=0;dropShadow=0;",
        )
        .set("fontSize", theme.font_size)
        .set("fontFamily", &theme.font_family);
        if let Some(color) = theme.org_level(depth) {
            style = style
                .set("fillColor", &color.fill)
                .set("strokeColor", &color.stroke);
        }

        for (slot, &node) in level.iter().enumerate() {
            let node = &chart.nodes[node];
            let x = start_x + slot as f32 * (org.node_width + org.sibling_gap);
            let id = builder.ids.claim(&node.id);
            builder.add_vertex(
                1,
                VertexCell::new(
                    id.clone(),
                    node.label.as_str(),
                    style.clone(),
                    Bounds::new(x, y, org.node_width, org.node_height),
                ),
            );
            cell_ids.insert(node.id.as_str(), id);
        }
    }

    let edge_style = Style::parse(
        "edgeStyle=orthogonalEdgeStyle;rounded=0;orthogonalLoop=1;jettySize=auto;html=1;\
         exitX=0.5;exitY=1;exitDx=0;exitDy=0;entryX=0.5;entryY=0;entryDx=0;entryDy=0;strokeWidth=1;",
    )
    .set("strokeColor", &theme.muted_line_color);
    for edge in &chart.edges {
        let (Some(parent), Some(child)) = (
            cell_ids.get(edge.parent.as_str()),
            cell_ids.get(edge.child.as_str()),
        ) else {
            warn!(parent = edge.parent.as_str(), child = edge.child.as_str(); "org edge endpoint was never placed");
            continue;
        };
        let id = builder.ids.next("edge");
        builder.add_edge(
            0,
            EdgeCell::new(id, "", edge_style.clone()).connect(parent, child),
        );
    }

    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_mermaid;

    fn layout(src: &str) -> Layout {
        let parsed = parse_mermaid(src, Some(DiagramKind::Org)).unwrap();
        crate::layout::compute_layout(&parsed.diagram, &Theme::default(), &LayoutConfig::default())
    }

    #[test]
    fn children_sit_one_level_below_parents() {
        let layout = layout(
            "graph TD\nCEO[Chief] --> CTO\nCEO --> CFO\nCTO --> Dev1\nCTO --> Dev2\nCFO --> Acct\n",
        );
        let y = |id: &str| layout.vertex(id).unwrap().bounds.y;
        assert_eq!(y("CEO"), 100.0);
        assert_eq!(y("CTO"), 250.0);
        assert_eq!(y("Dev1"), 400.0);
        assert_eq!(y("Acct"), 400.0);
        assert_eq!(layout.vertex("CEO").unwrap().value, "Chief");
        for edge in layout.edges() {
            let parent = y(edge.source.as_deref().unwrap());
            let child = y(edge.target.as_deref().unwrap());
            assert_eq!(child - parent, 150.0);
        }
    }

    #[test]
    fn levels_are_centered_and_never_overlap() {
        let layout = layout("graph TD\nA --> B\nA --> C\nA --> D\n");
        let mut row: Vec<Bounds> = ["B", "C", "D"]
            .iter()
            .map(|id| layout.vertex(id).unwrap().bounds)
            .collect();
        row.sort_by(|a, b| a.x.total_cmp(&b.x));
        for pair in row.windows(2) {
            assert!(pair[0].right() <= pair[1].x);
        }
        // 3 * 140 + 2 * 60 = 540, centered on 500.
        assert_eq!(row[0].x, 230.0);
        assert_eq!(layout.vertex("A").unwrap().bounds.x, 430.0);
    }

    #[test]
    fn depth_colors_clamp_and_cycles_are_placed() {
        let layout = layout("graph TD\nA-->B\nB-->C\nC-->D\nD-->E\nX-->Y\nY-->X\n");
        let fill = |id: &str| layout.vertex(id).unwrap().style.get("fillColor").map(str::to_string);
        assert_eq!(fill("A").as_deref(), Some("#dae8fc"));
        assert_eq!(fill("D"), fill("E"));
        assert!(layout.vertex("X").is_some());
        assert!(layout.vertex("Y").is_some());
        assert!(layout.validate().is_ok());
    }
}
