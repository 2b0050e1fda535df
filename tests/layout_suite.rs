use std::collections::HashSet;
use std::path::Path;

use mermaid_drawio::{Config, DiagramKind, Theme, compute_layout, convert, parse_mermaid, render_drawio};

fn fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    std::fs::read_to_string(&path).expect("fixture read failed")
}

fn render_fixture(name: &str, kind: Option<DiagramKind>) -> String {
    convert(&fixture(name), kind, &Config::default()).expect("conversion failed")
}

fn assert_well_formed(xml: &str, fixture: &str) {
    let doc = roxmltree::Document::parse(xml).unwrap_or_else(|err| panic!("{fixture}: {err}"));
    assert_eq!(doc.root_element().tag_name().name(), "mxfile", "{fixture}");

    let cells: Vec<_> = doc
        .descendants()
        .filter(|n| n.has_tag_name("mxCell"))
        .collect();
    assert!(cells.len() > 2, "{fixture}: no diagram cells");

    let mut ids = HashSet::new();
    for cell in &cells {
        let id = cell.attribute("id").expect("cell without id");
        assert!(ids.insert(id), "{fixture}: duplicate id {id}");
    }
    for cell in &cells {
        for attr in ["parent", "source", "target"] {
            if let Some(reference) = cell.attribute(attr) {
                assert!(
                    ids.contains(reference),
                    "{fixture}: {attr}={reference} does not resolve"
                );
            }
        }
        if cell.attribute("vertex") == Some("1") {
            let geometry = cell
                .children()
                .find(|n| n.has_tag_name("mxGeometry"))
                .unwrap_or_else(|| panic!("{fixture}: vertex without geometry"));
            let width: f32 = geometry.attribute("width").unwrap().parse().unwrap();
            let height: f32 = geometry.attribute("height").unwrap().parse().unwrap();
            assert!(width > 0.0 && height > 0.0, "{fixture}: empty vertex");
        }
    }
}

#[test]
fn render_all_fixtures() {
    // Keep this list explicit so new diagram types must be added intentionally.
    let candidates = [
        ("barchart.mmd", None),
        ("flowchart.mmd", None),
        ("gantt.mmd", None),
        ("journey.mmd", None),
        ("kanban.mmd", None),
        ("orgchart.mmd", None),
        ("pie.mmd", None),
        ("sequence.mmd", None),
        ("swot.mmd", None),
        ("timeline.mmd", None),
    ];
    for (name, kind) in candidates {
        let xml = render_fixture(name, kind);
        assert_well_formed(&xml, name);
    }
}

#[test]
fn output_is_deterministic() {
    for name in ["flowchart.mmd", "sequence.mmd", "gantt.mmd", "journey.mmd"] {
        assert_eq!(render_fixture(name, None), render_fixture(name, None), "{name}");
    }
}

#[test]
fn org_chart_can_be_forced_over_graph_header() {
    let source = "graph TD\n  lead[Lead] --> a[Dev A]\n  lead --> b[Dev B]\n";
    let parsed = parse_mermaid(source, Some(DiagramKind::Org)).unwrap();
    let layout = compute_layout(&parsed.diagram, &Theme::default(), &Config::default().layout);
    assert_eq!(layout.page_name, "Org Chart");
    let lead = layout.vertex("lead").unwrap();
    let a = layout.vertex("a").unwrap();
    assert!(lead.bounds.bottom() < a.bounds.y);
    assert_eq!(layout.edges().count(), 2);
}

#[test]
fn page_covers_every_cell() {
    for name in ["swot.mmd", "kanban.mmd", "timeline.mmd", "barchart.mmd"] {
        let parsed = parse_mermaid(&fixture(name), None).unwrap();
        let layout = compute_layout(&parsed.diagram, &Theme::default(), &Config::default().layout);
        for vertex in layout.vertices() {
            let bounds = layout.absolute_bounds(&vertex.id).unwrap();
            assert!(bounds.right() <= layout.width + 0.5, "{name}: {} overflows", vertex.id);
            assert!(bounds.bottom() <= layout.height + 0.5, "{name}: {} overflows", vertex.id);
        }
        render_drawio(&layout).unwrap();
    }
}

#[test]
fn flowchart_edges_reference_declared_nodes() {
    let xml = render_fixture("flowchart.mmd", None);
    let doc = roxmltree::Document::parse(&xml).unwrap();
    let edges: Vec<_> = doc
        .descendants()
        .filter(|n| n.attribute("edge") == Some("1"))
        .collect();
    assert_eq!(edges.len(), 6);
    let labelled = edges
        .iter()
        .find(|e| e.attribute("value") == Some("Yes"))
        .unwrap();
    assert_eq!(labelled.attribute("source"), Some("B"));
    assert_eq!(labelled.attribute("target"), Some("C"));
}

#[test]
fn unknown_header_is_a_parse_error() {
    let err = convert("not a diagram\nA --> B", None, &Config::default()).unwrap_err();
    assert!(err.to_string().contains("detect"));
}

#[test]
fn flowchart_nodes_never_overlap_on_the_default_engine() {
    for name in ["flowchart.mmd", "orgchart.mmd"] {
        let parsed = parse_mermaid(&fixture(name), None).unwrap();
        let layout = compute_layout(&parsed.diagram, &Theme::default(), &Config::default().layout);
        let boxes: Vec<_> = layout.vertices().map(|v| (v.id.as_str(), v.bounds)).collect();
        for (i, (a_id, a)) in boxes.iter().enumerate() {
            for (b_id, b) in &boxes[i + 1..] {
                let apart = a.right() <= b.x || b.right() <= a.x || a.bottom() <= b.y || b.bottom() <= a.y;
                assert!(apart, "{name}: {a_id} overlaps {b_id}");
            }
        }
    }
}
