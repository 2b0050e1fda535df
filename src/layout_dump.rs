use crate::error::ConvertError;
use crate::geometry::{Bounds, Point};
use crate::layout::{CellBody, Layout};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub kind: String,
    pub page: String,
    pub width: f32,
    pub height: f32,
    pub cells: Vec<CellDump>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CellDump {
    Vertex {
        id: String,
        z: i32,
        parent: String,
        value: String,
        style: String,
        bounds: Bounds,
        absolute: Option<Bounds>,
    },
    Edge {
        id: String,
        z: i32,
        source: Option<String>,
        target: Option<String>,
        value: String,
        style: String,
        points: Vec<Point>,
    },
}

impl LayoutDump {
    pub fn from_layout(layout: &Layout) -> Self {
        let cells = layout
            .ordered_cells()
            .into_iter()
            .map(|cell| match &cell.body {
                CellBody::Vertex(vertex) => CellDump::Vertex {
                    id: vertex.id.clone(),
                    z: cell.z,
                    parent: vertex.parent.clone(),
                    value: vertex.value.clone(),
                    style: vertex.style.to_string(),
                    bounds: vertex.bounds,
                    absolute: layout.absolute_bounds(&vertex.id),
                },
                CellBody::Edge(edge) => CellDump::Edge {
                    id: edge.id.clone(),
                    z: cell.z,
                    source: edge.source.clone(),
                    target: edge.target.clone(),
                    value: edge.value.clone(),
                    style: edge.style.to_string(),
                    points: edge
                        .source_point
                        .iter()
                        .chain(edge.waypoints.iter())
                        .chain(edge.target_point.iter())
                        .copied()
                        .collect(),
                },
            })
            .collect();

        LayoutDump {
            kind: format!("{:?}", layout.kind),
            page: layout.page_name.clone(),
            width: layout.width,
            height: layout.height,
            cells,
        }
    }
}

pub fn write_layout_dump(path: &Path, layout: &Layout) -> Result<(), ConvertError> {
    let file = File::create(path).map_err(|source| ConvertError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout);
    serde_json::to_writer_pretty(writer, &dump).map_err(|err| ConvertError::Emit(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::layout::compute_layout;
    use crate::parser::parse_mermaid;
    use crate::theme::Theme;

    #[test]
    fn dump_lists_cells_in_paint_order() {
        let parsed = parse_mermaid("kanban\n  todo[To Do]\n    t1[Write]\n", None).unwrap();
        let layout = compute_layout(&parsed.diagram, &Theme::default(), &LayoutConfig::default());
        let json = serde_json::to_value(LayoutDump::from_layout(&layout)).unwrap();
        assert_eq!(json["kind"], "Kanban");
        let cells = json["cells"].as_array().unwrap();
        assert_eq!(cells[0]["id"], "todo");
        assert_eq!(cells[1]["type"], "vertex");
        assert_eq!(cells[1]["absolute"]["y"], 30.0);
    }

    #[test]
    fn writes_pretty_json() {
        let parsed = parse_mermaid("pie\n\"a\" : 1\n", None).unwrap();
        let layout = compute_layout(&parsed.diagram, &Theme::default(), &LayoutConfig::default());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout.json");
        write_layout_dump(&path, &layout).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"page\": \"Pie Chart\""));
    }
}
