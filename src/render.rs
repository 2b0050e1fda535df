use crate::error::ConvertError;
use crate::geometry::Point;
use crate::layout::{CellBody, EdgeCell, LAYER_CELL_ID, Layout, ROOT_CELL_ID, VertexCell};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use std::io::Cursor;
use std::path::Path;

type XmlWriter = Writer<Cursor<Vec<u8>>>;

/// Serializes a laid-out diagram as an uncompressed draw.io document.
///
/// The layout is validated first; nothing is produced for a layout with
/// duplicate ids or dangling references.
pub fn render_drawio(layout: &Layout) -> Result<String, ConvertError> {
    layout.validate()?;

    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    emit(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    start(&mut writer, "mxfile", &[("host", "Electron"), ("type", "device")])?;
    let diagram_id = format!("diagram-{}", layout.page_name.to_lowercase().replace(' ', "-"));
    start(
        &mut writer,
        "diagram",
        &[("name", layout.page_name.as_str()), ("id", diagram_id.as_str())],
    )?;
    let page_width = format_number(layout.width.ceil());
    let page_height = format_number(layout.height.ceil());
    start(
        &mut writer,
        "mxGraphModel",
        &[
            ("dx", "0"),
            ("dy", "0"),
            ("grid", "1"),
            ("gridSize", "10"),
            ("guides", "1"),
            ("tooltips", "1"),
            ("connect", "1"),
            ("arrows", "1"),
            ("fold", "1"),
            ("page", "1"),
            ("pageScale", "1"),
            ("pageWidth", page_width.as_str()),
            ("pageHeight", page_height.as_str()),
            ("math", "0"),
            ("shadow", "0"),
        ],
    )?;
    start(&mut writer, "root", &[])?;
    empty(&mut writer, "mxCell", &[("id", ROOT_CELL_ID)])?;
    empty(&mut writer, "mxCell", &[("id", LAYER_CELL_ID), ("parent", ROOT_CELL_ID)])?;

    for cell in layout.ordered_cells() {
        match &cell.body {
            CellBody::Vertex(vertex) => write_vertex(&mut writer, vertex)?,
            CellBody::Edge(edge) => write_edge(&mut writer, edge)?,
        }
    }

    end(&mut writer, "root")?;
    end(&mut writer, "mxGraphModel")?;
    end(&mut writer, "diagram")?;
    end(&mut writer, "mxfile")?;

    let bytes = writer.into_inner().into_inner();
    String::from_utf8(bytes).map_err(|err| ConvertError::Emit(err.to_string()))
}

fn write_vertex(writer: &mut XmlWriter, vertex: &VertexCell) -> Result<(), ConvertError> {
    let style = vertex.style.to_string();
    start(
        writer,
        "mxCell",
        &[
            ("id", vertex.id.as_str()),
            ("value", vertex.value.as_str()),
            ("style", style.as_str()),
            ("vertex", "1"),
            ("parent", vertex.parent.as_str()),
        ],
    )?;
    let b = vertex.bounds;
    let (x, y, w, h) = (
        format_number(b.x),
        format_number(b.y),
        format_number(b.width),
        format_number(b.height),
    );
    let attrs = [
        ("x", x.as_str()),
        ("y", y.as_str()),
        ("width", w.as_str()),
        ("height", h.as_str()),
        ("as", "geometry"),
    ];
    match vertex.label_offset {
        Some(offset) => {
            start(writer, "mxGeometry", &attrs)?;
            write_point(writer, offset, Some("offset"))?;
            end(writer, "mxGeometry")?;
        }
        None => empty(writer, "mxGeometry", &attrs)?,
    }
    end(writer, "mxCell")
}

fn write_edge(writer: &mut XmlWriter, edge: &EdgeCell) -> Result<(), ConvertError> {
    let style = edge.style.to_string();
    let mut attrs = vec![
        ("id", edge.id.as_str()),
        ("value", edge.value.as_str()),
        ("style", style.as_str()),
        ("edge", "1"),
        ("parent", edge.parent.as_str()),
    ];
    if let Some(source) = &edge.source {
        attrs.push(("source", source.as_str()));
    }
    if let Some(target) = &edge.target {
        attrs.push(("target", target.as_str()));
    }
    start(writer, "mxCell", &attrs)?;

    let geometry = [("relative", "1"), ("as", "geometry")];
    if edge.source_point.is_none() && edge.target_point.is_none() && edge.waypoints.is_empty() {
        empty(writer, "mxGeometry", &geometry)?;
        return end(writer, "mxCell");
    }
    start(writer, "mxGeometry", &geometry)?;
    if let Some(point) = edge.source_point {
        write_point(writer, point, Some("sourcePoint"))?;
    }
    if let Some(point) = edge.target_point {
        write_point(writer, point, Some("targetPoint"))?;
    }
    if !edge.waypoints.is_empty() {
        start(writer, "Array", &[("as", "points")])?;
        for point in &edge.waypoints {
            write_point(writer, *point, None)?;
        }
        end(writer, "Array")?;
    }
    end(writer, "mxGeometry")?;
    end(writer, "mxCell")
}

fn write_point(writer: &mut XmlWriter, point: Point, role: Option<&str>) -> Result<(), ConvertError> {
    let (x, y) = (format_number(point.x), format_number(point.y));
    let mut attrs = vec![("x", x.as_str()), ("y", y.as_str())];
    if let Some(role) = role {
        attrs.push(("as", role));
    }
    empty(writer, "mxPoint", &attrs)
}

/// Shortest decimal that reads back as the same value; `-0` prints as `0`.
pub fn format_number(value: f32) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    value.to_string()
}

fn emit(writer: &mut XmlWriter, event: Event<'_>) -> Result<(), ConvertError> {
    writer
        .write_event(event)
        .map_err(|err| ConvertError::Emit(err.to_string()))
}

fn element<'a>(name: &'a str, attrs: &[(&'a str, &'a str)]) -> BytesStart<'a> {
    let mut elem = BytesStart::new(name);
    for attr in attrs {
        elem.push_attribute(*attr);
    }
    elem
}

fn start(writer: &mut XmlWriter, name: &str, attrs: &[(&str, &str)]) -> Result<(), ConvertError> {
    emit(writer, Event::Start(element(name, attrs)))
}

fn empty(writer: &mut XmlWriter, name: &str, attrs: &[(&str, &str)]) -> Result<(), ConvertError> {
    emit(writer, Event::Empty(element(name, attrs)))
}

fn end(writer: &mut XmlWriter, name: &str) -> Result<(), ConvertError> {
    emit(writer, Event::End(BytesEnd::new(name)))
}

/// Writes the finished document to `output`, or to stdout when no path is given.
pub fn write_output(contents: &str, output: Option<&Path>) -> Result<(), ConvertError> {
    match output {
        Some(path) => std::fs::write(path, contents).map_err(|source| ConvertError::Write {
            path: path.to_path_buf(),
            source,
        }),
        None => {
            print!("{contents}");
            Ok(())
        }
    }
}
