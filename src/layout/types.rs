use std::collections::{HashMap, HashSet};

use crate::error::ConvertError;
use crate::geometry::{Bounds, Point, bounding_box};
use crate::ir::DiagramKind;
use crate::style::Style;

pub const ROOT_CELL_ID: &str = "0";
pub const LAYER_CELL_ID: &str = "1";

/// Smallest page the emitted document advertises.
pub const MIN_PAGE_WIDTH: f32 = 1169.0;
pub const MIN_PAGE_HEIGHT: f32 = 827.0;

#[derive(Debug, Clone, PartialEq)]
pub struct VertexCell {
    pub id: String,
    pub value: String,
    pub style: Style,
    pub parent: String,
    /// Position relative to `parent`; absolute when the parent is the layer.
    pub bounds: Bounds,
    pub label_offset: Option<Point>,
}

impl VertexCell {
    pub fn new(id: String, value: impl Into<String>, style: Style, bounds: Bounds) -> Self {
        Self {
            id,
            value: value.into(),
            style,
            parent: LAYER_CELL_ID.to_string(),
            bounds,
            label_offset: None,
        }
    }

    #[must_use]
    pub fn with_parent(mut self, parent: &str) -> Self {
        self.parent = parent.to_string();
        self
    }

    #[must_use]
    pub fn with_label_offset(mut self, offset: Point) -> Self {
        self.label_offset = Some(offset);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeCell {
    pub id: String,
    pub value: String,
    pub style: Style,
    pub parent: String,
    pub source: Option<String>,
    pub target: Option<String>,
    pub source_point: Option<Point>,
    pub target_point: Option<Point>,
    /// Intermediate points, already trimmed of node-center anchors.
    pub waypoints: Vec<Point>,
}

impl EdgeCell {
    pub fn new(id: String, value: impl Into<String>, style: Style) -> Self {
        Self {
            id,
            value: value.into(),
            style,
            parent: LAYER_CELL_ID.to_string(),
            source: None,
            target: None,
            source_point: None,
            target_point: None,
            waypoints: Vec::new(),
        }
    }

    #[must_use]
    pub fn connect(mut self, source: &str, target: &str) -> Self {
        self.source = Some(source.to_string());
        self.target = Some(target.to_string());
        self
    }

    #[must_use]
    pub fn with_terminal_points(mut self, source: Point, target: Point) -> Self {
        self.source_point = Some(source);
        self.target_point = Some(target);
        self
    }

    #[must_use]
    pub fn with_waypoints(mut self, waypoints: Vec<Point>) -> Self {
        self.waypoints = waypoints;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellBody {
    Vertex(VertexCell),
    Edge(EdgeCell),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// Paint order; lower values are drawn first. Equal values keep
    /// insertion order.
    pub z: i32,
    pub body: CellBody,
}

impl Cell {
    pub fn id(&self) -> &str {
        match &self.body {
            CellBody::Vertex(v) => &v.id,
            CellBody::Edge(e) => &e.id,
        }
    }

    pub fn parent(&self) -> &str {
        match &self.body {
            CellBody::Vertex(v) => &v.parent,
            CellBody::Edge(e) => &e.parent,
        }
    }
}

/// The geometry-annotated document for one diagram.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub kind: DiagramKind,
    pub page_name: String,
    pub cells: Vec<Cell>,
    pub width: f32,
    pub height: f32,
}

impl Layout {
    /// Cells in paint order.
    pub fn ordered_cells(&self) -> Vec<&Cell> {
        let mut cells: Vec<&Cell> = self.cells.iter().collect();
        cells.sort_by_key(|cell| cell.z);
        cells
    }

    pub fn vertices(&self) -> impl Iterator<Item = &VertexCell> {
        self.cells.iter().filter_map(|cell| match &cell.body {
            CellBody::Vertex(v) => Some(v),
            CellBody::Edge(_) => None,
        })
    }

    pub fn edges(&self) -> impl Iterator<Item = &EdgeCell> {
        self.cells.iter().filter_map(|cell| match &cell.body {
            CellBody::Edge(e) => Some(e),
            CellBody::Vertex(_) => None,
        })
    }

    pub fn vertex(&self, id: &str) -> Option<&VertexCell> {
        self.vertices().find(|v| v.id == id)
    }

    pub fn edge(&self, id: &str) -> Option<&EdgeCell> {
        self.edges().find(|e| e.id == id)
    }

    /// Bounds of a vertex in page coordinates, resolving nested parents.
    pub fn absolute_bounds(&self, id: &str) -> Option<Bounds> {
        let mut vertex = self.vertex(id)?;
        let mut bounds = vertex.bounds;
        let mut seen = HashSet::new();
        while vertex.parent != LAYER_CELL_ID && seen.insert(vertex.parent.as_str()) {
            let Some(parent) = self.vertex(&vertex.parent) else {
                break;
            };
            bounds.x += parent.bounds.x;
            bounds.y += parent.bounds.y;
            vertex = parent;
        }
        Some(bounds)
    }

    /// Extent of everything drawn, in page coordinates.
    pub fn extent(&self) -> Option<Bounds> {
        let mut boxes: Vec<Bounds> = self
            .vertices()
            .filter_map(|v| self.absolute_bounds(&v.id))
            .collect();
        for edge in self.edges() {
            let points = edge
                .source_point
                .iter()
                .chain(edge.target_point.iter())
                .chain(edge.waypoints.iter());
            boxes.extend(points.map(|p| Bounds::new(p.x, p.y, 0.0, 0.0)));
        }
        bounding_box(boxes.iter())
    }

    /// Checks that ids are unique and that every reference resolves.
    pub fn validate(&self) -> Result<(), ConvertError> {
        let mut ids: HashSet<&str> = HashSet::from([ROOT_CELL_ID, LAYER_CELL_ID]);
        for cell in &self.cells {
            if !ids.insert(cell.id()) {
                return Err(ConvertError::LayoutInvariant(format!(
                    "duplicate cell id '{}'",
                    cell.id()
                )));
            }
        }
        for cell in &self.cells {
            if !ids.contains(cell.parent()) {
                return Err(ConvertError::LayoutInvariant(format!(
                    "cell '{}' has unknown parent '{}'",
                    cell.id(),
                    cell.parent()
                )));
            }
            if let CellBody::Edge(edge) = &cell.body {
                for (end, reference) in [("source", &edge.source), ("target", &edge.target)] {
                    if let Some(reference) = reference
                        && !ids.contains(reference.as_str())
                    {
                        return Err(ConvertError::LayoutInvariant(format!(
                            "edge '{}' has unknown {end} '{reference}'",
                            edge.id
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Per-document id source. User keys are kept verbatim when free; synthetic
/// ids are `prefix_N` with a counter per prefix.
#[derive(Debug, Default)]
pub struct IdAllocator {
    used: HashSet<String>,
    counters: HashMap<String, usize>,
}

impl IdAllocator {
    pub fn new() -> Self {
        let mut used = HashSet::new();
        used.insert(ROOT_CELL_ID.to_string());
        used.insert(LAYER_CELL_ID.to_string());
        Self {
            used,
            counters: HashMap::new(),
        }
    }

    /// Claims `key`, or `key_2`, `key_3`... when it is already taken.
    pub fn claim(&mut self, key: &str) -> String {
        if self.used.insert(key.to_string()) {
            return key.to_string();
        }
        let mut suffix = 2;
        loop {
            let candidate = format!("{key}_{suffix}");
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            suffix += 1;
        }
    }

    pub fn next(&mut self, prefix: &str) -> String {
        loop {
            let counter = self.counters.entry(prefix.to_string()).or_insert(0);
            let candidate = format!("{prefix}_{counter}");
            *counter += 1;
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

/// Collects cells for one document and computes the page size when done.
#[derive(Debug)]
pub struct LayoutBuilder {
    kind: DiagramKind,
    pub ids: IdAllocator,
    cells: Vec<Cell>,
}

impl LayoutBuilder {
    pub fn new(kind: DiagramKind) -> Self {
        Self {
            kind,
            ids: IdAllocator::new(),
            cells: Vec::new(),
        }
    }

    pub fn add_vertex(&mut self, z: i32, vertex: VertexCell) -> String {
        let id = vertex.id.clone();
        self.cells.push(Cell {
            z,
            body: CellBody::Vertex(vertex),
        });
        id
    }

    pub fn add_edge(&mut self, z: i32, edge: EdgeCell) -> String {
        let id = edge.id.clone();
        self.cells.push(Cell {
            z,
            body: CellBody::Edge(edge),
        });
        id
    }

    pub fn finish(self) -> Layout {
        let mut layout = Layout {
            kind: self.kind,
            page_name: self.kind.page_name().to_string(),
            cells: self.cells,
            width: MIN_PAGE_WIDTH,
            height: MIN_PAGE_HEIGHT,
        };
        if let Some(extent) = layout.extent() {
            layout.width = extent.right().max(MIN_PAGE_WIDTH);
            layout.height = extent.bottom().max(MIN_PAGE_HEIGHT);
        }
        layout
    }
}
