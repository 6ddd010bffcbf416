//! Layout for the renderer
//!
//! A [`LayoutAlgorithm`] turns the record store into positioned boxes and
//! routed connections. The renderer draws what it receives and reports
//! gestures back through the state manager.

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, span, trace, Level};

use super::{
    association_bounds, entity_bounds, format_attribute, wrap_label, ConnectionRoute,
    ConnectionRouter, DiagramDatabase, EditorConfig, NodeKind, Point, Rect, Size, TextSpan,
    CHAR_WIDTH_PX,
};

/// Core trait for layout algorithms
///
/// # Example
/// ```
/// use merise::core::{DiagramDatabase, ErLayout, LayoutAlgorithm};
///
/// let layout = ErLayout::default();
/// let positioned = layout.layout(&DiagramDatabase::new()).unwrap();
/// assert!(positioned.nodes.is_empty());
/// ```
pub trait LayoutAlgorithm: Send + Sync {
    /// The output type of this layout algorithm
    type Output;

    /// Arrange the records
    fn layout(&self, database: &DiagramDatabase) -> Result<Self::Output>;

    /// Get the name of this layout algorithm
    fn name(&self) -> &'static str;

    /// Get the version of this layout algorithm
    fn version(&self) -> &'static str;
}

/// One positioned node with its text content
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeBox {
    pub id: String,
    pub kind: NodeKind,
    pub bounds: Rect,
    /// Height of the name band above the attribute rows
    pub header_height: f64,
    /// Node name wrapped to the box width
    pub name_lines: Vec<String>,
    /// One row of styled spans per attribute
    pub rows: Vec<Vec<TextSpan>>,
}

/// Everything needed to draw the diagram
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagramLayout {
    /// Entities first, then associations; later boxes are drawn on top
    pub nodes: Vec<NodeBox>,
    pub connections: Vec<ConnectionRoute>,
    /// Union of all node boxes, `None` for an empty diagram
    pub bounds: Option<Rect>,
    /// Drawing surface: the configured canvas, grown to fit every node
    pub canvas: Size,
}

impl DiagramLayout {
    /// Topmost node containing `point`
    pub fn node_at(&self, point: Point) -> Option<&NodeBox> {
        self.nodes.iter().rev().find(|n| n.bounds.contains(point))
    }

    pub fn node(&self, id: &str) -> Option<&NodeBox> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn connection(&self, id: &str) -> Option<&ConnectionRoute> {
        self.connections.iter().find(|c| c.id == id)
    }
}

/// Lays out entities and associations where the user placed them
#[derive(Debug, Clone, Default)]
pub struct ErLayout {
    router: ConnectionRouter,
}

impl ErLayout {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            router: ConnectionRouter::new(config),
        }
    }

    fn config(&self) -> &EditorConfig {
        self.router.config()
    }

    fn name_columns(&self, width: f64, padding: f64) -> usize {
        ((width - 2.0 * padding) / CHAR_WIDTH_PX).floor().max(1.0) as usize
    }
}

impl LayoutAlgorithm for ErLayout {
    type Output = DiagramLayout;

    fn layout(&self, database: &DiagramDatabase) -> Result<Self::Output> {
        let layout_span = span!(
            Level::DEBUG,
            "layout_diagram",
            entities = database.entity_count(),
            associations = database.association_count(),
            connections = database.connection_count()
        );
        let _enter = layout_span.enter();

        let config = self.config();
        let mut nodes = Vec::with_capacity(database.entity_count() + database.association_count());

        for entity in database.entities() {
            let bounds = entity_bounds(entity, config);
            nodes.push(NodeBox {
                id: entity.id.clone(),
                kind: NodeKind::Entity,
                bounds,
                header_height: config.entity_header_height,
                name_lines: wrap_label(&entity.name, self.name_columns(bounds.width, config.entity_padding)),
                rows: entity.attributes.iter().map(format_attribute).collect(),
            });
        }
        for association in database.associations() {
            let bounds = association_bounds(association, config);
            nodes.push(NodeBox {
                id: association.id.clone(),
                kind: NodeKind::Association,
                bounds,
                header_height: config.association_header_height,
                name_lines: wrap_label(
                    &association.name,
                    self.name_columns(bounds.width, config.association_padding),
                ),
                rows: association.attributes.iter().map(format_attribute).collect(),
            });
        }
        trace!(nodes = nodes.len(), "Nodes placed");

        let connections = self.router.route_all(database);
        let bounds = nodes
            .iter()
            .map(|n| n.bounds)
            .reduce(|acc, b| acc.union(&b));
        let canvas = Size {
            width: bounds.map_or(0.0, |b| b.right()).max(config.canvas_width),
            height: bounds.map_or(0.0, |b| b.bottom()).max(config.canvas_height),
        };

        debug!(routes = connections.len(), ?bounds, "Layout complete");
        Ok(DiagramLayout {
            nodes,
            connections,
            bounds,
            canvas,
        })
    }

    fn name(&self) -> &'static str {
        "er"
    }

    fn version(&self) -> &'static str {
        "0.1.0"
    }
}
