//! Connection routing
//!
//! Computes where each connection meets its two nodes and where its text
//! sits. A connection that is the only link between its association and
//! entity is a straight segment. When an association links to the same
//! entity several times, each link becomes a cubic curve bent to alternating
//! sides so the edges stay apart.
//!
//! Routing is pure: the same records and configuration always give the same
//! points.

use std::collections::HashMap;

use serde::Serialize;

use super::{
    angle_between, association_edge_point, cubic_point, entity_center, entity_edge_point,
    label_width, perpendicular_offset, Association, Cardinality, Connection, DiagramDatabase,
    EditorConfig, Entity, Point, CARDINALITY_MIN_WIDTH, CHAR_WIDTH_PX, LABEL_MIN_WIDTH,
};

/// Parameters used to estimate the curve tangent at its midpoint
const TANGENT_T0: f64 = 0.48;
const TANGENT_T1: f64 = 0.52;

/// Minimum control point reach for curves between very close nodes
const MIN_CURVE_REACH: f64 = 40.0;

/// Geometry of one connection line
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RoutePath {
    Straight {
        start: Point,
        end: Point,
    },
    Curve {
        start: Point,
        control1: Point,
        control2: Point,
        end: Point,
    },
}

impl RoutePath {
    /// Association end
    pub fn start(&self) -> Point {
        match self {
            RoutePath::Straight { start, .. } | RoutePath::Curve { start, .. } => *start,
        }
    }

    /// Entity end
    pub fn end(&self) -> Point {
        match self {
            RoutePath::Straight { end, .. } | RoutePath::Curve { end, .. } => *end,
        }
    }

    pub fn point_at(&self, t: f64) -> Point {
        match *self {
            RoutePath::Straight { start, end } => Point::new(
                start.x + (end.x - start.x) * t,
                start.y + (end.y - start.y) * t,
            ),
            RoutePath::Curve {
                start,
                control1,
                control2,
                end,
            } => cubic_point(start, control1, control2, end, t),
        }
    }

    pub fn midpoint(&self) -> Point {
        self.point_at(0.5)
    }

    pub fn is_curve(&self) -> bool {
        matches!(self, RoutePath::Curve { .. })
    }
}

/// Everything the renderer needs to draw one connection
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRoute {
    pub id: String,
    pub association_id: String,
    pub entity_id: String,
    pub path: RoutePath,
    pub cardinality: Cardinality,
    pub cardinality_anchor: Point,
    /// Width of the box drawn behind the cardinality
    pub cardinality_width: f64,
    /// Centre of the free-text label, present only when the label has text
    pub label_anchor: Option<Point>,
    pub label_width: Option<f64>,
    pub label: String,
}

/// Position of a connection among the links sharing its association and entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkGroup {
    pub index: usize,
    pub count: usize,
}

impl LinkGroup {
    pub const SINGLE: LinkGroup = LinkGroup { index: 0, count: 1 };

    pub fn is_self_association(&self) -> bool {
        self.count >= 2
    }

    /// +1 for even indices, -1 for odd ones
    pub fn side(&self) -> f64 {
        if self.index % 2 == 0 {
            1.0
        } else {
            -1.0
        }
    }

    /// Which pair this link belongs to; later pairs bend further out
    pub fn pair(&self) -> usize {
        self.index / 2
    }
}

/// Routes connections using the shape metrics of an [`EditorConfig`]
#[derive(Debug, Clone, Default)]
pub struct ConnectionRouter {
    config: EditorConfig,
}

impl ConnectionRouter {
    pub fn new(config: EditorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Route one connection; `None` when an endpoint is missing
    pub fn route(&self, db: &DiagramDatabase, conn: &Connection) -> Option<ConnectionRoute> {
        let group = link_group(db, conn);
        self.route_in_group(db, conn, group)
    }

    /// Route every connection in collection order
    pub fn route_all(&self, db: &DiagramDatabase) -> Vec<ConnectionRoute> {
        let mut totals: HashMap<(&str, &str), usize> = HashMap::new();
        for conn in db.connections() {
            *totals.entry(pair_key(conn)).or_default() += 1;
        }

        let mut seen: HashMap<(&str, &str), usize> = HashMap::new();
        db.connections()
            .filter_map(|conn| {
                let key = pair_key(conn);
                let index = seen.entry(key).or_default();
                let group = LinkGroup {
                    index: *index,
                    count: totals.get(&key).copied().unwrap_or(1),
                };
                *index += 1;
                self.route_in_group(db, conn, group)
            })
            .collect()
    }

    fn route_in_group(
        &self,
        db: &DiagramDatabase,
        conn: &Connection,
        group: LinkGroup,
    ) -> Option<ConnectionRoute> {
        let association = db.association(&conn.association_id)?;
        let entity = db.entity(&conn.entity_id)?;

        let (path, cardinality_anchor, label_anchor) = if group.is_self_association() {
            self.curve(association, entity, group)
        } else {
            self.straight(association, entity)
        };

        Some(ConnectionRoute {
            id: conn.id.clone(),
            association_id: conn.association_id.clone(),
            entity_id: conn.entity_id.clone(),
            path,
            cardinality: conn.cardinality,
            cardinality_anchor,
            cardinality_width: label_width(
                conn.cardinality.as_str(),
                CHAR_WIDTH_PX,
                CARDINALITY_MIN_WIDTH,
            ),
            label_anchor: conn.has_label().then_some(label_anchor),
            label_width: conn
                .has_label()
                .then(|| label_width(&conn.label, CHAR_WIDTH_PX, LABEL_MIN_WIDTH)),
            label: conn.label.clone(),
        })
    }

    /// End points of the line between the two nodes
    pub fn endpoints(&self, association: &Association, entity: &Entity) -> (Point, Point) {
        let start = association_edge_point(association, entity_center(entity, &self.config), &self.config);
        let end = entity_edge_point(entity, association.position(), &self.config);
        (start, end)
    }

    /// Straight segment; cardinality near the entity end, label at the middle
    /// on the other side of the line
    fn straight(&self, association: &Association, entity: &Entity) -> (RoutePath, Point, Point) {
        let (start, end) = self.endpoints(association, entity);
        let angle = angle_between(start, end);
        let perp = perpendicular_offset(angle, self.config.label_offset);
        let back = self.config.cardinality_offset;

        let cardinality = Point::new(
            end.x - angle.cos() * back + perp.x,
            end.y - angle.sin() * back + perp.y,
        );
        let mid = start.midpoint(end);
        let label = Point::new(mid.x - perp.x, mid.y - perp.y);

        (RoutePath::Straight { start, end }, cardinality, label)
    }

    /// Cubic curve with control points rotated off the straight line
    fn curve(
        &self,
        association: &Association,
        entity: &Entity,
        group: LinkGroup,
    ) -> (RoutePath, Point, Point) {
        let (start, end) = self.endpoints(association, entity);
        let angle = angle_between(start, end);
        let side = group.side();
        let spread = self.config.self_association_angle.to_radians();
        let reach = (start.to(end).length() / 2.0).max(MIN_CURVE_REACH)
            * (1.0 + 0.5 * group.pair() as f64);

        let out = angle + side * spread;
        let back = angle + std::f64::consts::PI - side * spread;
        let control1 = start.offset(reach * out.cos(), reach * out.sin());
        let control2 = end.offset(reach * back.cos(), reach * back.sin());
        let path = RoutePath::Curve {
            start,
            control1,
            control2,
            end,
        };

        let mid = path.midpoint();
        let tangent = path.point_at(TANGENT_T0).to(path.point_at(TANGENT_T1));
        let tangent_angle = if tangent.length() > f64::EPSILON {
            tangent.y.atan2(tangent.x)
        } else {
            angle
        };
        let normal = perpendicular_offset(tangent_angle, self.config.label_offset * side);

        let cardinality = mid.offset(normal.x, normal.y);
        let label = mid.offset(-normal.x, -normal.y);
        (path, cardinality, label)
    }
}

fn pair_key(conn: &Connection) -> (&str, &str) {
    (conn.association_id.as_str(), conn.entity_id.as_str())
}

/// Index and size of the group of links sharing `conn`'s association and entity
pub fn link_group(db: &DiagramDatabase, conn: &Connection) -> LinkGroup {
    let mut group = LinkGroup { index: 0, count: 0 };
    let mut found = false;
    for other in db.connections_for_association(&conn.association_id) {
        if other.entity_id != conn.entity_id {
            continue;
        }
        if other.id == conn.id {
            found = true;
        } else if !found {
            group.index += 1;
        }
        group.count += 1;
    }
    if found {
        group
    } else {
        LinkGroup::SINGLE
    }
}
