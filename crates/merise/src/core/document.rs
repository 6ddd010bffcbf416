//! JSON document format
//!
//! ```json
//! {
//!   "entities":     [{"id", "name", "x", "y", "type": "entity", "attributes": [...]}],
//!   "associations": [{"id", "name", "x", "y", "type": "association", "attributes": [...]}],
//!   "connections":  [{"id", "associationId", "entityId", "cardinality", "label"}]
//! }
//! ```
//!
//! `associations`, `connections`, association `attributes`, `enumValues` and
//! `label` may be missing in older documents and default to empty.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{
    Association, Attribute, Connection, DiagramDatabase, DiagramError, Entity, IdGenerator,
    IdPrefix, NodeKind,
};

fn default_coordinate() -> f64 {
    100.0
}

#[derive(Serialize)]
struct NodeOut<'a> {
    id: &'a str,
    name: &'a str,
    x: f64,
    y: f64,
    #[serde(rename = "type")]
    kind: NodeKind,
    attributes: &'a [Attribute],
}

#[derive(Serialize)]
struct DocumentOut<'a> {
    entities: Vec<NodeOut<'a>>,
    associations: Vec<NodeOut<'a>>,
    connections: Vec<&'a Connection>,
}

#[derive(Deserialize)]
struct EntityIn {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default = "default_coordinate")]
    x: f64,
    #[serde(default = "default_coordinate")]
    y: f64,
    attributes: Vec<Attribute>,
}

#[derive(Deserialize)]
struct AssociationIn {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default = "default_coordinate")]
    x: f64,
    #[serde(default = "default_coordinate")]
    y: f64,
    #[serde(default)]
    attributes: Vec<Attribute>,
}

#[derive(Deserialize)]
struct DocumentIn {
    entities: Vec<EntityIn>,
    #[serde(default)]
    associations: Vec<AssociationIn>,
    #[serde(default)]
    connections: Vec<Connection>,
}

fn document(db: &DiagramDatabase) -> DocumentOut<'_> {
    DocumentOut {
        entities: db
            .entities()
            .map(|e| NodeOut {
                id: &e.id,
                name: &e.name,
                x: e.x,
                y: e.y,
                kind: NodeKind::Entity,
                attributes: &e.attributes,
            })
            .collect(),
        associations: db
            .associations()
            .map(|a| NodeOut {
                id: &a.id,
                name: &a.name,
                x: a.x,
                y: a.y,
                kind: NodeKind::Association,
                attributes: &a.attributes,
            })
            .collect(),
        connections: db.connections().collect(),
    }
}

/// Compact JSON, used for persistence
pub fn to_json(db: &DiagramDatabase) -> Result<String, DiagramError> {
    serde_json::to_string(&document(db)).map_err(|e| DiagramError::persistence_error(e.to_string()))
}

/// Indented JSON, used for file export
pub fn to_json_pretty(db: &DiagramDatabase) -> Result<String, DiagramError> {
    serde_json::to_string_pretty(&document(db))
        .map_err(|e| DiagramError::persistence_error(e.to_string()))
}

/// Parse a document into a fresh database
///
/// Every id found is reported to `ids`; records stored without an id get a
/// generated one. Connections pointing at missing nodes are dropped.
pub fn from_json(json: &str, ids: &mut IdGenerator) -> Result<DiagramDatabase, DiagramError> {
    let doc: DocumentIn =
        serde_json::from_str(json).map_err(|e| DiagramError::deserialize_error(e.to_string()))?;

    for id in doc
        .entities
        .iter()
        .map(|e| (&e.id, &e.attributes))
        .chain(doc.associations.iter().map(|a| (&a.id, &a.attributes)))
        .flat_map(|(id, attrs)| std::iter::once(id).chain(attrs.iter().map(|a| &a.id)))
        .chain(doc.connections.iter().map(|c| &c.id))
    {
        ids.observe(id);
    }

    let entities: Vec<Entity> = doc
        .entities
        .into_iter()
        .map(|e| {
            let id = non_empty_or(e.id, ids, IdPrefix::Entity);
            let attributes = fill_attribute_ids(e.attributes, ids);
            let name = e.name.unwrap_or_else(|| Entity::DEFAULT_NAME.to_string());
            Entity::new(id, name, e.x, e.y, attributes)
        })
        .collect();

    let associations: Vec<Association> = doc
        .associations
        .into_iter()
        .map(|a| {
            let id = non_empty_or(a.id, ids, IdPrefix::Association);
            let attributes = fill_attribute_ids(a.attributes, ids);
            let name = a.name.unwrap_or_else(|| Association::DEFAULT_NAME.to_string());
            Association::new(id, name, a.x, a.y, attributes)
        })
        .collect();

    let total = doc.connections.len();
    let connections: Vec<Connection> = doc
        .connections
        .into_iter()
        .filter(|c| {
            let live = entities.iter().any(|e| e.id == c.entity_id)
                && associations.iter().any(|a| a.id == c.association_id);
            if !live {
                warn!(connection = %c.id, "Dropping connection with a missing endpoint");
            }
            live
        })
        .collect();

    debug!(
        entities = entities.len(),
        associations = associations.len(),
        connections = connections.len(),
        dropped = total - connections.len(),
        "Document parsed"
    );

    Ok(DiagramDatabase::from_parts(entities, associations, connections))
}

fn non_empty_or(id: String, ids: &mut IdGenerator, prefix: IdPrefix) -> String {
    if id.is_empty() {
        ids.next_id(prefix)
    } else {
        id
    }
}

fn fill_attribute_ids(attributes: Vec<Attribute>, ids: &mut IdGenerator) -> Vec<Attribute> {
    attributes
        .into_iter()
        .map(|mut a| {
            if a.id.is_empty() {
                a.id = ids.next_id(IdPrefix::Attribute);
            }
            a
        })
        .collect()
}
