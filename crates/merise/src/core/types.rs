//! Core type definitions for the diagram model
//!
//! Entities, associations, the connections between them, their attributes,
//! and the lightweight references used by selection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{IdGenerator, IdPrefix, Point};

/// Column types offered by the attribute editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SqlType {
    Integer,
    Bigint,
    Smallint,
    Tinyint,
    #[default]
    Varchar,
    Char,
    Text,
    Longtext,
    Decimal,
    Float,
    Double,
    Date,
    Datetime,
    Timestamp,
    Time,
    Boolean,
    Bit,
    Enum,
    Set,
    Json,
    Blob,
}

impl SqlType {
    /// All types in the order the editor lists them
    pub const ALL: [SqlType; 21] = [
        SqlType::Integer,
        SqlType::Bigint,
        SqlType::Smallint,
        SqlType::Tinyint,
        SqlType::Varchar,
        SqlType::Char,
        SqlType::Text,
        SqlType::Longtext,
        SqlType::Decimal,
        SqlType::Float,
        SqlType::Double,
        SqlType::Date,
        SqlType::Datetime,
        SqlType::Timestamp,
        SqlType::Time,
        SqlType::Boolean,
        SqlType::Bit,
        SqlType::Enum,
        SqlType::Set,
        SqlType::Json,
        SqlType::Blob,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SqlType::Integer => "INTEGER",
            SqlType::Bigint => "BIGINT",
            SqlType::Smallint => "SMALLINT",
            SqlType::Tinyint => "TINYINT",
            SqlType::Varchar => "VARCHAR",
            SqlType::Char => "CHAR",
            SqlType::Text => "TEXT",
            SqlType::Longtext => "LONGTEXT",
            SqlType::Decimal => "DECIMAL",
            SqlType::Float => "FLOAT",
            SqlType::Double => "DOUBLE",
            SqlType::Date => "DATE",
            SqlType::Datetime => "DATETIME",
            SqlType::Timestamp => "TIMESTAMP",
            SqlType::Time => "TIME",
            SqlType::Boolean => "BOOLEAN",
            SqlType::Bit => "BIT",
            SqlType::Enum => "ENUM",
            SqlType::Set => "SET",
            SqlType::Json => "JSON",
            SqlType::Blob => "BLOB",
        }
    }

    /// Returns true for types whose values come from `enum_values`
    pub fn takes_values(&self) -> bool {
        matches!(self, SqlType::Enum | SqlType::Set)
    }
}

impl FromStr for SqlType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        SqlType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == upper)
            .ok_or_else(|| format!("Unknown SQL type: {}", s))
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Participation constraint carried by a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub enum Cardinality {
    #[serde(rename = "0,1")]
    ZeroOrOne,
    #[serde(rename = "1,1")]
    ExactlyOne,
    #[serde(rename = "0,n")]
    ZeroOrMany,
    #[default]
    #[serde(rename = "1,n")]
    OneOrMany,
}

impl Cardinality {
    pub const ALL: [Cardinality; 4] = [
        Cardinality::ZeroOrOne,
        Cardinality::ExactlyOne,
        Cardinality::ZeroOrMany,
        Cardinality::OneOrMany,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Cardinality::ZeroOrOne => "0,1",
            Cardinality::ExactlyOne => "1,1",
            Cardinality::ZeroOrMany => "0,n",
            Cardinality::OneOrMany => "1,n",
        }
    }

    /// Human readable meaning, as shown in the cardinality picker
    pub fn description(&self) -> &'static str {
        match self {
            Cardinality::ZeroOrOne => "zero or one",
            Cardinality::ExactlyOne => "exactly one",
            Cardinality::ZeroOrMany => "zero or many",
            Cardinality::OneOrMany => "one or many",
        }
    }
}

impl FromStr for Cardinality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(' ', "");
        Cardinality::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| format!("Unknown cardinality: {}", s))
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_attribute_name() -> String {
    Attribute::DEFAULT_NAME.to_string()
}

fn default_true() -> bool {
    true
}

/// A typed column of an entity or association
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    #[serde(default)]
    pub id: String,
    #[serde(default = "default_attribute_name")]
    pub name: String,
    #[serde(rename = "type", default)]
    pub sql_type: SqlType,
    #[serde(rename = "isPK", default)]
    pub is_pk: bool,
    #[serde(rename = "isUQ", default)]
    pub is_uq: bool,
    #[serde(rename = "isNull", default = "default_true")]
    pub is_null: bool,
    #[serde(rename = "defaultValue", default)]
    pub default_value: String,
    #[serde(rename = "enumValues", default)]
    pub enum_values: Vec<String>,
}

impl Attribute {
    pub const DEFAULT_NAME: &'static str = "nouvel_attribut";

    /// Nullable VARCHAR attribute
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            sql_type: SqlType::Varchar,
            is_pk: false,
            is_uq: false,
            is_null: true,
            default_value: String::new(),
            enum_values: Vec::new(),
        }
    }

    /// The `id INTEGER` primary key every new entity starts with
    pub fn primary_key(id: impl Into<String>) -> Self {
        Self::new(id, "id")
            .with_type(SqlType::Integer)
            .with_primary_key(true)
            .with_nullable(false)
    }

    pub fn with_type(mut self, sql_type: SqlType) -> Self {
        self.sql_type = sql_type;
        self
    }

    pub fn with_primary_key(mut self, is_pk: bool) -> Self {
        self.is_pk = is_pk;
        self
    }

    pub fn with_unique(mut self, is_uq: bool) -> Self {
        self.is_uq = is_uq;
        self
    }

    pub fn with_nullable(mut self, is_null: bool) -> Self {
        self.is_null = is_null;
        self
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = value.into();
        self
    }

    pub fn with_enum_values(mut self, values: Vec<String>) -> Self {
        self.enum_values = values;
        self
    }

    /// Copy with a fresh id
    pub fn duplicate(&self, ids: &mut IdGenerator) -> Self {
        Self {
            id: ids.next_id(IdPrefix::Attribute),
            ..self.clone()
        }
    }
}

/// The editable part of a node, captured by update commands
#[derive(Debug, Clone, PartialEq)]
pub struct NodeData {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub attributes: Vec<Attribute>,
}

/// A table-like node. `(x, y)` is its top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: String,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub attributes: Vec<Attribute>,
}

impl Entity {
    pub const DEFAULT_NAME: &'static str = "Nouvelle Entité";

    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        x: f64,
        y: f64,
        attributes: Vec<Attribute>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            x,
            y,
            attributes,
        }
    }

    /// New entity with generated ids and the default primary key
    pub fn create(ids: &mut IdGenerator, x: f64, y: f64) -> Self {
        let id = ids.next_id(IdPrefix::Entity);
        let key = Attribute::primary_key(ids.next_id(IdPrefix::Attribute));
        Self::new(id, Self::DEFAULT_NAME, x, y, vec![key])
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn snapshot(&self) -> NodeData {
        NodeData {
            name: self.name.clone(),
            x: self.x,
            y: self.y,
            attributes: self.attributes.clone(),
        }
    }

    pub fn apply(&mut self, data: &NodeData) {
        self.name = data.name.clone();
        self.x = data.x;
        self.y = data.y;
        self.attributes = data.attributes.clone();
    }

    /// Clipboard copy: fresh ids, "(copie)" suffix, offset position
    pub fn duplicate(&self, ids: &mut IdGenerator, offset: f64) -> Self {
        Self {
            id: ids.next_id(IdPrefix::Entity),
            name: format!("{} (copie)", self.name),
            x: self.x + offset,
            y: self.y + offset,
            attributes: self.attributes.iter().map(|a| a.duplicate(ids)).collect(),
        }
    }
}

/// A relationship node. `(x, y)` is its centre.
#[derive(Debug, Clone, PartialEq)]
pub struct Association {
    pub id: String,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub attributes: Vec<Attribute>,
}

impl Association {
    pub const DEFAULT_NAME: &'static str = "Association";

    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        x: f64,
        y: f64,
        attributes: Vec<Attribute>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            x,
            y,
            attributes,
        }
    }

    /// New association with a generated id and no attributes
    pub fn create(ids: &mut IdGenerator, x: f64, y: f64) -> Self {
        Self::new(
            ids.next_id(IdPrefix::Association),
            Self::DEFAULT_NAME,
            x,
            y,
            Vec::new(),
        )
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn snapshot(&self) -> NodeData {
        NodeData {
            name: self.name.clone(),
            x: self.x,
            y: self.y,
            attributes: self.attributes.clone(),
        }
    }

    pub fn apply(&mut self, data: &NodeData) {
        self.name = data.name.clone();
        self.x = data.x;
        self.y = data.y;
        self.attributes = data.attributes.clone();
    }

    pub fn duplicate(&self, ids: &mut IdGenerator, offset: f64) -> Self {
        Self {
            id: ids.next_id(IdPrefix::Association),
            name: format!("{} (copie)", self.name),
            x: self.x + offset,
            y: self.y + offset,
            attributes: self.attributes.iter().map(|a| a.duplicate(ids)).collect(),
        }
    }
}

/// Edge between one association and one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: String,
    pub association_id: String,
    pub entity_id: String,
    #[serde(default)]
    pub cardinality: Cardinality,
    #[serde(default)]
    pub label: String,
}

impl Connection {
    pub fn new(
        id: impl Into<String>,
        association_id: impl Into<String>,
        entity_id: impl Into<String>,
        cardinality: Cardinality,
    ) -> Self {
        Self {
            id: id.into(),
            association_id: association_id.into(),
            entity_id: entity_id.into(),
            cardinality,
            label: String::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Returns true if the label has visible text
    pub fn has_label(&self) -> bool {
        !self.label.trim().is_empty()
    }
}

/// The two kinds of positioned nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Entity,
    Association,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Entity => write!(f, "entity"),
            NodeKind::Association => write!(f, "association"),
        }
    }
}

/// Every selectable kind of record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Entity,
    Association,
    Connection,
}

impl ItemKind {
    /// The node kind, or None for connections
    pub fn as_node(&self) -> Option<NodeKind> {
        match self {
            ItemKind::Entity => Some(NodeKind::Entity),
            ItemKind::Association => Some(NodeKind::Association),
            ItemKind::Connection => None,
        }
    }
}

impl From<NodeKind> for ItemKind {
    fn from(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Entity => ItemKind::Entity,
            NodeKind::Association => ItemKind::Association,
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Entity => write!(f, "entity"),
            ItemKind::Association => write!(f, "association"),
            ItemKind::Connection => write!(f, "connection"),
        }
    }
}

/// Reference to a record by kind and id; re-resolved on every use
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemRef {
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub id: String,
}

impl ItemRef {
    pub fn new(kind: ItemKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn entity(id: impl Into<String>) -> Self {
        Self::new(ItemKind::Entity, id)
    }

    pub fn association(id: impl Into<String>) -> Self {
        Self::new(ItemKind::Association, id)
    }

    pub fn connection(id: impl Into<String>) -> Self {
        Self::new(ItemKind::Connection, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_type_parsing() {
        assert_eq!("integer".parse::<SqlType>().unwrap(), SqlType::Integer);
        assert_eq!(" LongText ".parse::<SqlType>().unwrap(), SqlType::Longtext);
        assert!("UUID".parse::<SqlType>().is_err());
        assert!(SqlType::Set.takes_values());
        assert!(!SqlType::Varchar.takes_values());
    }

    #[test]
    fn test_sql_type_serializes_upper_case() {
        assert_eq!(serde_json::to_string(&SqlType::Datetime).unwrap(), "\"DATETIME\"");
        for ty in SqlType::ALL {
            assert_eq!(serde_json::to_string(&ty).unwrap(), format!("\"{}\"", ty));
        }
    }

    #[test]
    fn test_cardinality_round_trip_strings() {
        assert_eq!(Cardinality::default(), Cardinality::OneOrMany);
        assert_eq!("0,N".parse::<Cardinality>().unwrap(), Cardinality::ZeroOrMany);
        assert_eq!("1, 1".parse::<Cardinality>().unwrap(), Cardinality::ExactlyOne);
        assert_eq!(serde_json::to_string(&Cardinality::ZeroOrOne).unwrap(), "\"0,1\"");
        assert!("2,n".parse::<Cardinality>().is_err());
    }

    #[test]
    fn test_primary_key_attribute() {
        let attr = Attribute::primary_key("attr_1");
        assert_eq!(attr.name, "id");
        assert_eq!(attr.sql_type, SqlType::Integer);
        assert!(attr.is_pk);
        assert!(!attr.is_null);
    }

    #[test]
    fn test_attribute_defaults_when_fields_missing() {
        let attr: Attribute = serde_json::from_str(r#"{"id": "a1"}"#).unwrap();
        assert_eq!(attr.name, "nouvel_attribut");
        assert_eq!(attr.sql_type, SqlType::Varchar);
        assert!(attr.is_null);
        assert!(attr.enum_values.is_empty());
    }

    #[test]
    fn test_entity_create_has_primary_key() {
        let mut ids = IdGenerator::new();
        let entity = Entity::create(&mut ids, 100.0, 100.0);
        assert_eq!(entity.id, "entity_1");
        assert_eq!(entity.attributes.len(), 1);
        assert!(entity.attributes[0].is_pk);
    }

    #[test]
    fn test_duplicate_uses_fresh_ids() {
        let mut ids = IdGenerator::new();
        let entity = Entity::create(&mut ids, 10.0, 20.0);
        let copy = entity.duplicate(&mut ids, 50.0);
        assert_ne!(copy.id, entity.id);
        assert_ne!(copy.attributes[0].id, entity.attributes[0].id);
        assert_eq!(copy.name, "Nouvelle Entité (copie)");
        assert_eq!(copy.position(), Point::new(60.0, 70.0));
    }

    #[test]
    fn test_item_ref_serializes_type_tag() {
        let json = serde_json::to_string(&ItemRef::association("assoc_3")).unwrap();
        assert_eq!(json, r#"{"type":"association","id":"assoc_3"}"#);
        assert_eq!(ItemKind::Connection.as_node(), None);
        assert_eq!(ItemKind::from(NodeKind::Entity), ItemKind::Entity);
    }

    #[test]
    fn test_connection_label_visibility() {
        let conn = Connection::new("c", "a", "e", Cardinality::OneOrMany);
        assert!(!conn.has_label());
        assert!(!conn.clone().with_label("   ").has_label());
        assert!(conn.with_label("owns").has_label());
    }
}
