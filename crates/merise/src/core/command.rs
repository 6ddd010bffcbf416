//! Reversible operations over the diagram database
//!
//! Every change to the records goes through a [`Command`] so the state
//! manager can undo and redo it. Commands hold ids and owned snapshots, never
//! references into the database. A command whose target has disappeared
//! does nothing.
//!
//! Delete commands are stateful: `execute` records the connections it
//! cascaded away (and where they sat), and `undo` restores exactly those.

use std::fmt;

use tracing::trace;

use super::{Association, Cardinality, Connection, DiagramDatabase, Entity, NodeData, NodeKind, Point};

/// A reversible operation
pub trait Command: fmt::Debug + Send {
    /// Apply the operation
    fn execute(&mut self, db: &mut DiagramDatabase);

    /// Revert the operation
    fn undo(&mut self, db: &mut DiagramDatabase);

    /// Short name for logging
    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone)]
pub struct CreateEntity {
    entity: Entity,
}

impl CreateEntity {
    pub fn new(entity: Entity) -> Self {
        Self { entity }
    }
}

impl Command for CreateEntity {
    fn execute(&mut self, db: &mut DiagramDatabase) {
        if db.entity(&self.entity.id).is_none() {
            db.push_entity(self.entity.clone());
        }
    }

    fn undo(&mut self, db: &mut DiagramDatabase) {
        db.remove_entity(&self.entity.id);
    }

    fn name(&self) -> &'static str {
        "create_entity"
    }
}

#[derive(Debug, Clone)]
pub struct UpdateEntity {
    entity_id: String,
    old: NodeData,
    new: NodeData,
}

impl UpdateEntity {
    /// Both snapshots are owned copies taken now
    pub fn new(entity_id: impl Into<String>, old: NodeData, new: NodeData) -> Self {
        Self {
            entity_id: entity_id.into(),
            old,
            new,
        }
    }
}

impl Command for UpdateEntity {
    fn execute(&mut self, db: &mut DiagramDatabase) {
        if let Some(entity) = db.entity_mut(&self.entity_id) {
            entity.apply(&self.new);
        }
    }

    fn undo(&mut self, db: &mut DiagramDatabase) {
        if let Some(entity) = db.entity_mut(&self.entity_id) {
            entity.apply(&self.old);
        }
    }

    fn name(&self) -> &'static str {
        "update_entity"
    }
}

#[derive(Debug, Clone)]
pub struct DeleteEntity {
    entity: Entity,
    /// Where the entity sat; `None` until an execution actually removed it
    index: Option<usize>,
    deleted_connections: Vec<(usize, Connection)>,
}

impl DeleteEntity {
    pub fn new(entity: Entity) -> Self {
        Self {
            entity,
            index: None,
            deleted_connections: Vec::new(),
        }
    }

    /// Connections removed by the last execution
    pub fn deleted_connections(&self) -> impl Iterator<Item = &Connection> {
        self.deleted_connections.iter().map(|(_, c)| c)
    }
}

impl Command for DeleteEntity {
    fn execute(&mut self, db: &mut DiagramDatabase) {
        let Some((index, entity)) = db.remove_entity(&self.entity.id) else {
            trace!(entity = %self.entity.id, "Entity already gone");
            self.index = None;
            self.deleted_connections.clear();
            return;
        };
        self.index = Some(index);
        self.entity = entity;
        let id = self.entity.id.clone();
        self.deleted_connections = db.remove_connections_where(|c| c.entity_id == id);
        trace!(
            entity = %self.entity.id,
            cascaded = self.deleted_connections.len(),
            "Entity deleted"
        );
    }

    fn undo(&mut self, db: &mut DiagramDatabase) {
        let Some(index) = self.index.take() else {
            return;
        };
        if db.entity(&self.entity.id).is_none() {
            db.insert_entity(index, self.entity.clone());
        }
        restore_connections(db, &std::mem::take(&mut self.deleted_connections));
    }

    fn name(&self) -> &'static str {
        "delete_entity"
    }
}

#[derive(Debug, Clone)]
pub struct CreateAssociation {
    association: Association,
}

impl CreateAssociation {
    pub fn new(association: Association) -> Self {
        Self { association }
    }
}

impl Command for CreateAssociation {
    fn execute(&mut self, db: &mut DiagramDatabase) {
        if db.association(&self.association.id).is_none() {
            db.push_association(self.association.clone());
        }
    }

    fn undo(&mut self, db: &mut DiagramDatabase) {
        db.remove_association(&self.association.id);
    }

    fn name(&self) -> &'static str {
        "create_association"
    }
}

#[derive(Debug, Clone)]
pub struct UpdateAssociation {
    association_id: String,
    old: NodeData,
    new: NodeData,
}

impl UpdateAssociation {
    pub fn new(association_id: impl Into<String>, old: NodeData, new: NodeData) -> Self {
        Self {
            association_id: association_id.into(),
            old,
            new,
        }
    }
}

impl Command for UpdateAssociation {
    fn execute(&mut self, db: &mut DiagramDatabase) {
        if let Some(association) = db.association_mut(&self.association_id) {
            association.apply(&self.new);
        }
    }

    fn undo(&mut self, db: &mut DiagramDatabase) {
        if let Some(association) = db.association_mut(&self.association_id) {
            association.apply(&self.old);
        }
    }

    fn name(&self) -> &'static str {
        "update_association"
    }
}

#[derive(Debug, Clone)]
pub struct DeleteAssociation {
    association: Association,
    index: Option<usize>,
    deleted_connections: Vec<(usize, Connection)>,
}

impl DeleteAssociation {
    pub fn new(association: Association) -> Self {
        Self {
            association,
            index: None,
            deleted_connections: Vec::new(),
        }
    }

    pub fn deleted_connections(&self) -> impl Iterator<Item = &Connection> {
        self.deleted_connections.iter().map(|(_, c)| c)
    }
}

impl Command for DeleteAssociation {
    fn execute(&mut self, db: &mut DiagramDatabase) {
        let Some((index, association)) = db.remove_association(&self.association.id) else {
            trace!(association = %self.association.id, "Association already gone");
            self.index = None;
            self.deleted_connections.clear();
            return;
        };
        self.index = Some(index);
        self.association = association;
        let id = self.association.id.clone();
        self.deleted_connections = db.remove_connections_where(|c| c.association_id == id);
        trace!(
            association = %self.association.id,
            cascaded = self.deleted_connections.len(),
            "Association deleted"
        );
    }

    fn undo(&mut self, db: &mut DiagramDatabase) {
        let Some(index) = self.index.take() else {
            return;
        };
        if db.association(&self.association.id).is_none() {
            db.insert_association(index, self.association.clone());
        }
        restore_connections(db, &std::mem::take(&mut self.deleted_connections));
    }

    fn name(&self) -> &'static str {
        "delete_association"
    }
}

#[derive(Debug, Clone)]
pub struct CreateConnection {
    connection: Connection,
}

impl CreateConnection {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }
}

impl Command for CreateConnection {
    fn execute(&mut self, db: &mut DiagramDatabase) {
        if db.connection(&self.connection.id).is_none() {
            db.push_connection(self.connection.clone());
        }
    }

    fn undo(&mut self, db: &mut DiagramDatabase) {
        db.remove_connection(&self.connection.id);
    }

    fn name(&self) -> &'static str {
        "create_connection"
    }
}

/// Cardinality and label of a connection
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionData {
    pub cardinality: Cardinality,
    pub label: String,
}

impl From<&Connection> for ConnectionData {
    fn from(conn: &Connection) -> Self {
        Self {
            cardinality: conn.cardinality,
            label: conn.label.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UpdateConnection {
    connection_id: String,
    old: ConnectionData,
    new: ConnectionData,
}

impl UpdateConnection {
    pub fn new(connection_id: impl Into<String>, old: ConnectionData, new: ConnectionData) -> Self {
        Self {
            connection_id: connection_id.into(),
            old,
            new,
        }
    }
}

impl Command for UpdateConnection {
    fn execute(&mut self, db: &mut DiagramDatabase) {
        if let Some(conn) = db.connection_mut(&self.connection_id) {
            conn.cardinality = self.new.cardinality;
            conn.label = self.new.label.clone();
        }
    }

    fn undo(&mut self, db: &mut DiagramDatabase) {
        if let Some(conn) = db.connection_mut(&self.connection_id) {
            conn.cardinality = self.old.cardinality;
            conn.label = self.old.label.clone();
        }
    }

    fn name(&self) -> &'static str {
        "update_connection"
    }
}

#[derive(Debug, Clone)]
pub struct DeleteConnection {
    connection: Connection,
    index: Option<usize>,
}

impl DeleteConnection {
    pub fn new(connection: Connection) -> Self {
        Self {
            connection,
            index: None,
        }
    }
}

impl Command for DeleteConnection {
    fn execute(&mut self, db: &mut DiagramDatabase) {
        match db.remove_connection(&self.connection.id) {
            Some((index, conn)) => {
                self.index = Some(index);
                self.connection = conn;
            }
            None => {
                trace!(connection = %self.connection.id, "Connection already gone");
                self.index = None;
            }
        }
    }

    fn undo(&mut self, db: &mut DiagramDatabase) {
        let Some(index) = self.index.take() else {
            return;
        };
        if db.connection(&self.connection.id).is_none() {
            db.insert_connection(index, self.connection.clone());
        }
    }

    fn name(&self) -> &'static str {
        "delete_connection"
    }
}

#[derive(Debug, Clone)]
pub struct MoveNode {
    kind: NodeKind,
    node_id: String,
    old: Point,
    new: Point,
}

impl MoveNode {
    pub fn new(kind: NodeKind, node_id: impl Into<String>, old: Point, new: Point) -> Self {
        Self {
            kind,
            node_id: node_id.into(),
            old,
            new,
        }
    }
}

impl Command for MoveNode {
    fn execute(&mut self, db: &mut DiagramDatabase) {
        db.set_node_position(self.kind, &self.node_id, self.new);
    }

    fn undo(&mut self, db: &mut DiagramDatabase) {
        db.set_node_position(self.kind, &self.node_id, self.old);
    }

    fn name(&self) -> &'static str {
        "move_node"
    }
}

/// Several commands recorded as one history entry
///
/// Parts execute in order and undo in reverse order.
#[derive(Debug, Default)]
pub struct CompositeCommand {
    parts: Vec<Box<dyn Command>>,
}

impl CompositeCommand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: Box<dyn Command>) {
        self.parts.push(command);
    }

    pub fn with(mut self, command: Box<dyn Command>) -> Self {
        self.push(command);
        self
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl Command for CompositeCommand {
    fn execute(&mut self, db: &mut DiagramDatabase) {
        for part in self.parts.iter_mut() {
            part.execute(db);
        }
    }

    fn undo(&mut self, db: &mut DiagramDatabase) {
        for part in self.parts.iter_mut().rev() {
            part.undo(db);
        }
    }

    fn name(&self) -> &'static str {
        "composite"
    }
}

fn restore_connections(db: &mut DiagramDatabase, cached: &[(usize, Connection)]) {
    for (index, conn) in cached {
        if db.connection(&conn.id).is_none() {
            db.insert_connection(*index, conn.clone());
        }
    }
}

/// Builds the commands the state manager issues on its own behalf
///
/// Injected into the state manager so selection deletion and paste can be
/// customised (or instrumented) without touching the manager itself.
pub trait CommandFactory: fmt::Debug + Send {
    fn create_entity(&self, entity: Entity) -> Box<dyn Command>;
    fn create_association(&self, association: Association) -> Box<dyn Command>;
    fn delete_entity(&self, entity: &Entity) -> Box<dyn Command>;
    fn delete_association(&self, association: &Association) -> Box<dyn Command>;
    fn delete_connection(&self, connection: &Connection) -> Box<dyn Command>;
}

/// The built-in command constructors
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardCommands;

impl CommandFactory for StandardCommands {
    fn create_entity(&self, entity: Entity) -> Box<dyn Command> {
        Box::new(CreateEntity::new(entity))
    }

    fn create_association(&self, association: Association) -> Box<dyn Command> {
        Box::new(CreateAssociation::new(association))
    }

    fn delete_entity(&self, entity: &Entity) -> Box<dyn Command> {
        Box::new(DeleteEntity::new(entity.clone()))
    }

    fn delete_association(&self, association: &Association) -> Box<dyn Command> {
        Box::new(DeleteAssociation::new(association.clone()))
    }

    fn delete_connection(&self, connection: &Connection) -> Box<dyn Command> {
        Box::new(DeleteConnection::new(connection.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Attribute;

    fn db_with_fan_out() -> DiagramDatabase {
        let mut db = DiagramDatabase::new();
        db.push_entity(Entity::new("e1", "Client", 0.0, 0.0, vec![Attribute::primary_key("k1")]));
        db.push_entity(Entity::new("e2", "Produit", 500.0, 0.0, vec![Attribute::primary_key("k2")]));
        db.push_association(Association::new("a1", "Acheter", 250.0, 300.0, Vec::new()));
        db.push_association(Association::new("a2", "Noter", 250.0, 600.0, Vec::new()));
        db.push_connection(Connection::new("c1", "a1", "e1", Cardinality::ZeroOrMany));
        db.push_connection(Connection::new("c2", "a1", "e2", Cardinality::OneOrMany));
        db.push_connection(Connection::new("c3", "a2", "e1", Cardinality::ZeroOrOne));
        db.push_connection(Connection::new("c4", "a2", "e1", Cardinality::ExactlyOne));
        db
    }

    #[test]
    fn test_create_entity_is_idempotent() {
        let mut db = DiagramDatabase::new();
        let mut cmd = CreateEntity::new(Entity::new("e1", "E", 0.0, 0.0, Vec::new()));
        cmd.execute(&mut db);
        cmd.execute(&mut db);
        assert_eq!(db.entity_count(), 1);
        cmd.undo(&mut db);
        cmd.undo(&mut db);
        assert_eq!(db.entity_count(), 0);
    }

    #[test]
    fn test_delete_entity_cascades_and_restores() {
        let mut db = db_with_fan_out();
        let before = db.clone();
        let entity = db.entity("e1").unwrap().clone();
        let mut cmd = DeleteEntity::new(entity);

        cmd.execute(&mut db);
        assert!(db.entity("e1").is_none());
        assert_eq!(db.connection_count(), 1);
        assert_eq!(cmd.deleted_connections().count(), 3);

        cmd.undo(&mut db);
        assert_eq!(db, before);
    }

    #[test]
    fn test_delete_restores_connections_from_delete_time() {
        let mut db = db_with_fan_out();
        let entity = db.entity("e2").unwrap().clone();
        let mut cmd = DeleteEntity::new(entity);
        cmd.execute(&mut db);

        // A connection appearing later is not part of the restore set
        db.push_connection(Connection::new("c9", "a1", "e2", Cardinality::ZeroOrOne));
        cmd.undo(&mut db);

        let restored: Vec<_> = db.connections_for_entity("e2").map(|c| c.id.as_str()).collect();
        assert_eq!(restored, vec!["c2", "c9"]);
    }

    #[test]
    fn test_delete_association_cascades() {
        let mut db = db_with_fan_out();
        let before = db.clone();
        let assoc = db.association("a2").unwrap().clone();
        let mut cmd = DeleteAssociation::new(assoc);
        cmd.execute(&mut db);
        assert_eq!(db.connection_count(), 2);
        assert_eq!(db.association_count(), 1);
        cmd.undo(&mut db);
        assert_eq!(db, before);
    }

    #[test]
    fn test_update_snapshots_are_independent() {
        let mut db = db_with_fan_out();
        let old = db.entity("e1").unwrap().snapshot();
        let mut new = old.clone();
        new.name = "Customer".to_string();
        new.attributes.push(Attribute::new("k9", "email"));
        let mut cmd = UpdateEntity::new("e1", old, new);

        cmd.execute(&mut db);
        db.entity_mut("e1").unwrap().attributes[0].name = "mutated".to_string();
        cmd.undo(&mut db);

        let entity = db.entity("e1").unwrap();
        assert_eq!(entity.name, "Client");
        assert_eq!(entity.attributes.len(), 1);
        assert_eq!(entity.attributes[0].name, "id");
    }

    #[test]
    fn test_missing_target_is_a_no_op() {
        let mut db = DiagramDatabase::new();
        let mut moved = MoveNode::new(NodeKind::Entity, "ghost", Point::new(0.0, 0.0), Point::new(5.0, 5.0));
        moved.execute(&mut db);
        moved.undo(&mut db);
        let mut update = UpdateConnection::new(
            "ghost",
            ConnectionData { cardinality: Cardinality::ZeroOrOne, label: String::new() },
            ConnectionData { cardinality: Cardinality::OneOrMany, label: "x".into() },
        );
        update.execute(&mut db);
        let mut delete = DeleteConnection::new(Connection::new("c", "a", "e", Cardinality::ZeroOrOne));
        delete.execute(&mut db);
        assert!(db.is_empty());
    }

    #[test]
    fn test_stale_delete_undo_restores_nothing() {
        let mut db = db_with_fan_out();
        let entity = db.entity("e1").unwrap().clone();
        let mut first = DeleteEntity::new(entity.clone());
        first.execute(&mut db);
        let after_delete = db.clone();

        let mut stale = DeleteEntity::new(entity);
        stale.execute(&mut db);
        assert_eq!(stale.deleted_connections().count(), 0);
        stale.undo(&mut db);
        assert_eq!(db, after_delete);

        let assoc = db.association("a1").unwrap().clone();
        DeleteAssociation::new(assoc.clone()).execute(&mut db);
        let without_a1 = db.clone();
        let mut stale = DeleteAssociation::new(assoc);
        stale.execute(&mut db);
        stale.undo(&mut db);
        assert_eq!(db, without_a1);

        let mut stale = DeleteConnection::new(Connection::new("c1", "a1", "e1", Cardinality::ZeroOrMany));
        stale.execute(&mut db);
        stale.undo(&mut db);
        assert_eq!(db, without_a1);
    }

    #[test]
    fn test_repeated_undo_of_delete_is_a_no_op() {
        let mut db = db_with_fan_out();
        let before = db.clone();
        let mut cmd = DeleteEntity::new(db.entity("e1").unwrap().clone());
        cmd.execute(&mut db);
        cmd.undo(&mut db);
        cmd.undo(&mut db);
        assert_eq!(db, before);

        cmd.execute(&mut db);
        assert_eq!(cmd.deleted_connections().count(), 3);
        cmd.undo(&mut db);
        assert_eq!(db, before);
    }

    #[test]
    fn test_move_node() {
        let mut db = db_with_fan_out();
        let mut cmd = MoveNode::new(NodeKind::Association, "a1", Point::new(250.0, 300.0), Point::new(260.0, 320.0));
        cmd.execute(&mut db);
        assert_eq!(db.association("a1").unwrap().position(), Point::new(260.0, 320.0));
        cmd.undo(&mut db);
        assert_eq!(db.association("a1").unwrap().position(), Point::new(250.0, 300.0));
    }

    #[test]
    fn test_composite_undoes_in_reverse() {
        let mut db = db_with_fan_out();
        let before = db.clone();
        let conn = db.connection("c3").unwrap().clone();
        let mut cmd = CompositeCommand::new()
            .with(Box::new(UpdateConnection::new(
                "c3",
                ConnectionData::from(&conn),
                ConnectionData { cardinality: Cardinality::OneOrMany, label: "rates".into() },
            )))
            .with(Box::new(DeleteConnection::new(conn)));
        assert_eq!(cmd.len(), 2);

        cmd.execute(&mut db);
        assert!(db.connection("c3").is_none());
        cmd.undo(&mut db);
        assert_eq!(db, before);
    }

    #[test]
    fn test_standard_factory_names() {
        let factory = StandardCommands;
        let entity = Entity::new("e", "E", 0.0, 0.0, Vec::new());
        assert_eq!(factory.delete_entity(&entity).name(), "delete_entity");
        assert_eq!(factory.create_entity(entity).name(), "create_entity");
    }
}
