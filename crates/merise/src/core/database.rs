//! Record storage for a diagram
//!
//! The database owns the ordered collections of entities, associations and
//! connections. Commands mutate it; the renderer only reads it.

use super::{Association, Connection, Entity, NodeKind, Point};

/// Ordered collections of diagram records
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiagramDatabase {
    entities: Vec<Entity>,
    associations: Vec<Association>,
    connections: Vec<Connection>,
}

impl DiagramDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(
        entities: Vec<Entity>,
        associations: Vec<Association>,
        connections: Vec<Connection>,
    ) -> Self {
        Self {
            entities,
            associations,
            connections,
        }
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn associations(&self) -> impl Iterator<Item = &Association> {
        self.associations.iter()
    }

    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.iter()
    }

    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn entity_mut(&mut self, id: &str) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    pub fn association(&self, id: &str) -> Option<&Association> {
        self.associations.iter().find(|a| a.id == id)
    }

    pub fn association_mut(&mut self, id: &str) -> Option<&mut Association> {
        self.associations.iter_mut().find(|a| a.id == id)
    }

    pub fn connection(&self, id: &str) -> Option<&Connection> {
        self.connections.iter().find(|c| c.id == id)
    }

    pub fn connection_mut(&mut self, id: &str) -> Option<&mut Connection> {
        self.connections.iter_mut().find(|c| c.id == id)
    }

    pub fn connections_for_entity<'a>(
        &'a self,
        entity_id: &'a str,
    ) -> impl Iterator<Item = &'a Connection> + 'a {
        self.connections.iter().filter(move |c| c.entity_id == entity_id)
    }

    pub fn connections_for_association<'a>(
        &'a self,
        association_id: &'a str,
    ) -> impl Iterator<Item = &'a Connection> + 'a {
        self.connections
            .iter()
            .filter(move |c| c.association_id == association_id)
    }

    /// Position of a node, whichever kind it is
    pub fn node_position(&self, kind: NodeKind, id: &str) -> Option<Point> {
        match kind {
            NodeKind::Entity => self.entity(id).map(Entity::position),
            NodeKind::Association => self.association(id).map(Association::position),
        }
    }

    /// Set a node's position. Returns false if the node is gone.
    pub fn set_node_position(&mut self, kind: NodeKind, id: &str, pos: Point) -> bool {
        let target = match kind {
            NodeKind::Entity => self.entity_mut(id).map(|e| (&mut e.x, &mut e.y)),
            NodeKind::Association => self.association_mut(id).map(|a| (&mut a.x, &mut a.y)),
        };
        match target {
            Some((x, y)) => {
                *x = pos.x;
                *y = pos.y;
                true
            }
            None => false,
        }
    }

    pub fn push_entity(&mut self, entity: Entity) {
        self.entities.push(entity);
    }

    pub fn push_association(&mut self, association: Association) {
        self.associations.push(association);
    }

    pub fn push_connection(&mut self, connection: Connection) {
        self.connections.push(connection);
    }

    pub fn insert_entity(&mut self, index: usize, entity: Entity) {
        let index = index.min(self.entities.len());
        self.entities.insert(index, entity);
    }

    pub fn insert_association(&mut self, index: usize, association: Association) {
        let index = index.min(self.associations.len());
        self.associations.insert(index, association);
    }

    pub fn insert_connection(&mut self, index: usize, connection: Connection) {
        let index = index.min(self.connections.len());
        self.connections.insert(index, connection);
    }

    /// Remove an entity, returning it with the index it occupied
    pub fn remove_entity(&mut self, id: &str) -> Option<(usize, Entity)> {
        let index = self.entities.iter().position(|e| e.id == id)?;
        Some((index, self.entities.remove(index)))
    }

    pub fn remove_association(&mut self, id: &str) -> Option<(usize, Association)> {
        let index = self.associations.iter().position(|a| a.id == id)?;
        Some((index, self.associations.remove(index)))
    }

    pub fn remove_connection(&mut self, id: &str) -> Option<(usize, Connection)> {
        let index = self.connections.iter().position(|c| c.id == id)?;
        Some((index, self.connections.remove(index)))
    }

    /// Remove every connection matching `pred`
    ///
    /// Returns the removed connections with their original indices, ascending.
    pub fn remove_connections_where<F>(&mut self, pred: F) -> Vec<(usize, Connection)>
    where
        F: Fn(&Connection) -> bool,
    {
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.connections.len());
        for (index, conn) in std::mem::take(&mut self.connections).into_iter().enumerate() {
            if pred(&conn) {
                removed.push((index, conn));
            } else {
                kept.push(conn);
            }
        }
        self.connections = kept;
        removed
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn association_count(&self) -> usize {
        self.associations.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.associations.is_empty() && self.connections.is_empty()
    }

    pub fn clear(&mut self) {
        self.entities.clear();
        self.associations.clear();
        self.connections.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Cardinality;

    fn sample() -> DiagramDatabase {
        let mut db = DiagramDatabase::new();
        db.push_entity(Entity::new("e1", "Client", 0.0, 0.0, Vec::new()));
        db.push_entity(Entity::new("e2", "Commande", 400.0, 0.0, Vec::new()));
        db.push_association(Association::new("a1", "Passer", 200.0, 50.0, Vec::new()));
        db.push_connection(Connection::new("c1", "a1", "e1", Cardinality::ZeroOrMany));
        db.push_connection(Connection::new("c2", "a1", "e2", Cardinality::ExactlyOne));
        db
    }

    #[test]
    fn test_lookup_by_id() {
        let db = sample();
        assert_eq!(db.entity("e2").unwrap().name, "Commande");
        assert!(db.entity("a1").is_none());
        assert_eq!(db.association("a1").unwrap().name, "Passer");
        assert_eq!(db.connection("c2").unwrap().entity_id, "e2");
    }

    #[test]
    fn test_connection_filters() {
        let db = sample();
        assert_eq!(db.connections_for_entity("e1").count(), 1);
        assert_eq!(db.connections_for_association("a1").count(), 2);
    }

    #[test]
    fn test_remove_connections_where_keeps_order() {
        let mut db = sample();
        let removed = db.remove_connections_where(|c| c.association_id == "a1");
        assert_eq!(
            removed
                .iter()
                .map(|(i, c)| (*i, c.id.as_str()))
                .collect::<Vec<_>>(),
            vec![(0, "c1"), (1, "c2")]
        );
        assert_eq!(db.connection_count(), 0);
    }

    #[test]
    fn test_set_node_position() {
        let mut db = sample();
        assert!(db.set_node_position(NodeKind::Association, "a1", Point::new(1.0, 2.0)));
        assert_eq!(db.node_position(NodeKind::Association, "a1"), Some(Point::new(1.0, 2.0)));
        assert!(!db.set_node_position(NodeKind::Entity, "missing", Point::new(0.0, 0.0)));
    }

    #[test]
    fn test_insert_restores_position() {
        let mut db = sample();
        let (index, entity) = db.remove_entity("e1").unwrap();
        assert_eq!(index, 0);
        db.insert_entity(index, entity);
        assert_eq!(db.entities().next().unwrap().id, "e1");
        db.insert_connection(99, Connection::new("c3", "a1", "e1", Cardinality::ZeroOrOne));
        assert_eq!(db.connections().last().unwrap().id, "c3");
    }

    #[test]
    fn test_clear() {
        let mut db = sample();
        assert!(!db.is_empty());
        db.clear();
        assert!(db.is_empty());
    }
}
