//! Diagram state manager
//!
//! [`DiagramState`] owns the record store, the selection, the clipboard and
//! the undo history. Every mutation of the records goes through
//! [`DiagramState::execute_command`]; each successful execute, undo or redo
//! hands a fresh snapshot to the [`Storage`] collaborator.

use std::fmt;

use tracing::{debug, debug_span, info, warn};

use super::{
    document, snap_to_grid, Association, Cardinality, Command, CommandFactory, CommandHistory,
    Connection, DiagramDatabase, DiagramError, EditorConfig, Entity, IdGenerator, IdPrefix,
    ItemKind, ItemRef, MemoryStorage, MoveNode, NodeKind, Point, Selection, StandardCommands,
    Storage,
};

/// A node held on the clipboard
#[derive(Debug, Clone, PartialEq)]
pub enum ClipboardNode {
    Entity(Entity),
    Association(Association),
}

impl ClipboardNode {
    fn duplicate(&self, ids: &mut IdGenerator, offset: f64) -> Self {
        match self {
            ClipboardNode::Entity(e) => ClipboardNode::Entity(e.duplicate(ids, offset)),
            ClipboardNode::Association(a) => ClipboardNode::Association(a.duplicate(ids, offset)),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            ClipboardNode::Entity(e) => &e.id,
            ClipboardNode::Association(a) => &a.id,
        }
    }
}

#[derive(Debug, Clone)]
struct DragSession {
    kind: NodeKind,
    id: String,
    origin: Point,
}

/// The editor's single source of truth
pub struct DiagramState {
    db: DiagramDatabase,
    selection: Selection,
    clipboard: Vec<ClipboardNode>,
    history: CommandHistory,
    ids: IdGenerator,
    config: EditorConfig,
    storage: Box<dyn Storage>,
    commands: Box<dyn CommandFactory>,
    drag: Option<DragSession>,
}

impl fmt::Debug for DiagramState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagramState")
            .field("db", &self.db)
            .field("selection", &self.selection)
            .field("clipboard", &self.clipboard.len())
            .field("history_len", &self.history.len())
            .field("history_index", &self.history.index())
            .field("commands", &self.commands)
            .finish_non_exhaustive()
    }
}

impl Default for DiagramState {
    fn default() -> Self {
        Self::new(EditorConfig::default(), Box::new(MemoryStorage::new()))
    }
}

impl DiagramState {
    pub fn new(config: EditorConfig, storage: Box<dyn Storage>) -> Self {
        Self::with_commands(config, storage, Box::new(StandardCommands))
    }

    /// Build a state manager with a custom command factory
    pub fn with_commands(
        config: EditorConfig,
        storage: Box<dyn Storage>,
        commands: Box<dyn CommandFactory>,
    ) -> Self {
        Self {
            db: DiagramDatabase::new(),
            selection: Selection::new(),
            clipboard: Vec::new(),
            history: CommandHistory::new(config.history_capacity),
            ids: IdGenerator::new(),
            config,
            storage,
            commands,
            drag: None,
        }
    }

    pub fn database(&self) -> &DiagramDatabase {
        &self.db
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn set_snap_to_grid(&mut self, enabled: bool) {
        self.config.snap_to_grid = enabled;
    }

    /// Change the undo depth; the oldest entries that no longer fit are dropped
    pub fn set_history_capacity(&mut self, capacity: usize) {
        self.config.history_capacity = capacity;
        self.history.set_capacity(capacity);
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    /// Allocate a fresh id
    pub fn next_id(&mut self, prefix: IdPrefix) -> String {
        self.ids.next_id(prefix)
    }

    // History

    /// Execute a command, record it and persist
    ///
    /// Returns true when the command was recorded and can be undone; false
    /// when the history is configured to keep nothing. The command is applied
    /// either way.
    pub fn execute_command(&mut self, mut command: Box<dyn Command>) -> bool {
        let _span = debug_span!("execute", command = command.name()).entered();
        command.execute(&mut self.db);
        let recorded = self.history.record(command);
        debug!(index = self.history.index(), recorded, "Command applied");
        self.persist();
        recorded
    }

    /// Revert the command at the cursor; false when there is nothing to undo
    pub fn undo(&mut self) -> bool {
        let Some(command) = self.history.step_back() else {
            return false;
        };
        debug!(command = command.name(), "Undo");
        command.undo(&mut self.db);
        self.persist();
        true
    }

    /// Re-apply the next command; false when there is nothing to redo
    pub fn redo(&mut self) -> bool {
        let Some(command) = self.history.step_forward() else {
            return false;
        };
        debug!(command = command.name(), "Redo");
        command.execute(&mut self.db);
        self.persist();
        true
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Cursor into the history, -1 when nothing is applied
    pub fn history_index(&self) -> isize {
        self.history.index()
    }

    // Selection

    /// Returns whether the item is selected afterwards
    pub fn select(&mut self, item: ItemRef, multi: bool) -> bool {
        let id = item.id.clone();
        self.selection.select(item, multi);
        self.selection.contains(&id)
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Select every entity, then every association
    pub fn select_all(&mut self) {
        let items = self
            .db
            .entities()
            .map(|e| ItemRef::entity(e.id.as_str()))
            .chain(self.db.associations().map(|a| ItemRef::association(a.id.as_str())))
            .collect();
        self.selection.set(items);
    }

    pub fn selection(&self) -> &[ItemRef] {
        self.selection.items()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selection.contains(id)
    }

    /// Delete every selected item that still exists, one command each
    ///
    /// Returns the number of delete commands executed. The selection is
    /// cleared afterwards.
    pub fn delete_selected(&mut self) -> usize {
        let mut executed = 0;
        for item in self.selection.take() {
            let command = match item.kind {
                ItemKind::Entity => self.db.entity(&item.id).map(|e| self.commands.delete_entity(e)),
                ItemKind::Association => self
                    .db
                    .association(&item.id)
                    .map(|a| self.commands.delete_association(a)),
                ItemKind::Connection => self
                    .db
                    .connection(&item.id)
                    .map(|c| self.commands.delete_connection(c)),
            };
            match command {
                Some(command) => {
                    self.execute_command(command);
                    executed += 1;
                }
                None => debug!(kind = %item.kind, id = %item.id, "Selected item no longer exists"),
            }
        }
        executed
    }

    // Clipboard

    /// Copy the selected entities and associations
    ///
    /// Connections are skipped. An empty selection leaves the clipboard as it
    /// was. Returns the number of nodes now on the clipboard.
    pub fn copy(&mut self) -> usize {
        if self.selection.is_empty() {
            return self.clipboard.len();
        }
        let offset = self.config.paste_offset;
        let mut copied = Vec::new();
        for item in self.selection.items() {
            match item.kind {
                ItemKind::Entity => {
                    if let Some(e) = self.db.entity(&item.id) {
                        copied.push(ClipboardNode::Entity(e.duplicate(&mut self.ids, offset)));
                    }
                }
                ItemKind::Association => {
                    if let Some(a) = self.db.association(&item.id) {
                        copied.push(ClipboardNode::Association(a.duplicate(&mut self.ids, offset)));
                    }
                }
                ItemKind::Connection => {}
            }
        }
        debug!(count = copied.len(), "Copied to clipboard");
        self.clipboard = copied;
        self.clipboard.len()
    }

    /// Paste the clipboard as new nodes; false when the clipboard is empty
    ///
    /// Each node is created by its own command. The clipboard is then
    /// duplicated again so the next paste produces fresh records.
    pub fn paste(&mut self) -> bool {
        if self.clipboard.is_empty() {
            return false;
        }
        let nodes = self.clipboard.clone();
        for node in nodes {
            let command = match node {
                ClipboardNode::Entity(e) => self.commands.create_entity(e),
                ClipboardNode::Association(a) => self.commands.create_association(a),
            };
            self.execute_command(command);
        }
        let offset = self.config.paste_offset;
        let ids = &mut self.ids;
        self.clipboard = self
            .clipboard
            .iter()
            .map(|n| n.duplicate(ids, offset))
            .collect();
        true
    }

    pub fn clipboard(&self) -> &[ClipboardNode] {
        &self.clipboard
    }

    // Creation helpers

    /// Create a default entity at a canvas position
    pub fn create_entity_at(&mut self, pos: Point) -> String {
        let pos = snap_to_grid(pos, self.config.grid_size, self.config.snap_to_grid);
        let entity = Entity::create(&mut self.ids, pos.x, pos.y);
        let id = entity.id.clone();
        let command = self.commands.create_entity(entity);
        self.execute_command(command);
        info!(entity = %id, "Entity created");
        id
    }

    /// Create a default association centred on a canvas position
    pub fn create_association_at(&mut self, pos: Point) -> String {
        let pos = snap_to_grid(pos, self.config.grid_size, self.config.snap_to_grid);
        let association = Association::create(&mut self.ids, pos.x, pos.y);
        let id = association.id.clone();
        let command = self.commands.create_association(association);
        self.execute_command(command);
        info!(association = %id, "Association created");
        id
    }

    /// Connect an association to an entity
    ///
    /// Repeated connections between the same pair are allowed and render as
    /// a self-association. Returns `None` when either endpoint is missing.
    pub fn connect(
        &mut self,
        association_id: &str,
        entity_id: &str,
        cardinality: Cardinality,
    ) -> Option<String> {
        if self.db.association(association_id).is_none() || self.db.entity(entity_id).is_none() {
            debug!(association = association_id, entity = entity_id, "Connect target missing");
            return None;
        }
        let id = self.ids.next_id(IdPrefix::Connection);
        let connection = Connection::new(id.as_str(), association_id, entity_id, cardinality);
        self.execute_command(Box::new(super::CreateConnection::new(connection)));
        Some(id)
    }

    // Dragging

    /// Start dragging a node; false if it does not exist
    pub fn begin_drag(&mut self, kind: NodeKind, id: &str) -> bool {
        match self.db.node_position(kind, id) {
            Some(origin) => {
                self.drag = Some(DragSession {
                    kind,
                    id: id.to_string(),
                    origin,
                });
                true
            }
            None => false,
        }
    }

    /// Preview a drag position without recording history
    pub fn drag_to(&mut self, pos: Point) -> Option<Point> {
        let session = self.drag.as_ref()?;
        let pos = snap_to_grid(pos, self.config.grid_size, self.config.snap_to_grid);
        if self.db.set_node_position(session.kind, &session.id, pos) {
            Some(pos)
        } else {
            None
        }
    }

    /// Finish the drag, recording one move if the node changed position
    pub fn end_drag(&mut self) -> bool {
        let Some(session) = self.drag.take() else {
            return false;
        };
        let Some(current) = self.db.node_position(session.kind, &session.id) else {
            return false;
        };
        if current == session.origin {
            return false;
        }
        self.execute_command(Box::new(MoveNode::new(
            session.kind,
            session.id,
            session.origin,
            current,
        )));
        true
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    // Serialization

    /// Compact JSON snapshot of the records
    pub fn serialize(&self) -> Result<String, DiagramError> {
        document::to_json(&self.db)
    }

    /// Replace the records with a parsed document
    ///
    /// On failure nothing changes. On success the selection and the history
    /// are reset and the new state is persisted.
    pub fn deserialize(&mut self, json: &str) -> Result<(), DiagramError> {
        let mut ids = self.ids.clone();
        let db = document::from_json(json, &mut ids).map_err(|e| {
            warn!(error = %e, "Failed to deserialize diagram");
            e
        })?;
        self.db = db;
        self.ids = ids;
        self.reset_session();
        info!(
            entities = self.db.entity_count(),
            associations = self.db.association_count(),
            connections = self.db.connection_count(),
            "Diagram loaded"
        );
        self.persist();
        Ok(())
    }

    /// Indented JSON for file export
    pub fn export_json(&self) -> Result<String, DiagramError> {
        document::to_json_pretty(&self.db)
    }

    pub fn import_json(&mut self, json: &str) -> Result<(), DiagramError> {
        self.deserialize(json)
    }

    /// Load the configured storage slot
    ///
    /// Returns `Ok(false)` when the slot is empty.
    pub fn load_from_storage(&mut self) -> Result<bool, DiagramError> {
        let key = self.config.storage_key.clone();
        let content = self.storage.load(&key).map_err(|e| {
            warn!(key = %key, error = %e, "Failed to read storage");
            DiagramError::persistence_error(format!("{:#}", e))
        })?;
        match content {
            Some(json) => self.deserialize(&json).map(|_| true),
            None => Ok(false),
        }
    }

    /// Remove every record and reset the session
    ///
    /// Cannot fail; a storage error is logged like any other save.
    pub fn clear(&mut self) {
        self.db.clear();
        self.reset_session();
        self.persist();
    }

    fn reset_session(&mut self) {
        self.selection.clear();
        self.history.clear();
        self.drag = None;
    }

    fn persist(&mut self) {
        let json = match self.serialize() {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Failed to serialize diagram");
                return;
            }
        };
        if let Err(e) = self.storage.save(&self.config.storage_key, &json) {
            warn!(key = %self.config.storage_key, error = %e, "Failed to persist diagram");
        }
    }
}
