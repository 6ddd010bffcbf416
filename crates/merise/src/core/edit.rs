//! Edit sessions for the entity and association forms
//!
//! An editor copies the record when it opens and works on that draft only.
//! Dropping the editor cancels the edit. Committing validates the draft and
//! executes a single undoable command.

use tracing::debug;

use super::{
    validate_association, validate_entity, Attribute, Cardinality, Command, CompositeCommand,
    Connection, ConnectionData, DeleteAssociation, DeleteConnection, DiagramError, DiagramState,
    IdPrefix, NodeData, UpdateAssociation, UpdateConnection, UpdateEntity, ValidationError,
    ValidationWarning,
};

/// Name and attribute list being edited
#[derive(Debug, Clone, PartialEq)]
pub struct NodeDraft {
    pub name: String,
    pub attributes: Vec<Attribute>,
}

impl NodeDraft {
    fn from_data(data: &NodeData) -> Self {
        Self {
            name: data.name.clone(),
            attributes: data.attributes.clone(),
        }
    }

    fn to_data(&self, original: &NodeData) -> NodeData {
        NodeData {
            name: self.name.clone(),
            x: original.x,
            y: original.y,
            attributes: self.attributes.clone(),
        }
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Append a default attribute and return its index
    pub fn add_attribute(&mut self, id: impl Into<String>) -> usize {
        self.attributes.push(Attribute::new(id, Attribute::DEFAULT_NAME));
        self.attributes.len() - 1
    }

    pub fn attribute_mut(&mut self, index: usize) -> Option<&mut Attribute> {
        self.attributes.get_mut(index)
    }

    /// Replace an attribute; the id at that index is kept
    pub fn update_attribute(&mut self, index: usize, attribute: Attribute) -> bool {
        match self.attributes.get_mut(index) {
            Some(slot) => {
                let id = std::mem::take(&mut slot.id);
                *slot = Attribute { id, ..attribute };
                true
            }
            None => false,
        }
    }

    pub fn remove_attribute(&mut self, index: usize) -> Option<Attribute> {
        (index < self.attributes.len()).then(|| self.attributes.remove(index))
    }

    pub fn move_attribute_up(&mut self, index: usize) -> bool {
        if index == 0 || index >= self.attributes.len() {
            return false;
        }
        self.attributes.swap(index - 1, index);
        true
    }

    pub fn move_attribute_down(&mut self, index: usize) -> bool {
        if index + 1 >= self.attributes.len() {
            return false;
        }
        self.attributes.swap(index, index + 1);
        true
    }
}

fn check_warnings(
    warnings: Vec<ValidationWarning>,
    confirm_warnings: bool,
) -> Result<(), DiagramError> {
    if warnings.is_empty() || confirm_warnings {
        Ok(())
    } else {
        debug!(?warnings, "Commit needs confirmation");
        Err(DiagramError::Unconfirmed { warnings })
    }
}

fn rejected(error: ValidationError) -> DiagramError {
    debug!(%error, "Commit rejected");
    DiagramError::Validation(error)
}

/// Edit session for one entity
#[derive(Debug, Clone)]
pub struct EntityEditor {
    entity_id: String,
    original: NodeData,
    draft: NodeDraft,
}

impl EntityEditor {
    pub fn open(state: &DiagramState, entity_id: &str) -> Result<Self, DiagramError> {
        let entity = state
            .database()
            .entity(entity_id)
            .ok_or_else(|| DiagramError::not_found("entity", entity_id))?;
        let original = entity.snapshot();
        Ok(Self {
            entity_id: entity_id.to_string(),
            draft: NodeDraft::from_data(&original),
            original,
        })
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    pub fn draft(&self) -> &NodeDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut NodeDraft {
        &mut self.draft
    }

    /// Append a `nouvel_attribut VARCHAR` row with a fresh id
    pub fn add_attribute(&mut self, state: &mut DiagramState) -> usize {
        let id = state.next_id(IdPrefix::Attribute);
        self.draft.add_attribute(id)
    }

    pub fn validate(&self) -> Result<Vec<ValidationWarning>, ValidationError> {
        validate_entity(&self.draft.name, &self.draft.attributes)
    }

    pub fn is_dirty(&self) -> bool {
        self.draft != NodeDraft::from_data(&self.original)
    }

    /// Validate and apply the draft as one `UpdateEntity`
    pub fn commit(&self, state: &mut DiagramState, confirm_warnings: bool) -> Result<(), DiagramError> {
        let warnings = self.validate().map_err(rejected)?;
        check_warnings(warnings, confirm_warnings)?;
        if state.database().entity(&self.entity_id).is_none() {
            return Err(DiagramError::not_found("entity", self.entity_id.as_str()));
        }
        state.execute_command(Box::new(UpdateEntity::new(
            self.entity_id.as_str(),
            self.original.clone(),
            self.draft.to_data(&self.original),
        )));
        Ok(())
    }
}

/// Pending changes to one connection of the edited association
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionEdit {
    pub original: Connection,
    pub cardinality: Cardinality,
    pub label: String,
    pub deleted: bool,
}

impl ConnectionEdit {
    fn new(original: &Connection) -> Self {
        Self {
            original: original.clone(),
            cardinality: original.cardinality,
            label: original.label.clone(),
            deleted: false,
        }
    }

    fn is_changed(&self) -> bool {
        self.cardinality != self.original.cardinality || self.label != self.original.label
    }
}

/// Edit session for one association and its connections
#[derive(Debug, Clone)]
pub struct AssociationEditor {
    association_id: String,
    original: NodeData,
    draft: NodeDraft,
    connections: Vec<ConnectionEdit>,
}

impl AssociationEditor {
    pub fn open(state: &DiagramState, association_id: &str) -> Result<Self, DiagramError> {
        let db = state.database();
        let association = db
            .association(association_id)
            .ok_or_else(|| DiagramError::not_found("association", association_id))?;
        let original = association.snapshot();
        Ok(Self {
            association_id: association_id.to_string(),
            draft: NodeDraft::from_data(&original),
            original,
            connections: db
                .connections_for_association(association_id)
                .map(ConnectionEdit::new)
                .collect(),
        })
    }

    pub fn association_id(&self) -> &str {
        &self.association_id
    }

    pub fn draft(&self) -> &NodeDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut NodeDraft {
        &mut self.draft
    }

    pub fn add_attribute(&mut self, state: &mut DiagramState) -> usize {
        let id = state.next_id(IdPrefix::Attribute);
        self.draft.add_attribute(id)
    }

    /// Connections still shown in the form
    pub fn connections(&self) -> impl Iterator<Item = &ConnectionEdit> {
        self.connections.iter().filter(|c| !c.deleted)
    }

    fn connection_mut(&mut self, connection_id: &str) -> Option<&mut ConnectionEdit> {
        self.connections
            .iter_mut()
            .find(|c| c.original.id == connection_id && !c.deleted)
    }

    pub fn set_cardinality(&mut self, connection_id: &str, cardinality: Cardinality) -> bool {
        self.connection_mut(connection_id)
            .map(|c| c.cardinality = cardinality)
            .is_some()
    }

    pub fn set_label(&mut self, connection_id: &str, label: impl Into<String>) -> bool {
        let label = label.into();
        self.connection_mut(connection_id)
            .map(|c| c.label = label)
            .is_some()
    }

    pub fn delete_connection(&mut self, connection_id: &str) -> bool {
        self.connection_mut(connection_id)
            .map(|c| c.deleted = true)
            .is_some()
    }

    pub fn validate(&self) -> Result<Vec<ValidationWarning>, ValidationError> {
        validate_association(&self.draft.name, &self.draft.attributes)
    }

    /// Validate and apply the draft and connection edits as one history entry
    pub fn commit(&self, state: &mut DiagramState, confirm_warnings: bool) -> Result<(), DiagramError> {
        let warnings = self.validate().map_err(rejected)?;
        check_warnings(warnings, confirm_warnings)?;
        if state.database().association(&self.association_id).is_none() {
            return Err(DiagramError::not_found("association", self.association_id.as_str()));
        }

        let mut command = CompositeCommand::new().with(Box::new(UpdateAssociation::new(
            self.association_id.as_str(),
            self.original.clone(),
            self.draft.to_data(&self.original),
        )));
        for edit in &self.connections {
            if edit.deleted {
                command.push(Box::new(DeleteConnection::new(edit.original.clone())));
            } else if edit.is_changed() {
                command.push(Box::new(UpdateConnection::new(
                    edit.original.id.as_str(),
                    ConnectionData::from(&edit.original),
                    ConnectionData {
                        cardinality: edit.cardinality,
                        label: edit.label.clone(),
                    },
                )));
            }
        }
        debug!(parts = command.len(), "Committing association edit");
        state.execute_command(Box::new(command));
        Ok(())
    }

    /// Delete the association and its connections instead of editing it
    pub fn delete(self, state: &mut DiagramState) -> bool {
        let Some(association) = state.database().association(&self.association_id) else {
            return false;
        };
        let command: Box<dyn Command> = Box::new(DeleteAssociation::new(association.clone()));
        state.execute_command(command);
        true
    }
}
