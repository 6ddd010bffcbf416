//! Tests for error reporting across the editing API

use merise::core::{DiagramError, ValidationError, ValidationWarning};
use merise::prelude::*;

#[test]
fn test_empty_name_is_rejected() {
    let mut state = DiagramState::default();
    let id = state.create_entity_at(Point::new(0.0, 0.0));
    let mut editor = EntityEditor::open(&state, &id).unwrap();
    editor.draft_mut().rename("   ");

    let err = editor.commit(&mut state, true).unwrap_err();
    assert!(matches!(
        err,
        DiagramError::Validation(ValidationError::EmptyName { .. })
    ));
    assert_eq!(state.history_len(), 1);
}

#[test]
fn test_duplicate_attribute_message() {
    let mut state = DiagramState::default();
    let id = state.create_entity_at(Point::new(0.0, 0.0));
    let mut editor = EntityEditor::open(&state, &id).unwrap();
    let row = editor.add_attribute(&mut state);
    editor.draft_mut().attribute_mut(row).unwrap().name = "ID".to_string();

    let err = editor.commit(&mut state, true).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("Validation error"));
    assert!(message.contains("duplicate attribute names: id"));
}

#[test]
fn test_missing_primary_key_needs_confirmation() {
    let mut state = DiagramState::default();
    let id = state.create_entity_at(Point::new(0.0, 0.0));
    let mut editor = EntityEditor::open(&state, &id).unwrap();
    editor.draft_mut().remove_attribute(0);

    match editor.commit(&mut state, false) {
        Err(DiagramError::Unconfirmed { warnings }) => {
            assert_eq!(warnings, vec![ValidationWarning::MissingPrimaryKey]);
        }
        other => panic!("expected a confirmation request, got {:?}", other),
    }
    assert!(state.database().entity(&id).unwrap().attributes.len() == 1);

    editor.commit(&mut state, true).unwrap();
    assert!(state.database().entity(&id).unwrap().attributes.is_empty());
}

#[test]
fn test_editor_on_missing_record() {
    let state = DiagramState::default();
    let err = EntityEditor::open(&state, "entity_99").unwrap_err();
    assert_eq!(err.to_string(), "entity not found: entity_99");
    assert!(matches!(
        AssociationEditor::open(&state, "assoc_1"),
        Err(DiagramError::NotFound { .. })
    ));
}

#[test]
fn test_commit_after_record_deleted() {
    let mut state = DiagramState::default();
    let id = state.create_entity_at(Point::new(0.0, 0.0));
    let editor = EntityEditor::open(&state, &id).unwrap();
    state.select(ItemRef::entity(id.as_str()), false);
    state.delete_selected();

    assert!(matches!(
        editor.commit(&mut state, true),
        Err(DiagramError::NotFound { .. })
    ));
}

#[test]
fn test_malformed_document() {
    let err = merise::load("not json").unwrap_err();
    assert!(err.to_string().starts_with("Deserialize error"));

    let err = merise::load(r#"{"entities": [{"id": "e1", "name": "x", "x": 0, "y": 0}]}"#)
        .unwrap_err();
    assert!(err.to_string().contains("attributes"));
}

#[test]
fn test_io_error_conversion() {
    use std::io;
    let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "read-only");
    let error: DiagramError = io_err.into();
    assert!(error.to_string().contains("IO error"));
    assert!(error.to_string().contains("read-only"));
}

#[test]
fn test_unknown_cardinality() {
    assert!("2,n".parse::<Cardinality>().is_err());
    assert_eq!("0, N".parse::<Cardinality>().unwrap(), Cardinality::ZeroOrMany);
}
