//! Integration tests for the public API

use merise::prelude::*;
use serde_json::Value;

#[test]
fn test_new_entity_document_shape() {
    let mut state = DiagramState::default();
    let id = state.create_entity_at(Point::new(100.0, 100.0));

    let doc: Value = serde_json::from_str(&state.serialize().unwrap()).unwrap();
    let entities = doc["entities"].as_array().unwrap();
    assert_eq!(entities.len(), 1);
    assert_eq!(entities[0]["id"], Value::String(id));
    assert_eq!(entities[0]["name"], "Nouvelle Entité");
    assert_eq!(entities[0]["x"], 100.0);
    assert_eq!(entities[0]["y"], 100.0);
    assert_eq!(entities[0]["type"], "entity");

    let attrs = entities[0]["attributes"].as_array().unwrap();
    assert_eq!(attrs.len(), 1);
    assert_eq!(attrs[0]["name"], "id");
    assert_eq!(attrs[0]["type"], "INTEGER");
    assert_eq!(attrs[0]["isPK"], true);
    assert_eq!(attrs[0]["isNull"], false);

    assert!(doc["associations"].as_array().unwrap().is_empty());
    assert!(doc["connections"].as_array().unwrap().is_empty());
}

#[test]
fn test_delete_and_undo_restores_connection() {
    let mut state = DiagramState::default();
    let entity = state.create_entity_at(Point::new(100.0, 100.0));
    let association = state.create_association_at(Point::new(500.0, 140.0));
    let connection = state
        .connect(&association, &entity, Cardinality::OneOrMany)
        .unwrap();
    let before = state.serialize().unwrap();

    state.select(ItemRef::entity(entity.as_str()), false);
    assert_eq!(state.delete_selected(), 1);
    assert!(state.database().entity(&entity).is_none());
    assert!(state.database().connection(&connection).is_none());
    assert!(state.database().association(&association).is_some());

    assert!(state.undo());
    let conn = state.database().connection(&connection).unwrap();
    assert_eq!(conn.entity_id, entity);
    assert_eq!(conn.association_id, association);
    assert_eq!(conn.cardinality, Cardinality::OneOrMany);
    assert_eq!(state.serialize().unwrap(), before);
}

#[test]
fn test_cascade_keeps_unrelated_connections() {
    let mut state = DiagramState::default();
    let client = state.create_entity_at(Point::new(0.0, 0.0));
    let product = state.create_entity_at(Point::new(600.0, 0.0));
    let order = state.create_association_at(Point::new(350.0, 60.0));

    state.connect(&order, &client, Cardinality::ZeroOrMany).unwrap();
    let kept = state.connect(&order, &product, Cardinality::OneOrMany).unwrap();
    state.connect(&order, &client, Cardinality::ExactlyOne).unwrap();

    state.select(ItemRef::entity(client.as_str()), false);
    state.delete_selected();

    let remaining: Vec<_> = state.database().connections().map(|c| c.id.clone()).collect();
    assert_eq!(remaining, vec![kept]);
    for conn in state.database().connections() {
        assert!(state.database().entity(&conn.entity_id).is_some());
        assert!(state.database().association(&conn.association_id).is_some());
    }
}

#[test]
fn test_select_toggle_and_replace() {
    let mut state = DiagramState::default();
    let a = state.create_entity_at(Point::new(0.0, 0.0));
    let b = state.create_entity_at(Point::new(300.0, 0.0));

    state.select(ItemRef::entity(a.as_str()), false);
    state.select(ItemRef::entity(b.as_str()), true);
    assert_eq!(state.selection().len(), 2);

    state.select(ItemRef::entity(a.as_str()), true);
    assert!(!state.is_selected(&a));
    assert!(state.is_selected(&b));

    state.select(ItemRef::entity(a.as_str()), false);
    assert_eq!(state.selection(), &[ItemRef::entity(a.as_str())]);
}

#[test]
fn test_copy_paste_creates_independent_records() {
    let mut state = DiagramState::default();
    let original = state.create_entity_at(Point::new(100.0, 100.0));
    state.select(ItemRef::entity(original.as_str()), false);
    assert_eq!(state.copy(), 1);

    assert!(state.paste());
    assert_eq!(state.database().entity_count(), 2);
    let pasted = state.database().entities().nth(1).unwrap().clone();
    assert_ne!(pasted.id, original);
    assert_eq!(pasted.name, "Nouvelle Entité (copie)");
    assert_eq!(pasted.position(), Point::new(150.0, 150.0));
    assert_ne!(
        pasted.attributes[0].id,
        state.database().entity(&original).unwrap().attributes[0].id
    );

    assert!(state.paste());
    let third = state.database().entities().nth(2).unwrap();
    assert_eq!(third.position(), Point::new(200.0, 200.0));
    assert_ne!(third.id, pasted.id);
}

#[test]
fn test_edit_entity_through_session() {
    let mut state = DiagramState::default();
    let id = state.create_entity_at(Point::new(0.0, 0.0));

    let mut editor = EntityEditor::open(&state, &id).unwrap();
    editor.draft_mut().rename("Client");
    editor.add_attribute(&mut state);
    editor.commit(&mut state, false).unwrap();

    let entity = state.database().entity(&id).unwrap();
    assert_eq!(entity.name, "Client");
    assert_eq!(entity.attributes.len(), 2);

    assert!(state.undo());
    assert_eq!(state.database().entity(&id).unwrap().name, "Nouvelle Entité");
}

#[test]
fn test_layout_reports_routes() {
    let mut state = DiagramState::default();
    let e = state.create_entity_at(Point::new(0.0, 0.0));
    let a = state.create_association_at(Point::new(500.0, 60.0));
    state.connect(&a, &e, Cardinality::ZeroOrOne).unwrap();

    let layout = ErLayout::new(state.config().clone())
        .layout(state.database())
        .unwrap();
    assert_eq!(layout.nodes.len(), 2);
    assert_eq!(layout.connections.len(), 1);
    assert!(!layout.connections[0].path.is_curve());
    assert!(layout.connections[0].label_anchor.is_none());
}

#[test]
fn test_association_edit_after_cascade_undoes_cleanly() {
    let mut state = DiagramState::default();
    let entity = state.create_entity_at(Point::new(0.0, 0.0));
    let association = state.create_association_at(Point::new(500.0, 60.0));
    let connection = state
        .connect(&association, &entity, Cardinality::OneOrMany)
        .unwrap();

    let mut editor = AssociationEditor::open(&state, &association).unwrap();
    state.select(ItemRef::entity(entity.as_str()), false);
    state.delete_selected();

    assert!(editor.delete_connection(&connection));
    editor.draft_mut().rename("Commander");
    editor.commit(&mut state, true).unwrap();

    assert!(state.undo());
    let db = state.database();
    assert!(db.connection(&connection).is_none());
    assert_eq!(db.association(&association).unwrap().name, "Association");
    for conn in db.connections() {
        assert!(db.entity(&conn.entity_id).is_some(), "dangling {}", conn.id);
    }

    assert!(state.undo());
    assert!(state.database().entity(&entity).is_some());
    assert!(state.database().connection(&connection).is_some());
}
