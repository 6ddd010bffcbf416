//! WebAssembly bindings for the editor
//!
//! [`Editor`] wraps a [`DiagramState`] persisted to the browser's
//! `localStorage`. The JavaScript side draws the JSON returned by
//! [`Editor::layout`] and forwards pointer gestures back here.

use anyhow::anyhow;
use serde::Deserialize;
use wasm_bindgen::prelude::*;

use crate::core::{
    AssociationEditor, Attribute, Cardinality, ClickOutcome, ClickTracker, ConnectionDraft,
    DiagramError, DiagramState, EditorConfig, EntityEditor, ErLayout, ItemKind, ItemRef,
    IdPrefix, LayoutAlgorithm, NodeKind, Point, Storage, Zoom,
};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = localStorage, js_name = getItem, catch)]
    fn local_storage_get(key: &str) -> Result<Option<String>, JsValue>;

    #[wasm_bindgen(js_namespace = localStorage, js_name = setItem, catch)]
    fn local_storage_set(key: &str, value: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(js_namespace = Date, js_name = now)]
    fn date_now() -> f64;
}

/// Initialize WASM module
///
/// Sets up panic hooks and logging for better error messages in the browser.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();

    use crate::core::logging::init_logging;
    let _ = init_logging(Some("info"), None);
}

/// Storage slot in the browser's `localStorage`
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorage;

impl Storage for LocalStorage {
    fn load(&self, key: &str) -> anyhow::Result<Option<String>> {
        local_storage_get(key).map_err(|e| anyhow!("localStorage.getItem failed: {:?}", e))
    }

    fn save(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        local_storage_set(key, value).map_err(|e| anyhow!("localStorage.setItem failed: {:?}", e))
    }
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn node_kind(kind: &str) -> Result<NodeKind, JsValue> {
    match kind {
        "entity" => Ok(NodeKind::Entity),
        "association" => Ok(NodeKind::Association),
        _ => Err(JsValue::from_str(&format!("Unknown node type: {}", kind))),
    }
}

fn item_kind(kind: &str) -> Result<ItemKind, JsValue> {
    match kind {
        "connection" => Ok(ItemKind::Connection),
        other => node_kind(other).map(ItemKind::from),
    }
}

fn parse_attributes(json: &str) -> Result<Vec<Attribute>, JsValue> {
    serde_json::from_str(json).map_err(|e| js_error(DiagramError::deserialize_error(e.to_string())))
}

/// Connection change sent by the association form
#[derive(Debug, Deserialize)]
struct ConnectionChange {
    id: String,
    #[serde(default)]
    cardinality: Option<Cardinality>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    deleted: bool,
}

/// Browser-facing editor
#[wasm_bindgen]
pub struct Editor {
    state: DiagramState,
    clicks: ClickTracker<ItemRef>,
    draft: ConnectionDraft,
    zoom: Zoom,
}

#[wasm_bindgen]
impl Editor {
    /// Create an editor; `config_json` overrides any default settings
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<Editor, JsValue> {
        let config = match config_json {
            Some(json) => EditorConfig::from_json(&json).map_err(js_error)?,
            None => EditorConfig::default(),
        };
        Ok(Editor {
            clicks: ClickTracker::new(config.double_click_ms),
            zoom: Zoom::new(&config),
            draft: ConnectionDraft::new(),
            state: DiagramState::new(config, Box::new(LocalStorage)),
        })
    }

    /// Restore the saved diagram; false when nothing was saved
    pub fn load(&mut self) -> Result<bool, JsValue> {
        self.state.load_from_storage().map_err(js_error)
    }

    /// Boxes and routes as JSON
    pub fn layout(&self) -> Result<String, JsValue> {
        let layout = ErLayout::new(self.state.config().clone())
            .layout(self.state.database())
            .map_err(js_error)?;
        serde_json::to_string(&layout).map_err(js_error)
    }

    #[wasm_bindgen(js_name = createEntity)]
    pub fn create_entity(&mut self, x: f64, y: f64) -> String {
        self.state.create_entity_at(Point::new(x, y))
    }

    #[wasm_bindgen(js_name = createAssociation)]
    pub fn create_association(&mut self, x: f64, y: f64) -> String {
        self.state.create_association_at(Point::new(x, y))
    }

    pub fn connect(
        &mut self,
        association_id: &str,
        entity_id: &str,
        cardinality: &str,
    ) -> Result<Option<String>, JsValue> {
        let cardinality: Cardinality = cardinality.parse().map_err(js_error)?;
        Ok(self.state.connect(association_id, entity_id, cardinality))
    }

    /// Connection tool click; returns the new connection id once both ends are picked
    #[wasm_bindgen(js_name = pickForConnection)]
    pub fn pick_for_connection(&mut self, kind: &str, id: &str) -> Result<Option<String>, JsValue> {
        let kind = node_kind(kind)?;
        Ok(self.draft.pick_and_connect(&mut self.state, kind, id))
    }

    #[wasm_bindgen(js_name = cancelConnection)]
    pub fn cancel_connection(&mut self) {
        self.draft.cancel();
    }

    /// Returns whether the item is selected afterwards
    pub fn select(&mut self, kind: &str, id: &str, multi: bool) -> Result<bool, JsValue> {
        Ok(self.state.select(ItemRef::new(item_kind(kind)?, id), multi))
    }

    #[wasm_bindgen(js_name = clearSelection)]
    pub fn clear_selection(&mut self) {
        self.state.clear_selection();
    }

    #[wasm_bindgen(js_name = selectAll)]
    pub fn select_all(&mut self) {
        self.state.select_all();
    }

    /// Selected `{type, id}` references as JSON
    pub fn selection(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.state.selection()).map_err(js_error)
    }

    /// Click on a shape; returns "double" when it completes a double click
    ///
    /// Single clicks are applied as selections by [`Editor::poll_clicks`]
    /// once the double-click window has passed.
    pub fn click(&mut self, kind: &str, id: &str, multi: bool) -> Result<String, JsValue> {
        let item = ItemRef::new(item_kind(kind)?, id);
        Ok(match self.clicks.click(item, date_now() as u64, multi) {
            ClickOutcome::Pending => "pending".to_string(),
            ClickOutcome::DoubleClick(_) => "double".to_string(),
        })
    }

    /// Apply resolved single clicks; returns how many were applied
    #[wasm_bindgen(js_name = pollClicks)]
    pub fn poll_clicks(&mut self) -> usize {
        let resolved = self.clicks.poll(date_now() as u64);
        let count = resolved.len();
        for click in resolved {
            self.state.select(click.target, click.multi);
        }
        count
    }

    /// Milliseconds until the next pending click resolves
    #[wasm_bindgen(js_name = nextClickDelay)]
    pub fn next_click_delay(&self) -> Option<f64> {
        let now = date_now() as u64;
        self.clicks
            .next_deadline()
            .map(|deadline| deadline.saturating_sub(now) as f64)
    }

    /// Node under a canvas point as `{type, id}` JSON
    #[wasm_bindgen(js_name = hitTest)]
    pub fn hit_test(&self, x: f64, y: f64) -> Result<Option<String>, JsValue> {
        let layout = ErLayout::new(self.state.config().clone())
            .layout(self.state.database())
            .map_err(js_error)?;
        layout
            .node_at(Point::new(x, y))
            .map(|node| serde_json::to_string(&ItemRef::new(node.kind.into(), node.id.as_str())))
            .transpose()
            .map_err(js_error)
    }

    #[wasm_bindgen(js_name = deleteSelected)]
    pub fn delete_selected(&mut self) -> usize {
        self.state.delete_selected()
    }

    pub fn copy(&mut self) -> usize {
        self.state.copy()
    }

    pub fn paste(&mut self) -> bool {
        self.state.paste()
    }

    pub fn undo(&mut self) -> bool {
        self.state.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.state.redo()
    }

    #[wasm_bindgen(js_name = canUndo)]
    pub fn can_undo(&self) -> bool {
        self.state.can_undo()
    }

    #[wasm_bindgen(js_name = canRedo)]
    pub fn can_redo(&self) -> bool {
        self.state.can_redo()
    }

    #[wasm_bindgen(js_name = beginDrag)]
    pub fn begin_drag(&mut self, kind: &str, id: &str) -> Result<bool, JsValue> {
        Ok(self.state.begin_drag(node_kind(kind)?, id))
    }

    #[wasm_bindgen(js_name = dragTo)]
    pub fn drag_to(&mut self, x: f64, y: f64) -> bool {
        self.state.drag_to(Point::new(x, y)).is_some()
    }

    #[wasm_bindgen(js_name = endDrag)]
    pub fn end_drag(&mut self) -> bool {
        self.state.end_drag()
    }

    #[wasm_bindgen(js_name = setSnapToGrid)]
    pub fn set_snap_to_grid(&mut self, enabled: bool) {
        self.state.set_snap_to_grid(enabled);
    }

    #[wasm_bindgen(js_name = setHistoryCapacity)]
    pub fn set_history_capacity(&mut self, capacity: usize) {
        self.state.set_history_capacity(capacity);
    }

    #[wasm_bindgen(js_name = zoomIn)]
    pub fn zoom_in(&mut self) -> f64 {
        self.zoom.zoom_in()
    }

    #[wasm_bindgen(js_name = zoomOut)]
    pub fn zoom_out(&mut self) -> f64 {
        self.zoom.zoom_out()
    }

    #[wasm_bindgen(js_name = zoomWheel)]
    pub fn zoom_wheel(&mut self, delta_y: f64) -> f64 {
        self.zoom.wheel(delta_y)
    }

    #[wasm_bindgen(js_name = zoomReset)]
    pub fn zoom_reset(&mut self) -> f64 {
        self.zoom.reset()
    }

    /// Commit the entity form
    ///
    /// Throws with the validation message when the edit is rejected or needs
    /// confirmation.
    #[wasm_bindgen(js_name = updateEntity)]
    pub fn update_entity(
        &mut self,
        id: &str,
        name: &str,
        attributes_json: &str,
        confirm_warnings: bool,
    ) -> Result<(), JsValue> {
        let mut editor = EntityEditor::open(&self.state, id).map_err(js_error)?;
        let draft = editor.draft_mut();
        draft.rename(name);
        draft.attributes = parse_attributes(attributes_json)?;
        for attr in draft.attributes.iter_mut().filter(|a| a.id.is_empty()) {
            attr.id = self.state.next_id(IdPrefix::Attribute);
        }
        editor.commit(&mut self.state, confirm_warnings).map_err(js_error)
    }

    /// Commit the association form, connection edits included
    #[wasm_bindgen(js_name = updateAssociation)]
    pub fn update_association(
        &mut self,
        id: &str,
        name: &str,
        attributes_json: &str,
        connections_json: &str,
    ) -> Result<(), JsValue> {
        let mut editor = AssociationEditor::open(&self.state, id).map_err(js_error)?;
        let changes: Vec<ConnectionChange> = serde_json::from_str(connections_json)
            .map_err(|e| js_error(DiagramError::deserialize_error(e.to_string())))?;

        let attributes = parse_attributes(attributes_json)?;
        let draft = editor.draft_mut();
        draft.rename(name);
        draft.attributes = attributes;
        for attr in draft.attributes.iter_mut().filter(|a| a.id.is_empty()) {
            attr.id = self.state.next_id(IdPrefix::Attribute);
        }
        for change in changes {
            if change.deleted {
                editor.delete_connection(&change.id);
                continue;
            }
            if let Some(cardinality) = change.cardinality {
                editor.set_cardinality(&change.id, cardinality);
            }
            if let Some(label) = change.label {
                editor.set_label(&change.id, label);
            }
        }
        editor.commit(&mut self.state, true).map_err(js_error)
    }

    /// Delete an association and its connections from its form
    #[wasm_bindgen(js_name = deleteAssociation)]
    pub fn delete_association(&mut self, id: &str) -> Result<bool, JsValue> {
        let editor = AssociationEditor::open(&self.state, id).map_err(js_error)?;
        Ok(editor.delete(&mut self.state))
    }

    /// Current diagram as compact JSON
    pub fn serialize(&self) -> Result<String, JsValue> {
        self.state.serialize().map_err(js_error)
    }

    /// Indented JSON for file download
    #[wasm_bindgen(js_name = exportJson)]
    pub fn export_json(&self) -> Result<String, JsValue> {
        self.state.export_json().map_err(js_error)
    }

    /// Replace the diagram with an imported file
    #[wasm_bindgen(js_name = importJson)]
    pub fn import_json(&mut self, json: &str) -> Result<(), JsValue> {
        self.draft.cancel();
        self.clicks.reset();
        self.state.import_json(json).map_err(js_error)
    }

    pub fn clear(&mut self) {
        self.draft.cancel();
        self.clicks.reset();
        self.state.clear();
    }
}
