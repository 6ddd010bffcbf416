//! Merise - editing core for entity/association diagrams
//!
//! Entities and associations are placed on a canvas and linked by
//! connections carrying a cardinality. Every change is a reversible command
//! kept in a bounded undo history, and the diagram round-trips through a
//! plain JSON document.
//!
//! # Quick Start
//!
//! ```rust
//! use merise::prelude::*;
//!
//! let mut state = DiagramState::default();
//! let client = state.create_entity_at(Point::new(100.0, 100.0));
//! let order = state.create_association_at(Point::new(500.0, 160.0));
//! state.connect(&order, &client, Cardinality::ZeroOrMany).unwrap();
//!
//! state.select(ItemRef::entity(client.as_str()), false);
//! state.delete_selected();
//! assert_eq!(state.database().connection_count(), 0);
//!
//! assert!(state.undo());
//! assert_eq!(state.database().connection_count(), 1);
//! ```
//!
//! # Rendering
//!
//! The renderer reads positions through a [`LayoutAlgorithm`]:
//!
//! ```rust
//! use merise::prelude::*;
//!
//! let mut state = DiagramState::default();
//! state.create_entity_at(Point::new(0.0, 0.0));
//!
//! let layout = ErLayout::new(state.config().clone())
//!     .layout(state.database())
//!     .unwrap();
//! assert_eq!(layout.nodes.len(), 1);
//! ```

pub mod core;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use core::*;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::core::{
        AssociationEditor, Attribute, Cardinality, ClickOutcome, ClickTracker, Command,
        CommandFactory, ConnectionDraft, ConnectionRouter, DiagramDatabase, DiagramError,
        DiagramLayout, DiagramState, EditorConfig, EntityEditor, ErLayout, ItemKind, ItemRef,
        LayoutAlgorithm, MemoryStorage, NodeKind, Point, SqlType, Storage,
    };
}

/// Load a JSON document into an in-memory editor state
///
/// The returned state does not persist anywhere.
/// # Example
/// ```rust
/// let state = merise::load(r#"{"entities": [], "associations": []}"#).unwrap();
/// assert!(state.database().is_empty());
/// ```
pub fn load(json: &str) -> Result<DiagramState, DiagramError> {
    let mut state = DiagramState::new(EditorConfig::default(), Box::new(NullStorage));
    state.deserialize(json)?;
    Ok(state)
}

/// Lay out a JSON document with the default configuration
///
/// # Example
/// ```rust
/// let json = r#"{"entities": [{"id": "e1", "name": "Client", "x": 0, "y": 0, "attributes": []}]}"#;
/// let layout = merise::layout(json).unwrap();
/// assert_eq!(layout.nodes[0].id, "e1");
/// ```
pub fn layout(json: &str) -> anyhow::Result<DiagramLayout> {
    let state = load(json)?;
    ErLayout::new(state.config().clone()).layout(state.database())
}
