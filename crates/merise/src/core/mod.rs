//! Core of the diagram editor
//!
//! Records and their store, the reversible commands that change them, the
//! state manager with history and clipboard, and the geometry the renderer
//! draws from.

mod command;
mod config;
mod database;
pub mod document;
mod edit;
mod error;
mod geometry;
mod gesture;
mod history;
mod ids;
mod layout;
pub mod logging;
mod routing;
mod selection;
mod state;
mod storage;
mod text;
mod types;
mod validation;

pub use command::*;
pub use config::*;
pub use database::*;
pub use edit::*;
pub use error::*;
pub use geometry::*;
pub use gesture::*;
pub use history::*;
pub use ids::*;
pub use layout::*;
pub use logging::*;
pub use routing::*;
pub use selection::*;
pub use state::*;
pub use storage::*;
pub use text::*;
pub use types::*;
pub use validation::*;
