//! Record identifier generation
//!
//! Identifiers are `"{prefix}_{n}"` strings. The generator is owned by the
//! state manager and is told about every id loaded from a document, so a
//! freshly generated id never matches one already in the diagram.

use tracing::trace;

/// Prefixes used for each record family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdPrefix {
    Entity,
    Association,
    Connection,
    Attribute,
}

impl IdPrefix {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdPrefix::Entity => "entity",
            IdPrefix::Association => "assoc",
            IdPrefix::Connection => "conn",
            IdPrefix::Attribute => "attr",
        }
    }
}

/// Monotonic id source
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    next: u64,
}

impl IdGenerator {
    /// Largest suffix taken into account by [`IdGenerator::observe`]
    ///
    /// `2^53 - 1`, the largest integer a JavaScript number holds exactly.
    pub const MAX_OBSERVED: u64 = (1 << 53) - 1;

    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new id with the given prefix
    pub fn next_id(&mut self, prefix: IdPrefix) -> String {
        self.next = self.next.saturating_add(1);
        format!("{}_{}", prefix.as_str(), self.next)
    }

    /// Advance past the numeric suffix of an existing id, if it has one
    ///
    /// Suffixes above [`IdGenerator::MAX_OBSERVED`] are not counters this
    /// generator could ever reach and are left alone.
    pub fn observe(&mut self, id: &str) {
        let suffix = id.rsplit('_').next().unwrap_or("");
        match suffix.parse::<u64>() {
            Ok(n) if n <= Self::MAX_OBSERVED => self.next = self.next.max(n),
            Ok(n) => trace!(id, suffix = n, "Ignoring out-of-range id suffix"),
            Err(_) => {}
        }
    }
}
