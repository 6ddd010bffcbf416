//! Pointer gesture helpers
//!
//! [`ClickTracker`] tells single clicks from double clicks on the same target.
//! A single click is held back for the double-click window and only resolved
//! once the window passes without a second click; a second click inside the
//! window cancels it and reports a double click instead. Time is passed in by
//! the caller in milliseconds so the tracker works with any clock.
//!
//! [`ConnectionDraft`] is the two-step connection tool: pick an association,
//! then an entity.

use tracing::trace;

use super::{Cardinality, DiagramState, NodeKind};

/// Result of feeding a click to the tracker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome<K> {
    /// Held back until the window passes
    Pending,
    /// Second click on the same target within the window
    DoubleClick(K),
}

/// A single click whose window passed without a second click
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleClick<K> {
    pub target: K,
    /// Whether the click asked for multi-selection (shift held)
    pub multi: bool,
}

#[derive(Debug, Clone)]
struct PendingClick<K> {
    target: K,
    at_ms: u64,
    multi: bool,
}

/// Per-target single/double click disambiguation
#[derive(Debug, Clone)]
pub struct ClickTracker<K> {
    window_ms: u64,
    pending: Vec<PendingClick<K>>,
    resolved: Vec<SingleClick<K>>,
}

impl<K: Clone + PartialEq> ClickTracker<K> {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            pending: Vec::new(),
            resolved: Vec::new(),
        }
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    /// Register a click on `target` at `now_ms`
    pub fn click(&mut self, target: K, now_ms: u64, multi: bool) -> ClickOutcome<K> {
        if let Some(index) = self.pending.iter().position(|p| p.target == target) {
            let previous = self.pending.remove(index);
            if now_ms.saturating_sub(previous.at_ms) < self.window_ms {
                trace!(elapsed = now_ms.saturating_sub(previous.at_ms), "Double click");
                return ClickOutcome::DoubleClick(target);
            }
            // The earlier click already stands on its own
            self.resolved.push(SingleClick {
                target: previous.target,
                multi: previous.multi,
            });
        }
        self.pending.push(PendingClick {
            target,
            at_ms: now_ms,
            multi,
        });
        ClickOutcome::Pending
    }

    /// Single clicks whose window has passed, oldest first
    pub fn poll(&mut self, now_ms: u64) -> Vec<SingleClick<K>> {
        let window = self.window_ms;
        let mut ready = std::mem::take(&mut self.resolved);
        let mut still_pending = Vec::with_capacity(self.pending.len());
        for p in self.pending.drain(..) {
            if now_ms.saturating_sub(p.at_ms) >= window {
                ready.push(SingleClick {
                    target: p.target,
                    multi: p.multi,
                });
            } else {
                still_pending.push(p);
            }
        }
        self.pending = still_pending;
        ready
    }

    /// When the next pending click resolves, for scheduling a timer
    pub fn next_deadline(&self) -> Option<u64> {
        self.pending.iter().map(|p| p.at_ms + self.window_ms).min()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty() || !self.resolved.is_empty()
    }

    /// Forget every pending click
    pub fn reset(&mut self) {
        self.pending.clear();
        self.resolved.clear();
    }
}

/// Progress of the connection tool after a pick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftStep {
    /// The pick did not fit the current step and was ignored
    Ignored,
    /// Association chosen, waiting for an entity
    AwaitingEntity,
    /// Both ends chosen
    Ready {
        association_id: String,
        entity_id: String,
    },
}

/// Two-click connection tool: association first, then entity
#[derive(Debug, Clone, Default)]
pub struct ConnectionDraft {
    association_id: Option<String>,
}

impl ConnectionDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn association_id(&self) -> Option<&str> {
        self.association_id.as_deref()
    }

    pub fn pick(&mut self, kind: NodeKind, id: &str) -> DraftStep {
        match (self.association_id.take(), kind) {
            (None, NodeKind::Association) => {
                self.association_id = Some(id.to_string());
                DraftStep::AwaitingEntity
            }
            (None, NodeKind::Entity) => DraftStep::Ignored,
            (Some(association_id), NodeKind::Entity) => DraftStep::Ready {
                association_id,
                entity_id: id.to_string(),
            },
            (Some(association_id), NodeKind::Association) => {
                self.association_id = Some(association_id);
                DraftStep::Ignored
            }
        }
    }

    /// Pick a node and create the connection once both ends are known
    ///
    /// New connections start as `1,n`. Returns the new connection id.
    pub fn pick_and_connect(
        &mut self,
        state: &mut DiagramState,
        kind: NodeKind,
        id: &str,
    ) -> Option<String> {
        match self.pick(kind, id) {
            DraftStep::Ready {
                association_id,
                entity_id,
            } => state.connect(&association_id, &entity_id, Cardinality::default()),
            _ => None,
        }
    }

    pub fn cancel(&mut self) {
        self.association_id = None;
    }
}
