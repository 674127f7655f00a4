pub mod empty_state;
pub mod tree;

pub use tree::{Document, NodeId, NodeKind, Point, Rect, ScrollLock, ScrollState, VisualState};

use crate::domain::CardId;

/// Reverse lookup from a task key to the card element rendered for it
pub trait CardRegistry {
    /// Returns the card whose DOM id equals the task's record key
    fn element_for_id(&self, id: &CardId) -> Option<NodeId>;
}

impl CardRegistry for Document {
    fn element_for_id(&self, id: &CardId) -> Option<NodeId> {
        self.find_card(id)
    }
}
