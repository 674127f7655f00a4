//! Drag-and-drop reordering: insertion geometry, the placeholder marker,
//! gesture sessions and the pointer and touch controllers that drive them.

pub mod desktop;
pub mod geometry;
pub mod placeholder;
pub mod session;
pub mod touch;

pub use desktop::DesktopController;
pub use geometry::resolve_insertion_point;
pub use placeholder::PlaceholderManager;
pub use session::{
    BindingRegistry, DragSession, GesturePhase, InputModel, Origin, PendingMove, SessionManager,
    Timestamp,
};
pub use touch::TouchController;

use crate::dom::Document;

/// Mutable state a controller works on while handling one event
pub struct DragContext<'a> {
    pub doc: &'a mut Document,
    pub sessions: &'a mut SessionManager,
    pub placeholder: &'a PlaceholderManager,
}
