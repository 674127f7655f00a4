//! # kanban-drag
//!
//! Drag-and-drop reordering engine for a kanban task board.
//!
//! Cards are picked up with a pointer or a long touch, previewed with a
//! placeholder among their new siblings, dropped into a status column and
//! then persisted to a remote document store with a partial update. The
//! document tree is headless: hosts feed input events and clock ticks into
//! a [`DragEngine`] and render the resulting [`Document`].

pub mod config;
pub mod dom;
pub mod domain;
pub mod drag;
pub mod engine;
pub mod error;
pub mod logging;
pub mod store;
pub mod sync;

// Re-export commonly used types
pub use config::{EngineConfig, StoreConfig};
pub use dom::{CardRegistry, Document, NodeId, NodeKind, Point, Rect};
pub use domain::{
    board::{Board, BoardLayout},
    task::{CardId, ColumnId, Task},
};
pub use drag::{resolve_insertion_point, PlaceholderManager, Timestamp};
pub use engine::{DragEngine, InputEvent};
pub use error::{BoardError, Result};
pub use store::RemoteStore;
pub use sync::{ColumnSynchronizer, SyncOutcome, SyncPolicy};
