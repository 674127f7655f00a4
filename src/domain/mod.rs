pub mod board;
pub mod task;

pub use board::{Board, BoardLayout};
pub use task::{CardId, ColumnId, Priority, Subtask, Task};
