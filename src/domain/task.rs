use crate::error::BoardError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Identifier of a task card, as generated by the remote store (e.g. `-Nx3kQ...`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(String);

impl CardId {
    /// Creates a CardId, rejecting keys that cannot be used as a store path segment
    pub fn new(id: impl Into<String>) -> Result<Self, BoardError> {
        let id = id.into();
        if id.trim().is_empty() || id.contains('/') || id.contains('.') {
            return Err(BoardError::InvalidCardId(id));
        }
        Ok(Self(id))
    }

    /// Returns the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CardId {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status column a task lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColumnId {
    Todo,
    InProgress,
    AwaitingFeedback,
    Done,
}

impl ColumnId {
    /// All columns in board order
    pub const ALL: [ColumnId; 4] = [
        ColumnId::Todo,
        ColumnId::InProgress,
        ColumnId::AwaitingFeedback,
        ColumnId::Done,
    ];

    /// The logical name, also used as the column's DOM id and the persisted value
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "inProgress",
            Self::AwaitingFeedback => "awaitingFeedback",
            Self::Done => "done",
        }
    }

    /// Human readable heading
    pub fn title(&self) -> &'static str {
        match self {
            Self::Todo => "To do",
            Self::InProgress => "In progress",
            Self::AwaitingFeedback => "Await feedback",
            Self::Done => "Done",
        }
    }

    /// Position of the column on the board, left to right
    pub fn index(&self) -> usize {
        match self {
            Self::Todo => 0,
            Self::InProgress => 1,
            Self::AwaitingFeedback => 2,
            Self::Done => 3,
        }
    }
}

impl FromStr for ColumnId {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ColumnId::ALL
            .into_iter()
            .find(|col| col.as_str() == s)
            .ok_or_else(|| BoardError::InvalidColumnId(s.to_string()))
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Urgent,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub title: String,
    #[serde(default)]
    pub done: bool,
}

/// A task record as stored under `tasks/{id}`
///
/// The drag engine only ever writes `column`; the remaining fields are carried
/// so that a board can be loaded and rendered from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Filled from the record key when loading, never persisted inside the record
    #[serde(skip)]
    pub id: Option<CardId>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    pub column: ColumnId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assigned_to: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<Subtask>,
}

impl Task {
    /// Creates a task in the given column
    pub fn new(title: impl Into<String>, column: ColumnId) -> Self {
        Self {
            id: None,
            title: title.into(),
            description: None,
            category: None,
            priority: None,
            column,
            due_date: None,
            assigned_to: Vec::new(),
            subtasks: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: CardId) -> Self {
        self.id = Some(id);
        self
    }

    /// Partial record sent when a card changes column
    pub fn column_patch(column: ColumnId) -> serde_json::Value {
        serde_json::json!({ "column": column })
    }
}
