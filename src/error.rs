use thiserror::Error;

pub type Result<T> = std::result::Result<T, BoardError>;

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("Card not found: {0}")]
    CardNotFound(String),

    #[error("Node not found: {0}")]
    NodeNotFound(usize),

    #[error("Node {child} is not a child of node {parent}")]
    NotAChild { parent: usize, child: usize },

    #[error("Node {0} is not a card")]
    NotACard(usize),

    #[error("Node {0} is not a column")]
    NotAColumn(usize),

    #[error("Invalid card ID: {0:?}")]
    InvalidCardId(String),

    #[error("Invalid column ID: {0}")]
    InvalidColumnId(String),

    #[error("Card {0} already exists on the board")]
    DuplicateCard(String),

    #[error("Column {0} already exists on the board")]
    DuplicateColumn(String),

    #[error("A drag session is already active")]
    SessionActive,

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}
