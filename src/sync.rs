use crate::{
    domain::{CardId, ColumnId, Task},
    dom::{empty_state, CardRegistry, Document},
    drag::{Origin, PendingMove},
    error::{BoardError, Result},
    store::{task_path, RemoteStore},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// What to do with the board when the remote update fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncPolicy {
    /// Keep the dropped position; the store catches up on the next reload
    #[default]
    Optimistic,
    /// Put the card back where the gesture picked it up
    Rollback,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    Persisted {
        card_id: CardId,
        column: ColumnId,
    },
    /// The store rejected the update; the board keeps the drop
    Failed {
        card_id: CardId,
        column: ColumnId,
        error: String,
    },
    /// The store rejected the update and the card was moved back
    RolledBack {
        card_id: CardId,
        error: String,
    },
}

impl SyncOutcome {
    pub fn is_persisted(&self) -> bool {
        matches!(self, Self::Persisted { .. })
    }
}

/// Reconciles a card's column in the store and in the document tree
#[derive(Clone)]
pub struct ColumnSynchronizer {
    store: Arc<dyn RemoteStore>,
    policy: SyncPolicy,
}

impl ColumnSynchronizer {
    pub fn new(store: Arc<dyn RemoteStore>, policy: SyncPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> SyncPolicy {
        self.policy
    }

    /// Moves a card to `column`: remote update first, then tree membership,
    /// then the empty indicators of every column
    ///
    /// Store failures are logged and reported in the outcome rather than
    /// returned as errors. `Err` means the document itself was inconsistent.
    pub async fn move_card(
        &self,
        doc: &mut Document,
        card_id: &CardId,
        column: ColumnId,
    ) -> Result<SyncOutcome> {
        self.reconcile(doc, card_id, column, None).await
    }

    /// Persists a drop recorded by a gesture controller
    pub async fn apply(&self, doc: &mut Document, pending: &PendingMove) -> Result<SyncOutcome> {
        self.reconcile(doc, &pending.card_id, pending.column, Some(pending.origin))
            .await
    }

    async fn reconcile(
        &self,
        doc: &mut Document,
        card_id: &CardId,
        column: ColumnId,
        origin: Option<Origin>,
    ) -> Result<SyncOutcome> {
        let path = task_path(card_id);
        let result = self.store.patch(&path, &Task::column_patch(column)).await;

        let outcome = match result {
            Ok(_) => {
                info!(card = %card_id, column = %column, "card moved");
                self.place(doc, card_id, column)?;
                SyncOutcome::Persisted {
                    card_id: card_id.clone(),
                    column,
                }
            }
            Err(e) => {
                warn!(card = %card_id, column = %column, error = %e, "failed to persist card move");
                match (self.policy, origin) {
                    (SyncPolicy::Rollback, Some(origin)) => {
                        if let Some(card) = doc.element_for_id(card_id) {
                            origin.restore(doc, card)?;
                        }
                        SyncOutcome::RolledBack {
                            card_id: card_id.clone(),
                            error: e.to_string(),
                        }
                    }
                    _ => {
                        self.place(doc, card_id, column)?;
                        SyncOutcome::Failed {
                            card_id: card_id.clone(),
                            column,
                            error: e.to_string(),
                        }
                    }
                }
            }
        };

        empty_state::refresh_all(doc)?;
        Ok(outcome)
    }

    /// Makes the card a child of the column unless it already is
    fn place(&self, doc: &mut Document, card_id: &CardId, column: ColumnId) -> Result<()> {
        let Some(card) = doc.element_for_id(card_id) else {
            warn!(card = %card_id, "moved card is not on the board");
            return Ok(());
        };
        let target = doc
            .column_node(column)
            .ok_or_else(|| BoardError::InvalidColumnId(column.to_string()))?;

        if doc.parent(card)? != Some(target) {
            doc.append_child(target, card)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dom::{empty_state::is_showing_empty, NodeId, Rect},
        store::{MemoryStore, StoreCall},
    };
    use serde_json::json;

    fn board() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let todo = doc.add_column(ColumnId::Todo, Rect::default()).unwrap();
        let done = doc.add_column(ColumnId::Done, Rect::default()).unwrap();
        let card = doc
            .insert_card(todo, &CardId::new("a").unwrap(), Rect::default())
            .unwrap();
        empty_state::refresh_all(&mut doc).unwrap();
        (doc, todo, done, card)
    }

    #[tokio::test]
    async fn test_move_card_patches_then_reparents() {
        let (mut doc, todo, done, card) = board();
        let store = Arc::new(MemoryStore::new());
        let sync = ColumnSynchronizer::new(store.clone(), SyncPolicy::Optimistic);

        let outcome = sync
            .move_card(&mut doc, &CardId::new("a").unwrap(), ColumnId::Done)
            .await
            .unwrap();

        assert!(outcome.is_persisted());
        assert_eq!(
            store.writes(),
            vec![StoreCall::Patch("tasks/a".to_string(), json!({ "column": "done" }))]
        );
        assert_eq!(doc.column_of(card), Some(done));
        assert!(is_showing_empty(&doc, todo));
        assert!(!is_showing_empty(&doc, done));
    }

    #[tokio::test]
    async fn test_failure_keeps_optimistic_position() {
        let (mut doc, todo, done, card) = board();
        let store = Arc::new(MemoryStore::new());
        store.set_fail_writes(true);
        let sync = ColumnSynchronizer::new(store.clone(), SyncPolicy::Optimistic);

        // Drop already moved the card
        doc.append_child(done, card).unwrap();
        let pending = PendingMove {
            card_id: CardId::new("a").unwrap(),
            column: ColumnId::Done,
            origin: Origin {
                column: todo,
                next_sibling: None,
            },
        };
        let outcome = sync.apply(&mut doc, &pending).await.unwrap();

        assert!(matches!(outcome, SyncOutcome::Failed { .. }));
        assert_eq!(doc.column_of(card), Some(done));
        assert!(is_showing_empty(&doc, todo));
    }

    #[tokio::test]
    async fn test_failure_rolls_back_when_configured() {
        let (mut doc, todo, done, card) = board();
        let store = Arc::new(MemoryStore::new());
        store.set_fail_writes(true);
        let sync = ColumnSynchronizer::new(store.clone(), SyncPolicy::Rollback);

        doc.append_child(done, card).unwrap();
        let pending = PendingMove {
            card_id: CardId::new("a").unwrap(),
            column: ColumnId::Done,
            origin: Origin {
                column: todo,
                next_sibling: None,
            },
        };
        let outcome = sync.apply(&mut doc, &pending).await.unwrap();

        assert!(matches!(outcome, SyncOutcome::RolledBack { .. }));
        assert_eq!(doc.column_of(card), Some(todo));
        assert!(is_showing_empty(&doc, done));
        assert!(!is_showing_empty(&doc, todo));
    }

    #[tokio::test]
    async fn test_unknown_card_is_ignored() {
        let (mut doc, _, _, _) = board();
        let store = Arc::new(MemoryStore::new());
        let sync = ColumnSynchronizer::new(store.clone(), SyncPolicy::Optimistic);

        let outcome = sync
            .move_card(&mut doc, &CardId::new("ghost").unwrap(), ColumnId::Done)
            .await
            .unwrap();

        assert!(outcome.is_persisted());
        assert_eq!(store.writes().len(), 1);
    }
}
