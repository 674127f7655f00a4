use crate::{
    domain::task::{CardId, ColumnId, Task},
    dom::{empty_state, Document, NodeKind, Rect},
    error::Result,
    store::{RemoteStore, TASKS_PATH},
};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

/// Pixel geometry used to lay the board out headlessly
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoardLayout {
    pub column_width: f64,
    pub column_gap: f64,
    pub column_height: f64,
    pub header_height: f64,
    pub card_height: f64,
    pub card_gap: f64,
}

impl Default for BoardLayout {
    fn default() -> Self {
        Self {
            column_width: 250.0,
            column_gap: 24.0,
            column_height: 800.0,
            header_height: 48.0,
            card_height: 90.0,
            card_gap: 12.0,
        }
    }
}

impl BoardLayout {
    pub fn column_rect(&self, column: ColumnId) -> Rect {
        let left = column.index() as f64 * (self.column_width + self.column_gap);
        Rect::new(left, 0.0, self.column_width, self.column_height)
    }

    /// Box of the `row`-th stacked item in a column
    pub fn slot_rect(&self, column: ColumnId, row: usize) -> Rect {
        let col = self.column_rect(column);
        let top = col.top + self.header_height + row as f64 * (self.card_height + self.card_gap);
        Rect::new(col.left, top, self.column_width, self.card_height)
    }

    /// Adds any missing column containers
    pub fn mount(&self, doc: &mut Document) -> Result<()> {
        for column in ColumnId::ALL {
            if doc.column_node(column).is_none() {
                doc.add_column(column, self.column_rect(column))?;
            }
        }
        Ok(())
    }

    /// Restacks cards and the placeholder in every column, top to bottom
    pub fn apply(&self, doc: &mut Document) -> Result<()> {
        for node in doc.columns() {
            let Some(column) = doc.column_id(node) else {
                continue;
            };
            let stacked: Vec<_> = doc
                .children(node)?
                .iter()
                .copied()
                .filter(|&c| matches!(doc.kind(c), Ok(NodeKind::Card | NodeKind::Placeholder)))
                .collect();
            for (row, child) in stacked.into_iter().enumerate() {
                doc.set_rect(child, self.slot_rect(column, row))?;
            }
        }
        Ok(())
    }
}

/// Tasks grouped by column, as loaded from the store
#[derive(Debug, Default)]
pub struct Board {
    columns: BTreeMap<ColumnId, Vec<Task>>,
}

impl Board {
    /// Builds a board from the `tasks` collection (record key -> record)
    ///
    /// Records that fail to parse are skipped with a warning. Within a column
    /// tasks are ordered by key; generated keys sort chronologically.
    pub fn from_records(records: &Value) -> Self {
        let mut board = Self::default();
        let Some(records) = records.as_object() else {
            return board;
        };

        for (key, record) in records {
            let id = match CardId::new(key.as_str()) {
                Ok(id) => id,
                Err(e) => {
                    warn!(key = %key, error = %e, "skipping task with unusable key");
                    continue;
                }
            };
            match serde_json::from_value::<Task>(record.clone()) {
                Ok(task) => board.add_task(task.with_id(id)),
                Err(e) => warn!(key = %key, error = %e, "skipping malformed task"),
            }
        }

        for tasks in board.columns.values_mut() {
            tasks.sort_by(|a, b| a.id.cmp(&b.id));
        }
        board
    }

    /// Fetches every task from the store
    pub async fn load(store: &dyn RemoteStore) -> Result<Self> {
        let records = store.get(TASKS_PATH).await?.unwrap_or(Value::Null);
        Ok(Self::from_records(&records))
    }

    pub fn add_task(&mut self, task: Task) {
        self.columns.entry(task.column).or_default().push(task);
    }

    pub fn tasks_in(&self, column: ColumnId) -> &[Task] {
        self.columns.get(&column).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.columns.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Creates columns and one card per task, laid out and with empty
    /// indicators up to date
    pub fn render(&self, doc: &mut Document, layout: &BoardLayout) -> Result<()> {
        layout.mount(doc)?;
        for column in ColumnId::ALL {
            let Some(node) = doc.column_node(column) else {
                continue;
            };
            for task in self.tasks_in(column) {
                if let Some(id) = &task.id {
                    doc.insert_card(node, id, Rect::default())?;
                }
            }
        }
        layout.apply(doc)?;
        empty_state::refresh_all(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dom::empty_state::is_showing_empty, store::MemoryStore};
    use serde_json::json;

    fn records() -> Value {
        json!({
            "k2": { "title": "Second", "column": "todo" },
            "k1": { "title": "First", "column": "todo" },
            "k3": { "title": "Review", "column": "awaitingFeedback" },
            "bad": { "title": "No column" }
        })
    }

    #[test]
    fn test_from_records_groups_and_orders() {
        let board = Board::from_records(&records());

        assert_eq!(board.len(), 3);
        let todo: Vec<_> = board.tasks_in(ColumnId::Todo).iter().map(|t| t.title.as_str()).collect();
        assert_eq!(todo, vec!["First", "Second"]);
        assert_eq!(board.tasks_in(ColumnId::AwaitingFeedback).len(), 1);
        assert!(board.tasks_in(ColumnId::Done).is_empty());
    }

    #[test]
    fn test_from_records_non_object() {
        assert!(Board::from_records(&Value::Null).is_empty());
    }

    #[tokio::test]
    async fn test_load_from_store() {
        let store = MemoryStore::with_root(json!({ "tasks": records() }));
        let board = Board::load(&store).await.unwrap();
        assert_eq!(board.len(), 3);

        let empty = MemoryStore::new();
        assert!(Board::load(&empty).await.unwrap().is_empty());
    }

    #[test]
    fn test_render() {
        let board = Board::from_records(&records());
        let layout = BoardLayout::default();
        let mut doc = Document::new();

        board.render(&mut doc, &layout).unwrap();

        let todo = doc.column_node(ColumnId::Todo).unwrap();
        let cards = doc.card_children(todo).unwrap();
        assert_eq!(cards.len(), 2);
        assert_eq!(doc.card_id(cards[0]).unwrap().as_str(), "k1");
        assert_eq!(doc.rect(cards[1]).unwrap(), layout.slot_rect(ColumnId::Todo, 1));
        assert!(is_showing_empty(&doc, doc.column_node(ColumnId::Done).unwrap()));
        assert!(!is_showing_empty(&doc, todo));
    }

    #[test]
    fn test_column_rects_do_not_overlap() {
        let layout = BoardLayout::default();
        for pair in ColumnId::ALL.windows(2) {
            assert!(layout.column_rect(pair[0]).right() < layout.column_rect(pair[1]).left);
        }
    }
}
