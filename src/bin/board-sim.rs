//! Replays a scripted touch drag against a board and prints the result.
//!
//! Reads the store from `KANBAN_DRAG_CONFIG` (in-memory demo data when unset),
//! drags the first card of the first non-empty column into the next column
//! and flushes the move.

use anyhow::{bail, Context};
use kanban_drag::{
    logging, store::task_path, Board, BoardLayout, CardId, ColumnId, Document, DragEngine,
    EngineConfig, InputEvent, Point, RemoteStore, StoreConfig, Task, Timestamp,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let config = EngineConfig::from_env()
        .await
        .context("failed to load engine config")?;
    let store = config.store.build().context("failed to open store")?;

    if config.store == StoreConfig::Memory {
        let seed = [
            ("t1", Task::new("Design board", ColumnId::Todo)),
            ("t2", Task::new("Write API client", ColumnId::Todo)),
            ("t3", Task::new("Review layout", ColumnId::InProgress)),
        ];
        for (key, task) in seed {
            let id = CardId::new(key)?;
            store
                .put(&task_path(&id), &serde_json::to_value(&task)?)
                .await?;
        }
    }

    let layout = BoardLayout::default();
    let board = Board::load(store.as_ref()).await?;
    let mut doc = Document::new();
    board.render(&mut doc, &layout)?;

    let mut engine = DragEngine::new(doc, store, &config);
    engine.bind_all();

    let Some((from, task)) = ColumnId::ALL
        .iter()
        .find_map(|&c| board.tasks_in(c).first().map(|t| (c, t)))
    else {
        bail!("board has no tasks to drag");
    };
    let Some(card) = task.id.clone() else {
        bail!("task {:?} has no id", task.title);
    };
    let to = ColumnId::ALL[(from.index() + 1) % ColumnId::ALL.len()];

    let start = layout.slot_rect(from, 0);
    let grab = Point::new(start.left + 20.0, start.top + 20.0);
    let target = layout.column_rect(to);
    let release = Point::new(target.left + 20.0, target.bottom() - 20.0);
    let after_delay = config.touch_drag_delay_ms + 1;

    engine.handle(InputEvent::TouchStart { card: card.clone(), at: grab }, Timestamp::from_millis(0))?;
    engine.tick(Timestamp::from_millis(after_delay))?;
    engine.handle(InputEvent::TouchMove { at: release }, Timestamp::from_millis(after_delay + 16))?;
    engine.handle(InputEvent::TouchEnd { at: release }, Timestamp::from_millis(after_delay + 32))?;

    for outcome in engine.flush_moves().await? {
        println!("{outcome:?}");
    }

    layout.apply(engine.document_mut())?;
    let doc = engine.document();
    for column in ColumnId::ALL {
        let Some(node) = doc.column_node(column) else {
            continue;
        };
        let cards: Vec<String> = doc
            .card_children(node)?
            .into_iter()
            .filter_map(|c| doc.card_id(c).map(|id| id.to_string()))
            .collect();
        println!("{:<16} {}", column.title(), cards.join(", "));
    }

    Ok(())
}
