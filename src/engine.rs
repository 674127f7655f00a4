use crate::{
    config::EngineConfig,
    domain::{CardId, ColumnId},
    dom::{empty_state, CardRegistry, Document, NodeId, Point},
    drag::{
        BindingRegistry, DesktopController, DragContext, InputModel, PendingMove,
        PlaceholderManager, SessionManager, Timestamp, TouchController,
    },
    error::{BoardError, Result},
    store::RemoteStore,
    sync::{ColumnSynchronizer, SyncOutcome, SyncPolicy},
};
use std::{collections::VecDeque, sync::Arc};
use tracing::{debug, info, warn};

/// Input delivered by the host's event loop
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    DragStart { card: CardId, at: Point },
    DragOver { column: ColumnId, at: Point },
    Drop { column: ColumnId, at: Point },
    DragEnd,
    TouchStart { card: CardId, at: Point },
    TouchMove { at: Point },
    TouchEnd { at: Point },
    TouchCancel,
    /// Document-level mouseup/touchend that reached no card
    PointerUp,
    WindowBlur,
}

/// Drag-and-drop engine for one board
///
/// Owns the document tree and all gesture state. Event handlers mutate the
/// tree synchronously; completed drops queue up and are persisted by
/// [`DragEngine::flush_moves`].
pub struct DragEngine {
    doc: Document,
    sessions: SessionManager,
    placeholder: PlaceholderManager,
    bindings: BindingRegistry,
    desktop: DesktopController,
    touch: TouchController,
    synchronizer: ColumnSynchronizer,
    pending: VecDeque<PendingMove>,
}

impl DragEngine {
    pub fn new(mut doc: Document, store: Arc<dyn RemoteStore>, config: &EngineConfig) -> Self {
        let placeholder = PlaceholderManager::new(&mut doc);
        Self {
            doc,
            sessions: SessionManager::new(),
            placeholder,
            bindings: BindingRegistry::new(),
            desktop: DesktopController::new(),
            touch: config.touch_controller(),
            synchronizer: ColumnSynchronizer::new(store, config.sync_policy),
            pending: VecDeque::new(),
        }
    }

    /// Builds the engine with the store described by the config
    pub fn from_config(doc: Document, config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        let store = config.store.build()?;
        Ok(Self::new(doc, store, config))
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Host access for layout updates; do not reparent cards mid-gesture
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn placeholder(&self) -> &PlaceholderManager {
        &self.placeholder
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn sync_policy(&self) -> SyncPolicy {
        self.synchronizer.policy()
    }

    pub fn pending_moves(&self) -> impl Iterator<Item = &PendingMove> {
        self.pending.iter()
    }

    /// Attaches gesture handling to a card; returns `false` if it already was
    pub fn bind_card(&mut self, id: &CardId) -> Result<bool> {
        if self.doc.element_for_id(id).is_none() {
            return Err(BoardError::CardNotFound(id.to_string()));
        }
        Ok(self.bindings.bind(id))
    }

    /// Binds every card currently in the document
    pub fn bind_all(&mut self) -> usize {
        let ids: Vec<CardId> = self
            .doc
            .columns()
            .into_iter()
            .flat_map(|column| self.doc.card_children(column).unwrap_or_default())
            .filter_map(|card| self.doc.card_id(card))
            .collect();
        ids.iter().filter(|id| self.bindings.bind(id)).count()
    }

    pub fn unbind_card(&mut self, id: &CardId) -> bool {
        self.bindings.unbind(id)
    }

    pub fn is_bound(&self, id: &CardId) -> bool {
        self.bindings.is_bound(id)
    }

    /// Consumed by the host's "open task details" click handler
    pub fn take_click_suppressed(&mut self, id: &CardId) -> bool {
        match self.doc.element_for_id(id) {
            Some(card) => self.doc.take_click_suppressed(card),
            None => false,
        }
    }

    fn ctx(&mut self) -> DragContext<'_> {
        DragContext {
            doc: &mut self.doc,
            sessions: &mut self.sessions,
            placeholder: &self.placeholder,
        }
    }

    /// Fires timers that are due at `now`
    pub fn tick(&mut self, now: Timestamp) -> Result<()> {
        let (desktop, touch) = (self.desktop, self.touch);
        let mut ctx = self.ctx();
        desktop.tick(&mut ctx, now)?;
        touch.tick(&mut ctx, now)
    }

    /// Dispatches one input event
    ///
    /// Timers due at or before `now` fire first, as they would have in the
    /// event loop.
    pub fn handle(&mut self, event: InputEvent, now: Timestamp) -> Result<()> {
        self.tick(now)?;
        let (desktop, touch) = (self.desktop, self.touch);

        match event {
            InputEvent::DragStart { card, at } => {
                let Some(node) = self.bound_card(&card) else {
                    return Ok(());
                };
                desktop.drag_start(&mut self.ctx(), node, card, at, now)
            }
            InputEvent::DragOver { column, at } => {
                let node = self.column_node(column)?;
                desktop.drag_over(&mut self.ctx(), node, at)
            }
            InputEvent::Drop { column, at } => {
                let node = self.column_node(column)?;
                desktop.drag_over(&mut self.ctx(), node, at)?;
                let dropped = desktop.drop(&mut self.ctx(), node)?;
                self.enqueue(dropped);
                Ok(())
            }
            InputEvent::DragEnd => desktop.drag_end(&mut self.ctx()),
            InputEvent::TouchStart { card, at } => {
                let Some(node) = self.bound_card(&card) else {
                    return Ok(());
                };
                touch.touch_start(&mut self.ctx(), node, card, at, now)
            }
            InputEvent::TouchMove { at } => touch.touch_move(&mut self.ctx(), at),
            InputEvent::TouchEnd { at } => {
                let dropped = touch.touch_end(&mut self.ctx(), at)?;
                self.enqueue(dropped);
                Ok(())
            }
            InputEvent::TouchCancel => {
                touch.touch_cancel(&mut self.ctx());
                Ok(())
            }
            InputEvent::PointerUp => self.safety_net(false),
            InputEvent::WindowBlur => self.safety_net(true),
        }
    }

    /// Clears transient state left behind by a gesture that lost its end event
    ///
    /// A global pointer-up only sweeps an orphaned placeholder; a window blur
    /// abandons whatever gesture is in flight.
    fn safety_net(&mut self, abandon: bool) -> Result<()> {
        let (desktop, touch) = (self.desktop, self.touch);
        let input = self.sessions.active().map(|s| s.input);
        match input {
            Some(InputModel::Touch) if abandon => {
                touch.touch_cancel(&mut self.ctx());
                Ok(())
            }
            Some(InputModel::Pointer) if abandon => desktop.drag_end(&mut self.ctx()),
            Some(_) => Ok(()),
            None => {
                self.placeholder.remove(&mut self.doc);
                empty_state::refresh_all(&mut self.doc)
            }
        }
    }

    fn bound_card(&self, id: &CardId) -> Option<NodeId> {
        if !self.bindings.is_bound(id) {
            debug!(card = %id, "ignoring gesture on unbound card");
            return None;
        }
        self.doc.element_for_id(id)
    }

    fn column_node(&self, column: ColumnId) -> Result<NodeId> {
        self.doc
            .column_node(column)
            .ok_or_else(|| BoardError::InvalidColumnId(column.to_string()))
    }

    fn enqueue(&mut self, dropped: Option<PendingMove>) {
        if let Some(pending) = dropped {
            debug!(card = %pending.card_id, column = %pending.column, "move queued");
            self.pending.push_back(pending);
        }
    }

    /// Persists queued drops in order
    ///
    /// Stops at the first move the document cannot take. That move goes back
    /// to the front of the queue together with the ones behind it; moves
    /// before it are already applied.
    pub async fn flush_moves(&mut self) -> Result<Vec<SyncOutcome>> {
        let mut outcomes = Vec::with_capacity(self.pending.len());
        while let Some(pending) = self.pending.pop_front() {
            match self.synchronizer.apply(&mut self.doc, &pending).await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    warn!(
                        card = %pending.card_id,
                        applied = outcomes.len(),
                        error = %e,
                        "flush stopped; move requeued"
                    );
                    self.pending.push_front(pending);
                    return Err(e);
                }
            }
        }
        if !outcomes.is_empty() {
            info!(count = outcomes.len(), "card moves synchronized");
        }
        Ok(outcomes)
    }

    /// Moves a card outside of any gesture (e.g. from a "move to" menu)
    pub async fn move_card(&mut self, id: &CardId, column: ColumnId) -> Result<SyncOutcome> {
        if !self.sessions.is_idle() {
            return Err(BoardError::SessionActive);
        }
        self.synchronizer.move_card(&mut self.doc, id, column).await
    }
}
