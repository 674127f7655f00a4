use crate::{
    domain::CardId,
    dom::{empty_state, NodeId, Point},
    drag::{
        geometry::resolve_insertion_point,
        session::{DragSession, GesturePhase, InputModel, PendingMove, Timestamp},
        DragContext,
    },
    error::{BoardError, Result},
};
use tracing::{debug, warn};

/// Handles native pointer drag events on cards and columns
#[derive(Debug, Clone, Copy, Default)]
pub struct DesktopController;

impl DesktopController {
    pub fn new() -> Self {
        Self
    }

    /// Picks up a card
    ///
    /// The dragging look is applied on the next tick so the platform can
    /// snapshot its own drag image from the unstyled card first.
    pub fn drag_start(
        &self,
        ctx: &mut DragContext<'_>,
        card: NodeId,
        card_id: CardId,
        at: Point,
        now: Timestamp,
    ) -> Result<()> {
        let mut session = DragSession::new(ctx.doc, card, card_id, InputModel::Pointer, at)?;
        session.phase = GesturePhase::Dragging;
        session.visual_due = Some(now);

        ctx.sessions.begin(session)?;
        ctx.placeholder.match_size(ctx.doc, card)?;
        debug!(card = %card, "pointer drag started");
        Ok(())
    }

    /// Applies the deferred dragging look once its zero-delay timer is due
    pub fn tick(&self, ctx: &mut DragContext<'_>, now: Timestamp) -> Result<()> {
        let Some(session) = ctx.sessions.active_for(InputModel::Pointer) else {
            return Ok(());
        };
        if session.visual_due.is_some_and(|due| due <= now) {
            session.visual_due = None;
            ctx.doc.visual_mut(session.card)?.dragging = true;
        }
        Ok(())
    }

    /// Previews the insertion point inside the column under the pointer
    pub fn drag_over(&self, ctx: &mut DragContext<'_>, column: NodeId, at: Point) -> Result<()> {
        let Some(session) = ctx.sessions.active_for(InputModel::Pointer) else {
            return Ok(());
        };
        if session.dropped {
            return Ok(());
        }

        let before = resolve_insertion_point(ctx.doc, column, at.y, Some(session.card));
        ctx.placeholder.place(ctx.doc, column, before)?;
        session.hovered_column = Some(column);
        Ok(())
    }

    /// Inserts the card where the placeholder sits, or at the column's end
    pub fn drop(&self, ctx: &mut DragContext<'_>, column: NodeId) -> Result<Option<PendingMove>> {
        let Some(session) = ctx.sessions.active_for(InputModel::Pointer) else {
            return Ok(None);
        };
        if session.dropped {
            return Ok(None);
        }
        let column_id = ctx
            .doc
            .column_id(column)
            .ok_or(BoardError::NotAColumn(column.index()))?;

        let before = (ctx.placeholder.container(ctx.doc) == Some(column))
            .then(|| ctx.placeholder.node());
        ctx.doc.insert_before(column, session.card, before)?;
        ctx.placeholder.remove(ctx.doc);
        ctx.doc.visual_mut(session.card)?.dragging = false;

        session.dropped = true;
        session.visual_due = None;
        debug!(card = %session.card_id, column = %column_id, "pointer drop");

        Ok(Some(PendingMove {
            card_id: session.card_id.clone(),
            column: column_id,
            origin: session.origin,
        }))
    }

    /// Ends the gesture whether or not a drop happened
    ///
    /// A stray drag end while a touch gesture is running leaves that gesture
    /// alone; its own end or cancel restores scroll and removes the clone.
    pub fn drag_end(&self, ctx: &mut DragContext<'_>) -> Result<()> {
        if let Some(session) = ctx
            .sessions
            .active()
            .filter(|s| s.input != InputModel::Pointer)
        {
            warn!(card = %session.card_id, "ignoring drag end during a touch gesture");
            return Ok(());
        }
        if let Some(session) = ctx.sessions.end() {
            if let Ok(visual) = ctx.doc.visual_mut(session.card) {
                visual.dragging = false;
            }
            debug!(card = %session.card_id, dropped = session.dropped, "pointer drag ended");
        }
        ctx.placeholder.remove(ctx.doc);
        empty_state::refresh_all(ctx.doc)
    }
}
