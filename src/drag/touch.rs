use crate::{
    domain::CardId,
    dom::{empty_state, Document, NodeId, Point, Rect},
    drag::{
        geometry::resolve_insertion_point,
        placeholder::PlaceholderManager,
        session::{DragSession, GesturePhase, InputModel, PendingMove, Timestamp},
        DragContext,
    },
    error::{BoardError, Result},
};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_DRAG_DELAY: Duration = Duration::from_millis(200);
pub const DEFAULT_CANCEL_THRESHOLD_PX: f64 = 10.0;

/// Touch drag with a floating clone that follows the finger
///
/// A touch becomes a drag only if the finger stays within
/// `cancel_threshold` pixels until `drag_delay` has elapsed; moving further
/// first hands the gesture back to native scrolling.
#[derive(Debug, Clone, Copy)]
pub struct TouchController {
    drag_delay: Duration,
    cancel_threshold: f64,
}

impl Default for TouchController {
    fn default() -> Self {
        Self::new(DEFAULT_DRAG_DELAY, DEFAULT_CANCEL_THRESHOLD_PX)
    }
}

impl TouchController {
    pub fn new(drag_delay: Duration, cancel_threshold: f64) -> Self {
        Self {
            drag_delay,
            cancel_threshold,
        }
    }

    pub fn touch_start(
        &self,
        ctx: &mut DragContext<'_>,
        card: NodeId,
        card_id: CardId,
        at: Point,
        now: Timestamp,
    ) -> Result<()> {
        let mut session = DragSession::new(ctx.doc, card, card_id, InputModel::Touch, at)?;
        session.pending_until = Some(now.after(self.drag_delay));
        ctx.sessions.begin(session)?;
        debug!(card = %card, "touch pending");
        Ok(())
    }

    /// Fires the pending-drag timer if it is due
    pub fn tick(&self, ctx: &mut DragContext<'_>, now: Timestamp) -> Result<()> {
        let Some(session) = ctx.sessions.active_for(InputModel::Touch) else {
            return Ok(());
        };
        match session.pending_until {
            Some(deadline) if deadline <= now => {
                session.pending_until = None;
                let card = session.card;
                let grab = session.grab_offset;
                let start = session.start;

                session.phase = GesturePhase::Dragging;
                session.scroll_lock = Some(ctx.doc.lock_scroll());
                let clone = ctx.doc.show_clone(card)?;
                session.clone = Some(clone);
                follow_finger(ctx.doc, clone, start, grab)?;

                ctx.doc.visual_mut(card)?.dragging = true;
                ctx.doc.set_click_suppressed(card, true)?;
                ctx.placeholder.match_size(ctx.doc, card)?;
                debug!(card = %session.card_id, at = %now, "touch classified as drag");
                Ok(())
            }
            _ => Ok(()),
        }
    }

    pub fn touch_move(&self, ctx: &mut DragContext<'_>, at: Point) -> Result<()> {
        let Some(session) = ctx.sessions.active_for(InputModel::Touch) else {
            return Ok(());
        };

        match session.phase {
            GesturePhase::Pending => {
                if at.distance_to(session.start) > self.cancel_threshold {
                    let card = session.card;
                    ctx.sessions.end();
                    ctx.doc.set_click_suppressed(card, true)?;
                    debug!(card = %card, "touch reclassified as scroll");
                }
                Ok(())
            }
            GesturePhase::Dragging => {
                if let Some(clone) = session.clone {
                    follow_finger(ctx.doc, clone, at, session.grab_offset)?;
                }
                if let Some(column) = ctx.doc.hit_test_column(at) {
                    let before = resolve_insertion_point(ctx.doc, column, at.y, Some(session.card));
                    ctx.placeholder.place(ctx.doc, column, before)?;
                    session.hovered_column = Some(column);
                }
                Ok(())
            }
        }
    }

    /// Finishes the gesture
    ///
    /// A release while still pending is a tap and yields nothing. A release
    /// while dragging reparents the real card into the last hovered column.
    pub fn touch_end(&self, ctx: &mut DragContext<'_>, at: Point) -> Result<Option<PendingMove>> {
        if ctx.sessions.active_for(InputModel::Touch).is_none() {
            return Ok(None);
        }
        if ctx
            .sessions
            .active()
            .is_some_and(|s| s.phase == GesturePhase::Dragging)
        {
            if let Err(e) = self.touch_move(ctx, at) {
                warn!(error = %e, "failed to track the release point");
            }
        }
        let Some(session) = ctx.sessions.end() else {
            return Ok(None);
        };

        if session.phase == GesturePhase::Pending {
            debug!(card = %session.card_id, "tap");
            return Ok(None);
        }

        let target = session.hovered_column;
        let placed = target.map(|column| self.reparent(ctx, &session, column));
        teardown(ctx.doc, ctx.placeholder, &session);

        match placed.transpose()? {
            Some(pending) => {
                debug!(card = %pending.card_id, column = %pending.column, "touch drop");
                Ok(Some(pending))
            }
            None => {
                debug!(card = %session.card_id, "touch released outside any column");
                Ok(None)
            }
        }
    }

    /// Abandons the gesture, leaving the card where it was picked up
    pub fn touch_cancel(&self, ctx: &mut DragContext<'_>) {
        if ctx.sessions.active_for(InputModel::Touch).is_none() {
            if ctx.sessions.is_idle() {
                ctx.placeholder.remove(ctx.doc);
            }
            return;
        }
        if let Some(session) = ctx.sessions.end() {
            teardown(ctx.doc, ctx.placeholder, &session);
            debug!(card = %session.card_id, "touch cancelled");
        }
    }

    fn reparent(
        &self,
        ctx: &mut DragContext<'_>,
        session: &DragSession,
        column: NodeId,
    ) -> Result<PendingMove> {
        let column_id = ctx
            .doc
            .column_id(column)
            .ok_or(BoardError::NotAColumn(column.index()))?;
        let before = (ctx.placeholder.container(ctx.doc) == Some(column))
            .then(|| ctx.placeholder.node());
        ctx.doc.insert_before(column, session.card, before)?;

        Ok(PendingMove {
            card_id: session.card_id.clone(),
            column: column_id,
            origin: session.origin,
        })
    }
}

fn follow_finger(doc: &mut Document, clone: NodeId, at: Point, grab: Point) -> Result<()> {
    let rect = doc.rect(clone)?;
    let top_left = Point::new(at.x - grab.x, at.y - grab.y);
    doc.set_rect(clone, Rect::new(top_left.x, top_left.y, rect.width, rect.height))?;
    doc.visual_mut(clone)?.fixed_at = Some(top_left);
    Ok(())
}

/// Restores scroll, removes the clone and the placeholder, resets the card look
///
/// Every step runs even if an earlier one fails; a stuck scroll lock or
/// orphaned placeholder is worse than a logged error.
fn teardown(doc: &mut Document, placeholder: &PlaceholderManager, session: &DragSession) {
    if let Some(lock) = session.scroll_lock {
        doc.unlock_scroll(lock);
    }
    if session.clone.is_some() {
        if let Err(e) = doc.hide_clone() {
            warn!(error = %e, "failed to remove drag clone");
        }
    }
    if let Ok(visual) = doc.visual_mut(session.card) {
        visual.dragging = false;
    }
    placeholder.remove(doc);
    if let Err(e) = empty_state::refresh_all(doc) {
        warn!(error = %e, "failed to refresh empty columns");
    }
}
