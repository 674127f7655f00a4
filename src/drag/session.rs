use crate::{
    domain::{CardId, ColumnId},
    dom::{Document, NodeId, Point, ScrollLock},
    error::{BoardError, Result},
};
use std::{collections::HashSet, fmt, time::Duration};

/// Event-loop time in milliseconds, supplied by the host with every event
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    pub fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }

    pub fn after(&self, delay: Duration) -> Self {
        let delay = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        Self(self.0.saturating_add(delay))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputModel {
    Pointer,
    Touch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    /// Touch is down but not yet classified as a drag
    Pending,
    Dragging,
}

/// Where a card sat before the gesture picked it up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Origin {
    pub column: NodeId,
    pub next_sibling: Option<NodeId>,
}

impl Origin {
    pub fn of(doc: &Document, card: NodeId) -> Result<Self> {
        let column = doc.column_of(card).ok_or(BoardError::NotAColumn(card.index()))?;
        let next_sibling = doc.next_sibling(card)?;
        Ok(Self {
            column,
            next_sibling,
        })
    }

    /// Puts the card back where it was picked up
    ///
    /// If the old next sibling has moved away in the meantime, the card goes
    /// to the end of its origin column.
    pub fn restore(&self, doc: &mut Document, card: NodeId) -> Result<()> {
        let before = self
            .next_sibling
            .filter(|&s| s != card && doc.parent(s).ok().flatten() == Some(self.column));
        doc.insert_before(self.column, card, before)
    }
}

/// State of one gesture, from pick-up to release or cancel
#[derive(Debug, Clone)]
pub struct DragSession {
    pub card: NodeId,
    pub card_id: CardId,
    pub input: InputModel,
    pub phase: GesturePhase,
    pub origin: Origin,
    /// Column currently hosting the placeholder
    pub hovered_column: Option<NodeId>,
    pub start: Point,
    /// Finger offset from the card's top-left corner at pick-up
    pub grab_offset: Point,
    pub clone: Option<NodeId>,
    /// Deadline of the "is this a drag" timer (touch only)
    pub pending_until: Option<Timestamp>,
    /// Deadline of the deferred drag visual (pointer only)
    pub visual_due: Option<Timestamp>,
    pub scroll_lock: Option<ScrollLock>,
    pub dropped: bool,
}

impl DragSession {
    pub fn new(
        doc: &Document,
        card: NodeId,
        card_id: CardId,
        input: InputModel,
        start: Point,
    ) -> Result<Self> {
        let origin = Origin::of(doc, card)?;
        let rect = doc.rect(card)?;
        Ok(Self {
            card,
            card_id,
            input,
            phase: GesturePhase::Pending,
            origin,
            hovered_column: None,
            start,
            grab_offset: Point::new(start.x - rect.left, start.y - rect.top),
            clone: None,
            pending_until: None,
            visual_due: None,
            scroll_lock: None,
            dropped: false,
        })
    }

    pub fn is_dragging(&self) -> bool {
        self.phase == GesturePhase::Dragging
    }
}

#[derive(Debug, Default)]
enum SessionState {
    #[default]
    Idle,
    Active(DragSession),
}

/// Holds the one drag session that may exist at a time
#[derive(Debug, Default)]
pub struct SessionManager {
    state: SessionState,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, SessionState::Idle)
    }

    /// Starts a session; fails if another gesture is still in flight
    pub fn begin(&mut self, session: DragSession) -> Result<&mut DragSession> {
        if !self.is_idle() {
            return Err(BoardError::SessionActive);
        }
        self.state = SessionState::Active(session);
        match &mut self.state {
            SessionState::Active(session) => Ok(session),
            SessionState::Idle => Err(BoardError::SessionActive),
        }
    }

    pub fn active(&self) -> Option<&DragSession> {
        match &self.state {
            SessionState::Active(session) => Some(session),
            SessionState::Idle => None,
        }
    }

    pub fn active_mut(&mut self) -> Option<&mut DragSession> {
        match &mut self.state {
            SessionState::Active(session) => Some(session),
            SessionState::Idle => None,
        }
    }

    /// Active session for a given input model
    pub fn active_for(&mut self, input: InputModel) -> Option<&mut DragSession> {
        self.active_mut().filter(|s| s.input == input)
    }

    /// Ends the session and hands back its state for cleanup
    pub fn end(&mut self) -> Option<DragSession> {
        match std::mem::take(&mut self.state) {
            SessionState::Active(session) => Some(session),
            SessionState::Idle => None,
        }
    }
}

/// Cards that have had gesture handlers attached
#[derive(Debug, Default)]
pub struct BindingRegistry {
    bound: HashSet<CardId>,
}

impl BindingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the card was not bound before
    pub fn bind(&mut self, id: &CardId) -> bool {
        self.bound.insert(id.clone())
    }

    pub fn unbind(&mut self, id: &CardId) -> bool {
        self.bound.remove(id)
    }

    pub fn is_bound(&self, id: &CardId) -> bool {
        self.bound.contains(id)
    }

    pub fn len(&self) -> usize {
        self.bound.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }
}

/// A completed drop waiting to be persisted
#[derive(Debug, Clone, PartialEq)]
pub struct PendingMove {
    pub card_id: CardId,
    pub column: ColumnId,
    pub origin: Origin,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Rect;

    fn doc_with_card() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let todo = doc.add_column(ColumnId::Todo, Rect::default()).unwrap();
        let a = doc
            .insert_card(todo, &CardId::new("a").unwrap(), Rect::new(10.0, 100.0, 200.0, 80.0))
            .unwrap();
        let b = doc
            .insert_card(todo, &CardId::new("b").unwrap(), Rect::default())
            .unwrap();
        (doc, todo, a, b)
    }

    #[test]
    fn test_timestamp_after() {
        let t = Timestamp::from_millis(1_000);
        assert_eq!(t.after(Duration::from_millis(200)).as_millis(), 1_200);
    }

    #[test]
    fn test_only_one_session() {
        let (doc, _, a, b) = doc_with_card();
        let mut sessions = SessionManager::new();

        let first = DragSession::new(&doc, a, CardId::new("a").unwrap(), InputModel::Touch, Point::default());
        sessions.begin(first.unwrap()).unwrap();

        let second = DragSession::new(&doc, b, CardId::new("b").unwrap(), InputModel::Pointer, Point::default());
        assert!(matches!(
            sessions.begin(second.unwrap()),
            Err(BoardError::SessionActive)
        ));

        assert!(sessions.active_for(InputModel::Pointer).is_none());
        assert!(sessions.active_for(InputModel::Touch).is_some());
        assert_eq!(sessions.end().map(|s| s.card), Some(a));
        assert!(sessions.is_idle());
        assert!(sessions.end().is_none());
    }

    #[test]
    fn test_grab_offset() {
        let (doc, _, a, _) = doc_with_card();
        let session = DragSession::new(
            &doc,
            a,
            CardId::new("a").unwrap(),
            InputModel::Touch,
            Point::new(30.0, 130.0),
        )
        .unwrap();

        assert_eq!(session.grab_offset, Point::new(20.0, 30.0));
        assert_eq!(session.phase, GesturePhase::Pending);
    }

    #[test]
    fn test_origin_restore() {
        let (mut doc, todo, a, b) = doc_with_card();
        let origin = Origin::of(&doc, a).unwrap();
        assert_eq!(origin.next_sibling, Some(b));

        doc.append_child(todo, a).unwrap();
        origin.restore(&mut doc, a).unwrap();

        assert_eq!(doc.card_children(todo).unwrap(), vec![a, b]);
    }

    #[test]
    fn test_binding_registry() {
        let mut bindings = BindingRegistry::new();
        let id = CardId::new("a").unwrap();

        assert!(bindings.bind(&id));
        assert!(!bindings.bind(&id));
        assert!(bindings.is_bound(&id));
        assert_eq!(bindings.len(), 1);

        assert!(bindings.unbind(&id));
        assert!(bindings.is_empty());
    }
}
