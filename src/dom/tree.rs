use crate::{
    domain::{CardId, ColumnId},
    error::{BoardError, Result},
};
use std::fmt;

/// Handle to a node in the [`Document`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Bounding box in viewport coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn origin(&self) -> Point {
        Point::new(self.left, self.top)
    }

    /// Edges inclusive, so adjacent columns both claim their shared border
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left
            && point.x <= self.right()
            && point.y >= self.top
            && point.y <= self.bottom()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Body,
    Column,
    Card,
    Placeholder,
    DragClone,
    EmptyIndicator,
}

/// Presentation flags the host maps onto its own styling
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisualState {
    /// Rotated, scaled and translucent "being dragged" look
    pub dragging: bool,
    pub hidden: bool,
    /// Pinned with `position: fixed` at this viewport position
    pub fixed_at: Option<Point>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollState {
    pub offset: f64,
    pub pinned_at: Option<f64>,
}

/// Token returned by [`Document::lock_scroll`], needed to release the lock
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollLock {
    offset: f64,
}

impl ScrollLock {
    pub fn offset(&self) -> f64 {
        self.offset
    }
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    dom_id: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    rect: Rect,
    visual: VisualState,
    click_suppressed: bool,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            dom_id: None,
            parent: None,
            children: Vec::new(),
            rect: Rect::default(),
            visual: VisualState::default(),
            click_suppressed: false,
        }
    }
}

/// Headless document tree holding the board's columns and cards
///
/// Nodes live in an arena; destroyed nodes leave a tombstone so that stale
/// handles fail with [`BoardError::NodeNotFound`] instead of aliasing.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Option<Node>>,
    body: NodeId,
    drag_clone: Option<NodeId>,
    scroll: ScrollState,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![Some(Node::new(NodeKind::Body))],
            body: NodeId(0),
            drag_clone: None,
            scroll: ScrollState::default(),
        }
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or(BoardError::NodeNotFound(id.0))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(BoardError::NodeNotFound(id.0))
    }

    /// Creates a detached node
    pub fn create_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(Node::new(kind)));
        id
    }

    /// Adds a column container with its empty-state indicator
    pub fn add_column(&mut self, column: ColumnId, rect: Rect) -> Result<NodeId> {
        if self.column_node(column).is_some() {
            return Err(BoardError::DuplicateColumn(column.to_string()));
        }

        let node = self.create_node(NodeKind::Column);
        {
            let n = self.node_mut(node)?;
            n.dom_id = Some(column.as_str().to_string());
            n.rect = rect;
        }
        self.append_child(self.body, node)?;

        let indicator = self.create_node(NodeKind::EmptyIndicator);
        self.append_child(node, indicator)?;
        Ok(node)
    }

    /// Adds a card as the last child of a column
    pub fn insert_card(&mut self, column: NodeId, id: &CardId, rect: Rect) -> Result<NodeId> {
        self.expect_kind(column, NodeKind::Column)?;
        if self.find_card(id).is_some() {
            return Err(BoardError::DuplicateCard(id.to_string()));
        }

        let node = self.create_node(NodeKind::Card);
        {
            let n = self.node_mut(node)?;
            n.dom_id = Some(id.as_str().to_string());
            n.rect = rect;
        }
        self.append_child(column, node)?;
        Ok(node)
    }

    /// Shows a fixed-position visual copy of a card, attached to the body
    ///
    /// The document keeps a single clone node and reuses it for every drag.
    /// The copy carries no DOM id so registry lookups keep resolving to the
    /// real card.
    pub fn show_clone(&mut self, card: NodeId) -> Result<NodeId> {
        self.expect_kind(card, NodeKind::Card)?;
        let rect = self.rect(card)?;

        let clone = match self.drag_clone.filter(|&c| self.exists(c)) {
            Some(clone) => clone,
            None => {
                let clone = self.create_node(NodeKind::DragClone);
                self.drag_clone = Some(clone);
                clone
            }
        };
        {
            let n = self.node_mut(clone)?;
            n.rect = rect;
            n.visual = VisualState {
                dragging: true,
                hidden: false,
                fixed_at: Some(rect.origin()),
            };
        }
        self.append_child(self.body, clone)?;
        Ok(clone)
    }

    /// Takes the clone off screen; no-op if it is not showing
    pub fn hide_clone(&mut self) -> Result<()> {
        let Some(clone) = self.drag_clone.filter(|&c| self.exists(c)) else {
            return Ok(());
        };
        self.detach(clone)?;
        self.node_mut(clone)?.visual = VisualState::default();
        Ok(())
    }

    /// Detaches a node and frees its slot together with its subtree
    pub fn destroy(&mut self, id: NodeId) -> Result<()> {
        self.detach(id)?;
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(next.0).and_then(Option::take) {
                stack.extend(node.children);
            }
        }
        Ok(())
    }

    pub fn exists(&self, id: NodeId) -> bool {
        self.node(id).is_ok()
    }

    pub fn kind(&self, id: NodeId) -> Result<NodeKind> {
        Ok(self.node(id)?.kind)
    }

    pub fn dom_id(&self, id: NodeId) -> Result<Option<&str>> {
        Ok(self.node(id)?.dom_id.as_deref())
    }

    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.node(id)?.parent)
    }

    pub fn children(&self, id: NodeId) -> Result<&[NodeId]> {
        Ok(&self.node(id)?.children)
    }

    /// Sibling immediately after `id` in its parent, if any
    pub fn next_sibling(&self, id: NodeId) -> Result<Option<NodeId>> {
        let Some(parent) = self.parent(id)? else {
            return Ok(None);
        };
        let siblings = self.children(parent)?;
        let pos = siblings.iter().position(|&c| c == id);
        Ok(pos.and_then(|p| siblings.get(p + 1).copied()))
    }

    pub fn rect(&self, id: NodeId) -> Result<Rect> {
        Ok(self.node(id)?.rect)
    }

    pub fn set_rect(&mut self, id: NodeId, rect: Rect) -> Result<()> {
        self.node_mut(id)?.rect = rect;
        Ok(())
    }

    pub fn visual(&self, id: NodeId) -> Result<&VisualState> {
        Ok(&self.node(id)?.visual)
    }

    pub fn visual_mut(&mut self, id: NodeId) -> Result<&mut VisualState> {
        Ok(&mut self.node_mut(id)?.visual)
    }

    /// Removes a node from its parent; no-op if already detached
    pub fn detach(&mut self, id: NodeId) -> Result<()> {
        let Some(parent) = self.node(id)?.parent else {
            return Ok(());
        };
        self.node_mut(parent)?.children.retain(|&c| c != id);
        self.node_mut(id)?.parent = None;
        Ok(())
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.insert_before(parent, child, None)
    }

    /// Moves `child` into `parent` before `before`, or to the end when `before` is `None`
    ///
    /// `before` must be a child of `parent` other than `child` itself.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        before: Option<NodeId>,
    ) -> Result<()> {
        self.node(parent)?;
        self.node(child)?;
        if parent == child || self.is_ancestor(child, parent)? {
            return Err(BoardError::NotAChild {
                parent: child.0,
                child: parent.0,
            });
        }
        if let Some(before) = before {
            if before == child || self.parent(before)? != Some(parent) {
                return Err(BoardError::NotAChild {
                    parent: parent.0,
                    child: before.0,
                });
            }
        }

        self.detach(child)?;

        let siblings = &mut self.node_mut(parent)?.children;
        let index = before
            .and_then(|b| siblings.iter().position(|&c| c == b))
            .unwrap_or(siblings.len());
        siblings.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> Result<bool> {
        let mut current = self.parent(id)?;
        while let Some(node) = current {
            if node == ancestor {
                return Ok(true);
            }
            current = self.parent(node)?;
        }
        Ok(false)
    }

    /// Whether the node is reachable from the body
    pub fn is_attached(&self, id: NodeId) -> bool {
        id == self.body || self.is_ancestor(self.body, id).unwrap_or(false)
    }

    /// Number of live, attached nodes of a kind
    pub fn attached_count(&self, kind: NodeKind) -> usize {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.as_ref().is_some_and(|n| n.kind == kind))
            .filter(|(i, _)| self.is_attached(NodeId(*i)))
            .count()
    }

    fn expect_kind(&self, id: NodeId, kind: NodeKind) -> Result<()> {
        if self.kind(id)? == kind {
            return Ok(());
        }
        Err(match kind {
            NodeKind::Column => BoardError::NotAColumn(id.0),
            _ => BoardError::NotACard(id.0),
        })
    }

    pub fn is_card(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Ok(NodeKind::Card))
    }

    /// Direct card children of a container, in document order
    pub fn card_children(&self, container: NodeId) -> Result<Vec<NodeId>> {
        Ok(self
            .children(container)?
            .iter()
            .copied()
            .filter(|&c| self.is_card(c))
            .collect())
    }

    pub fn columns(&self) -> Vec<NodeId> {
        self.children(self.body)
            .map(|children| {
                children
                    .iter()
                    .copied()
                    .filter(|&c| matches!(self.kind(c), Ok(NodeKind::Column)))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn column_node(&self, column: ColumnId) -> Option<NodeId> {
        self.columns()
            .into_iter()
            .find(|&c| self.column_id(c) == Some(column))
    }

    /// Logical column name of a column node
    pub fn column_id(&self, node: NodeId) -> Option<ColumnId> {
        match self.node(node).ok()? {
            Node {
                kind: NodeKind::Column,
                dom_id: Some(id),
                ..
            } => id.parse().ok(),
            _ => None,
        }
    }

    /// Column that currently contains a card
    pub fn column_of(&self, card: NodeId) -> Option<NodeId> {
        self.parent(card)
            .ok()
            .flatten()
            .filter(|&p| matches!(self.kind(p), Ok(NodeKind::Column)))
    }

    pub fn empty_indicator(&self, column: NodeId) -> Result<Option<NodeId>> {
        Ok(self
            .children(column)?
            .iter()
            .copied()
            .find(|&c| matches!(self.kind(c), Ok(NodeKind::EmptyIndicator))))
    }

    /// Card whose DOM id equals the task key
    pub fn find_card(&self, id: &CardId) -> Option<NodeId> {
        self.nodes.iter().enumerate().find_map(|(i, n)| match n {
            Some(Node {
                kind: NodeKind::Card,
                dom_id: Some(dom_id),
                ..
            }) if dom_id == id.as_str() => Some(NodeId(i)),
            _ => None,
        })
    }

    pub fn card_id(&self, card: NodeId) -> Option<CardId> {
        match self.node(card).ok()? {
            Node {
                kind: NodeKind::Card,
                dom_id: Some(id),
                ..
            } => CardId::new(id.as_str()).ok(),
            _ => None,
        }
    }

    /// First column whose box contains the point
    pub fn hit_test_column(&self, point: Point) -> Option<NodeId> {
        self.columns()
            .into_iter()
            .find(|&c| self.rect(c).is_ok_and(|r| r.contains(point)))
    }

    pub fn set_click_suppressed(&mut self, card: NodeId, suppressed: bool) -> Result<()> {
        self.node_mut(card)?.click_suppressed = suppressed;
        Ok(())
    }

    /// Reads and clears the "was just dragged" flag; called by click handlers
    pub fn take_click_suppressed(&mut self, card: NodeId) -> bool {
        self.node_mut(card)
            .map(|n| std::mem::take(&mut n.click_suppressed))
            .unwrap_or(false)
    }

    pub fn scroll(&self) -> ScrollState {
        self.scroll
    }

    /// Host-driven page scroll; ignored while the body is pinned
    pub fn set_scroll_offset(&mut self, offset: f64) {
        if self.scroll.pinned_at.is_none() {
            self.scroll.offset = offset;
        }
    }

    pub fn is_scroll_locked(&self) -> bool {
        self.scroll.pinned_at.is_some()
    }

    /// Pins the body at the current scroll offset
    ///
    /// The page offset drops to zero while the body is shifted up by the old
    /// offset, so the content does not visibly move.
    pub fn lock_scroll(&mut self) -> ScrollLock {
        let offset = self.scroll.pinned_at.unwrap_or(self.scroll.offset);
        self.scroll = ScrollState {
            offset: 0.0,
            pinned_at: Some(offset),
        };
        if let Some(Some(body)) = self.nodes.get_mut(self.body.0) {
            body.visual.fixed_at = Some(Point::new(0.0, -offset));
        }
        ScrollLock { offset }
    }

    /// Unpins the body and restores the offset captured by the lock
    pub fn unlock_scroll(&mut self, lock: ScrollLock) {
        self.scroll = ScrollState {
            offset: lock.offset,
            pinned_at: None,
        };
        if let Some(Some(body)) = self.nodes.get_mut(self.body.0) {
            body.visual.fixed_at = None;
        }
    }
}
