use crate::{
    dom::{Document, NodeId, NodeKind, Rect},
    error::Result,
};
use tracing::debug;

/// Owns the single insertion-preview marker
///
/// The marker node is created once and reused across gestures, so the
/// document can never hold more than one.
#[derive(Debug)]
pub struct PlaceholderManager {
    node: NodeId,
}

impl PlaceholderManager {
    pub fn new(doc: &mut Document) -> Self {
        Self {
            node: doc.create_node(NodeKind::Placeholder),
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Moves the marker into `container`, before `before` or at the end
    ///
    /// A `before` that is no longer a child of `container` is treated as a
    /// geometry miss and the marker is appended.
    pub fn place(
        &self,
        doc: &mut Document,
        container: NodeId,
        before: Option<NodeId>,
    ) -> Result<()> {
        doc.detach(self.node)?;

        let before = before.filter(|&b| doc.parent(b).ok().flatten() == Some(container));
        doc.insert_before(container, self.node, before)?;
        debug!(container = %container, before = ?before, "placeholder placed");
        Ok(())
    }

    /// Detaches the marker; safe to call at any time
    pub fn remove(&self, doc: &mut Document) {
        if let Err(e) = doc.detach(self.node) {
            debug!(error = %e, "placeholder already gone");
        }
    }

    /// Gives the marker the dragged card's height
    pub fn match_size(&self, doc: &mut Document, card: NodeId) -> Result<()> {
        let card_rect = doc.rect(card)?;
        doc.set_rect(self.node, Rect::new(0.0, 0.0, card_rect.width, card_rect.height))
    }

    /// Column currently hosting the marker
    pub fn container(&self, doc: &Document) -> Option<NodeId> {
        doc.parent(self.node).ok().flatten()
    }

    pub fn is_attached(&self, doc: &Document) -> bool {
        doc.is_attached(self.node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CardId, ColumnId};
    use proptest::prelude::*;

    fn board() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let todo = doc.add_column(ColumnId::Todo, Rect::default()).unwrap();
        let done = doc.add_column(ColumnId::Done, Rect::default()).unwrap();
        let card = doc
            .insert_card(todo, &CardId::new("a").unwrap(), Rect::new(0.0, 0.0, 200.0, 90.0))
            .unwrap();
        (doc, todo, done, card)
    }

    #[test]
    fn test_place_before_sibling() {
        let (mut doc, todo, _, card) = board();
        let placeholder = PlaceholderManager::new(&mut doc);

        placeholder.place(&mut doc, todo, Some(card)).unwrap();

        let children = doc.children(todo).unwrap();
        let pos_placeholder = children.iter().position(|&c| c == placeholder.node());
        let pos_card = children.iter().position(|&c| c == card);
        assert_eq!(pos_placeholder.unwrap() + 1, pos_card.unwrap());
    }

    #[test]
    fn test_place_sequence_keeps_single_marker() {
        let (mut doc, todo, done, card) = board();
        let placeholder = PlaceholderManager::new(&mut doc);

        let targets = [(todo, Some(card)), (done, None), (todo, None), (done, None), (todo, Some(card))];
        for (container, before) in targets {
            placeholder.place(&mut doc, container, before).unwrap();
            assert_eq!(doc.attached_count(NodeKind::Placeholder), 1);
            assert_eq!(placeholder.container(&doc), Some(container));
        }
    }

    #[test]
    fn test_stale_sibling_falls_back_to_append() {
        let (mut doc, _, done, card) = board();
        let placeholder = PlaceholderManager::new(&mut doc);

        placeholder.place(&mut doc, done, Some(card)).unwrap();

        assert_eq!(doc.children(done).unwrap().last(), Some(&placeholder.node()));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let (mut doc, todo, _, _) = board();
        let placeholder = PlaceholderManager::new(&mut doc);

        placeholder.remove(&mut doc);
        placeholder.place(&mut doc, todo, None).unwrap();
        placeholder.remove(&mut doc);
        placeholder.remove(&mut doc);

        assert!(!placeholder.is_attached(&doc));
        assert_eq!(doc.attached_count(NodeKind::Placeholder), 0);
    }

    /// Two columns with three cards each; the placeholder is candidate 6
    fn populated() -> (Document, PlaceholderManager, Vec<NodeId>, Vec<NodeId>) {
        let mut doc = Document::new();
        let columns = vec![
            doc.add_column(ColumnId::Todo, Rect::default()).unwrap(),
            doc.add_column(ColumnId::Done, Rect::default()).unwrap(),
        ];
        let mut candidates = Vec::new();
        for (c, &column) in columns.iter().enumerate() {
            for i in 0..3 {
                let id = CardId::new(format!("c{c}-{i}")).unwrap();
                candidates.push(doc.insert_card(column, &id, Rect::default()).unwrap());
            }
        }
        let placeholder = PlaceholderManager::new(&mut doc);
        candidates.push(placeholder.node());
        (doc, placeholder, columns, candidates)
    }

    proptest! {
        #[test]
        fn prop_any_sequence_keeps_at_most_one_marker(
            ops in prop::collection::vec(
                prop::option::of((0..2usize, prop::option::of(0..7usize))),
                1..40,
            ),
        ) {
            let (mut doc, placeholder, columns, candidates) = populated();

            for op in ops {
                match op {
                    Some((column, before)) => {
                        let container = columns[column];
                        placeholder
                            .place(&mut doc, container, before.map(|i| candidates[i]))
                            .unwrap();
                        prop_assert_eq!(doc.attached_count(NodeKind::Placeholder), 1);
                        prop_assert_eq!(placeholder.container(&doc), Some(container));
                    }
                    None => {
                        placeholder.remove(&mut doc);
                        prop_assert_eq!(doc.attached_count(NodeKind::Placeholder), 0);
                    }
                }
                prop_assert_eq!(doc.attached_count(NodeKind::Card), 6);
            }
        }
    }

    #[test]
    fn test_match_size() {
        let (mut doc, _, _, card) = board();
        let placeholder = PlaceholderManager::new(&mut doc);

        placeholder.match_size(&mut doc, card).unwrap();

        assert_eq!(doc.rect(placeholder.node()).unwrap().height, 90.0);
    }
}
