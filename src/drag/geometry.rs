use crate::dom::{Document, NodeId};

/// Picks the card a dragged item should be inserted before
///
/// Among the container's cards (excluding `dragged`) whose vertical midpoint
/// lies below `pointer_y`, returns the one closest to the pointer. `None`
/// means the item belongs at the end of the container.
pub fn resolve_insertion_point(
    doc: &Document,
    container: NodeId,
    pointer_y: f64,
    dragged: Option<NodeId>,
) -> Option<NodeId> {
    let cards = doc.card_children(container).ok()?;

    cards
        .into_iter()
        .filter(|&card| Some(card) != dragged)
        .filter_map(|card| {
            let rect = doc.rect(card).ok()?;
            Some((card, pointer_y - rect.top - rect.height / 2.0))
        })
        .fold(
            (None, f64::NEG_INFINITY),
            |(best, best_offset), (card, offset)| {
                if offset < 0.0 && offset > best_offset {
                    (Some(card), offset)
                } else {
                    (best, best_offset)
                }
            },
        )
        .0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{CardId, ColumnId},
        dom::Rect,
    };
    use proptest::prelude::*;

    /// Column with cards stacked every 100px, each 80px tall
    fn column_with_cards(n: usize) -> (Document, NodeId, Vec<NodeId>) {
        let mut doc = Document::new();
        let column = doc
            .add_column(ColumnId::Todo, Rect::new(0.0, 0.0, 250.0, 1000.0))
            .unwrap();
        let cards = (0..n)
            .map(|i| {
                let id = CardId::new(format!("card-{i}")).unwrap();
                let rect = Rect::new(0.0, i as f64 * 100.0, 250.0, 80.0);
                doc.insert_card(column, &id, rect).unwrap()
            })
            .collect();
        (doc, column, cards)
    }

    #[test]
    fn test_pointer_above_first_midpoint() {
        let (doc, column, cards) = column_with_cards(3);
        assert_eq!(resolve_insertion_point(&doc, column, 10.0, None), Some(cards[0]));
    }

    #[test]
    fn test_pointer_between_cards() {
        let (doc, column, cards) = column_with_cards(3);
        // Below card 0's midpoint (40), above card 1's (140)
        assert_eq!(resolve_insertion_point(&doc, column, 90.0, None), Some(cards[1]));
        assert_eq!(resolve_insertion_point(&doc, column, 139.0, None), Some(cards[1]));
        assert_eq!(resolve_insertion_point(&doc, column, 141.0, None), Some(cards[2]));
    }

    #[test]
    fn test_pointer_below_last_midpoint_appends() {
        let (doc, column, _) = column_with_cards(3);
        assert_eq!(resolve_insertion_point(&doc, column, 260.0, None), None);
    }

    #[test]
    fn test_exactly_on_midpoint_is_not_above() {
        let (doc, column, cards) = column_with_cards(2);
        assert_eq!(resolve_insertion_point(&doc, column, 40.0, None), Some(cards[1]));
    }

    #[test]
    fn test_empty_container_appends() {
        let (doc, column, _) = column_with_cards(0);
        assert_eq!(resolve_insertion_point(&doc, column, 10.0, None), None);
    }

    #[test]
    fn test_never_returns_dragged_card() {
        let (doc, column, cards) = column_with_cards(4);
        for dragged in &cards {
            for y in (-50..450).step_by(7) {
                let result = resolve_insertion_point(&doc, column, y as f64, Some(*dragged));
                assert_ne!(result, Some(*dragged));
            }
        }
    }

    /// Column holding one card per `(top, height)` pair, in the given order
    fn column_with_boxes(boxes: &[(f64, f64)]) -> (Document, NodeId, Vec<NodeId>) {
        let mut doc = Document::new();
        let column = doc
            .add_column(ColumnId::Todo, Rect::new(0.0, 0.0, 250.0, 3000.0))
            .unwrap();
        let cards = boxes
            .iter()
            .enumerate()
            .map(|(i, &(top, height))| {
                let id = CardId::new(format!("card-{i}")).unwrap();
                doc.insert_card(column, &id, Rect::new(0.0, top, 250.0, height))
                    .unwrap()
            })
            .collect();
        (doc, column, cards)
    }

    proptest! {
        #[test]
        fn prop_picks_closest_card_below_pointer_and_never_the_dragged_one(
            boxes in prop::collection::vec((0.0..2000.0f64, 1.0..300.0f64), 0..12),
            pointer_y in -100.0..2500.0f64,
            dragged in any::<prop::sample::Index>(),
        ) {
            let (doc, column, cards) = column_with_boxes(&boxes);
            let dragged = (!cards.is_empty()).then(|| cards[dragged.index(cards.len())]);
            let offset = |card: NodeId| {
                let rect = doc.rect(card).unwrap();
                pointer_y - rect.top - rect.height / 2.0
            };

            let result = resolve_insertion_point(&doc, column, pointer_y, dragged);
            let candidates: Vec<NodeId> = cards
                .iter()
                .copied()
                .filter(|&c| Some(c) != dragged && offset(c) < 0.0)
                .collect();

            match result {
                Some(card) => {
                    prop_assert_ne!(Some(card), dragged);
                    prop_assert!(offset(card) < 0.0);
                    for other in candidates {
                        prop_assert!(offset(other) <= offset(card));
                    }
                }
                None => prop_assert!(candidates.is_empty()),
            }
        }
    }

    #[test]
    fn test_skips_dragged_card() {
        let (doc, column, cards) = column_with_cards(3);
        // Above card 1's midpoint but card 1 is the one being dragged
        assert_eq!(
            resolve_insertion_point(&doc, column, 120.0, Some(cards[1])),
            Some(cards[2])
        );
    }

    #[test]
    fn test_ignores_non_card_children() {
        let (mut doc, column, cards) = column_with_cards(1);
        let placeholder = doc.create_node(crate::dom::NodeKind::Placeholder);
        doc.set_rect(placeholder, Rect::new(0.0, 0.0, 250.0, 80.0)).unwrap();
        doc.insert_before(column, placeholder, Some(cards[0])).unwrap();

        let result = resolve_insertion_point(&doc, column, 5.0, None);
        assert_eq!(result, Some(cards[0]));
    }
}
