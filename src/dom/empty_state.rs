use crate::{
    dom::{Document, NodeId},
    error::Result,
};

/// Shows the column's "no tasks" indicator iff it has no card children
pub fn refresh_column(doc: &mut Document, column: NodeId) -> Result<()> {
    let empty = doc.card_children(column)?.is_empty();
    if let Some(indicator) = doc.empty_indicator(column)? {
        doc.visual_mut(indicator)?.hidden = !empty;
    }
    Ok(())
}

/// Recomputes every column; a single move can empty one and fill another
pub fn refresh_all(doc: &mut Document) -> Result<()> {
    for column in doc.columns() {
        refresh_column(doc, column)?;
    }
    Ok(())
}

/// Whether the column currently shows its empty indicator
pub fn is_showing_empty(doc: &Document, column: NodeId) -> bool {
    doc.empty_indicator(column)
        .ok()
        .flatten()
        .and_then(|indicator| doc.visual(indicator).ok())
        .is_some_and(|v| !v.hidden)
}
