use crate::core::Document;
use crate::list::{ListAttrs, ListError};

/// Nearest list block before (or after) `index` that is not nested deeper
/// than `reference`. `None` at the sequence edge or at a plain block.
fn nearest_at_or_above(
    doc: &Document,
    index: usize,
    reference: &ListAttrs,
    forward: bool,
) -> Result<Option<ListAttrs>, ListError> {
    let candidates: Box<dyn Iterator<Item = usize>> = if forward {
        Box::new(index + 1..doc.len())
    } else {
        Box::new((0..index).rev())
    };

    for candidate in candidates {
        let Some(attrs) = doc.list(candidate)? else {
            return Ok(None);
        };
        if attrs.indent > reference.indent {
            continue;
        }
        return Ok(Some(attrs));
    }
    Ok(None)
}

/// `false` only when an earlier block (deeper blocks skipped) continues the
/// same item. Plain blocks are not part of any item and report `false`.
pub fn is_first_block_of_item(doc: &Document, index: usize) -> Result<bool, ListError> {
    let Some(reference) = doc.list(index)? else {
        return Ok(false);
    };
    Ok(nearest_at_or_above(doc, index, &reference, false)?
        .is_none_or(|prev| !prev.same_item(&reference)))
}

pub fn is_last_block_of_item(doc: &Document, index: usize) -> Result<bool, ListError> {
    let Some(reference) = doc.list(index)? else {
        return Ok(false);
    };
    Ok(nearest_at_or_above(doc, index, &reference, true)?
        .is_none_or(|next| !next.same_item(&reference)))
}

/// All blocks of the list that `index` sits in, at `index`'s level.
///
/// Items of every id are collected, continuation blocks included. Deeper
/// blocks are skipped; the scan ends at a shallower block, a block of another
/// list type, or a plain block.
pub fn sibling_items(doc: &Document, index: usize) -> Result<Vec<usize>, ListError> {
    let Some(reference) = doc.list(index)? else {
        return Ok(Vec::new());
    };

    let at_level = |candidate: usize| -> Result<Option<bool>, ListError> {
        let Some(attrs) = doc.list(candidate)? else {
            return Ok(None);
        };
        if attrs.indent > reference.indent {
            return Ok(Some(false));
        }
        if attrs.indent < reference.indent || attrs.list_type != reference.list_type {
            return Ok(None);
        }
        Ok(Some(true))
    };

    let mut before = Vec::new();
    for candidate in (0..index).rev() {
        match at_level(candidate)? {
            Some(true) => before.push(candidate),
            Some(false) => {}
            None => break,
        }
    }
    before.reverse();

    let mut blocks = before;
    blocks.push(index);
    for candidate in index + 1..doc.len() {
        match at_level(candidate)? {
            Some(true) => blocks.push(candidate),
            Some(false) => {}
            None => break,
        }
    }
    Ok(blocks)
}

/// Whether `blocks` is non-empty and every block carries the first block's
/// item id.
pub fn is_single_item_selected(doc: &Document, blocks: &[usize]) -> Result<bool, ListError> {
    let Some(&first) = blocks.first() else {
        return Ok(false);
    };
    let Some(reference) = doc.list(first)? else {
        return Ok(false);
    };

    for &index in &blocks[1..] {
        match doc.list(index)? {
            Some(attrs) if attrs.item_id == reference.item_id => {}
            _ => return Ok(false),
        }
    }
    Ok(true)
}
