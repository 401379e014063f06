use crate::core::Document;
use crate::list::ListError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    Forward,
    #[default]
    Backward,
}

/// Blocks after (or before) `index` that belong to the same list item.
///
/// Deeper blocks are stepped over without being collected. The walk stops at
/// a shallower block, a block at the same indent with another id, or a plain
/// block. The starting block is not part of the result, which is always in
/// document order.
pub fn scan_item(doc: &Document, index: usize, direction: Direction) -> Result<Vec<usize>, ListError> {
    let Some(reference) = doc.list(index)? else {
        return Ok(Vec::new());
    };

    let candidates: Box<dyn Iterator<Item = usize>> = match direction {
        Direction::Forward => Box::new(index + 1..doc.len()),
        Direction::Backward => Box::new((0..index).rev()),
    };

    let mut blocks = Vec::new();
    for candidate in candidates {
        let Some(attrs) = doc.list(candidate)? else {
            break;
        };
        if attrs.indent > reference.indent {
            continue;
        }
        if !attrs.same_item(&reference) {
            break;
        }
        blocks.push(candidate);
    }

    if direction == Direction::Backward {
        blocks.reverse();
    }
    Ok(blocks)
}

/// Every block of the item `index` belongs to, nested sub-items excluded.
pub fn all_item_blocks(doc: &Document, index: usize) -> Result<Vec<usize>, ListError> {
    let mut blocks = scan_item(doc, index, Direction::Backward)?;
    blocks.push(index);
    blocks.extend(scan_item(doc, index, Direction::Forward)?);
    Ok(blocks)
}

/// The subtree nested directly under the item of `index`: every block after
/// the item's last block that is indented deeper than the item.
pub fn nested_blocks(doc: &Document, index: usize) -> Result<Vec<usize>, ListError> {
    let Some(reference) = doc.list(index)? else {
        return Ok(Vec::new());
    };
    let last = all_item_blocks(doc, index)?
        .last()
        .copied()
        .unwrap_or(index);

    let mut blocks = Vec::new();
    for candidate in last + 1..doc.len() {
        match doc.list(candidate)? {
            Some(attrs) if attrs.indent > reference.indent => blocks.push(candidate),
            _ => break,
        }
    }
    Ok(blocks)
}
