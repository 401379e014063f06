use crate::core::Document;
use crate::list::{ListError, all_item_blocks};

/// Widens a selection so that its edges cover whole list items.
///
/// `blocks` is expected in document order. Only the first and the last block
/// are looked at: each is mapped to the item that owns it at the selection's
/// shallowest indent, and the selection grows to the start of the first such
/// item and to the end of the last one, including the nested subtree that
/// closes it. Interior blocks are kept as given.
pub fn expand_to_complete_items(doc: &Document, blocks: &[usize]) -> Result<Vec<usize>, ListError> {
    let (Some(&first), Some(&last)) = (blocks.first(), blocks.last()) else {
        return Ok(blocks.to_vec());
    };

    let mut reference_indent: Option<u32> = None;
    for &index in blocks {
        if let Some(attrs) = doc.list(index)? {
            reference_indent =
                Some(reference_indent.map_or(attrs.indent, |min| min.min(attrs.indent)));
        }
    }
    let Some(reference_indent) = reference_indent else {
        return Ok(blocks.to_vec());
    };

    let start = match owner_at(doc, first, reference_indent)? {
        Some(owner) => all_item_blocks(doc, owner)?.first().copied().unwrap_or(first),
        None => first,
    };

    let end = match owner_at(doc, last, reference_indent)? {
        Some(owner) => {
            let mut end = all_item_blocks(doc, owner)?.last().copied().unwrap_or(owner);
            while end + 1 < doc.len() {
                match doc.list(end + 1)? {
                    Some(attrs) if attrs.indent > reference_indent => end += 1,
                    _ => break,
                }
            }
            end.max(last)
        }
        None => last,
    };

    let mut expanded: Vec<usize> = (start..first).collect();
    for &index in blocks {
        if expanded.last().is_none_or(|&prev| prev < index) {
            expanded.push(index);
        }
    }
    expanded.extend(last + 1..=end);
    Ok(expanded)
}

/// The block at `indent` whose item contains `index`: `index` itself when it
/// sits at that indent, otherwise the nearest earlier block at that indent
/// reached by stepping over deeper blocks.
fn owner_at(doc: &Document, index: usize, indent: u32) -> Result<Option<usize>, ListError> {
    let Some(attrs) = doc.list(index)? else {
        return Ok(None);
    };
    if attrs.indent == indent {
        return Ok(Some(index));
    }
    if attrs.indent < indent {
        return Ok(None);
    }

    for candidate in (0..index).rev() {
        let Some(attrs) = doc.list(candidate)? else {
            return Ok(None);
        };
        if attrs.indent > indent {
            continue;
        }
        return Ok((attrs.indent == indent).then_some(candidate));
    }
    Ok(None)
}
