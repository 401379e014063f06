use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::core::{Document, Writer};
use crate::ids::ListItemId;
use crate::list::{
    Direction, ListAttrs, ListError, all_item_blocks, expand_to_complete_items,
    scan_item,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditOptions {
    /// Grow the selection to whole list items before editing.
    pub expand: bool,
}

impl EditOptions {
    pub fn expanded() -> Self {
        Self { expand: true }
    }
}

/// Splits the item of `index` in two: `index` and the rest of its item get
/// one fresh id, earlier blocks keep the old one.
pub fn split_item_before(writer: &mut Writer<'_>, index: usize) -> Result<Vec<usize>, ListError> {
    if writer.doc().list(index)?.is_none() {
        return Ok(Vec::new());
    }

    let mut blocks = vec![index];
    blocks.extend(scan_item(writer.doc(), index, Direction::Forward)?);

    let item_id = writer.generate_id();
    debug!(block = index, blocks = blocks.len(), item_id = %item_id, "split list item");

    for &block in &blocks {
        if let Some(attrs) = writer.doc().list(block)? {
            writer.set_list_attrs(block, &attrs.with_item_id(item_id.clone()))?;
        }
    }
    Ok(blocks)
}

/// Folds the item of `target` into the item of `reference` by copying the
/// reference triple onto the target item's own blocks. Nested sub-items of
/// the target are left alone. Returns the blocks whose triple changed.
pub fn merge_item_before(
    writer: &mut Writer<'_>,
    target: usize,
    reference: usize,
) -> Result<Vec<usize>, ListError> {
    if writer.doc().list(target)?.is_none() {
        return Ok(Vec::new());
    }
    let Some(parent) = writer.doc().list(reference)? else {
        return Ok(Vec::new());
    };
    let blocks = all_item_blocks(writer.doc(), target)?;
    debug!(target, reference, blocks = blocks.len(), "merge list item");
    assign(writer, &blocks, &parent)
}

/// Nests every block one level deeper.
///
/// Item ids are kept; only depth changes. A plain block becomes a top-level
/// list block, joining the enclosing top-level item when one directly
/// precedes it. Otherwise it starts a new item of the nearest preceding
/// list's type, bulleted when there is none.
pub fn indent_blocks(
    writer: &mut Writer<'_>,
    blocks: &[usize],
    options: EditOptions,
) -> Result<Vec<usize>, ListError> {
    let blocks = if options.expand {
        expand_to_complete_items(writer.doc(), blocks)?
    } else {
        blocks.to_vec()
    };

    for &index in &blocks {
        let next = match writer.doc().list(index)? {
            Some(attrs) => attrs.with_indent(attrs.indent.saturating_add(1)),
            None => promoted(writer, index)?,
        };
        writer.set_list_attrs(index, &next)?;
    }

    debug!(blocks = blocks.len(), expand = options.expand, "indent list blocks");
    Ok(blocks)
}

fn promoted(writer: &mut Writer<'_>, index: usize) -> Result<ListAttrs, ListError> {
    let mut list_type = None;
    let mut joinable = true;
    for candidate in (0..index).rev() {
        let Some(attrs) = writer.doc().list(candidate)? else {
            joinable = false;
            continue;
        };
        if joinable && attrs.indent == 0 {
            return Ok(attrs);
        }
        if list_type.is_none() {
            list_type = Some(attrs.list_type);
        }
        if !joinable {
            break;
        }
    }
    Ok(ListAttrs::new(
        list_type.unwrap_or_default(),
        0,
        writer.generate_id(),
    ))
}

#[derive(Debug)]
enum OutdentStep {
    Remove,
    Decrement(ListAttrs),
    NewItem(ListAttrs),
    Merge { blocks: Vec<usize>, parent: ListAttrs },
}

/// Moves every block one level up.
///
/// Blocks at indent 0 lose their list attributes. Blocks at the selection's
/// shallowest indent leave their parent item: when the parent item has more
/// blocks after them they become part of it, otherwise they start a new item
/// one level up. Deeper blocks only change depth. Every decision is taken
/// against the structure as it was before the first write.
pub fn outdent_blocks(
    writer: &mut Writer<'_>,
    blocks: &[usize],
    options: EditOptions,
) -> Result<Vec<usize>, ListError> {
    let blocks = if options.expand {
        expand_to_complete_items(writer.doc(), blocks)?
    } else {
        blocks.to_vec()
    };

    let plan = plan_outdent(writer.doc(), &blocks)?;

    let mut visited: BTreeSet<usize> = BTreeSet::new();
    let mut changed: BTreeSet<usize> = BTreeSet::new();
    let mut fresh_ids: HashMap<ListItemId, ListItemId> = HashMap::new();

    for (index, step) in plan {
        if !visited.insert(index) {
            continue;
        }
        match step {
            OutdentStep::Remove => {
                writer.remove_list_attrs(index)?;
                changed.insert(index);
            }
            OutdentStep::Decrement(attrs) => {
                writer.set_list_attrs(index, &attrs.with_indent(attrs.indent - 1))?;
                changed.insert(index);
            }
            OutdentStep::NewItem(attrs) => {
                let item_id = fresh_ids
                    .entry(attrs.item_id.clone())
                    .or_insert_with(|| writer.generate_id())
                    .clone();
                let next = ListAttrs::new(attrs.list_type, attrs.indent - 1, item_id);
                writer.set_list_attrs(index, &next)?;
                changed.insert(index);
            }
            OutdentStep::Merge { blocks, parent } => {
                visited.extend(blocks.iter().copied());
                changed.extend(assign(writer, &blocks, &parent)?);
            }
        }
    }

    debug!(
        changed = changed.len(),
        expand = options.expand,
        "outdent list blocks"
    );
    Ok(changed.into_iter().collect())
}

fn plan_outdent(doc: &Document, blocks: &[usize]) -> Result<Vec<(usize, OutdentStep)>, ListError> {
    let mut listed = Vec::new();
    for &index in blocks {
        if let Some(attrs) = doc.list(index)? {
            listed.push((index, attrs));
        }
    }
    let Some(reference_indent) = listed.iter().map(|(_, attrs)| attrs.indent).min() else {
        return Ok(Vec::new());
    };

    let mut plan = Vec::with_capacity(listed.len());
    for (index, attrs) in listed {
        let step = if attrs.indent == 0 {
            OutdentStep::Remove
        } else if attrs.indent == reference_indent {
            match parent_of(doc, index, attrs.indent)? {
                Some(parent) if item_continues_after(doc, parent, index)? => {
                    let parent = doc
                        .list(parent)?
                        .ok_or_else(|| ListError::invalid(parent, "parent is not a list block"))?;
                    OutdentStep::Merge {
                        blocks: all_item_blocks(doc, index)?,
                        parent,
                    }
                }
                _ => OutdentStep::NewItem(attrs),
            }
        } else {
            OutdentStep::Decrement(attrs)
        };
        plan.push((index, step));
    }
    Ok(plan)
}

/// Nearest earlier block with an indent lower than `indent`.
fn parent_of(doc: &Document, index: usize, indent: u32) -> Result<Option<usize>, ListError> {
    for candidate in (0..index).rev() {
        let Some(attrs) = doc.list(candidate)? else {
            return Ok(None);
        };
        if attrs.indent < indent {
            return Ok(Some(candidate));
        }
    }
    Ok(None)
}

fn item_continues_after(doc: &Document, item: usize, index: usize) -> Result<bool, ListError> {
    Ok(all_item_blocks(doc, item)?
        .last()
        .is_some_and(|&last| last > index))
}

fn assign(
    writer: &mut Writer<'_>,
    blocks: &[usize],
    attrs: &ListAttrs,
) -> Result<Vec<usize>, ListError> {
    let mut changed = Vec::new();
    for &index in blocks {
        if writer.doc().list(index)?.as_ref() == Some(attrs) {
            continue;
        }
        writer.set_list_attrs(index, attrs)?;
        changed.push(index);
    }
    Ok(changed)
}

/// Strips the list triple from each block. Returns the blocks that had one.
pub fn remove_list_attributes(
    writer: &mut Writer<'_>,
    blocks: &[usize],
) -> Result<Vec<usize>, ListError> {
    let mut changed = Vec::new();
    for &index in blocks {
        if writer.doc().list(index)?.is_some() {
            writer.remove_list_attrs(index)?;
            changed.push(index);
        }
    }
    debug!(changed = changed.len(), "remove list attributes");
    Ok(changed)
}
