use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::ids::{IdGenerator, ListItemId, UuidIdGenerator};
use crate::list::{ListAttrs, ListError};
use crate::ops::{Op, Transaction};
use crate::plugin::{CommandError, PluginRegistry, QueryError};

pub type Attrs = BTreeMap<String, serde_json::Value>;
pub type BlockKind = String;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Document {
    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn block(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    /// List attributes of the block at `index`, `None` for a plain block.
    pub fn list(&self, index: usize) -> Result<Option<ListAttrs>, ListError> {
        let block = self.blocks.get(index).ok_or(ListError::BlockOutOfRange {
            index,
            len: self.blocks.len(),
        })?;
        ListAttrs::read(index, &block.attrs)
    }

    pub fn texts(&self) -> Vec<&str> {
        self.blocks.iter().map(|b| b.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub kind: BlockKind,
    #[serde(default)]
    pub attrs: Attrs,
    #[serde(default)]
    pub text: String,
}

impl Block {
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self {
            kind: "paragraph".to_string(),
            attrs: Attrs::default(),
            text: text.into(),
        }
    }

    pub fn list_item(text: impl Into<String>, list: ListAttrs) -> Self {
        let mut block = Self::paragraph(text);
        patch_apply(&mut block.attrs, &list.set_patch());
        block
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attrs.insert(key.into(), value);
        self
    }

    pub fn item_id(&self) -> Option<&str> {
        self.attrs
            .get(crate::list::LIST_ITEM_ID)
            .and_then(|v| v.as_str())
    }

    pub fn indent(&self) -> Option<u64> {
        self.attrs
            .get(crate::list::LIST_INDENT)
            .and_then(|v| v.as_u64())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSelection {
    pub anchor: usize,
    pub focus: usize,
}

impl BlockSelection {
    pub fn collapsed(index: usize) -> Self {
        Self {
            anchor: index,
            focus: index,
        }
    }

    pub fn range(anchor: usize, focus: usize) -> Self {
        Self { anchor, focus }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    pub fn start(&self) -> usize {
        self.anchor.min(self.focus)
    }

    pub fn end(&self) -> usize {
        self.anchor.max(self.focus)
    }

    /// Selected block indices in document order.
    pub fn blocks(&self) -> Vec<usize> {
        (self.start()..=self.end()).collect()
    }
}

#[derive(Debug, Clone)]
pub struct UndoRecord {
    pub inverse_ops: Vec<Op>,
    pub selection_before: BlockSelection,
    pub selection_after: BlockSelection,
    pub source: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct EditorConfig {
    pub max_undo: usize,
}

impl EditorConfig {
    fn with_defaults(mut self) -> Self {
        if self.max_undo == 0 {
            self.max_undo = 200;
        }
        self
    }
}

pub struct Editor {
    doc: Document,
    selection: BlockSelection,
    registry: PluginRegistry,
    config: EditorConfig,
    ids: Box<dyn IdGenerator>,
    undo_stack: Vec<UndoRecord>,
    redo_stack: Vec<UndoRecord>,
}

impl Editor {
    pub fn new(doc: Document, selection: BlockSelection, registry: PluginRegistry) -> Self {
        let mut editor = Self {
            doc,
            selection,
            registry,
            config: EditorConfig::default().with_defaults(),
            ids: Box::new(UuidIdGenerator),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        };
        editor.normalize_selection_in_place();
        editor
    }

    pub fn with_list_plugins() -> Self {
        let doc = Document::new(vec![Block::paragraph("")]);
        Self::new(doc, BlockSelection::collapsed(0), PluginRegistry::list())
    }

    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    pub fn with_config(mut self, config: EditorConfig) -> Self {
        self.config = config.with_defaults();
        self
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn selection(&self) -> &BlockSelection {
        &self.selection
    }

    pub fn set_selection(&mut self, selection: BlockSelection) {
        self.selection = selection;
        self.normalize_selection_in_place();
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Reverts the newest undo step. Returns `false` when there is nothing to
    /// undo or the step no longer applies; in the latter case the document
    /// is left as it was and the step stays on the stack.
    pub fn undo(&mut self) -> bool {
        let Some(record) = self.undo_stack.pop() else {
            return false;
        };

        let Some(redo_ops) = self.replay(&record.inverse_ops, "undo") else {
            self.undo_stack.push(record);
            return false;
        };
        debug!(source = record.source.as_deref(), ops = redo_ops.len(), "undo");

        self.selection = record.selection_before;
        self.normalize_selection_in_place();

        self.redo_stack.push(UndoRecord {
            inverse_ops: redo_ops,
            ..record
        });
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(record) = self.redo_stack.pop() else {
            return false;
        };

        let Some(undo_ops) = self.replay(&record.inverse_ops, "redo") else {
            self.redo_stack.push(record);
            return false;
        };
        debug!(source = record.source.as_deref(), ops = undo_ops.len(), "redo");

        self.selection = record.selection_after;
        self.normalize_selection_in_place();

        self.undo_stack.push(UndoRecord {
            inverse_ops: undo_ops,
            ..record
        });
        true
    }

    /// Applies `ops` in order and returns their inverses, ready to replay.
    /// A failing op reverts everything applied before it.
    fn replay(&mut self, ops: &[Op], action: &str) -> Option<Vec<Op>> {
        let selection = self.selection;
        let mut inverse_ops: Vec<Op> = Vec::new();
        for op in ops.iter().cloned() {
            match self.apply_op(op) {
                Ok(inv) => inverse_ops.push(inv),
                Err(err) => {
                    warn!(
                        action,
                        error = %err,
                        applied = inverse_ops.len(),
                        "history step does not apply"
                    );
                    for inv in inverse_ops.into_iter().rev() {
                        let _ = self.apply_op(inv);
                    }
                    self.selection = selection;
                    return None;
                }
            }
        }
        inverse_ops.reverse();
        Some(inverse_ops)
    }

    /// Applies a raw host transaction (block inserts, removals, attribute
    /// patches) as one undo step.
    pub fn apply(&mut self, tx: Transaction) -> Result<(), ApplyError> {
        let selection_before = self.selection;

        let mut inverse_ops: Vec<Op> = Vec::new();
        for op in tx.ops.iter().cloned() {
            match self.apply_op(op) {
                Ok(inv) => inverse_ops.push(inv),
                Err(err) => {
                    for inv in inverse_ops.into_iter().rev() {
                        let _ = self.apply_op(inv);
                    }
                    self.selection = selection_before;
                    return Err(err);
                }
            }
        }
        inverse_ops.reverse();

        if let Some(sel) = tx.selection_after {
            self.selection = sel;
        }
        self.normalize_selection_in_place();

        self.push_undo(inverse_ops, selection_before, tx.meta.source);
        Ok(())
    }

    /// Runs `f` inside one scoped list transaction.
    ///
    /// Every write made through the [`Writer`] is visible to reads within the
    /// scope. If `f` fails (or panics) the writer rolls all of its writes back
    /// before the error leaves this call; otherwise the batch becomes a
    /// single undo step.
    pub fn change<T, E>(
        &mut self,
        source: &str,
        f: impl FnOnce(&mut Writer<'_>) -> Result<T, E>,
    ) -> Result<T, E> {
        let selection_before = self.selection;
        let mut writer = Writer::new(&mut self.doc, self.ids.as_mut());
        let value = f(&mut writer)?;
        let inverse_ops = writer.commit();

        debug!(source, ops = inverse_ops.len(), "committed list change");
        if inverse_ops.is_empty() {
            return Ok(value);
        }

        self.normalize_selection_in_place();
        self.push_undo(inverse_ops, selection_before, Some(source.to_string()));
        Ok(value)
    }

    pub fn run_command(&mut self, id: &str, args: Option<Value>) -> Result<(), CommandError> {
        let Some(command) = self.registry.command(id) else {
            return Err(CommandError::new(format!("Unknown command: {id}")));
        };
        (command.handler)(self, args)
    }

    pub fn run_query_json(&self, id: &str, args: Option<Value>) -> Result<Value, QueryError> {
        let Some(query) = self.registry.query(id) else {
            return Err(QueryError::new(format!("Unknown query: {id}")));
        };
        (query.handler)(self, args)
    }

    pub fn run_query<T>(&self, id: &str, args: Option<Value>) -> Result<T, QueryError>
    where
        T: DeserializeOwned,
    {
        let value = self.run_query_json(id, args)?;
        serde_json::from_value(value)
            .map_err(|err| QueryError::new(format!("Failed to decode query result: {err}")))
    }

    fn push_undo(
        &mut self,
        inverse_ops: Vec<Op>,
        selection_before: BlockSelection,
        source: Option<String>,
    ) {
        self.undo_stack.push(UndoRecord {
            inverse_ops,
            selection_before,
            selection_after: self.selection,
            source,
        });
        self.redo_stack.clear();
        if self.undo_stack.len() > self.config.max_undo {
            self.undo_stack.remove(0);
        }
    }

    fn normalize_selection_in_place(&mut self) {
        let last = self.doc.len().saturating_sub(1);
        self.selection.anchor = self.selection.anchor.min(last);
        self.selection.focus = self.selection.focus.min(last);
    }

    fn apply_op(&mut self, op: Op) -> Result<Op, ApplyError> {
        transform_selection(&mut self.selection, &op);
        apply_op_to(&mut self.doc, op)
    }
}

/// Scoped write access to a document.
///
/// Writes are applied immediately and their inverses recorded. Dropping a
/// writer that was not committed undoes every write it made, so a failed or
/// panicking edit never leaves a half-applied state behind.
pub struct Writer<'a> {
    doc: &'a mut Document,
    ids: &'a mut dyn IdGenerator,
    inverse_ops: Vec<Op>,
    committed: bool,
}

impl<'a> Writer<'a> {
    pub fn new(doc: &'a mut Document, ids: &'a mut dyn IdGenerator) -> Self {
        Self {
            doc,
            ids,
            inverse_ops: Vec::new(),
            committed: false,
        }
    }

    pub fn doc(&self) -> &Document {
        &*self.doc
    }

    pub fn generate_id(&mut self) -> ListItemId {
        self.ids.next_id()
    }

    pub fn set_attribute(
        &mut self,
        index: usize,
        key: impl Into<String>,
        value: Value,
    ) -> Result<(), ApplyError> {
        let mut set = Attrs::new();
        set.insert(key.into(), value);
        self.patch(
            index,
            AttrPatch {
                set,
                remove: Vec::new(),
            },
        )
    }

    pub fn remove_attribute(&mut self, index: usize, key: impl Into<String>) -> Result<(), ApplyError> {
        self.patch(
            index,
            AttrPatch {
                set: Attrs::new(),
                remove: vec![key.into()],
            },
        )
    }

    pub fn set_list_attrs(&mut self, index: usize, list: &ListAttrs) -> Result<(), ApplyError> {
        trace!(
            block = index,
            indent = list.indent,
            item_id = %list.item_id,
            "set list attributes"
        );
        self.patch(index, list.set_patch())
    }

    pub fn remove_list_attrs(&mut self, index: usize) -> Result<(), ApplyError> {
        trace!(block = index, "remove list attributes");
        self.patch(index, ListAttrs::removal_patch())
    }

    fn patch(&mut self, index: usize, patch: AttrPatch) -> Result<(), ApplyError> {
        let inv = apply_op_to(self.doc, Op::SetBlockAttrs { index, patch })?;
        self.inverse_ops.push(inv);
        Ok(())
    }

    /// Ends the scope and hands back the inverse ops, newest first.
    pub fn commit(mut self) -> Vec<Op> {
        self.committed = true;
        let mut inverse_ops = std::mem::take(&mut self.inverse_ops);
        inverse_ops.reverse();
        inverse_ops
    }
}

impl Drop for Writer<'_> {
    fn drop(&mut self) {
        if self.committed || self.inverse_ops.is_empty() {
            return;
        }
        debug!(ops = self.inverse_ops.len(), "rolling back list change");
        for op in self.inverse_ops.drain(..).rev() {
            let _ = apply_op_to(self.doc, op);
        }
    }
}

fn apply_op_to(doc: &mut Document, op: Op) -> Result<Op, ApplyError> {
    let len = doc.blocks.len();
    match op {
        Op::InsertBlock { index, block } => {
            if index > len {
                return Err(ApplyError::InvalidIndex { index, len });
            }
            doc.blocks.insert(index, block);
            Ok(Op::RemoveBlock { index })
        }
        Op::RemoveBlock { index } => {
            if index >= len {
                return Err(ApplyError::InvalidIndex { index, len });
            }
            let block = doc.blocks.remove(index);
            Ok(Op::InsertBlock { index, block })
        }
        Op::SetBlockAttrs { index, patch } => {
            let block = doc
                .blocks
                .get_mut(index)
                .ok_or(ApplyError::InvalidIndex { index, len })?;
            let old = patch_apply(&mut block.attrs, &patch);
            Ok(Op::SetBlockAttrs { index, patch: old })
        }
    }
}

fn transform_selection(selection: &mut BlockSelection, op: &Op) {
    for point in [&mut selection.anchor, &mut selection.focus] {
        match op {
            Op::InsertBlock { index, .. } if *point >= *index => *point += 1,
            Op::RemoveBlock { index } if *point > *index => *point -= 1,
            Op::RemoveBlock { index } if *point == *index => *point = index.saturating_sub(1),
            _ => {}
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApplyError {
    #[error("block index {index} is out of bounds (document has {len} blocks)")]
    InvalidIndex { index: usize, len: usize },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttrPatch {
    #[serde(default)]
    pub set: Attrs,
    #[serde(default)]
    pub remove: Vec<String>,
}

fn patch_apply(attrs: &mut Attrs, patch: &AttrPatch) -> AttrPatch {
    let mut old_set: Attrs = Attrs::new();
    let mut old_remove: Vec<String> = Vec::new();

    for (k, v) in &patch.set {
        if let Some(prev) = attrs.insert(k.clone(), v.clone()) {
            old_set.insert(k.clone(), prev);
        } else {
            old_remove.push(k.clone());
        }
    }

    for key in &patch.remove {
        if let Some(prev) = attrs.remove(key) {
            old_set.insert(key.clone(), prev);
        }
    }

    AttrPatch {
        set: old_set,
        remove: old_remove,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::ids::SequentialIdGenerator;

    #[test]
    fn patch_apply_returns_inverse() {
        let mut attrs = Attrs::new();
        attrs.insert("a".into(), json!(1));
        let mut set = Attrs::new();
        set.insert("a".into(), json!(2));
        set.insert("b".into(), json!(3));
        let inverse = patch_apply(&mut attrs, &AttrPatch { set, remove: vec![] });

        assert_eq!(attrs.get("a"), Some(&json!(2)));
        patch_apply(&mut attrs, &inverse);
        assert_eq!(attrs.get("a"), Some(&json!(1)));
        assert!(attrs.get("b").is_none());
    }

    #[test]
    fn uncommitted_writer_rolls_back_on_drop() {
        let mut doc = Document::new(vec![Block::paragraph("x")]);
        let mut ids = SequentialIdGenerator::new();
        {
            let mut writer = Writer::new(&mut doc, &mut ids);
            writer
                .set_list_attrs(0, &ListAttrs::bulleted(0, "a"))
                .unwrap();
            assert!(writer.doc().list(0).unwrap().is_some());
        }
        assert_eq!(doc.blocks[0], Block::paragraph("x"));
    }

    #[test]
    fn writer_rejects_out_of_range_index() {
        let mut doc = Document::default();
        let mut ids = SequentialIdGenerator::new();
        let mut writer = Writer::new(&mut doc, &mut ids);
        let err = writer.remove_list_attrs(4).unwrap_err();
        assert!(matches!(err, ApplyError::InvalidIndex { index: 4, len: 0 }));
    }

    #[test]
    fn writer_sets_and_removes_single_attributes() {
        let mut doc = Document::new(vec![Block::paragraph("x")]);
        let mut ids = SequentialIdGenerator::new();
        let mut writer = Writer::new(&mut doc, &mut ids);
        writer.set_attribute(0, "align", json!("center")).unwrap();
        writer.remove_attribute(0, "missing").unwrap();
        let inverse = writer.commit();

        assert_eq!(doc.blocks[0].attrs.get("align"), Some(&json!("center")));
        assert_eq!(inverse.len(), 2);
        for op in inverse {
            apply_op_to(&mut doc, op).unwrap();
        }
        assert_eq!(doc.blocks[0], Block::paragraph("x"));
    }

    #[test]
    fn stale_undo_step_leaves_document_untouched() {
        let mut editor = Editor::with_list_plugins();
        editor.undo_stack.push(UndoRecord {
            inverse_ops: vec![
                Op::SetBlockAttrs {
                    index: 0,
                    patch: ListAttrs::bulleted(0, "a").set_patch(),
                },
                Op::RemoveBlock { index: 9 },
            ],
            selection_before: BlockSelection::collapsed(0),
            selection_after: BlockSelection::collapsed(0),
            source: None,
        });

        assert!(!editor.undo());
        assert_eq!(editor.doc().blocks[0], Block::paragraph(""));
        assert!(editor.can_undo());
        assert!(!editor.can_redo());
    }

    #[test]
    fn editor_defaults() {
        let editor = Editor::with_list_plugins();
        assert_eq!(editor.config().max_undo, 200);
        assert!(editor.selection().is_collapsed());
        assert!(editor.registry().command("list.indent").is_some());
        assert!(!editor.can_undo());
    }

    #[test]
    fn remove_block_shifts_selection() {
        let mut selection = BlockSelection::range(1, 3);
        transform_selection(&mut selection, &Op::RemoveBlock { index: 0 });
        assert_eq!(selection, BlockSelection::range(0, 2));
    }
}
