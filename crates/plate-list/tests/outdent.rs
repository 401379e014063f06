use plate_list::{
    Block, BlockSelection, Document, EditOptions, Editor, ListAttrs, PluginRegistry,
    SequentialIdGenerator, indent_blocks, outdent_blocks,
};
use serde_json::json;

fn editor(lines: &[&str]) -> Editor {
    let doc = Document::from_markup(&lines.join("\n")).unwrap();
    Editor::new(doc, BlockSelection::collapsed(0), PluginRegistry::list())
        .with_id_generator(SequentialIdGenerator::new())
}

fn fresh(n: u128) -> String {
    format!("e{n:032x}")
}

fn outdent(editor: &mut Editor, blocks: &[usize], options: EditOptions) -> Vec<usize> {
    editor
        .change("test", |writer| outdent_blocks(writer, blocks, options))
        .unwrap()
}

#[test]
fn top_level_items_stop_being_list_blocks() {
    let mut editor = editor(&["* a", "  a2", "* b"]);

    let changed = outdent(&mut editor, &[0], EditOptions::expanded());

    assert_eq!(changed, vec![0, 1]);
    assert_eq!(
        editor.doc().to_markup().unwrap(),
        ["a", "a2", "* b"].join("\n")
    );
}

#[test]
fn last_nested_run_becomes_a_new_sibling() {
    let mut editor = editor(&["* a {id:a}", "  * b {id:b}", "* c {id:c}"]);

    let changed = outdent(&mut editor, &[1], EditOptions::default());

    assert_eq!(changed, vec![1]);
    assert_eq!(
        editor.doc().to_markup_with_ids().unwrap(),
        [
            "* a {id:a}".to_string(),
            format!("* b {{id:{}}}", fresh(0)),
            "* c {id:c}".to_string(),
        ]
        .join("\n")
    );
}

#[test]
fn nested_run_followed_by_parent_content_merges_into_the_parent() {
    let mut editor = editor(&["* a {id:a}", "  * b {id:b}", "  a2", "* c {id:c}"]);

    let changed = outdent(&mut editor, &[1], EditOptions::default());

    assert_eq!(changed, vec![1]);
    assert_eq!(
        editor.doc().to_markup_with_ids().unwrap(),
        ["* a {id:a}", "  b {id:a}", "  a2 {id:a}", "* c {id:c}"].join("\n")
    );
}

#[test]
fn merge_moves_deeper_levels_up_with_it() {
    let mut editor = editor(&["* a {id:a}", "  * b {id:b}", "    * c {id:c}", "  a2"]);

    let changed = outdent(&mut editor, &[1], EditOptions::expanded());

    assert_eq!(changed, vec![1, 2]);
    assert_eq!(
        editor.doc().to_markup_with_ids().unwrap(),
        ["* a {id:a}", "  b {id:a}", "  * c {id:c}", "  a2 {id:a}"].join("\n")
    );
}

#[test]
fn one_new_id_per_outdented_item() {
    let mut editor = editor(&["* a {id:a}", "  * b {id:b}", "    b2", "  * d {id:d}", "* c {id:c}"]);

    let changed = outdent(&mut editor, &[1, 2, 3], EditOptions::expanded());

    assert_eq!(changed, vec![1, 2, 3]);
    assert_eq!(
        editor.doc().to_markup_with_ids().unwrap(),
        [
            "* a {id:a}".to_string(),
            format!("* b {{id:{}}}", fresh(0)),
            format!("  b2 {{id:{}}}", fresh(0)),
            format!("* d {{id:{}}}", fresh(1)),
            "* c {id:c}".to_string(),
        ]
        .join("\n")
    );
}

#[test]
fn merge_reports_blocks_outside_the_selection() {
    let mut editor = editor(&[
        "* a {id:a}",
        "  * b {id:b}",
        "    * x {id:x}",
        "    b2",
        "  a2",
    ]);

    let changed = outdent(&mut editor, &[1], EditOptions::default());

    assert_eq!(changed, vec![1, 3]);
    let doc = editor.doc();
    assert_eq!(doc.list(1).unwrap(), Some(ListAttrs::bulleted(0, "a")));
    assert_eq!(doc.list(3).unwrap(), Some(ListAttrs::bulleted(0, "a")));
    assert_eq!(doc.list(2).unwrap(), Some(ListAttrs::bulleted(2, "x")));
}

#[test]
fn plain_blocks_in_the_selection_are_ignored() {
    let mut editor = editor(&["p", "* a"]);

    let changed = outdent(&mut editor, &[0, 1], EditOptions::default());

    assert_eq!(changed, vec![1]);
    assert_eq!(editor.doc().to_markup().unwrap(), ["p", "a"].join("\n"));
}

#[test]
fn selection_without_list_blocks_records_nothing() {
    let mut editor = editor(&["p", "q"]);

    let changed = outdent(&mut editor, &[0, 1], EditOptions::expanded());

    assert!(changed.is_empty());
    assert!(!editor.can_undo());
}

#[test]
fn outdent_then_indent_restores_depth() {
    let mut editor = editor(&["* a {id:a}", "  * b {id:b}", "* c {id:c}"]);

    outdent(&mut editor, &[1], EditOptions::default());
    editor
        .change("test", |writer| {
            indent_blocks(writer, &[1], EditOptions::default())
        })
        .unwrap();

    assert_eq!(editor.doc().list(1).unwrap().map(|l| l.indent), Some(1));
    assert_eq!(
        editor.doc().to_markup().unwrap(),
        ["* a", "  * b", "* c"].join("\n")
    );
}

#[test]
fn removal_keeps_other_attributes() {
    let doc = Document::new(vec![
        Block::list_item("a", ListAttrs::numbered(0, "a")).with_attr("align", json!("right")),
    ]);
    let mut editor = Editor::new(doc, BlockSelection::collapsed(0), PluginRegistry::list());

    outdent(&mut editor, &[0], EditOptions::default());

    let block = &editor.doc().blocks[0];
    assert_eq!(editor.doc().list(0).unwrap(), None);
    assert_eq!(block.attrs.len(), 1);
    assert_eq!(block.attrs.get("align"), Some(&json!("right")));
}

#[test]
fn outdent_command_uses_the_selection() {
    let mut editor = editor(&["* a", "  * b", "  * c", "* d"]);

    editor.set_selection(BlockSelection::range(1, 2));
    editor.run_command("list.outdent", None).unwrap();

    assert_eq!(
        editor.doc().to_markup().unwrap(),
        ["* a", "* b", "* c", "* d"].join("\n")
    );
    assert_eq!(editor.doc().list(1).unwrap().map(|l| l.item_id.to_string()), Some(fresh(0)));
    assert_eq!(editor.doc().list(2).unwrap().map(|l| l.item_id.to_string()), Some(fresh(1)));
}
