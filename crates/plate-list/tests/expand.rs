use plate_list::{Document, expand_to_complete_items};

fn doc(lines: &[&str]) -> Document {
    Document::from_markup(&lines.join("\n")).unwrap()
}

#[test]
fn selection_grows_to_both_boundary_items() {
    let doc = doc(&["* a", "  a2", "* b", "  b2", "* c"]);

    assert_eq!(
        expand_to_complete_items(&doc, &[1, 2]).unwrap(),
        vec![0, 1, 2, 3]
    );
    assert_eq!(expand_to_complete_items(&doc, &[4]).unwrap(), vec![4]);
}

#[test]
fn expansion_takes_the_nested_subtree_of_the_last_item() {
    let doc = doc(&["* a", "  * b", "    * c", "* d"]);

    assert_eq!(expand_to_complete_items(&doc, &[0]).unwrap(), vec![0, 1, 2]);
}

#[test]
fn nested_selection_stays_at_its_level() {
    let doc = doc(&["* a", "  * b", "  * c", "* d"]);

    assert_eq!(expand_to_complete_items(&doc, &[1]).unwrap(), vec![1]);
    assert_eq!(expand_to_complete_items(&doc, &[1, 2]).unwrap(), vec![1, 2]);
}

#[test]
fn nested_first_block_expands_to_its_owner() {
    let doc = doc(&["* a", "  * b", "* c", "  c2"]);

    assert_eq!(
        expand_to_complete_items(&doc, &[1, 2]).unwrap(),
        vec![0, 1, 2, 3]
    );
}

#[test]
fn item_split_by_nested_content_is_taken_whole() {
    let doc = doc(&["* a", "  * x", "  a2", "* b"]);

    assert_eq!(expand_to_complete_items(&doc, &[2]).unwrap(), vec![0, 1, 2]);
    assert_eq!(expand_to_complete_items(&doc, &[0]).unwrap(), vec![0, 1, 2]);
}

#[test]
fn selection_without_list_blocks_is_unchanged() {
    let doc = doc(&["p", "q", "* a"]);

    assert_eq!(expand_to_complete_items(&doc, &[0, 1]).unwrap(), vec![0, 1]);
    assert!(expand_to_complete_items(&doc, &[]).unwrap().is_empty());
}

#[test]
fn plain_edges_are_kept() {
    let doc = doc(&["p", "* a", "  a2", "q"]);

    assert_eq!(
        expand_to_complete_items(&doc, &[0, 1]).unwrap(),
        vec![0, 1, 2]
    );
    assert_eq!(
        expand_to_complete_items(&doc, &[2, 3]).unwrap(),
        vec![1, 2, 3]
    );
}

#[test]
fn expansion_is_idempotent() {
    let doc = doc(&["* a", "  * b", "  a2", "* c", "  * d", "    * e", "p"]);

    for start in 0..doc.len() {
        for end in start..doc.len() {
            let selection: Vec<usize> = (start..=end).collect();
            let once = expand_to_complete_items(&doc, &selection).unwrap();
            let twice = expand_to_complete_items(&doc, &once).unwrap();
            assert_eq!(once, twice, "selection {start}..={end}");
        }
    }
}
