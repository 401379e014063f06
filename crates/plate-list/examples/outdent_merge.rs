//! Walks through the two outcomes of outdenting a nested list item.
//!
//! Run with `RUST_LOG=plate_list=debug` to see the engine's events.

use anyhow::{Context as _, Result};
use plate_list::{BlockSelection, Document, Editor, PluginRegistry, SequentialIdGenerator};
use tracing_subscriber::{EnvFilter, fmt};

fn outdent(title: &str, markup: &str, focus: usize) -> Result<()> {
    let doc = Document::from_markup(markup).context("parse markup")?;
    let mut editor = Editor::new(doc, BlockSelection::collapsed(focus), PluginRegistry::list())
        .with_id_generator(SequentialIdGenerator::new());

    println!("== {title}");
    println!("{}\n", editor.doc().to_markup_with_ids()?);

    editor.run_command("list.outdent", None)?;
    println!("{}\n", editor.doc().to_markup_with_ids()?);

    editor.undo();
    println!("after undo:\n{}\n", editor.doc().to_markup_with_ids()?);
    Ok(())
}

fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    outdent(
        "last nested item becomes a sibling",
        "* a {id:a}\n  * b {id:b}\n* c {id:c}",
        1,
    )?;
    outdent(
        "nested item followed by parent content joins the parent",
        "* a {id:a}\n  * b {id:b}\n  a2\n* c {id:c}",
        1,
    )?;
    Ok(())
}
