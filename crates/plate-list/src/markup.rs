//! A compact text notation for list documents.
//!
//! ```text
//! paragraph
//! * bulleted item
//!   continuation block of that item
//!   # numbered item nested one level deeper {id:x}
//! ```
//!
//! Each non-empty line is one block and two spaces are one nesting level.
//! `* ` starts a bulleted item and `# ` a numbered one at the line's depth.
//! An unmarked line at depth `d > 0` continues the closest item at indent
//! `d - 1`; at depth 0 it is a plain paragraph. Ids default to the block's
//! zero-padded index and can be set with a trailing `{id:...}`.

use crate::core::{Block, Document};
use crate::list::{ListAttrs, ListError, ListType, is_first_block_of_item};

#[derive(Debug, thiserror::Error)]
pub enum MarkupError {
    #[error("line {line}: indentation must be a multiple of two spaces")]
    OddIndent { line: usize },
    #[error("line {line}: no list item at indent {indent} to continue")]
    OrphanContinuation { line: usize, indent: u32 },
}

impl Document {
    pub fn from_markup(markup: &str) -> Result<Self, MarkupError> {
        let mut blocks: Vec<Block> = Vec::new();
        let mut lists: Vec<Option<ListAttrs>> = Vec::new();

        for (ix, line) in markup.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let line_no = ix + 1;
            let rest = line.trim_start_matches(' ');
            let spaces = line.len() - rest.len();
            if spaces % 2 != 0 {
                return Err(MarkupError::OddIndent { line: line_no });
            }
            let depth = (spaces / 2) as u32;

            let (marker, rest) = split_marker(rest);
            let (text, explicit_id) = split_id(rest);

            let list = match marker {
                Some(list_type) => {
                    let id = explicit_id
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("{:03}", blocks.len()));
                    Some(ListAttrs::new(list_type, depth, id))
                }
                None if depth > 0 => {
                    let indent = depth - 1;
                    let owner = lists
                        .iter()
                        .rev()
                        .map_while(|list| list.as_ref())
                        .find(|list| list.indent <= indent)
                        .filter(|list| list.indent == indent)
                        .ok_or(MarkupError::OrphanContinuation {
                            line: line_no,
                            indent,
                        })?;
                    let owner = match explicit_id {
                        Some(id) => owner.with_item_id(id.into()),
                        None => owner.clone(),
                    };
                    Some(owner)
                }
                None => None,
            };

            blocks.push(match &list {
                Some(list) => Block::list_item(text, list.clone()),
                None => Block::paragraph(text),
            });
            lists.push(list);
        }

        Ok(Document::new(blocks))
    }

    /// Renders the document back into markup. Item ids are not written; a
    /// block that continues an item is shown as a continuation line.
    pub fn to_markup(&self) -> Result<String, ListError> {
        self.render(false)
    }

    /// Like [`Document::to_markup`], with `{id:...}` on every list line.
    pub fn to_markup_with_ids(&self) -> Result<String, ListError> {
        self.render(true)
    }

    fn render(&self, with_ids: bool) -> Result<String, ListError> {
        let mut lines = Vec::with_capacity(self.len());
        for (index, block) in self.blocks.iter().enumerate() {
            let Some(list) = self.list(index)? else {
                lines.push(block.text.clone());
                continue;
            };

            let mut line = if is_first_block_of_item(self, index)? {
                let marker = match list.list_type {
                    ListType::Bulleted => '*',
                    ListType::Numbered => '#',
                };
                format!("{}{marker} {}", "  ".repeat(list.indent as usize), block.text)
            } else {
                format!("{}{}", "  ".repeat(list.indent as usize + 1), block.text)
            };
            if with_ids {
                line.push_str(&format!(" {{id:{}}}", list.item_id));
            }
            lines.push(line);
        }
        Ok(lines.join("\n"))
    }
}

fn split_marker(rest: &str) -> (Option<ListType>, &str) {
    if let Some(text) = rest.strip_prefix("* ") {
        (Some(ListType::Bulleted), text)
    } else if let Some(text) = rest.strip_prefix("# ") {
        (Some(ListType::Numbered), text)
    } else {
        (None, rest)
    }
}

fn split_id(text: &str) -> (&str, Option<&str>) {
    if let Some(body) = text.strip_suffix('}')
        && let Some(pos) = body.rfind("{id:")
    {
        return (body[..pos].trim_end(), Some(&body[pos + 4..]));
    }
    (text, None)
}
