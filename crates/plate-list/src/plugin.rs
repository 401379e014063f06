use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::core::Editor;
use crate::list::{
    EditOptions, ListError, all_item_blocks, expand_to_complete_items, indent_blocks,
    is_first_block_of_item, is_single_item_selected, merge_item_before, nested_blocks,
    outdent_blocks, remove_list_attributes, sibling_items, split_item_before,
};

#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct CommandError {
    message: String,
}

impl CommandError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<ListError> for CommandError {
    fn from(err: ListError) -> Self {
        CommandError::new(err.to_string())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct QueryError {
    message: String,
}

impl QueryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<ListError> for QueryError {
    fn from(err: ListError) -> Self {
        QueryError::new(err.to_string())
    }
}

type CommandHandler =
    Arc<dyn Fn(&mut Editor, Option<Value>) -> Result<(), CommandError> + Send + Sync>;
type QueryHandler = Arc<dyn Fn(&Editor, Option<Value>) -> Result<Value, QueryError> + Send + Sync>;

#[derive(Clone)]
pub struct CommandSpec {
    pub id: String,
    pub label: String,
    pub description: Option<String>,
    pub keywords: Vec<String>,
    pub args_example: Option<Value>,
    pub handler: CommandHandler,
}

impl CommandSpec {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        handler: impl Fn(&mut Editor, Option<Value>) -> Result<(), CommandError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            description: None,
            keywords: Vec::new(),
            args_example: None,
            handler: Arc::new(handler),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn args_example(mut self, args_example: Value) -> Self {
        self.args_example = Some(args_example);
        self
    }
}

#[derive(Clone)]
pub struct QuerySpec {
    pub id: String,
    pub handler: QueryHandler,
}

impl QuerySpec {
    pub fn new(
        id: impl Into<String>,
        handler: impl Fn(&Editor, Option<Value>) -> Result<Value, QueryError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            handler: Arc::new(handler),
        }
    }
}

pub trait PlatePlugin: Send + Sync {
    fn id(&self) -> &'static str;
    fn commands(&self) -> Vec<CommandSpec> {
        Vec::new()
    }
    fn queries(&self) -> Vec<QuerySpec> {
        Vec::new()
    }
}

#[derive(Default)]
pub struct PluginRegistry {
    commands: HashMap<String, CommandSpec>,
    queries: HashMap<String, QuerySpec>,
}

impl PluginRegistry {
    pub fn new(plugins: impl IntoIterator<Item = Box<dyn PlatePlugin>>) -> Result<Self, String> {
        let mut registry = Self::default();
        for plugin in plugins {
            registry.register_plugin(plugin)?;
        }
        Ok(registry)
    }

    pub fn list() -> Self {
        let plugins: Vec<Box<dyn PlatePlugin>> = vec![Box::new(ListPlugin)];
        Self::new(plugins).expect("list registry must be valid")
    }

    pub fn register_plugin(&mut self, plugin: Box<dyn PlatePlugin>) -> Result<(), String> {
        for cmd in plugin.commands() {
            if self.commands.contains_key(&cmd.id) {
                return Err(format!("Duplicate command id: {}", cmd.id));
            }
            self.commands.insert(cmd.id.clone(), cmd);
        }

        for query in plugin.queries() {
            if self.queries.contains_key(&query.id) {
                return Err(format!("Duplicate query id: {}", query.id));
            }
            self.queries.insert(query.id.clone(), query);
        }

        Ok(())
    }

    pub fn commands(&self) -> &HashMap<String, CommandSpec> {
        &self.commands
    }

    pub fn command(&self, id: &str) -> Option<CommandSpec> {
        self.commands.get(id).cloned()
    }

    pub fn queries(&self) -> &HashMap<String, QuerySpec> {
        &self.queries
    }

    pub fn query(&self, id: &str) -> Option<QuerySpec> {
        self.queries.get(id).cloned()
    }
}

pub struct ListPlugin;

impl PlatePlugin for ListPlugin {
    fn id(&self) -> &'static str {
        "list"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("list.indent", "Indent list items", |editor, args| {
                let options = edit_options(args)?;
                let blocks = editor.selection().blocks();
                editor.change("command:list.indent", |writer| {
                    indent_blocks(writer, &blocks, options)
                })?;
                Ok(())
            })
            .description("Nest the selected list items one level deeper.")
            .keywords(["list", "indent", "nest"])
            .args_example(serde_json::json!({ "expand": true })),
            CommandSpec::new("list.outdent", "Outdent list items", |editor, args| {
                let options = edit_options(args)?;
                let blocks = editor.selection().blocks();
                editor.change("command:list.outdent", |writer| {
                    outdent_blocks(writer, &blocks, options)
                })?;
                Ok(())
            })
            .description("Move the selected list items one level up.")
            .keywords(["list", "outdent", "unindent"])
            .args_example(serde_json::json!({ "expand": true })),
            CommandSpec::new("list.split_item", "Split list item", |editor, _args| {
                split_at_focus(editor)
            })
            .description("Start a new list item at the focused block.")
            .keywords(["list", "split"]),
            CommandSpec::new("list.merge_backward", "Merge list item", |editor, _args| {
                merge_focus_backward(editor)
            })
            .description("Fold the focused list item into the item before it.")
            .keywords(["list", "merge", "join"]),
            CommandSpec::new("list.remove", "Remove list", |editor, _args| {
                let blocks = expand_to_complete_items(editor.doc(), &editor.selection().blocks())?;
                editor.change("command:list.remove", |writer| {
                    remove_list_attributes(writer, &blocks)
                })?;
                Ok(())
            })
            .description("Convert the selected list items back to paragraphs.")
            .keywords(["list", "remove", "paragraph"]),
        ]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![
            QuerySpec::new("list.item_blocks", |editor, _args| {
                let focus = editor.selection().focus;
                Ok(serde_json::json!(all_item_blocks(editor.doc(), focus)?))
            }),
            QuerySpec::new("list.nested_blocks", |editor, _args| {
                let focus = editor.selection().focus;
                Ok(serde_json::json!(nested_blocks(editor.doc(), focus)?))
            }),
            QuerySpec::new("list.items", |editor, _args| {
                let focus = editor.selection().focus;
                Ok(serde_json::json!(sibling_items(editor.doc(), focus)?))
            }),
            QuerySpec::new("list.is_single_item_selected", |editor, _args| {
                let blocks = editor.selection().blocks();
                Ok(Value::Bool(is_single_item_selected(editor.doc(), &blocks)?))
            }),
            QuerySpec::new("list.active_type", |editor, _args| {
                let focus = editor.selection().focus;
                Ok(match editor.doc().list(focus)? {
                    Some(attrs) => Value::String(attrs.list_type.as_ref().to_string()),
                    None => Value::Null,
                })
            }),
        ]
    }
}

#[derive(Debug, Default, Deserialize)]
struct EditArgs {
    #[serde(default)]
    expand: Option<bool>,
}

fn edit_options(args: Option<Value>) -> Result<EditOptions, CommandError> {
    let args: EditArgs = match args {
        Some(value) => serde_json::from_value(value)
            .map_err(|err| CommandError::new(format!("Invalid arguments: {err}")))?,
        None => EditArgs::default(),
    };
    Ok(EditOptions {
        expand: args.expand.unwrap_or(true),
    })
}

fn split_at_focus(editor: &mut Editor) -> Result<(), CommandError> {
    let focus = editor.selection().focus;
    if editor.doc().list(focus)?.is_none() {
        return Err(CommandError::new("Focused block is not a list item"));
    }
    if is_first_block_of_item(editor.doc(), focus)? {
        return Err(CommandError::new(
            "Focused block already starts its list item",
        ));
    }
    editor.change("command:list.split_item", |writer| {
        split_item_before(writer, focus)
    })?;
    Ok(())
}

fn merge_focus_backward(editor: &mut Editor) -> Result<(), CommandError> {
    let doc = editor.doc();
    let focus = editor.selection().focus;
    let Some(attrs) = doc.list(focus)? else {
        return Err(CommandError::new("Focused block is not a list item"));
    };
    let target = all_item_blocks(doc, focus)?
        .first()
        .copied()
        .unwrap_or(focus);

    let mut reference = None;
    for candidate in (0..target).rev() {
        match doc.list(candidate)? {
            Some(prev) if prev.indent > attrs.indent => continue,
            Some(_) => reference = Some(candidate),
            None => {}
        }
        break;
    }
    let Some(reference) = reference else {
        return Err(CommandError::new("No list item to merge with"));
    };

    editor.change("command:list.merge_backward", |writer| {
        merge_item_before(writer, target, reference)
    })?;
    Ok(())
}
