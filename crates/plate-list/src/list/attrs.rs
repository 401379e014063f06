use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, EnumString};

use crate::core::{AttrPatch, Attrs};
use crate::ids::ListItemId;
use crate::list::ListError;

pub const LIST_TYPE: &str = "list_type";
pub const LIST_INDENT: &str = "list_indent";
pub const LIST_ITEM_ID: &str = "list_item_id";

pub const LIST_KEYS: [&str; 3] = [LIST_TYPE, LIST_INDENT, LIST_ITEM_ID];

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ListType {
    #[default]
    Bulleted,
    Numbered,
}

/// The list-scoped attribute triple of one block.
///
/// Blocks carry either all three attributes or none of them. Reading and
/// writing always goes through this type so a block never ends up with a
/// partial triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListAttrs {
    pub list_type: ListType,
    pub indent: u32,
    pub item_id: ListItemId,
}

impl ListAttrs {
    pub fn new(list_type: ListType, indent: u32, item_id: impl Into<ListItemId>) -> Self {
        Self {
            list_type,
            indent,
            item_id: item_id.into(),
        }
    }

    pub fn bulleted(indent: u32, item_id: impl Into<ListItemId>) -> Self {
        Self::new(ListType::Bulleted, indent, item_id)
    }

    pub fn numbered(indent: u32, item_id: impl Into<ListItemId>) -> Self {
        Self::new(ListType::Numbered, indent, item_id)
    }

    pub fn with_indent(&self, indent: u32) -> Self {
        Self {
            indent,
            ..self.clone()
        }
    }

    pub fn with_item_id(&self, item_id: ListItemId) -> Self {
        Self {
            item_id,
            ..self.clone()
        }
    }

    /// Same indent and same item id, i.e. both blocks belong to one item.
    pub fn same_item(&self, other: &ListAttrs) -> bool {
        self.indent == other.indent && self.item_id == other.item_id
    }

    /// Decodes the triple of the block at `index`.
    pub fn read(index: usize, attrs: &Attrs) -> Result<Option<Self>, ListError> {
        let list_type = attrs.get(LIST_TYPE);
        let indent = attrs.get(LIST_INDENT);
        let item_id = attrs.get(LIST_ITEM_ID);

        let (list_type, indent, item_id) = match (list_type, indent, item_id) {
            (None, None, None) => return Ok(None),
            (Some(t), Some(i), Some(id)) => (t, i, id),
            _ => {
                return Err(ListError::invalid(
                    index,
                    "list attributes must be set together",
                ));
            }
        };

        let list_type = list_type
            .as_str()
            .and_then(|s| ListType::from_str(s).ok())
            .ok_or_else(|| ListError::invalid(index, format!("unknown list type {list_type}")))?;
        let indent = indent
            .as_u64()
            .and_then(|i| u32::try_from(i).ok())
            .ok_or_else(|| ListError::invalid(index, format!("bad list indent {indent}")))?;
        let item_id = item_id
            .as_str()
            .map(ListItemId::new)
            .ok_or_else(|| ListError::invalid(index, format!("bad list item id {item_id}")))?;

        Ok(Some(Self {
            list_type,
            indent,
            item_id,
        }))
    }

    pub fn set_patch(&self) -> AttrPatch {
        let mut set = Attrs::new();
        set.insert(
            LIST_TYPE.to_string(),
            Value::String(self.list_type.as_ref().to_string()),
        );
        set.insert(LIST_INDENT.to_string(), Value::from(self.indent));
        set.insert(
            LIST_ITEM_ID.to_string(),
            Value::String(self.item_id.as_str().to_string()),
        );
        AttrPatch {
            set,
            remove: Vec::new(),
        }
    }

    pub fn removal_patch() -> AttrPatch {
        AttrPatch {
            set: Attrs::new(),
            remove: LIST_KEYS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn attrs(pairs: &[(&str, Value)]) -> Attrs {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn reads_complete_triple() {
        let a = attrs(&[
            (LIST_TYPE, json!("numbered")),
            (LIST_INDENT, json!(2)),
            (LIST_ITEM_ID, json!("x")),
            ("align", json!("right")),
        ]);
        assert_eq!(
            ListAttrs::read(0, &a).unwrap(),
            Some(ListAttrs::numbered(2, "x"))
        );
    }

    #[test]
    fn plain_block_has_no_triple() {
        let a = attrs(&[("align", json!("right"))]);
        assert_eq!(ListAttrs::read(0, &a).unwrap(), None);
    }

    #[test]
    fn partial_triple_is_rejected() {
        let a = attrs(&[(LIST_INDENT, json!(0))]);
        let err = ListAttrs::read(3, &a).unwrap_err();
        assert!(matches!(err, ListError::InvalidListBlock { index: 3, .. }));
    }

    #[test]
    fn negative_indent_is_rejected() {
        let a = attrs(&[
            (LIST_TYPE, json!("bulleted")),
            (LIST_INDENT, json!(-1)),
            (LIST_ITEM_ID, json!("a")),
        ]);
        assert!(ListAttrs::read(0, &a).is_err());
    }

    #[test]
    fn set_patch_writes_every_key() {
        let patch = ListAttrs::bulleted(1, "a").set_patch();
        assert_eq!(patch.set.get(LIST_TYPE), Some(&json!("bulleted")));
        assert_eq!(patch.set.get(LIST_INDENT), Some(&json!(1)));
        assert_eq!(patch.set.get(LIST_ITEM_ID), Some(&json!("a")));
        assert_eq!(ListAttrs::removal_patch().remove.len(), 3);
    }
}
