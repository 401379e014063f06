use serde::{Deserialize, Serialize};

use crate::core::Document;
use crate::list::ListError;

const DEFAULT_SCHEMA: &str = "plate-list";
const DEFAULT_VERSION: u32 = 1;

fn default_schema() -> String {
    DEFAULT_SCHEMA.to_string()
}

fn default_version() -> u32 {
    DEFAULT_VERSION
}

#[derive(Debug, thiserror::Error)]
pub enum ValueError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("unsupported schema {schema:?} version {version}")]
    Unsupported { schema: String, version: u32 },
    #[error(transparent)]
    List(#[from] ListError),
}

/// The persisted form of a list document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListValue {
    #[serde(default = "default_schema")]
    pub schema: String,
    #[serde(default = "default_version")]
    pub version: u32,
    pub document: Document,
}

impl ListValue {
    pub fn from_document(document: Document) -> Self {
        Self {
            schema: default_schema(),
            version: default_version(),
            document,
        }
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parses a value and checks that every block carries a complete list
    /// triple or none at all.
    pub fn from_json_str(s: &str) -> Result<Self, ValueError> {
        let value: Self = serde_json::from_str(s)?;
        if value.schema != DEFAULT_SCHEMA || value.version > DEFAULT_VERSION {
            return Err(ValueError::Unsupported {
                schema: value.schema,
                version: value.version,
            });
        }
        for index in 0..value.document.len() {
            value.document.list(index)?;
        }
        Ok(value)
    }
}
