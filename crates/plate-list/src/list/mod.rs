//! The list-structure engine.
//!
//! Lists are not stored as a tree. Each block carries a `(type, indent, id)`
//! triple and every query here rebuilds the structure it needs with a linear
//! scan over the flat block sequence. Reads go `scan` -> `resolve` ->
//! `expand`; only `mutate` writes, and only through a [`Writer`] scope.
//!
//! [`Writer`]: crate::core::Writer

mod attrs;
mod expand;
mod mutate;
mod resolve;
mod scan;

pub use attrs::*;
pub use expand::*;
pub use mutate::*;
pub use resolve::*;
pub use scan::*;

use crate::core::ApplyError;

#[derive(Debug, thiserror::Error)]
pub enum ListError {
    #[error("block {index} has invalid list attributes: {reason}")]
    InvalidListBlock { index: usize, reason: String },
    #[error("block index {index} is out of range (document has {len} blocks)")]
    BlockOutOfRange { index: usize, len: usize },
    #[error(transparent)]
    Apply(#[from] ApplyError),
}

impl ListError {
    pub fn invalid(index: usize, reason: impl Into<String>) -> Self {
        ListError::InvalidListBlock {
            index,
            reason: reason.into(),
        }
    }
}
