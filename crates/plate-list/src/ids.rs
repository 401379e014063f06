//! List item identifiers.
//!
//! A `ListItemId` is an opaque string. Blocks that share one id (at one
//! indent, separated only by deeper blocks) form a single list item. New ids
//! come from an [`IdGenerator`] owned by the host editor, so tests can swap
//! in a deterministic sequence.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListItemId(String);

impl ListItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ListItemId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ListItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Source of fresh, collision-free list item ids.
pub trait IdGenerator: Send {
    fn next_id(&mut self) -> ListItemId;
}

/// Random ids: `e` followed by the 32 hex digits of a UUIDv4.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn next_id(&mut self) -> ListItemId {
        ListItemId(format!("e{}", uuid::Uuid::new_v4().simple()))
    }
}

/// Deterministic ids in the same shape as [`UuidIdGenerator`]:
/// `e00000000000000000000000000000000`, `e00000000000000000000000000000001`, ...
#[derive(Debug, Default, Clone)]
pub struct SequentialIdGenerator {
    next: u128,
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(next: u128) -> Self {
        Self { next }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&mut self) -> ListItemId {
        let id = ListItemId(format!("e{:032x}", self.next));
        self.next += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_ids_are_padded_and_increment() {
        let mut ids = SequentialIdGenerator::new();
        assert_eq!(ids.next_id().as_str(), "e00000000000000000000000000000000");
        assert_eq!(ids.next_id().as_str(), "e00000000000000000000000000000001");
    }

    #[test]
    fn uuid_ids_do_not_repeat() {
        let mut ids = UuidIdGenerator;
        let a = ids.next_id();
        let b = ids.next_id();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 33);
        assert!(a.as_str().starts_with('e'));
    }
}
