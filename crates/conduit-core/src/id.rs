use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a grid (connected run of connectors) inside one group.
    pub struct GridId;
}

/// Identifies a group (connected component) in a graph. Cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupId(pub u32);

/// Identifies the dimension (world) a network lives in. Carried on fault reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Dim(pub i32);

/// Hands out group ids from a monotonically increasing counter.
///
/// Ids are never handed out twice by the same allocator, so a live group can
/// never share its id with another.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counting from `first` instead of zero.
    pub fn starting_at(first: u32) -> Self {
        Self { next: first }
    }

    /// Allocate a fresh id.
    pub fn next_id(&mut self) -> GroupId {
        let id = GroupId(self.next);
        self.next += 1;
        id
    }

    /// The id the next call to [`next_id`](Self::next_id) will return.
    pub fn peek(&self) -> GroupId {
        GroupId(self.next)
    }
}
