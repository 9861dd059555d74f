//! Injectable unique-id generation.

use std::sync::atomic::{AtomicUsize, Ordering};

use uuid::Uuid;

/// Source of fresh unique identifiers (capture ids, delivery ids).
pub trait IdGenerator: Send + Sync {
    fn new_id(&self) -> String;
}

/// Generates real UUIDv4 textual ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn new_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Returns ids from a fixed, cyclical sequence.
pub struct SequenceIdGenerator {
    ids: Vec<String>,
    next: AtomicUsize,
}

impl SequenceIdGenerator {
    pub fn new(ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
            next: AtomicUsize::new(0),
        }
    }

    /// Always returns the same id.
    pub fn single(id: impl Into<String>) -> Self {
        Self::new([id.into()])
    }
}

impl IdGenerator for SequenceIdGenerator {
    fn new_id(&self) -> String {
        let i = self.next.fetch_add(1, Ordering::SeqCst);
        self.ids[i % self.ids.len()].clone()
    }
}
