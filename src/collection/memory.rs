//! In-memory collection.

use crate::collection::{ImageRecord, ImageSource};
use crate::util::{SimMatchError, SimMatchResult};
use std::collections::BTreeMap;

/// Collection held in memory, listed in ascending identity order.
///
/// The location of each record is `mem://<id>`.
#[derive(Clone, Debug, Default)]
pub struct MemoryCollection {
    items: BTreeMap<String, Vec<u8>>,
}

impl MemoryCollection {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an item.
    pub fn insert(&mut self, id: impl Into<String>, bytes: Vec<u8>) {
        self.items.insert(id.into(), bytes);
    }

    /// Builder-style insert.
    pub fn with(mut self, id: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(id, bytes);
        self
    }

    /// Removes an item, returning its bytes.
    pub fn remove(&mut self, id: &str) -> Option<Vec<u8>> {
        self.items.remove(id)
    }

    /// Returns the number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true when the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl ImageSource for MemoryCollection {
    fn list(&self) -> SimMatchResult<Vec<ImageRecord>> {
        Ok(self
            .items
            .keys()
            .map(|id| ImageRecord::new(id.clone(), format!("mem://{id}")))
            .collect())
    }

    fn read_bytes(&self, record: &ImageRecord) -> SimMatchResult<Vec<u8>> {
        self.items
            .get(&record.id)
            .cloned()
            .ok_or_else(|| SimMatchError::Source {
                reason: format!("no item named {}", record.id),
            })
    }
}
