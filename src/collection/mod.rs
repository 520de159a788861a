//! Image collections: the records a scan iterates over.
//!
//! The core only reads through `ImageSource`. Records are never modified or
//! removed during a scan; sources that ingest concurrently must hand out
//! consistent snapshots.

mod dir;
mod memory;
mod stage;

pub use dir::DirCollection;
pub use memory::MemoryCollection;
pub use stage::{sanitize_file_name, stage_upload};

use crate::util::SimMatchResult;

/// One stored image.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ImageRecord {
    /// Identity, unique within a collection.
    pub id: String,
    /// Where the image lives; opaque to the core.
    pub location: String,
}

impl ImageRecord {
    /// Creates a record.
    pub fn new(id: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            location: location.into(),
        }
    }
}

/// Read-only access to an image collection.
pub trait ImageSource: Send + Sync {
    /// Lists every record. Identities must be unique within one listing.
    fn list(&self) -> SimMatchResult<Vec<ImageRecord>>;

    /// Reads the encoded bytes of `record`.
    fn read_bytes(&self, record: &ImageRecord) -> SimMatchResult<Vec<u8>>;
}

impl<S: ImageSource + ?Sized> ImageSource for &S {
    fn list(&self) -> SimMatchResult<Vec<ImageRecord>> {
        (**self).list()
    }

    fn read_bytes(&self, record: &ImageRecord) -> SimMatchResult<Vec<u8>> {
        (**self).read_bytes(record)
    }
}
