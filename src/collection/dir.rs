//! Directory-backed collection.

use crate::collection::{ImageRecord, ImageSource};
use crate::trace::trace_warn;
use crate::util::{SimMatchError, SimMatchResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Collection of the regular files directly inside one directory.
///
/// Identities are file names; listings are sorted by name. Subdirectories
/// are ignored and files whose names are not valid UTF-8 are skipped.
#[derive(Clone, Debug)]
pub struct DirCollection {
    root: PathBuf,
}

impl DirCollection {
    /// Opens an existing directory.
    pub fn open<P: AsRef<Path>>(root: P) -> SimMatchResult<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(SimMatchError::Source {
                reason: format!("{} is not a directory", root.display()),
            });
        }
        Ok(Self { root })
    }

    /// Returns the directory path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the path of the file backing `id`.
    pub fn path_of(&self, id: &str) -> SimMatchResult<PathBuf> {
        let is_plain_name = Path::new(id).file_name().and_then(|n| n.to_str()) == Some(id);
        if !is_plain_name {
            return Err(SimMatchError::Source {
                reason: format!("identity {id:?} is not a plain file name"),
            });
        }
        Ok(self.root.join(id))
    }
}

impl ImageSource for DirCollection {
    fn list(&self) -> SimMatchResult<Vec<ImageRecord>> {
        let mut records = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let path = entry.path();
            // Follows symlinks, unlike `DirEntry::file_type`.
            let is_file = fs::metadata(&path).map(|m| m.is_file()).unwrap_or(false);
            if !is_file {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                trace_warn!("skip_non_utf8_name", path = path.display().to_string().as_str());
                continue;
            };
            records.push(ImageRecord::new(name, path.display().to_string()));
        }
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }

    fn read_bytes(&self, record: &ImageRecord) -> SimMatchResult<Vec<u8>> {
        let path = self.path_of(&record.id)?;
        Ok(fs::read(path)?)
    }
}
