//! Staging uploaded files into a directory collection.

use crate::collection::ImageRecord;
use crate::trace::trace_warn;
use crate::util::{SimMatchError, SimMatchResult};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Reduces an untrusted file name to a safe, flat name.
///
/// Directory components are dropped, whitespace becomes `_`, characters other
/// than ASCII alphanumerics, `.`, `-` and `_` are removed, and leading or
/// trailing `.`/`_` are trimmed. An empty result becomes `upload`.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("");
    let cleaned: String = base
        .chars()
        .filter_map(|c| {
            if c.is_whitespace() {
                Some('_')
            } else if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                Some(c)
            } else {
                None
            }
        })
        .collect();
    let trimmed = cleaned.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        "upload".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Writes `bytes` into `dir` as `<timestamp>_<sanitized name>`.
///
/// Never overwrites: an existing file with the same name is an error. The
/// caller supplies the timestamp so this stays free of clock access.
pub fn stage_upload(
    dir: &Path,
    original_name: &str,
    bytes: &[u8],
    timestamp: &str,
) -> SimMatchResult<ImageRecord> {
    if bytes.is_empty() {
        return Err(SimMatchError::Source {
            reason: "refusing to stage an empty upload".to_string(),
        });
    }
    let stamp = sanitize_file_name(timestamp);
    let name = format!("{stamp}_{}", sanitize_file_name(original_name));
    let path = dir.join(&name);
    write_new(&path, |file| {
        file.write_all(bytes)?;
        file.sync_all()
    })?;
    Ok(ImageRecord::new(name, path.display().to_string()))
}

/// Creates `path` exclusively and fills it with `fill`.
///
/// A failed fill removes the file again, so no partial upload is left for
/// later scans to trip over.
fn write_new<F>(path: &Path, fill: F) -> SimMatchResult<()>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    if let Err(err) = fill(&mut file) {
        drop(file);
        if let Err(cleanup) = fs::remove_file(path) {
            trace_warn!(
                "stage_cleanup_failed",
                path = path.display().to_string().as_str(),
                reason = cleanup.to_string().as_str()
            );
        }
        return Err(err.into());
    }
    Ok(())
}
