//! Decoding helpers built on the `image` crate.
//!
//! Formats are limited to those enabled in `Cargo.toml` (PNG, JPEG, BMP, GIF).
//! The format is guessed from the content, never from a file name.

use crate::util::{SimMatchError, SimMatchResult};
use ::image::DynamicImage;
use std::path::Path;

/// Decodes an encoded image held in memory.
pub fn decode(bytes: &[u8]) -> SimMatchResult<DynamicImage> {
    if bytes.is_empty() {
        return Err(SimMatchError::Decode {
            reason: "empty input".to_string(),
        });
    }
    ::image::load_from_memory(bytes).map_err(|err| SimMatchError::Decode {
        reason: err.to_string(),
    })
}

/// Reads and decodes an image file.
pub fn load_path<P: AsRef<Path>>(path: P) -> SimMatchResult<DynamicImage> {
    let bytes = std::fs::read(path.as_ref())?;
    decode(&bytes)
}
