//! SimMatch is a brute-force perceptual image similarity search.
//!
//! Images are normalized to a fixed grid, compared with windowed structural
//! similarity (SSIM) per channel, filtered by an inclusive threshold and
//! ranked deterministically. Collections are read through the `ImageSource`
//! trait; per-candidate parallelism is available via the `rayon` feature and
//! a SIMD scoring kernel via `simd`.

pub mod collection;
pub mod image;
pub mod kernel;
pub mod lowlevel;
pub mod normalize;
pub mod score;
pub mod search;
mod trace;
pub mod util;

pub use crate::image::io;
pub use crate::image::{ColorMode, GridShape, ImageView, NormalizedImage};
pub use collection::{DirCollection, ImageRecord, ImageSource, MemoryCollection};
pub use normalize::{NormalizeConfig, Normalizer, ResizeFilter};
pub use score::{Scorer, SsimParams};
pub use search::{
    rank, FailureKind, FailureReport, Match, RankConfig, ScanBudget, ScanOptions, ScanStats,
    SearchConfig, SearchResult, SimilaritySearch, Threshold, TieBreak,
};
pub use util::{SimMatchError, SimMatchResult};
