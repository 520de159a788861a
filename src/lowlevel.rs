//! Low-level building blocks for custom pipelines.
//!
//! These expose score plans, kernels and the scanner for callers that manage
//! normalization and ranking themselves. Most users should prefer
//! `SimilaritySearch`.

pub use crate::kernel::scalar::SsimScalar;
#[cfg(feature = "simd")]
pub use crate::kernel::simd::SsimSimd;
pub use crate::kernel::Kernel;
pub use crate::score::{ChannelPlan, ScorePlan, SummedArea, WindowConstants};
pub use crate::search::scan::{ScanFailure, ScanOutcome, Scanner};
