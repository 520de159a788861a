//! SSIM kernel implementations.
//!
//! A kernel evaluates the mean windowed SSIM of one channel pair. Callers
//! check shapes and window size first, so kernels never fail.

use crate::score::{ChannelPlan, WindowConstants};

/// Kernel trait for per-channel SSIM evaluation.
pub trait Kernel {
    /// Mean SSIM over every fully contained window of the two channels.
    ///
    /// Both plans must have identical dimensions. When the window does not
    /// fit inside them there is nothing to average and the result is NaN.
    fn channel_mean(a: &ChannelPlan<'_>, b: &ChannelPlan<'_>, constants: &WindowConstants)
        -> f64;
}

/// Number of window positions as `(cols, rows)`, or `None` when the window
/// is larger than the plane.
pub(crate) fn window_grid(plan: &ChannelPlan<'_>, win: usize) -> Option<(usize, usize)> {
    let cols = (plan.width() + 1).checked_sub(win)?;
    let rows = (plan.height() + 1).checked_sub(win)?;
    if cols == 0 || rows == 0 {
        return None;
    }
    Some((cols, rows))
}

pub mod scalar;

#[cfg(feature = "simd")]
pub mod simd;
