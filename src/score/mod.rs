//! Windowed structural similarity (SSIM) between normalized grids.
//!
//! For each fully contained `win x win` window the local means, variances and
//! covariance of the two grids are combined as
//!
//! ```text
//! S = (2 mx my + C1) (2 sxy + C2) / ((mx^2 + my^2 + C1) (sx^2 + sy^2 + C2))
//! ```
//!
//! with `C1 = (k1 L)^2` and `C2 = (k2 L)^2`. The score is the mean of `S` over
//! windows, computed per channel and averaged over channels. Every term is
//! symmetric in the two inputs and evaluates to exactly 1 for identical grids.

use crate::image::NormalizedImage;
use crate::kernel::Kernel;
use crate::trace::trace_error;
use crate::util::math::clamp_score;
use crate::util::{SimMatchError, SimMatchResult};

mod plan;

pub use plan::{ChannelPlan, ScorePlan, SummedArea};

#[cfg(not(feature = "simd"))]
use crate::kernel::scalar::SsimScalar as ActiveKernel;
#[cfg(feature = "simd")]
use crate::kernel::simd::SsimSimd as ActiveKernel;

/// SSIM parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SsimParams {
    /// Side length of the square sliding window (odd, at least 3).
    pub win_size: usize,
    /// Luminance stabilizer coefficient.
    pub k1: f64,
    /// Contrast stabilizer coefficient.
    pub k2: f64,
    /// Dynamic range `L` of the samples.
    pub data_range: f64,
    /// Use the unbiased (N - 1) variance estimate inside windows.
    pub sample_covariance: bool,
}

impl Default for SsimParams {
    fn default() -> Self {
        Self {
            win_size: 7,
            k1: 0.01,
            k2: 0.03,
            data_range: 255.0,
            sample_covariance: true,
        }
    }
}

impl SsimParams {
    /// Checks parameter ranges.
    pub fn validate(&self) -> SimMatchResult<()> {
        if self.win_size < 3 || self.win_size % 2 == 0 {
            return Err(SimMatchError::InvalidConfig(
                "win_size must be odd and at least 3",
            ));
        }
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.k1) || !positive(self.k2) {
            return Err(SimMatchError::InvalidConfig("k1 and k2 must be positive"));
        }
        if !positive(self.data_range) {
            return Err(SimMatchError::InvalidConfig("data_range must be positive"));
        }
        Ok(())
    }

    /// Derives the per-window constants used by kernels.
    pub fn constants(&self) -> WindowConstants {
        let np = (self.win_size * self.win_size) as f64;
        let cov_norm = if self.sample_covariance {
            np / (np - 1.0)
        } else {
            1.0
        };
        WindowConstants {
            win_size: self.win_size,
            np,
            cov_norm,
            c1: (self.k1 * self.data_range).powi(2),
            c2: (self.k2 * self.data_range).powi(2),
        }
    }
}

/// Derived per-window constants shared by the kernels.
#[derive(Clone, Copy, Debug)]
pub struct WindowConstants {
    pub win_size: usize,
    pub np: f64,
    pub cov_norm: f64,
    pub c1: f64,
    pub c2: f64,
}

/// Computes similarity scores between normalized grids.
#[derive(Clone, Debug)]
pub struct Scorer {
    params: SsimParams,
}

impl Scorer {
    /// Creates a scorer after validating `params`.
    pub fn new(params: SsimParams) -> SimMatchResult<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Returns the SSIM parameters.
    pub fn params(&self) -> &SsimParams {
        &self.params
    }

    /// Scores two grids; the result lies in `[-1, 1]`.
    pub fn score(&self, a: &NormalizedImage, b: &NormalizedImage) -> SimMatchResult<f64> {
        let plan_a = ScorePlan::new(a)?;
        let plan_b = ScorePlan::new(b)?;
        self.score_plans(&plan_a, &plan_b)
    }

    /// Scores two precomputed plans.
    pub fn score_plans(&self, a: &ScorePlan<'_>, b: &ScorePlan<'_>) -> SimMatchResult<f64> {
        self.score_plans_with::<ActiveKernel>(a, b)
    }

    /// Scores two plans with an explicit kernel.
    pub fn score_plans_with<K: Kernel>(
        &self,
        a: &ScorePlan<'_>,
        b: &ScorePlan<'_>,
    ) -> SimMatchResult<f64> {
        let left = a.shape();
        let right = b.shape();
        if left != right {
            trace_error!(
                "shape_mismatch",
                left = left.to_string().as_str(),
                right = right.to_string().as_str()
            );
            return Err(SimMatchError::ShapeMismatch { left, right });
        }
        if left.width < self.params.win_size || left.height < self.params.win_size {
            return Err(SimMatchError::InvalidConfig(
                "normalized size is smaller than the SSIM window",
            ));
        }

        let constants = self.params.constants();
        let mut total = 0.0f64;
        for (ca, cb) in a.channels().iter().zip(b.channels()) {
            total += K::channel_mean(ca, cb, &constants);
        }
        Ok(clamp_score(total / left.channels as f64))
    }
}

/// SSIM of one window from exact integer sums.
///
/// Shared by all kernels so per-window values are bit-identical across them.
#[inline]
pub(crate) fn window_ssim(
    sum_a: f64,
    sum_b: f64,
    sum_aa: f64,
    sum_bb: f64,
    sum_ab: f64,
    k: &WindowConstants,
) -> f64 {
    let ux = sum_a / k.np;
    let uy = sum_b / k.np;
    let uxx = sum_aa / k.np;
    let uyy = sum_bb / k.np;
    let uxy = sum_ab / k.np;
    let vx = k.cov_norm * (uxx - ux * ux);
    let vy = k.cov_norm * (uyy - uy * uy);
    let vxy = k.cov_norm * (uxy - ux * uy);

    let a1 = 2.0 * ux * uy + k.c1;
    let a2 = 2.0 * vxy + k.c2;
    let b1 = ux * ux + uy * uy + k.c1;
    let b2 = vx + vy + k.c2;
    (a1 * a2) / (b1 * b2)
}
