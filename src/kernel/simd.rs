//! SIMD-accelerated kernel using the `wide` crate.
//!
//! Window sums are still read from the integer tables one lane at a time; the
//! SSIM formula itself runs on four windows per step with `f64x4`. Lane
//! arithmetic is the same IEEE sequence as `window_ssim`, and row values are
//! reduced left to right, so results equal the scalar kernel bit for bit.

use crate::kernel::{window_grid, Kernel};
use crate::score::{window_ssim, ChannelPlan, SummedArea, WindowConstants};
use wide::f64x4;

const LANES: usize = 4;

#[inline]
fn gather(table: &SummedArea, x: usize, y: usize, win: usize) -> f64x4 {
    f64x4::from([
        table.window_sum(x, y, win) as f64,
        table.window_sum(x + 1, y, win) as f64,
        table.window_sum(x + 2, y, win) as f64,
        table.window_sum(x + 3, y, win) as f64,
    ])
}

/// SIMD SSIM kernel.
pub struct SsimSimd;

impl Kernel for SsimSimd {
    fn channel_mean(
        a: &ChannelPlan<'_>,
        b: &ChannelPlan<'_>,
        constants: &WindowConstants,
    ) -> f64 {
        let win = constants.win_size;
        let Some((cols, rows)) = window_grid(a, win) else {
            return f64::NAN;
        };
        let cross = SummedArea::products(a.view(), b.view());

        let np = f64x4::splat(constants.np);
        let cov_norm = f64x4::splat(constants.cov_norm);
        let c1 = f64x4::splat(constants.c1);
        let c2 = f64x4::splat(constants.c2);
        let two = f64x4::splat(2.0);

        let simd_end = cols / LANES * LANES;
        let mut row_values = vec![0.0f64; cols];
        let mut total = 0.0f64;
        for y in 0..rows {
            let mut x = 0;
            while x < simd_end {
                let ux = gather(a.sum(), x, y, win) / np;
                let uy = gather(b.sum(), x, y, win) / np;
                let uxx = gather(a.sum_sq(), x, y, win) / np;
                let uyy = gather(b.sum_sq(), x, y, win) / np;
                let uxy = gather(&cross, x, y, win) / np;
                let vx = cov_norm * (uxx - ux * ux);
                let vy = cov_norm * (uyy - uy * uy);
                let vxy = cov_norm * (uxy - ux * uy);

                let a1 = two * ux * uy + c1;
                let a2 = two * vxy + c2;
                let b1 = ux * ux + uy * uy + c1;
                let b2 = vx + vy + c2;
                let s = (a1 * a2) / (b1 * b2);
                row_values[x..x + LANES].copy_from_slice(&s.to_array());
                x += LANES;
            }

            // Scalar remainder
            while x < cols {
                row_values[x] = window_ssim(
                    a.sum().window_sum(x, y, win) as f64,
                    b.sum().window_sum(x, y, win) as f64,
                    a.sum_sq().window_sum(x, y, win) as f64,
                    b.sum_sq().window_sum(x, y, win) as f64,
                    cross.window_sum(x, y, win) as f64,
                    constants,
                );
                x += 1;
            }

            let mut row_sum = 0.0f64;
            for &value in &row_values {
                row_sum += value;
            }
            total += row_sum;
        }
        total / (rows * cols) as f64
    }
}
