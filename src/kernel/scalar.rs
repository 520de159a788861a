//! Scalar reference kernel.

use crate::kernel::{window_grid, Kernel};
use crate::score::{window_ssim, ChannelPlan, SummedArea, WindowConstants};

/// Scalar SSIM kernel over summed-area tables.
pub struct SsimScalar;

impl Kernel for SsimScalar {
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

        let mut total = 0.0f64;
        for y in 0..rows {
            let mut row_sum = 0.0f64;
            for x in 0..cols {
                row_sum += window_ssim(
                    a.sum().window_sum(x, y, win) as f64,
                    b.sum().window_sum(x, y, win) as f64,
                    a.sum_sq().window_sum(x, y, win) as f64,
                    b.sum_sq().window_sum(x, y, win) as f64,
                    cross.window_sum(x, y, win) as f64,
                    constants,
                );
            }
            total += row_sum;
        }
        total / (rows * cols) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::SsimScalar;
    use crate::kernel::Kernel;
    use crate::score::{ChannelPlan, SsimParams};
    use crate::ImageView;

    fn window_stats(a: &[f64], b: &[f64]) -> (f64, f64, f64, f64, f64) {
        let n = a.len() as f64;
        let ma = a.iter().sum::<f64>() / n;
        let mb = b.iter().sum::<f64>() / n;
        let mut va = 0.0;
        let mut vb = 0.0;
        let mut cov = 0.0;
        for (x, y) in a.iter().zip(b) {
            va += (x - ma) * (x - ma);
            vb += (y - mb) * (y - mb);
            cov += (x - ma) * (y - mb);
        }
        // Unbiased estimates, matching `sample_covariance = true`.
        (ma, mb, va / (n - 1.0), vb / (n - 1.0), cov / (n - 1.0))
    }

    #[test]
    fn scalar_matches_direct_two_pass_ssim() {
        let width = 11;
        let height = 9;
        let a: Vec<u8> = (0..width * height)
            .map(|i| ((i * 37 + (i / width) * 11) % 256) as u8)
            .collect();
        let b: Vec<u8> = (0..width * height)
            .map(|i| ((i * 29 + 5 * (i % width)) % 256) as u8)
            .collect();
        let va = ImageView::from_slice(&a, width, height).unwrap();
        let vb = ImageView::from_slice(&b, width, height).unwrap();
        let params = SsimParams::default();
        let k = params.constants();

        let got = SsimScalar::channel_mean(&ChannelPlan::new(va), &ChannelPlan::new(vb), &k);

        let win = params.win_size;
        let mut total = 0.0;
        let mut count = 0usize;
        for y in 0..=height - win {
            for x in 0..=width - win {
                let mut wa = Vec::new();
                let mut wb = Vec::new();
                for dy in 0..win {
                    for dx in 0..win {
                        wa.push(f64::from(*va.get(x + dx, y + dy).unwrap()));
                        wb.push(f64::from(*vb.get(x + dx, y + dy).unwrap()));
                    }
                }
                let (ma, mb, sa, sb, sab) = window_stats(&wa, &wb);
                let s = ((2.0 * ma * mb + k.c1) * (2.0 * sab + k.c2))
                    / ((ma * ma + mb * mb + k.c1) * (sa + sb + k.c2));
                total += s;
                count += 1;
            }
        }
        let expected = total / count as f64;
        assert!((got - expected).abs() < 1e-9, "got {got}, expected {expected}");
    }

    #[test]
    fn inverted_plane_scores_negative() {
        let width = 12;
        let height = 12;
        let a: Vec<u8> = (0..width * height).map(|i| ((i * 53) % 256) as u8).collect();
        let b: Vec<u8> = a.iter().map(|v| 255 - v).collect();
        let va = ImageView::from_slice(&a, width, height).unwrap();
        let vb = ImageView::from_slice(&b, width, height).unwrap();
        let k = SsimParams::default().constants();
        let score = SsimScalar::channel_mean(&ChannelPlan::new(va), &ChannelPlan::new(vb), &k);
        assert!(score < 0.0);
    }

    #[test]
    fn plane_smaller_than_window_has_no_mean() {
        let data = [7u8; 25];
        let view = ImageView::from_slice(&data, 5, 5).unwrap();
        let plan = ChannelPlan::new(view);
        let k = SsimParams::default().constants();
        assert!(SsimScalar::channel_mean(&plan, &plan, &k).is_nan());
    }
}
