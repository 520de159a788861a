//! Summed-area tables for windowed statistics.
//!
//! All tables hold exact integer sums (`u64`), so every window sum is exact and
//! independent of evaluation order. Only the final SSIM formula runs in
//! floating point.

use crate::image::{GridShape, ImageView, NormalizedImage};
use crate::util::{SimMatchError, SimMatchResult};

/// Integral image with one row and column of zero padding.
#[derive(Clone, Debug)]
pub struct SummedArea {
    width: usize,
    height: usize,
    table: Vec<u64>,
}

impl SummedArea {
    fn build<F>(width: usize, height: usize, value: F) -> Self
    where
        F: Fn(usize, usize) -> u64,
    {
        let stride = width + 1;
        let mut table = vec![0u64; stride * (height + 1)];
        for y in 0..height {
            let mut row_sum = 0u64;
            for x in 0..width {
                row_sum += value(x, y);
                table[(y + 1) * stride + x + 1] = table[y * stride + x + 1] + row_sum;
            }
        }
        Self {
            width,
            height,
            table,
        }
    }

    /// Table of plain sample values.
    pub fn values(view: ImageView<'_, u8>) -> Self {
        Self::from_rows(view, view, |a, _| u64::from(a))
    }

    /// Table of squared sample values.
    pub fn squares(view: ImageView<'_, u8>) -> Self {
        Self::from_rows(view, view, |a, _| u64::from(a) * u64::from(a))
    }

    /// Table of pointwise products of two same-sized views.
    ///
    /// Callers must check dimensions first; the product is commutative, so
    /// `products(a, b)` and `products(b, a)` are identical.
    pub fn products(a: ImageView<'_, u8>, b: ImageView<'_, u8>) -> Self {
        Self::from_rows(a, b, |va, vb| u64::from(va) * u64::from(vb))
    }

    fn from_rows<F>(a: ImageView<'_, u8>, b: ImageView<'_, u8>, op: F) -> Self
    where
        F: Fn(u8, u8) -> u64,
    {
        let width = a.width().min(b.width());
        let height = a.height().min(b.height());
        Self::build(width, height, |x, y| {
            let va = a.get(x, y).copied().unwrap_or(0);
            let vb = b.get(x, y).copied().unwrap_or(0);
            op(va, vb)
        })
    }

    /// Returns the source width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the source height.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Sum over the `size x size` window with top-left corner `(x, y)`.
    ///
    /// The window must lie inside the source.
    #[inline]
    pub fn window_sum(&self, x: usize, y: usize, size: usize) -> u64 {
        let stride = self.width + 1;
        let top = y * stride;
        let bottom = (y + size) * stride;
        let d = self.table[bottom + x + size];
        let a = self.table[top + x];
        let b = self.table[top + x + size];
        let c = self.table[bottom + x];
        d + a - b - c
    }
}

/// Precomputed per-channel tables for one image.
#[derive(Clone, Debug)]
pub struct ChannelPlan<'a> {
    view: ImageView<'a, u8>,
    sum: SummedArea,
    sum_sq: SummedArea,
}

impl<'a> ChannelPlan<'a> {
    /// Builds the value and square tables for one channel plane.
    pub fn new(view: ImageView<'a, u8>) -> Self {
        Self {
            view,
            sum: SummedArea::values(view),
            sum_sq: SummedArea::squares(view),
        }
    }

    /// Returns the channel plane.
    pub fn view(&self) -> ImageView<'a, u8> {
        self.view
    }

    /// Returns the plane width.
    pub fn width(&self) -> usize {
        self.view.width()
    }

    /// Returns the plane height.
    pub fn height(&self) -> usize {
        self.view.height()
    }

    /// Returns the table of sample values.
    pub fn sum(&self) -> &SummedArea {
        &self.sum
    }

    /// Returns the table of squared sample values.
    pub fn sum_sq(&self) -> &SummedArea {
        &self.sum_sq
    }
}

/// Precomputed tables for every channel of a normalized image.
///
/// A scan builds the query's plan once and reuses it for every candidate.
#[derive(Clone, Debug)]
pub struct ScorePlan<'a> {
    shape: GridShape,
    channels: Vec<ChannelPlan<'a>>,
}

impl<'a> ScorePlan<'a> {
    /// Builds a plan borrowing the planes of `img`.
    pub fn new(img: &'a NormalizedImage) -> SimMatchResult<Self> {
        let shape = img.shape();
        let mut channels = Vec::with_capacity(shape.channels);
        for c in 0..shape.channels {
            let view = img.plane(c).ok_or(SimMatchError::InvalidDimensions {
                width: shape.width,
                height: shape.height,
            })?;
            channels.push(ChannelPlan::new(view));
        }
        Ok(Self { shape, channels })
    }

    /// Returns the shape of the planned image.
    pub fn shape(&self) -> GridShape {
        self.shape
    }

    /// Returns the per-channel plans in channel order.
    pub fn channels(&self) -> &[ChannelPlan<'a>] {
        &self.channels
    }
}
