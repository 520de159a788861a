//! Fixed-size, fixed-colorspace grids produced by the normalizer.
//!
//! Samples are `u8` in `0..=255` and stored planar: all of channel 0, then all
//! of channel 1, and so on. Each plane is row-major with `stride == width`, so
//! kernels can borrow a plane as an `ImageView` without copying.

use crate::image::ImageView;
use crate::util::{SimMatchError, SimMatchResult};
use std::fmt;

/// Color representation of a normalized grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ColorMode {
    /// Three channels: red, green, blue.
    #[default]
    Rgb,
    /// One luminance channel.
    Luma,
}

impl ColorMode {
    /// Number of channels in this mode.
    pub fn channels(self) -> usize {
        match self {
            ColorMode::Rgb => 3,
            ColorMode::Luma => 1,
        }
    }
}

/// Shape of a normalized grid: `(height, width, channels)` in array terms.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GridShape {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
}

impl fmt::Display for GridShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.height, self.width, self.channels)
    }
}

/// Owned normalized image grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NormalizedImage {
    data: Vec<u8>,
    width: usize,
    height: usize,
    color: ColorMode,
}

impl NormalizedImage {
    /// Builds a grid from planar data (`channels` consecutive planes).
    pub fn from_planar(
        data: Vec<u8>,
        width: usize,
        height: usize,
        color: ColorMode,
    ) -> SimMatchResult<Self> {
        let needed = plane_len(width, height)?
            .checked_mul(color.channels())
            .ok_or(SimMatchError::InvalidDimensions { width, height })?;
        if data.len() < needed {
            return Err(SimMatchError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        if data.len() > needed {
            return Err(SimMatchError::InvalidDimensions { width, height });
        }
        Ok(Self {
            data,
            width,
            height,
            color,
        })
    }

    /// Builds a grid from interleaved row-major data (`HWC`), as produced by
    /// the `image` crate's pixel buffers.
    pub fn from_interleaved(
        data: &[u8],
        width: usize,
        height: usize,
        color: ColorMode,
    ) -> SimMatchResult<Self> {
        let channels = color.channels();
        let plane = plane_len(width, height)?;
        let needed = plane
            .checked_mul(channels)
            .ok_or(SimMatchError::InvalidDimensions { width, height })?;
        if data.len() != needed {
            return Err(SimMatchError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }

        let mut planar = vec![0u8; needed];
        for (idx, pixel) in data.chunks_exact(channels).enumerate() {
            for (c, &value) in pixel.iter().enumerate() {
                planar[c * plane + idx] = value;
            }
        }
        Self::from_planar(planar, width, height, color)
    }

    /// Returns the grid width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the grid height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the color mode the grid was produced with.
    pub fn color(&self) -> ColorMode {
        self.color
    }

    /// Returns the number of channels.
    pub fn channels(&self) -> usize {
        self.color.channels()
    }

    /// Returns the `(width, height, channels)` shape.
    pub fn shape(&self) -> GridShape {
        GridShape {
            width: self.width,
            height: self.height,
            channels: self.channels(),
        }
    }

    /// Returns a borrowed view of one channel plane.
    pub fn plane(&self, channel: usize) -> Option<ImageView<'_, u8>> {
        if channel >= self.channels() {
            return None;
        }
        let len = self.width * self.height;
        let start = channel * len;
        let data = self.data.get(start..start + len)?;
        ImageView::from_slice(data, self.width, self.height).ok()
    }

    /// Returns the sample at column `x`, row `y`, channel `c`.
    pub fn get(&self, x: usize, y: usize, c: usize) -> Option<u8> {
        self.plane(c)?.get(x, y).copied()
    }

    /// Returns the planar backing buffer.
    pub fn as_planar(&self) -> &[u8] {
        &self.data
    }

    /// Returns the samples interleaved in `HWC` order.
    pub fn to_interleaved(&self) -> Vec<u8> {
        let channels = self.channels();
        let plane = self.width * self.height;
        let mut out = vec![0u8; self.data.len()];
        for c in 0..channels {
            for idx in 0..plane {
                out[idx * channels + c] = self.data[c * plane + idx];
            }
        }
        out
    }
}

fn plane_len(width: usize, height: usize) -> SimMatchResult<usize> {
    if width == 0 || height == 0 {
        return Err(SimMatchError::InvalidDimensions { width, height });
    }
    width
        .checked_mul(height)
        .ok_or(SimMatchError::InvalidDimensions { width, height })
}
