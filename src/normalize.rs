//! Image normalization: decode, convert color, resize to a fixed grid.
//!
//! Every image compared in one search must pass through the same
//! `NormalizeConfig`; the resulting grids then share a shape and a color mode
//! and are directly comparable by the scorer.

use crate::image::io::decode;
use crate::image::{ColorMode, NormalizedImage};
use crate::util::{SimMatchError, SimMatchResult};
use ::image::imageops::{self, FilterType};
use ::image::DynamicImage;

/// Interpolation used when resizing to the normalized resolution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResizeFilter {
    Nearest,
    /// Bilinear.
    Triangle,
    /// Bicubic.
    #[default]
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl From<ResizeFilter> for FilterType {
    fn from(value: ResizeFilter) -> Self {
        match value {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Normalization parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NormalizeConfig {
    /// Target width in pixels.
    pub width: usize,
    /// Target height in pixels.
    pub height: usize,
    /// Target color mode.
    pub color: ColorMode,
    /// Resize interpolation.
    pub filter: ResizeFilter,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            width: 100,
            height: 100,
            color: ColorMode::Rgb,
            filter: ResizeFilter::CatmullRom,
        }
    }
}

impl NormalizeConfig {
    /// Checks that the target size is usable.
    pub fn validate(&self) -> SimMatchResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(SimMatchError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if u32::try_from(self.width).is_err() || u32::try_from(self.height).is_err() {
            return Err(SimMatchError::InvalidConfig(
                "normalized size must fit in u32",
            ));
        }
        Ok(())
    }
}

/// Turns encoded bytes into `NormalizedImage`s with a fixed configuration.
#[derive(Clone, Debug)]
pub struct Normalizer {
    cfg: NormalizeConfig,
}

impl Normalizer {
    /// Creates a normalizer after validating its configuration.
    pub fn new(cfg: NormalizeConfig) -> SimMatchResult<Self> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    /// Returns the normalization parameters.
    pub fn config(&self) -> &NormalizeConfig {
        &self.cfg
    }

    /// Decodes `bytes` and normalizes the result.
    pub fn normalize(&self, bytes: &[u8]) -> SimMatchResult<NormalizedImage> {
        let img = decode(bytes)?;
        self.normalize_image(&img)
    }

    /// Normalizes an already decoded image.
    pub fn normalize_image(&self, img: &DynamicImage) -> SimMatchResult<NormalizedImage> {
        let width = self.cfg.width;
        let height = self.cfg.height;
        let (w, h) = (width as u32, height as u32);
        let filter = FilterType::from(self.cfg.filter);

        // Color conversion happens before resampling so every source format
        // goes through the same interpolation path.
        match self.cfg.color {
            ColorMode::Rgb => {
                let rgb = img.to_rgb8();
                let resized = imageops::resize(&rgb, w, h, filter);
                NormalizedImage::from_interleaved(resized.as_raw(), width, height, ColorMode::Rgb)
            }
            ColorMode::Luma => {
                let gray = img.to_luma8();
                let resized = imageops::resize(&gray, w, h, filter);
                NormalizedImage::from_interleaved(resized.as_raw(), width, height, ColorMode::Luma)
            }
        }
    }
}
