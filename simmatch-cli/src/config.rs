//! JSON configuration for the `search` subcommand.

use serde::Deserialize;
use simmatch::{
    ColorMode, NormalizeConfig, RankConfig, ResizeFilter, ScanBudget, ScanOptions, SearchConfig,
    SsimParams, TieBreak,
};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorConfig {
    Rgb,
    Luma,
}

impl From<ColorConfig> for ColorMode {
    fn from(value: ColorConfig) -> Self {
        match value {
            ColorConfig::Rgb => ColorMode::Rgb,
            ColorConfig::Luma => ColorMode::Luma,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterConfig {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl From<FilterConfig> for ResizeFilter {
    fn from(value: FilterConfig) -> Self {
        match value {
            FilterConfig::Nearest => ResizeFilter::Nearest,
            FilterConfig::Triangle => ResizeFilter::Triangle,
            FilterConfig::CatmullRom => ResizeFilter::CatmullRom,
            FilterConfig::Gaussian => ResizeFilter::Gaussian,
            FilterConfig::Lanczos3 => ResizeFilter::Lanczos3,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreakConfig {
    Identity,
    Location,
}

impl From<TieBreakConfig> for TieBreak {
    fn from(value: TieBreakConfig) -> Self {
        match value {
            TieBreakConfig::Identity => TieBreak::Identity,
            TieBreakConfig::Location => TieBreak::Location,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct NormalizeConfigJson {
    width: usize,
    height: usize,
    color: ColorConfig,
    filter: FilterConfig,
}

impl Default for NormalizeConfigJson {
    fn default() -> Self {
        let cfg = NormalizeConfig::default();
        Self {
            width: cfg.width,
            height: cfg.height,
            color: ColorConfig::Rgb,
            filter: FilterConfig::CatmullRom,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SsimConfigJson {
    win_size: usize,
    k1: f64,
    k2: f64,
    data_range: f64,
    sample_covariance: bool,
}

impl Default for SsimConfigJson {
    fn default() -> Self {
        let cfg = SsimParams::default();
        Self {
            win_size: cfg.win_size,
            k1: cfg.k1,
            k2: cfg.k2,
            data_range: cfg.data_range,
            sample_covariance: cfg.sample_covariance,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RankConfigJson {
    score_tolerance: f64,
    tie_break: TieBreakConfig,
}

impl Default for RankConfigJson {
    fn default() -> Self {
        Self {
            score_tolerance: RankConfig::default().score_tolerance,
            tie_break: TieBreakConfig::Identity,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ScanConfigJson {
    parallel: bool,
    max_items: Option<usize>,
    deadline_ms: Option<u64>,
}

impl Default for ScanConfigJson {
    fn default() -> Self {
        Self {
            parallel: true,
            max_items: None,
            deadline_ms: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub collection_dir: PathBuf,
    pub query_path: PathBuf,
    pub threshold: f64,
    pub exclude: Option<String>,
    /// Copy the query into the collection before searching and exclude it.
    pub stage_query: bool,
    pub output_path: Option<PathBuf>,
    pub bundle_path: Option<PathBuf>,
    normalize: NormalizeConfigJson,
    ssim: SsimConfigJson,
    rank: RankConfigJson,
    scan: ScanConfigJson,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            collection_dir: PathBuf::new(),
            query_path: PathBuf::new(),
            threshold: 0.8,
            exclude: None,
            stage_query: false,
            output_path: None,
            bundle_path: None,
            normalize: NormalizeConfigJson::default(),
            ssim: SsimConfigJson::default(),
            rank: RankConfigJson::default(),
            scan: ScanConfigJson::default(),
        }
    }
}

impl Config {
    /// Builds the library configuration; validation happens in the library.
    pub fn search_config(&self) -> SearchConfig {
        SearchConfig {
            normalize: NormalizeConfig {
                width: self.normalize.width,
                height: self.normalize.height,
                color: self.normalize.color.into(),
                filter: self.normalize.filter.into(),
            },
            ssim: SsimParams {
                win_size: self.ssim.win_size,
                k1: self.ssim.k1,
                k2: self.ssim.k2,
                data_range: self.ssim.data_range,
                sample_covariance: self.ssim.sample_covariance,
            },
            rank: RankConfig {
                score_tolerance: self.rank.score_tolerance,
                tie_break: self.rank.tie_break.into(),
            },
            scan: ScanOptions {
                parallel: self.scan.parallel,
                budget: ScanBudget {
                    max_items: self.scan.max_items,
                    deadline: self.scan.deadline_ms.map(Duration::from_millis),
                },
            },
        }
    }
}
