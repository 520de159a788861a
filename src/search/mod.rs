//! Query-level similarity search.
//!
//! `SimilaritySearch` ties the pieces together: validate the threshold,
//! normalize the query, scan the collection, rank what passed.

pub mod rank;
pub mod scan;

pub use rank::{rank, Match, RankConfig, TieBreak};
pub use scan::{
    FailureKind, FailureReport, ScanBudget, ScanFailure, ScanOptions, ScanOutcome, ScanStats,
    Scanner,
};

use crate::collection::ImageSource;
use crate::image::NormalizedImage;
use crate::normalize::{NormalizeConfig, Normalizer};
use crate::score::{Scorer, SsimParams};
use crate::trace::{trace_event, trace_span};
use crate::util::math::in_score_range;
use crate::util::{SimMatchError, SimMatchResult};

/// A validated similarity threshold in `[-1, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Threshold(f64);

impl Threshold {
    /// Validates `value`; out-of-range and non-finite values are rejected,
    /// never clamped.
    pub fn new(value: f64) -> SimMatchResult<Self> {
        if !in_score_range(value) {
            return Err(SimMatchError::InvalidThreshold { value });
        }
        Ok(Self(value))
    }

    /// Returns the threshold value.
    pub fn value(self) -> f64 {
        self.0
    }

    /// Inclusive comparison: a score equal to the threshold passes.
    pub fn accepts(self, score: f64) -> bool {
        score >= self.0
    }
}

impl TryFrom<f64> for Threshold {
    type Error = SimMatchError;

    fn try_from(value: f64) -> SimMatchResult<Self> {
        Self::new(value)
    }
}

/// Configuration for a `SimilaritySearch`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SearchConfig {
    pub normalize: NormalizeConfig,
    pub ssim: SsimParams,
    pub rank: RankConfig,
    pub scan: ScanOptions,
}

impl SearchConfig {
    /// Validates every section and their combination.
    pub fn validate(&self) -> SimMatchResult<()> {
        self.normalize.validate()?;
        self.ssim.validate()?;
        self.rank.validate()?;
        if self.normalize.width < self.ssim.win_size || self.normalize.height < self.ssim.win_size
        {
            return Err(SimMatchError::InvalidConfig(
                "normalized size is smaller than the SSIM window",
            ));
        }
        Ok(())
    }
}

/// Ranked matches plus the scan's failure report and counters.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchResult {
    /// Matches ordered by descending score, ties by the configured key.
    pub matches: Vec<Match>,
    /// Candidates that could not be read or decoded.
    pub failures: FailureReport,
    pub stats: ScanStats,
}

/// Finds images in a collection that are similar to a query image.
#[derive(Clone, Debug)]
pub struct SimilaritySearch {
    normalizer: Normalizer,
    scorer: Scorer,
    rank: RankConfig,
    scan: ScanOptions,
}

impl SimilaritySearch {
    /// Builds a search from a validated configuration.
    pub fn new(cfg: SearchConfig) -> SimMatchResult<Self> {
        cfg.validate()?;
        Ok(Self {
            normalizer: Normalizer::new(cfg.normalize)?,
            scorer: Scorer::new(cfg.ssim)?,
            rank: cfg.rank,
            scan: cfg.scan,
        })
    }

    /// Returns the normalizer shared by queries and candidates.
    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Returns the scorer.
    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    /// Returns a copy with different scan options.
    pub fn with_scan_options(mut self, options: ScanOptions) -> Self {
        self.scan = options;
        self
    }

    /// Runs one query.
    ///
    /// The threshold is validated before anything else and the query image
    /// is decoded before the collection is touched; either failure aborts
    /// the query. Candidate failures do not.
    pub fn find_similar<S>(
        &self,
        query_bytes: &[u8],
        threshold: f64,
        source: &S,
        exclude: Option<&str>,
    ) -> SimMatchResult<SearchResult>
    where
        S: ImageSource + ?Sized,
    {
        let threshold = Threshold::new(threshold)?;
        let query = self.normalizer.normalize(query_bytes)?;
        self.find_similar_normalized(&query, threshold, source, exclude)
    }

    /// Runs one query with an already normalized query image.
    pub fn find_similar_normalized<S>(
        &self,
        query: &NormalizedImage,
        threshold: Threshold,
        source: &S,
        exclude: Option<&str>,
    ) -> SimMatchResult<SearchResult>
    where
        S: ImageSource + ?Sized,
    {
        let _span = trace_span!("find_similar", threshold = threshold.value()).entered();
        let scanner = Scanner::new(query, &self.normalizer, &self.scorer)?.with_options(self.scan);
        let outcome = scanner.scan(source, threshold, exclude)?;
        let matches = rank(outcome.matches, &self.rank);
        trace_event!("ranked", matches = matches.len());
        Ok(SearchResult {
            matches,
            failures: outcome.failures,
            stats: outcome.stats,
        })
    }
}
