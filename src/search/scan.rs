//! Brute-force scan of a collection against one query.
//!
//! Every listed record is read, normalized and scored once. A record that
//! cannot be read or decoded is reported and skipped; it never aborts the
//! scan. Errors from the scorer itself (shape mismatches) do abort, since
//! they mean the normalizer and the query disagree.
//!
//! All matches are held in memory until the scan finishes. That bounds the
//! practical collection size; an index would slot in between listing and
//! scoring without touching the ranker.

use crate::collection::{ImageRecord, ImageSource};
use crate::image::{GridShape, NormalizedImage};
use crate::normalize::Normalizer;
use crate::score::{ScorePlan, Scorer};
use crate::search::rank::Match;
use crate::search::Threshold;
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::{SimMatchError, SimMatchResult};
use std::collections::HashSet;
use std::time::{Duration, Instant};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Limits on how much of a collection one scan may visit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScanBudget {
    /// Visit at most this many candidates, in listing order.
    pub max_items: Option<usize>,
    /// Stop starting new candidates once this much time has elapsed.
    pub deadline: Option<Duration>,
}

impl ScanBudget {
    /// No limits.
    pub fn unlimited() -> Self {
        Self::default()
    }
}

/// Scan execution options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// Score candidates on the rayon pool (requires the `rayon` feature;
    /// ignored otherwise).
    pub parallel: bool,
    /// Visit limits.
    pub budget: ScanBudget,
}

/// Why a candidate was skipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    /// The source could not return the bytes.
    Read,
    /// The bytes could not be decoded or normalized.
    Decode,
}

impl FailureKind {
    fn as_str(self) -> &'static str {
        match self {
            FailureKind::Read => "read",
            FailureKind::Decode => "decode",
        }
    }
}

/// One skipped candidate.
#[derive(Clone, Debug, PartialEq)]
pub struct ScanFailure {
    pub id: String,
    pub location: String,
    pub kind: FailureKind,
    pub reason: String,
}

/// Candidates skipped during one scan, in listing order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FailureReport {
    failures: Vec<ScanFailure>,
}

impl FailureReport {
    /// Number of skipped candidates.
    pub fn count(&self) -> usize {
        self.failures.len()
    }

    /// Returns true when nothing was skipped.
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Identities of the skipped candidates.
    pub fn ids(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.id.as_str()).collect()
    }

    /// Iterates over the failures.
    pub fn iter(&self) -> impl Iterator<Item = &ScanFailure> {
        self.failures.iter()
    }

    fn push(&mut self, failure: ScanFailure) {
        self.failures.push(failure);
    }
}

/// Counters describing one scan.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Records returned by the listing.
    pub listed: usize,
    /// Candidates read and either scored or reported as failed.
    pub visited: usize,
    /// Records skipped because they matched the exclusion identity.
    pub excluded: usize,
    /// Candidates left unvisited because the budget ran out.
    pub unvisited: usize,
    /// True when the budget cut the scan short.
    pub truncated: bool,
}

/// Result of one scan, before ranking.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScanOutcome {
    /// Candidates with `score >= threshold`, in listing order.
    pub matches: Vec<Match>,
    pub failures: FailureReport,
    pub stats: ScanStats,
}

enum ItemOutcome {
    Scored(f64),
    Failed(FailureKind, String),
    Expired,
}

/// Scans collections against one normalized query.
pub struct Scanner<'a> {
    query: ScorePlan<'a>,
    normalizer: &'a Normalizer,
    scorer: &'a Scorer,
    options: ScanOptions,
}

impl<'a> Scanner<'a> {
    /// Prepares a scanner; the query must come from `normalizer`.
    pub fn new(
        query: &'a NormalizedImage,
        normalizer: &'a Normalizer,
        scorer: &'a Scorer,
    ) -> SimMatchResult<Self> {
        let cfg = normalizer.config();
        let expected = GridShape {
            width: cfg.width,
            height: cfg.height,
            channels: cfg.color.channels(),
        };
        if query.shape() != expected || query.color() != cfg.color {
            return Err(SimMatchError::ShapeMismatch {
                left: query.shape(),
                right: expected,
            });
        }
        Ok(Self {
            query: ScorePlan::new(query)?,
            normalizer,
            scorer,
            options: ScanOptions::default(),
        })
    }

    /// Replaces the scan options.
    pub fn with_options(mut self, options: ScanOptions) -> Self {
        self.options = options;
        self
    }

    /// Scans `source`, keeping candidates scoring at least `threshold`.
    ///
    /// A record whose identity equals `exclude` is skipped without being
    /// read, which keeps a query staged inside the collection from matching
    /// itself.
    pub fn scan<S>(
        &self,
        source: &S,
        threshold: Threshold,
        exclude: Option<&str>,
    ) -> SimMatchResult<ScanOutcome>
    where
        S: ImageSource + ?Sized,
    {
        let records = source.list()?;
        ensure_unique(&records)?;
        let _span = trace_span!("scan", listed = records.len()).entered();

        let mut stats = ScanStats {
            listed: records.len(),
            ..ScanStats::default()
        };
        let mut candidates: Vec<&ImageRecord> = Vec::with_capacity(records.len());
        for record in &records {
            if exclude == Some(record.id.as_str()) {
                stats.excluded += 1;
            } else {
                candidates.push(record);
            }
        }
        if let Some(max_items) = self.options.budget.max_items {
            if candidates.len() > max_items {
                stats.unvisited += candidates.len() - max_items;
                stats.truncated = true;
                candidates.truncate(max_items);
            }
        }

        let outcomes = self.evaluate_all(source, &candidates)?;

        let mut out = ScanOutcome::default();
        for (record, outcome) in candidates.iter().zip(outcomes) {
            match outcome {
                ItemOutcome::Scored(score) => {
                    stats.visited += 1;
                    if threshold.accepts(score) {
                        out.matches.push(Match {
                            id: record.id.clone(),
                            location: record.location.clone(),
                            score,
                        });
                    }
                }
                ItemOutcome::Failed(kind, reason) => {
                    stats.visited += 1;
                    trace_warn!(
                        "scan_item_failed",
                        id = record.id.as_str(),
                        kind = kind.as_str(),
                        reason = reason.as_str()
                    );
                    out.failures.push(ScanFailure {
                        id: record.id.clone(),
                        location: record.location.clone(),
                        kind,
                        reason,
                    });
                }
                ItemOutcome::Expired => {
                    stats.unvisited += 1;
                    stats.truncated = true;
                }
            }
        }

        trace_event!(
            "scan_complete",
            visited = stats.visited,
            matches = out.matches.len(),
            failures = out.failures.count(),
            truncated = stats.truncated
        );
        out.stats = stats;
        Ok(out)
    }

    #[cfg(feature = "rayon")]
    fn evaluate_all<S>(
        &self,
        source: &S,
        candidates: &[&ImageRecord],
    ) -> SimMatchResult<Vec<ItemOutcome>>
    where
        S: ImageSource + ?Sized,
    {
        if !self.options.parallel {
            return self.evaluate_sequential(source, candidates);
        }
        let start = Instant::now();
        let results: Vec<SimMatchResult<ItemOutcome>> = candidates
            .par_iter()
            .map(|record| {
                if self.expired(start) {
                    return Ok(ItemOutcome::Expired);
                }
                self.evaluate(source, record)
            })
            .collect();
        results.into_iter().collect()
    }

    #[cfg(not(feature = "rayon"))]
    fn evaluate_all<S>(
        &self,
        source: &S,
        candidates: &[&ImageRecord],
    ) -> SimMatchResult<Vec<ItemOutcome>>
    where
        S: ImageSource + ?Sized,
    {
        self.evaluate_sequential(source, candidates)
    }

    fn evaluate_sequential<S>(
        &self,
        source: &S,
        candidates: &[&ImageRecord],
    ) -> SimMatchResult<Vec<ItemOutcome>>
    where
        S: ImageSource + ?Sized,
    {
        let start = Instant::now();
        let mut outcomes = Vec::with_capacity(candidates.len());
        for record in candidates {
            if self.expired(start) {
                outcomes.push(ItemOutcome::Expired);
                continue;
            }
            outcomes.push(self.evaluate(source, record)?);
        }
        Ok(outcomes)
    }

    fn expired(&self, start: Instant) -> bool {
        self.options
            .budget
            .deadline
            .is_some_and(|deadline| start.elapsed() >= deadline)
    }

    fn evaluate<S>(&self, source: &S, record: &ImageRecord) -> SimMatchResult<ItemOutcome>
    where
        S: ImageSource + ?Sized,
    {
        let bytes = match source.read_bytes(record) {
            Ok(bytes) => bytes,
            Err(err) => return Ok(ItemOutcome::Failed(FailureKind::Read, err.to_string())),
        };
        let candidate = match self.normalizer.normalize(&bytes) {
            Ok(candidate) => candidate,
            Err(err) => return Ok(ItemOutcome::Failed(FailureKind::Decode, err.to_string())),
        };
        let plan = ScorePlan::new(&candidate)?;
        let score = self.scorer.score_plans(&self.query, &plan)?;
        Ok(ItemOutcome::Scored(score))
    }
}

fn ensure_unique(records: &[ImageRecord]) -> SimMatchResult<()> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        if !seen.insert(record.id.as_str()) {
            return Err(SimMatchError::DuplicateIdentity {
                id: record.id.clone(),
            });
        }
    }
    Ok(())
}
