//! Error taxonomy: fatal load errors vs. non-fatal data-quality issues
//!
//! Nothing in the core computation is fatal: a malformed policy or an
//! unmatched claim degrades that record's contribution and is reported
//! through [`QualityReport`]. Fatal errors ([`EngineError`]) only arise
//! from I/O and configuration, before any aggregation starts.

use log::warn;
use serde::Serialize;
use thiserror::Error;

/// Fatal errors raised while loading inputs or configuring a run
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid date key {key}: not a valid YYYYMMDD date")]
    InvalidDateKey { key: u32 },

    #[error("Invalid {field}: '{value}'")]
    InvalidField { field: &'static str, value: String },

    #[error("Empty calendar range: start {start} is after end {end}")]
    EmptyCalendarRange { start: String, end: String },
}

pub type EngineResult<T> = Result<T, EngineError>;

/// A non-fatal data-quality finding attached to a single source record
///
/// Each variant maps to one branch of the handling policy: the affected
/// record's contribution is degraded (null attributes, exclusion from
/// expansion, exclusion from ratio denominators), never the whole run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DataQualityIssue {
    /// A foreign key has no matching dimension row; the row keeps null
    /// attributes instead of being dropped.
    ReferenceMissing {
        entity: &'static str,
        key: String,
        policy_id: u64,
    },

    /// Expiration date key precedes the effective date key; the policy is
    /// excluded from expansion.
    InvalidInterval {
        policy_id: u64,
        effective_date_key: u32,
        expiration_date_key: u32,
    },

    /// Policy has no effective date key; excluded from expansion.
    MissingEffectiveDate { policy_id: u64 },

    /// Claim could not be matched to active exposure at its incident date;
    /// it stays in volume counts but out of premium denominators.
    AttributionGap {
        claim_id: u64,
        policy_id: u64,
        incident_date_key: u32,
    },
}

impl DataQualityIssue {
    /// Stable category label used for counting and log output
    pub fn category(&self) -> &'static str {
        match self {
            DataQualityIssue::ReferenceMissing { .. } => "reference_missing",
            DataQualityIssue::InvalidInterval { .. } => "invalid_interval",
            DataQualityIssue::MissingEffectiveDate { .. } => "missing_effective_date",
            DataQualityIssue::AttributionGap { .. } => "attribution_gap",
        }
    }
}

impl std::fmt::Display for DataQualityIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataQualityIssue::ReferenceMissing { entity, key, policy_id } => {
                write!(f, "policy {policy_id}: no {entity} row for key '{key}'")
            }
            DataQualityIssue::InvalidInterval {
                policy_id,
                effective_date_key,
                expiration_date_key,
            } => write!(
                f,
                "policy {policy_id}: expiration {expiration_date_key} precedes effective {effective_date_key}"
            ),
            DataQualityIssue::MissingEffectiveDate { policy_id } => {
                write!(f, "policy {policy_id}: no effective date key")
            }
            DataQualityIssue::AttributionGap { claim_id, policy_id, incident_date_key } => {
                write!(
                    f,
                    "claim {claim_id}: no active exposure for policy {policy_id} at {incident_date_key}"
                )
            }
        }
    }
}

/// Maximum number of issue samples retained per report
const SAMPLE_CAP: usize = 100;

/// Accumulated data-quality findings for one engine run
///
/// Counts every issue per category but keeps at most [`SAMPLE_CAP`] full
/// samples, so a badly degraded input file cannot balloon memory.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QualityReport {
    pub reference_missing: u64,
    pub invalid_interval: u64,
    pub missing_effective_date: u64,
    pub attribution_gap: u64,
    pub samples: Vec<DataQualityIssue>,
}

impl QualityReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one issue: bump its category count, log it, keep a sample
    pub fn record(&mut self, issue: DataQualityIssue) {
        warn!("data quality: {issue}");
        match issue {
            DataQualityIssue::ReferenceMissing { .. } => self.reference_missing += 1,
            DataQualityIssue::InvalidInterval { .. } => self.invalid_interval += 1,
            DataQualityIssue::MissingEffectiveDate { .. } => self.missing_effective_date += 1,
            DataQualityIssue::AttributionGap { .. } => self.attribution_gap += 1,
        }
        if self.samples.len() < SAMPLE_CAP {
            self.samples.push(issue);
        }
    }

    /// Total issues across all categories
    pub fn total(&self) -> u64 {
        self.reference_missing
            + self.invalid_interval
            + self.missing_effective_date
            + self.attribution_gap
    }

    pub fn is_clean(&self) -> bool {
        self.total() == 0
    }

    /// Fold another report into this one (used when merging shard output)
    pub fn merge(&mut self, other: QualityReport) {
        self.reference_missing += other.reference_missing;
        self.invalid_interval += other.invalid_interval;
        self.missing_effective_date += other.missing_effective_date;
        self.attribution_gap += other.attribution_gap;
        for sample in other.samples {
            if self.samples.len() >= SAMPLE_CAP {
                break;
            }
            self.samples.push(sample);
        }
    }
}
