//! Exposure Engine - Time-sliced exposure and KPI aggregation for an
//! insurance policy portfolio
//!
//! This library provides:
//! - A canonical daily calendar index with derived reporting attributes
//! - Interval expansion of policy terms at day or month grain
//! - Left-join exposure enrichment against geography and product dimensions
//! - Incident-date claims attribution with explicit attribution gaps
//! - Mergeable group aggregation with a documented null/zero-division policy
//! - Four fixed dashboard view recipes (executive, claims, operations, risk)

pub mod aggregate;
pub mod calendar;
pub mod dimensions;
pub mod engine;
pub mod error;
pub mod facts;
pub mod views;

// Re-export commonly used types
pub use aggregate::{Aggregator, DimensionSet, GroupKey, GroupKpis, KpiConfig};
pub use calendar::{CalendarIndex, CalendarUnit};
pub use dimensions::DimensionContext;
pub use engine::{ClaimsAttributor, ExposureJoiner, ExposureProfile, Grain, IntervalExpander};
pub use error::{DataQualityIssue, EngineError, QualityReport};
pub use facts::{ClaimRecord, PolicyRecord};
pub use views::{ViewAssembler, ViewRecipe};
