//! Core engine stages: interval expansion, exposure join, claims attribution

pub mod claims;
pub mod expansion;
pub mod exposure;

pub use claims::{AttributedClaim, ClaimsAttributor};
pub use expansion::{Grain, IntervalExpander};
pub use exposure::{ExposureJoiner, ExposureProfile, ExposureRow};
