//! Claims attribution: match each claim to its policy's active exposure
//!
//! A claim occupies exactly one incident-date bucket; it is never expanded.
//! Attribution asks: was the claim's policy in force at the incident date,
//! under the grain semantics of the consuming view?
//!
//! - **Day**: in force when `effective <= incident <= expiration` (no
//!   expiration: `incident >= effective`).
//! - **Month**: in force when the incident month equals the policy's
//!   effective month, the direct consequence of monthly collapse.
//!
//! A claim that fails attribution (unknown policy, or no overlapping
//! exposure) is an attribution gap: it keeps its place in claim-volume and
//! loss measures, grouped by its own denormalized dimensions, but it never
//! reaches a premium denominator.

use super::exposure::ExposureProfile;
use super::expansion::Grain;
use crate::error::{DataQualityIssue, QualityReport};
use crate::facts::ClaimRecord;
use std::collections::HashMap;

/// A claim resolved against exposure, or marked as a gap
#[derive(Debug, Clone, Copy)]
pub struct AttributedClaim<'a> {
    pub claim: &'a ClaimRecord,

    /// Incident bucket at the requested grain (date key or month key)
    pub bucket: u32,

    /// Exposure context in force at the incident date; `None` is an
    /// attribution gap
    pub context: Option<&'a ExposureProfile>,
}

impl AttributedClaim<'_> {
    pub fn is_gap(&self) -> bool {
        self.context.is_none()
    }
}

/// Attributes claims against a run's exposure profiles
#[derive(Debug, Clone)]
pub struct ClaimsAttributor<'a> {
    by_policy: HashMap<u64, &'a ExposureProfile>,
}

impl<'a> ClaimsAttributor<'a> {
    /// Index the run's (screened and joined) exposure profiles by policy
    pub fn new(profiles: &'a [ExposureProfile]) -> Self {
        Self {
            by_policy: profiles.iter().map(|p| (p.policy_id, p)).collect(),
        }
    }

    /// Attribute one claim at the given grain
    pub fn attribute(
        &self,
        claim: &'a ClaimRecord,
        grain: Grain,
        report: &mut QualityReport,
    ) -> AttributedClaim<'a> {
        let bucket = match grain {
            Grain::Day => claim.incident_date_key,
            Grain::Month => claim.incident_month_key(),
        };

        let context = self
            .by_policy
            .get(&claim.policy_id)
            .copied()
            .filter(|profile| self.in_force(profile, claim, grain));

        if context.is_none() {
            report.record(DataQualityIssue::AttributionGap {
                claim_id: claim.claim_id,
                policy_id: claim.policy_id,
                incident_date_key: claim.incident_date_key,
            });
        }

        AttributedClaim { claim, bucket, context }
    }

    fn in_force(&self, profile: &ExposureProfile, claim: &ClaimRecord, grain: Grain) -> bool {
        let Some(effective) = profile.effective_date_key else {
            return false;
        };
        match grain {
            Grain::Day => {
                claim.incident_date_key >= effective
                    && profile
                        .expiration_date_key
                        .map_or(true, |x| claim.incident_date_key <= x)
            }
            Grain::Month => claim.incident_month_key() == effective / 100,
        }
    }
}
