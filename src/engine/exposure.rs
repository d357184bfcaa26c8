//! Exposure join: attach dimension attributes to expanded policy spans
//!
//! Attribute resolution is left-join: a policy whose state or product has no
//! dimension row keeps null attributes and a [`ReferenceMissing`] report,
//! but its exposure measures are never dropped.
//!
//! Attributes are resolved once per policy per run into an
//! [`ExposureProfile`]; per-unit [`ExposureRow`]s borrow the profile so that
//! daily expansion does not clone attribute strings once per active day.
//!
//! [`ReferenceMissing`]: crate::error::DataQualityIssue::ReferenceMissing

use crate::calendar::CalendarUnit;
use crate::dimensions::DimensionContext;
use crate::error::{DataQualityIssue, QualityReport};
use crate::facts::PolicyRecord;

/// A policy's resolved exposure attributes and base measures
#[derive(Debug, Clone, PartialEq)]
pub struct ExposureProfile {
    pub policy_id: u64,

    /// State code, null when the geography reference is missing
    pub state: Option<String>,

    /// Canonical region from the geography table, null when missing
    pub region: Option<String>,

    /// Product key carried on the policy fact (always present)
    pub product_key: String,

    /// Line of business from the product table, null when missing
    pub line_of_business: Option<String>,

    /// Plan name from the product table, null when missing
    pub plan_name: Option<String>,

    pub is_renewal: bool,

    pub risk_score: f64,

    pub monthly_premium: f64,

    pub annual_premium: f64,

    pub effective_date_key: Option<u32>,

    pub expiration_date_key: Option<u32>,
}

impl ExposureProfile {
    /// Month bucket (YYYYMM) of the effective date, when present
    pub fn effective_month_key(&self) -> Option<u32> {
        self.effective_date_key.map(|k| k / 100)
    }
}

/// One (policy, calendar-unit) exposure pair at daily grain
#[derive(Debug, Clone, Copy)]
pub struct ExposureRow<'a> {
    pub unit: &'a CalendarUnit,
    pub profile: &'a ExposureProfile,

    /// Unit equals the policy's effective date key
    pub started: bool,

    /// Unit equals the policy's expiration date key
    pub ended: bool,
}

impl<'a> ExposureRow<'a> {
    pub fn new(unit: &'a CalendarUnit, profile: &'a ExposureProfile) -> Self {
        Self {
            unit,
            profile,
            started: profile.effective_date_key == Some(unit.date_key),
            ended: profile.expiration_date_key == Some(unit.date_key),
        }
    }
}

/// Resolves policies against the reference dimensions
#[derive(Debug, Clone, Copy)]
pub struct ExposureJoiner<'a> {
    dims: &'a DimensionContext,
}

impl<'a> ExposureJoiner<'a> {
    pub fn new(dims: &'a DimensionContext) -> Self {
        Self { dims }
    }

    /// Resolve one policy's attributes, reporting missing references
    pub fn profile(&self, policy: &PolicyRecord, report: &mut QualityReport) -> ExposureProfile {
        let (state, region) = match self.dims.geography(&policy.state_code) {
            Some(geo) => (Some(policy.state_code.clone()), Some(geo.region_code.clone())),
            None => {
                report.record(DataQualityIssue::ReferenceMissing {
                    entity: "geography",
                    key: policy.state_code.clone(),
                    policy_id: policy.policy_id,
                });
                (None, None)
            }
        };

        let (line_of_business, plan_name) = match self.dims.product(&policy.product_key) {
            Some(product) => (
                Some(product.line_of_business.clone()),
                Some(product.plan_name.clone()),
            ),
            None => {
                report.record(DataQualityIssue::ReferenceMissing {
                    entity: "product",
                    key: policy.product_key.clone(),
                    policy_id: policy.policy_id,
                });
                (None, None)
            }
        };

        ExposureProfile {
            policy_id: policy.policy_id,
            state,
            region,
            product_key: policy.product_key.clone(),
            line_of_business,
            plan_name,
            is_renewal: policy.is_renewal,
            risk_score: policy.risk_score,
            monthly_premium: policy.monthly_premium,
            annual_premium: policy.annual_premium,
            effective_date_key: policy.effective_date_key,
            expiration_date_key: policy.expiration_date_key,
        }
    }

    /// Resolve a batch of (screened) policies
    pub fn profiles(
        &self,
        policies: &[&PolicyRecord],
        report: &mut QualityReport,
    ) -> Vec<ExposureProfile> {
        policies.iter().map(|p| self.profile(p, report)).collect()
    }
}
