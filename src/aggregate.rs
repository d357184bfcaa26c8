//! Aggregation and KPI layer
//!
//! Groups exposure rows and attributed claims by (time bucket + configurable
//! dimension subset) and computes counts, sums, and derived ratios. Every
//! accumulator is commutative and associative: distinct counts are id sets,
//! averages are (sum, count) pairs, so independently aggregated calendar
//! windows merge into exactly the single-pass result.
//!
//! Ratios with a zero denominator finalize to `None`, never to zero, so
//! downstream averaging is not silently biased.

use crate::engine::{AttributedClaim, ExposureProfile, ExposureRow};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Default risk-score cutoff for the high-risk policy count
///
/// A reporting convention, not an actuarial judgment; recipes and tests may
/// override it through [`KpiConfig`].
pub const DEFAULT_HIGH_RISK_THRESHOLD: f64 = 0.8;

/// Days in the premium-exposure year: annual premium / 365 per active day
const DAYS_PER_YEAR: f64 = 365.0;

/// Tunable KPI parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KpiConfig {
    /// Risk score at or above which a policy counts as high risk
    pub high_risk_threshold: f64,
}

impl Default for KpiConfig {
    fn default() -> Self {
        Self {
            high_risk_threshold: DEFAULT_HIGH_RISK_THRESHOLD,
        }
    }
}

/// Which product attribute the product dimension groups by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProductLevel {
    /// Line of business from the product reference (null when unresolved)
    LineOfBusiness,
    /// Product key carried on the fact row (always present)
    ProductKey,
}

/// The dimension subset a recipe groups by, beyond the time bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DimensionSet {
    pub state: bool,
    pub region: bool,
    pub product: Option<ProductLevel>,
}

impl DimensionSet {
    /// State, region, and line of business: the daily/executive layout
    pub fn state_region_lob() -> Self {
        Self {
            state: true,
            region: true,
            product: Some(ProductLevel::LineOfBusiness),
        }
    }

    /// Product key, state, and region: the claims layout
    pub fn product_state_region() -> Self {
        Self {
            state: true,
            region: true,
            product: Some(ProductLevel::ProductKey),
        }
    }
}

/// Grouping key for one output row
///
/// Dimension slots not selected by the recipe stay `None`; a selected slot
/// is also `None` when the underlying reference was missing (null-attribute
/// left join), which keeps degraded rows visible as their own group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GroupKey {
    /// Time bucket: date key (daily grain) or month key (monthly grain)
    pub bucket: u32,
    pub state: Option<String>,
    pub region: Option<String>,
    pub product: Option<String>,
}

/// Mergeable measure accumulator for one group
#[derive(Debug, Clone, Default)]
pub struct GroupAccumulator {
    policy_ids: HashSet<u64>,
    new_business_ids: HashSet<u64>,
    renewal_ids: HashSet<u64>,
    high_risk_ids: HashSet<u64>,
    claim_ids: HashSet<u64>,
    policies_started: u64,
    policies_ended: u64,
    total_annual_premium: f64,
    total_monthly_premium: f64,
    daily_premium_exposure: f64,
    total_losses: f64,
    risk_sum: f64,
    risk_count: u64,
    new_risk_sum: f64,
    new_risk_count: u64,
}

impl GroupAccumulator {
    fn observe_policy(&mut self, profile: &ExposureProfile, threshold: f64) {
        self.policy_ids.insert(profile.policy_id);
        if profile.is_renewal {
            self.renewal_ids.insert(profile.policy_id);
        } else {
            self.new_business_ids.insert(profile.policy_id);
            self.new_risk_sum += profile.risk_score;
            self.new_risk_count += 1;
        }
        if profile.risk_score >= threshold {
            self.high_risk_ids.insert(profile.policy_id);
        }
        self.risk_sum += profile.risk_score;
        self.risk_count += 1;
    }

    /// Fold another group's accumulator into this one
    pub fn merge(&mut self, other: GroupAccumulator) {
        self.policy_ids.extend(other.policy_ids);
        self.new_business_ids.extend(other.new_business_ids);
        self.renewal_ids.extend(other.renewal_ids);
        self.high_risk_ids.extend(other.high_risk_ids);
        self.claim_ids.extend(other.claim_ids);
        self.policies_started += other.policies_started;
        self.policies_ended += other.policies_ended;
        self.total_annual_premium += other.total_annual_premium;
        self.total_monthly_premium += other.total_monthly_premium;
        self.daily_premium_exposure += other.daily_premium_exposure;
        self.total_losses += other.total_losses;
        self.risk_sum += other.risk_sum;
        self.risk_count += other.risk_count;
        self.new_risk_sum += other.new_risk_sum;
        self.new_risk_count += other.new_risk_count;
    }

    /// Compute the group's final measures
    pub fn finalize(&self) -> GroupKpis {
        let active_policies = self.policy_ids.len() as u64;
        let claim_count = self.claim_ids.len() as u64;
        GroupKpis {
            active_policies,
            new_business_policies: self.new_business_ids.len() as u64,
            renewal_policies: self.renewal_ids.len() as u64,
            high_risk_policies: self.high_risk_ids.len() as u64,
            policies_started: self.policies_started,
            policies_ended: self.policies_ended,
            total_annual_premium: self.total_annual_premium,
            total_monthly_premium: self.total_monthly_premium,
            daily_premium_exposure: self.daily_premium_exposure,
            claim_count,
            total_losses: self.total_losses,
            claim_frequency: ratio(claim_count as f64, active_policies as f64),
            claim_severity: ratio(self.total_losses, claim_count as f64),
            loss_ratio: ratio(self.total_losses, self.total_annual_premium),
            avg_risk_score: ratio(self.risk_sum, self.risk_count as f64),
            avg_new_business_risk: ratio(self.new_risk_sum, self.new_risk_count as f64),
        }
    }
}

/// Finalized measures for one group
///
/// The union of all recipe measure sets; each view's row mapper selects its
/// own columns. Ratio and average fields are `None` when undefined.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupKpis {
    pub active_policies: u64,
    pub new_business_policies: u64,
    pub renewal_policies: u64,
    pub high_risk_policies: u64,
    pub policies_started: u64,
    pub policies_ended: u64,
    pub total_annual_premium: f64,
    pub total_monthly_premium: f64,
    pub daily_premium_exposure: f64,
    pub claim_count: u64,
    pub total_losses: f64,
    pub claim_frequency: Option<f64>,
    pub claim_severity: Option<f64>,
    pub loss_ratio: Option<f64>,
    pub avg_risk_score: Option<f64>,
    pub avg_new_business_risk: Option<f64>,
}

/// Division with the explicit absent-value policy: `None` when the
/// denominator is zero, never a coerced zero and never an error
pub fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        None
    } else {
        Some(numerator / denominator)
    }
}

/// Keyed accumulator map for one recipe evaluation (or one window shard)
#[derive(Debug, Clone)]
pub struct Aggregator {
    dims: DimensionSet,
    config: KpiConfig,
    groups: HashMap<GroupKey, GroupAccumulator>,
}

impl Aggregator {
    pub fn new(dims: DimensionSet, config: KpiConfig) -> Self {
        Self {
            dims,
            config,
            groups: HashMap::new(),
        }
    }

    fn profile_key(&self, bucket: u32, profile: &ExposureProfile) -> GroupKey {
        GroupKey {
            bucket,
            state: if self.dims.state { profile.state.clone() } else { None },
            region: if self.dims.region { profile.region.clone() } else { None },
            product: match self.dims.product {
                Some(ProductLevel::LineOfBusiness) => profile.line_of_business.clone(),
                Some(ProductLevel::ProductKey) => Some(profile.product_key.clone()),
                None => None,
            },
        }
    }

    /// One policy in its monthly-collapsed bucket: premium sums count once
    /// per policy per month bucket
    pub fn add_monthly_exposure(&mut self, month_key: u32, profile: &ExposureProfile) {
        let key = self.profile_key(month_key, profile);
        let threshold = self.config.high_risk_threshold;
        let acc = self.groups.entry(key).or_default();
        acc.observe_policy(profile, threshold);
        acc.total_annual_premium += profile.annual_premium;
        acc.total_monthly_premium += profile.monthly_premium;
    }

    /// One (policy, day) exposure row: premium accrues as per-day exposure
    pub fn add_daily_exposure(&mut self, row: &ExposureRow<'_>) {
        let key = self.profile_key(row.unit.date_key, row.profile);
        let threshold = self.config.high_risk_threshold;
        let acc = self.groups.entry(key).or_default();
        acc.observe_policy(row.profile, threshold);
        acc.daily_premium_exposure += row.profile.annual_premium / DAYS_PER_YEAR;
        if row.started {
            acc.policies_started += 1;
        }
        if row.ended {
            acc.policies_ended += 1;
        }
    }

    /// One attributed claim: volume and losses always count; an attribution
    /// gap is grouped by the claim's own denormalized dimensions and never
    /// touches policy or premium accumulators
    pub fn add_claim(&mut self, attributed: &AttributedClaim<'_>) {
        let claim = attributed.claim;
        let key = match attributed.context {
            Some(profile) => self.profile_key(attributed.bucket, profile),
            None => GroupKey {
                bucket: attributed.bucket,
                state: self.dims.state.then(|| claim.state_code.clone()),
                region: self.dims.region.then(|| claim.region_code.clone()),
                product: match self.dims.product {
                    Some(ProductLevel::LineOfBusiness) => Some(claim.line_of_business.clone()),
                    Some(ProductLevel::ProductKey) => Some(claim.product_key.clone()),
                    None => None,
                },
            },
        };
        let acc = self.groups.entry(key).or_default();
        acc.claim_ids.insert(claim.claim_id);
        acc.total_losses += claim.amount_paid;
    }

    /// Merge a shard computed over a disjoint calendar window
    pub fn merge(&mut self, other: Aggregator) {
        for (key, acc) in other.groups {
            match self.groups.entry(key) {
                std::collections::hash_map::Entry::Occupied(mut e) => e.get_mut().merge(acc),
                std::collections::hash_map::Entry::Vacant(e) => {
                    e.insert(acc);
                }
            }
        }
    }

    /// Finalize all groups, ordered by (bucket, state, region, product)
    pub fn finalize(self) -> Vec<(GroupKey, GroupKpis)> {
        let mut rows: Vec<(GroupKey, GroupKpis)> = self
            .groups
            .into_iter()
            .map(|(key, acc)| {
                let kpis = acc.finalize();
                (key, kpis)
            })
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0));
        rows
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::CalendarUnit;
    use crate::facts::ClaimRecord;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn profile(policy_id: u64, renewal: bool, risk: f64, annual: f64) -> ExposureProfile {
        ExposureProfile {
            policy_id,
            state: Some("NY".into()),
            region: Some("NE".into()),
            product_key: "AUTO_STANDARD".into(),
            line_of_business: Some("Auto".into()),
            plan_name: Some("Standard".into()),
            is_renewal: renewal,
            risk_score: risk,
            monthly_premium: annual / 12.0,
            annual_premium: annual,
            effective_date_key: Some(20240101),
            expiration_date_key: None,
        }
    }

    fn claim(claim_id: u64, policy_id: u64, paid: f64) -> ClaimRecord {
        ClaimRecord {
            claim_id,
            policy_id,
            product_key: "AUTO_STANDARD".into(),
            line_of_business: "Auto".into(),
            state_code: "NY".into(),
            region_code: "NE".into(),
            claim_type: "COLLISION".into(),
            claim_status: "PAID".into(),
            fraud_flag: false,
            incident_date_key: 20240115,
            report_date_key: 20240116,
            settlement_date_key: None,
            days_to_settle: None,
            amount_requested: paid,
            amount_approved: paid,
            amount_paid: paid,
        }
    }

    fn unit(y: i32, m: u32, d: u32) -> CalendarUnit {
        CalendarUnit::from_date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn test_zero_denominators_are_absent_not_zero() {
        assert_eq!(ratio(5.0, 0.0), None);
        assert_eq!(ratio(0.0, 0.0), None);

        // A group holding only an orphaned claim has no active policies:
        // claim_frequency and loss_ratio must be absent, not 0
        let mut agg = Aggregator::new(DimensionSet::state_region_lob(), KpiConfig::default());
        let c = claim(1, 99, 500.0);
        agg.add_claim(&AttributedClaim {
            claim: &c,
            bucket: 202401,
            context: None,
        });

        let rows = agg.finalize();
        assert_eq!(rows.len(), 1);
        let kpis = &rows[0].1;
        assert_eq!(kpis.active_policies, 0);
        assert_eq!(kpis.claim_count, 1);
        assert_eq!(kpis.total_losses, 500.0);
        assert_eq!(kpis.claim_frequency, None);
        assert_eq!(kpis.loss_ratio, None);
        assert_eq!(kpis.avg_risk_score, None);
    }

    #[test]
    fn test_monthly_measures() {
        let mut agg = Aggregator::new(DimensionSet::state_region_lob(), KpiConfig::default());
        let p1 = profile(1, false, 0.9, 1_200.0);
        let p2 = profile(2, true, 0.3, 2_400.0);
        agg.add_monthly_exposure(202401, &p1);
        agg.add_monthly_exposure(202401, &p2);

        let c = claim(10, 1, 600.0);
        agg.add_claim(&AttributedClaim {
            claim: &c,
            bucket: 202401,
            context: Some(&p1),
        });

        let rows = agg.finalize();
        assert_eq!(rows.len(), 1);
        let kpis = &rows[0].1;
        assert_eq!(kpis.active_policies, 2);
        assert_eq!(kpis.new_business_policies, 1);
        assert_eq!(kpis.renewal_policies, 1);
        assert_eq!(kpis.high_risk_policies, 1);
        assert_eq!(kpis.total_annual_premium, 3_600.0);
        assert_eq!(kpis.claim_count, 1);
        assert_relative_eq!(kpis.claim_frequency.unwrap(), 0.5);
        assert_relative_eq!(kpis.claim_severity.unwrap(), 600.0);
        assert_relative_eq!(kpis.loss_ratio.unwrap(), 600.0 / 3_600.0);
        assert_relative_eq!(kpis.avg_risk_score.unwrap(), 0.6);
        assert_relative_eq!(kpis.avg_new_business_risk.unwrap(), 0.9);
    }

    #[test]
    fn test_loss_ratio_scale_invariance() {
        // Rescaling premium and paid amounts by the same factor leaves the
        // loss ratio unchanged
        let base = {
            let mut agg =
                Aggregator::new(DimensionSet::state_region_lob(), KpiConfig::default());
            let p = profile(1, false, 0.5, 1_200.0);
            agg.add_monthly_exposure(202401, &p);
            let c = claim(10, 1, 300.0);
            agg.add_claim(&AttributedClaim { claim: &c, bucket: 202401, context: Some(&p) });
            agg.finalize()[0].1.loss_ratio.unwrap()
        };

        let scaled = {
            let mut agg =
                Aggregator::new(DimensionSet::state_region_lob(), KpiConfig::default());
            let p = profile(1, false, 0.5, 1_200.0 * 100.0);
            agg.add_monthly_exposure(202401, &p);
            let c = claim(10, 1, 300.0 * 100.0);
            agg.add_claim(&AttributedClaim { claim: &c, bucket: 202401, context: Some(&p) });
            agg.finalize()[0].1.loss_ratio.unwrap()
        };

        assert_relative_eq!(base, scaled);
    }

    #[test]
    fn test_disjoint_window_merge_matches_single_pass() {
        let dims = DimensionSet::state_region_lob();
        let p = profile(1, false, 0.5, 3_650.0);
        let days_a = [unit(2024, 1, 1), unit(2024, 1, 2)];
        let days_b = [unit(2024, 1, 3), unit(2024, 1, 4)];

        let mut single = Aggregator::new(dims, KpiConfig::default());
        for u in days_a.iter().chain(days_b.iter()) {
            single.add_daily_exposure(&ExposureRow::new(u, &p));
        }

        let mut shard_a = Aggregator::new(dims, KpiConfig::default());
        for u in &days_a {
            shard_a.add_daily_exposure(&ExposureRow::new(u, &p));
        }
        let mut shard_b = Aggregator::new(dims, KpiConfig::default());
        for u in &days_b {
            shard_b.add_daily_exposure(&ExposureRow::new(u, &p));
        }
        shard_a.merge(shard_b);

        let merged = shard_a.finalize();
        let direct = single.finalize();
        assert_eq!(merged.len(), direct.len());
        for ((mk, mv), (dk, dv)) in merged.iter().zip(direct.iter()) {
            assert_eq!(mk, dk);
            assert_eq!(mv, dv);
        }
    }

    #[test]
    fn test_shards_sharing_a_group_key_merge_exactly() {
        // Policy shards over the same month bucket: distinct counts must
        // come out as set unions and averages from (sum, count) pairs
        let dims = DimensionSet::state_region_lob();
        let p1 = profile(1, false, 0.2, 1_200.0);
        let p2 = profile(2, true, 0.6, 2_400.0);
        let p3 = profile(3, false, 1.0, 3_600.0);

        let mut single = Aggregator::new(dims, KpiConfig::default());
        for p in [&p1, &p2, &p3] {
            single.add_monthly_exposure(202401, p);
        }

        let mut shard_a = Aggregator::new(dims, KpiConfig::default());
        shard_a.add_monthly_exposure(202401, &p1);
        shard_a.add_monthly_exposure(202401, &p2);
        let mut shard_b = Aggregator::new(dims, KpiConfig::default());
        shard_b.add_monthly_exposure(202401, &p3);
        shard_a.merge(shard_b);

        let merged = shard_a.finalize();
        let direct = single.finalize();
        assert_eq!(merged, direct);
        assert_relative_eq!(merged[0].1.avg_risk_score.unwrap(), 0.6);
    }

    #[test]
    fn test_high_risk_threshold_is_configurable() {
        let strict = KpiConfig { high_risk_threshold: 0.5 };
        let mut agg = Aggregator::new(DimensionSet::state_region_lob(), strict);
        agg.add_monthly_exposure(202401, &profile(1, false, 0.6, 1_200.0));
        agg.add_monthly_exposure(202401, &profile(2, false, 0.4, 1_200.0));

        let rows = agg.finalize();
        assert_eq!(rows[0].1.high_risk_policies, 1);

        // Boundary: a score exactly at the threshold counts
        let mut at_default =
            Aggregator::new(DimensionSet::state_region_lob(), KpiConfig::default());
        at_default.add_monthly_exposure(202401, &profile(3, false, 0.8, 1_200.0));
        assert_eq!(at_default.finalize()[0].1.high_risk_policies, 1);
    }

    #[test]
    fn test_daily_exposure_flags_and_premium() {
        let dims = DimensionSet::state_region_lob();
        let mut agg = Aggregator::new(dims, KpiConfig::default());
        let mut p = profile(1, false, 0.5, 3_650.0);
        p.effective_date_key = Some(20240101);
        p.expiration_date_key = Some(20240102);

        agg.add_daily_exposure(&ExposureRow::new(&unit(2024, 1, 1), &p));
        agg.add_daily_exposure(&ExposureRow::new(&unit(2024, 1, 2), &p));

        let rows = agg.finalize();
        assert_eq!(rows.len(), 2);

        let (_, first) = &rows[0];
        assert_eq!(first.policies_started, 1);
        assert_eq!(first.policies_ended, 0);
        assert_relative_eq!(first.daily_premium_exposure, 10.0);

        let (_, second) = &rows[1];
        assert_eq!(second.policies_started, 0);
        assert_eq!(second.policies_ended, 1);
    }

    #[test]
    fn test_orphan_claim_groups_by_its_own_dimensions() {
        // Product-key layout: the gap claim lands in its denormalized group
        let mut agg =
            Aggregator::new(DimensionSet::product_state_region(), KpiConfig::default());
        let c = claim(1, 99, 250.0);
        agg.add_claim(&AttributedClaim { claim: &c, bucket: 202401, context: None });

        let rows = agg.finalize();
        let (key, kpis) = &rows[0];
        assert_eq!(key.product.as_deref(), Some("AUTO_STANDARD"));
        assert_eq!(key.state.as_deref(), Some("NY"));
        assert_eq!(kpis.claim_count, 1);
        assert_eq!(kpis.total_annual_premium, 0.0);
    }
}
