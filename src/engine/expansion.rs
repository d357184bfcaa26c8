//! Interval expansion: from a policy term to the calendar units it spans
//!
//! The two grains deliberately disagree on open-ended terms, and the
//! difference is a per-view policy, not an accident to unify:
//!
//! - **Day**: a policy is active on every indexed day from its effective
//!   date through its expiration date, or through the end of the scanned
//!   range when it has no expiration. Cardinality is O(policies x days), so
//!   daily expansion is evaluated window-by-window, never as one eager
//!   cross product.
//! - **Month**: a policy collapses to a single bucket, the month of its
//!   effective date, whether or not it has an expiration. This is the
//!   snapshot semantics the monthly dashboards are built on.

use crate::calendar::{CalendarIndex, CalendarUnit};
use crate::error::{DataQualityIssue, QualityReport};
use crate::facts::PolicyRecord;
use serde::{Deserialize, Serialize};

/// Calendar grain of an expansion or a recipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grain {
    /// One unit per active day
    Day,
    /// One bucket per policy: the effective month
    Month,
}

/// Expands policy terms against a calendar index
#[derive(Debug, Clone, Copy)]
pub struct IntervalExpander<'a> {
    index: &'a CalendarIndex,
}

impl<'a> IntervalExpander<'a> {
    pub fn new(index: &'a CalendarIndex) -> Self {
        Self { index }
    }

    /// Screen policies once per run, excluding the unexpandable ones
    ///
    /// A policy with no effective key, or with an expiration preceding its
    /// effective key, cannot span any unit. Both conditions are reported as
    /// data-quality issues and the policy drops out of expansion; neither
    /// is fatal.
    pub fn screen<'p>(
        &self,
        policies: &'p [PolicyRecord],
        report: &mut QualityReport,
    ) -> Vec<&'p PolicyRecord> {
        let mut kept = Vec::with_capacity(policies.len());
        for policy in policies {
            let Some(effective) = policy.effective_date_key else {
                report.record(DataQualityIssue::MissingEffectiveDate {
                    policy_id: policy.policy_id,
                });
                continue;
            };
            if let Some(expiration) = policy.expiration_date_key {
                if expiration < effective {
                    report.record(DataQualityIssue::InvalidInterval {
                        policy_id: policy.policy_id,
                        effective_date_key: effective,
                        expiration_date_key: expiration,
                    });
                    continue;
                }
            }
            kept.push(policy);
        }
        kept
    }

    /// Daily span of a screened policy, clamped to a scan window
    ///
    /// Returns the indexed units with
    /// `max(effective, window_from) <= key <= min(expiration, window_to)`,
    /// where a missing expiration caps at `window_to`. Empty when the term
    /// and the window do not overlap, or when the policy was never
    /// expandable.
    pub fn daily_span(
        &self,
        policy: &PolicyRecord,
        window_from: u32,
        window_to: u32,
    ) -> &'a [CalendarUnit] {
        match policy.effective_date_key {
            Some(effective) => self.daily_span_keys(
                effective,
                policy.expiration_date_key,
                window_from,
                window_to,
            ),
            None => &[],
        }
    }

    /// Daily span from raw date keys (used by the view layer, which works
    /// from joined exposure profiles rather than raw policy records)
    pub fn daily_span_keys(
        &self,
        effective: u32,
        expiration: Option<u32>,
        window_from: u32,
        window_to: u32,
    ) -> &'a [CalendarUnit] {
        let from = effective.max(window_from);
        let to = expiration.map_or(window_to, |x| x.min(window_to));
        self.index.range(from, to)
    }

    /// Monthly collapse: the single month bucket of the effective date
    pub fn effective_month(&self, policy: &PolicyRecord) -> Option<u32> {
        policy.effective_month_key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn index_2024() -> CalendarIndex {
        CalendarIndex::build(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        )
        .unwrap()
    }

    fn policy(id: u64, effective: Option<u32>, expiration: Option<u32>) -> PolicyRecord {
        PolicyRecord {
            policy_id: id,
            policy_number: format!("POL-{id:06}"),
            client_id: 1,
            state_code: "NY".into(),
            region_code: "NE".into(),
            is_renewal: false,
            product_key: "AUTO_STANDARD".into(),
            effective_date_key: effective,
            expiration_date_key: expiration,
            status: "ACTIVE".into(),
            risk_score: 0.5,
            monthly_premium: 100.0,
            annual_premium: 1_200.0,
        }
    }

    #[test]
    fn test_closed_interval_daily_span() {
        let index = index_2024();
        let expander = IntervalExpander::new(&index);
        let p = policy(1, Some(20240115), Some(20240310));

        let span = expander.daily_span(&p, 20240101, 20241231);
        // 2024-01-15 through 2024-03-10 inclusive of both endpoints
        assert_eq!(span.len(), 56);
        assert_eq!(span.first().unwrap().date_key, 20240115);
        assert_eq!(span.last().unwrap().date_key, 20240310);
    }

    #[test]
    fn test_open_interval_daily_span_caps_at_scan_end() {
        let index = index_2024();
        let expander = IntervalExpander::new(&index);
        let p = policy(2, Some(20240601), None);

        let span = expander.daily_span(&p, 20240101, 20241231);
        // 2024-06-01 through 2024-12-31
        assert_eq!(span.len(), 214);
        assert_eq!(span.last().unwrap().date_key, 20241231);
    }

    #[test]
    fn test_monthly_collapse_is_effective_month_only() {
        let index = index_2024();
        let expander = IntervalExpander::new(&index);

        // Closed and open intervals both collapse to the effective month
        assert_eq!(
            expander.effective_month(&policy(1, Some(20240115), Some(20240310))),
            Some(202401)
        );
        assert_eq!(
            expander.effective_month(&policy(2, Some(20240601), None)),
            Some(202406)
        );
        assert_eq!(expander.effective_month(&policy(3, None, None)), None);
    }

    #[test]
    fn test_window_clamping() {
        let index = index_2024();
        let expander = IntervalExpander::new(&index);
        let p = policy(4, Some(20240115), Some(20240310));

        // Window fully inside the term
        let mid = expander.daily_span(&p, 20240201, 20240229);
        assert_eq!(mid.len(), 29);

        // Window after the term: empty
        assert!(expander.daily_span(&p, 20240401, 20240430).is_empty());

        // Expiration outside the calendar range clamps to the index
        let long = policy(5, Some(20241201), Some(20271231));
        let span = expander.daily_span(&long, 20240101, 20241231);
        assert_eq!(span.len(), 31);
    }

    #[test]
    fn test_screen_reports_and_excludes() {
        let index = index_2024();
        let expander = IntervalExpander::new(&index);
        let mut report = QualityReport::new();

        let policies = vec![
            policy(1, Some(20240115), Some(20240310)),
            policy(2, None, None),
            policy(3, Some(20240601), Some(20240101)),
        ];
        let kept = expander.screen(&policies, &mut report);

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].policy_id, 1);
        assert_eq!(report.missing_effective_date, 1);
        assert_eq!(report.invalid_interval, 1);
    }
}
