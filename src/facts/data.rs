//! Fact record structures matching the policy and claims fact contracts

use serde::{Deserialize, Serialize};

/// A single policy term from the policy fact table
///
/// Append-only upstream fact; the engine never mutates these. The date keys
/// are YYYYMMDD integers. An expiration key may reference a day outside the
/// generated calendar range: the index clamps, it does not require the key
/// to resolve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyRecord {
    /// Unique policy identifier
    pub policy_id: u64,

    /// Human-facing policy number
    pub policy_number: String,

    /// Owning client
    pub client_id: u64,

    /// Issuing state code
    pub state_code: String,

    /// Issuing region code (denormalized from the state)
    pub region_code: String,

    /// True when this term renews a prior term, false for new business
    pub is_renewal: bool,

    /// Product reference (upper-cased LOB_PLAN key)
    pub product_key: String,

    /// First day in force; a policy with no effective key cannot be
    /// expanded and is reported, not failed
    pub effective_date_key: Option<u32>,

    /// Last day in force; absent for an open-ended term
    pub expiration_date_key: Option<u32>,

    /// Free-text status (e.g. "ACTIVE", "EXPIRED", "CANCELLED")
    pub status: String,

    /// Underwriting risk score in [0, 1]
    pub risk_score: f64,

    pub monthly_premium: f64,

    pub annual_premium: f64,
}

impl PolicyRecord {
    /// Month bucket (YYYYMM) of the effective date, when present
    pub fn effective_month_key(&self) -> Option<u32> {
        self.effective_date_key.map(|k| k / 100)
    }
}

/// A single claim from the claims fact table
///
/// Grain is one row per incident; a claim is never expanded across calendar
/// units. Settlement fields may remain null indefinitely while the claim is
/// open. State, region, and product are denormalized here so an orphaned
/// claim (attribution gap) still has reportable dimensions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimRecord {
    /// Unique claim identifier
    pub claim_id: u64,

    /// Referenced policy
    pub policy_id: u64,

    /// Product reference carried on the claim
    pub product_key: String,

    /// Line of business, denormalized alongside the product key
    pub line_of_business: String,

    pub state_code: String,

    pub region_code: String,

    /// Claim type label (e.g. "COLLISION")
    pub claim_type: String,

    /// Claim status label (e.g. "OPEN", "PAID", "DENIED")
    pub claim_status: String,

    /// True when the claim was flagged for fraud review
    pub fraud_flag: bool,

    /// Day the loss occurred, YYYYMMDD
    pub incident_date_key: u32,

    /// Day the claim was reported, YYYYMMDD
    pub report_date_key: u32,

    /// Day the claim settled; absent while open
    pub settlement_date_key: Option<u32>,

    /// Days between report and settlement; absent while open
    pub days_to_settle: Option<u32>,

    pub amount_requested: f64,

    pub amount_approved: f64,

    /// Paid amount; the loss measure the KPI layer sums
    pub amount_paid: f64,
}

impl ClaimRecord {
    /// Month bucket (YYYYMM) of the incident date
    pub fn incident_month_key(&self) -> u32 {
        self.incident_date_key / 100
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_keys() {
        let policy = PolicyRecord {
            policy_id: 1,
            policy_number: "POL-000001".into(),
            client_id: 7,
            state_code: "NY".into(),
            region_code: "NE".into(),
            is_renewal: false,
            product_key: "AUTO_STANDARD".into(),
            effective_date_key: Some(20240115),
            expiration_date_key: Some(20250114),
            status: "ACTIVE".into(),
            risk_score: 0.42,
            monthly_premium: 120.0,
            annual_premium: 1_440.0,
        };
        assert_eq!(policy.effective_month_key(), Some(202401));

        let open_ended = PolicyRecord {
            effective_date_key: None,
            ..policy
        };
        assert_eq!(open_ended.effective_month_key(), None);
    }
}
