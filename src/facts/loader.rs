//! Load policy and claim facts from CSV files

use super::{ClaimRecord, PolicyRecord};
use crate::error::EngineResult;
use csv::Reader;
use std::path::Path;

/// Parse the boolean encodings the upstream pipeline emits
///
/// The loader upstream hardened boolean columns to "1"/"0" but older
/// extracts carry "true"/"t"/"yes"; accept all of them, case-insensitive.
fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "t" | "yes"
    )
}

/// Raw CSV row matching the fact_policies columns
#[derive(Debug, serde::Deserialize)]
struct PolicyCsvRow {
    policy_id: u64,
    policy_number: String,
    client_id: u64,
    state_code: String,
    region_code: String,
    is_renewal: String,
    product_key: String,
    effective_date_key: Option<u32>,
    expiration_date_key: Option<u32>,
    status: String,
    risk_score: f64,
    monthly_premium: f64,
    annual_premium: f64,
}

impl PolicyCsvRow {
    fn to_record(self) -> PolicyRecord {
        PolicyRecord {
            policy_id: self.policy_id,
            policy_number: self.policy_number,
            client_id: self.client_id,
            state_code: self.state_code,
            region_code: self.region_code,
            is_renewal: parse_flag(&self.is_renewal),
            product_key: self.product_key,
            effective_date_key: self.effective_date_key,
            expiration_date_key: self.expiration_date_key,
            status: self.status,
            risk_score: self.risk_score,
            monthly_premium: self.monthly_premium,
            annual_premium: self.annual_premium,
        }
    }
}

/// Raw CSV row matching the fact_claims columns
#[derive(Debug, serde::Deserialize)]
struct ClaimCsvRow {
    claim_id: u64,
    policy_id: u64,
    product_key: String,
    line_of_business: String,
    state_code: String,
    region_code: String,
    claim_type: String,
    claim_status: String,
    fraud_flag: String,
    incident_date_key: u32,
    report_date_key: u32,
    settlement_date_key: Option<u32>,
    days_to_settle: Option<u32>,
    #[serde(rename = "claim_amount_requested")]
    amount_requested: f64,
    #[serde(rename = "claim_amount_approved")]
    amount_approved: f64,
    #[serde(rename = "claim_amount_paid")]
    amount_paid: f64,
}

impl ClaimCsvRow {
    fn to_record(self) -> ClaimRecord {
        ClaimRecord {
            claim_id: self.claim_id,
            policy_id: self.policy_id,
            product_key: self.product_key,
            line_of_business: self.line_of_business,
            state_code: self.state_code,
            region_code: self.region_code,
            claim_type: self.claim_type,
            claim_status: self.claim_status,
            fraud_flag: parse_flag(&self.fraud_flag),
            incident_date_key: self.incident_date_key,
            report_date_key: self.report_date_key,
            settlement_date_key: self.settlement_date_key,
            days_to_settle: self.days_to_settle,
            amount_requested: self.amount_requested,
            amount_approved: self.amount_approved,
            amount_paid: self.amount_paid,
        }
    }
}

/// Load all policy facts from a CSV file
pub fn load_policies<P: AsRef<Path>>(path: P) -> EngineResult<Vec<PolicyRecord>> {
    load_policies_from_reader(std::fs::File::open(path)?)
}

/// Load policy facts from any reader (e.g., string buffer, network stream)
pub fn load_policies_from_reader<R: std::io::Read>(reader: R) -> EngineResult<Vec<PolicyRecord>> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut policies = Vec::new();
    for result in csv_reader.deserialize() {
        let row: PolicyCsvRow = result?;
        policies.push(row.to_record());
    }
    Ok(policies)
}

/// Load all claim facts from a CSV file
pub fn load_claims<P: AsRef<Path>>(path: P) -> EngineResult<Vec<ClaimRecord>> {
    load_claims_from_reader(std::fs::File::open(path)?)
}

/// Load claim facts from any reader
pub fn load_claims_from_reader<R: std::io::Read>(reader: R) -> EngineResult<Vec<ClaimRecord>> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut claims = Vec::new();
    for result in csv_reader.deserialize() {
        let row: ClaimCsvRow = result?;
        claims.push(row.to_record());
    }
    Ok(claims)
}
