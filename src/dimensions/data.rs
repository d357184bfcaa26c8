//! Dimension record structures matching the reference-table contracts

use serde::{Deserialize, Serialize};

/// State / region lookup row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geography {
    /// Two-letter state code, the table key
    pub state_code: String,

    /// Region the state rolls up to (e.g. "NE", "SE", "MW", "W")
    pub region_code: String,

    /// Market tier label (e.g. "Tier 1")
    pub market_tier: String,
}

/// Product row: line of business plus plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Upper-cased LOB_PLAN key, the table key
    pub product_key: String,

    pub line_of_business: String,

    pub plan_name: String,
}
