//! Exposure Engine CLI
//!
//! Small in-memory demo: builds a mini portfolio, runs the Operations Daily
//! view, and prints an excerpt

use chrono::NaiveDate;
use exposure_engine::dimensions::{Geography, Product};
use exposure_engine::{
    CalendarIndex, ClaimRecord, DimensionContext, PolicyRecord, ViewAssembler,
};

fn main() {
    env_logger::init();

    println!("Exposure Engine v0.1.0");
    println!("======================\n");

    let index = CalendarIndex::build(
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
    )
    .expect("valid calendar range");

    let dims = DimensionContext::new(
        vec![
            Geography {
                state_code: "NY".into(),
                region_code: "NE".into(),
                market_tier: "Tier 1".into(),
            },
            Geography {
                state_code: "FL".into(),
                region_code: "SE".into(),
                market_tier: "Tier 1".into(),
            },
        ],
        vec![
            Product {
                product_key: "AUTO_STANDARD".into(),
                line_of_business: "Auto".into(),
                plan_name: "Standard".into(),
            },
            Product {
                product_key: "HOME_PREMIUM".into(),
                line_of_business: "Home".into(),
                plan_name: "Premium".into(),
            },
        ],
    );

    let policies = vec![
        demo_policy(1, "NY", "AUTO_STANDARD", false, 0.42, Some(20240115), Some(20240930)),
        demo_policy(2, "NY", "AUTO_STANDARD", true, 0.85, Some(20240301), None),
        demo_policy(3, "FL", "HOME_PREMIUM", false, 0.30, Some(20240601), Some(20241130)),
    ];
    let claims: Vec<ClaimRecord> = Vec::new();

    println!("Portfolio: {} policies", policies.len());
    for p in &policies {
        println!(
            "  Policy {}: {} {} effective {:?} expiration {:?}",
            p.policy_id, p.state_code, p.product_key, p.effective_date_key, p.expiration_date_key
        );
    }
    println!();

    let assembler = ViewAssembler::new(&index, &dims, &policies, &claims);
    let output = assembler.operations_daily(20240101, 20241231);

    println!("Operations Daily ({} rows):", output.rows.len());
    println!(
        "{:>10} {:>6} {:>7} {:>6} {:>7} {:>8} {:>6} {:>14}",
        "DateKey", "State", "Region", "LOB", "Active", "Started", "Ended", "DailyPremium"
    );
    println!("{}", "-".repeat(72));

    // Print the first two weeks of exposure
    for row in output.rows.iter().take(14) {
        println!(
            "{:>10} {:>6} {:>7} {:>6} {:>7} {:>8} {:>6} {:>14.2}",
            row.date_key,
            row.state.as_deref().unwrap_or("-"),
            row.region.as_deref().unwrap_or("-"),
            row.line_of_business.as_deref().unwrap_or("-"),
            row.active_policies,
            row.policies_started,
            row.policies_ended,
            row.daily_premium_exposure,
        );
    }
    if output.rows.len() > 14 {
        println!("... ({} more rows)", output.rows.len() - 14);
    }

    println!("\nData quality: {} issues", output.report.total());
}

fn demo_policy(
    id: u64,
    state: &str,
    product: &str,
    renewal: bool,
    risk: f64,
    effective: Option<u32>,
    expiration: Option<u32>,
) -> PolicyRecord {
    PolicyRecord {
        policy_id: id,
        policy_number: format!("POL-{id:06}"),
        client_id: id,
        state_code: state.into(),
        region_code: if state == "NY" { "NE" } else { "SE" }.into(),
        is_renewal: renewal,
        product_key: product.into(),
        effective_date_key: effective,
        expiration_date_key: expiration,
        status: "ACTIVE".into(),
        risk_score: risk,
        monthly_premium: 120.0,
        annual_premium: 1_440.0,
    }
}
