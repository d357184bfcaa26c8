//! View assembler: the four dashboard recipes
//!
//! A [`ViewRecipe`] is a data-described configuration (grain + dimension set
//! + measure set) interpreted by one generic aggregation routine. The four
//! dashboards are fixed recipe constructors plus typed row mappers; custom
//! recipes run through the same interpreter.
//!
//! Every recipe is a pure function of its inputs and the requested key
//! range: no hidden state, safe to recompute, and daily-grain recipes are
//! evaluated in parallel over non-overlapping calendar windows whose shard
//! accumulators merge deterministically.

use crate::aggregate::{Aggregator, DimensionSet, GroupKey, GroupKpis, KpiConfig};
use crate::calendar::CalendarIndex;
use crate::dimensions::DimensionContext;
use crate::engine::{ClaimsAttributor, ExposureJoiner, ExposureRow, Grain, IntervalExpander};
use crate::error::QualityReport;
use crate::facts::{ClaimRecord, PolicyRecord};
use log::{debug, info};
use rayon::prelude::*;
use serde::Serialize;

/// Default number of days evaluated per parallel window
pub const DEFAULT_WINDOW_DAYS: usize = 92;

/// Which measure columns a recipe emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MeasureSet {
    Executive,
    Claims,
    Operations,
    Risk,
}

impl MeasureSet {
    /// Whether this measure set needs claims attribution at all
    pub fn uses_claims(&self) -> bool {
        matches!(self, MeasureSet::Claims)
    }
}

/// Data-described view configuration
#[derive(Debug, Clone)]
pub struct ViewRecipe {
    pub name: &'static str,
    pub grain: Grain,
    pub dimensions: DimensionSet,
    pub measure_set: MeasureSet,
    pub kpi: KpiConfig,
    /// Window size for daily-grain evaluation; ignored at monthly grain
    pub window_days: usize,
}

impl ViewRecipe {
    /// Executive Portfolio: month x (state, region, line of business)
    ///
    /// Monthly collapse: a policy contributes only its effective month,
    /// open-ended or not.
    pub fn executive_portfolio() -> Self {
        Self {
            name: "executive_portfolio",
            grain: Grain::Month,
            dimensions: DimensionSet::state_region_lob(),
            measure_set: MeasureSet::Executive,
            kpi: KpiConfig::default(),
            window_days: DEFAULT_WINDOW_DAYS,
        }
    }

    /// Claims & Loss: month x (product, state, region), claims joined to
    /// same-month exposure
    pub fn claims_loss() -> Self {
        Self {
            name: "claims_loss",
            grain: Grain::Month,
            dimensions: DimensionSet::product_state_region(),
            measure_set: MeasureSet::Claims,
            kpi: KpiConfig::default(),
            window_days: DEFAULT_WINDOW_DAYS,
        }
    }

    /// Operations Daily: day x (state, region, line of business), with
    /// start/end-of-policy flow counts. Open-ended policies stay active
    /// through the end of the scanned range.
    pub fn operations_daily() -> Self {
        Self {
            name: "operations_daily",
            grain: Grain::Day,
            dimensions: DimensionSet::state_region_lob(),
            measure_set: MeasureSet::Operations,
            kpi: KpiConfig::default(),
            window_days: DEFAULT_WINDOW_DAYS,
        }
    }

    /// Risk Daily: day x (state, region, line of business), renewal mix and
    /// risk-threshold measures
    pub fn risk_daily() -> Self {
        Self {
            name: "risk_daily",
            grain: Grain::Day,
            dimensions: DimensionSet::state_region_lob(),
            measure_set: MeasureSet::Risk,
            kpi: KpiConfig::default(),
            window_days: DEFAULT_WINDOW_DAYS,
        }
    }
}

/// Finalized output of one recipe evaluation
#[derive(Debug, Clone)]
pub struct ViewOutput<R> {
    pub rows: Vec<R>,
    pub report: QualityReport,
}

/// Executive Portfolio result row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutivePortfolioRow {
    pub month_key: u32,
    pub state: Option<String>,
    pub region: Option<String>,
    pub line_of_business: Option<String>,
    pub active_policies: u64,
    pub new_business_policies: u64,
    pub renewal_policies: u64,
    pub total_annual_premium: f64,
    pub total_monthly_premium: f64,
    pub avg_risk_score: Option<f64>,
}

/// Claims & Loss result row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClaimsLossRow {
    pub month_key: u32,
    pub product_key: Option<String>,
    pub state: Option<String>,
    pub region: Option<String>,
    pub active_policies: u64,
    pub total_annual_premium: f64,
    pub claim_count: u64,
    pub total_losses: f64,
    pub claim_frequency: Option<f64>,
    pub claim_severity: Option<f64>,
    pub loss_ratio: Option<f64>,
}

/// Operations Daily result row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationsDailyRow {
    pub date_key: u32,
    pub state: Option<String>,
    pub region: Option<String>,
    pub line_of_business: Option<String>,
    pub active_policies: u64,
    pub policies_started: u64,
    pub policies_ended: u64,
    pub daily_premium_exposure: f64,
}

/// Risk Daily result row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskDailyRow {
    pub date_key: u32,
    pub state: Option<String>,
    pub region: Option<String>,
    pub line_of_business: Option<String>,
    pub active_policies: u64,
    pub high_risk_policies: u64,
    pub new_business_policies: u64,
    pub renewal_policies: u64,
    pub avg_risk_score: Option<f64>,
    pub avg_new_business_risk: Option<f64>,
}

/// Pre-wired assembler over one run's read-only inputs
///
/// Borrowed context only: the assembler owns nothing and every evaluation
/// recomputes from the facts, so repeated runs over the same inputs and
/// range are idempotent.
#[derive(Debug, Clone, Copy)]
pub struct ViewAssembler<'a> {
    index: &'a CalendarIndex,
    dims: &'a DimensionContext,
    policies: &'a [PolicyRecord],
    claims: &'a [ClaimRecord],
}

impl<'a> ViewAssembler<'a> {
    pub fn new(
        index: &'a CalendarIndex,
        dims: &'a DimensionContext,
        policies: &'a [PolicyRecord],
        claims: &'a [ClaimRecord],
    ) -> Self {
        Self {
            index,
            dims,
            policies,
            claims,
        }
    }

    /// Evaluate any recipe over an inclusive date-key range
    pub fn aggregate(
        &self,
        recipe: &ViewRecipe,
        from_key: u32,
        to_key: u32,
    ) -> (Vec<(GroupKey, GroupKpis)>, QualityReport) {
        let mut report = QualityReport::new();
        let expander = IntervalExpander::new(self.index);
        let joiner = ExposureJoiner::new(self.dims);

        let screened = expander.screen(self.policies, &mut report);
        let profiles = joiner.profiles(&screened, &mut report);
        debug!(
            "{}: {} of {} policies expandable over [{from_key}, {to_key}]",
            recipe.name,
            profiles.len(),
            self.policies.len()
        );

        let mut agg = match recipe.grain {
            Grain::Month => {
                let from_month = from_key / 100;
                let to_month = to_key / 100;
                let mut agg = Aggregator::new(recipe.dimensions, recipe.kpi);
                for profile in &profiles {
                    if let Some(month) = profile.effective_month_key() {
                        if month >= from_month && month <= to_month {
                            agg.add_monthly_exposure(month, profile);
                        }
                    }
                }
                agg
            }
            Grain::Day => {
                let windows = self.index.windows(from_key, to_key, recipe.window_days);
                let shards: Vec<Aggregator> = windows
                    .par_iter()
                    .map(|window| {
                        let mut shard = Aggregator::new(recipe.dimensions, recipe.kpi);
                        let window_from = window.first().map(|u| u.date_key).unwrap_or(from_key);
                        let window_to = window.last().map(|u| u.date_key).unwrap_or(to_key);
                        for profile in &profiles {
                            let Some(effective) = profile.effective_date_key else {
                                continue;
                            };
                            let span = expander.daily_span_keys(
                                effective,
                                profile.expiration_date_key,
                                window_from,
                                window_to,
                            );
                            for unit in span {
                                shard.add_daily_exposure(&ExposureRow::new(unit, profile));
                            }
                        }
                        shard
                    })
                    .collect();

                let mut agg = Aggregator::new(recipe.dimensions, recipe.kpi);
                for shard in shards {
                    agg.merge(shard);
                }
                agg
            }
        };

        if recipe.measure_set.uses_claims() {
            let attributor = ClaimsAttributor::new(&profiles);
            for claim in self.claims {
                let in_range = match recipe.grain {
                    Grain::Day => {
                        claim.incident_date_key >= from_key && claim.incident_date_key <= to_key
                    }
                    Grain::Month => {
                        let month = claim.incident_month_key();
                        month >= from_key / 100 && month <= to_key / 100
                    }
                };
                if !in_range {
                    continue;
                }
                let attributed = attributor.attribute(claim, recipe.grain, &mut report);
                agg.add_claim(&attributed);
            }
        }

        info!(
            "{}: {} groups, {} data-quality issues",
            recipe.name,
            agg.group_count(),
            report.total()
        );
        (agg.finalize(), report)
    }

    /// Executive Portfolio over an inclusive date-key range
    pub fn executive_portfolio(
        &self,
        from_key: u32,
        to_key: u32,
    ) -> ViewOutput<ExecutivePortfolioRow> {
        let (groups, report) =
            self.aggregate(&ViewRecipe::executive_portfolio(), from_key, to_key);
        let rows = groups
            .into_iter()
            .map(|(key, kpis)| ExecutivePortfolioRow {
                month_key: key.bucket,
                state: key.state,
                region: key.region,
                line_of_business: key.product,
                active_policies: kpis.active_policies,
                new_business_policies: kpis.new_business_policies,
                renewal_policies: kpis.renewal_policies,
                total_annual_premium: kpis.total_annual_premium,
                total_monthly_premium: kpis.total_monthly_premium,
                avg_risk_score: kpis.avg_risk_score,
            })
            .collect();
        ViewOutput { rows, report }
    }

    /// Claims & Loss over an inclusive date-key range
    pub fn claims_loss(&self, from_key: u32, to_key: u32) -> ViewOutput<ClaimsLossRow> {
        let (groups, report) = self.aggregate(&ViewRecipe::claims_loss(), from_key, to_key);
        let rows = groups
            .into_iter()
            .map(|(key, kpis)| ClaimsLossRow {
                month_key: key.bucket,
                product_key: key.product,
                state: key.state,
                region: key.region,
                active_policies: kpis.active_policies,
                total_annual_premium: kpis.total_annual_premium,
                claim_count: kpis.claim_count,
                total_losses: kpis.total_losses,
                claim_frequency: kpis.claim_frequency,
                claim_severity: kpis.claim_severity,
                loss_ratio: kpis.loss_ratio,
            })
            .collect();
        ViewOutput { rows, report }
    }

    /// Operations Daily over an inclusive date-key range
    pub fn operations_daily(&self, from_key: u32, to_key: u32) -> ViewOutput<OperationsDailyRow> {
        self.operations_daily_with(&ViewRecipe::operations_daily(), from_key, to_key)
    }

    /// Operations Daily with a customized recipe (window size, threshold)
    pub fn operations_daily_with(
        &self,
        recipe: &ViewRecipe,
        from_key: u32,
        to_key: u32,
    ) -> ViewOutput<OperationsDailyRow> {
        let (groups, report) = self.aggregate(recipe, from_key, to_key);
        let rows = groups
            .into_iter()
            .map(|(key, kpis)| OperationsDailyRow {
                date_key: key.bucket,
                state: key.state,
                region: key.region,
                line_of_business: key.product,
                active_policies: kpis.active_policies,
                policies_started: kpis.policies_started,
                policies_ended: kpis.policies_ended,
                daily_premium_exposure: kpis.daily_premium_exposure,
            })
            .collect();
        ViewOutput { rows, report }
    }

    /// Risk Daily over an inclusive date-key range
    pub fn risk_daily(&self, from_key: u32, to_key: u32) -> ViewOutput<RiskDailyRow> {
        self.risk_daily_with(&ViewRecipe::risk_daily(), from_key, to_key)
    }

    /// Risk Daily with a customized recipe (window size, threshold)
    pub fn risk_daily_with(
        &self,
        recipe: &ViewRecipe,
        from_key: u32,
        to_key: u32,
    ) -> ViewOutput<RiskDailyRow> {
        let (groups, report) = self.aggregate(recipe, from_key, to_key);
        let rows = groups
            .into_iter()
            .map(|(key, kpis)| RiskDailyRow {
                date_key: key.bucket,
                state: key.state,
                region: key.region,
                line_of_business: key.product,
                active_policies: kpis.active_policies,
                high_risk_policies: kpis.high_risk_policies,
                new_business_policies: kpis.new_business_policies,
                renewal_policies: kpis.renewal_policies,
                avg_risk_score: kpis.avg_risk_score,
                avg_new_business_risk: kpis.avg_new_business_risk,
            })
            .collect();
        ViewOutput { rows, report }
    }
}
