//! Built-in procedure catalog: the bundled-payment categories and default
//! economic assumptions published with the remote-monitoring savings model.

use serde::Serialize;

use crate::derived::snf_substitution_pct;
use crate::model::{
    CostReduction, EconomicAssumptions, EpisodeCategory, PostAcuteAssumptions, ProgramCost,
};

/// CMS discount applied to baseline spend when setting target prices.
pub const CMS_DISCOUNT_PCT: f64 = 3.0;
/// Quality-score bonus applied to annual reconciliation, in percentage points.
pub const QUALITY_ADJUSTMENT_PCT: f64 = 0.3;
/// Monitoring program cost per treated episode.
pub const PROGRAM_COST_PER_EPISODE: f64 = 1_000.0;
/// Home-health increment per episode when a SNF stay is avoided.
pub const HOME_HEALTH_EXTRA_COST: f64 = 200.0;
/// Average SNF daily cost.
pub const SNF_DAILY_COST: f64 = 305.0;
/// Average SNF length of stay, midpoint of the published 22.1 to 30.8 day range.
pub const SNF_LENGTH_OF_STAY_DAYS: f64 = 26.45;

/// (name, baseline bundled payment, SNF utilization rate)
const PROCEDURES: [(&str, f64, f64); 4] = [
    ("Lower extremity joint replacement", 26_500.0, 0.45),
    ("Hip/femur fracture", 29_500.0, 0.70),
    ("Spinal fusion", 42_000.0, 0.30),
    ("Major bowel procedure", 35_000.0, 0.25),
];

pub fn default_assumptions() -> EconomicAssumptions {
    EconomicAssumptions {
        cms_discount_pct: CMS_DISCOUNT_PCT,
        quality_adjustment_pct: QUALITY_ADJUSTMENT_PCT,
        program_cost: ProgramCost::PerEpisode(PROGRAM_COST_PER_EPISODE),
        post_acute: Some(default_post_acute()),
    }
}

pub fn default_post_acute() -> PostAcuteAssumptions {
    PostAcuteAssumptions {
        snf_daily_cost: SNF_DAILY_COST,
        snf_length_of_stay_days: SNF_LENGTH_OF_STAY_DAYS,
        home_health_extra_cost: HOME_HEALTH_EXTRA_COST,
    }
}

/// Catalog categories with zero volume; callers supply the volumes.
pub fn default_categories() -> Vec<EpisodeCategory> {
    PROCEDURES
        .iter()
        .map(|&(name, baseline_cost, snf_utilization)| EpisodeCategory {
            name: name.to_string(),
            baseline_cost,
            cost_reduction: CostReduction::SnfSubstitution { snf_utilization },
            annual_volume: 0,
        })
        .collect()
}

/// One catalog line for display, with the cost-reduction percentage
/// resolved under the default assumptions.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogEntry {
    pub name: String,
    pub baseline_cost: f64,
    pub snf_utilization: f64,
    pub cost_reduction_pct: f64,
}

pub fn catalog_entries() -> Vec<CatalogEntry> {
    let post_acute = default_post_acute();
    PROCEDURES
        .iter()
        .map(|&(name, baseline_cost, snf_utilization)| CatalogEntry {
            name: name.to_string(),
            baseline_cost,
            snf_utilization,
            cost_reduction_pct: snf_substitution_pct(
                &post_acute,
                snf_utilization,
                PROGRAM_COST_PER_EPISODE,
                baseline_cost,
            ),
        })
        .collect()
}
