use serde::Serialize;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Global economic assumptions for one calculation. Immutable for the
/// duration of the run; never ambient state.
#[derive(Debug, Clone)]
pub struct EconomicAssumptions {
    /// Percentage haircut applied to baseline cost to set the target price.
    pub cms_discount_pct: f64,
    /// Quality-score bonus/penalty applied to annual reconciliation, in
    /// percentage points.
    pub quality_adjustment_pct: f64,
    pub program_cost: ProgramCost,
    /// Post-acute substitution costs; required only when a category derives
    /// its cost reduction from SNF utilization.
    pub post_acute: Option<PostAcuteAssumptions>,
}

/// How the monitoring program charges for the period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgramCost {
    /// Fixed cost per treated episode.
    PerEpisode(f64),
    /// One flat implementation cost for the whole period.
    Flat(f64),
}

#[derive(Debug, Clone, Copy)]
pub struct PostAcuteAssumptions {
    pub snf_daily_cost: f64,
    pub snf_length_of_stay_days: f64,
    /// Home-health increment per episode when a SNF stay is avoided.
    pub home_health_extra_cost: f64,
}

/// One bundled-payment procedure category.
#[derive(Debug, Clone)]
pub struct EpisodeCategory {
    pub name: String,
    /// Average historical bundled payment for this category.
    pub baseline_cost: f64,
    pub cost_reduction: CostReduction,
    /// Episodes in the period. 0..=MAX_ANNUAL_VOLUME.
    pub annual_volume: i64,
}

/// Where a category's cost-reduction percentage comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CostReduction {
    /// Percentage taken as input.
    Flat(f64),
    /// Derived from SNF-substitution assumptions and the per-episode
    /// program cost.
    SnfSubstitution { snf_utilization: f64 },
}

/// Input cap on per-category annual volume.
pub const MAX_ANNUAL_VOLUME: i64 = 500;

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// One computed row per input category, in input order.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryRow {
    pub name: String,
    pub annual_volume: i64,
    pub baseline_cost: f64,
    /// Resolved cost-reduction percentage (flat or derived).
    pub cost_reduction_pct: f64,
    pub target_price: f64,
    pub expected_cost: f64,
    pub reconciliation_per_episode: f64,
    pub annual_reconciliation: f64,
    pub quality_adjusted_reconciliation: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoiTotals {
    pub total_volume: i64,
    /// Sum of quality-adjusted reconciliation over all categories.
    pub total_reconciliation: f64,
    pub program_cost_total: f64,
    pub net_impact: f64,
    /// Defined as exactly 0 when `program_cost_total` is 0.
    pub roi_pct: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    pub scenario: String,
    pub engine_version: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoiReport {
    pub meta: ReportMeta,
    pub rows: Vec<CategoryRow>,
    pub totals: RoiTotals,
}

/// Engine outcome. All volumes zero (or no categories) is a defined
/// prompt-the-operator state, not an error and not a zero-ROI report.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ComputeOutcome {
    Computed(RoiReport),
    NothingToCompute,
}
