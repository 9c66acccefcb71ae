//! Aggregate ROI figures over per-category rows.

use crate::model::{CategoryRow, ProgramCost, RoiTotals};

/// Sum rows into the aggregate scalars.
///
/// `roi_pct` is defined as exactly 0 when the program cost total is zero
/// (possible when the per-episode cost is configured to 0), not NaN and
/// not an error.
pub fn aggregate_rows(rows: &[CategoryRow], program_cost: ProgramCost) -> RoiTotals {
    let total_volume: i64 = rows.iter().map(|r| r.annual_volume).sum();
    let total_reconciliation: f64 = rows
        .iter()
        .map(|r| r.quality_adjusted_reconciliation)
        .sum();

    let program_cost_total = match program_cost {
        ProgramCost::PerEpisode(cost) => total_volume as f64 * cost,
        ProgramCost::Flat(cost) => cost,
    };

    let net_impact = total_reconciliation - program_cost_total;
    let roi_pct = if program_cost_total != 0.0 {
        net_impact / program_cost_total * 100.0
    } else {
        0.0
    };

    RoiTotals {
        total_volume,
        total_reconciliation,
        program_cost_total,
        net_impact,
        roi_pct,
    }
}
