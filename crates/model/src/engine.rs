use crate::aggregate::aggregate_rows;
use crate::derived::snf_substitution_pct;
use crate::error::ModelError;
use crate::model::{
    CategoryRow, ComputeOutcome, CostReduction, EconomicAssumptions, EpisodeCategory,
    ProgramCost, ReportMeta, RoiReport, MAX_ANNUAL_VOLUME,
};

/// Run the reconciliation pipeline for one scenario.
///
/// Validation happens once, up front, across the whole input set: either
/// every row is computed or the whole input is rejected. A scenario whose
/// volumes are all zero, or with no categories at all, is the defined
/// `NothingToCompute` state rather than a zero-ROI report.
pub fn compute(
    scenario_name: &str,
    assumptions: &EconomicAssumptions,
    categories: &[EpisodeCategory],
) -> Result<ComputeOutcome, ModelError> {
    validate_assumptions(assumptions)?;
    for category in categories {
        validate_category(assumptions, category)?;
    }

    let total_volume: i64 = categories.iter().map(|c| c.annual_volume).sum();
    if total_volume == 0 {
        return Ok(ComputeOutcome::NothingToCompute);
    }

    let rows = categories
        .iter()
        .map(|category| compute_row(assumptions, category))
        .collect::<Result<Vec<_>, _>>()?;

    let totals = aggregate_rows(&rows, assumptions.program_cost);

    Ok(ComputeOutcome::Computed(RoiReport {
        meta: ReportMeta {
            scenario: scenario_name.to_string(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
        },
        rows,
        totals,
    }))
}

fn compute_row(
    assumptions: &EconomicAssumptions,
    category: &EpisodeCategory,
) -> Result<CategoryRow, ModelError> {
    let cost_reduction_pct = resolve_cost_reduction(assumptions, category)?;

    let target_price = category.baseline_cost * (1.0 - assumptions.cms_discount_pct / 100.0);
    let expected_cost = category.baseline_cost * (1.0 - cost_reduction_pct / 100.0);
    let reconciliation_per_episode = target_price - expected_cost;
    let annual_reconciliation = reconciliation_per_episode * category.annual_volume as f64;
    let quality_adjusted_reconciliation =
        annual_reconciliation * (1.0 + assumptions.quality_adjustment_pct / 100.0);

    Ok(CategoryRow {
        name: category.name.clone(),
        annual_volume: category.annual_volume,
        baseline_cost: category.baseline_cost,
        cost_reduction_pct,
        target_price,
        expected_cost,
        reconciliation_per_episode,
        annual_reconciliation,
        quality_adjusted_reconciliation,
    })
}

/// Resolve a category's cost-reduction percentage.
///
/// The flat form passes through unclamped: a percentage above 100 yields a
/// negative expected cost downstream, which is computed, not rejected.
fn resolve_cost_reduction(
    assumptions: &EconomicAssumptions,
    category: &EpisodeCategory,
) -> Result<f64, ModelError> {
    match category.cost_reduction {
        CostReduction::Flat(pct) => Ok(pct),
        CostReduction::SnfSubstitution { snf_utilization } => {
            let Some(ref post_acute) = assumptions.post_acute else {
                return Err(ModelError::ConfigValidation(format!(
                    "category '{}': snf_utilization requires [post_acute] assumptions",
                    category.name
                )));
            };
            let ProgramCost::PerEpisode(per_episode) = assumptions.program_cost else {
                return Err(ModelError::ConfigValidation(format!(
                    "category '{}': snf-derived cost reduction requires a per-episode program cost",
                    category.name
                )));
            };
            if category.baseline_cost <= 0.0 {
                return Err(ModelError::InvalidCategory {
                    name: category.name.clone(),
                    field: "baseline_cost",
                    value: category.baseline_cost,
                    reason: "must be positive to derive cost reduction",
                });
            }
            Ok(snf_substitution_pct(
                post_acute,
                snf_utilization,
                per_episode,
                category.baseline_cost,
            ))
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_assumptions(assumptions: &EconomicAssumptions) -> Result<(), ModelError> {
    let pct = assumptions.cms_discount_pct;
    if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
        return Err(ModelError::InvalidAssumption {
            field: "cms_discount_pct",
            value: pct,
            reason: "must be between 0 and 100",
        });
    }

    let quality = assumptions.quality_adjustment_pct;
    if !quality.is_finite() || !(-100.0..=100.0).contains(&quality) {
        return Err(ModelError::InvalidAssumption {
            field: "quality_adjustment_pct",
            value: quality,
            reason: "must be between -100 and 100",
        });
    }

    let (cost_field, cost) = match assumptions.program_cost {
        ProgramCost::PerEpisode(cost) => ("program_cost.per_episode", cost),
        ProgramCost::Flat(cost) => ("program_cost.flat", cost),
    };
    if !cost.is_finite() || cost < 0.0 {
        return Err(ModelError::InvalidAssumption {
            field: cost_field,
            value: cost,
            reason: "must be non-negative",
        });
    }

    if let Some(ref post_acute) = assumptions.post_acute {
        let fields = [
            ("post_acute.snf_daily_cost", post_acute.snf_daily_cost),
            (
                "post_acute.snf_length_of_stay_days",
                post_acute.snf_length_of_stay_days,
            ),
            (
                "post_acute.home_health_extra_cost",
                post_acute.home_health_extra_cost,
            ),
        ];
        for (field, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(ModelError::InvalidAssumption {
                    field,
                    value,
                    reason: "must be non-negative",
                });
            }
        }
    }

    Ok(())
}

fn validate_category(
    assumptions: &EconomicAssumptions,
    category: &EpisodeCategory,
) -> Result<(), ModelError> {
    if category.name.trim().is_empty() {
        return Err(ModelError::ConfigValidation(
            "category name must not be empty".into(),
        ));
    }

    if !category.baseline_cost.is_finite() || category.baseline_cost < 0.0 {
        return Err(ModelError::InvalidCategory {
            name: category.name.clone(),
            field: "baseline_cost",
            value: category.baseline_cost,
            reason: "must be non-negative",
        });
    }

    if category.annual_volume < 0 {
        return Err(ModelError::InvalidCategory {
            name: category.name.clone(),
            field: "annual_volume",
            value: category.annual_volume as f64,
            reason: "must be non-negative",
        });
    }
    if category.annual_volume > MAX_ANNUAL_VOLUME {
        return Err(ModelError::InvalidCategory {
            name: category.name.clone(),
            field: "annual_volume",
            value: category.annual_volume as f64,
            reason: "exceeds the 500-episode input cap",
        });
    }

    match category.cost_reduction {
        CostReduction::Flat(pct) => {
            if !pct.is_finite() {
                return Err(ModelError::InvalidCategory {
                    name: category.name.clone(),
                    field: "cost_reduction_pct",
                    value: pct,
                    reason: "must be a finite percentage",
                });
            }
        }
        CostReduction::SnfSubstitution { snf_utilization } => {
            if !snf_utilization.is_finite() || !(0.0..=1.0).contains(&snf_utilization) {
                return Err(ModelError::InvalidCategory {
                    name: category.name.clone(),
                    field: "snf_utilization",
                    value: snf_utilization,
                    reason: "must be between 0 and 1",
                });
            }
            // Prove derivability up front so no failure surfaces mid-pipeline.
            resolve_cost_reduction(assumptions, category)?;
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Volume ingestion
// ---------------------------------------------------------------------------

/// Parse a two-column volume CSV (`procedure,volume`, with header) into
/// name/volume pairs, preserving file order.
///
/// Bounds are enforced by `compute`'s validation, not here.
pub fn load_volume_csv(csv_data: &str) -> Result<Vec<(String, i64)>, ModelError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(csv_data.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ModelError::Io(e.to_string()))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let idx = |name: &'static str| -> Result<usize, ModelError> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or(ModelError::MissingColumn { column: name })
    };

    let procedure_idx = idx("procedure")?;
    let volume_idx = idx("volume")?;

    let mut volumes = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ModelError::Io(e.to_string()))?;
        let procedure = record.get(procedure_idx).unwrap_or("").to_string();
        let volume_str = record.get(volume_idx).unwrap_or("");
        let volume: i64 = volume_str.parse().map_err(|_| ModelError::VolumeParse {
            record: procedure.clone(),
            value: volume_str.into(),
        })?;
        volumes.push((procedure, volume));
    }

    Ok(volumes)
}

/// Set category volumes by exact name match. Later overrides win.
pub fn apply_volume_overrides(
    categories: &mut [EpisodeCategory],
    overrides: &[(String, i64)],
) -> Result<(), ModelError> {
    for (name, volume) in overrides {
        let category = categories
            .iter_mut()
            .find(|c| &c.name == name)
            .ok_or_else(|| {
                ModelError::ConfigValidation(format!("no category named '{name}'"))
            })?;
        category.annual_volume = *volume;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
