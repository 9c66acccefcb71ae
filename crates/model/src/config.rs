use serde::Deserialize;

use crate::catalog;
use crate::error::ModelError;
use crate::model::{
    CostReduction, EconomicAssumptions, EpisodeCategory, PostAcuteAssumptions, ProgramCost,
};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// A scenario file: the injectable replacement for the original model's
/// hard-coded reference constants.
#[derive(Debug, Deserialize)]
pub struct ScenarioConfig {
    pub name: String,
    pub assumptions: AssumptionsConfig,
    #[serde(default)]
    pub post_acute: Option<PostAcuteConfig>,
    #[serde(default)]
    pub categories: Vec<CategoryConfig>,
    /// Load the built-in procedure catalog instead of `[[categories]]`;
    /// volumes then come from CLI overrides.
    #[serde(default)]
    pub use_builtin_catalog: bool,
}

#[derive(Debug, Deserialize)]
pub struct AssumptionsConfig {
    pub cms_discount_pct: f64,
    pub quality_adjustment_pct: f64,
    pub program_cost: ProgramCostConfig,
}

/// Exactly one of `per_episode` / `flat`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ProgramCostConfig {
    #[serde(default)]
    pub per_episode: Option<f64>,
    #[serde(default)]
    pub flat: Option<f64>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PostAcuteConfig {
    pub snf_daily_cost: f64,
    pub snf_length_of_stay_days: f64,
    pub home_health_extra_cost: f64,
}

/// One category. Exactly one of `cost_reduction_pct` / `snf_utilization`.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryConfig {
    pub name: String,
    pub baseline_cost: f64,
    #[serde(default)]
    pub cost_reduction_pct: Option<f64>,
    #[serde(default)]
    pub snf_utilization: Option<f64>,
    #[serde(default)]
    pub annual_volume: i64,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ScenarioConfig {
    pub fn from_toml(input: &str) -> Result<Self, ModelError> {
        let config: ScenarioConfig =
            toml::from_str(input).map_err(|e| ModelError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Structural checks only; value bounds are the engine's up-front
    /// validation. An empty category list is valid here and reaches the
    /// engine as the nothing-to-compute state.
    pub fn validate(&self) -> Result<(), ModelError> {
        self.program_cost()?;

        if self.use_builtin_catalog && !self.categories.is_empty() {
            return Err(ModelError::ConfigValidation(
                "use_builtin_catalog and [[categories]] are mutually exclusive".into(),
            ));
        }

        for category in &self.categories {
            match (category.cost_reduction_pct, category.snf_utilization) {
                (Some(_), Some(_)) => {
                    return Err(ModelError::ConfigValidation(format!(
                        "category '{}': set only one of 'cost_reduction_pct' or 'snf_utilization'",
                        category.name
                    )));
                }
                (None, None) => {
                    return Err(ModelError::ConfigValidation(format!(
                        "category '{}': set 'cost_reduction_pct' or 'snf_utilization'",
                        category.name
                    )));
                }
                (Some(_), None) => {}
                (None, Some(_)) => {
                    if self.post_acute.is_none() {
                        return Err(ModelError::ConfigValidation(format!(
                            "category '{}': snf_utilization requires a [post_acute] section",
                            category.name
                        )));
                    }
                    if self.assumptions.program_cost.per_episode.is_none() {
                        return Err(ModelError::ConfigValidation(format!(
                            "category '{}': snf-derived cost reduction requires \
                             program_cost.per_episode",
                            category.name
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    fn program_cost(&self) -> Result<ProgramCost, ModelError> {
        match (
            self.assumptions.program_cost.per_episode,
            self.assumptions.program_cost.flat,
        ) {
            (Some(cost), None) => Ok(ProgramCost::PerEpisode(cost)),
            (None, Some(cost)) => Ok(ProgramCost::Flat(cost)),
            _ => Err(ModelError::ConfigValidation(
                "program_cost must set exactly one of 'per_episode' or 'flat'".into(),
            )),
        }
    }

    /// Convert into engine inputs. The built-in catalog substitutes for
    /// `[[categories]]` when requested.
    pub fn to_inputs(&self) -> Result<(EconomicAssumptions, Vec<EpisodeCategory>), ModelError> {
        let program_cost = self.program_cost()?;

        let post_acute = self.post_acute.map(|p| PostAcuteAssumptions {
            snf_daily_cost: p.snf_daily_cost,
            snf_length_of_stay_days: p.snf_length_of_stay_days,
            home_health_extra_cost: p.home_health_extra_cost,
        });

        let assumptions = EconomicAssumptions {
            cms_discount_pct: self.assumptions.cms_discount_pct,
            quality_adjustment_pct: self.assumptions.quality_adjustment_pct,
            program_cost,
            post_acute: if self.use_builtin_catalog && post_acute.is_none() {
                Some(catalog::default_post_acute())
            } else {
                post_acute
            },
        };

        let categories = if self.use_builtin_catalog {
            catalog::default_categories()
        } else {
            self.categories
                .iter()
                .map(|c| {
                    let cost_reduction = match (c.cost_reduction_pct, c.snf_utilization) {
                        (Some(pct), None) => Ok(CostReduction::Flat(pct)),
                        (None, Some(snf_utilization)) => {
                            Ok(CostReduction::SnfSubstitution { snf_utilization })
                        }
                        _ => Err(ModelError::ConfigValidation(format!(
                            "category '{}': set exactly one of 'cost_reduction_pct' or \
                             'snf_utilization'",
                            c.name
                        ))),
                    }?;
                    Ok(EpisodeCategory {
                        name: c.name.clone(),
                        baseline_cost: c.baseline_cost,
                        cost_reduction,
                        annual_volume: c.annual_volume,
                    })
                })
                .collect::<Result<Vec<_>, ModelError>>()?
        };

        Ok((assumptions, categories))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_SCENARIO: &str = r#"
name = "Community hospital, year one"

[assumptions]
cms_discount_pct = 3.0
quality_adjustment_pct = 0.3

[assumptions.program_cost]
per_episode = 1000.0

[post_acute]
snf_daily_cost = 305.0
snf_length_of_stay_days = 26.45
home_health_extra_cost = 200.0

[[categories]]
name = "Lower extremity joint replacement"
baseline_cost = 26500.0
snf_utilization = 0.45
annual_volume = 120

[[categories]]
name = "Spinal fusion"
baseline_cost = 42000.0
cost_reduction_pct = 7.5
annual_volume = 40
"#;

    #[test]
    fn parse_valid_scenario() {
        let config = ScenarioConfig::from_toml(VALID_SCENARIO).unwrap();
        assert_eq!(config.name, "Community hospital, year one");
        assert_eq!(config.categories.len(), 2);
        assert!(!config.use_builtin_catalog);

        let (assumptions, categories) = config.to_inputs().unwrap();
        assert_eq!(assumptions.program_cost, ProgramCost::PerEpisode(1_000.0));
        assert_eq!(
            categories[0].cost_reduction,
            CostReduction::SnfSubstitution {
                snf_utilization: 0.45
            }
        );
        assert_eq!(categories[1].cost_reduction, CostReduction::Flat(7.5));
        assert_eq!(categories[1].annual_volume, 40);
    }

    #[test]
    fn volume_defaults_to_zero() {
        let input = r#"
name = "No volumes yet"

[assumptions]
cms_discount_pct = 3.0
quality_adjustment_pct = 0.3

[assumptions.program_cost]
per_episode = 1000.0

[[categories]]
name = "Spinal fusion"
baseline_cost = 42000.0
cost_reduction_pct = 7.5
"#;
        let config = ScenarioConfig::from_toml(input).unwrap();
        assert_eq!(config.categories[0].annual_volume, 0);
    }

    #[test]
    fn reject_both_program_cost_forms() {
        let input = r#"
name = "Bad"

[assumptions]
cms_discount_pct = 3.0
quality_adjustment_pct = 0.3

[assumptions.program_cost]
per_episode = 1000.0
flat = 120000.0
"#;
        let err = ScenarioConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("exactly one"));
    }

    #[test]
    fn reject_missing_program_cost_form() {
        let input = r#"
name = "Bad"

[assumptions]
cms_discount_pct = 3.0
quality_adjustment_pct = 0.3

[assumptions.program_cost]
"#;
        let err = ScenarioConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("per_episode"));
    }

    #[test]
    fn reject_both_cost_reduction_forms() {
        let input = r#"
name = "Bad"

[assumptions]
cms_discount_pct = 3.0
quality_adjustment_pct = 0.3

[assumptions.program_cost]
per_episode = 1000.0

[post_acute]
snf_daily_cost = 305.0
snf_length_of_stay_days = 26.45
home_health_extra_cost = 200.0

[[categories]]
name = "Spinal fusion"
baseline_cost = 42000.0
cost_reduction_pct = 7.5
snf_utilization = 0.30
"#;
        let err = ScenarioConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("only one"));
        assert!(err.to_string().contains("Spinal fusion"));
    }

    #[test]
    fn reject_derived_without_post_acute() {
        let input = r#"
name = "Bad"

[assumptions]
cms_discount_pct = 3.0
quality_adjustment_pct = 0.3

[assumptions.program_cost]
per_episode = 1000.0

[[categories]]
name = "Spinal fusion"
baseline_cost = 42000.0
snf_utilization = 0.30
"#;
        let err = ScenarioConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("[post_acute]"));
    }

    #[test]
    fn reject_derived_with_flat_program_cost() {
        let input = r#"
name = "Bad"

[assumptions]
cms_discount_pct = 3.0
quality_adjustment_pct = 0.3

[assumptions.program_cost]
flat = 120000.0

[post_acute]
snf_daily_cost = 305.0
snf_length_of_stay_days = 26.45
home_health_extra_cost = 200.0

[[categories]]
name = "Spinal fusion"
baseline_cost = 42000.0
snf_utilization = 0.30
"#;
        let err = ScenarioConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("per_episode"));
    }

    #[test]
    fn builtin_catalog_scenario() {
        let input = r#"
name = "Catalog defaults"
use_builtin_catalog = true

[assumptions]
cms_discount_pct = 3.0
quality_adjustment_pct = 0.3

[assumptions.program_cost]
per_episode = 1000.0
"#;
        let config = ScenarioConfig::from_toml(input).unwrap();
        let (assumptions, categories) = config.to_inputs().unwrap();
        assert_eq!(categories.len(), 4);
        assert!(assumptions.post_acute.is_some());
        assert!(categories.iter().all(|c| c.annual_volume == 0));
    }

    #[test]
    fn reject_catalog_with_explicit_categories() {
        let input = r#"
name = "Bad"
use_builtin_catalog = true

[assumptions]
cms_discount_pct = 3.0
quality_adjustment_pct = 0.3

[assumptions.program_cost]
per_episode = 1000.0

[[categories]]
name = "Spinal fusion"
baseline_cost = 42000.0
cost_reduction_pct = 7.5
"#;
        let err = ScenarioConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("mutually exclusive"));
    }

    #[test]
    fn empty_categories_are_structurally_valid() {
        let input = r#"
name = "Empty"

[assumptions]
cms_discount_pct = 3.0
quality_adjustment_pct = 0.3

[assumptions.program_cost]
per_episode = 1000.0
"#;
        let config = ScenarioConfig::from_toml(input).unwrap();
        let (_, categories) = config.to_inputs().unwrap();
        assert!(categories.is_empty());
    }
}
