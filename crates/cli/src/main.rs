// teamroi CLI - bundled-payment ROI calculations, headless

mod exit_codes;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;

use teamroi_model::catalog;
use teamroi_model::engine::{apply_volume_overrides, compute, load_volume_csv};
use teamroi_model::model::{ComputeOutcome, ProgramCost, RoiReport};
use teamroi_model::{ModelError, ScenarioConfig};

use exit_codes::{
    EXIT_INVALID_SCENARIO, EXIT_NOTHING_TO_COMPUTE, EXIT_RUNTIME, EXIT_SUCCESS, EXIT_USAGE,
};

#[derive(Parser)]
#[command(name = "teamroi")]
#[command(about = "Bundled-payment ROI calculator (CMS TEAM model)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario and report per-category rows plus aggregate ROI
    #[command(after_help = "\
Exit code 5 means every category volume is zero: supply volumes in the
scenario, with --volumes, or with --volume overrides.

Examples:
  teamroi run scenario.toml
  teamroi run scenario.toml --json
  teamroi run scenario.toml --volumes volumes.csv
  teamroi run scenario.toml --volume 'Spinal fusion=40' --json
  teamroi run scenario.toml --output report.json --csv table.csv")]
    Run {
        /// Path to the scenario TOML file
        scenario: PathBuf,

        /// CSV file of volume overrides (procedure,volume with header)
        #[arg(long)]
        volumes: Option<PathBuf>,

        /// Single volume override, NAME=N. Repeatable; later overrides win
        /// and apply after --volumes
        #[arg(long, value_name = "NAME=N")]
        volume: Vec<String>,

        /// Output the full report as JSON to stdout instead of the summary
        #[arg(long)]
        json: bool,

        /// Write the JSON report to a file
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Write the per-category calculation table as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Parse and validate a scenario without running it
    #[command(after_help = "\
Examples:
  teamroi validate scenario.toml")]
    Validate {
        /// Path to the scenario TOML file
        scenario: PathBuf,
    },

    /// Print the built-in procedure catalog under the default assumptions
    #[command(after_help = "\
Examples:
  teamroi catalog
  teamroi catalog --json")]
    Catalog {
        /// Output the catalog as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    fn usage(msg: impl Into<String>) -> Self {
        Self {
            code: EXIT_USAGE,
            message: msg.into(),
            hint: None,
        }
    }

    fn runtime(msg: impl Into<String>) -> Self {
        Self {
            code: EXIT_RUNTIME,
            message: msg.into(),
            hint: None,
        }
    }
}

impl From<ModelError> for CliError {
    fn from(err: ModelError) -> Self {
        let code = match err {
            ModelError::Io(_) => EXIT_RUNTIME,
            _ => EXIT_INVALID_SCENARIO,
        };
        Self {
            code,
            message: err.to_string(),
            hint: None,
        }
    }
}

/// JSON report envelope: the engine report is deterministic; the run
/// timestamp lives out here so identical inputs stay bit-identical inside.
#[derive(Serialize)]
struct RunReport<'a> {
    run_at: String,
    #[serde(flatten)]
    report: &'a RoiReport,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            scenario,
            volumes,
            volume,
            json,
            output,
            csv,
        } => cmd_run(scenario, volumes, volume, json, output, csv),
        Commands::Validate { scenario } => cmd_validate(scenario),
        Commands::Catalog { json } => cmd_catalog(json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

fn cmd_run(
    scenario_path: PathBuf,
    volumes_file: Option<PathBuf>,
    volume_args: Vec<String>,
    json_output: bool,
    output_file: Option<PathBuf>,
    csv_file: Option<PathBuf>,
) -> Result<(), CliError> {
    let scenario_str = std::fs::read_to_string(&scenario_path).map_err(|e| {
        CliError::runtime(format!("cannot read {}: {e}", scenario_path.display()))
    })?;
    let config = ScenarioConfig::from_toml(&scenario_str)?;
    let (assumptions, mut categories) = config.to_inputs()?;

    // --volumes file first, then --volume flags; later overrides win.
    let mut overrides: Vec<(String, i64)> = Vec::new();
    if let Some(ref path) = volumes_file {
        let csv_data = std::fs::read_to_string(path)
            .map_err(|e| CliError::runtime(format!("cannot read {}: {e}", path.display())))?;
        overrides.extend(load_volume_csv(&csv_data)?);
    }
    for arg in &volume_args {
        overrides.push(parse_volume_override(arg)?);
    }
    apply_volume_overrides(&mut categories, &overrides).map_err(|e| CliError {
        code: EXIT_INVALID_SCENARIO,
        message: e.to_string(),
        hint: Some("volume overrides must name a category from the scenario".into()),
    })?;

    let report = match compute(&config.name, &assumptions, &categories)? {
        ComputeOutcome::Computed(report) => report,
        ComputeOutcome::NothingToCompute => {
            eprintln!("Enter at least one volume above zero.");
            return Err(CliError {
                code: EXIT_NOTHING_TO_COMPUTE,
                message: String::new(),
                hint: None,
            });
        }
    };

    let envelope = RunReport {
        run_at: chrono::Utc::now().to_rfc3339(),
        report: &report,
    };
    let json_str = serde_json::to_string_pretty(&envelope)
        .map_err(|e| CliError::runtime(format!("JSON serialization error: {e}")))?;

    if let Some(ref path) = output_file {
        std::fs::write(path, &json_str)
            .map_err(|e| CliError::runtime(format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }
    if let Some(ref path) = csv_file {
        write_table_csv(path, &report)?;
        eprintln!("wrote {}", path.display());
    }

    if json_output {
        println!("{json_str}");
    }

    print_summary(&report);
    Ok(())
}

fn parse_volume_override(arg: &str) -> Result<(String, i64), CliError> {
    let (name, value) = arg
        .split_once('=')
        .ok_or_else(|| CliError::usage(format!("bad --volume '{arg}': expected NAME=N")))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(CliError::usage(format!(
            "bad --volume '{arg}': empty procedure name"
        )));
    }
    let volume: i64 = value.trim().parse().map_err(|_| {
        CliError::usage(format!("bad --volume '{arg}': '{value}' is not an integer"))
    })?;
    Ok((name.to_string(), volume))
}

/// Human summary to stderr: the per-category table plus the four headline
/// metrics (reconciliation payment, program cost, net impact, ROI).
fn print_summary(report: &RoiReport) {
    let name_width = report
        .rows
        .iter()
        .map(|r| r.name.len())
        .max()
        .unwrap_or(0)
        .max("procedure".len());

    eprintln!(
        "scenario '{}': {} categories, {} episodes",
        report.meta.scenario,
        report.rows.len(),
        report.totals.total_volume,
    );
    eprintln!(
        "  {:<name_width$}  {:>6}  {:>9}  {:>13}  {:>14}",
        "procedure", "volume", "reduction", "per episode", "annual (adj.)",
    );
    for row in &report.rows {
        eprintln!(
            "  {:<name_width$}  {:>6}  {:>8.1}%  {:>13}  {:>14}",
            row.name,
            row.annual_volume,
            row.cost_reduction_pct,
            fmt_usd(row.reconciliation_per_episode),
            fmt_usd(row.quality_adjusted_reconciliation),
        );
    }
    eprintln!("reconciliation payment: {}", fmt_usd(report.totals.total_reconciliation));
    eprintln!("program cost:           {}", fmt_usd(report.totals.program_cost_total));
    eprintln!("net impact:             {}", fmt_usd(report.totals.net_impact));
    eprintln!("ROI:                    {:.1}%", report.totals.roi_pct);
}

fn write_table_csv(path: &std::path::Path, report: &RoiReport) -> Result<(), CliError> {
    let mut writer = csv::WriterBuilder::new()
        .from_path(path)
        .map_err(|e| CliError::runtime(format!("cannot write {}: {e}", path.display())))?;

    writer
        .write_record([
            "procedure",
            "annual_volume",
            "baseline_cost",
            "cost_reduction_pct",
            "target_price",
            "expected_cost",
            "reconciliation_per_episode",
            "annual_reconciliation",
            "quality_adjusted_reconciliation",
        ])
        .map_err(|e| CliError::runtime(e.to_string()))?;

    for row in &report.rows {
        writer
            .write_record(&[
                row.name.clone(),
                row.annual_volume.to_string(),
                row.baseline_cost.to_string(),
                row.cost_reduction_pct.to_string(),
                row.target_price.to_string(),
                row.expected_cost.to_string(),
                row.reconciliation_per_episode.to_string(),
                row.annual_reconciliation.to_string(),
                row.quality_adjusted_reconciliation.to_string(),
            ])
            .map_err(|e| CliError::runtime(e.to_string()))?;
    }

    writer
        .flush()
        .map_err(|e| CliError::runtime(e.to_string()))
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn cmd_validate(scenario_path: PathBuf) -> Result<(), CliError> {
    let scenario_str = std::fs::read_to_string(&scenario_path).map_err(|e| {
        CliError::runtime(format!("cannot read {}: {e}", scenario_path.display()))
    })?;
    let config = ScenarioConfig::from_toml(&scenario_str)?;
    let (assumptions, categories) = config.to_inputs()?;

    let basis = match assumptions.program_cost {
        ProgramCost::PerEpisode(cost) => format!("{} per episode", fmt_usd(cost)),
        ProgramCost::Flat(cost) => format!("{} flat", fmt_usd(cost)),
    };
    println!(
        "scenario '{}': {} categories, program cost {}",
        config.name,
        categories.len(),
        basis,
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// catalog
// ---------------------------------------------------------------------------

fn cmd_catalog(json_output: bool) -> Result<(), CliError> {
    let entries = catalog::catalog_entries();

    if json_output {
        let json_str = serde_json::to_string_pretty(&entries)
            .map_err(|e| CliError::runtime(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
        return Ok(());
    }

    let name_width = entries
        .iter()
        .map(|e| e.name.len())
        .max()
        .unwrap_or(0)
        .max("procedure".len());

    println!(
        "{:<name_width$}  {:>12}  {:>8}  {:>9}",
        "procedure", "baseline", "snf util", "reduction",
    );
    for entry in &entries {
        println!(
            "{:<name_width$}  {:>12}  {:>7.0}%  {:>8.1}%",
            entry.name,
            fmt_usd(entry.baseline_cost),
            entry.snf_utilization * 100.0,
            entry.cost_reduction_pct,
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// formatting
// ---------------------------------------------------------------------------

/// Dollar amount with thousands separators, two decimals: -1234.5 -> "-$1,234.50".
fn fmt_usd(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as i64;
    let whole = (cents / 100).to_string();
    let fraction = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && cents != 0 { "-" } else { "" };
    format!("{sign}${grouped}.{fraction:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fmt_usd_grouping() {
        assert_eq!(fmt_usd(0.0), "$0.00");
        assert_eq!(fmt_usd(999.0), "$999.00");
        assert_eq!(fmt_usd(1_000.0), "$1,000.00");
        assert_eq!(fmt_usd(164_792.9), "$164,792.90");
        assert_eq!(fmt_usd(1_234_567.891), "$1,234,567.89");
    }

    #[test]
    fn fmt_usd_negative() {
        assert_eq!(fmt_usd(-1_234.5), "-$1,234.50");
        assert_eq!(fmt_usd(-0.004), "$0.00");
    }

    #[test]
    fn volume_override_parses() {
        let (name, volume) = parse_volume_override("Spinal fusion=40").unwrap();
        assert_eq!(name, "Spinal fusion");
        assert_eq!(volume, 40);

        let (name, volume) = parse_volume_override(" Hip/femur fracture = 85 ").unwrap();
        assert_eq!(name, "Hip/femur fracture");
        assert_eq!(volume, 85);
    }

    #[test]
    fn volume_override_rejects_malformed() {
        assert_eq!(parse_volume_override("Spinal fusion").unwrap_err().code, EXIT_USAGE);
        assert_eq!(parse_volume_override("=40").unwrap_err().code, EXIT_USAGE);
        assert_eq!(
            parse_volume_override("Spinal fusion=many").unwrap_err().code,
            EXIT_USAGE
        );
    }
}
