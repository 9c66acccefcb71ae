use std::path::PathBuf;

use teamroi_model::engine::{apply_volume_overrides, compute, load_volume_csv};
use teamroi_model::model::{ComputeOutcome, RoiReport};
use teamroi_model::ScenarioConfig;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn read_fixture(file: &str) -> String {
    let path = fixtures_dir().join(file);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()))
}

fn load_and_run(file: &str) -> ComputeOutcome {
    let config = ScenarioConfig::from_toml(&read_fixture(file)).unwrap();
    let (assumptions, categories) = config.to_inputs().unwrap();
    compute(&config.name, &assumptions, &categories).unwrap()
}

fn computed(outcome: ComputeOutcome) -> RoiReport {
    match outcome {
        ComputeOutcome::Computed(report) => report,
        ComputeOutcome::NothingToCompute => panic!("expected a computed report"),
    }
}

fn close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn community_hospital_year_one() {
    let report = computed(load_and_run("community-hospital.toml"));

    assert_eq!(report.meta.scenario, "Community hospital, year one");
    assert_eq!(report.rows.len(), 4);

    // Derived reductions under the published assumptions.
    let reductions: Vec<f64> = report.rows.iter().map(|r| r.cost_reduction_pct).collect();
    assert_eq!(reductions, vec![9.2, 15.1, 2.9, 2.3]);

    // Low-utilization procedures lose money per episode at these volumes.
    assert!(report.rows[2].reconciliation_per_episode < 0.0);
    assert!(report.rows[3].reconciliation_per_episode < 0.0);

    assert_eq!(report.totals.total_volume, 275);
    close(report.totals.program_cost_total, 275_000.0);
    close(report.totals.total_reconciliation, 493_012.1125);
    close(report.totals.net_impact, 218_012.1125);
    assert!((report.totals.roi_pct - 79.2771).abs() < 1e-3);
}

#[test]
fn flat_implementation_cost() {
    let report = computed(load_and_run("flat-cost.toml"));

    assert_eq!(report.totals.total_volume, 150);
    // Flat basis: volume does not drive the program cost.
    close(report.totals.program_cost_total, 120_000.0);
    close(report.totals.total_reconciliation, 259_576.4);
    close(report.totals.net_impact, 139_576.4);
    assert!((report.totals.roi_pct - 116.3137).abs() < 1e-3);
}

#[test]
fn catalog_without_volumes_is_nothing_to_compute() {
    let outcome = load_and_run("catalog-defaults.toml");
    assert!(matches!(outcome, ComputeOutcome::NothingToCompute));
}

#[test]
fn catalog_with_csv_volumes_matches_explicit_scenario() {
    let config = ScenarioConfig::from_toml(&read_fixture("catalog-defaults.toml")).unwrap();
    let (assumptions, mut categories) = config.to_inputs().unwrap();

    let volumes = load_volume_csv(&read_fixture("volumes.csv")).unwrap();
    apply_volume_overrides(&mut categories, &volumes).unwrap();

    let from_catalog = computed(compute(&config.name, &assumptions, &categories).unwrap());
    let explicit = computed(load_and_run("community-hospital.toml"));

    assert_eq!(
        from_catalog.totals.total_volume,
        explicit.totals.total_volume
    );
    assert_eq!(
        from_catalog.totals.total_reconciliation,
        explicit.totals.total_reconciliation
    );
    assert_eq!(from_catalog.totals.roi_pct, explicit.totals.roi_pct);
}
