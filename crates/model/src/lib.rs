//! `teamroi-model`: bundled-payment ROI model engine.
//!
//! Pure engine crate: receives economic assumptions and per-category
//! volumes, returns per-category financial rows plus aggregate ROI figures.
//! No CLI or IO dependencies.

pub mod aggregate;
pub mod catalog;
pub mod config;
pub mod derived;
pub mod engine;
pub mod error;
pub mod model;

pub use config::ScenarioConfig;
pub use engine::compute;
pub use error::ModelError;
pub use model::{ComputeOutcome, EconomicAssumptions, EpisodeCategory, RoiReport};
