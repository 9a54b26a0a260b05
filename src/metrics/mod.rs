// src/metrics/mod.rs
pub mod growth;

pub use growth::{records_to_table, scalar_growth, GrowthCalculator, GrowthSeries};
