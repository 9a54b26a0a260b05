// src/lib.rs
pub mod analysis;
pub mod config;
pub mod extractors;
pub mod metrics;
pub mod report;
pub mod source;
pub mod storage;
pub mod table;
pub mod utils;

pub use analysis::{analyze, Analysis};
pub use config::AnalysisConfig;
pub use utils::AppError;
