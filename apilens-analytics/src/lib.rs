pub mod aggregate;
pub mod analyzer;
pub mod anomaly;
pub mod recommend;
pub mod report;
pub mod stats;

pub use analyzer::{Analyzer, analyze_api_logs};
pub use report::Report;
