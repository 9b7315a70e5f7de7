pub mod config;
pub mod error;
pub mod group;
pub mod record;
pub mod severity;
pub mod timestamp;

pub use config::AnalyzerConfig;
pub use error::ApilensError;
pub use group::{EndpointGroups, group_by_endpoint};
pub use record::{ValidLog, is_valid, validate, validate_all};
pub use severity::Severity;
pub use timestamp::{Instant, parse_timestamp};
