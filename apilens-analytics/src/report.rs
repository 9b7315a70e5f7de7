//! Report document produced by the analyzer.
//!
//! Every section is always present. Sections that are objects when filled
//! (`summary`, `size_insights`, `total_potential_savings`) render as `{}`
//! when the batch held no valid records.

use apilens_core::Severity;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    #[serde(serialize_with = "empty_object::serialize")]
    pub summary: Option<Summary>,
    pub endpoint_stats: Vec<EndpointStats>,
    pub performance_issues: Vec<PerformanceIssue>,
    #[serde(serialize_with = "empty_object::serialize")]
    pub size_insights: Option<SizeInsights>,
    pub hourly_distribution: BTreeMap<String, usize>,
    pub top_users_by_requests: Vec<TopUser>,
    pub recommendations: Vec<String>,
    pub anomalies: Anomalies,
    pub caching_opportunities: Vec<CachingOpportunity>,
    #[serde(serialize_with = "empty_object::serialize")]
    pub total_potential_savings: Option<PotentialSavings>,
}

impl Report {
    /// The report for a batch with no valid records.
    pub fn empty() -> Self {
        Self {
            summary: None,
            endpoint_stats: Vec::new(),
            performance_issues: Vec::new(),
            size_insights: None,
            hourly_distribution: BTreeMap::new(),
            top_users_by_requests: Vec::new(),
            recommendations: Vec::new(),
            anomalies: Anomalies::default(),
            caching_opportunities: Vec::new(),
            total_potential_savings: None,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_requests: usize,
    pub time_range: TimeRange,
    pub avg_response_time_ms: f64,
    pub error_rate_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeRange {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointStats {
    pub endpoint: String,
    pub request_count: usize,
    pub avg_response_time_ms: f64,
    pub slowest_request_ms: f64,
    pub fastest_request_ms: f64,
    pub p95_response_time_ms: f64,
    pub p99_response_time_ms: f64,
    pub error_count: usize,
    pub error_rate_percentage: f64,
    pub most_common_status: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PerformanceIssue {
    SlowEndpoint {
        endpoint: String,
        avg_response_time_ms: f64,
        threshold_ms: f64,
        severity: Severity,
    },
    HighErrorRate {
        endpoint: String,
        error_rate_percentage: f64,
        severity: Severity,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizeInsights {
    pub avg_request_size_bytes: f64,
    pub avg_response_size_bytes: f64,
    /// The full record with the largest request body.
    pub largest_request: Value,
    pub largest_response: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopUser {
    pub user_id: String,
    pub request_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Anomalies {
    pub response_time_spikes: Vec<ResponseTimeSpike>,
    /// 5xx records, verbatim.
    pub server_errors: Vec<Value>,
    pub request_spikes: Vec<RequestSpike>,
    pub error_clusters: Vec<ErrorCluster>,
    pub suspicious_endpoints: BTreeMap<String, usize>,
    pub suspicious_users: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseTimeSpike {
    pub endpoint: String,
    pub timestamp: String,
    pub user_id: String,
    pub response_time_ms: f64,
    pub baseline_ms: f64,
    /// `response_time_ms / baseline_ms`.
    pub multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestSpike {
    pub endpoint: String,
    pub window_start: String,
    pub requests_in_window: usize,
    pub expected_requests_in_window: f64,
    pub actual_rate_per_minute: f64,
    pub normal_rate_per_minute: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorCluster {
    pub endpoint: String,
    pub error_count: usize,
    pub window_start: String,
    pub window_end: String,
    pub time_range: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CachingOpportunity {
    pub endpoint: String,
    pub current_requests: usize,
    pub get_ratio_percentage: f64,
    pub potential_cache_hit_rate: f64,
    pub potential_requests_saved: u64,
    pub estimated_cost_savings_usd: f64,
    pub performance_improvement_ms: u64,
    pub recommended_ttl_minutes: u64,
    pub confidence: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PotentialSavings {
    pub total_requests_saved: u64,
    pub total_cost_savings_usd: f64,
    pub total_performance_improvement_ms: u64,
}

mod empty_object {
    use serde::ser::{Serialize, SerializeMap, Serializer};

    pub fn serialize<S, T>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_map(Some(0))?.end(),
        }
    }
}
