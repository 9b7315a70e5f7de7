use figment::{Figment, providers::{Env, Format, Yaml}};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level analyzer configuration.
///
/// Every threshold the pipeline consults lives here, so a run is fully
/// determined by `(records, config)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    #[serde(default)]
    pub severity: SeverityConfig,
    #[serde(default)]
    pub anomaly: AnomalyConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub recommendations: RecommendationConfig,
    /// Number of entries in `top_users_by_requests`.
    #[serde(default = "default_top_users_limit")]
    pub top_users_limit: usize,
}

/// Severity ladders used by the performance issue detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityConfig {
    #[serde(default = "default_response_time_thresholds")]
    pub response_time_ms: SeverityThresholds,
    #[serde(default = "default_error_rate_thresholds")]
    pub error_rate_percent: SeverityThresholds,
}

/// Ascending bounds; a value at or above a bound earns that severity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeverityThresholds {
    pub medium: f64,
    pub high: f64,
    pub critical: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyConfig {
    /// A request spikes when its latency exceeds `multiplier × endpoint mean`.
    #[serde(default = "default_response_spike_multiplier")]
    pub response_spike_multiplier: f64,
    #[serde(default = "default_window_minutes")]
    pub request_spike_window_minutes: i64,
    #[serde(default = "default_request_spike_rate_multiplier")]
    pub request_spike_rate_multiplier: f64,
    #[serde(default = "default_window_minutes")]
    pub error_cluster_window_minutes: i64,
    /// Minimum errors inside one window to report a cluster.
    #[serde(default = "default_error_cluster_threshold")]
    pub error_cluster_threshold: usize,
    /// Share of all requests (0.0–1.0) above which a user or endpoint is suspicious.
    #[serde(default = "default_suspicious_traffic_threshold")]
    pub suspicious_traffic_threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_min_requests")]
    pub min_requests: usize,
    /// Fraction of GET requests (0.0–1.0).
    #[serde(default = "default_cache_min_get_ratio")]
    pub min_get_ratio: f64,
    /// Error rate in percent.
    #[serde(default = "default_cache_max_error_rate")]
    pub max_error_rate: f64,
    #[serde(default = "default_cache_hit_rate_assumption")]
    pub hit_rate_assumption: f64,
    /// USD saved per request served from cache.
    #[serde(default = "default_cache_cost_saving_per_request")]
    pub cost_saving_per_request: f64,
    #[serde(default = "default_cache_ttl_minutes")]
    pub recommended_ttl_minutes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationConfig {
    #[serde(default = "default_slow_endpoint_threshold_ms")]
    pub slow_endpoint_threshold_ms: f64,
    #[serde(default = "default_error_rate_alert_percent")]
    pub error_rate_alert_percent: f64,
}

// ── Defaults ──────────────────────────────────────────────────

fn default_top_users_limit() -> usize { 5 }
fn default_response_time_thresholds() -> SeverityThresholds {
    SeverityThresholds { medium: 500.0, high: 1000.0, critical: 2000.0 }
}
fn default_error_rate_thresholds() -> SeverityThresholds {
    SeverityThresholds { medium: 5.0, high: 10.0, critical: 15.0 }
}
fn default_response_spike_multiplier() -> f64 { 2.0 }
fn default_window_minutes() -> i64 { 5 }
fn default_request_spike_rate_multiplier() -> f64 { 3.0 }
fn default_error_cluster_threshold() -> usize { 10 }
fn default_suspicious_traffic_threshold() -> f64 { 0.50 }
fn default_cache_min_requests() -> usize { 100 }
fn default_cache_min_get_ratio() -> f64 { 0.80 }
fn default_cache_max_error_rate() -> f64 { 2.0 }
fn default_cache_hit_rate_assumption() -> f64 { 0.90 }
fn default_cache_cost_saving_per_request() -> f64 { 0.001 }
fn default_cache_ttl_minutes() -> u64 { 15 }
fn default_slow_endpoint_threshold_ms() -> f64 { 500.0 }
fn default_error_rate_alert_percent() -> f64 { 5.0 }

// ── Impls ─────────────────────────────────────────────────────

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            severity: SeverityConfig::default(),
            anomaly: AnomalyConfig::default(),
            cache: CacheConfig::default(),
            recommendations: RecommendationConfig::default(),
            top_users_limit: default_top_users_limit(),
        }
    }
}

impl Default for SeverityConfig {
    fn default() -> Self {
        Self {
            response_time_ms: default_response_time_thresholds(),
            error_rate_percent: default_error_rate_thresholds(),
        }
    }
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            response_spike_multiplier: default_response_spike_multiplier(),
            request_spike_window_minutes: default_window_minutes(),
            request_spike_rate_multiplier: default_request_spike_rate_multiplier(),
            error_cluster_window_minutes: default_window_minutes(),
            error_cluster_threshold: default_error_cluster_threshold(),
            suspicious_traffic_threshold: default_suspicious_traffic_threshold(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            min_requests: default_cache_min_requests(),
            min_get_ratio: default_cache_min_get_ratio(),
            max_error_rate: default_cache_max_error_rate(),
            hit_rate_assumption: default_cache_hit_rate_assumption(),
            cost_saving_per_request: default_cache_cost_saving_per_request(),
            recommended_ttl_minutes: default_cache_ttl_minutes(),
        }
    }
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            slow_endpoint_threshold_ms: default_slow_endpoint_threshold_ms(),
            error_rate_alert_percent: default_error_rate_alert_percent(),
        }
    }
}

impl AnalyzerConfig {
    /// Load configuration from YAML file + env overrides.
    ///
    /// Env keys use `__` for nesting, e.g.
    /// `APILENS_ANOMALY__RESPONSE_SPIKE_MULTIPLIER=2.5`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let config: AnalyzerConfig = Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed("APILENS_").split("__"))
            .extract()?;
        Ok(config)
    }
}
