use crate::report::Report;
use crate::{aggregate, anomaly, recommend};
use apilens_core::config::AnalyzerConfig;
use apilens_core::group::group_by_endpoint;
use apilens_core::record::validate_all;
use serde_json::Value;
use tracing::{debug, info};

/// Runs the analysis pipeline with a fixed configuration.
///
/// Holds no state between calls: the same records always produce the same
/// report.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    config: AnalyzerConfig,
}

impl Analyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Validate, aggregate, detect anomalies and estimate caching savings.
    ///
    /// Invalid records are dropped; a batch with no valid records yields
    /// [`Report::empty`].
    pub fn analyze(&self, records: &[Value]) -> Report {
        let valid = validate_all(records);
        debug!(
            received = records.len(),
            valid = valid.len(),
            dropped = records.len() - valid.len(),
            "Validated access log batch"
        );
        if valid.is_empty() {
            return Report::empty();
        }

        let cfg = &self.config;
        let groups = group_by_endpoint(&valid);
        let endpoint_stats = aggregate::endpoint_stats(&groups);

        let performance_issues = aggregate::performance_issues(&endpoint_stats, &cfg.severity);
        let anomalies = anomaly::detect_anomalies(&valid, &groups, &endpoint_stats, &cfg.anomaly);
        let recommendations =
            recommend::recommendations(&groups, &endpoint_stats, &cfg.cache, &cfg.recommendations);
        let caching_opportunities = recommend::caching_opportunities(&groups, &endpoint_stats, &cfg.cache);
        let total_potential_savings = recommend::total_savings(&caching_opportunities);

        let report = Report {
            summary: aggregate::summarize(&valid),
            endpoint_stats,
            performance_issues,
            size_insights: aggregate::size_insights(&valid),
            hourly_distribution: aggregate::hourly_distribution(&valid),
            top_users_by_requests: aggregate::top_users(&valid, cfg.top_users_limit),
            recommendations,
            anomalies,
            caching_opportunities,
            total_potential_savings: Some(total_potential_savings),
        };

        info!(
            requests = valid.len(),
            endpoints = groups.len(),
            performance_issues = report.performance_issues.len(),
            caching_opportunities = report.caching_opportunities.len(),
            "Access log analysis complete"
        );
        report
    }
}

/// Analyze a batch with the default thresholds.
pub fn analyze_api_logs(records: &[Value]) -> Report {
    Analyzer::default().analyze(records)
}
