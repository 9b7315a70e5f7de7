use crate::config::SeverityThresholds;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity ladder shared by every classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SeverityThresholds {
    /// Highest severity whose bound `value` reaches (inclusive `>=`).
    pub fn classify(&self, value: f64) -> Option<Severity> {
        if value >= self.critical {
            Some(Severity::Critical)
        } else if value >= self.high {
            Some(Severity::High)
        } else if value >= self.medium {
            Some(Severity::Medium)
        } else {
            None
        }
    }
}

/// Classify a mean response time in milliseconds.
pub fn classify_response_time(avg_ms: f64, thresholds: &SeverityThresholds) -> Option<Severity> {
    thresholds.classify(avg_ms)
}

/// Classify an error rate given in percent.
pub fn classify_error_rate(rate_percent: f64, thresholds: &SeverityThresholds) -> Option<Severity> {
    thresholds.classify(rate_percent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SeverityConfig;

    #[test]
    fn response_time_ladder() {
        let t = SeverityConfig::default().response_time_ms;
        assert_eq!(classify_response_time(100.0, &t), None);
        assert_eq!(classify_response_time(499.99, &t), None);
        assert_eq!(classify_response_time(500.0, &t), Some(Severity::Medium));
        assert_eq!(classify_response_time(999.0, &t), Some(Severity::Medium));
        assert_eq!(classify_response_time(1000.0, &t), Some(Severity::High));
        assert_eq!(classify_response_time(2000.0, &t), Some(Severity::Critical));
        assert_eq!(classify_response_time(9000.0, &t), Some(Severity::Critical));
    }

    #[test]
    fn error_rate_uses_the_same_inclusive_rule() {
        let t = SeverityConfig::default().error_rate_percent;
        assert_eq!(classify_error_rate(4.99, &t), None);
        assert_eq!(classify_error_rate(5.0, &t), Some(Severity::Medium));
        assert_eq!(classify_error_rate(10.0, &t), Some(Severity::High));
        assert_eq!(classify_error_rate(15.0, &t), Some(Severity::Critical));
    }

    #[test]
    fn severity_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Severity::High).unwrap(), "\"high\"");
        assert_eq!(Severity::Critical.to_string(), "critical");
    }
}
