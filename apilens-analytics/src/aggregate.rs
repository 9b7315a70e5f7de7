//! Report sections computed directly from the valid-log set.

use crate::report::{EndpointStats, PerformanceIssue, SizeInsights, Summary, TimeRange, TopUser};
use crate::stats::{OrderedCounter, error_rate_percent, mean, percentile, round2};
use apilens_core::config::SeverityConfig;
use apilens_core::group::EndpointGroups;
use apilens_core::record::ValidLog;
use apilens_core::severity::{classify_error_rate, classify_response_time};
use apilens_core::timestamp::{format_timestamp, hour_bucket};
use std::collections::BTreeMap;

/// Batch-wide totals. `None` for an empty set.
pub fn summarize(logs: &[ValidLog<'_>]) -> Option<Summary> {
    let start = logs.iter().map(|l| l.timestamp).min()?;
    let end = logs.iter().map(|l| l.timestamp).max()?;
    let errors = logs.iter().filter(|l| l.is_error()).count();

    Some(Summary {
        total_requests: logs.len(),
        time_range: TimeRange {
            start: format_timestamp(&start),
            end: format_timestamp(&end),
        },
        avg_response_time_ms: round2(mean(logs.iter().map(|l| l.response_time_ms))),
        error_rate_percentage: error_rate_percent(errors, logs.len()),
    })
}

/// Per-endpoint latency and error statistics, in group order.
pub fn endpoint_stats(groups: &EndpointGroups<'_, '_>) -> Vec<EndpointStats> {
    groups
        .iter()
        .filter_map(|(endpoint, logs)| {
            let times: Vec<f64> = logs.iter().map(|l| l.response_time_ms).collect();
            let slowest = times.iter().copied().reduce(f64::max)?;
            let fastest = times.iter().copied().reduce(f64::min)?;
            let error_count = logs.iter().filter(|l| l.is_error()).count();
            let statuses: OrderedCounter<i64> = logs.iter().map(|l| l.status_code).collect();

            Some(EndpointStats {
                endpoint: endpoint.to_string(),
                request_count: logs.len(),
                avg_response_time_ms: round2(mean(times.iter().copied())),
                slowest_request_ms: slowest,
                fastest_request_ms: fastest,
                p95_response_time_ms: percentile(&times, 95.0),
                p99_response_time_ms: percentile(&times, 99.0),
                error_count,
                error_rate_percentage: error_rate_percent(error_count, logs.len()),
                most_common_status: statuses.mode().copied()?,
            })
        })
        .collect()
}

/// Slow-endpoint and error-rate issues; an endpoint yields zero to two.
pub fn performance_issues(stats: &[EndpointStats], severity: &SeverityConfig) -> Vec<PerformanceIssue> {
    let mut issues = Vec::new();
    for s in stats {
        if let Some(level) = classify_response_time(s.avg_response_time_ms, &severity.response_time_ms) {
            issues.push(PerformanceIssue::SlowEndpoint {
                endpoint: s.endpoint.clone(),
                avg_response_time_ms: s.avg_response_time_ms,
                threshold_ms: severity.response_time_ms.medium,
                severity: level,
            });
        }
        if let Some(level) = classify_error_rate(s.error_rate_percentage, &severity.error_rate_percent) {
            issues.push(PerformanceIssue::HighErrorRate {
                endpoint: s.endpoint.clone(),
                error_rate_percentage: s.error_rate_percentage,
                severity: level,
            });
        }
    }
    issues
}

/// Payload-size averages and the largest request/response records.
pub fn size_insights(logs: &[ValidLog<'_>]) -> Option<SizeInsights> {
    let largest_request = first_max_by(logs, |l| l.request_size_bytes)?;
    let largest_response = first_max_by(logs, |l| l.response_size_bytes)?;

    Some(SizeInsights {
        avg_request_size_bytes: round2(mean(logs.iter().map(|l| l.request_size_bytes))),
        avg_response_size_bytes: round2(mean(logs.iter().map(|l| l.response_size_bytes))),
        largest_request: largest_request.raw.clone(),
        largest_response: largest_response.raw.clone(),
    })
}

/// Request counts keyed by `"HH:00"`; different days share a bucket.
pub fn hourly_distribution(logs: &[ValidLog<'_>]) -> BTreeMap<String, usize> {
    let mut buckets = BTreeMap::new();
    for log in logs {
        *buckets.entry(hour_bucket(&log.timestamp)).or_insert(0) += 1;
    }
    buckets
}

/// The `limit` busiest users; ties keep first-occurrence order.
pub fn top_users(logs: &[ValidLog<'_>], limit: usize) -> Vec<TopUser> {
    let counter: OrderedCounter<&str> = logs.iter().map(|l| &*l.user_id).collect();
    counter
        .most_common(limit)
        .into_iter()
        .map(|(user_id, request_count)| TopUser {
            user_id: user_id.to_string(),
            request_count,
        })
        .collect()
}

/// First log holding the maximum of `key`.
fn first_max_by<'r, 'a>(
    logs: &'r [ValidLog<'a>],
    key: impl Fn(&ValidLog<'a>) -> f64,
) -> Option<&'r ValidLog<'a>> {
    let mut best: Option<(&ValidLog<'a>, f64)> = None;
    for log in logs {
        let value = key(log);
        if best.is_none_or(|(_, b)| value > b) {
            best = Some((log, value));
        }
    }
    best.map(|(log, _)| log)
}

#[cfg(test)]
mod tests {
    use super::*;
    use apilens_core::{group_by_endpoint, validate_all};
    use serde_json::{Value, json};

    fn log(ts: &str, endpoint: &str, rt: f64, status: i64, user: &str) -> Value {
        json!({
            "timestamp": ts,
            "endpoint": endpoint,
            "method": "GET",
            "response_time_ms": rt,
            "status_code": status,
            "user_id": user,
            "request_size_bytes": 100,
            "response_size_bytes": 200
        })
    }

    #[test]
    fn summary_covers_time_range_and_rates() {
        let records = vec![
            log("2025-01-15T10:05:00Z", "/a", 100.0, 200, "u1"),
            log("2025-01-15T09:00:00Z", "/a", 200.0, 500, "u1"),
            log("2025-01-15T11:30:00Z", "/b", 300.0, 404, "u2"),
        ];
        let valid = validate_all(&records);
        let summary = summarize(&valid).unwrap();
        assert_eq!(summary.total_requests, 3);
        assert_eq!(summary.time_range.start, "2025-01-15T09:00:00Z");
        assert_eq!(summary.time_range.end, "2025-01-15T11:30:00Z");
        assert_eq!(summary.avg_response_time_ms, 200.0);
        assert_eq!(summary.error_rate_percentage, 66.67);
    }

    #[test]
    fn summary_of_nothing_is_none() {
        assert!(summarize(&[]).is_none());
        assert!(size_insights(&[]).is_none());
    }

    #[test]
    fn endpoint_stats_compute_extremes_and_mode() {
        let records = vec![
            log("2025-01-15T10:00:00Z", "/a", 100.0, 200, "u1"),
            log("2025-01-15T10:01:00Z", "/a", 200.0, 503, "u1"),
            log("2025-01-15T10:02:00Z", "/b", 50.0, 201, "u1"),
        ];
        let valid = validate_all(&records);
        let stats = endpoint_stats(&group_by_endpoint(&valid));
        assert_eq!(stats.len(), 2);

        let a = &stats[0];
        assert_eq!(a.endpoint, "/a");
        assert_eq!(a.request_count, 2);
        assert_eq!(a.avg_response_time_ms, 150.0);
        assert_eq!(a.slowest_request_ms, 200.0);
        assert_eq!(a.fastest_request_ms, 100.0);
        assert_eq!(a.error_count, 1);
        assert_eq!(a.error_rate_percentage, 50.0);
        assert_eq!(a.most_common_status, 200);
        assert_eq!(a.p95_response_time_ms, 200.0);
        assert_eq!(stats[1].most_common_status, 201);
    }

    #[test]
    fn performance_issues_emit_both_kinds() {
        let records = vec![
            log("2025-01-15T10:00:00Z", "/slow", 1000.0, 500, "u1"),
            log("2025-01-15T10:00:00Z", "/fast", 10.0, 200, "u1"),
        ];
        let valid = validate_all(&records);
        let stats = endpoint_stats(&group_by_endpoint(&valid));
        let issues = performance_issues(&stats, &SeverityConfig::default());
        assert_eq!(
            issues,
            vec![
                PerformanceIssue::SlowEndpoint {
                    endpoint: "/slow".into(),
                    avg_response_time_ms: 1000.0,
                    threshold_ms: 500.0,
                    severity: apilens_core::Severity::High,
                },
                PerformanceIssue::HighErrorRate {
                    endpoint: "/slow".into(),
                    error_rate_percentage: 100.0,
                    severity: apilens_core::Severity::Critical,
                },
            ]
        );
    }

    #[test]
    fn largest_payload_ties_go_to_first_record() {
        let mut first = log("2025-01-15T10:00:00Z", "/a", 1.0, 200, "first");
        first["request_size_bytes"] = json!(900);
        let mut second = log("2025-01-15T10:00:00Z", "/a", 1.0, 200, "second");
        second["request_size_bytes"] = json!(900);
        second["response_size_bytes"] = json!(5000);
        let records = vec![first.clone(), second.clone()];
        let valid = validate_all(&records);

        let insights = size_insights(&valid).unwrap();
        assert_eq!(insights.largest_request, first);
        assert_eq!(insights.largest_response, second);
        assert_eq!(insights.avg_request_size_bytes, 900.0);
        assert_eq!(insights.avg_response_size_bytes, 2600.0);
    }

    #[test]
    fn hourly_buckets_merge_days() {
        let records = vec![
            log("2025-01-15T10:00:00Z", "/a", 1.0, 200, "u1"),
            log("2025-01-16T10:59:00Z", "/a", 1.0, 200, "u1"),
            log("2025-01-16T23:00:00Z", "/a", 1.0, 200, "u1"),
        ];
        let valid = validate_all(&records);
        let hours = hourly_distribution(&valid);
        assert_eq!(hours.get("10:00"), Some(&2));
        assert_eq!(hours.get("23:00"), Some(&1));
        assert_eq!(hours.len(), 2);
    }

    #[test]
    fn top_users_rank_by_count_then_first_seen() {
        let users = ["u3", "u1", "u2", "u1", "u3", "u4", "u5", "u6"];
        let records: Vec<Value> = users
            .iter()
            .map(|u| log("2025-01-15T10:00:00Z", "/a", 1.0, 200, u))
            .collect();
        let valid = validate_all(&records);
        let top = top_users(&valid, 5);
        let ids: Vec<&str> = top.iter().map(|t| t.user_id.as_str()).collect();
        assert_eq!(ids, vec!["u3", "u1", "u2", "u4", "u5"]);
        assert_eq!(top[0].request_count, 2);
    }
}
