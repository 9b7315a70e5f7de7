//! Rule-based anomaly detection.
//!
//! Five independent checks share the valid-log set and the per-endpoint mean
//! latencies computed by [`crate::aggregate::endpoint_stats`]:
//!
//! | Check                   | Output field            |
//! |-------------------------|-------------------------|
//! | latency over baseline   | `response_time_spikes`  |
//! | 5xx responses           | `server_errors`         |
//! | request-rate window     | `request_spikes`        |
//! | error window            | `error_clusters`        |
//! | traffic concentration   | `suspicious_*`          |

use crate::report::{Anomalies, EndpointStats, ErrorCluster, RequestSpike, ResponseTimeSpike};
use crate::stats::{OrderedCounter, round2};
use apilens_core::config::AnomalyConfig;
use apilens_core::group::EndpointGroups;
use apilens_core::record::ValidLog;
use apilens_core::timestamp::{Instant, format_timestamp};
use chrono::TimeDelta;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

pub fn detect_anomalies(
    logs: &[ValidLog<'_>],
    groups: &EndpointGroups<'_, '_>,
    stats: &[EndpointStats],
    config: &AnomalyConfig,
) -> Anomalies {
    let baselines: HashMap<&str, f64> = stats
        .iter()
        .map(|s| (s.endpoint.as_str(), s.avg_response_time_ms))
        .collect();

    let anomalies = Anomalies {
        response_time_spikes: response_time_spikes(logs, &baselines, config.response_spike_multiplier),
        server_errors: logs
            .iter()
            .filter(|l| l.is_server_error())
            .map(|l| l.raw.clone())
            .collect(),
        request_spikes: request_spikes(groups, config),
        error_clusters: error_clusters(groups, config),
        suspicious_endpoints: concentrated(
            logs.iter().map(|l| &*l.endpoint),
            logs.len(),
            config.suspicious_traffic_threshold,
        ),
        suspicious_users: concentrated(
            logs.iter().map(|l| &*l.user_id),
            logs.len(),
            config.suspicious_traffic_threshold,
        ),
    };

    debug!(
        response_time_spikes = anomalies.response_time_spikes.len(),
        server_errors = anomalies.server_errors.len(),
        request_spikes = anomalies.request_spikes.len(),
        error_clusters = anomalies.error_clusters.len(),
        "Anomaly detection finished"
    );
    anomalies
}

/// Requests slower than `multiplier × endpoint mean`. A zero or missing
/// baseline never spikes.
fn response_time_spikes(
    logs: &[ValidLog<'_>],
    baselines: &HashMap<&str, f64>,
    multiplier: f64,
) -> Vec<ResponseTimeSpike> {
    logs.iter()
        .filter_map(|log| {
            let baseline = *baselines.get(&*log.endpoint)?;
            if baseline <= 0.0 || log.response_time_ms <= multiplier * baseline {
                return None;
            }
            Some(ResponseTimeSpike {
                endpoint: log.endpoint.to_string(),
                timestamp: format_timestamp(&log.timestamp),
                user_id: log.user_id.to_string(),
                response_time_ms: log.response_time_ms,
                baseline_ms: baseline,
                multiplier: round2(log.response_time_ms / baseline),
            })
        })
        .collect()
}

/// First window per endpoint whose request count exceeds
/// `request_spike_rate_multiplier × expected`, where expected is the
/// endpoint's average rate over its whole span scaled to the window.
fn request_spikes(groups: &EndpointGroups<'_, '_>, config: &AnomalyConfig) -> Vec<RequestSpike> {
    let window_minutes = config.request_spike_window_minutes;
    let window = minutes(window_minutes);
    let mut spikes = Vec::new();

    for (endpoint, logs) in groups.iter() {
        let times = sorted_instants(logs.iter().copied());
        let (Some(first), Some(last)) = (times.first(), times.last()) else {
            continue;
        };
        let span_minutes = ((*last - *first).num_milliseconds() as f64 / 60_000.0).max(1.0);
        let normal_rate = times.len() as f64 / span_minutes;
        let expected = normal_rate * window_minutes as f64;
        let limit = config.request_spike_rate_multiplier * expected;

        if let Some((start, count)) = first_window(&times, window, |count| count as f64 > limit) {
            spikes.push(RequestSpike {
                endpoint: endpoint.to_string(),
                window_start: format_timestamp(&start),
                requests_in_window: count,
                expected_requests_in_window: round2(expected),
                actual_rate_per_minute: round2(count as f64 / window_minutes.max(1) as f64),
                normal_rate_per_minute: round2(normal_rate),
            });
        }
    }
    spikes
}

/// First window per endpoint holding at least `error_cluster_threshold`
/// error responses.
fn error_clusters(groups: &EndpointGroups<'_, '_>, config: &AnomalyConfig) -> Vec<ErrorCluster> {
    let window = minutes(config.error_cluster_window_minutes);
    let mut clusters = Vec::new();

    for (endpoint, logs) in groups.iter() {
        let times = sorted_instants(logs.iter().copied().filter(|l| l.is_error()));
        if let Some((start, count)) =
            first_window(&times, window, |count| count >= config.error_cluster_threshold)
        {
            let window_start = format_timestamp(&start);
            let window_end = start
                .checked_add_signed(window)
                .map(|end| format_timestamp(&end))
                .unwrap_or_else(|| window_start.clone());
            clusters.push(ErrorCluster {
                endpoint: endpoint.to_string(),
                error_count: count,
                time_range: format!("{window_start} to {window_end}"),
                window_start,
                window_end,
            });
        }
    }
    clusters
}

/// Keys whose share of `total` exceeds `threshold`.
fn concentrated<'k>(
    keys: impl Iterator<Item = &'k str>,
    total: usize,
    threshold: f64,
) -> BTreeMap<String, usize> {
    let counter: OrderedCounter<&str> = keys.collect();
    counter
        .iter()
        .filter(|&(_, count)| total > 0 && count as f64 / total as f64 > threshold)
        .map(|(key, count)| (key.to_string(), count))
        .collect()
}

fn sorted_instants<'r, 'a: 'r>(logs: impl Iterator<Item = &'r ValidLog<'a>>) -> Vec<Instant> {
    let mut times: Vec<Instant> = logs.map(|l| l.timestamp).collect();
    times.sort();
    times
}

fn minutes(m: i64) -> TimeDelta {
    TimeDelta::try_minutes(m).unwrap_or(TimeDelta::MAX)
}

/// Event counts for windows `[t, t + window)` anchored at every instant of
/// the sorted slice, in order.
///
/// Each candidate start rescans the whole slice, so a full pass is O(n²).
/// Acceptable for bounded batches; a two-pointer scan would have to keep
/// the same anchor order to report the same first match.
pub fn sliding_window_counts(
    times: &[Instant],
    window: TimeDelta,
) -> impl Iterator<Item = (Instant, usize)> + '_ {
    times.iter().map(move |&start| {
        let end = start.checked_add_signed(window);
        let count = times
            .iter()
            .filter(|&&t| start <= t && end.is_none_or(|end| t < end))
            .count();
        (start, count)
    })
}

fn first_window(
    times: &[Instant],
    window: TimeDelta,
    qualifies: impl Fn(usize) -> bool,
) -> Option<(Instant, usize)> {
    sliding_window_counts(times, window).find(|&(_, count)| qualifies(count))
}
