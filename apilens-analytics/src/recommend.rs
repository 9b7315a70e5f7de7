//! Heuristic recommendations and the caching cost model.

use crate::report::{CachingOpportunity, EndpointStats, PotentialSavings};
use crate::stats::{round2, safe_divide};
use apilens_core::config::{CacheConfig, RecommendationConfig};
use apilens_core::group::EndpointGroups;

const CACHE_CONFIDENCE: &str = "high";

/// Share of GET requests on `endpoint` (0.0–1.0).
fn get_ratio(groups: &EndpointGroups<'_, '_>, endpoint: &str) -> f64 {
    groups.get(endpoint).map_or(0.0, |logs| {
        let gets = logs.iter().filter(|l| l.is_get()).count();
        safe_divide(gets as f64, logs.len() as f64)
    })
}

/// Free-text advice. Each endpoint can trigger any of the three rules.
pub fn recommendations(
    groups: &EndpointGroups<'_, '_>,
    stats: &[EndpointStats],
    cache: &CacheConfig,
    rules: &RecommendationConfig,
) -> Vec<String> {
    let mut out = Vec::new();
    for s in stats {
        let ratio = get_ratio(groups, &s.endpoint);

        if s.request_count >= cache.min_requests
            && ratio >= cache.min_get_ratio
            && s.error_rate_percentage < cache.max_error_rate
        {
            out.push(format!(
                "Consider caching {}: {} requests, {:.0}% GET, {:.2}% errors; a {}-minute TTL could absorb most reads",
                s.endpoint,
                s.request_count,
                ratio * 100.0,
                s.error_rate_percentage,
                cache.recommended_ttl_minutes,
            ));
        }
        if s.avg_response_time_ms > rules.slow_endpoint_threshold_ms {
            out.push(format!(
                "Investigate {}: average response time {:.2}ms exceeds {}ms",
                s.endpoint, s.avg_response_time_ms, rules.slow_endpoint_threshold_ms,
            ));
        }
        if s.error_rate_percentage > rules.error_rate_alert_percent {
            out.push(format!(
                "Reduce errors on {}: error rate {:.2}% exceeds {}%",
                s.endpoint, s.error_rate_percentage, rules.error_rate_alert_percent,
            ));
        }
    }
    out
}

/// Endpoints worth caching, with estimated savings.
pub fn caching_opportunities(
    groups: &EndpointGroups<'_, '_>,
    stats: &[EndpointStats],
    cache: &CacheConfig,
) -> Vec<CachingOpportunity> {
    stats
        .iter()
        .filter_map(|s| {
            let ratio = get_ratio(groups, &s.endpoint);
            let qualifies = s.request_count >= cache.min_requests
                && ratio >= cache.min_get_ratio
                && s.error_rate_percentage <= cache.max_error_rate;
            if !qualifies {
                return None;
            }

            let saved = (s.request_count as f64 * cache.hit_rate_assumption).floor() as u64;
            Some(CachingOpportunity {
                endpoint: s.endpoint.clone(),
                current_requests: s.request_count,
                get_ratio_percentage: round2(ratio * 100.0),
                potential_cache_hit_rate: round2(cache.hit_rate_assumption * 100.0),
                potential_requests_saved: saved,
                estimated_cost_savings_usd: round2(saved as f64 * cache.cost_saving_per_request),
                performance_improvement_ms: (s.avg_response_time_ms * cache.hit_rate_assumption)
                    .floor() as u64,
                recommended_ttl_minutes: cache.recommended_ttl_minutes,
                confidence: CACHE_CONFIDENCE.to_string(),
            })
        })
        .collect()
}

pub fn total_savings(opportunities: &[CachingOpportunity]) -> PotentialSavings {
    let mut total = PotentialSavings::default();
    for o in opportunities {
        total.total_requests_saved += o.potential_requests_saved;
        total.total_cost_savings_usd += o.estimated_cost_savings_usd;
        total.total_performance_improvement_ms += o.performance_improvement_ms;
    }
    total.total_cost_savings_usd = round2(total.total_cost_savings_usd);
    total
}
