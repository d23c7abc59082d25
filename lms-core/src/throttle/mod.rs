//! Per-client request throttling with a sliding window log.
//!
//! Every admitted request leaves its timestamp in a per `(rule, client)` log.
//! A request is admitted while fewer than `max_requests` timestamps in that log
//! are younger than the rule's window. Rejected requests are not recorded, so
//! they never consume quota.
//!
//! State lives in a sharded map keyed by client id. The prune-check-append
//! sequence runs under the shard's write guard, which makes it atomic per
//! client without serialising unrelated clients.

mod rule;
mod sweeper;

pub use rule::ThrottleRule;
pub use sweeper::spawn_sweeper;

use dashmap::DashMap;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

/// Reference window used by [`RequestThrottle::stats`], independent of any rule.
pub const STATS_WINDOW: Duration = Duration::from_secs(60);

/// Timestamp logs of one client, one per rule name.
type ClientWindows = HashMap<&'static str, VecDeque<Instant>>;

/// Outcome of an admission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Request recorded; `remaining` slots are left in the current window.
    Admit { remaining: u32 },
    Reject(Rejection),
}

impl Decision {
    pub fn is_admit(&self) -> bool {
        matches!(self, Decision::Admit { .. })
    }
}

/// Details of a rejected request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub rule: ThrottleRule,
    /// Requests currently occupying the window.
    pub current: u32,
    /// Time until the oldest occupying request leaves the window.
    pub retry_after: Duration,
}

impl Rejection {
    pub fn message(&self) -> String {
        format!(
            "Rate limit exceeded. Maximum {} requests per {} seconds.",
            self.rule.max_requests(),
            self.rule.window_secs_display()
        )
    }
}

/// Diagnostic view of a single client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientStats {
    pub client: String,
    /// Requests in the last [`STATS_WINDOW`], across all rules.
    pub requests_last_minute: usize,
    /// Retained timestamps across all rules, before any filtering.
    pub total_tracked_requests: usize,
    pub rules: Vec<RuleStats>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleStats {
    pub rule: &'static str,
    pub requests_last_minute: usize,
    pub total_tracked_requests: usize,
}

/// Result of a maintenance sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub pruned_timestamps: usize,
    pub removed_clients: usize,
    pub remaining_clients: usize,
}

/// Process-wide throttle shared by all request handlers.
#[derive(Debug, Default)]
pub struct RequestThrottle {
    clients: DashMap<String, ClientWindows>,
}

impl RequestThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admission check at the current instant.
    pub fn evaluate(&self, client: &str, rule: &ThrottleRule) -> Decision {
        self.evaluate_at(client, rule, Instant::now())
    }

    /// Admission check at `now`.
    ///
    /// `now` is clamped to the newest stored timestamp for the key so that the
    /// log stays ordered even when callers race on reading the clock.
    pub fn evaluate_at(&self, client: &str, rule: &ThrottleRule, now: Instant) -> Decision {
        let mut windows = self.clients.entry(client.to_owned()).or_default();
        let log = windows.entry(rule.name()).or_default();
        let now = log.back().map_or(now, |newest| now.max(*newest));

        prune(log, now, rule.window());
        let current = log.len();
        let max = rule.max_requests() as usize;

        if current >= max {
            let retry_after = log
                .front()
                .map(|oldest| (*oldest + rule.window()).saturating_duration_since(now))
                .unwrap_or_default();
            return Decision::Reject(Rejection {
                rule: *rule,
                current: current as u32,
                retry_after,
            });
        }

        log.push_back(now);
        Decision::Admit {
            remaining: (max - current - 1) as u32,
        }
    }

    /// Request counts for `client` at the current instant.
    pub fn stats(&self, client: &str) -> ClientStats {
        self.stats_at(client, Instant::now())
    }

    /// Request counts for `client` at `now`. Never mutates the logs.
    pub fn stats_at(&self, client: &str, now: Instant) -> ClientStats {
        let mut rules: Vec<RuleStats> = self
            .clients
            .get(client)
            .map(|windows| {
                windows
                    .iter()
                    .map(|(rule, log)| RuleStats {
                        rule: *rule,
                        requests_last_minute: log
                            .iter()
                            .filter(|t| now.saturating_duration_since(**t) < STATS_WINDOW)
                            .count(),
                        total_tracked_requests: log.len(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        rules.sort_by(|a, b| a.rule.cmp(&b.rule));

        ClientStats {
            client: client.to_string(),
            requests_last_minute: rules.iter().map(|r| r.requests_last_minute).sum(),
            total_tracked_requests: rules.iter().map(|r| r.total_tracked_requests).sum(),
            rules,
        }
    }

    /// Drop timestamps older than `retention` and forget clients left empty.
    ///
    /// `retention` must be longer than every rule window in use, otherwise the
    /// sweep would discard timestamps that still count against a quota.
    pub fn sweep(&self, retention: Duration) -> SweepReport {
        self.sweep_at(retention, Instant::now())
    }

    pub fn sweep_at(&self, retention: Duration, now: Instant) -> SweepReport {
        let mut report = SweepReport::default();
        self.clients.retain(|_, windows| {
            windows.retain(|_, log| {
                let before = log.len();
                prune(log, now, retention);
                report.pruned_timestamps += before - log.len();
                !log.is_empty()
            });
            let keep = !windows.is_empty();
            if !keep {
                report.removed_clients += 1;
            }
            keep
        });
        report.remaining_clients = self.clients.len();
        report
    }

    /// Number of clients with at least one retained timestamp (or a pending evaluation).
    pub fn tracked_clients(&self) -> usize {
        self.clients.len()
    }
}

/// Pop timestamps that are at least `window` old. Logs are ordered, so stale
/// entries are always at the front.
fn prune(log: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while log
        .front()
        .is_some_and(|oldest| now.saturating_duration_since(*oldest) >= window)
    {
        log.pop_front();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn secs(base: Instant, s: f64) -> Instant {
        base + Duration::from_secs_f64(s)
    }

    fn rule(name: &'static str, max: u32, window_secs: u64) -> ThrottleRule {
        ThrottleRule::new(name, max, Duration::from_secs(window_secs)).unwrap()
    }

    #[test]
    fn three_per_minute_scenario() {
        let throttle = RequestThrottle::new();
        let rule = rule("scenario", 3, 60);
        let t0 = Instant::now();

        for t in [0.0, 1.0, 2.0] {
            assert!(throttle.evaluate_at("1.2.3.4", &rule, secs(t0, t)).is_admit());
        }
        match throttle.evaluate_at("1.2.3.4", &rule, secs(t0, 5.0)) {
            Decision::Reject(rejection) => {
                assert_eq!(rejection.current, 3);
                assert_eq!(rejection.retry_after, Duration::from_secs(55));
                assert_eq!(
                    rejection.message(),
                    "Rate limit exceeded. Maximum 3 requests per 60 seconds."
                );
            }
            other => panic!("expected reject, got {other:?}"),
        }
        // t=0 is exactly 61s old at t=61 and ages out; {1, 2} remain.
        assert_eq!(
            throttle.evaluate_at("1.2.3.4", &rule, secs(t0, 61.0)),
            Decision::Admit { remaining: 0 }
        );
    }

    #[test]
    fn timestamp_exactly_window_old_is_pruned() {
        let throttle = RequestThrottle::new();
        let rule = rule("edge", 1, 10);
        let t0 = Instant::now();

        assert!(throttle.evaluate_at("c", &rule, t0).is_admit());
        assert!(!throttle.evaluate_at("c", &rule, secs(t0, 9.999)).is_admit());
        assert!(throttle.evaluate_at("c", &rule, secs(t0, 10.0)).is_admit());
    }

    #[test]
    fn clients_are_independent() {
        let throttle = RequestThrottle::new();
        let rule = rule("pair", 1, 10);
        let t0 = Instant::now();

        assert!(throttle.evaluate_at("A", &rule, t0).is_admit());
        assert!(throttle.evaluate_at("B", &rule, t0).is_admit());
        assert!(!throttle.evaluate_at("A", &rule, secs(t0, 1.0)).is_admit());
    }

    #[test]
    fn rules_are_independent() {
        let throttle = RequestThrottle::new();
        let login = rule("login", 1, 60);
        let listing = rule("listing", 2, 60);
        let t0 = Instant::now();

        assert!(throttle.evaluate_at("ip", &login, t0).is_admit());
        assert!(!throttle.evaluate_at("ip", &login, t0).is_admit());
        assert!(throttle.evaluate_at("ip", &listing, t0).is_admit());
        assert!(throttle.evaluate_at("ip", &listing, t0).is_admit());
        assert!(!throttle.evaluate_at("ip", &listing, t0).is_admit());
    }

    #[test]
    fn rejection_does_not_consume_quota() {
        let throttle = RequestThrottle::new();
        let rule = rule("quota", 2, 10);
        let t0 = Instant::now();

        assert!(throttle.evaluate_at("c", &rule, t0).is_admit());
        assert!(throttle.evaluate_at("c", &rule, secs(t0, 5.0)).is_admit());
        for t in [6.0, 7.0, 8.0, 9.0] {
            assert!(!throttle.evaluate_at("c", &rule, secs(t0, t)).is_admit());
        }
        assert_eq!(throttle.stats_at("c", secs(t0, 9.0)).total_tracked_requests, 2);

        // Only t=0 has aged out; had rejections been logged this would still fail.
        assert!(throttle.evaluate_at("c", &rule, secs(t0, 10.0)).is_admit());
    }

    #[test]
    fn admits_never_exceed_bound_within_any_window() {
        let throttle = RequestThrottle::new();
        let rule = rule("bound", 4, 10);
        let t0 = Instant::now();

        let mut t_ms = 0u64;
        let mut admitted = Vec::new();
        for i in 0..500usize {
            t_ms += [100, 700, 1300, 50, 2900][i % 5];
            let now = t0 + Duration::from_millis(t_ms);
            if throttle.evaluate_at("c", &rule, now).is_admit() {
                admitted.push(t_ms);
            }
        }

        assert!(!admitted.is_empty());
        for (i, start) in admitted.iter().enumerate() {
            let in_window = admitted[i..].iter().filter(|x| *x - start < 10_000).count();
            assert!(in_window <= 4, "{in_window} admits in window starting at {start}ms");
        }
    }

    #[test]
    fn window_slides_after_full_quota() {
        let throttle = RequestThrottle::new();
        let rule = rule("slide", 5, 30);
        let t0 = Instant::now();

        for _ in 0..5 {
            assert!(throttle.evaluate_at("c", &rule, t0).is_admit());
        }
        assert!(!throttle.evaluate_at("c", &rule, secs(t0, 29.0)).is_admit());
        assert_eq!(
            throttle.evaluate_at("c", &rule, secs(t0, 30.001)),
            Decision::Admit { remaining: 4 }
        );
    }

    #[test]
    fn stats_use_fixed_reference_window_and_do_not_prune() {
        let throttle = RequestThrottle::new();
        let long = rule("long", 10, 600);
        let short = rule("short", 10, 5);
        let t0 = Instant::now();

        throttle.evaluate_at("c", &long, t0);
        throttle.evaluate_at("c", &long, secs(t0, 100.0));
        throttle.evaluate_at("c", &short, secs(t0, 100.0));

        let stats = throttle.stats_at("c", secs(t0, 120.0));
        assert_eq!(stats.requests_last_minute, 2);
        assert_eq!(stats.total_tracked_requests, 3);
        assert_eq!(stats.rules.len(), 2);
        assert_eq!(stats.rules[0].rule, "long");
        assert_eq!(stats.rules[0].requests_last_minute, 1);
        assert_eq!(stats.rules[0].total_tracked_requests, 2);

        // Reading again later must not have removed anything.
        let again = throttle.stats_at("c", secs(t0, 500.0));
        assert_eq!(again.total_tracked_requests, 3);
        assert_eq!(again.requests_last_minute, 0);
    }

    #[test]
    fn stats_for_unknown_client_are_empty() {
        let throttle = RequestThrottle::new();
        let stats = throttle.stats("unknown");
        assert_eq!(stats.client, "unknown");
        assert_eq!(stats.requests_last_minute, 0);
        assert_eq!(stats.total_tracked_requests, 0);
        assert!(stats.rules.is_empty());
        assert_eq!(throttle.tracked_clients(), 0);
    }

    #[test]
    fn sweep_removes_stale_clients() {
        let throttle = RequestThrottle::new();
        let rule = rule("sweep", 10, 60);
        let t0 = Instant::now();

        throttle.evaluate_at("old", &rule, t0);
        throttle.evaluate_at("mixed", &rule, t0);
        throttle.evaluate_at("mixed", &rule, secs(t0, 3000.0));
        throttle.evaluate_at("fresh", &rule, secs(t0, 3500.0));

        let report = throttle.sweep_at(Duration::from_secs(3600), secs(t0, 3700.0));
        assert_eq!(
            report,
            SweepReport {
                pruned_timestamps: 2,
                removed_clients: 1,
                remaining_clients: 2,
            }
        );
        assert_eq!(throttle.tracked_clients(), 2);
        assert_eq!(
            throttle.stats_at("mixed", secs(t0, 3700.0)).total_tracked_requests,
            1
        );
    }

    #[test]
    fn sweep_with_long_horizon_preserves_decisions() {
        let rule = rule("safety", 3, 60);
        let t0 = Instant::now();
        let swept = RequestThrottle::new();
        let untouched = RequestThrottle::new();

        for t in [0.0, 10.0, 20.0, 4000.0, 4010.0] {
            swept.evaluate_at("c", &rule, secs(t0, t));
            untouched.evaluate_at("c", &rule, secs(t0, t));
        }
        swept.sweep_at(Duration::from_secs(3600), secs(t0, 4020.0));

        for t in [4020.0, 4030.0, 4069.0, 4070.0, 4075.0, 4200.0] {
            assert_eq!(
                swept.evaluate_at("c", &rule, secs(t0, t)),
                untouched.evaluate_at("c", &rule, secs(t0, t)),
                "diverged at t={t}"
            );
        }
    }

    #[test]
    fn out_of_order_clock_keeps_log_ordered() {
        let throttle = RequestThrottle::new();
        let rule = rule("order", 2, 10);
        let t0 = Instant::now();

        assert!(throttle.evaluate_at("c", &rule, secs(t0, 5.0)).is_admit());
        // An earlier reading is treated as t=5, so the slot frees up at t=15.
        assert!(throttle.evaluate_at("c", &rule, secs(t0, 1.0)).is_admit());
        assert!(!throttle.evaluate_at("c", &rule, secs(t0, 14.0)).is_admit());
        assert!(throttle.evaluate_at("c", &rule, secs(t0, 15.0)).is_admit());
    }

    #[test]
    fn concurrent_evaluations_admit_exactly_max() {
        let throttle = RequestThrottle::new();
        let rule = rule("contended", 10, 60);
        let admitted = AtomicUsize::new(0);

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..50 {
                        if throttle.evaluate("shared", &rule).is_admit() {
                            admitted.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                });
            }
        });

        assert_eq!(admitted.load(Ordering::SeqCst), 10);
        assert_eq!(throttle.stats("shared").total_tracked_requests, 10);
    }

    #[test]
    fn sweeping_during_evaluations_keeps_live_entries() {
        let throttle = RequestThrottle::new();
        let rule = rule("swept", 7, 60);
        let admitted = AtomicUsize::new(0);

        std::thread::scope(|scope| {
            scope.spawn(|| {
                for _ in 0..500 {
                    throttle.sweep(Duration::from_secs(3600));
                }
            });
            for _ in 0..6 {
                scope.spawn(|| {
                    for _ in 0..200 {
                        if throttle.evaluate("x", &rule).is_admit() {
                            admitted.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                });
            }
        });

        assert_eq!(admitted.load(Ordering::SeqCst), 7);
        assert_eq!(throttle.stats("x").total_tracked_requests, 7);
        assert_eq!(throttle.sweep(Duration::from_secs(3600)).remaining_clients, 1);
    }
}
