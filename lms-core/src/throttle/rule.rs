//! Throttle rules: a named `(max_requests, window)` pair.

use crate::error::{LmsError, Result};
use std::fmt;
use std::time::Duration;

/// Immutable throttle policy. The name is the rule's identity: counters are kept
/// per `(name, client)`, so two routes sharing a name share a quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThrottleRule {
    name: &'static str,
    max_requests: u32,
    window: Duration,
}

impl ThrottleRule {
    /// 5 requests per 5 minutes.
    pub const STRICT: ThrottleRule = ThrottleRule::per_seconds("strict", 5, 300);
    /// 20 requests per minute.
    pub const MODERATE: ThrottleRule = ThrottleRule::per_seconds("moderate", 20, 60);
    /// 100 requests per minute.
    pub const RELAXED: ThrottleRule = ThrottleRule::per_seconds("relaxed", 100, 60);

    /// Rule for use in `const` items; invalid limits fail at compile time there.
    pub const fn per_seconds(name: &'static str, max_requests: u32, window_secs: u64) -> Self {
        assert!(!name.is_empty(), "rule name must not be empty");
        assert!(max_requests > 0, "max_requests must be greater than zero");
        assert!(window_secs > 0, "window must be greater than zero");
        Self {
            name,
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    /// Build a rule, rejecting empty names and zero limits.
    pub fn new(name: &'static str, max_requests: u32, window: Duration) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(LmsError::InvalidRule("rule name must not be empty".into()));
        }
        if max_requests == 0 {
            return Err(LmsError::InvalidRule(format!(
                "{name}: max_requests must be greater than zero"
            )));
        }
        if window.is_zero() {
            return Err(LmsError::InvalidRule(format!(
                "{name}: window must be greater than zero"
            )));
        }
        Ok(Self {
            name,
            max_requests,
            window,
        })
    }

    /// Same identity, different limits.
    pub fn with_limits(self, max_requests: u32, window: Duration) -> Result<Self> {
        Self::new(self.name, max_requests, window)
    }

    /// Parse limits written as `<max>/<seconds>`, e.g. `20/60` or `3/0.5`.
    pub fn parse_limits(self, limits: &str) -> Result<Self> {
        let (max, secs) = limits.trim().split_once('/').ok_or_else(|| {
            LmsError::InvalidRule(format!("{}: expected <max>/<seconds>, got {limits:?}", self.name))
        })?;
        let max_requests = max.trim().parse::<u32>().map_err(|e| {
            LmsError::InvalidRule(format!("{}: invalid max_requests {max:?}: {e}", self.name))
        })?;
        let window = secs
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(|s| Duration::try_from_secs_f64(s).ok())
            .ok_or_else(|| {
                LmsError::InvalidRule(format!("{}: invalid window {secs:?}", self.name))
            })?;
        self.with_limits(max_requests, window)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Window length in seconds as a human-readable number (`60`, `0.5`).
    pub fn window_secs_display(&self) -> String {
        if self.window.subsec_nanos() == 0 {
            self.window.as_secs().to_string()
        } else {
            self.window.as_secs_f64().to_string()
        }
    }
}

impl fmt::Display for ThrottleRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}/{}s)",
            self.name,
            self.max_requests,
            self.window_secs_display()
        )
    }
}
