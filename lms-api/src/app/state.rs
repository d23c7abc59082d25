use lms_core::{Catalog, RequestThrottle, ThrottleRule};
use std::sync::Arc;
use std::time::Duration;

/// Shared application state for handlers.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    /// 进程级限流状态，所有路由共享
    pub throttle: Arc<RequestThrottle>,
    pub rules: ThrottleRules,
    /// 是否信任 X-Real-IP / X-Forwarded-For（仅在反向代理之后开启）
    pub trust_proxy_headers: bool,
}

impl AppState {
    pub fn new(catalog: Catalog, rules: ThrottleRules, trust_proxy_headers: bool) -> Self {
        Self {
            catalog: Arc::new(catalog),
            throttle: Arc::new(RequestThrottle::new()),
            rules,
            trust_proxy_headers,
        }
    }
}

/// Rules attached to routes. Presets plus per-endpoint listing limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleRules {
    pub strict: ThrottleRule,
    pub moderate: ThrottleRule,
    pub relaxed: ThrottleRule,
    pub courses_list: ThrottleRule,
    pub members_list: ThrottleRule,
    pub contents_list: ThrottleRule,
    pub comments_list: ThrottleRule,
}

impl Default for ThrottleRules {
    fn default() -> Self {
        Self {
            strict: ThrottleRule::STRICT,
            moderate: ThrottleRule::MODERATE,
            relaxed: ThrottleRule::RELAXED,
            courses_list: ThrottleRule::per_seconds("courses.list", 30, 60),
            members_list: ThrottleRule::per_seconds("members.list", 20, 60),
            contents_list: ThrottleRule::per_seconds("contents.list", 30, 60),
            comments_list: ThrottleRule::per_seconds("comments.list", 30, 60),
        }
    }
}

impl ThrottleRules {
    pub fn all(&self) -> [ThrottleRule; 7] {
        [
            self.strict,
            self.moderate,
            self.relaxed,
            self.courses_list,
            self.members_list,
            self.contents_list,
            self.comments_list,
        ]
    }

    pub fn all_mut(&mut self) -> [&mut ThrottleRule; 7] {
        [
            &mut self.strict,
            &mut self.moderate,
            &mut self.relaxed,
            &mut self.courses_list,
            &mut self.members_list,
            &mut self.contents_list,
            &mut self.comments_list,
        ]
    }

    pub fn longest_window(&self) -> Duration {
        self.all()
            .iter()
            .map(ThrottleRule::window)
            .max()
            .unwrap_or_default()
    }
}
