use anyhow::{bail, Context};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::app::ThrottleRules;

const DEFAULT_BIND: &str = "0.0.0.0:8000";
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;
const DEFAULT_RETENTION_SECS: u64 = 3600;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind: SocketAddr,
    /// 课程目录 JSON 文件；未设置时使用内置演示数据
    pub catalog_path: Option<PathBuf>,
    /// CORS 允许的来源列表（空则允许所有）
    pub cors_origins: Vec<String>,
    pub trust_proxy_headers: bool,
    pub sweep_interval: Duration,
    /// 清理时保留的时间跨度，必须大于所有规则的窗口
    pub retention: Duration,
    pub rules: ThrottleRules,
}

impl ApiConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind: SocketAddr = var("LMS_BIND")
            .unwrap_or_else(|| DEFAULT_BIND.to_string())
            .parse()
            .context("LMS_BIND must be a socket address such as 0.0.0.0:8000")?;

        let catalog_path = var("LMS_CATALOG_PATH").map(PathBuf::from);

        // 逗号分隔；空或 "*" 表示允许所有
        let cors_origins = match var("LMS_CORS_ORIGINS") {
            Some(s) if s != "*" => s
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect(),
            _ => Vec::new(),
        };

        let trust_proxy_headers = match var("LMS_TRUST_PROXY_HEADERS") {
            Some(raw) => parse_bool(&raw)
                .with_context(|| format!("LMS_TRUST_PROXY_HEADERS: invalid boolean {raw:?}"))?,
            None => false,
        };

        let sweep_interval = Duration::from_secs(secs_var(
            &var,
            "LMS_SWEEP_INTERVAL_SECS",
            DEFAULT_SWEEP_INTERVAL_SECS,
        )?);
        let retention = Duration::from_secs(secs_var(
            &var,
            "LMS_RETENTION_SECS",
            DEFAULT_RETENTION_SECS,
        )?);

        let mut rules = ThrottleRules::default();
        for rule in rules.all_mut() {
            let key = rule_env_key(rule.name());
            if let Some(limits) = var(&key) {
                *rule = rule.parse_limits(&limits).with_context(|| key.clone())?;
            }
        }

        if retention <= rules.longest_window() {
            bail!(
                "LMS_RETENTION_SECS ({}s) must be longer than the longest throttle window ({}s)",
                retention.as_secs(),
                rules.longest_window().as_secs_f64()
            );
        }

        Ok(Self {
            bind,
            catalog_path,
            cors_origins,
            trust_proxy_headers,
            sweep_interval,
            retention,
            rules,
        })
    }
}

/// `courses.list` -> `LMS_THROTTLE_COURSES_LIST`
fn rule_env_key(name: &str) -> String {
    format!(
        "LMS_THROTTLE_{}",
        name.to_ascii_uppercase().replace(['.', '-'], "_")
    )
}

fn secs_var(var: impl Fn(&str) -> Option<String>, key: &str, default: u64) -> anyhow::Result<u64> {
    let Some(raw) = var(key) else {
        return Ok(default);
    };
    let secs: u64 = raw
        .parse()
        .with_context(|| format!("{key} must be a whole number of seconds, got {raw:?}"))?;
    if secs == 0 {
        bail!("{key} must be greater than zero");
    }
    Ok(secs)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> anyhow::Result<ApiConfig> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config.bind, DEFAULT_BIND.parse::<SocketAddr>().unwrap());
        assert!(config.catalog_path.is_none());
        assert!(config.cors_origins.is_empty());
        assert!(!config.trust_proxy_headers);
        assert_eq!(config.sweep_interval, Duration::from_secs(300));
        assert_eq!(config.retention, Duration::from_secs(3600));
        assert_eq!(config.rules, ThrottleRules::default());
    }

    #[test]
    fn rule_overrides_keep_names() {
        let config = load(&[
            ("LMS_THROTTLE_STRICT", "3/600"),
            ("LMS_THROTTLE_COURSES_LIST", "50/30"),
            ("LMS_THROTTLE_MEMBERS_LIST", "5/10"),
        ])
        .unwrap();
        assert_eq!(config.rules.strict.name(), "strict");
        assert_eq!(config.rules.strict.max_requests(), 3);
        assert_eq!(config.rules.strict.window(), Duration::from_secs(600));
        assert_eq!(config.rules.courses_list.max_requests(), 50);
        assert_eq!(config.rules.members_list.name(), "members.list");
        assert_eq!(config.rules.members_list.max_requests(), 5);
        assert_eq!(config.rules.members_list.window(), Duration::from_secs(10));
        assert_eq!(config.rules.moderate, ThrottleRules::default().moderate);
    }

    #[test]
    fn invalid_values_fail_fast() {
        assert!(load(&[("LMS_THROTTLE_MODERATE", "0/60")]).is_err());
        assert!(load(&[("LMS_BIND", "not-an-address")]).is_err());
        assert!(load(&[("LMS_TRUST_PROXY_HEADERS", "maybe")]).is_err());
        assert!(load(&[("LMS_SWEEP_INTERVAL_SECS", "0")]).is_err());
    }

    #[test]
    fn retention_must_outlast_every_window() {
        assert!(load(&[("LMS_RETENTION_SECS", "300")]).is_err());
        assert!(load(&[("LMS_RETENTION_SECS", "301")]).is_ok());
        assert!(load(&[
            ("LMS_RETENTION_SECS", "3600"),
            ("LMS_THROTTLE_RELAXED", "100/7200"),
        ])
        .is_err());
    }

    #[test]
    fn cors_and_proxy_flags() {
        let config = load(&[
            ("LMS_CORS_ORIGINS", "https://a.example, https://b.example,"),
            ("LMS_TRUST_PROXY_HEADERS", "TRUE"),
        ])
        .unwrap();
        assert_eq!(
            config.cors_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert!(config.trust_proxy_headers);

        let any = load(&[("LMS_CORS_ORIGINS", "*")]).unwrap();
        assert!(any.cors_origins.is_empty());
    }

    #[test]
    fn env_key_for_dotted_names() {
        assert_eq!(rule_env_key("comments.list"), "LMS_THROTTLE_COMMENTS_LIST");
    }
}
