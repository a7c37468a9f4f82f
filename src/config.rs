use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;
use time::{macros::format_description, UtcOffset};

use crate::retry::RetryPolicy;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// Knobs for the dashboard and report pipeline.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Offset used to turn entry timestamps into local calendar days.
    pub utc_offset: UtcOffset,
    /// How many insights survive the priority cut.
    pub insight_cap: usize,
    /// Upper bound for the concurrent dashboard fetch.
    pub summary_timeout: Duration,
    /// Window length used when the caller gives no dates.
    pub default_window_days: i64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            utc_offset: UtcOffset::from_hms(-3, 0, 0).unwrap_or(UtcOffset::UTC),
            insight_cap: 3,
            summary_timeout: Duration::from_secs(10),
            default_window_days: 7,
        }
    }
}

/// OpenAI-compatible chat completions endpoint used for report narratives.
#[derive(Debug, Clone)]
pub struct NarrativeConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub dashboard: DashboardConfig,
    pub retry: RetryPolicy,
    pub narrative: Option<NarrativeConfig>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is required")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET is required")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "ethra".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "ethra-users".into()),
            ttl_minutes: env_parse("JWT_TTL_MINUTES").unwrap_or(60),
            refresh_ttl_minutes: env_parse("JWT_REFRESH_TTL_MINUTES").unwrap_or(60 * 24 * 14),
        };

        let defaults = DashboardConfig::default();
        let utc_offset = match std::env::var("APP_UTC_OFFSET") {
            Ok(raw) => parse_offset(&raw)?,
            Err(_) => defaults.utc_offset,
        };
        let dashboard = DashboardConfig {
            utc_offset,
            insight_cap: env_parse("INSIGHT_CAP").unwrap_or(defaults.insight_cap),
            summary_timeout: env_parse("DASHBOARD_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.summary_timeout),
            default_window_days: env_parse("DASHBOARD_WINDOW_DAYS")
                .filter(|d: &i64| *d > 0)
                .unwrap_or(defaults.default_window_days),
        };

        let retry_defaults = RetryPolicy::default();
        let retry = RetryPolicy {
            max_attempts: env_parse("RETRY_MAX_ATTEMPTS")
                .filter(|n: &u32| *n > 0)
                .unwrap_or(retry_defaults.max_attempts),
            base_delay: env_parse("RETRY_BASE_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(retry_defaults.base_delay),
        };

        let narrative = match std::env::var("AI_API_KEY") {
            Ok(api_key) if !api_key.trim().is_empty() => Some(NarrativeConfig {
                api_url: std::env::var("AI_API_URL")
                    .unwrap_or_else(|_| "https://api.openai.com/v1/chat/completions".into()),
                api_key,
                model: std::env::var("AI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into()),
            }),
            _ => None,
        };

        Ok(Self {
            database_url,
            jwt,
            dashboard,
            retry,
            narrative,
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

/// Parses offsets written as `-03:00`, `+05:30` or `Z`.
pub fn parse_offset(raw: &str) -> anyhow::Result<UtcOffset> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") || raw.eq_ignore_ascii_case("utc") {
        return Ok(UtcOffset::UTC);
    }
    UtcOffset::parse(
        raw,
        format_description!("[offset_hour sign:mandatory]:[offset_minute]"),
    )
    .with_context(|| format!("invalid APP_UTC_OFFSET {raw:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_signed_offsets() {
        assert_eq!(parse_offset("-03:00").unwrap(), UtcOffset::from_hms(-3, 0, 0).unwrap());
        assert_eq!(parse_offset("+05:30").unwrap(), UtcOffset::from_hms(5, 30, 0).unwrap());
        assert_eq!(parse_offset("Z").unwrap(), UtcOffset::UTC);
    }

    #[test]
    fn rejects_garbage_offset() {
        assert!(parse_offset("three hours").is_err());
    }

    #[test]
    fn dashboard_defaults() {
        let d = DashboardConfig::default();
        assert_eq!(d.insight_cap, 3);
        assert_eq!(d.default_window_days, 7);
        assert_eq!(d.utc_offset.whole_hours(), -3);
    }
}
