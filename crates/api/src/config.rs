//! Process configuration from environment variables.
//!
//! Every knob has a default good enough for a single-store deployment, so a
//! bare `brewpos-api` starts without any environment set. Invalid values log
//! a warning and fall back to the default rather than aborting startup.

use std::time::Duration as StdDuration;

use chrono::Duration;

/// Runtime settings for the API process.
#[derive(Debug, Clone)]
pub struct Config {
    /// Listen address, `BREWPOS_BIND`.
    pub bind: String,
    /// Reservation time-to-live, `BREWPOS_RESERVATION_TTL_SECS`.
    pub reservation_ttl: Duration,
    /// Background expiry sweep cadence, `BREWPOS_SWEEP_INTERVAL_SECS`.
    pub sweep_interval: StdDuration,
    /// Menu listing snapshot lifetime, `BREWPOS_MENU_CACHE_TTL_SECS`.
    pub menu_cache_ttl: StdDuration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
            reservation_ttl: Duration::seconds(900),
            sweep_interval: StdDuration::from_secs(30),
            menu_cache_ttl: StdDuration::from_secs(30),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Config::default();

        Self {
            bind: std::env::var("BREWPOS_BIND").unwrap_or(defaults.bind),
            reservation_ttl: Duration::seconds(env_secs(
                "BREWPOS_RESERVATION_TTL_SECS",
                defaults.reservation_ttl.num_seconds(),
            )),
            sweep_interval: StdDuration::from_secs(env_secs(
                "BREWPOS_SWEEP_INTERVAL_SECS",
                defaults.sweep_interval.as_secs() as i64,
            ) as u64),
            menu_cache_ttl: StdDuration::from_secs(env_secs(
                "BREWPOS_MENU_CACHE_TTL_SECS",
                defaults.menu_cache_ttl.as_secs() as i64,
            ) as u64),
        }
    }
}

/// Reads a positive seconds value from the environment.
fn env_secs(key: &str, default: i64) -> i64 {
    match std::env::var(key) {
        Ok(raw) => parse_secs(&raw).unwrap_or_else(|| {
            tracing::warn!(key, value = %raw, default, "ignoring invalid setting");
            default
        }),
        Err(_) => default,
    }
}

fn parse_secs(raw: &str) -> Option<i64> {
    // chrono::Duration cannot hold more than i64::MAX milliseconds; values
    // past that count as invalid rather than aborting startup.
    raw.parse::<i64>()
        .ok()
        .filter(|secs| *secs > 0 && Duration::try_seconds(*secs).is_some())
}
