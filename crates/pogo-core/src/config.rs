use crate::app_config::{AppConfig, SleepWindow};
use crate::ConfigError;

const DEFAULT_TARGET_URL: &str = "https://pokemongo.gishan.net/friends/codes/";
const DEFAULT_USER_AGENT: &str = "pogo-friends/0.1 (friend-code-collector)";

/// Load collector configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load collector configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build configuration using the provided env-var lookup function.
///
/// Every option has a default, so an empty environment yields a usable config.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_flag = |var: &str, default: &str| -> Result<bool, ConfigError> {
        let raw = or_default(var, default);
        parse_bool(&raw).ok_or_else(|| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("expected true/false, got \"{raw}\""),
        })
    };

    let target_url = or_default("POGO_TARGET_URL", DEFAULT_TARGET_URL)
        .trim()
        .to_string();
    if target_url.is_empty() {
        return Err(ConfigError::InvalidEnvVar {
            var: "POGO_TARGET_URL".to_string(),
            reason: "must not be empty".to_string(),
        });
    }

    let store_path = PathBuf::from(or_default("POGO_STORE_PATH", "pokemon_friend_codes.csv"));
    let qr_enabled = parse_flag("POGO_QR_ENABLED", "true")?;
    let qr_base_path = PathBuf::from(or_default("POGO_QR_BASE_PATH", "."));

    let warm_up_delay_secs = parse_u64("POGO_WARM_UP_DELAY_SECS", "0")?;
    let settle_delay_secs = parse_u64("POGO_SETTLE_DELAY_SECS", "2")?;
    let sleep_min_secs = parse_u64("POGO_SLEEP_MIN_SECS", "120")?;
    let sleep_max_secs = parse_u64("POGO_SLEEP_MAX_SECS", "180")?;
    if sleep_min_secs > sleep_max_secs {
        return Err(ConfigError::InvalidEnvVar {
            var: "POGO_SLEEP_MIN_SECS".to_string(),
            reason: format!(
                "lower bound {sleep_min_secs} exceeds POGO_SLEEP_MAX_SECS {sleep_max_secs}"
            ),
        });
    }

    let request_timeout_secs = parse_u64("POGO_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("POGO_USER_AGENT", DEFAULT_USER_AGENT);
    let log_level = or_default("POGO_LOG_LEVEL", "info");

    Ok(AppConfig {
        target_url,
        store_path,
        qr_enabled,
        qr_base_path,
        warm_up_delay_secs,
        settle_delay_secs,
        sleep_window: SleepWindow {
            min_secs: sleep_min_secs,
            max_secs: sleep_max_secs,
        },
        request_timeout_secs,
        user_agent,
        log_level,
    })
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
