use crate::app_config::AppConfig;
use crate::ConfigError;

/// Browser-like `User-Agent`; the media host rejects requests without one.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub const DEFAULT_REFERER: &str = "https://x.com/";

pub const DEFAULT_MEDIA_HOST: &str = "twimg.com";

/// Load application configuration from environment variables.
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

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
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
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let log_level = or_default("POSTVAULT_LOG_LEVEL", "info");
    let input_dir = PathBuf::from(or_default("POSTVAULT_INPUT_DIR", "."));
    let output_dir = PathBuf::from(or_default("POSTVAULT_OUTPUT_DIR", "."));

    let media_host = or_default("POSTVAULT_MEDIA_HOST", DEFAULT_MEDIA_HOST);
    if media_host.trim().is_empty() {
        return Err(ConfigError::InvalidEnvVar {
            var: "POSTVAULT_MEDIA_HOST".to_string(),
            reason: "must not be empty".to_string(),
        });
    }

    let fetch_timeout_secs = parse_u64("POSTVAULT_FETCH_TIMEOUT_SECS", "20")?;
    let fetch_delay_ms = parse_u64("POSTVAULT_FETCH_DELAY_MS", "100")?;
    let max_concurrent_fetches = parse_usize("POSTVAULT_MAX_CONCURRENT_FETCHES", "1")?.max(1);
    let user_agent = or_default("POSTVAULT_USER_AGENT", DEFAULT_USER_AGENT);
    let referer = or_default("POSTVAULT_REFERER", DEFAULT_REFERER);

    Ok(AppConfig {
        log_level,
        input_dir,
        output_dir,
        media_host,
        fetch_timeout_secs,
        fetch_delay_ms,
        max_concurrent_fetches,
        user_agent,
        referer,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
