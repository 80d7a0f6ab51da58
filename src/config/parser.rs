use crate::config::types::{FileConfig, RawConfig};
use crate::config::validation::validate;
use crate::config::Config;
use crate::ConfigError;
use std::path::Path;
use std::str::FromStr;

/// Loads the configuration for a run
///
/// Settings come from the optional TOML file first, then from environment
/// variables (looked up through `env`), which override the file. The merged
/// settings are validated before anything else happens.
///
/// # Arguments
///
/// * `path` - Optional path to a TOML configuration file
/// * `env` - Environment lookup, usually `|key| std::env::var(key).ok()`
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use vin_watch::config::load_config;
///
/// let config = load_config(Some(Path::new("vin-watch.toml")), |key| std::env::var(key).ok()).unwrap();
/// println!("Watching {} VINs", config.identifiers.len());
/// ```
pub fn load_config<F>(path: Option<&Path>, env: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let file = match path {
        Some(path) => load_file_config(path)?,
        None => RawConfig::default(),
    };

    let raw = file.merge(raw_config_from_env(env)?);
    validate(raw)
}

/// Reads and parses a TOML configuration file
pub fn load_file_config(path: &Path) -> Result<RawConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_file_config(&content)
}

/// Parses TOML configuration content
pub fn parse_file_config(content: &str) -> Result<RawConfig, ConfigError> {
    let file: FileConfig = toml::from_str(content)?;
    Ok(file.into())
}

/// Collects settings from environment variables
///
/// Empty values count as unset.
pub fn raw_config_from_env<F>(env: F) -> Result<RawConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| {
        env(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    Ok(RawConfig {
        identifiers: get("VIN").map(|v| split_list(&v)),
        state_path: get("STATE_PATH"),
        baseline_policy: get("BASELINE_POLICY"),
        providers: get("SEARCH_PROVIDERS").map(|v| split_list(&v)),
        max_results: parse_number(&get, "MAX_RESULTS")?,
        user_agent: get("USER_AGENT"),
        request_timeout_secs: parse_number(&get, "REQUEST_TIMEOUT_SECS")?,
        bing_key: get("BING_KEY"),
        bing_endpoint: get("BING_ENDPOINT"),
        google_cse_key: get("GOOGLE_CSE_KEY"),
        google_cse_id: get("GOOGLE_CSE_ID"),
        google_cse_endpoint: get("GOOGLE_CSE_ENDPOINT"),
        to_email: get("TO_EMAIL"),
        from_email: get("FROM_EMAIL"),
        smtp_server: get("SMTP_SERVER"),
        smtp_port: parse_number(&get, "SMTP_PORT")?,
        smtp_user: get("SMTP_USER"),
        smtp_pass: get("SMTP_PASS"),
        slack_webhook_url: get("SLACK_WEBHOOK_URL"),
        notify_timeout_secs: parse_number(&get, "NOTIFY_TIMEOUT_SECS")?,
    })
}

/// Splits a comma-separated list, dropping blank entries
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_number<T, G>(get: &G, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(None),
        Some(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::Invalid {
                key: key.to_string(),
                message: format!("'{}' is not a valid number ({})", value, e),
            }),
    }
}
