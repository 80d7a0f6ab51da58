use crate::config::types::{
    BingConfig, Config, EmailConfig, GoogleCseConfig, NotifyConfig, ProviderConfig, ProviderKind,
    RawConfig, SearchConfig, SlackConfig, BING_ENDPOINT, DEFAULT_MAX_RESULTS,
    DEFAULT_NOTIFY_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SMTP_PORT,
    DEFAULT_STATE_PATH, DEFAULT_USER_AGENT, GOOGLE_CSE_ENDPOINT,
};
use crate::state::BaselinePolicy;
use crate::ConfigError;
use lettre::message::Mailbox;
use std::path::PathBuf;
use url::Url;

/// Largest page size any supported provider accepts
const MAX_RESULTS_LIMIT: u32 = 50;

/// Upper bound on the request and notification timeouts (seconds)
const MAX_TIMEOUT_SECS: u64 = 3600;

/// Validates merged settings and builds the run configuration
pub fn validate(raw: RawConfig) -> Result<Config, ConfigError> {
    let identifiers = validate_identifiers(raw.identifiers.as_deref())?;

    let state_path = match raw.state_path.as_deref() {
        Some(path) if path.trim().is_empty() => {
            return Err(ConfigError::Validation(
                "state_path cannot be empty".to_string(),
            ))
        }
        Some(path) => PathBuf::from(path),
        None => PathBuf::from(DEFAULT_STATE_PATH),
    };

    let baseline = match raw.baseline_policy.as_deref() {
        Some(value) => value.parse::<BaselinePolicy>().map_err(|message| {
            ConfigError::Invalid {
                key: "BASELINE_POLICY".to_string(),
                message,
            }
        })?,
        None => BaselinePolicy::default(),
    };

    let search = validate_search_config(&raw)?;
    let notify = validate_notify_config(&raw)?;

    Ok(Config {
        identifiers,
        state_path,
        baseline,
        search,
        notify,
    })
}

/// Validates the identifier list: at least one, no blanks, no duplicates
fn validate_identifiers(identifiers: Option<&[String]>) -> Result<Vec<String>, ConfigError> {
    let identifiers = identifiers.ok_or_else(|| {
        ConfigError::Missing("VIN (comma-separated list of identifiers)".to_string())
    })?;

    let mut out: Vec<String> = Vec::new();
    for id in identifiers {
        let id = id.trim();
        if id.is_empty() {
            continue;
        }
        if id.contains('"') {
            return Err(ConfigError::Invalid {
                key: "VIN".to_string(),
                message: format!("identifier '{}' cannot contain a double quote", id),
            });
        }
        if !out.iter().any(|existing| existing == id) {
            out.push(id.to_string());
        }
    }

    if out.is_empty() {
        return Err(ConfigError::Missing(
            "VIN (no non-empty identifiers given)".to_string(),
        ));
    }

    Ok(out)
}

/// Validates search settings and resolves which providers to use
fn validate_search_config(raw: &RawConfig) -> Result<SearchConfig, ConfigError> {
    let max_results = raw.max_results.unwrap_or(DEFAULT_MAX_RESULTS);
    if max_results < 1 || max_results > MAX_RESULTS_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max_results must be between 1 and {}, got {}",
            MAX_RESULTS_LIMIT, max_results
        )));
    }

    let timeout_secs = raw
        .request_timeout_secs
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
    validate_timeout("REQUEST_TIMEOUT_SECS", timeout_secs)?;

    let user_agent = raw
        .user_agent
        .clone()
        .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

    let kinds = match &raw.providers {
        Some(names) => {
            let mut kinds = Vec::new();
            for name in names {
                let kind = name.parse::<ProviderKind>().map_err(|message| {
                    ConfigError::Invalid {
                        key: "SEARCH_PROVIDERS".to_string(),
                        message,
                    }
                })?;
                if !kinds.contains(&kind) {
                    kinds.push(kind);
                }
            }
            kinds
        }
        None => {
            let mut kinds = Vec::new();
            if raw.bing_key.is_some() {
                kinds.push(ProviderKind::Bing);
            }
            if raw.google_cse_key.is_some() || raw.google_cse_id.is_some() {
                kinds.push(ProviderKind::GoogleCse);
            }
            kinds
        }
    };

    if kinds.is_empty() {
        return Err(ConfigError::Missing(
            "search provider credentials (BING_KEY, or GOOGLE_CSE_KEY and GOOGLE_CSE_ID)"
                .to_string(),
        ));
    }

    let providers = kinds
        .into_iter()
        .map(|kind| build_provider(kind, raw))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SearchConfig {
        providers,
        max_results,
        user_agent,
        timeout_secs,
    })
}

/// Builds one provider's settings, requiring its credentials
fn build_provider(kind: ProviderKind, raw: &RawConfig) -> Result<ProviderConfig, ConfigError> {
    match kind {
        ProviderKind::Bing => {
            let api_key = raw
                .bing_key
                .clone()
                .ok_or_else(|| ConfigError::Missing("BING_KEY".to_string()))?;
            let endpoint = validate_endpoint(
                "BING_ENDPOINT",
                raw.bing_endpoint.as_deref().unwrap_or(BING_ENDPOINT),
            )?;
            Ok(ProviderConfig::Bing(BingConfig { api_key, endpoint }))
        }
        ProviderKind::GoogleCse => {
            let api_key = raw
                .google_cse_key
                .clone()
                .ok_or_else(|| ConfigError::Missing("GOOGLE_CSE_KEY".to_string()))?;
            let engine_id = raw
                .google_cse_id
                .clone()
                .ok_or_else(|| ConfigError::Missing("GOOGLE_CSE_ID".to_string()))?;
            let endpoint = validate_endpoint(
                "GOOGLE_CSE_ENDPOINT",
                raw.google_cse_endpoint
                    .as_deref()
                    .unwrap_or(GOOGLE_CSE_ENDPOINT),
            )?;
            Ok(ProviderConfig::GoogleCse(GoogleCseConfig {
                api_key,
                engine_id,
                endpoint,
            }))
        }
    }
}

/// Validates notification channels
fn validate_notify_config(raw: &RawConfig) -> Result<NotifyConfig, ConfigError> {
    let timeout_secs = raw
        .notify_timeout_secs
        .unwrap_or(DEFAULT_NOTIFY_TIMEOUT_SECS);
    validate_timeout("NOTIFY_TIMEOUT_SECS", timeout_secs)?;

    let slack = match raw.slack_webhook_url.as_deref() {
        Some(url) => Some(SlackConfig {
            webhook_url: validate_endpoint("SLACK_WEBHOOK_URL", url)?,
        }),
        None => None,
    };

    Ok(NotifyConfig {
        email: validate_email_config(raw)?,
        slack,
        timeout_secs,
    })
}

/// Email settings are all-or-nothing
fn validate_email_config(raw: &RawConfig) -> Result<Option<EmailConfig>, ConfigError> {
    let fields = [
        ("TO_EMAIL", &raw.to_email),
        ("FROM_EMAIL", &raw.from_email),
        ("SMTP_SERVER", &raw.smtp_server),
        ("SMTP_USER", &raw.smtp_user),
        ("SMTP_PASS", &raw.smtp_pass),
    ];

    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.is_none())
        .map(|(key, _)| *key)
        .collect();

    if missing.len() == fields.len() {
        if raw.smtp_port.is_some() {
            tracing::warn!("SMTP_PORT is set but email notifications are not configured");
        }
        return Ok(None);
    }

    if !missing.is_empty() {
        return Err(ConfigError::Validation(format!(
            "email notifications are partially configured; missing {}",
            missing.join(", ")
        )));
    }

    let config = EmailConfig {
        to: raw.to_email.clone().unwrap_or_default(),
        from: raw.from_email.clone().unwrap_or_default(),
        smtp_server: raw.smtp_server.clone().unwrap_or_default(),
        smtp_port: raw.smtp_port.unwrap_or(DEFAULT_SMTP_PORT),
        smtp_user: raw.smtp_user.clone().unwrap_or_default(),
        smtp_pass: raw.smtp_pass.clone().unwrap_or_default(),
    };

    validate_email("TO_EMAIL", &config.to)?;
    validate_email("FROM_EMAIL", &config.from)?;

    if config.smtp_port == 0 {
        return Err(ConfigError::Invalid {
            key: "SMTP_PORT".to_string(),
            message: "port cannot be 0".to_string(),
        });
    }

    Ok(Some(config))
}

/// Validates an http(s) endpoint URL
fn validate_endpoint(key: &str, value: &str) -> Result<String, ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::Invalid {
        key: key.to_string(),
        message: format!("'{}' is not a valid URL ({})", value, e),
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Invalid {
            key: key.to_string(),
            message: format!("'{}' must use http or https", value),
        });
    }

    Ok(value.to_string())
}

/// Checks that an address parses the way the SMTP channel will parse it
fn validate_email(key: &str, email: &str) -> Result<(), ConfigError> {
    email
        .parse::<Mailbox>()
        .map(|_| ())
        .map_err(|e| ConfigError::Invalid {
            key: key.to_string(),
            message: format!("invalid email address '{}' ({})", email, e),
        })
}

fn validate_timeout(key: &str, secs: u64) -> Result<(), ConfigError> {
    if !(1..=MAX_TIMEOUT_SECS).contains(&secs) {
        return Err(ConfigError::Invalid {
            key: key.to_string(),
            message: format!(
                "timeout must be between 1 and {} seconds, got {}",
                MAX_TIMEOUT_SECS, secs
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> RawConfig {
        RawConfig {
            identifiers: Some(vec!["1HGCM82633A004352".to_string()]),
            bing_key: Some("bing-key".to_string()),
            ..RawConfig::default()
        }
    }

    fn email_raw() -> RawConfig {
        RawConfig {
            to_email: Some("me@example.com".to_string()),
            from_email: Some("alerts@example.com".to_string()),
            smtp_server: Some("smtp.example.com".to_string()),
            smtp_user: Some("alerts".to_string()),
            smtp_pass: Some("secret".to_string()),
            ..base()
        }
    }

    #[test]
    fn test_defaults() {
        let config = validate(base()).unwrap();
        assert_eq!(config.state_path, PathBuf::from(DEFAULT_STATE_PATH));
        assert_eq!(config.baseline, BaselinePolicy::Alert);
        assert_eq!(config.search.max_results, DEFAULT_MAX_RESULTS);
        assert_eq!(config.search.timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
        assert_eq!(
            config.search.providers,
            vec![ProviderConfig::Bing(BingConfig {
                api_key: "bing-key".to_string(),
                endpoint: BING_ENDPOINT.to_string(),
            })]
        );
        assert!(!config.notify.has_channels());
    }

    #[test]
    fn test_missing_identifiers() {
        let raw = RawConfig {
            identifiers: None,
            ..base()
        };
        assert!(matches!(validate(raw), Err(ConfigError::Missing(_))));

        let raw = RawConfig {
            identifiers: Some(vec!["  ".to_string()]),
            ..base()
        };
        assert!(matches!(validate(raw), Err(ConfigError::Missing(_))));
    }

    #[test]
    fn test_duplicate_identifiers_collapsed() {
        let raw = RawConfig {
            identifiers: Some(vec!["A".to_string(), "B".to_string(), "A".to_string()]),
            ..base()
        };
        assert_eq!(validate(raw).unwrap().identifiers, vec!["A", "B"]);
    }

    #[test]
    fn test_quote_in_identifier_rejected() {
        let raw = RawConfig {
            identifiers: Some(vec!["AB\"C".to_string()]),
            ..base()
        };
        assert!(matches!(validate(raw), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_no_provider_credentials() {
        let raw = RawConfig {
            bing_key: None,
            ..base()
        };
        assert!(matches!(validate(raw), Err(ConfigError::Missing(_))));
    }

    #[test]
    fn test_google_needs_both_key_and_id() {
        let raw = RawConfig {
            bing_key: None,
            google_cse_key: Some("g".to_string()),
            ..base()
        };
        match validate(raw) {
            Err(ConfigError::Missing(key)) => assert_eq!(key, "GOOGLE_CSE_ID"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_both_providers_in_order() {
        let raw = RawConfig {
            google_cse_key: Some("g".to_string()),
            google_cse_id: Some("cx".to_string()),
            ..base()
        };
        let kinds: Vec<_> = validate(raw)
            .unwrap()
            .search
            .providers
            .iter()
            .map(ProviderConfig::kind)
            .collect();
        assert_eq!(kinds, vec![ProviderKind::Bing, ProviderKind::GoogleCse]);
    }

    #[test]
    fn test_selected_provider_without_credentials() {
        let raw = RawConfig {
            providers: Some(vec!["google".to_string()]),
            ..base()
        };
        assert!(matches!(validate(raw), Err(ConfigError::Missing(_))));
    }

    #[test]
    fn test_unknown_provider() {
        let raw = RawConfig {
            providers: Some(vec!["altavista".to_string()]),
            ..base()
        };
        assert!(matches!(validate(raw), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_max_results_bounds() {
        for bad in [0, 51] {
            let raw = RawConfig {
                max_results: Some(bad),
                ..base()
            };
            assert!(matches!(validate(raw), Err(ConfigError::Validation(_))));
        }
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let raw = RawConfig {
            request_timeout_secs: Some(0),
            ..base()
        };
        assert!(validate(raw).is_err());
    }

    #[test]
    fn test_bad_baseline_policy() {
        let raw = RawConfig {
            baseline_policy: Some("sometimes".to_string()),
            ..base()
        };
        assert!(matches!(validate(raw), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_email_complete() {
        let config = validate(email_raw()).unwrap();
        let email = config.notify.email.unwrap();
        assert_eq!(email.smtp_port, DEFAULT_SMTP_PORT);
        assert_eq!(email.to, "me@example.com");
    }

    #[test]
    fn test_email_partial_rejected() {
        let raw = RawConfig {
            smtp_pass: None,
            ..email_raw()
        };
        match validate(raw) {
            Err(ConfigError::Validation(msg)) => assert!(msg.contains("SMTP_PASS")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_email_bad_address() {
        let raw = RawConfig {
            to_email: Some("not-an-address".to_string()),
            ..email_raw()
        };
        assert!(matches!(validate(raw), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_slack_url_validated() {
        let raw = RawConfig {
            slack_webhook_url: Some("ftp://hooks.example.com".to_string()),
            ..base()
        };
        assert!(matches!(validate(raw), Err(ConfigError::Invalid { .. })));

        let raw = RawConfig {
            slack_webhook_url: Some("https://hooks.slack.com/services/T/B/X".to_string()),
            ..base()
        };
        assert!(validate(raw).unwrap().notify.has_channels());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("K", "user@example.com").is_ok());
        assert!(validate_email("K", "admin@sub.example.com").is_ok());

        assert!(validate_email("K", "").is_err());
        assert!(validate_email("K", "invalid").is_err());
        assert!(validate_email("K", "@example.com").is_err());
        assert!(validate_email("K", "user@").is_err());
        assert!(validate_email("K", "me @example.com").is_err());
        assert!(validate_email("K", "Alerts <alerts@example.com>").is_ok());
    }

    #[test]
    fn test_email_with_space_rejected_at_load() {
        let raw = RawConfig {
            to_email: Some("me @example.com".to_string()),
            ..email_raw()
        };
        match validate(raw) {
            Err(ConfigError::Invalid { key, .. }) => assert_eq!(key, "TO_EMAIL"),
            other => panic!("expected invalid TO_EMAIL, got {:?}", other),
        }
    }

    #[test]
    fn test_huge_timeouts_rejected() {
        let raw = RawConfig {
            notify_timeout_secs: Some(u64::MAX),
            ..base()
        };
        match validate(raw) {
            Err(ConfigError::Invalid { key, .. }) => assert_eq!(key, "NOTIFY_TIMEOUT_SECS"),
            other => panic!("expected invalid NOTIFY_TIMEOUT_SECS, got {:?}", other),
        }

        let raw = RawConfig {
            request_timeout_secs: Some(3601),
            ..base()
        };
        assert!(validate(raw).is_err());

        let raw = RawConfig {
            request_timeout_secs: Some(3600),
            notify_timeout_secs: Some(3600),
            ..base()
        };
        assert!(validate(raw).is_ok());
    }
}
