use crate::state::BaselinePolicy;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Default Bing Web Search endpoint
pub const BING_ENDPOINT: &str = "https://api.bing.microsoft.com/v7.0/search";

/// Default Google Programmable Search endpoint
pub const GOOGLE_CSE_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

/// Default location of the seen-URL ledger
pub const DEFAULT_STATE_PATH: &str = "state.json";

pub const DEFAULT_MAX_RESULTS: u32 = 25;
pub const DEFAULT_USER_AGENT: &str = "vin-watch/1.0 (+no-auto-scrape; search-api-only)";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_NOTIFY_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// Validated configuration for a run
///
/// Built once at startup by [`crate::config::load_config`] and passed by
/// value to the run orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// VINs to search for, in the order they were configured
    pub identifiers: Vec<String>,

    /// Path of the JSON ledger
    pub state_path: PathBuf,

    /// First-run behavior for identifiers without a ledger entry
    pub baseline: BaselinePolicy,

    pub search: SearchConfig,

    pub notify: NotifyConfig,
}

/// Search provider configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Providers queried for every identifier, in order
    pub providers: Vec<ProviderConfig>,

    /// Maximum results requested per provider call
    pub max_results: u32,

    /// User-Agent sent with every search request
    pub user_agent: String,

    /// Upper bound on a single provider call (seconds)
    pub timeout_secs: u64,
}

/// Which search vendor a provider talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Bing,
    GoogleCse,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bing => "bing",
            Self::GoogleCse => "google_cse",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bing" => Ok(Self::Bing),
            "google" | "google_cse" | "google-cse" => Ok(Self::GoogleCse),
            other => Err(format!("unknown search provider '{}'", other)),
        }
    }
}

/// Credentials and endpoint for one search provider
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderConfig {
    Bing(BingConfig),
    GoogleCse(GoogleCseConfig),
}

impl ProviderConfig {
    pub fn kind(&self) -> ProviderKind {
        match self {
            Self::Bing(_) => ProviderKind::Bing,
            Self::GoogleCse(_) => ProviderKind::GoogleCse,
        }
    }
}

/// Bing Web Search settings
#[derive(Debug, Clone, PartialEq)]
pub struct BingConfig {
    pub api_key: String,
    pub endpoint: String,
}

/// Google Programmable Search (Custom Search JSON API) settings
#[derive(Debug, Clone, PartialEq)]
pub struct GoogleCseConfig {
    pub api_key: String,
    /// Search engine ID (`cx`)
    pub engine_id: String,
    pub endpoint: String,
}

/// Notification channel configuration
///
/// With no channel configured, alerts are printed to stdout.
#[derive(Debug, Clone, PartialEq)]
pub struct NotifyConfig {
    pub email: Option<EmailConfig>,
    pub slack: Option<SlackConfig>,

    /// Upper bound on a single notification attempt (seconds)
    pub timeout_secs: u64,
}

impl NotifyConfig {
    /// Returns true if at least one external channel is configured
    pub fn has_channels(&self) -> bool {
        self.email.is_some() || self.slack.is_some()
    }
}

/// SMTP email settings
#[derive(Clone, PartialEq)]
pub struct EmailConfig {
    pub to: String,
    pub from: String,
    pub smtp_server: String,
    pub smtp_port: u16,
    pub smtp_user: String,
    pub smtp_pass: String,
}

impl fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailConfig")
            .field("to", &self.to)
            .field("from", &self.from)
            .field("smtp_server", &self.smtp_server)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_user", &self.smtp_user)
            .field("smtp_pass", &"<redacted>")
            .finish()
    }
}

/// Slack-compatible incoming webhook settings
#[derive(Debug, Clone, PartialEq)]
pub struct SlackConfig {
    pub webhook_url: String,
}

/// Unvalidated settings gathered from the config file and the environment
///
/// Every field is optional so that sources can be layered; validation turns
/// the merged result into a [`Config`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawConfig {
    pub identifiers: Option<Vec<String>>,
    pub state_path: Option<String>,
    pub baseline_policy: Option<String>,
    pub providers: Option<Vec<String>>,
    pub max_results: Option<u32>,
    pub user_agent: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub bing_key: Option<String>,
    pub bing_endpoint: Option<String>,
    pub google_cse_key: Option<String>,
    pub google_cse_id: Option<String>,
    pub google_cse_endpoint: Option<String>,
    pub to_email: Option<String>,
    pub from_email: Option<String>,
    pub smtp_server: Option<String>,
    pub smtp_port: Option<u16>,
    pub smtp_user: Option<String>,
    pub smtp_pass: Option<String>,
    pub slack_webhook_url: Option<String>,
    pub notify_timeout_secs: Option<u64>,
}

/// On-disk TOML layout
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub vins: Option<Vec<String>>,

    #[serde(rename = "state-path", default)]
    pub state_path: Option<String>,

    #[serde(rename = "baseline-policy", default)]
    pub baseline_policy: Option<String>,

    #[serde(default)]
    pub search: FileSearchConfig,

    #[serde(default)]
    pub notify: FileNotifyConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileSearchConfig {
    #[serde(default)]
    pub providers: Option<Vec<String>>,

    #[serde(rename = "max-results", default)]
    pub max_results: Option<u32>,

    #[serde(rename = "user-agent", default)]
    pub user_agent: Option<String>,

    #[serde(rename = "timeout-secs", default)]
    pub timeout_secs: Option<u64>,

    #[serde(default)]
    pub bing: Option<FileBingConfig>,

    #[serde(default)]
    pub google: Option<FileGoogleConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileBingConfig {
    #[serde(rename = "api-key", default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileGoogleConfig {
    #[serde(rename = "api-key", default)]
    pub api_key: Option<String>,

    #[serde(rename = "engine-id", default)]
    pub engine_id: Option<String>,

    #[serde(default)]
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileNotifyConfig {
    #[serde(rename = "timeout-secs", default)]
    pub timeout_secs: Option<u64>,

    #[serde(default)]
    pub email: Option<FileEmailConfig>,

    #[serde(default)]
    pub slack: Option<FileSlackConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileEmailConfig {
    #[serde(default)]
    pub to: Option<String>,

    #[serde(default)]
    pub from: Option<String>,

    #[serde(rename = "smtp-server", default)]
    pub smtp_server: Option<String>,

    #[serde(rename = "smtp-port", default)]
    pub smtp_port: Option<u16>,

    #[serde(rename = "smtp-user", default)]
    pub smtp_user: Option<String>,

    #[serde(rename = "smtp-pass", default)]
    pub smtp_pass: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileSlackConfig {
    #[serde(rename = "webhook-url", default)]
    pub webhook_url: Option<String>,
}

impl From<FileConfig> for RawConfig {
    fn from(file: FileConfig) -> Self {
        let bing = file.search.bing.unwrap_or_default();
        let google = file.search.google.unwrap_or_default();
        let email = file.notify.email.unwrap_or_default();
        let slack = file.notify.slack.unwrap_or_default();

        RawConfig {
            identifiers: file.vins,
            state_path: file.state_path,
            baseline_policy: file.baseline_policy,
            providers: file.search.providers,
            max_results: file.search.max_results,
            user_agent: file.search.user_agent,
            request_timeout_secs: file.search.timeout_secs,
            bing_key: bing.api_key,
            bing_endpoint: bing.endpoint,
            google_cse_key: google.api_key,
            google_cse_id: google.engine_id,
            google_cse_endpoint: google.endpoint,
            to_email: email.to,
            from_email: email.from,
            smtp_server: email.smtp_server,
            smtp_port: email.smtp_port,
            smtp_user: email.smtp_user,
            smtp_pass: email.smtp_pass,
            slack_webhook_url: slack.webhook_url,
            notify_timeout_secs: file.notify.timeout_secs,
        }
    }
}

impl RawConfig {
    /// Layers `other` on top of `self`; values set in `other` win
    pub fn merge(self, other: RawConfig) -> RawConfig {
        RawConfig {
            identifiers: other.identifiers.or(self.identifiers),
            state_path: other.state_path.or(self.state_path),
            baseline_policy: other.baseline_policy.or(self.baseline_policy),
            providers: other.providers.or(self.providers),
            max_results: other.max_results.or(self.max_results),
            user_agent: other.user_agent.or(self.user_agent),
            request_timeout_secs: other.request_timeout_secs.or(self.request_timeout_secs),
            bing_key: other.bing_key.or(self.bing_key),
            bing_endpoint: other.bing_endpoint.or(self.bing_endpoint),
            google_cse_key: other.google_cse_key.or(self.google_cse_key),
            google_cse_id: other.google_cse_id.or(self.google_cse_id),
            google_cse_endpoint: other.google_cse_endpoint.or(self.google_cse_endpoint),
            to_email: other.to_email.or(self.to_email),
            from_email: other.from_email.or(self.from_email),
            smtp_server: other.smtp_server.or(self.smtp_server),
            smtp_port: other.smtp_port.or(self.smtp_port),
            smtp_user: other.smtp_user.or(self.smtp_user),
            smtp_pass: other.smtp_pass.or(self.smtp_pass),
            slack_webhook_url: other.slack_webhook_url.or(self.slack_webhook_url),
            notify_timeout_secs: other.notify_timeout_secs.or(self.notify_timeout_secs),
        }
    }
}
