//! Configuration module for vin-watch
//!
//! This module gathers settings from an optional TOML file and from
//! environment variables, then validates them into a typed [`Config`].
//! Missing or invalid settings are fatal before any network or state work.
//!
//! # Example
//!
//! ```no_run
//! use vin_watch::config::load_config;
//!
//! let config = load_config(None, |key| std::env::var(key).ok()).unwrap();
//! println!("State file: {}", config.state_path.display());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BingConfig, Config, EmailConfig, GoogleCseConfig, NotifyConfig, ProviderConfig, ProviderKind,
    RawConfig, SearchConfig, SlackConfig, BING_ENDPOINT, DEFAULT_STATE_PATH, GOOGLE_CSE_ENDPOINT,
};

// Re-export parser functions
pub use parser::{
    load_config, load_file_config, parse_file_config, raw_config_from_env, split_list,
};
pub use validation::validate;
