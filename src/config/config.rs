use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use super::logging::LoggingConfig;
use super::policy::{EndpointConfig, MessageConfig, PolicyConfig};

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "./config.yaml";

/// Environment variable pointing at an alternative configuration file.
pub const CONFIG_PATH_ENV: &str = "AUTHCLIENT_CONFIG";

/// Prefix for environment overrides, e.g. `AUTHCLIENT_LOGGING__LEVEL=debug`.
pub const ENV_PREFIX: &str = "AUTHCLIENT_";

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),
}

/// A top-level enum for versioned configurations.
#[derive(Deserialize, Serialize, JsonSchema)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1.0.0")]
    ConfigV1(ConfigV1),
}

/// Main config for v1.0.0: where the API lives and how the client behaves.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct ConfigV1 {
    /// Base URL every relative request path is resolved against.
    pub base_url: String,
    #[serde(default = "default_timeout_in_ms")]
    pub timeout_in_ms: u64,
    #[serde(default)]
    pub endpoints: EndpointConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub messages: MessageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ConfigV1 {
    /// A configuration with every section at its default.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_in_ms: default_timeout_in_ms(),
            endpoints: EndpointConfig::default(),
            policy: PolicyConfig::default(),
            messages: MessageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_timeout_in_ms() -> u64 {
    10_000
}

/// Extract a `ConfigV1` from an already assembled figment.
pub fn extract_config(figment: Figment) -> Result<ConfigV1, ConfigError> {
    match figment.extract::<Config>().map_err(Box::new)? {
        Config::ConfigV1(c) => Ok(c),
    }
    // handle configuration migration between versions here when necessary
}

/// Load config from the YAML file (see `CONFIG_PATH_ENV`), with
/// `AUTHCLIENT_`-prefixed environment variables taking precedence.
pub fn load_config() -> ConfigV1 {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let figment = Figment::new().merge(Yaml::file(&path)).merge(
        Env::prefixed(ENV_PREFIX)
            .ignore(&["config", "email", "password"])
            .split("__"),
    );

    match extract_config(figment) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading configuration from {}: {}", path, e);
            std::process::exit(1);
        }
    }
}

/// Print the JSON schema for the configuration to stdout.
pub fn print_schema() {
    let schema = schema_for!(Config);
    match serde_json::to_string_pretty(&schema) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to render schema: {}", e),
    }
}
