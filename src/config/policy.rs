use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const DEFAULT_LOGIN_PATH: &str = "/api/v1/auth/login";
pub const DEFAULT_REFRESH_PATH: &str = "/api/v1/auth/refresh";
pub const DEFAULT_LOGOUT_PATH: &str = "/api/v1/auth/logout";

/// Paths of the session endpoints on the API server.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct EndpointConfig {
    #[serde(default = "default_login_path")]
    pub login_path: String,
    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,
    #[serde(default = "default_logout_path")]
    pub logout_path: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            login_path: default_login_path(),
            refresh_path: default_refresh_path(),
            logout_path: default_logout_path(),
        }
    }
}

fn default_login_path() -> String {
    DEFAULT_LOGIN_PATH.to_string()
}

fn default_refresh_path() -> String {
    DEFAULT_REFRESH_PATH.to_string()
}

fn default_logout_path() -> String {
    DEFAULT_LOGOUT_PATH.to_string()
}

/// Rules for which failed calls must never trigger a token refresh.
///
/// The login and refresh endpoints are always excluded; `excluded_paths`
/// only adds to them.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct PolicyConfig {
    #[serde(default)]
    pub excluded_paths: Vec<String>,
    /// Application codes meaning "the credentials themselves were rejected".
    #[serde(default = "default_excluded_codes")]
    pub excluded_codes: Vec<String>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            excluded_paths: Vec::new(),
            excluded_codes: default_excluded_codes(),
        }
    }
}

fn default_excluded_codes() -> Vec<String> {
    ["INVALID_SIGNIN", "INVALID_LOGIN", "INVALID_PASSWORD", "INVALID_REFRESH_TOKEN"]
        .iter()
        .map(|code| code.to_string())
        .collect()
}

/// Overrides for the built-in error message table.
#[derive(Deserialize, Serialize, Debug, Clone, Default, JsonSchema)]
pub struct MessageConfig {
    /// Application code -> display message. Replaces or extends the defaults.
    #[serde(default)]
    pub overrides: BTreeMap<String, String>,
    /// Message used when nothing else matches.
    pub fallback: Option<String>,
}
