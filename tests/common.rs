use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use authclient::config::{extract_config, ConfigV1};
use authclient::pipeline::ApiClient;
use figment::{
    providers::{Format, Yaml},
    Figment,
};

pub const LOGIN_PATH: &str = "/api/v1/auth/login";
pub const REFRESH_PATH: &str = "/api/v1/auth/refresh";

pub const NEW_TOKEN_BODY: &str =
    r#"{"status":200,"code":"OK","message":"ok","isSuccess":true,"result":{"accessToken":"new"}}"#;
pub const EXPIRED_BODY: &str =
    r#"{"status":401,"code":"INVALID_ACCESS_TOKEN","message":"expired","isSuccess":false,"result":null}"#;
pub const DATA_BODY: &str =
    r#"{"status":200,"code":"OK","message":"ok","isSuccess":true,"result":{"id":1}}"#;

pub fn test_config(base_url: &str) -> ConfigV1 {
    let yaml = format!(
        r#"
version: "1.0.0"
base_url: "{}"
timeout_in_ms: 3000
logging:
  level: "debug"
  format: "json"
"#,
        base_url
    );
    extract_config(Figment::new().merge(Yaml::string(&yaml))).expect("valid test config")
}

/// A client against `base_url` plus a counter of forced logouts.
pub fn build_client(base_url: &str) -> (ApiClient, Arc<AtomicUsize>) {
    let logouts = Arc::new(AtomicUsize::new(0));
    let counter = logouts.clone();
    let hook = move || {
        counter.fetch_add(1, Ordering::SeqCst);
    };
    let client = ApiClient::from_config(&test_config(base_url), Arc::new(hook))
        .expect("client builds");
    (client, logouts)
}
