use std::process::ExitCode;
use std::sync::Arc;

use authclient::config::{load_config, print_schema};
use authclient::models::RequestDescriptor;
use authclient::pipeline::ApiClient;
use authclient::utils::init_logging;
use http::Method;
use serde_json::{json, Value};
use tracing::{error, info, warn};

const USAGE: &str = "usage: authclient [--schema] <METHOD> <PATH> [JSON BODY]";

/// Credentials for an optional login before the request is sent.
const EMAIL_ENV: &str = "AUTHCLIENT_EMAIL";
const PASSWORD_ENV: &str = "AUTHCLIENT_PASSWORD";

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.iter().any(|arg| arg == "--schema") {
        print_schema();
        return ExitCode::SUCCESS;
    }

    let (method, path, body) = match parse_args(&args) {
        Ok(parsed) => parsed,
        Err(msg) => {
            eprintln!("{}\n{}", msg, USAGE);
            return ExitCode::from(2);
        }
    };

    let config = load_config();
    if let Err(e) = init_logging(&config.logging) {
        eprintln!("Failed to initialise logging: {}", e);
    }

    let on_forced_logout = || warn!("Session expired; log in again");
    let client = match ApiClient::from_config(&config, Arc::new(on_forced_logout)) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to create API client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let (Ok(email), Ok(password)) = (std::env::var(EMAIL_ENV), std::env::var(PASSWORD_ENV)) {
        info!("Logging in as {}", email);
        if let Err(e) = client
            .login(json!({ "email": email, "password": password }))
            .await
        {
            eprintln!("{}", e.message);
            return ExitCode::FAILURE;
        }
    }

    let mut request = RequestDescriptor::new(method, path);
    if let Some(body) = body {
        request = request.json(body);
    }

    match client.execute(request).await {
        Ok(response) => {
            println!("{}", response.text());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e.message);
            ExitCode::FAILURE
        }
    }
}

fn parse_args(args: &[String]) -> Result<(Method, String, Option<Value>), String> {
    match args {
        [method, path] => Ok((parse_method(method)?, path.clone(), None)),
        [method, path, body] => {
            let body = serde_json::from_str(body).map_err(|e| format!("Invalid JSON body: {}", e))?;
            Ok((parse_method(method)?, path.clone(), Some(body)))
        }
        _ => Err("Expected a method and a path".to_string()),
    }
}

fn parse_method(raw: &str) -> Result<Method, String> {
    Method::from_bytes(raw.to_uppercase().as_bytes())
        .map_err(|e| format!("Invalid method '{}': {}", raw, e))
}
