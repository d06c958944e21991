use std::collections::HashSet;
use std::fmt;

use tracing::info;

use crate::config::{EndpointConfig, PolicyConfig};
use crate::models::{ErrorPayload, RequestDescriptor};

/// Why a failed call may or may not go through refresh-and-retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshDecision {
    Eligible,
    NotUnauthorized(Option<u16>),
    ExcludedPath(String),
    ExcludedCode(String),
    OptedOut,
}

impl RefreshDecision {
    pub fn is_eligible(&self) -> bool {
        matches!(self, RefreshDecision::Eligible)
    }
}

impl fmt::Display for RefreshDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefreshDecision::Eligible => write!(f, "eligible"),
            RefreshDecision::NotUnauthorized(Some(status)) => write!(f, "status {} is not 401", status),
            RefreshDecision::NotUnauthorized(None) => write!(f, "no response received"),
            RefreshDecision::ExcludedPath(path) => write!(f, "path '{}' is excluded", path),
            RefreshDecision::ExcludedCode(code) => write!(f, "code '{}' means rejected credentials", code),
            RefreshDecision::OptedOut => write!(f, "request opted out of refresh"),
        }
    }
}

/// Static rules for which failures must never trigger a refresh.
#[derive(Debug, Clone)]
pub struct ExclusionPolicy {
    excluded_paths: Vec<String>,
    excluded_codes: HashSet<String>,
}

impl ExclusionPolicy {
    pub fn new(
        excluded_paths: impl IntoIterator<Item = String>,
        excluded_codes: impl IntoIterator<Item = String>,
    ) -> Self {
        let mut paths: Vec<String> = Vec::new();
        for path in excluded_paths {
            let path = normalize(&path);
            if !path.is_empty() && !paths.contains(&path) {
                paths.push(path);
            }
        }

        ExclusionPolicy {
            excluded_paths: paths,
            excluded_codes: excluded_codes.into_iter().collect(),
        }
    }

    /// The login and refresh endpoints are always excluded, whatever the
    /// policy config says.
    pub fn from_config(policy: &PolicyConfig, endpoints: &EndpointConfig) -> Self {
        let paths = [endpoints.login_path.clone(), endpoints.refresh_path.clone()]
            .into_iter()
            .chain(policy.excluded_paths.iter().cloned());
        let policy = Self::new(paths, policy.excluded_codes.iter().cloned());

        info!(
            "Refresh exclusion policy: {} paths, {} codes",
            policy.excluded_paths.len(),
            policy.excluded_codes.len()
        );
        policy
    }

    pub fn check(&self, request: &RequestDescriptor, payload: &ErrorPayload) -> RefreshDecision {
        if !payload.is_unauthorized() {
            return RefreshDecision::NotUnauthorized(payload.http_status);
        }

        let path = normalize(&request.path());
        if let Some(excluded) = self.excluded_paths.iter().find(|p| path.ends_with(p.as_str())) {
            return RefreshDecision::ExcludedPath(excluded.clone());
        }

        if let Some(code) = payload.code.as_ref().filter(|c| self.excluded_codes.contains(*c)) {
            return RefreshDecision::ExcludedCode(code.clone());
        }

        if request.skips_refresh() {
            return RefreshDecision::OptedOut;
        }

        RefreshDecision::Eligible
    }
}

fn normalize(path: &str) -> String {
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.is_empty() || trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}
