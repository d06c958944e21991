use http::header::{InvalidHeaderValue, AUTHORIZATION};
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde_json::Value;

/// One logical outgoing call.
///
/// A descriptor is owned by a single `execute` for its whole lifetime: the
/// original dispatch plus at most one replay. `retried` can only move from
/// `false` to `true`.
#[derive(Debug)]
pub struct RequestDescriptor {
    pub method: Method,
    /// A path relative to the client's base URL, or an absolute URL.
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Value>,
    retried: bool,
    skip_refresh: bool,
}

impl RequestDescriptor {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        RequestDescriptor {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
            retried: false,
            skip_refresh: false,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::PUT, url)
    }

    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(Method::PATCH, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    /// Attach a JSON body.
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Opt this call out of the automatic refresh-and-retry flow.
    pub fn without_refresh(mut self) -> Self {
        self.skip_refresh = true;
        self
    }

    pub fn is_retried(&self) -> bool {
        self.retried
    }

    pub fn skips_refresh(&self) -> bool {
        self.skip_refresh
    }

    pub(crate) fn mark_retried(&mut self) {
        self.retried = true;
    }

    /// Set `Authorization: Bearer <token>`, replacing any previous value.
    pub fn set_bearer(&mut self, token: &str) -> Result<(), InvalidHeaderValue> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token))?;
        value.set_sensitive(true);
        self.headers.insert(AUTHORIZATION, value);
        Ok(())
    }

    /// The path component of the target, without query or fragment.
    pub fn path(&self) -> String {
        if self.url.contains("://") {
            if let Ok(parsed) = reqwest::Url::parse(&self.url) {
                return parsed.path().to_string();
            }
        }
        self.url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string()
    }
}
