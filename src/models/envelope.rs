use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The uniform wrapper the API puts around every JSON body.
///
/// Every field is optional so that a partially conforming body still parses;
/// bodies that are not JSON objects are not envelopes at all.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub status: Option<i64>,
    pub code: Option<String>,
    pub message: Option<String>,
    pub is_success: Option<bool>,
    pub result: Option<Value>,
}

impl ResponseEnvelope {
    /// Parse an envelope out of a raw body. Returns `None` for anything that
    /// is not a JSON object.
    pub fn parse(body: &[u8]) -> Option<Self> {
        match serde_json::from_slice::<Value>(body) {
            Ok(value @ Value::Object(_)) => serde_json::from_value(value).ok(),
            _ => None,
        }
    }

    /// An application-level failure: the server explicitly said `isSuccess: false`.
    pub fn is_failure(&self) -> bool {
        self.is_success == Some(false)
    }

    /// `result.accessToken`, as returned by the login and refresh endpoints.
    pub fn access_token(&self) -> Option<String> {
        self.result
            .as_ref()
            .and_then(|result| result.get("accessToken"))
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
    }
}

/// A response as received from the transport, before any interpretation.
#[derive(Clone, Debug)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Vec<u8>) -> Self {
        ApiResponse {
            status,
            headers,
            body,
        }
    }

    pub fn envelope(&self) -> Option<ResponseEnvelope> {
        ResponseEnvelope::parse(&self.body)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Deserialize the envelope's `result` field.
    pub fn result<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        let envelope: ResponseEnvelope = serde_json::from_slice(&self.body)?;
        serde_json::from_value(envelope.result.unwrap_or(Value::Null))
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
