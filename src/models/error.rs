use std::fmt;

use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::envelope::ApiResponse;

/// Code attached to failures where no response was received at all.
pub const NETWORK_ERROR_CODE: &str = "NETWORK_ERROR";

/// Code attached to every refresh failure.
pub const REFRESH_FAILURE_CODE: &str = "INVALID_REFRESH_TOKEN";

/// Where a failure came from.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Non-2xx response, or no response at all.
    Transport,
    /// 2xx response whose envelope says `isSuccess: false`.
    Application,
    /// The token refresh itself failed. Terminal.
    RefreshFailure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Transport => "transport",
            ErrorKind::Application => "application",
            ErrorKind::RefreshFailure => "refresh_failure",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure normalized to one shape, whatever produced it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ErrorPayload {
    pub kind: ErrorKind,
    pub http_status: Option<u16>,
    pub code: Option<String>,
    pub message: Option<String>,
    pub result: Option<Value>,
}

impl ErrorPayload {
    /// Build a payload from a response, lifting code/message/result out of
    /// its envelope when it has one.
    pub fn from_response(kind: ErrorKind, response: &ApiResponse) -> Self {
        let envelope = response.envelope().unwrap_or_default();
        ErrorPayload {
            kind,
            http_status: Some(response.status.as_u16()),
            code: envelope.code,
            message: envelope.message,
            result: envelope.result,
        }
    }

    /// No response was received (connect failure, timeout, ...).
    pub fn network(detail: impl Into<String>) -> Self {
        ErrorPayload {
            kind: ErrorKind::Transport,
            http_status: None,
            code: Some(NETWORK_ERROR_CODE.to_string()),
            message: Some(detail.into()),
            result: None,
        }
    }

    pub fn refresh_failure(http_status: Option<u16>, detail: impl Into<String>) -> Self {
        ErrorPayload {
            kind: ErrorKind::RefreshFailure,
            http_status,
            code: Some(REFRESH_FAILURE_CODE.to_string()),
            message: Some(detail.into()),
            result: None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.http_status == Some(StatusCode::UNAUTHORIZED.as_u16())
    }
}

/// Which rule produced a classified message.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MessageSource {
    /// Flattened structured detail from `result`.
    Detail,
    /// The error code table entry for `code`.
    CodeTable,
    /// The server-supplied `message`, verbatim.
    ServerMessage,
    /// The error code table entry derived from the HTTP status.
    StatusTable,
    /// Nothing matched; the generic fallback text.
    Fallback,
}

impl MessageSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageSource::Detail => "detail",
            MessageSource::CodeTable => "code_table",
            MessageSource::ServerMessage => "server_message",
            MessageSource::StatusTable => "status_table",
            MessageSource::Fallback => "fallback",
        }
    }
}

/// The display-ready rejection every failed call resolves to.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    pub message: String,
    pub origin: MessageSource,
    pub payload: ErrorPayload,
}

impl ClassifiedError {
    pub fn http_status(&self) -> Option<u16> {
        self.payload.http_status
    }

    pub fn code(&self) -> Option<&str> {
        self.payload.code.as_deref()
    }

    /// True when no rule matched and the generic text was used.
    pub fn is_fallback(&self) -> bool {
        self.origin == MessageSource::Fallback
    }
}
