use serde_json::Value;

use super::code_table::ErrorCodeTable;
use crate::models::error::REFRESH_FAILURE_CODE;
use crate::models::{ClassifiedError, ErrorKind, ErrorPayload, MessageSource};

/// Separator between flattened detail messages.
const DETAIL_SEPARATOR: &str = ", ";

/// Turns raw failure payloads into display messages.
#[derive(Debug, Clone, Default)]
pub struct ErrorClassifier {
    table: ErrorCodeTable,
}

impl ErrorClassifier {
    pub fn new(table: ErrorCodeTable) -> Self {
        ErrorClassifier { table }
    }

    pub fn table(&self) -> &ErrorCodeTable {
        &self.table
    }

    /// Resolution order:
    /// 1. structured detail nested in `result`, flattened and joined
    /// 2. the table entry for `code`
    /// 3. the server `message`, verbatim
    /// 4. the table entry for the HTTP status
    /// 5. the generic fallback
    ///
    /// Refresh failures skip all of this and always map to the
    /// session-expired entry, so every waiter sees the same text.
    pub fn classify(&self, payload: ErrorPayload) -> ClassifiedError {
        let (message, origin) = match payload.kind {
            ErrorKind::RefreshFailure => self.refresh_message(),
            _ => self.resolve(&payload),
        };

        ClassifiedError {
            kind: payload.kind,
            message,
            origin,
            payload,
        }
    }

    fn refresh_message(&self) -> (String, MessageSource) {
        match self.table.get(REFRESH_FAILURE_CODE) {
            Some(message) => (message.to_string(), MessageSource::CodeTable),
            None => (self.table.fallback().to_string(), MessageSource::Fallback),
        }
    }

    fn resolve(&self, payload: &ErrorPayload) -> (String, MessageSource) {
        if let Some(detail) = payload.result.as_ref().and_then(flatten_detail) {
            return (detail, MessageSource::Detail);
        }

        if let Some(message) = payload.code.as_deref().and_then(|c| self.table.get(c)) {
            return (message.to_string(), MessageSource::CodeTable);
        }

        if let Some(message) = payload.message.as_deref().filter(|m| !m.trim().is_empty()) {
            return (message.to_string(), MessageSource::ServerMessage);
        }

        if let Some(message) = payload.http_status.and_then(|s| self.table.for_status(s)) {
            return (message.to_string(), MessageSource::StatusTable);
        }

        (self.table.fallback().to_string(), MessageSource::Fallback)
    }
}

/// Flatten strings, arrays and objects of strings into one message.
/// Returns `None` when nothing usable is found.
pub fn flatten_detail(value: &Value) -> Option<String> {
    let mut parts = Vec::new();
    collect_strings(value, &mut parts);
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(DETAIL_SEPARATOR))
    }
}

fn collect_strings(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if !s.is_empty() {
                out.push(s.to_string());
            }
        }
        Value::Array(items) => items.iter().for_each(|item| collect_strings(item, out)),
        Value::Object(map) => map.values().for_each(|item| collect_strings(item, out)),
        // numbers, booleans and nulls carry no message
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(
        kind: ErrorKind,
        status: Option<u16>,
        code: Option<&str>,
        message: Option<&str>,
        result: Option<Value>,
    ) -> ErrorPayload {
        ErrorPayload {
            kind,
            http_status: status,
            code: code.map(str::to_string),
            message: message.map(str::to_string),
            result,
        }
    }

    #[test]
    fn nested_detail_wins_over_everything() {
        let classifier = ErrorClassifier::default();
        let classified = classifier.classify(payload(
            ErrorKind::Transport,
            Some(400),
            Some("VALIDATION_FAILED"),
            Some("validation failed"),
            Some(json!({"field": ["must not be blank"]})),
        ));

        assert_eq!(classified.message, "must not be blank");
        assert_eq!(classified.origin, MessageSource::Detail);
    }

    #[test]
    fn nested_detail_without_table_code_is_not_fallback() {
        let classifier = ErrorClassifier::default();
        let classified = classifier.classify(payload(
            ErrorKind::Application,
            Some(200),
            Some("SOMETHING_UNMAPPED"),
            None,
            Some(json!({"field": ["must not be blank"]})),
        ));

        assert_eq!(classified.message, "must not be blank");
        assert!(!classified.is_fallback());
    }

    #[test]
    fn multiple_fields_are_joined() {
        let detail = flatten_detail(&json!({
            "email": ["must be an email", "must not be blank"],
            "name": "too long",
            "age": 3,
            "nested": {"inner": ["deep"]}
        }))
        .unwrap();

        // serde_json orders object keys, so the join order is stable
        assert_eq!(
            detail,
            "must be an email, must not be blank, too long, deep"
        );
    }

    #[test]
    fn empty_detail_falls_through_to_code_table() {
        let classifier = ErrorClassifier::default();
        let classified = classifier.classify(payload(
            ErrorKind::Application,
            Some(200),
            Some("NOT_FOUND"),
            Some("no such thing"),
            Some(json!({"count": 0, "items": []})),
        ));

        assert_eq!(classified.message, "대상을 찾을 수 없습니다.");
        assert_eq!(classified.origin, MessageSource::CodeTable);
    }

    #[test]
    fn unknown_code_uses_server_message() {
        let classifier = ErrorClassifier::default();
        let classified = classifier.classify(payload(
            ErrorKind::Transport,
            Some(409),
            Some("ROLE_IN_USE"),
            Some("role is still assigned"),
            None,
        ));

        assert_eq!(classified.message, "role is still assigned");
        assert_eq!(classified.origin, MessageSource::ServerMessage);
    }

    #[test]
    fn bare_status_uses_status_table() {
        let classifier = ErrorClassifier::default();
        let classified =
            classifier.classify(payload(ErrorKind::Transport, Some(500), None, None, None));

        assert_eq!(classified.message, "서버 오류가 발생했습니다.");
        assert_eq!(classified.origin, MessageSource::StatusTable);
    }

    #[test]
    fn nothing_known_uses_fallback() {
        let classifier = ErrorClassifier::default();
        let classified = classifier.classify(payload(
            ErrorKind::Transport,
            Some(418),
            Some("TEAPOT"),
            Some("   "),
            None,
        ));

        assert!(classified.is_fallback());
        assert_eq!(classified.message, crate::classifier::DEFAULT_FALLBACK_MESSAGE);
    }

    #[test]
    fn refresh_failures_always_map_to_session_expired() {
        let classifier = ErrorClassifier::default();
        let classified = classifier.classify(ErrorPayload::refresh_failure(
            Some(500),
            "refresh rejected with status 500",
        ));

        assert_eq!(classified.kind, ErrorKind::RefreshFailure);
        assert_eq!(
            classified.message,
            "세션이 만료되었습니다. 다시 로그인해주세요."
        );
    }

    #[test]
    fn network_errors_map_to_retry_later() {
        let classifier = ErrorClassifier::default();
        let classified = classifier.classify(ErrorPayload::network("connection refused"));

        assert_eq!(classified.message, "잠시 후 다시 시도해주세요.");
        assert_eq!(classified.http_status(), None);
    }
}
