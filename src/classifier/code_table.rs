use std::collections::HashMap;

use crate::config::MessageConfig;

/// Message used when no other rule produces one.
pub const DEFAULT_FALLBACK_MESSAGE: &str = "요청 처리 중 오류가 발생했습니다.";

/// Built-in application code -> display message entries.
pub const DEFAULT_MESSAGES: &[(&str, &str)] = &[
    ("BAD_REQUEST", "잘못된 요청입니다."),
    ("INVALID_INPUT", "필수 값이 누락되었습니다."),
    ("VALIDATION_FAILED", "입력값을 확인해주세요."),
    ("INVALID_LOGIN", "이메일 또는 비밀번호가 올바르지 않습니다."),
    ("INVALID_SIGNIN", "이메일 또는 비밀번호가 올바르지 않습니다."),
    ("INVALID_PASSWORD", "비밀번호가 일치하지 않습니다."),
    ("INVALID_FILE_NAME", "허용되지 않은 파일 이름입니다."),
    ("INVALID_DATE_FORMAT", "날짜 형식이 올바르지 않습니다."),
    ("INVALID_DATE_RANGE", "날짜 범위가 올바르지 않습니다."),
    ("INVALID_TOKEN", "유효하지 않은 토큰입니다."),
    ("INVALID_ACCESS_TOKEN", "로그인이 만료되었습니다."),
    ("INVALID_REFRESH_TOKEN", "세션이 만료되었습니다. 다시 로그인해주세요."),
    ("UNAUTHORIZED", "인증이 필요합니다."),
    ("FORBIDDEN", "접근 권한이 없습니다."),
    ("PERMISSION_DENIED", "접근 권한이 없습니다."),
    ("NOT_FOUND", "대상을 찾을 수 없습니다."),
    ("CONFLICT", "이미 존재하는 데이터입니다."),
    ("ALREADY_EXISTS", "이미 존재하는 데이터입니다."),
    ("ALREADY_EXISTS_EMAIL", "이미 등록된 이메일입니다."),
    ("UNSUPPORTED_MEDIA_TYPE", "지원하지 않는 형식입니다."),
    ("INTERNAL_SERVER_ERROR", "서버 오류가 발생했습니다."),
    ("GATEWAY_TIMEOUT", "서버 응답이 지연되고 있습니다."),
    ("NETWORK_ERROR", "잠시 후 다시 시도해주세요."),
];

/// The code a bare HTTP status stands for, when the server sent no code.
pub fn code_for_status(status: u16) -> Option<&'static str> {
    match status {
        400 => Some("BAD_REQUEST"),
        401 => Some("UNAUTHORIZED"),
        403 => Some("FORBIDDEN"),
        404 => Some("NOT_FOUND"),
        409 => Some("CONFLICT"),
        415 => Some("UNSUPPORTED_MEDIA_TYPE"),
        500 => Some("INTERNAL_SERVER_ERROR"),
        504 => Some("GATEWAY_TIMEOUT"),
        _ => None,
    }
}

/// Immutable code -> message mapping.
#[derive(Debug, Clone)]
pub struct ErrorCodeTable {
    messages: HashMap<String, String>,
    fallback: String,
}

impl ErrorCodeTable {
    /// The built-in table.
    pub fn defaults() -> Self {
        ErrorCodeTable {
            messages: DEFAULT_MESSAGES
                .iter()
                .map(|(code, message)| (code.to_string(), message.to_string()))
                .collect(),
            fallback: DEFAULT_FALLBACK_MESSAGE.to_string(),
        }
    }

    /// The built-in table with configured overrides applied on top.
    pub fn from_config(config: &MessageConfig) -> Self {
        let mut table = Self::defaults();
        for (code, message) in &config.overrides {
            table.messages.insert(code.clone(), message.clone());
        }
        if let Some(fallback) = config.fallback.as_ref().filter(|f| !f.trim().is_empty()) {
            table.fallback = fallback.clone();
        }
        table
    }

    pub fn get(&self, code: &str) -> Option<&str> {
        self.messages.get(code).map(String::as_str)
    }

    pub fn for_status(&self, status: u16) -> Option<&str> {
        code_for_status(status).and_then(|code| self.get(code))
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Default for ErrorCodeTable {
    fn default() -> Self {
        Self::defaults()
    }
}
