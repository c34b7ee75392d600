use serde::Serialize;

use crate::code::{ErrorCode, RetryClass, Severity};

/// Canonical error object. `wire` is the stable machine-readable code that
/// reaches callers; `message_dev` stays server-side (logs only).
#[derive(Clone, Debug, Serialize)]
pub struct ErrorObj {
    pub code: ErrorCode,
    pub wire: &'static str,
    pub message_user: String,
    pub message_dev: Option<String>,
    pub http_status: u16,
    pub retryable: RetryClass,
    pub severity: Severity,
}

impl ErrorObj {
    pub fn to_public(&self) -> PublicErrorView {
        PublicErrorView {
            error: self.wire,
            message: self.message_user.clone(),
        }
    }
}

/// The only shape a caller ever sees: no stack traces, no upstream bodies.
#[derive(Clone, Debug, Serialize)]
pub struct PublicErrorView {
    pub error: &'static str,
    pub message: String,
}

#[derive(Clone, Debug)]
pub struct ErrorBuilder {
    code: ErrorCode,
    wire: &'static str,
    user_msg: Option<String>,
    dev_msg: Option<String>,
    http_status: u16,
    retryable: RetryClass,
    severity: Severity,
}

impl ErrorBuilder {
    pub fn new(code: ErrorCode, wire: &'static str) -> Self {
        Self {
            code,
            wire,
            user_msg: None,
            dev_msg: None,
            http_status: 500,
            retryable: RetryClass::None,
            severity: Severity::Low,
        }
    }

    pub fn user_msg(mut self, msg: &str) -> Self {
        self.user_msg = Some(msg.to_string());
        self
    }

    pub fn dev_msg(mut self, msg: impl Into<String>) -> Self {
        self.dev_msg = Some(msg.into());
        self
    }

    pub fn http_status(mut self, status: u16) -> Self {
        self.http_status = status;
        self
    }

    pub fn retryable(mut self, retry: RetryClass) -> Self {
        self.retryable = retry;
        self
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn build(self) -> ErrorObj {
        ErrorObj {
            code: self.code,
            wire: self.wire,
            message_user: self
                .user_msg
                .unwrap_or_else(|| "Internal error.".to_string()),
            message_dev: self.dev_msg,
            http_status: self.http_status,
            retryable: self.retryable,
            severity: self.severity,
        }
    }
}
