use thiserror::Error;

use crate::code::{codes, RetryClass, Severity};
use crate::model::{ErrorBuilder, ErrorObj};

/// Error currency of the proxy pipeline. Wire codes are part of the public
/// contract and must stay stable.
#[derive(Debug, Error)]
#[error("{0:?}")]
pub struct ProxyError(pub Box<ErrorObj>);

impl ProxyError {
    pub fn into_inner(self) -> ErrorObj {
        *self.0
    }

    pub fn obj(&self) -> &ErrorObj {
        &self.0
    }

    pub fn missing_org_key() -> Self {
        ProxyError(Box::new(
            ErrorBuilder::new(codes::AUTH_UNAUTHENTICATED, "missing_org_key")
                .user_msg("Org key is required.")
                .http_status(401)
                .build(),
        ))
    }

    pub fn invalid_org_key(detail: &str) -> Self {
        ProxyError(Box::new(
            ErrorBuilder::new(codes::AUTH_FORBIDDEN, "invalid_org_key")
                .user_msg("Org key is not recognized.")
                .dev_msg(detail)
                .http_status(403)
                .build(),
        ))
    }

    pub fn bad_request(detail: &str) -> Self {
        ProxyError(Box::new(
            ErrorBuilder::new(codes::SCHEMA_VALIDATION, "bad_request")
                .user_msg("Request is malformed.")
                .dev_msg(detail)
                .http_status(400)
                .build(),
        ))
    }

    pub fn missing_session_id() -> Self {
        ProxyError(Box::new(
            ErrorBuilder::new(codes::SCHEMA_VALIDATION, "bad_request")
                .user_msg("missing session_id")
                .http_status(400)
                .build(),
        ))
    }

    pub fn consent_failed(detail: &str) -> Self {
        ProxyError(Box::new(
            ErrorBuilder::new(codes::UPSTREAM_CONSENT, "consent_failed")
                .user_msg("Consent could not be issued.")
                .dev_msg(detail)
                .http_status(502)
                .severity(Severity::High)
                .build(),
        ))
    }

    pub fn gateway_failed(detail: &str) -> Self {
        ProxyError(Box::new(
            ErrorBuilder::new(codes::UPSTREAM_GATEWAY, "gateway_failed")
                .user_msg("Model gateway call failed.")
                .dev_msg(detail)
                .http_status(502)
                .severity(Severity::High)
                .build(),
        ))
    }

    pub fn upstream_unavailable(detail: &str) -> Self {
        ProxyError(Box::new(
            ErrorBuilder::new(codes::UPSTREAM_UNAVAILABLE, "gateway_failed")
                .user_msg("Upstream service is unreachable.")
                .dev_msg(detail)
                .http_status(502)
                .retryable(RetryClass::Transient)
                .build(),
        ))
    }

    pub fn store_unavailable(detail: &str) -> Self {
        ProxyError(Box::new(
            ErrorBuilder::new(codes::STORAGE_UNAVAILABLE, "db_unavailable")
                .user_msg("Directory is unavailable.")
                .dev_msg(detail)
                .http_status(500)
                .retryable(RetryClass::Transient)
                .severity(Severity::High)
                .build(),
        ))
    }

    pub fn not_found(detail: &str) -> Self {
        ProxyError(Box::new(
            ErrorBuilder::new(codes::STORAGE_NOT_FOUND, "not_found")
                .user_msg("Not found.")
                .dev_msg(detail)
                .http_status(404)
                .build(),
        ))
    }

    pub fn timeout(detail: &str) -> Self {
        ProxyError(Box::new(
            ErrorBuilder::new(codes::BUDGET_TIMEOUT, "timeout")
                .user_msg("Invocation exceeded its time budget.")
                .dev_msg(detail)
                .http_status(504)
                .severity(Severity::Medium)
                .build(),
        ))
    }

    pub fn internal(detail: &str) -> Self {
        ProxyError(Box::new(
            ErrorBuilder::new(codes::UNKNOWN_INTERNAL, "internal")
                .user_msg("Internal error.")
                .dev_msg(detail)
                .http_status(500)
                .severity(Severity::High)
                .build(),
        ))
    }
}

impl From<ErrorObj> for ProxyError {
    fn from(value: ErrorObj) -> Self {
        ProxyError(Box::new(value))
    }
}

impl From<ProxyError> for ErrorObj {
    fn from(value: ProxyError) -> Self {
        value.into_inner()
    }
}
