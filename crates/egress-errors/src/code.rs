use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ErrorCode(pub &'static str);

pub mod codes {
    use super::ErrorCode;

    pub const AUTH_UNAUTHENTICATED: ErrorCode = ErrorCode("AUTH_UNAUTHENTICATED");
    pub const AUTH_FORBIDDEN: ErrorCode = ErrorCode("AUTH_FORBIDDEN");
    pub const SCHEMA_VALIDATION: ErrorCode = ErrorCode("SCHEMA_VALIDATION");
    pub const UPSTREAM_CONSENT: ErrorCode = ErrorCode("UPSTREAM_CONSENT");
    pub const UPSTREAM_GATEWAY: ErrorCode = ErrorCode("UPSTREAM_GATEWAY");
    pub const UPSTREAM_UNAVAILABLE: ErrorCode = ErrorCode("UPSTREAM_UNAVAILABLE");
    pub const STORAGE_UNAVAILABLE: ErrorCode = ErrorCode("STORAGE_UNAVAILABLE");
    pub const STORAGE_NOT_FOUND: ErrorCode = ErrorCode("STORAGE_NOT_FOUND");
    pub const BUDGET_TIMEOUT: ErrorCode = ErrorCode("BUDGET_TIMEOUT");
    pub const UNKNOWN_INTERNAL: ErrorCode = ErrorCode("UNKNOWN_INTERNAL");
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum RetryClass {
    None,
    Transient,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Severity {
    Low,
    Medium,
    High,
}
