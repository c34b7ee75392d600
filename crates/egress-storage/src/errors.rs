use egress_errors::prelude::*;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{0:?}")]
pub struct StorageError(pub Box<ErrorObj>);

impl StorageError {
    pub fn into_inner(self) -> ErrorObj {
        *self.0
    }

    pub fn obj(&self) -> &ErrorObj {
        &self.0
    }

    pub fn unavailable(msg: &str) -> Self {
        StorageError(Box::new(
            ErrorBuilder::new(codes::STORAGE_UNAVAILABLE, "db_unavailable")
                .user_msg("Storage is unavailable.")
                .dev_msg(msg)
                .http_status(500)
                .retryable(RetryClass::Transient)
                .severity(Severity::High)
                .build(),
        ))
    }

    pub fn not_found(msg: &str) -> Self {
        StorageError(Box::new(
            ErrorBuilder::new(codes::STORAGE_NOT_FOUND, "not_found")
                .user_msg("Not found.")
                .dev_msg(msg)
                .http_status(404)
                .build(),
        ))
    }

    pub fn conflict(msg: &str) -> Self {
        StorageError(Box::new(
            ErrorBuilder::new(codes::SCHEMA_VALIDATION, "bad_request")
                .user_msg("Record already exists.")
                .dev_msg(msg)
                .http_status(400)
                .build(),
        ))
    }

    pub fn internal(msg: &str) -> Self {
        StorageError(Box::new(
            ErrorBuilder::new(codes::UNKNOWN_INTERNAL, "internal")
                .user_msg("Internal storage error.")
                .dev_msg(msg)
                .http_status(500)
                .severity(Severity::High)
                .build(),
        ))
    }
}

impl From<StorageError> for ProxyError {
    fn from(err: StorageError) -> Self {
        ProxyError(err.0)
    }
}
