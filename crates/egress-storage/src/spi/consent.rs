use crate::errors::StorageError;
use crate::model::ConsentRecord;
use async_trait::async_trait;
use egress_types::prelude::OrgId;

#[async_trait]
pub trait ConsentStore: Send + Sync {
    async fn insert(&self, record: ConsentRecord) -> Result<(), StorageError>;

    /// First revocation wins. Revoking an already-revoked or unknown consent
    /// is a no-op, not an error.
    async fn revoke(&self, org: &OrgId, id: &str, at: i64) -> Result<(), StorageError>;

    async fn get(&self, org: &OrgId, id: &str) -> Result<Option<ConsentRecord>, StorageError>;
}
