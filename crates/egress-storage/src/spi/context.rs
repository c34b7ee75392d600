use crate::errors::StorageError;
use crate::model::ContextRecord;
use async_trait::async_trait;
use egress_types::prelude::OrgId;

#[async_trait]
pub trait ContextStore: Send + Sync {
    async fn insert(&self, record: ContextRecord) -> Result<(), StorageError>;

    async fn get(&self, org: &OrgId, id: &str) -> Result<Option<ContextRecord>, StorageError>;

    /// Most recently created context for a subject, if any.
    async fn latest_for_subject(
        &self,
        org: &OrgId,
        subject_id: &str,
    ) -> Result<Option<ContextRecord>, StorageError>;
}
