use crate::errors::StorageError;
use crate::model::Organization;
use async_trait::async_trait;
use egress_types::prelude::OrgKey;

#[async_trait]
pub trait OrgDirectory: Send + Sync {
    async fn org_by_key(&self, key: &OrgKey) -> Result<Option<Organization>, StorageError>;
}
