use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use egress_types::prelude::{OrgId, OrgKey};
use tokio::sync::Semaphore;

use crate::errors::StorageError;
use crate::model::{ConsentRecord, ContextRecord, Organization};
use crate::spi::{ConsentStore, ContextStore, OrgDirectory};

/// The backing stores bundled behind one handle.
pub struct Stores {
    pub directory: Arc<dyn OrgDirectory>,
    pub consents: Arc<dyn ConsentStore>,
    pub contexts: Arc<dyn ContextStore>,
}

/// Bounds concurrent store access with a semaphore. Waiting longer than the
/// acquire timeout surfaces as storage unavailability rather than queueing
/// without bound.
#[derive(Clone)]
pub struct StorePool {
    stores: Arc<Stores>,
    permits: Arc<Semaphore>,
    acquire_timeout: Duration,
}

impl StorePool {
    pub fn new(stores: Stores, max_connections: usize, acquire_timeout: Duration) -> Self {
        Self {
            stores: Arc::new(stores),
            permits: Arc::new(Semaphore::new(max_connections.max(1))),
            acquire_timeout,
        }
    }

    async fn acquire(&self) -> Result<tokio::sync::OwnedSemaphorePermit, StorageError> {
        tokio::time::timeout(self.acquire_timeout, self.permits.clone().acquire_owned())
            .await
            .map_err(|_| StorageError::unavailable("store pool acquire timed out"))?
            .map_err(|_| StorageError::unavailable("store pool closed"))
    }
}

#[async_trait]
impl OrgDirectory for StorePool {
    async fn org_by_key(&self, key: &OrgKey) -> Result<Option<Organization>, StorageError> {
        let _permit = self.acquire().await?;
        self.stores.directory.org_by_key(key).await
    }
}

#[async_trait]
impl ConsentStore for StorePool {
    async fn insert(&self, record: ConsentRecord) -> Result<(), StorageError> {
        let _permit = self.acquire().await?;
        self.stores.consents.insert(record).await
    }

    async fn revoke(&self, org: &OrgId, id: &str, at: i64) -> Result<(), StorageError> {
        let _permit = self.acquire().await?;
        self.stores.consents.revoke(org, id, at).await
    }

    async fn get(&self, org: &OrgId, id: &str) -> Result<Option<ConsentRecord>, StorageError> {
        let _permit = self.acquire().await?;
        self.stores.consents.get(org, id).await
    }
}

#[async_trait]
impl ContextStore for StorePool {
    async fn insert(&self, record: ContextRecord) -> Result<(), StorageError> {
        let _permit = self.acquire().await?;
        self.stores.contexts.insert(record).await
    }

    async fn get(&self, org: &OrgId, id: &str) -> Result<Option<ContextRecord>, StorageError> {
        let _permit = self.acquire().await?;
        self.stores.contexts.get(org, id).await
    }

    async fn latest_for_subject(
        &self,
        org: &OrgId,
        subject_id: &str,
    ) -> Result<Option<ContextRecord>, StorageError> {
        let _permit = self.acquire().await?;
        self.stores.contexts.latest_for_subject(org, subject_id).await
    }
}
