use std::collections::HashMap;

use async_trait::async_trait;
use egress_types::prelude::{OrgId, OrgKey};
use parking_lot::RwLock;

use crate::errors::StorageError;
use crate::model::{ConsentRecord, ContextRecord, Organization};
use crate::spi::{ConsentStore, ContextStore, OrgDirectory};

#[derive(Default)]
pub struct MemoryDirectory {
    orgs: RwLock<HashMap<String, Organization>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(orgs: impl IntoIterator<Item = Organization>) -> Self {
        let map = orgs
            .into_iter()
            .map(|org| (org.org_key.0.clone(), org))
            .collect();
        Self {
            orgs: RwLock::new(map),
        }
    }

    pub fn upsert(&self, org: Organization) {
        self.orgs.write().insert(org.org_key.0.clone(), org);
    }
}

#[async_trait]
impl OrgDirectory for MemoryDirectory {
    async fn org_by_key(&self, key: &OrgKey) -> Result<Option<Organization>, StorageError> {
        Ok(self.orgs.read().get(key.as_str()).cloned())
    }
}

#[derive(Default)]
pub struct MemoryConsentStore {
    records: RwLock<HashMap<(String, String), ConsentRecord>>,
}

impl MemoryConsentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(org: &OrgId, id: &str) -> (String, String) {
        (org.0.clone(), id.to_string())
    }
}

#[async_trait]
impl ConsentStore for MemoryConsentStore {
    async fn insert(&self, record: ConsentRecord) -> Result<(), StorageError> {
        let mut guard = self.records.write();
        let key = Self::key(&record.org_id, &record.id);
        if guard.contains_key(&key) {
            return Err(StorageError::conflict("consent already exists"));
        }
        guard.insert(key, record);
        Ok(())
    }

    async fn revoke(&self, org: &OrgId, id: &str, at: i64) -> Result<(), StorageError> {
        let mut guard = self.records.write();
        if let Some(record) = guard.get_mut(&Self::key(org, id)) {
            if record.revoked_at.is_none() {
                record.revoked_at = Some(at);
            }
        }
        Ok(())
    }

    async fn get(&self, org: &OrgId, id: &str) -> Result<Option<ConsentRecord>, StorageError> {
        Ok(self.records.read().get(&Self::key(org, id)).cloned())
    }
}

#[derive(Default)]
pub struct MemoryContextStore {
    records: RwLock<HashMap<(String, String), ContextRecord>>,
}

impl MemoryContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(org: &OrgId, id: &str) -> (String, String) {
        (org.0.clone(), id.to_string())
    }
}

#[async_trait]
impl ContextStore for MemoryContextStore {
    async fn insert(&self, record: ContextRecord) -> Result<(), StorageError> {
        let mut guard = self.records.write();
        let key = Self::key(&record.org_id, &record.id);
        if guard.contains_key(&key) {
            return Err(StorageError::conflict("context already exists"));
        }
        guard.insert(key, record);
        Ok(())
    }

    async fn get(&self, org: &OrgId, id: &str) -> Result<Option<ContextRecord>, StorageError> {
        Ok(self.records.read().get(&Self::key(org, id)).cloned())
    }

    async fn latest_for_subject(
        &self,
        org: &OrgId,
        subject_id: &str,
    ) -> Result<Option<ContextRecord>, StorageError> {
        let guard = self.records.read();
        let latest = guard
            .values()
            .filter(|record| record.org_id == *org && record.subject_id == subject_id)
            .max_by_key(|record| record.created_at)
            .cloned();
        Ok(latest)
    }
}
