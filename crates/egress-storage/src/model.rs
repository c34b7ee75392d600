use egress_types::prelude::{OrgId, OrgKey};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tenant row in the org directory. `org_key` is the opaque credential a
/// caller presents; `id` is the stable internal identifier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrgId,
    pub org_key: OrgKey,
    pub name: String,
}

/// A consent grant. `revoked_at` is set exactly once; later revocations
/// leave the original timestamp in place.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConsentRecord {
    pub id: String,
    pub org_id: OrgId,
    pub subject_id: String,
    pub purpose: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default = "default_version")]
    pub version: u32,
    pub granted_at: i64,
    #[serde(default)]
    pub revoked_at: Option<i64>,
    #[serde(default)]
    pub meta: Value,
}

fn default_version() -> u32 {
    1
}

impl ConsentRecord {
    pub fn is_active(&self) -> bool {
        self.revoked_at.is_none()
    }
}

/// Conversational context captured for later rehydration into prompts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContextRecord {
    pub id: String,
    pub org_id: OrgId,
    pub subject_id: String,
    pub label: String,
    pub json: Value,
    pub created_at: i64,
}
