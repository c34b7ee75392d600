use serde::{Deserialize, Serialize};

/// Tenant identifier supplied per request; the unit of authorization scoping.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrgKey(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrgId(pub String);

impl OrgKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
