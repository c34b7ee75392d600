use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ephemeral correlation id joining a chat invocation to its audit artifacts.
///
/// Minted locally as `sess-<uuid>`; the gateway's own session id, when it
/// returns one, is authoritative and replaces the local id.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn mint() -> Self {
        SessionId(format!("sess-{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
