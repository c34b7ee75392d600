use serde::{Deserialize, Serialize};

/// Live usage/cost/latency snapshot for a session. Externally owned; the
/// proxy forwards upstream bodies verbatim, these models exist for consumers.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UsageOverlay {
    #[serde(default)]
    pub tokens_in: u64,
    #[serde(default)]
    pub tokens_out: u64,
    #[serde(default)]
    pub cost_usd: f64,
    #[serde(default)]
    pub latency_ms: u64,
    #[serde(default)]
    pub model_fingerprint: ModelFingerprint,
    #[serde(default)]
    pub policy_hash: String,
    #[serde(default)]
    pub consent_level: String,
    #[serde(default)]
    pub redactions: u64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ModelFingerprint {
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub model: String,
}

/// Sanitized, org-scoped audit record of a completed invocation.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AuditReceipt {
    #[serde(default)]
    pub meta: ReceiptMeta,
    #[serde(default)]
    pub prefilter: Prefilter,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ReceiptMeta {
    #[serde(default)]
    pub purpose: String,
    #[serde(default)]
    pub consent_id: String,
    #[serde(default)]
    pub org_key: String,
    #[serde(default)]
    pub policy_hash: String,
    #[serde(default)]
    pub consent_level: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Prefilter {
    #[serde(default)]
    pub sanitized: Sanitized,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Sanitized {
    #[serde(default)]
    pub messages: Vec<crate::message::ChatMessage>,
}

/// Redacted outbound fragments; only placeholder-bearing text is ever safe
/// to surface here.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FragmentList {
    #[serde(default)]
    pub fragments: Vec<String>,
}
