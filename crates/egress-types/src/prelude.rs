pub use crate::audit::{AuditReceipt, FragmentList, ModelFingerprint, UsageOverlay};
pub use crate::message::ChatMessage;
pub use crate::org::{OrgId, OrgKey};
pub use crate::session::SessionId;
pub use crate::telemetry::TelemetryEvent;
pub use crate::time::{epoch_ms, epoch_seconds};
