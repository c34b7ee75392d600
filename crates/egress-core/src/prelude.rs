pub use crate::audit::{AuditQueryProxy, Passthrough};
pub use crate::auth::{BypassConfig, OrgAuthenticator, OrgKeySources, DEMO_ORG_KEY};
pub use crate::chat::{
    ChatMeta, ChatReply, ChatRequest, ChatService, GatewayUpstream, DEFAULT_BUDGET,
    DEFAULT_SUBJECT,
};
pub use crate::consent::ConsentIssuer;
pub use crate::context::ContextRehydrator;
pub use crate::gateway::{GatewayInvocation, GatewayProxy, GatewayReply, ModelSpec};
pub use crate::purpose::{PurposeResolver, DEFAULT_PURPOSE};
pub use crate::telemetry::TelemetryEmitter;
