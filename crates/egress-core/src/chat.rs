use std::sync::Arc;
use std::time::{Duration, Instant};

use egress_errors::prelude::ProxyError;
use egress_types::prelude::{ChatMessage, OrgKey, SessionId, TelemetryEvent};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::{OrgAuthenticator, OrgKeySources};
use crate::consent::ConsentIssuer;
use crate::context::ContextRehydrator;
use crate::gateway::{GatewayInvocation, GatewayProxy, GatewayReply};
use crate::purpose::PurposeResolver;
use crate::telemetry::TelemetryEmitter;

pub const DEFAULT_SUBJECT: &str = "web-demo-user";
pub const DEFAULT_BUDGET: Duration = Duration::from_secs(20);

#[derive(Clone, Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(rename = "policyKey", alias = "policy_key")]
    pub policy_key: String,
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub subject_id: Option<String>,
    #[serde(default)]
    pub context_id: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ChatReply {
    pub content: String,
    pub meta: ChatMeta,
}

#[derive(Clone, Debug, Serialize)]
pub struct ChatMeta {
    pub session: String,
    pub purpose: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stub: Option<bool>,
    pub elapsed_ms: u64,
}

/// Consent and chat live behind the same upstream base URL; they are
/// configured (or absent, for stub mode) together.
pub struct GatewayUpstream {
    pub consents: ConsentIssuer,
    pub proxy: GatewayProxy,
}

/// The write path: authenticate, resolve purpose, open a telemetry span,
/// rehydrate context, issue consent, invoke the gateway, close the span.
/// The whole invocation runs under one wall-clock budget; consents issued
/// before a timeout are not rolled back.
pub struct ChatService {
    authenticator: Arc<OrgAuthenticator>,
    purposes: PurposeResolver,
    rehydrator: ContextRehydrator,
    upstream: Option<GatewayUpstream>,
    telemetry: TelemetryEmitter,
    budget: Duration,
}

impl ChatService {
    pub fn new(
        authenticator: Arc<OrgAuthenticator>,
        purposes: PurposeResolver,
        rehydrator: ContextRehydrator,
        upstream: Option<GatewayUpstream>,
        telemetry: TelemetryEmitter,
        budget: Duration,
    ) -> Self {
        Self {
            authenticator,
            purposes,
            rehydrator,
            upstream,
            telemetry,
            budget,
        }
    }

    pub async fn handle(
        &self,
        sources: &OrgKeySources,
        req: ChatRequest,
    ) -> Result<ChatReply, ProxyError> {
        let started = Instant::now();

        // Auth failures short-circuit before any telemetry is opened.
        let (org_key, _org) = self.authenticator.authenticate(sources).await?;

        let purpose = self.purposes.resolve(Some(&req.policy_key)).to_string();
        let session = SessionId::mint();

        self.telemetry.emit(TelemetryEvent::begin(
            &session,
            json!({
                "policy_key": req.policy_key,
                "purpose": purpose,
                "org_key": org_key.as_str(),
            }),
        ));

        let outcome = tokio::time::timeout(
            self.budget,
            self.invoke(&org_key, &session, &purpose, &req),
        )
        .await;

        match outcome {
            Ok(Ok(mut reply)) => {
                // The end record joins the audit artifacts, so it is filed
                // under the final session id, gateway override included.
                let final_session = SessionId(reply.meta.session.clone());
                self.telemetry.emit(TelemetryEvent::end(
                    &final_session,
                    true,
                    Some(json!({
                        "chars": reply.content.chars().count(),
                        "consent_id": reply.meta.consent_id,
                        "purpose": purpose,
                    })),
                ));
                reply.meta.elapsed_ms = started.elapsed().as_millis() as u64;
                Ok(reply)
            }
            Ok(Err(err)) => {
                self.telemetry.emit(TelemetryEvent::end(&session, false, None));
                Err(err)
            }
            Err(_) => {
                self.telemetry.emit(TelemetryEvent::end(&session, false, None));
                Err(ProxyError::timeout(&format!(
                    "invocation exceeded {:?}",
                    self.budget
                )))
            }
        }
    }

    async fn invoke(
        &self,
        org_key: &OrgKey,
        session: &SessionId,
        purpose: &str,
        req: &ChatRequest,
    ) -> Result<ChatReply, ProxyError> {
        let mut messages = Vec::with_capacity(req.messages.len() + 1);
        if let Some(context) = self
            .rehydrator
            .rehydrate(req.context_id.as_deref(), org_key)
            .await
        {
            messages.push(context);
        }
        messages.extend(req.messages.iter().cloned());

        let upstream = match &self.upstream {
            Some(upstream) => upstream,
            None => {
                return Ok(ChatReply {
                    content: format!("Stubbed response for purpose {purpose}."),
                    meta: ChatMeta {
                        session: session.as_str().to_string(),
                        purpose: purpose.to_string(),
                        consent_id: None,
                        stub: Some(true),
                        elapsed_ms: 0,
                    },
                });
            }
        };

        let subject_id = req.subject_id.as_deref().unwrap_or(DEFAULT_SUBJECT);
        let consent_id = upstream
            .consents
            .issue(subject_id, purpose, org_key, session, &self.telemetry)
            .await?;

        let GatewayReply {
            content,
            session_id,
        } = upstream
            .proxy
            .invoke(
                GatewayInvocation {
                    consent_id: &consent_id,
                    purpose,
                    org_key,
                    messages: &messages,
                    session,
                },
                &self.telemetry,
            )
            .await?;

        Ok(ChatReply {
            content,
            meta: ChatMeta {
                session: session_id.unwrap_or_else(|| session.as_str().to_string()),
                purpose: purpose.to_string(),
                consent_id: Some(consent_id),
                stub: None,
                elapsed_ms: 0,
            },
        })
    }
}
