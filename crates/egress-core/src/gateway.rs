use egress_errors::prelude::ProxyError;
use egress_types::prelude::{ChatMessage, OrgKey, SessionId, TelemetryEvent};
use reqwest::Client;
use serde_json::{json, Value};
use url::Url;

use crate::consent::excerpt;
use crate::telemetry::TelemetryEmitter;

/// Model routed through the upstream gateway.
#[derive(Clone, Debug)]
pub struct ModelSpec {
    pub provider: String,
    pub model: String,
}

impl Default for ModelSpec {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4.1-mini".to_string(),
        }
    }
}

pub struct GatewayInvocation<'a> {
    pub consent_id: &'a str,
    pub purpose: &'a str,
    pub org_key: &'a OrgKey,
    pub messages: &'a [ChatMessage],
    pub session: &'a SessionId,
}

#[derive(Debug)]
pub struct GatewayReply {
    pub content: String,
    /// Gateway-assigned session, authoritative over the local one.
    pub session_id: Option<String>,
}

/// Forwards consent-backed chat invocations to the upstream model gateway.
/// Provider credentials are attached server-side only; nothing a caller
/// sends can reach the `X-Provider-Auth` header.
#[derive(Clone)]
pub struct GatewayProxy {
    client: Client,
    chat_url: Url,
    provider_api_key: Option<String>,
    model: ModelSpec,
}

impl GatewayProxy {
    pub fn new(
        client: Client,
        gateway_base: &Url,
        provider_api_key: Option<String>,
        model: ModelSpec,
    ) -> Result<Self, ProxyError> {
        let chat_url = gateway_base
            .join("v1/llm/chat")
            .map_err(|err| ProxyError::internal(&format!("chat url join failed: {err}")))?;
        Ok(Self {
            client,
            chat_url,
            provider_api_key,
            model,
        })
    }

    pub async fn invoke(
        &self,
        req: GatewayInvocation<'_>,
        telemetry: &TelemetryEmitter,
    ) -> Result<GatewayReply, ProxyError> {
        let body = json!({
            "consent_id": req.consent_id,
            "purpose": req.purpose,
            "messages": req.messages,
            "model": {"provider": self.model.provider, "model": self.model.model},
            "session_id": req.session.as_str(),
        });

        let mut request = self
            .client
            .post(self.chat_url.clone())
            .header("X-Org-Key", req.org_key.as_str())
            .json(&body);
        if let Some(api_key) = &self.provider_api_key {
            let auth = json!({"openai": {"api_key": api_key}});
            request = request.header("X-Provider-Auth", auth.to_string());
        }

        let response = match request.send().await {
            Ok(resp) => resp,
            Err(err) => {
                telemetry.emit(TelemetryEvent::event(
                    req.session,
                    "gateway.error",
                    json!({"status": 0, "text": excerpt(&err.to_string())}),
                ));
                return Err(ProxyError::upstream_unavailable(&format!(
                    "gateway unreachable: {err}"
                )));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            telemetry.emit(TelemetryEvent::event(
                req.session,
                "gateway.error",
                json!({"status": status.as_u16(), "text": excerpt(&text)}),
            ));
            return Err(ProxyError::gateway_failed(&format!(
                "gateway returned {status}"
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|err| ProxyError::gateway_failed(&format!("gateway body unreadable: {err}")))?;
        Ok(GatewayReply {
            content: extract_content(&payload),
            session_id: payload
                .get("session_id")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }
}

/// Both reply shapes the gateway has shipped: flat `final_output` and the
/// nested `result.message.content`. Neither present means empty content.
fn extract_content(payload: &Value) -> String {
    if let Some(text) = payload.get("final_output").and_then(Value::as_str) {
        return text.to_string();
    }
    payload
        .pointer("/result/message/content")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn proxy(server: &MockServer, provider_key: Option<&str>) -> GatewayProxy {
        let base = Url::parse(&format!("{}/", server.uri())).unwrap();
        GatewayProxy::new(
            Client::new(),
            &base,
            provider_key.map(str::to_string),
            ModelSpec::default(),
        )
        .unwrap()
    }

    fn invocation<'a>(
        messages: &'a [ChatMessage],
        session: &'a SessionId,
        org_key: &'a OrgKey,
    ) -> GatewayInvocation<'a> {
        GatewayInvocation {
            consent_id: "consent-1",
            purpose: "health.intake",
            org_key,
            messages,
            session,
        }
    }

    #[test]
    fn content_extraction_tolerates_both_shapes() {
        let flat = serde_json::json!({"final_output": "hello"});
        assert_eq!(extract_content(&flat), "hello");

        let nested = serde_json::json!({"result": {"message": {"content": "nested"}}});
        assert_eq!(extract_content(&nested), "nested");

        let neither = serde_json::json!({"something": "else"});
        assert_eq!(extract_content(&neither), "");
    }

    #[tokio::test]
    async fn invoke_sends_org_key_and_model_spec() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/llm/chat"))
            .and(header("X-Org-Key", "ORG_A"))
            .and(body_partial_json(serde_json::json!({
                "consent_id": "consent-1",
                "purpose": "health.intake",
                "model": {"provider": "openai", "model": "gpt-4.1-mini"},
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "final_output": "done",
                "session_id": "sess-upstream",
            })))
            .mount(&server)
            .await;

        let messages = vec![ChatMessage::user("hi")];
        let session = SessionId("sess-local".into());
        let org_key = OrgKey("ORG_A".into());

        let reply = proxy(&server, None)
            .invoke(
                invocation(&messages, &session, &org_key),
                &TelemetryEmitter::disabled(),
            )
            .await
            .expect("reply");
        assert_eq!(reply.content, "done");
        assert_eq!(reply.session_id.as_deref(), Some("sess-upstream"));
    }

    #[tokio::test]
    async fn provider_auth_header_only_when_configured() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/llm/chat"))
            .and(header_exists("X-Provider-Auth"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"final_output": "ok"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let messages = vec![ChatMessage::user("hi")];
        let session = SessionId("sess-local".into());
        let org_key = OrgKey("ORG_A".into());

        proxy(&server, Some("sk-test"))
            .invoke(
                invocation(&messages, &session, &org_key),
                &TelemetryEmitter::disabled(),
            )
            .await
            .expect("with credential");

        // Without a configured credential the header is absent and the
        // header_exists mock no longer matches.
        let err = proxy(&server, None)
            .invoke(
                invocation(&messages, &session, &org_key),
                &TelemetryEmitter::disabled(),
            )
            .await
            .expect_err("unmatched mock yields 404");
        assert_eq!(err.obj().wire, "gateway_failed");
    }

    #[tokio::test]
    async fn gateway_rejection_maps_to_gateway_failed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/llm/chat"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let messages = vec![ChatMessage::user("hi")];
        let session = SessionId("sess-local".into());
        let org_key = OrgKey("ORG_A".into());

        let err = proxy(&server, None)
            .invoke(
                invocation(&messages, &session, &org_key),
                &TelemetryEmitter::disabled(),
            )
            .await
            .expect_err("rejected");
        assert_eq!(err.obj().wire, "gateway_failed");
        assert_eq!(err.obj().http_status, 502);
    }
}
