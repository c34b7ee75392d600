use egress_errors::prelude::ProxyError;
use egress_types::prelude::{OrgKey, SessionId, TelemetryEvent};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::telemetry::TelemetryEmitter;

/// Caps upstream error bodies carried into telemetry.
pub(crate) fn excerpt(text: &str) -> String {
    text.chars().take(300).collect()
}

#[derive(Deserialize)]
struct ConsentAck {
    id: String,
}

/// Issues one consent record per invocation against the upstream gateway.
#[derive(Clone)]
pub struct ConsentIssuer {
    client: Client,
    consent_url: Url,
}

impl ConsentIssuer {
    pub fn new(client: Client, gateway_base: &Url) -> Result<Self, ProxyError> {
        let consent_url = gateway_base
            .join("v1/consent")
            .map_err(|err| ProxyError::internal(&format!("consent url join failed: {err}")))?;
        Ok(Self {
            client,
            consent_url,
        })
    }

    pub async fn issue(
        &self,
        subject_id: &str,
        purpose: &str,
        org_key: &OrgKey,
        session: &SessionId,
        telemetry: &TelemetryEmitter,
    ) -> Result<String, ProxyError> {
        let body = json!({
            "subject_id": subject_id,
            "purpose": purpose,
            "metadata": {"org_key": org_key.as_str()},
        });

        let response = match self
            .client
            .post(self.consent_url.clone())
            .json(&body)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(err) => {
                telemetry.emit(TelemetryEvent::event(
                    session,
                    "consent.error",
                    json!({"status": 0, "text": excerpt(&err.to_string())}),
                ));
                return Err(ProxyError::consent_failed(&format!(
                    "consent upstream unreachable: {err}"
                )));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            telemetry.emit(TelemetryEvent::event(
                session,
                "consent.error",
                json!({"status": status.as_u16(), "text": excerpt(&text)}),
            ));
            return Err(ProxyError::consent_failed(&format!(
                "consent upstream returned {status}"
            )));
        }

        let ack: ConsentAck = response.json().await.map_err(|err| {
            ProxyError::consent_failed(&format!("consent ack unreadable: {err}"))
        })?;
        Ok(ack.id)
    }
}
