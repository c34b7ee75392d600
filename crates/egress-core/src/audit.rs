use egress_errors::prelude::ProxyError;
use egress_types::prelude::OrgKey;
use reqwest::Client;
use url::Url;

/// Upstream response relayed verbatim: status, content type, raw body.
pub struct Passthrough {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl Passthrough {
    fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: Some("application/json".to_string()),
            body: body.as_bytes().to_vec(),
        }
    }
}

/// Read-side fan-out against the gateway's audit surfaces. The proxy never
/// reinterprets audit bodies; callers see exactly what the gateway said.
#[derive(Clone)]
pub struct AuditQueryProxy {
    client: Client,
    base: Url,
}

impl AuditQueryProxy {
    pub fn new(client: Client, gateway_base: Url) -> Self {
        Self {
            client,
            base: gateway_base,
        }
    }

    pub async fn overlay(
        &self,
        session_id: &str,
        org_key: &OrgKey,
    ) -> Result<Passthrough, ProxyError> {
        self.relay("v1/demo/overlay", session_id, org_key).await
    }

    pub async fn receipt(
        &self,
        session_id: &str,
        org_key: &OrgKey,
    ) -> Result<Passthrough, ProxyError> {
        self.relay("v1/audit/report", session_id, org_key).await
    }

    /// Fragments that were never cached read as an empty list, not an error.
    pub async fn fragments(
        &self,
        session_id: &str,
        org_key: &OrgKey,
    ) -> Result<Passthrough, ProxyError> {
        let relayed = self.relay("v1/audit/fragments", session_id, org_key).await?;
        if relayed.status == 404 {
            return Ok(Passthrough::json(200, r#"{"fragments":[]}"#));
        }
        Ok(relayed)
    }

    pub async fn recent_sessions(
        &self,
        org_key: &OrgKey,
        user_id: Option<&str>,
    ) -> Result<Passthrough, ProxyError> {
        let url = self.join("v1/demo/recent_sessions")?;
        let mut query = vec![("org_key", org_key.as_str())];
        if let Some(user_id) = user_id {
            query.push(("user_id", user_id));
        }
        let response = self
            .client
            .get(url)
            .query(&query)
            .send()
            .await
            .map_err(|err| {
                ProxyError::upstream_unavailable(&format!("recent_sessions unreachable: {err}"))
            })?;
        Self::passthrough(response).await
    }

    async fn relay(
        &self,
        path: &str,
        session_id: &str,
        org_key: &OrgKey,
    ) -> Result<Passthrough, ProxyError> {
        let url = self.join(path)?;
        let response = self
            .client
            .get(url)
            .query(&[("session_id", session_id)])
            .header("X-Org-Key", org_key.as_str())
            .send()
            .await
            .map_err(|err| {
                ProxyError::upstream_unavailable(&format!("{path} unreachable: {err}"))
            })?;
        Self::passthrough(response).await
    }

    fn join(&self, path: &str) -> Result<Url, ProxyError> {
        self.base
            .join(path)
            .map_err(|err| ProxyError::internal(&format!("{path} url join failed: {err}")))
    }

    async fn passthrough(response: reqwest::Response) -> Result<Passthrough, ProxyError> {
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|err| ProxyError::upstream_unavailable(&format!("body read failed: {err}")))?
            .to_vec();
        Ok(Passthrough {
            status,
            content_type,
            body,
        })
    }
}
