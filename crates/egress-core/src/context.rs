use egress_types::prelude::{ChatMessage, OrgKey};
use reqwest::Client;
use url::Url;

/// Fetches a stored context and folds it into the prompt as one leading
/// system message. Rehydration is best-effort: any failure degrades to no
/// context rather than failing the invocation.
#[derive(Clone)]
pub struct ContextRehydrator {
    client: Client,
    base_url: Option<Url>,
}

impl ContextRehydrator {
    pub fn new(client: Client, base_url: Option<Url>) -> Self {
        Self { client, base_url }
    }

    pub fn disabled(client: Client) -> Self {
        Self {
            client,
            base_url: None,
        }
    }

    pub async fn rehydrate(
        &self,
        context_id: Option<&str>,
        org_key: &OrgKey,
    ) -> Option<ChatMessage> {
        let context_id = context_id?;
        let base = self.base_url.as_ref()?;

        let url = match base.join(&format!("api/contexts/{context_id}")) {
            Ok(url) => url,
            Err(err) => {
                tracing::debug!(error = %err, context_id, "context url join failed");
                return None;
            }
        };

        let response = match self
            .client
            .get(url)
            .header("X-Org-Key", org_key.as_str())
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(err) => {
                tracing::debug!(error = %err, context_id, "context fetch failed");
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::debug!(status = %response.status(), context_id, "context fetch rejected");
            return None;
        }

        match response.json::<serde_json::Value>().await {
            Ok(json) => Some(ChatMessage::system(format!("Context: {json}"))),
            Err(err) => {
                tracing::debug!(error = %err, context_id, "context body unreadable");
                None
            }
        }
    }
}
