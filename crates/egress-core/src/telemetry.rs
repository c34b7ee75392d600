use std::time::Duration;

use egress_types::prelude::TelemetryEvent;
use reqwest::Client;
use tokio::sync::mpsc;
use url::Url;

const INGEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Fire-and-forget control-plane telemetry. Events are drained by one
/// detached worker so emission order (begin before end) is preserved.
/// Delivery is intentionally lossy: failures are logged and dropped.
#[derive(Clone)]
pub struct TelemetryEmitter {
    tx: Option<mpsc::UnboundedSender<TelemetryEvent>>,
}

impl TelemetryEmitter {
    /// No control plane configured: every emit is a silent no-op.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn new(client: Client, ingest_url: Url) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<TelemetryEvent>();
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let send = client
                    .post(ingest_url.clone())
                    .timeout(INGEST_TIMEOUT)
                    .json(&event)
                    .send();
                match send.await {
                    Ok(resp) if resp.status().is_success() => {}
                    Ok(resp) => {
                        tracing::debug!(status = %resp.status(), "telemetry ingest rejected");
                    }
                    Err(err) => {
                        tracing::debug!(error = %err, "telemetry ingest unreachable");
                    }
                }
            }
        });
        Self { tx: Some(tx) }
    }

    pub fn enabled(&self) -> bool {
        self.tx.is_some()
    }

    pub fn emit(&self, event: TelemetryEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }
}
