use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::session::SessionId;
use crate::time::epoch_seconds;

/// Control-plane ingest record. Append-only and fire-and-forget: the core
/// writes these but never reads them back.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TelemetryEvent {
    Begin {
        ts: f64,
        session: SessionId,
        meta: Value,
    },
    Event {
        ts: f64,
        session: SessionId,
        name: String,
        data: Value,
    },
    End {
        ts: f64,
        session: SessionId,
        ok: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        summary: Option<Value>,
    },
}

impl TelemetryEvent {
    pub fn begin(session: &SessionId, meta: Value) -> Self {
        TelemetryEvent::Begin {
            ts: epoch_seconds(),
            session: session.clone(),
            meta,
        }
    }

    pub fn event(session: &SessionId, name: impl Into<String>, data: Value) -> Self {
        TelemetryEvent::Event {
            ts: epoch_seconds(),
            session: session.clone(),
            name: name.into(),
            data,
        }
    }

    pub fn end(session: &SessionId, ok: bool, summary: Option<Value>) -> Self {
        TelemetryEvent::End {
            ts: epoch_seconds(),
            session: session.clone(),
            ok,
            summary,
        }
    }

}
