use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Context;
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Map, Value};

use crate::studio::{JobKind, StudioChange, Ticket};

pub type EventPayload = Map<String, Value>;

const RESERVED_KEYS: [&str; 4] = ["type", "session_id", "seq", "ts"];

/// Session journal (`events.jsonl`): one compact JSON object per studio change
/// or dispatched job.
///
/// Every line carries `type`, `session_id`, a per-session `seq` starting at 0
/// and `ts`. Those keys are owned by the writer; a payload field with the
/// same name is dropped.
#[derive(Debug, Clone)]
pub struct EventWriter {
    inner: Arc<Journal>,
}

#[derive(Debug)]
struct Journal {
    path: PathBuf,
    session_id: String,
    state: Mutex<JournalState>,
}

#[derive(Debug, Default)]
struct JournalState {
    file: Option<File>,
    next_seq: u64,
}

impl EventWriter {
    pub fn new(path: impl Into<PathBuf>, session_id: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Journal {
                path: path.into(),
                session_id: session_id.into(),
                state: Mutex::new(JournalState::default()),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    pub fn session_id(&self) -> &str {
        &self.inner.session_id
    }

    pub fn record_change(&self, change: &StudioChange) -> anyhow::Result<Value> {
        self.append(change.kind(), change_payload(change))
    }

    /// Logs a job leaving for the network, with its ticket and caller detail.
    pub fn record_dispatch(
        &self,
        kind: JobKind,
        ticket: Ticket,
        detail: EventPayload,
    ) -> anyhow::Result<Value> {
        let mut payload = detail;
        payload.insert("job".to_string(), json!(kind));
        payload.insert("ticket".to_string(), json!(ticket));
        self.append("job_dispatched", payload)
    }

    fn append(&self, event_type: &str, payload: EventPayload) -> anyhow::Result<Value> {
        let mut state = self
            .inner
            .state
            .lock()
            .map_err(|_| anyhow::anyhow!("event journal lock poisoned"))?;
        if state.file.is_none() {
            state.file = Some(self.open()?);
        }

        let mut event: EventPayload = payload
            .into_iter()
            .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
            .collect();
        event.insert("type".to_string(), json!(event_type));
        event.insert("session_id".to_string(), json!(self.inner.session_id));
        event.insert("seq".to_string(), json!(state.next_seq));
        event.insert("ts".to_string(), json!(now_utc_iso()));

        let mut line = serde_json::to_string(&event)?;
        line.push('\n');
        if let Some(file) = state.file.as_mut() {
            file.write_all(line.as_bytes())
                .with_context(|| format!("failed appending to {}", self.inner.path.display()))?;
        }
        state.next_seq += 1;
        Ok(Value::Object(event))
    }

    fn open(&self) -> anyhow::Result<File> {
        if let Some(parent) = self
            .inner
            .path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.inner.path)
            .with_context(|| format!("failed to open {}", self.inner.path.display()))
    }
}

/// Flattens a studio change into event fields. Image payloads never go in.
pub fn change_payload(change: &StudioChange) -> EventPayload {
    let value = match change {
        StudioChange::ModeChanged(mode) => json!({ "mode": mode }),
        StudioChange::ImageUploaded { mime_type, bytes } => {
            json!({ "mime_type": mime_type, "bytes": bytes })
        }
        StudioChange::StyleSelected(style_id) => json!({ "style_id": style_id }),
        StudioChange::HistoryChanged { cursor, len } => json!({ "cursor": cursor, "len": len }),
        StudioChange::BusyChanged {
            generating,
            processing,
        } => json!({ "generating": generating, "processing": processing }),
        StudioChange::SessionModeChanged(mode) => json!({ "session_mode": mode }),
        StudioChange::MessageAppended(message) => json!({ "message": message }),
        StudioChange::MessageRemoved(id) => json!({ "message_id": id }),
        StudioChange::SliderMoved(position) => json!({ "position": position }),
        StudioChange::Alert(text) => json!({ "text": text }),
        StudioChange::ResponseDiscarded { kind, ticket } => {
            json!({ "job": kind, "ticket": ticket })
        }
    };
    value.as_object().cloned().unwrap_or_default()
}

fn now_utc_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}
