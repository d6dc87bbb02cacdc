// Source trait for upstream telemetry subscriptions
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tokio::sync::mpsc;

/// How the upstream delivers records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestMode {
    /// One new child record per event
    #[default]
    Incremental,
    /// The whole dataset on every change
    Snapshot,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceEvent {
    Record { key: String, raw: Value },
    /// Full dataset keyed by record id; BTreeMap keeps keys in lexicographic order
    Snapshot(BTreeMap<String, Value>),
    /// A new subscription session started; buffered data belongs to the previous one
    Reset,
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to connect to telemetry source: {0}")]
    Connect(#[from] reqwest::Error),
    #[error("telemetry source returned status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("failed to read telemetry export {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed telemetry payload: {0}")]
    Decode(#[from] serde_json::Error),
}

#[async_trait]
pub trait TelemetrySource: Send + Sync {
    /// Open a push subscription. Events arrive in delivery order; dropping
    /// the receiver tears the upstream connection down.
    async fn open(&self) -> Result<mpsc::Receiver<SourceEvent>, SourceError>;
}
