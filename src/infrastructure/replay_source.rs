// Replay source - plays back a JSON export of a recorded session
use crate::application::telemetry_source::{IngestMode, SourceError, SourceEvent, TelemetrySource};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;

/// Reads an export shaped like the live location (an object of key -> record)
/// and delivers it one record per interval, in key order.
#[derive(Debug, Clone)]
pub struct ReplaySource {
    file: PathBuf,
    interval: Duration,
    mode: IngestMode,
}

impl ReplaySource {
    pub fn new(file: impl Into<PathBuf>, interval: Duration, mode: IngestMode) -> Self {
        Self {
            file: file.into(),
            interval,
            mode,
        }
    }

    async fn load(&self) -> Result<BTreeMap<String, Value>, SourceError> {
        let contents = tokio::fs::read_to_string(&self.file)
            .await
            .map_err(|source| SourceError::Io {
                path: self.file.display().to_string(),
                source,
            })?;
        let export: Value = serde_json::from_str(&contents)?;

        Ok(match export {
            Value::Object(records) => records.into_iter().collect(),
            _ => BTreeMap::new(),
        })
    }
}

#[async_trait]
impl TelemetrySource for ReplaySource {
    async fn open(&self) -> Result<mpsc::Receiver<SourceEvent>, SourceError> {
        let records = self.load().await?;
        tracing::info!(
            records = records.len(),
            file = %self.file.display(),
            "replaying telemetry export"
        );

        let (tx, rx) = mpsc::channel(16);
        let interval = self.interval;
        let mode = self.mode;

        tokio::spawn(async move {
            let mut delivered = BTreeMap::new();
            for (key, raw) in records {
                let event = match mode {
                    IngestMode::Incremental => SourceEvent::Record { key, raw },
                    IngestMode::Snapshot => {
                        delivered.insert(key, raw);
                        SourceEvent::Snapshot(delivered.clone())
                    }
                };
                if tx.send(event).await.is_err() {
                    return;
                }
                tokio::select! {
                    _ = tx.closed() => return,
                    _ = tokio::time::sleep(interval) => {}
                }
            }
            tracing::info!("replay finished");
        });

        Ok(rx)
    }
}
