// Firebase Realtime Database source over the REST streaming API
use crate::application::telemetry_source::{IngestMode, SourceError, SourceEvent, TelemetrySource};
use crate::infrastructure::config::prepare_path;
use crate::infrastructure::event_stream::{EventStreamDecoder, ServerEvent};
use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tokio::sync::mpsc;

const RECONNECT_DELAY: Duration = Duration::from_secs(2);
const EVENT_CHANNEL_SIZE: usize = 256;

#[derive(Debug, Clone)]
pub struct FirebaseSource {
    client: reqwest::Client,
    url: String,
    mode: IngestMode,
}

#[derive(Debug, Deserialize)]
struct FirebaseEvent {
    path: String,
    data: Value,
}

impl FirebaseSource {
    pub fn new(database_url: &str, path: &str, auth: Option<&str>, mode: IngestMode) -> Self {
        let mut vars = HashMap::new();
        vars.insert(
            "date".to_string(),
            chrono::Utc::now().format("%Y-%m-%d").to_string(),
        );
        let path = prepare_path(path, &vars);

        Self {
            client: reqwest::Client::new(),
            url: Self::build_stream_url(database_url, &path, auth),
            mode,
        }
    }

    fn build_stream_url(database_url: &str, path: &str, auth: Option<&str>) -> String {
        let encoded_path = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| urlencoding::encode(s).into_owned())
            .collect::<Vec<_>>()
            .join("/");

        let mut url = format!("{}/{}.json", database_url.trim_end_matches('/'), encoded_path);
        if let Some(token) = auth {
            url.push_str("?auth=");
            url.push_str(&urlencoding::encode(token));
        }
        url
    }

    async fn connect(&self) -> Result<reqwest::Response, SourceError> {
        let response = self
            .client
            .get(&self.url)
            .header("Accept", "text/event-stream")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status { status, body });
        }

        Ok(response)
    }

    /// Pump events until the subscriber goes away or Firebase cancels the
    /// listener. Dropped connections are re-established; the root put that
    /// follows re-delivers records the buffer already holds, which dedup absorbs.
    async fn run(self, first: reqwest::Response, tx: mpsc::Sender<SourceEvent>) {
        let mut response = Some(first);
        let mut tree = FirebaseTree::new(self.mode);

        loop {
            let current = match response.take() {
                Some(r) => r,
                None => {
                    tokio::select! {
                        _ = tx.closed() => return,
                        _ = tokio::time::sleep(RECONNECT_DELAY) => {}
                    }
                    match self.connect().await {
                        Ok(r) => {
                            tracing::info!("reconnected to firebase stream");
                            r
                        }
                        Err(e) => {
                            tracing::warn!("firebase reconnect failed: {}", e);
                            continue;
                        }
                    }
                }
            };

            match Self::pump(current, &mut tree, &tx).await {
                StreamEnd::SubscriberGone => {
                    tracing::debug!("firebase stream released by subscriber");
                    return;
                }
                StreamEnd::Cancelled(reason) => {
                    tracing::error!("firebase cancelled the listener: {}", reason);
                    return;
                }
                StreamEnd::Disconnected => {
                    tracing::warn!("firebase stream disconnected, retrying in {:?}", RECONNECT_DELAY);
                }
            }
        }
    }

    async fn pump(
        response: reqwest::Response,
        tree: &mut FirebaseTree,
        tx: &mpsc::Sender<SourceEvent>,
    ) -> StreamEnd {
        let mut body = std::pin::pin!(response.bytes_stream());
        let mut decoder = EventStreamDecoder::new();

        loop {
            let chunk = tokio::select! {
                _ = tx.closed() => return StreamEnd::SubscriberGone,
                chunk = body.next() => chunk,
            };

            let bytes = match chunk {
                Some(Ok(bytes)) => bytes,
                Some(Err(e)) => {
                    tracing::warn!("firebase stream read failed: {}", e);
                    return StreamEnd::Disconnected;
                }
                None => return StreamEnd::Disconnected,
            };

            for server_event in decoder.feed(&bytes) {
                let events = match tree.handle(&server_event) {
                    Ok(events) => events,
                    Err(end) => return end,
                };
                for event in events {
                    if tx.send(event).await.is_err() {
                        return StreamEnd::SubscriberGone;
                    }
                }
            }
        }
    }
}

#[async_trait]
impl TelemetrySource for FirebaseSource {
    async fn open(&self) -> Result<mpsc::Receiver<SourceEvent>, SourceError> {
        let response = self.connect().await?;
        tracing::info!(mode = ?self.mode, "subscribed to firebase stream");

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_SIZE);
        tokio::spawn(self.clone().run(response, tx));
        Ok(rx)
    }
}

#[derive(Debug, PartialEq)]
enum StreamEnd {
    SubscriberGone,
    Cancelled(String),
    Disconnected,
}

/// Local mirror of the listened-to location, fed by put/patch events
#[derive(Debug)]
struct FirebaseTree {
    mode: IngestMode,
    records: BTreeMap<String, Value>,
}

impl FirebaseTree {
    fn new(mode: IngestMode) -> Self {
        Self {
            mode,
            records: BTreeMap::new(),
        }
    }

    fn handle(&mut self, server_event: &ServerEvent) -> Result<Vec<SourceEvent>, StreamEnd> {
        let patch = match server_event.event.as_str() {
            "put" => false,
            "patch" => true,
            "keep-alive" => return Ok(Vec::new()),
            "cancel" | "auth_revoked" => {
                return Err(StreamEnd::Cancelled(format!(
                    "{}: {}",
                    server_event.event, server_event.data
                )));
            }
            other => {
                tracing::debug!("ignoring firebase event {}", other);
                return Ok(Vec::new());
            }
        };

        let payload: FirebaseEvent = match serde_json::from_str(&server_event.data) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!("malformed firebase {} payload: {}", server_event.event, e);
                return Ok(Vec::new());
            }
        };

        let segments: Vec<&str> = payload.path.split('/').filter(|s| !s.is_empty()).collect();
        let mut added = Vec::new();

        if patch {
            if let Value::Object(children) = payload.data {
                for (child, value) in children {
                    let mut path = segments.clone();
                    path.push(&child);
                    added.extend(self.put(&path, value));
                }
            }
        } else {
            added.extend(self.put(&segments, payload.data));
        }

        Ok(match self.mode {
            IngestMode::Incremental => added
                .into_iter()
                .filter_map(|key| {
                    self.records.get(&key).map(|raw| SourceEvent::Record {
                        key,
                        raw: raw.clone(),
                    })
                })
                .collect(),
            IngestMode::Snapshot => vec![SourceEvent::Snapshot(self.records.clone())],
        })
    }

    /// Write `value` at `path`, returning the keys of newly added records
    fn put(&mut self, path: &[&str], value: Value) -> Vec<String> {
        match path {
            [] => {
                // A reconnect re-sends the whole tree; only unseen keys count as added
                let previous = std::mem::take(&mut self.records);
                self.records = match value {
                    Value::Object(children) => children.into_iter().collect(),
                    _ => BTreeMap::new(),
                };
                self.records
                    .keys()
                    .filter(|key| !previous.contains_key(*key))
                    .cloned()
                    .collect()
            }
            [key] => {
                if value.is_null() {
                    self.records.remove(*key);
                    return Vec::new();
                }
                let is_new = self.records.insert(key.to_string(), value).is_none();
                if is_new { vec![key.to_string()] } else { Vec::new() }
            }
            [key, rest @ ..] => {
                let is_new = !self.records.contains_key(*key);
                if is_new && value.is_null() {
                    return Vec::new();
                }
                let record = self
                    .records
                    .entry(key.to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
                set_nested(record, rest, value);
                if is_new { vec![key.to_string()] } else { Vec::new() }
            }
        }
    }
}

fn set_nested(target: &mut Value, path: &[&str], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        *target = value;
        return;
    };

    let mut node = target;
    for segment in parents {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        node = match node {
            Value::Object(map) => map
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new())),
            _ => return,
        };
    }

    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    if let Value::Object(map) = node {
        if value.is_null() {
            map.remove(*last);
        } else {
            map.insert(last.to_string(), value);
        }
    }
}
