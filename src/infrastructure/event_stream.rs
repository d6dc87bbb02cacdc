// Server-sent events decoding for streaming REST endpoints
use bytes::{Buf, BytesMut};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEvent {
    pub event: String,
    pub data: String,
}

/// Incremental decoder: feed raw body chunks, get complete events back.
/// Chunks may split lines and events anywhere.
#[derive(Debug, Default)]
pub struct EventStreamDecoder {
    pending: BytesMut,
    event: Option<String>,
    data: Vec<String>,
}

impl EventStreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Vec<ServerEvent> {
        self.pending.extend_from_slice(chunk);
        let mut events = Vec::new();

        while let Some(newline) = self.pending.iter().position(|b| *b == b'\n') {
            let line = self.pending.split_to(newline);
            self.pending.advance(1);

            let line = String::from_utf8_lossy(&line);
            let line = line.strip_suffix('\r').unwrap_or(line.as_ref());
            if let Some(event) = self.process_line(line) {
                events.push(event);
            }
        }

        events
    }

    fn process_line(&mut self, line: &str) -> Option<ServerEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            // id and retry carry nothing this client uses
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<ServerEvent> {
        let event = self.event.take();
        if self.data.is_empty() && event.is_none() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(ServerEvent {
            event: event.unwrap_or_else(|| "message".to_string()),
            data,
        })
    }
}
