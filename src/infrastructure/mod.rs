// Infrastructure layer - External dependencies and adapters
pub mod chunked_json;
pub mod config;
pub mod event_stream;
pub mod firebase_source;
pub mod http_response;
pub mod replay_source;
