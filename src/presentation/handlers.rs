// HTTP request handlers
use crate::application::dashboard_session::UserAction;
use crate::infrastructure::chunked_json::stream_from_watch;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Json, State},
    http::HeaderMap,
    response::IntoResponse,
};
use std::sync::Arc;

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Current frame: window, overview, stats and chart layout
pub async fn current_frame(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let frame = state.session.frame();

    match json_response(frame.as_ref(), accepts_brotli(&headers)).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// Stream frames as they are published (progressive rendering)
pub async fn stream_frames(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let rx = state.session.frames();
    stream_from_watch(rx, accepts_brotli(&headers)).await
}

/// Apply a metric toggle, pause toggle, zoom or stat metric selection
pub async fn apply_action(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(action): Json<UserAction>,
) -> impl IntoResponse {
    tracing::debug!(?action, "user action");
    let frame = state.session.apply(action);

    match json_response(frame.as_ref(), accepts_brotli(&headers)).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dashboard_session::{DashboardSession, SessionSettings};
    use crate::application::telemetry_source::SourceEvent;
    use crate::domain::live_mode::LiveMode;
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    fn app_state() -> Arc<AppState> {
        let session = Arc::new(DashboardSession::new(SessionSettings::default()));
        for i in 0..5 {
            session.ingest(SourceEvent::Record {
                key: format!("k{i}"),
                raw: json!({ "rpm": i * 100 }),
            });
        }
        Arc::new(AppState { session })
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_current_frame() {
        let response = current_frame(HeaderMap::new(), State(app_state()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let frame = body_json(response).await;
        assert_eq!(frame["mode"], "live");
        assert_eq!(frame["window"].as_array().unwrap().len(), 5);
        assert_eq!(frame["stats"]["max"], 400.0);
        assert_eq!(frame["stats"]["mean"], "200.00");
    }

    #[tokio::test]
    async fn test_apply_zoom_action() {
        let state = app_state();
        let action = UserAction::SelectZoom { start: 1.0, end: 2.0 };
        let response = apply_action(HeaderMap::new(), State(state.clone()), Json(action))
            .await
            .into_response();

        let frame = body_json(response).await;
        assert_eq!(frame["mode"], "auto_paused");
        assert_eq!(frame["window"].as_array().unwrap().len(), 2);
        assert_eq!(frame["overview"].as_array().unwrap().len(), 5);
        assert_eq!(state.session.mode(), LiveMode::AutoPaused);
    }
}
