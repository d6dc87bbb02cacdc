// Dashboard session - ingests upstream events, applies user actions and publishes frames
use crate::application::subscription::Subscription;
use crate::application::telemetry_source::{SourceError, SourceEvent, TelemetrySource};
use crate::domain::buffer::{DEFAULT_CAPACITY, TelemetryBuffer};
use crate::domain::chart::ChartData;
use crate::domain::live_mode::{LiveMode, LiveModeController};
use crate::domain::metric::{EnabledMetrics, FieldNameMap, Metric};
use crate::domain::normalizer::normalize;
use crate::domain::sample::{Reading, Sample};
use crate::domain::stats::{StatsDisplay, compute_stats};
use crate::domain::view_window::{
    DEFAULT_LIVE_WINDOW, ViewWindow, ZoomRange, compute_window, overview_range,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub capacity: usize,
    pub live_window: usize,
    pub field_names: FieldNameMap,
    pub enabled_metrics: EnabledMetrics,
    pub stat_metric: Metric,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            live_window: DEFAULT_LIVE_WINDOW,
            field_names: FieldNameMap::default(),
            enabled_metrics: EnabledMetrics::default(),
            stat_metric: Metric::Rpm,
        }
    }
}

/// Interactions reported back by the renderer
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum UserAction {
    ToggleMetric { metric: Metric },
    TogglePause,
    /// Raw brush selection from the overview chart
    SelectZoom { start: f64, end: f64 },
    SelectStatMetric { metric: Metric },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    Appended(u64),
    Duplicate,
    Replaced(usize),
    Reset,
}

/// Everything the renderer needs for one render cycle
#[derive(Debug, Clone, Serialize)]
pub struct RenderFrame {
    pub mode: LiveMode,
    pub view: ViewWindow,
    pub zoom: Option<ZoomRange>,
    pub window: Vec<Sample>,
    pub overview: Vec<Sample>,
    pub overview_range: Option<ZoomRange>,
    pub enabled_metrics: EnabledMetrics,
    pub stat_metric: Metric,
    pub stats: StatsDisplay,
    pub main_chart: ChartData,
    pub overview_chart: ChartData,
    pub buffered: usize,
    pub capacity: usize,
}

struct SessionState {
    buffer: TelemetryBuffer,
    controller: LiveModeController,
    enabled_metrics: EnabledMetrics,
    stat_metric: Metric,
}

pub struct DashboardSession {
    field_names: FieldNameMap,
    live_window: usize,
    state: Mutex<SessionState>,
    frames: watch::Sender<Arc<RenderFrame>>,
}

impl DashboardSession {
    pub fn new(settings: SessionSettings) -> Self {
        let state = SessionState {
            buffer: TelemetryBuffer::new(settings.capacity),
            controller: LiveModeController::new(),
            enabled_metrics: settings.enabled_metrics,
            stat_metric: settings.stat_metric,
        };
        let frame = build_frame(&state, settings.live_window);
        let (frames, _) = watch::channel(Arc::new(frame));

        Self {
            field_names: settings.field_names,
            live_window: settings.live_window,
            state: Mutex::new(state),
            frames,
        }
    }

    /// Open `source` and start ingesting into this session.
    /// The buffer starts empty for every new subscription.
    pub async fn subscribe(
        self: &Arc<Self>,
        source: &dyn TelemetrySource,
    ) -> Result<Subscription, SourceError> {
        let rx = source.open().await?;
        self.ingest(SourceEvent::Reset);
        tracing::info!("telemetry subscription opened");
        Ok(Subscription::spawn(self.clone(), rx))
    }

    pub fn ingest(&self, event: SourceEvent) -> IngestOutcome {
        let mut state = self.lock();
        let outcome = self.apply_event(&mut state, event);
        self.publish(&state);
        outcome
    }

    /// Ingest unless `closed` is set; checked under the state lock
    pub(crate) fn ingest_unless(&self, event: SourceEvent, closed: &AtomicBool) -> Option<IngestOutcome> {
        let mut state = self.lock();
        if closed.load(Ordering::SeqCst) {
            return None;
        }
        let outcome = self.apply_event(&mut state, event);
        self.publish(&state);
        Some(outcome)
    }

    pub(crate) fn while_locked(&self, f: impl FnOnce()) {
        let _state = self.lock();
        f();
    }

    pub fn apply(&self, action: UserAction) -> Arc<RenderFrame> {
        let mut state = self.lock();
        match action {
            UserAction::ToggleMetric { metric } => {
                let enabled = state.enabled_metrics.toggle(metric);
                tracing::debug!(%metric, enabled, "metric toggled");
            }
            UserAction::TogglePause => {
                let on_screen = if state.controller.is_live() {
                    let tail = ViewWindow::Live {
                        size: self.live_window,
                    }
                    .apply(state.buffer.iter());
                    overview_range(&tail)
                } else {
                    None
                };
                let mode = state.controller.toggle_pause(on_screen);
                tracing::info!(?mode, "pause toggled");
            }
            UserAction::SelectZoom { start, end } => {
                let range = ZoomRange::from_selection(start, end, state.buffer.position_bounds());
                state.controller.select_zoom(range);
                tracing::info!(start = range.start, end = range.end, "zoom range selected");
            }
            UserAction::SelectStatMetric { metric } => {
                state.stat_metric = metric;
            }
        }
        self.publish(&state)
    }

    /// Latest published frame
    pub fn frame(&self) -> Arc<RenderFrame> {
        self.frames.borrow().clone()
    }

    pub fn frames(&self) -> watch::Receiver<Arc<RenderFrame>> {
        self.frames.subscribe()
    }

    pub fn mode(&self) -> LiveMode {
        self.lock().controller.mode()
    }

    pub fn buffered(&self) -> Vec<Sample> {
        self.lock().buffer.snapshot()
    }

    fn apply_event(&self, state: &mut SessionState, event: SourceEvent) -> IngestOutcome {
        match event {
            SourceEvent::Record { key, raw } => {
                let values = normalize(&raw, &self.field_names);
                match state.buffer.append(Reading::new(Some(key), values)) {
                    Some(position) => IngestOutcome::Appended(position),
                    None => {
                        tracing::trace!("duplicate record dropped");
                        IngestOutcome::Duplicate
                    }
                }
            }
            SourceEvent::Snapshot(records) => {
                let total = records.len();
                let readings = records
                    .into_iter()
                    .map(|(key, raw)| Reading::new(Some(key), normalize(&raw, &self.field_names)));
                state.buffer.replace_all(readings);
                tracing::debug!(total, kept = state.buffer.len(), "snapshot replaced buffer");
                IngestOutcome::Replaced(state.buffer.len())
            }
            SourceEvent::Reset => {
                // Old positions mean nothing after a reset, so drop any frozen range too
                state.buffer.clear();
                state.controller = LiveModeController::new();
                IngestOutcome::Reset
            }
        }
    }

    fn publish(&self, state: &SessionState) -> Arc<RenderFrame> {
        let frame = Arc::new(build_frame(state, self.live_window));
        self.frames.send_replace(frame.clone());
        frame
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn build_frame(state: &SessionState, live_window: usize) -> RenderFrame {
    let overview = state.buffer.snapshot();
    let controller = &state.controller;
    let window = compute_window(
        &overview,
        controller.mode(),
        controller.effective_range(),
        live_window,
    );
    let stats = compute_stats(&window, state.stat_metric).display();

    RenderFrame {
        mode: controller.mode(),
        view: controller.view_window(live_window),
        zoom: controller.zoom_range(),
        main_chart: ChartData::build(&window, &state.enabled_metrics),
        overview_chart: ChartData::build(&overview, &state.enabled_metrics),
        overview_range: overview_range(&overview),
        window,
        overview,
        enabled_metrics: state.enabled_metrics,
        stat_metric: state.stat_metric,
        stats,
        buffered: state.buffer.len(),
        capacity: state.buffer.capacity(),
    }
}
