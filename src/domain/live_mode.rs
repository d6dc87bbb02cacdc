// Live mode controller - live / paused / auto-paused transitions
use super::view_window::{ViewWindow, ZoomRange};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LiveMode {
    #[default]
    Live,
    Paused,
    /// Entered by a zoom selection; buffers exactly like `Paused`
    AutoPaused,
}

/// Ingestion is never stopped by this controller. Pausing only freezes the
/// view: a manual pause pins the trailing window that was on screen, a zoom
/// selection replaces it with the selected range.
#[derive(Debug, Clone, Default)]
pub struct LiveModeController {
    mode: LiveMode,
    zoom: Option<ZoomRange>,
    pinned: Option<ZoomRange>,
}

impl LiveModeController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> LiveMode {
        self.mode
    }

    pub fn is_live(&self) -> bool {
        self.mode == LiveMode::Live
    }

    /// The user-selected range, if any
    pub fn zoom_range(&self) -> Option<ZoomRange> {
        self.zoom
    }

    /// Range the view is frozen on: the zoom selection, else the pause pin
    pub fn effective_range(&self) -> Option<ZoomRange> {
        self.zoom.or(self.pinned)
    }

    /// `on_screen` is the range of the trailing window at the moment of the
    /// call; it is pinned when pausing from `Live`.
    pub fn toggle_pause(&mut self, on_screen: Option<ZoomRange>) -> LiveMode {
        match self.mode {
            LiveMode::Live => {
                self.mode = LiveMode::Paused;
                self.pinned = on_screen;
            }
            LiveMode::Paused | LiveMode::AutoPaused => self.resume(),
        }
        tracing::debug!(mode = ?self.mode, "pause toggled");
        self.mode
    }

    pub fn select_zoom(&mut self, range: ZoomRange) -> LiveMode {
        self.zoom = Some(range);
        self.mode = LiveMode::AutoPaused;
        tracing::debug!(start = range.start, end = range.end, "zoom selected, auto-paused");
        self.mode
    }

    pub fn view_window(&self, live_window_size: usize) -> ViewWindow {
        ViewWindow::derive(self.mode, self.effective_range(), live_window_size)
    }

    fn resume(&mut self) {
        self.mode = LiveMode::Live;
        self.zoom = None;
        self.pinned = None;
    }
}
