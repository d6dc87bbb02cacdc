// View window - which buffered samples the main chart shows
use super::live_mode::LiveMode;
use super::sample::Sample;
use serde::{Deserialize, Serialize};

pub const DEFAULT_LIVE_WINDOW: usize = 100;

/// Inclusive range of buffer positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoomRange {
    pub start: u64,
    pub end: u64,
}

impl ZoomRange {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// Normalize a raw brush selection from the overview chart.
    ///
    /// Inverted input is swapped, the start floored and the end ceiled, then
    /// the range is intersected with `bounds` (first and last buffered
    /// position). An intersection that comes out empty stays empty.
    pub fn from_selection(start: f64, end: f64, bounds: Option<(u64, u64)>) -> Self {
        let (low, high) = if start <= end { (start, end) } else { (end, start) };
        // NaN.max(0.0) is 0.0, and the casts saturate
        let mut start = low.floor().max(0.0) as u64;
        let mut end = high.ceil().max(0.0) as u64;

        if let Some((first, last)) = bounds {
            start = start.max(first);
            end = end.min(last);
        }

        Self { start, end }
    }

    pub fn contains(&self, position: u64) -> bool {
        self.start <= position && position <= self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViewWindow {
    /// The trailing `size` samples
    Live { size: usize },
    Zoomed(ZoomRange),
}

impl ViewWindow {
    pub fn derive(mode: LiveMode, zoom: Option<ZoomRange>, live_window_size: usize) -> Self {
        match (mode, zoom) {
            (LiveMode::Live, _) | (_, None) => ViewWindow::Live {
                size: live_window_size,
            },
            (_, Some(range)) => ViewWindow::Zoomed(range),
        }
    }

    pub fn apply<'a, I>(&self, samples: I) -> Vec<Sample>
    where
        I: IntoIterator<Item = &'a Sample>,
        I::IntoIter: DoubleEndedIterator,
    {
        match *self {
            ViewWindow::Live { size } => {
                let mut tail: Vec<Sample> =
                    samples.into_iter().rev().take(size).cloned().collect();
                tail.reverse();
                tail
            }
            ViewWindow::Zoomed(range) => samples
                .into_iter()
                .filter(|s| range.contains(s.position))
                .cloned()
                .collect(),
        }
    }
}

pub fn compute_window(
    samples: &[Sample],
    mode: LiveMode,
    zoom: Option<ZoomRange>,
    live_window_size: usize,
) -> Vec<Sample> {
    ViewWindow::derive(mode, zoom, live_window_size).apply(samples)
}

/// Positions spanned by a sample sequence; the overview strip always covers
/// the whole buffer.
pub fn overview_range(samples: &[Sample]) -> Option<ZoomRange> {
    match (samples.first(), samples.last()) {
        (Some(first), Some(last)) => Some(ZoomRange::new(first.position, last.position)),
        _ => None,
    }
}
