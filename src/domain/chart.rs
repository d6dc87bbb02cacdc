// Chart configuration derived from samples and the enabled metric set
use super::metric::{EnabledMetrics, Metric};
use super::sample::Sample;
use serde::Serialize;

/// Horizontal offset between stacked right-hand axes
const AXIS_STEP: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub position: u64,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisSide {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisLayout {
    pub id: String,
    pub title: &'static str,
    pub color: &'static str,
    pub side: AxisSide,
    /// Fraction of plot width
    pub position: f64,
    /// Axis this one draws over, `None` for the base axis
    pub overlaying: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesData {
    pub metric: Metric,
    pub label: &'static str,
    pub color: &'static str,
    pub axis: String,
    pub points: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub axes: Vec<AxisLayout>,
    pub series: Vec<SeriesData>,
}

impl ChartData {
    /// One series per enabled metric, the i-th on axis `y{i+1}`
    pub fn build(samples: &[Sample], enabled: &EnabledMetrics) -> Self {
        let mut axes = Vec::new();
        let mut series = Vec::new();

        for (i, metric) in enabled.enabled().enumerate() {
            let axis = axis_layout(i, metric);
            let points = samples
                .iter()
                .map(|s| SeriesPoint {
                    position: s.position,
                    value: s.value(metric),
                })
                .collect();

            series.push(SeriesData {
                metric,
                label: metric.label(),
                color: metric.color(),
                axis: axis.id.clone(),
                points,
            });
            axes.push(axis);
        }

        Self { axes, series }
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

fn axis_layout(i: usize, metric: Metric) -> AxisLayout {
    let (side, position, overlaying) = if i == 0 {
        (AxisSide::Left, 0.0, None)
    } else {
        (AxisSide::Right, 1.0 - (i - 1) as f64 * AXIS_STEP, Some("y"))
    };

    AxisLayout {
        id: format!("y{}", i + 1),
        title: metric.as_str(),
        color: metric.color(),
        side,
        position,
        overlaying,
    }
}
