// Summary statistics over the displayed window
use super::metric::Metric;
use super::sample::Sample;
use serde::Serialize;

/// Full precision summary; `None` means the window had no value for the metric
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Stats {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
}

/// What the stats panel shows: mean fixed to two decimals
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsDisplay {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<String>,
}

impl Stats {
    pub fn display(&self) -> StatsDisplay {
        StatsDisplay {
            min: self.min,
            max: self.max,
            mean: self.mean.map(|m| format!("{:.2}", m)),
        }
    }

    pub fn has_data(&self) -> bool {
        self.mean.is_some()
    }
}

pub fn compute_stats(window: &[Sample], metric: Metric) -> Stats {
    let mut count = 0usize;
    let mut sum = 0.0;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;

    for value in window.iter().filter_map(|s| s.value(metric)) {
        count += 1;
        sum += value;
        min = min.min(value);
        max = max.max(value);
    }

    if count == 0 {
        return Stats::default();
    }

    Stats {
        min: Some(min),
        max: Some(max),
        mean: Some(sum / count as f64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sample::{MetricValues, Reading};

    fn window(values: &[Option<f64>]) -> Vec<Sample> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let mut mv = MetricValues::default();
                mv.set(Metric::CoolantTemp, *v);
                Sample::new(i as u64, Reading::new(None, mv))
            })
            .collect()
    }

    #[test]
    fn test_stats_over_simple_window() {
        let stats = compute_stats(&window(&[Some(10.0), Some(20.0), Some(30.0)]), Metric::CoolantTemp);
        let display = stats.display();
        assert_eq!(display.min, Some(10.0));
        assert_eq!(display.max, Some(30.0));
        assert_eq!(display.mean.as_deref(), Some("20.00"));
    }

    #[test]
    fn test_absent_values_are_skipped() {
        let stats = compute_stats(
            &window(&[Some(88.0), None, Some(91.0), None]),
            Metric::CoolantTemp,
        );
        assert_eq!(stats.min, Some(88.0));
        assert_eq!(stats.max, Some(91.0));
        assert_eq!(stats.display().mean.as_deref(), Some("89.50"));
    }

    #[test]
    fn test_empty_window_is_no_data() {
        let stats = compute_stats(&[], Metric::Rpm);
        assert_eq!(stats, Stats::default());
        assert!(!stats.has_data());
        assert_eq!(
            stats.display(),
            StatsDisplay {
                min: None,
                max: None,
                mean: None
            }
        );
    }

    #[test]
    fn test_metric_missing_everywhere_is_no_data() {
        let stats = compute_stats(&window(&[Some(1.0), Some(2.0)]), Metric::OilPressure);
        assert!(!stats.has_data());
    }

    #[test]
    fn test_no_data_differs_from_zero() {
        let stats = compute_stats(&window(&[Some(0.0)]), Metric::CoolantTemp);
        assert_eq!(stats.min, Some(0.0));
        assert_eq!(stats.display().mean.as_deref(), Some("0.00"));

        let json = serde_json::to_value(compute_stats(&[], Metric::Rpm).display()).unwrap();
        assert!(json["min"].is_null());
        assert!(json["mean"].is_null());
    }

    #[test]
    fn test_mean_keeps_full_precision() {
        let stats = compute_stats(&window(&[Some(1.0), Some(2.0), Some(2.0)]), Metric::CoolantTemp);
        assert!((stats.mean.unwrap() - 5.0 / 3.0).abs() < 1e-12);
        assert_eq!(stats.display().mean.as_deref(), Some("1.67"));
    }
}
