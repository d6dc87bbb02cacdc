// Telemetry sample domain models
use super::metric::{Metric, METRIC_COUNT};
use serde::Serialize;
use serde::ser::SerializeMap;

/// One numeric slot per known metric; `None` marks an absent value
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MetricValues {
    values: [Option<f64>; METRIC_COUNT],
}

impl MetricValues {
    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.values[metric.index()]
    }

    pub fn set(&mut self, metric: Metric, value: Option<f64>) {
        self.values[metric.index()] = value;
    }

    pub fn with(mut self, metric: Metric, value: f64) -> Self {
        self.set(metric, Some(value));
        self
    }
}

impl Serialize for MetricValues {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(METRIC_COUNT))?;
        for metric in Metric::ALL {
            map.serialize_entry(metric.as_str(), &self.get(metric))?;
        }
        map.end()
    }
}

/// A normalized observation that has not been given a buffer position yet
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub source_key: Option<String>,
    pub values: MetricValues,
}

impl Reading {
    pub fn new(source_key: Option<String>, values: MetricValues) -> Self {
        // An empty key carries no identity, so it never takes part in dedup
        let source_key = source_key.filter(|k| !k.is_empty());
        Self { source_key, values }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    pub position: u64,
    #[serde(rename = "key", skip_serializing_if = "Option::is_none")]
    pub source_key: Option<String>,
    #[serde(flatten)]
    pub values: MetricValues,
}

impl Sample {
    pub fn new(position: u64, reading: Reading) -> Self {
        Self {
            position,
            source_key: reading.source_key,
            values: reading.values,
        }
    }

    pub fn value(&self, metric: Metric) -> Option<f64> {
        self.values.get(metric)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_key_is_dropped() {
        let reading = Reading::new(Some(String::new()), MetricValues::default());
        assert_eq!(reading.source_key, None);

        let reading = Reading::new(Some("-Nabc".to_string()), MetricValues::default());
        assert_eq!(reading.source_key.as_deref(), Some("-Nabc"));
    }

    #[test]
    fn test_sample_serializes_every_metric() {
        let values = MetricValues::default().with(Metric::Rpm, 3200.0);
        let sample = Sample::new(7, Reading::new(Some("k1".to_string()), values));
        let json = serde_json::to_value(&sample).unwrap();

        assert_eq!(json["position"], 7);
        assert_eq!(json["key"], "k1");
        assert_eq!(json["rpm"], 3200.0);
        assert!(json["oil_temp"].is_null());
        assert_eq!(json.as_object().unwrap().len(), 2 + METRIC_COUNT);
    }
}
