// Metric catalogue - the closed set of vehicle channels the dashboard knows about
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

pub const METRIC_COUNT: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Rpm,
    Throttle,
    Voltage,
    CoolantTemp,
    FuelLevel,
    Lambda,
    OilPressure,
    OilTemp,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown metric: {0}")]
pub struct UnknownMetric(pub String);

impl Metric {
    pub const ALL: [Metric; METRIC_COUNT] = [
        Metric::Rpm,
        Metric::Throttle,
        Metric::Voltage,
        Metric::CoolantTemp,
        Metric::FuelLevel,
        Metric::Lambda,
        Metric::OilPressure,
        Metric::OilTemp,
    ];

    /// Slot of this metric in fixed-size per-metric arrays
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Rpm => "rpm",
            Metric::Throttle => "throttle",
            Metric::Voltage => "voltage",
            Metric::CoolantTemp => "coolant_temp",
            Metric::FuelLevel => "fuel_level",
            Metric::Lambda => "lambda",
            Metric::OilPressure => "oil_pressure",
            Metric::OilTemp => "oil_temp",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Metric::Rpm => "RPM",
            Metric::Throttle => "Throttle",
            Metric::Voltage => "Battery Voltage",
            Metric::CoolantTemp => "Coolant Temp",
            Metric::FuelLevel => "Fuel Level",
            Metric::Lambda => "Lambda",
            Metric::OilPressure => "Oil Pressure",
            Metric::OilTemp => "Oil Temp",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Metric::Rpm => "#6366F1",
            Metric::Throttle => "#22C55E",
            Metric::Voltage => "#FACC15",
            Metric::CoolantTemp => "#3B82F6",
            Metric::FuelLevel => "#F97316",
            Metric::Lambda => "#14B8A6",
            Metric::OilPressure => "#EF4444",
            Metric::OilTemp => "#A855F7",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = UnknownMetric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| UnknownMetric(s.to_string()))
    }
}

/// Maps each metric to the field name used by the upstream records
#[derive(Debug, Clone, PartialEq)]
pub struct FieldNameMap {
    names: [String; METRIC_COUNT],
}

impl Default for FieldNameMap {
    fn default() -> Self {
        let names = Metric::ALL.map(|m| match m {
            Metric::Throttle => "throttle_position".to_string(),
            other => other.as_str().to_string(),
        });
        Self { names }
    }
}

impl FieldNameMap {
    /// Default mapping with the given overrides applied.
    /// Keys must be metric names; values are raw field names.
    pub fn with_overrides(overrides: &HashMap<String, String>) -> Result<Self, UnknownMetric> {
        let mut map = Self::default();
        for (metric, field) in overrides {
            let metric: Metric = metric.parse()?;
            map.names[metric.index()] = field.clone();
        }
        Ok(map)
    }

    pub fn raw_field(&self, metric: Metric) -> &str {
        &self.names[metric.index()]
    }
}

/// User-controlled visibility of each metric on the charts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EnabledMetrics {
    flags: [bool; METRIC_COUNT],
}

impl EnabledMetrics {
    pub fn from_list(metrics: &[Metric]) -> Self {
        let mut set = Self::default();
        for metric in metrics {
            set.flags[metric.index()] = true;
        }
        set
    }

    pub fn toggle(&mut self, metric: Metric) -> bool {
        let flag = &mut self.flags[metric.index()];
        *flag = !*flag;
        *flag
    }

    pub fn is_enabled(&self, metric: Metric) -> bool {
        self.flags[metric.index()]
    }

    /// Enabled metrics in catalogue order
    pub fn enabled(&self) -> impl Iterator<Item = Metric> + '_ {
        Metric::ALL.into_iter().filter(|m| self.is_enabled(*m))
    }
}

impl Serialize for EnabledMetrics {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(METRIC_COUNT))?;
        for metric in Metric::ALL {
            map.serialize_entry(metric.as_str(), &self.is_enabled(metric))?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_metric_names() {
        assert_eq!("coolant_temp".parse::<Metric>(), Ok(Metric::CoolantTemp));
        assert_eq!("oil_temp".parse::<Metric>(), Ok(Metric::OilTemp));
        assert_eq!(
            "boost".parse::<Metric>(),
            Err(UnknownMetric("boost".to_string()))
        );
    }

    #[test]
    fn test_catalogue_order_matches_index() {
        for (i, metric) in Metric::ALL.iter().enumerate() {
            assert_eq!(metric.index(), i);
        }
    }

    #[test]
    fn test_default_field_names() {
        let map = FieldNameMap::default();
        assert_eq!(map.raw_field(Metric::Throttle), "throttle_position");
        assert_eq!(map.raw_field(Metric::Rpm), "rpm");
        assert_eq!(map.raw_field(Metric::Lambda), "lambda");
    }

    #[test]
    fn test_field_name_overrides() {
        let mut overrides = HashMap::new();
        overrides.insert("rpm".to_string(), "engine_speed".to_string());
        let map = FieldNameMap::with_overrides(&overrides).unwrap();
        assert_eq!(map.raw_field(Metric::Rpm), "engine_speed");
        assert_eq!(map.raw_field(Metric::Throttle), "throttle_position");

        overrides.insert("boost".to_string(), "map_kpa".to_string());
        assert!(FieldNameMap::with_overrides(&overrides).is_err());
    }

    #[test]
    fn test_toggle_enabled_metrics() {
        let mut enabled = EnabledMetrics::default();
        assert_eq!(enabled.enabled().count(), 0);

        assert!(enabled.toggle(Metric::Voltage));
        assert!(enabled.toggle(Metric::Rpm));
        assert_eq!(
            enabled.enabled().collect::<Vec<_>>(),
            vec![Metric::Rpm, Metric::Voltage]
        );

        assert!(!enabled.toggle(Metric::Rpm));
        assert!(!enabled.is_enabled(Metric::Rpm));
    }

    #[test]
    fn test_enabled_metrics_serialize_every_key() {
        let enabled = EnabledMetrics::from_list(&[Metric::Lambda]);
        let json = serde_json::to_value(enabled).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), METRIC_COUNT);
        assert_eq!(obj["lambda"], true);
        assert_eq!(obj["rpm"], false);
    }
}
