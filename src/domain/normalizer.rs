// Normalizer - converts loosely typed upstream records into MetricValues
use super::metric::{FieldNameMap, Metric};
use super::sample::MetricValues;
use serde_json::Value;

/// Total over any input: anything that is not a finite number becomes absent.
pub fn normalize(raw: &Value, field_names: &FieldNameMap) -> MetricValues {
    let mut values = MetricValues::default();
    let Some(record) = raw.as_object() else {
        return values;
    };

    for metric in Metric::ALL {
        let coerced = record
            .get(field_names.raw_field(metric))
            .and_then(coerce_number);
        values.set(metric, coerced);
    }

    values
}

fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_mixed_record() {
        let raw = json!({
            "rpm": 3150,
            "throttle_position": " 42.5 ",
            "voltage": "13.8",
            "coolant_temp": null,
            "fuel_level": "n/a",
            "lambda": true,
            "oil_pressure": "",
            "timestamp": "2025-07-28T10:00:00Z"
        });
        let values = normalize(&raw, &FieldNameMap::default());

        assert_eq!(values.get(Metric::Rpm), Some(3150.0));
        assert_eq!(values.get(Metric::Throttle), Some(42.5));
        assert_eq!(values.get(Metric::Voltage), Some(13.8));
        assert_eq!(values.get(Metric::CoolantTemp), None);
        assert_eq!(values.get(Metric::FuelLevel), None);
        assert_eq!(values.get(Metric::Lambda), None);
        assert_eq!(values.get(Metric::OilPressure), None);
        assert_eq!(values.get(Metric::OilTemp), None);
    }

    #[test]
    fn test_unmapped_throttle_name_is_ignored() {
        // "throttle" is not the upstream field name, "throttle_position" is
        let raw = json!({ "throttle": 80 });
        let values = normalize(&raw, &FieldNameMap::default());
        assert_eq!(values.get(Metric::Throttle), None);
    }

    #[test]
    fn test_non_object_records_are_all_absent() {
        for raw in [json!(null), json!(12), json!("rpm"), json!([1, 2, 3])] {
            assert_eq!(
                normalize(&raw, &FieldNameMap::default()),
                MetricValues::default()
            );
        }
    }

    #[test]
    fn test_non_finite_strings_are_absent() {
        let raw = json!({ "rpm": "inf", "voltage": "NaN", "lambda": "1e3" });
        let values = normalize(&raw, &FieldNameMap::default());
        assert_eq!(values.get(Metric::Rpm), None);
        assert_eq!(values.get(Metric::Voltage), None);
        assert_eq!(values.get(Metric::Lambda), Some(1000.0));
    }
}
