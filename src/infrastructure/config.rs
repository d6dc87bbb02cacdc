use crate::application::dashboard_session::SessionSettings;
use crate::application::telemetry_source::IngestMode;
use crate::domain::buffer::DEFAULT_CAPACITY;
use crate::domain::metric::{EnabledMetrics, FieldNameMap, Metric};
use crate::domain::view_window::DEFAULT_LIVE_WINDOW;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    #[serde(default)]
    pub server: ServerSettings,
    pub source: SourceSettings,
    #[serde(default)]
    pub buffer: BufferSettings,
    #[serde(default)]
    pub metrics: MetricsSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceSettings {
    Firebase {
        database_url: String,
        path: String,
        #[serde(default)]
        auth: Option<String>,
        #[serde(default)]
        mode: IngestMode,
    },
    Replay {
        file: String,
        #[serde(default = "default_replay_interval_ms")]
        interval_ms: u64,
        #[serde(default)]
        mode: IngestMode,
    },
}

fn default_replay_interval_ms() -> u64 {
    500
}

#[derive(Debug, Deserialize, Clone)]
pub struct BufferSettings {
    pub capacity: usize,
    pub live_window: usize,
}

impl Default for BufferSettings {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            live_window: DEFAULT_LIVE_WINDOW,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MetricsSettings {
    #[serde(default)]
    pub enabled: Vec<Metric>,
    #[serde(default = "default_stat_metric")]
    pub selected: Metric,
    /// metric name -> upstream field name
    #[serde(default)]
    pub field_names: HashMap<String, String>,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            enabled: Vec::new(),
            selected: default_stat_metric(),
            field_names: HashMap::new(),
        }
    }
}

fn default_stat_metric() -> Metric {
    Metric::Rpm
}

/// Reads `config/dashboard.*`, then `DASHBOARD__SECTION__KEY` environment overrides
pub fn load_dashboard_config() -> anyhow::Result<DashboardConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/dashboard"))
        .add_source(
            config::Environment::with_prefix("DASHBOARD")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

impl DashboardConfig {
    pub fn session_settings(&self) -> anyhow::Result<SessionSettings> {
        if self.buffer.live_window == 0 {
            anyhow::bail!("buffer.live_window must be at least 1");
        }
        let field_names = FieldNameMap::with_overrides(&self.metrics.field_names)?;

        Ok(SessionSettings {
            capacity: self.buffer.capacity,
            live_window: self.buffer.live_window,
            field_names,
            enabled_metrics: EnabledMetrics::from_list(&self.metrics.enabled),
            stat_metric: self.metrics.selected,
        })
    }
}

/// Replace template variables in a path string
pub fn prepare_path(path: &str, vars: &HashMap<String, String>) -> String {
    let mut result = path.to_string();
    for (key, value) in vars {
        let placeholder = format!("${{{}}}", key);
        result = result.replace(&placeholder, value);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> DashboardConfig {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_prepare_path() {
        let mut vars = HashMap::new();
        vars.insert("date".to_string(), "2025-07-28".to_string());

        let result = prepare_path("telemetry/${date}", &vars);

        assert_eq!(result, "telemetry/2025-07-28");
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = parse(
            r#"
            [source]
            kind = "firebase"
            database_url = "https://example.firebasedatabase.app"
            path = "telemetry/${date}"
            "#,
        );

        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.buffer.capacity, 3000);
        assert_eq!(config.buffer.live_window, 100);
        match &config.source {
            SourceSettings::Firebase { auth, mode, .. } => {
                assert!(auth.is_none());
                assert_eq!(*mode, IngestMode::Incremental);
            }
            other => panic!("unexpected source {:?}", other),
        }

        let settings = config.session_settings().unwrap();
        assert_eq!(settings.stat_metric, Metric::Rpm);
        assert_eq!(settings.enabled_metrics.enabled().count(), 0);
    }

    #[test]
    fn test_full_config() {
        let config = parse(
            r#"
            [source]
            kind = "replay"
            file = "data/session.json"
            interval_ms = 50
            mode = "snapshot"

            [buffer]
            capacity = 500
            live_window = 50

            [metrics]
            enabled = ["rpm", "oil_temp"]
            selected = "coolant_temp"

            [metrics.field_names]
            rpm = "engine_rpm"
            "#,
        );

        match &config.source {
            SourceSettings::Replay { interval_ms, mode, .. } => {
                assert_eq!(*interval_ms, 50);
                assert_eq!(*mode, IngestMode::Snapshot);
            }
            other => panic!("unexpected source {:?}", other),
        }

        let settings = config.session_settings().unwrap();
        assert_eq!(settings.capacity, 500);
        assert_eq!(settings.live_window, 50);
        assert_eq!(settings.stat_metric, Metric::CoolantTemp);
        assert!(settings.enabled_metrics.is_enabled(Metric::OilTemp));
        assert_eq!(settings.field_names.raw_field(Metric::Rpm), "engine_rpm");
    }

    #[test]
    fn test_unknown_field_name_metric_is_rejected() {
        let config = parse(
            r#"
            [source]
            kind = "replay"
            file = "data/session.json"

            [metrics.field_names]
            boost = "map_kpa"
            "#,
        );

        assert!(config.session_settings().is_err());
    }
}
