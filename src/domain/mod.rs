// Domain layer - telemetry state and the rules that derive what is displayed
pub mod buffer;
pub mod chart;
pub mod live_mode;
pub mod metric;
pub mod normalizer;
pub mod sample;
pub mod stats;
pub mod view_window;
