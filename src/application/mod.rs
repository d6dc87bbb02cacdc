// Application layer - session orchestration and the upstream source seam
pub mod dashboard_session;
pub mod subscription;
pub mod telemetry_source;
