// Application state for HTTP handlers
use crate::application::dashboard_session::DashboardSession;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub session: Arc<DashboardSession>,
}
