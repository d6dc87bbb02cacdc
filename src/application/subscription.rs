// Scoped upstream subscription owned by a dashboard session
use crate::application::dashboard_session::DashboardSession;
use crate::application::telemetry_source::SourceEvent;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Keeps the ingest loop alive. Released exactly once, by `close` or on drop;
/// once released no further event reaches the session.
pub struct Subscription {
    active: Option<ActiveSubscription>,
}

struct ActiveSubscription {
    session: Arc<DashboardSession>,
    closed: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl Subscription {
    pub(crate) fn spawn(session: Arc<DashboardSession>, rx: mpsc::Receiver<SourceEvent>) -> Self {
        let closed = Arc::new(AtomicBool::new(false));
        let task = tokio::spawn(ingest_loop(session.clone(), rx, closed.clone()));
        Self {
            active: Some(ActiveSubscription {
                session,
                closed,
                task,
            }),
        }
    }

    pub fn close(mut self) {
        self.release();
    }

    /// True once released, or once the upstream ended on its own
    pub fn is_finished(&self) -> bool {
        self.active.as_ref().is_none_or(|a| a.task.is_finished())
    }

    fn release(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        // Flip the flag under the session lock so an in-flight event either
        // lands before this returns or not at all.
        active.session.while_locked(|| active.closed.store(true, Ordering::SeqCst));
        // Aborting drops the receiver, which closes the upstream stream
        active.task.abort();
        tracing::info!("telemetry subscription released");
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

async fn ingest_loop(
    session: Arc<DashboardSession>,
    mut rx: mpsc::Receiver<SourceEvent>,
    closed: Arc<AtomicBool>,
) {
    let mut delivered: u64 = 0;
    while let Some(event) = rx.recv().await {
        if session.ingest_unless(event, &closed).is_none() {
            return;
        }
        delivered += 1;
    }
    tracing::info!(delivered, "telemetry source ended the subscription");
}
