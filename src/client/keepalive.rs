use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::manager::SessionManager;

/// Environment changes that may warrant an early refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepAliveEvent {
    /// The user came back to the application
    Visible,
    Hidden,
    Offline,
    Online,
}

/// Background task that refreshes the session on a timer and on environment events.
///
/// Failures are logged and otherwise ignored; the request engine's 401
/// recovery remains the safety net.
pub struct KeepAlive {
    events: mpsc::Sender<KeepAliveEvent>,
    handle: JoinHandle<()>,
}

impl KeepAlive {
    pub fn spawn(sessions: SessionManager, period: Duration) -> Self {
        let (events, rx) = mpsc::channel(16);
        let handle = tokio::spawn(run(sessions, period, rx));
        Self { events, handle }
    }

    /// Deliver an event; `false` once the task has stopped.
    pub async fn notify(&self, event: KeepAliveEvent) -> bool {
        self.events.send(event).await.is_ok()
    }

    /// Stop after the events already queued have been handled.
    pub async fn shutdown(self) {
        drop(self.events);
        if let Err(e) = self.handle.await {
            tracing::warn!("keep-alive task ended abnormally: {}", e);
        }
    }
}

async fn run(sessions: SessionManager, period: Duration, mut events: mpsc::Receiver<KeepAliveEvent>) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut offline = false;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if !offline {
                    refresh(&sessions, "interval").await;
                }
            }
            event = events.recv() => match event {
                Some(KeepAliveEvent::Visible) => refresh(&sessions, "visible").await,
                Some(KeepAliveEvent::Hidden) => tracing::debug!("application hidden"),
                Some(KeepAliveEvent::Offline) => offline = true,
                Some(KeepAliveEvent::Online) => {
                    if offline {
                        offline = false;
                        refresh(&sessions, "back online").await;
                    }
                }
                None => break,
            },
        }
    }
    tracing::debug!("keep-alive stopped");
}

async fn refresh(sessions: &SessionManager, trigger: &str) {
    if !sessions.has_session() {
        return;
    }
    match sessions.refresh().await {
        Some(_) => tracing::debug!("keep-alive refresh ({}) succeeded", trigger),
        None => tracing::warn!("keep-alive refresh ({}) failed", trigger),
    }
}
