//! Debounced search-as-you-type.
//!
//! Keystrokes schedule a search pass after an idle delay; every new
//! keystroke supersedes the pending pass. Category switches cancel the
//! pending pass and apply immediately.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

use eikan_core::{Action, AppState, Error, View};

/// A delayed task that can be cancelled or replaced before it fires.
#[derive(Debug, Default)]
pub struct CancellableTimer {
    pending: Option<JoinHandle<()>>,
}

impl CancellableTimer {
    /// Run `task` after `delay`, aborting any previously scheduled task.
    pub fn schedule<F>(&mut self, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        }));
    }

    /// Abort the scheduled task. Returns whether one was still pending.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(handle) => {
                let pending = !handle.is_finished();
                handle.abort();
                pending
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for CancellableTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Feeds raw search-box input into a shared [`AppState`] and publishes the
/// resulting views.
pub struct LiveSearch {
    state: Arc<Mutex<AppState>>,
    delay: Duration,
    timer: CancellableTimer,
    views: mpsc::UnboundedSender<View>,
}

impl LiveSearch {
    pub fn new(state: Arc<Mutex<AppState>>, delay: Duration, views: mpsc::UnboundedSender<View>) -> Self {
        Self { state, delay, timer: CancellableTimer::default(), views }
    }

    /// Record a keystroke. The search runs once input has been idle for the
    /// debounce delay; results of superseded passes are discarded.
    pub async fn input(&mut self, query: impl Into<String>) {
        let query = query.into();
        let ticket = self.state.lock().await.begin_query();
        let state = Arc::clone(&self.state);
        let views = self.views.clone();

        self.timer.schedule(self.delay, async move {
            let mut state = state.lock().await;
            match state.finish_query(ticket, query) {
                Ok(true) => {
                    if views.send(state.render()).is_err() {
                        tracing::debug!("view receiver dropped");
                    }
                }
                Ok(false) => tracing::trace!(?ticket, "search pass superseded"),
                Err(e) => tracing::warn!(error = %e, "search pass failed"),
            }
        });
    }

    /// Switch category right away, dropping any pending search pass.
    pub async fn select_category(&mut self, category: impl Into<String>) -> Result<View, Error> {
        self.timer.cancel();
        let mut state = self.state.lock().await;
        state.apply(Action::SelectCategory { category: category.into() })?;
        let view = state.render();
        if self.views.send(view.clone()).is_err() {
            tracing::debug!("view receiver dropped");
        }
        Ok(view)
    }

    pub fn is_pending(&self) -> bool {
        self.timer.is_pending()
    }
}
