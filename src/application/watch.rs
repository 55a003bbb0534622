use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domain::SeriesWindow;

use super::{AppError, Dashboard, LedgerService, Notifier, Session};

/// Polling dashboard. Keeps the last dashboard that computed successfully.
#[derive(Debug, Clone)]
pub struct DashboardWatch {
    window: SeriesWindow,
    activity_limit: usize,
    last: Option<Dashboard>,
}

impl DashboardWatch {
    pub fn new(window: SeriesWindow, activity_limit: usize) -> Self {
        Self {
            window,
            activity_limit,
            last: None,
        }
    }

    pub fn last(&self) -> Option<&Dashboard> {
        self.last.as_ref()
    }

    /// Recompute once. On failure the error goes to `notifier` and the
    /// previous dashboard is kept. Returns whether `last` was replaced.
    pub async fn refresh(
        &mut self,
        service: &LedgerService,
        session: &Session,
        notifier: &dyn Notifier,
        now: DateTime<Utc>,
    ) -> bool {
        let result = service.dashboard(session, self.window, now, self.activity_limit).await;
        self.apply(result, notifier)
    }

    fn apply(&mut self, result: Result<Dashboard, AppError>, notifier: &dyn Notifier) -> bool {
        match result {
            Ok(dashboard) => {
                self.last = Some(dashboard);
                true
            }
            Err(e) => {
                notifier.error(&format!("Dashboard refresh failed: {}", e));
                false
            }
        }
    }

    /// Refresh every `period` until `stop` resolves, calling `on_update`
    /// after each successful refresh. `stop` wins over a refresh that is
    /// still in flight, and that refresh is dropped without touching `last`.
    pub async fn run<S, F>(
        &mut self,
        service: &LedgerService,
        session: &Session,
        notifier: &dyn Notifier,
        period: Duration,
        stop: S,
        mut on_update: F,
    ) where
        S: Future,
        F: FnMut(&Dashboard),
    {
        let mut interval = tokio::time::interval(period);
        tokio::pin!(stop);

        loop {
            let window = self.window;
            let limit = self.activity_limit;
            let tick = async {
                interval.tick().await;
                service.dashboard(session, window, Utc::now(), limit).await
            };

            tokio::select! {
                biased;
                _ = &mut stop => {
                    debug!("dashboard watch stopped");
                    break;
                }
                result = tick => {
                    if self.apply(result, notifier) {
                        if let Some(dashboard) = &self.last {
                            on_update(dashboard);
                        }
                    }
                }
            }
        }
    }
}
