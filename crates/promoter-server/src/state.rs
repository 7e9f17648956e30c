//! Application state.

use std::sync::Arc;
use std::time::Duration;

use promoter_engine::PromotionWorkflow;
use tokio::sync::{Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::repo::ManagedRepo;

/// The single working copy and everything that reads or mutates it.
pub struct Checkout {
    pub workflow: PromotionWorkflow,
    pub repo: ManagedRepo,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    checkout: Arc<Mutex<Checkout>>,
}

impl AppState {
    pub fn new(workflow: PromotionWorkflow, repo: ManagedRepo) -> Self {
        Self {
            checkout: Arc::new(Mutex::new(Checkout { workflow, repo })),
        }
    }

    /// Exclusive access to the checkout. Held for the whole of a request.
    pub async fn checkout(&self) -> MutexGuard<'_, Checkout> {
        self.checkout.lock().await
    }

    /// Refresh the checkout from `origin` every `interval`.
    pub fn spawn_refresh(&self, interval: Duration) -> JoinHandle<()> {
        let state = self.clone();
        info!(interval_secs = interval.as_secs(), "Starting periodic refresh");
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let checkout = state.checkout().await;
                if let Err(e) = checkout.repo.refresh().await {
                    warn!(error = %e, "Periodic refresh failed");
                }
            }
        })
    }
}
