//! Inactivity reaper
//!
//! Periodic sweep reclaiming idle presence, expired field locks, and lapsed
//! typing flags. This is the backstop for clients that disconnect without a
//! clean close; the same expiry checks also run lazily on each access, so
//! the interval only bounds worst-case staleness.

use crate::engine::CollabEngine;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Background sweep task over the engine's soft-state
pub struct Reaper {
    engine: Arc<CollabEngine>,
    interval: Duration,
    running: Arc<AtomicBool>,
}

impl Reaper {
    /// Create a reaper sweeping at the given interval
    #[must_use]
    pub fn new(engine: Arc<CollabEngine>, interval: Duration) -> Self {
        Self {
            engine,
            interval,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start the sweep loop on a background task
    pub fn start(self: Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::warn!("Reaper is already running");
            return;
        }

        let reaper = self.clone();
        tokio::spawn(async move {
            reaper.run().await;
        });

        tracing::info!(interval_secs = self.interval.as_secs(), "Reaper started");
    }

    /// Stop the sweep loop
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        tracing::info!("Reaper stopped");
    }

    /// Check if the sweep loop is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    async fn run(&self) {
        let mut ticker = tokio::time::interval(self.interval);
        // The first tick fires immediately; skip it so a fresh start does
        // not sweep before anything can expire
        ticker.tick().await;

        while self.running.load(Ordering::SeqCst) {
            ticker.tick().await;
            if !self.running.load(Ordering::SeqCst) {
                break;
            }
            self.engine.sweep();
        }

        tracing::debug!("Reaper loop ended");
    }
}

impl Drop for Reaper {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}
