//! Background cleanup of expired entries.
//!
//! The sweep bounds memory growth from identifiers that stop sending
//! traffic. It is a garbage-collection concern only: admission correctness
//! never depends on it, because `check` rolls an expired window over on its
//! own. The task is started and stopped explicitly so tests can run the
//! limiter without any wall-clock timer.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::LimiterSettings;

use super::limiter::RateLimiter;

/// Sweep period used by `Sweeper::start_default`.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Handle to the recurring cleanup task of a [`RateLimiter`].
pub struct Sweeper {
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl Sweeper {
    /// Spawn a cleanup task sweeping `limiter` every `period`.
    pub fn start(limiter: Arc<RateLimiter>, period: Duration) -> Self {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately; skip it so the first
            // sweep happens one full period after start.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = limiter.sweep();
                        if removed > 0 {
                            debug!(removed, "Swept expired rate limit entries");
                        }
                    }
                    _ = &mut shutdown_rx => break,
                }
            }
        });

        info!(period_ms = period.as_millis() as u64, "Started rate limit sweeper");

        Self { shutdown_tx, task }
    }

    /// Spawn a cleanup task with the default period.
    pub fn start_default(limiter: Arc<RateLimiter>) -> Self {
        Self::start(limiter, DEFAULT_SWEEP_INTERVAL)
    }

    /// Spawn a cleanup task with the period from loaded settings.
    pub fn start_with_settings(limiter: Arc<RateLimiter>, settings: &LimiterSettings) -> Self {
        Self::start(limiter, settings.cleanup_interval())
    }

    /// Stop the cleanup task and wait for it to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        let _ = self.task.await;
        info!("Rate limit sweeper stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratelimit::LimitConfig;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    #[tokio::test]
    async fn test_sweeper_removes_expired_entries() {
        init_tracing();
        let limiter = Arc::new(RateLimiter::new());
        limiter.register_limit("short", LimitConfig::new(Duration::from_millis(30), 5));

        limiter.check("u", "short");
        assert_eq!(limiter.entry_count(), 1);

        let sweeper = Sweeper::start(limiter.clone(), Duration::from_millis(20));

        // Wait past the window plus at least one sweep period.
        tokio::time::sleep(Duration::from_millis(120)).await;

        assert_eq!(limiter.entry_count(), 0);
        sweeper.shutdown().await;
    }

    #[tokio::test]
    async fn test_sweeper_keeps_live_entries() {
        let limiter = Arc::new(RateLimiter::new());
        limiter.register_limit("long", LimitConfig::new(Duration::from_secs(60), 5));

        limiter.check("u", "long");

        let sweeper = Sweeper::start(limiter.clone(), Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(limiter.entry_count(), 1);
        sweeper.shutdown().await;
    }

    #[tokio::test]
    async fn test_sweeper_period_from_settings() {
        let settings = LimiterSettings::from_yaml(
            r#"
cleanup_interval_ms: 20
categories:
  - name: short
    window_ms: 30
    max_requests: 5
"#,
        )
        .unwrap();

        let limiter = Arc::new(RateLimiter::with_settings(&settings));
        limiter.check("u", "short");
        assert_eq!(limiter.entry_count(), 1);

        let sweeper = Sweeper::start_with_settings(limiter.clone(), &settings);
        tokio::time::sleep(Duration::from_millis(120)).await;

        assert_eq!(limiter.entry_count(), 0);
        sweeper.shutdown().await;
    }

    #[tokio::test]
    async fn test_sweeper_shutdown_is_prompt() {
        let limiter = Arc::new(RateLimiter::new());
        let sweeper = Sweeper::start(limiter, Duration::from_secs(3600));

        // Shutdown must not wait for the next tick.
        tokio::time::timeout(Duration::from_secs(1), sweeper.shutdown())
            .await
            .expect("sweeper shutdown timed out");
    }
}
