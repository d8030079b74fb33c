use std::time::Duration;

use tokio::task::JoinHandle;

use crate::services::otp_service::PasswordResetService;

/// Periodically removes reset challenges that can no longer be used.
/// Verification checks expiry itself; this only keeps the collection small.
pub fn spawn_purge_task(service: PasswordResetService, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match service.purge_expired().await {
                Ok(0) => {}
                Ok(n) => tracing::info!("🧹 purged {} stale reset challenges", n),
                Err(e) => tracing::warn!("reset challenge purge failed: {}", e),
            }
        }
    })
}
