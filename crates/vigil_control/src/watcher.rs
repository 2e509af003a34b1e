//! Periodic expiry tick.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use vigil_consent::ConsentAuthority;

/// Fixed-interval tick asking the authority to self-check expiry.
///
/// Runs independently of any scheduled task or inbound command; its only
/// job is to guarantee eager convergence to the disarmed state. Abort the
/// returned handle to stop the watcher.
pub struct ExpiryWatcher {
    authority: Arc<ConsentAuthority>,
    interval: Duration,
}

impl ExpiryWatcher {
    /// Create a watcher ticking every `interval`.
    pub fn new(authority: Arc<ConsentAuthority>, interval: Duration) -> Self {
        Self {
            authority,
            interval,
        }
    }

    /// Spawn the tick loop.
    pub fn spawn(self) -> JoinHandle<()> {
        tracing::debug!(interval = ?self.interval, "Starting expiry watcher");
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            // The first tick fires immediately; that is fine, check_expiry
            // is cheap and unconditional.
            loop {
                ticker.tick().await;
                match self.authority.check_expiry().await {
                    Ok(true) => tracing::info!("Expiry tick disarmed stale consent"),
                    Ok(false) => {}
                    Err(e) => tracing::error!(error = %e, "Expiry check failed"),
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_audit::{AuditLog, MemoryEventStore, MemoryLedgerStore};
    use vigil_core::ArmCommand;

    #[tokio::test]
    async fn watcher_disarms_expired_consent_without_commands() {
        let audit = AuditLog::new(
            Arc::new(MemoryLedgerStore::new()),
            Arc::new(MemoryEventStore::new()),
        );
        let authority = ConsentAuthority::new(audit.clone());
        let cmd = ArmCommand {
            duration: Some(chrono::Duration::milliseconds(30)),
            ..Default::default()
        };
        authority.arm(cmd).await.unwrap();

        let handle =
            ExpiryWatcher::new(authority.clone(), Duration::from_millis(20)).spawn();
        tokio::time::sleep(Duration::from_millis(120)).await;
        handle.abort();

        // No permission check or command was issued; the stored state
        // converged on its own, with the disarm entry appended.
        let state = authority.state().await;
        assert!(!state.active);
        assert_eq!(audit.ledger_len().await.unwrap(), 2);
    }
}
