//! Tests for the consent authority's transition and expiry semantics.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use vigil_audit::{AuditLog, MemoryEventStore, MemoryLedgerStore};
use vigil_consent::ConsentAuthority;
use vigil_core::{ArmCommand, ConsentLedgerEntry, ConsentState, DEVICE_TOPIC};
use vigil_error::{PersistenceError, PersistenceErrorKind, VigilResult};
use vigil_interface::{ConsentGate, LedgerStore, PendingTaskCanceler};

fn memory_audit() -> AuditLog {
    AuditLog::new(
        Arc::new(MemoryLedgerStore::new()),
        Arc::new(MemoryEventStore::new()),
    )
}

/// Ledger store whose appends can be forced to fail.
struct FlakyLedgerStore {
    inner: MemoryLedgerStore,
    fail: AtomicBool,
}

impl FlakyLedgerStore {
    fn new() -> Self {
        Self {
            inner: MemoryLedgerStore::new(),
            fail: AtomicBool::new(false),
        }
    }
}

#[async_trait::async_trait]
impl LedgerStore for FlakyLedgerStore {
    async fn append(&self, entry: &ConsentLedgerEntry) -> VigilResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PersistenceError::new(PersistenceErrorKind::AppendFailed(
                "injected failure".into(),
            )))?;
        }
        self.inner.append(entry).await
    }

    async fn read_all(&self) -> VigilResult<Vec<ConsentLedgerEntry>> {
        self.inner.read_all().await
    }

    async fn len(&self) -> VigilResult<usize> {
        self.inner.len().await
    }
}

struct CountingCanceler {
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl PendingTaskCanceler for CountingCanceler {
    async fn cancel_all(&self) -> usize {
        self.calls.fetch_add(1, Ordering::SeqCst);
        3
    }
}

#[tokio::test]
async fn arm_then_disarm_matches_last_transition() {
    let authority = ConsentAuthority::new(memory_audit());

    authority.arm(ArmCommand::default()).await.unwrap();
    assert!(authority.is_action_allowed(DEVICE_TOPIC).await);

    authority.disarm().await.unwrap();
    assert!(!authority.is_action_allowed(DEVICE_TOPIC).await);

    authority.arm(ArmCommand::default()).await.unwrap();
    assert!(authority.is_action_allowed(DEVICE_TOPIC).await);
}

#[tokio::test]
async fn permission_check_applies_lazy_expiry() {
    let authority = ConsentAuthority::new(memory_audit());
    let cmd = ArmCommand {
        duration: Some(chrono::Duration::milliseconds(40)),
        ..Default::default()
    };
    authority.arm(cmd).await.unwrap();
    assert!(authority.is_action_allowed(DEVICE_TOPIC).await);

    tokio::time::sleep(std::time::Duration::from_millis(80)).await;

    // No command was issued; the stored flag is stale but the check denies.
    assert!(!authority.is_action_allowed(DEVICE_TOPIC).await);
    assert!(authority.state().await.active);
}

#[tokio::test]
async fn check_expiry_eagerly_disarms() {
    let audit = memory_audit();
    let authority = ConsentAuthority::new(audit.clone());
    let cmd = ArmCommand {
        duration: Some(chrono::Duration::milliseconds(40)),
        ..Default::default()
    };
    authority.arm(cmd).await.unwrap();
    assert!(!authority.check_expiry().await.unwrap());

    tokio::time::sleep(std::time::Duration::from_millis(80)).await;

    assert!(authority.check_expiry().await.unwrap());
    let state = authority.state().await;
    assert!(!state.active);
    assert!(state.armed_until.is_none());
    // Arm entry plus the implicit disarm entry.
    assert_eq!(audit.ledger_len().await.unwrap(), 2);
}

#[tokio::test]
async fn idempotent_disarm_still_appends() {
    let audit = memory_audit();
    let authority = ConsentAuthority::new(audit.clone());

    authority.disarm().await.unwrap();
    authority.disarm().await.unwrap();

    // The ledger records intent, not just net effect change.
    assert_eq!(audit.ledger_len().await.unwrap(), 2);
    assert_eq!(audit.replay_state().await.unwrap(), ConsentState::disarmed());
}

#[tokio::test]
async fn failed_append_aborts_transition() {
    let store = Arc::new(FlakyLedgerStore::new());
    let audit = AuditLog::new(store.clone(), Arc::new(MemoryEventStore::new()));
    let authority = ConsentAuthority::new(audit.clone());

    store.fail.store(true, Ordering::SeqCst);
    assert!(authority.arm(ArmCommand::default()).await.is_err());

    // Memory state never diverges from the durable ledger.
    assert!(!authority.is_action_allowed(DEVICE_TOPIC).await);
    assert!(!authority.state().await.active);
    assert_eq!(audit.ledger_len().await.unwrap(), 0);

    store.fail.store(false, Ordering::SeqCst);
    authority.arm(ArmCommand::default()).await.unwrap();
    assert!(authority.is_action_allowed(DEVICE_TOPIC).await);
}

#[tokio::test]
async fn safe_mode_invokes_attached_canceler() {
    let authority = ConsentAuthority::new(memory_audit());
    let canceler = Arc::new(CountingCanceler {
        calls: AtomicUsize::new(0),
    });
    authority.attach_canceler(canceler.clone());

    authority.arm(ArmCommand::default()).await.unwrap();
    let report = authority.safe_mode().await.unwrap();

    assert_eq!(report.canceled_tasks, 3);
    assert_eq!(canceler.calls.load(Ordering::SeqCst), 1);
    assert!(!authority.is_action_allowed(DEVICE_TOPIC).await);
}

#[tokio::test]
async fn recovery_replays_persisted_ledger() {
    let ledger = Arc::new(MemoryLedgerStore::new());
    let audit = AuditLog::new(ledger.clone(), Arc::new(MemoryEventStore::new()));

    {
        let authority = ConsentAuthority::new(audit.clone());
        authority.arm(ArmCommand::default()).await.unwrap();
    }

    // A new authority over the same stores sees the armed window.
    let recovered = ConsentAuthority::recover(audit).await.unwrap();
    assert!(recovered.is_action_allowed(DEVICE_TOPIC).await);
}

#[tokio::test]
async fn recovery_disarms_consent_expired_during_downtime() {
    let ledger = Arc::new(MemoryLedgerStore::new());
    let audit = AuditLog::new(ledger.clone(), Arc::new(MemoryEventStore::new()));

    {
        let authority = ConsentAuthority::new(audit.clone());
        let cmd = ArmCommand {
            duration: Some(chrono::Duration::milliseconds(20)),
            ..Default::default()
        };
        authority.arm(cmd).await.unwrap();
    }
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let recovered = ConsentAuthority::recover(audit.clone()).await.unwrap();
    assert!(!recovered.is_action_allowed(DEVICE_TOPIC).await);
    assert!(!recovered.state().await.active);
    // The implicit disarm was appended, not just held in memory.
    assert_eq!(audit.ledger_len().await.unwrap(), 2);
}

#[tokio::test]
async fn concurrent_transitions_serialize_into_ordered_entries() {
    let audit = memory_audit();
    let authority = ConsentAuthority::new(audit.clone());

    // Two arm commands racing from different channels.
    let a = {
        let authority = authority.clone();
        tokio::spawn(async move { authority.arm(ArmCommand::default()).await })
    };
    let b = {
        let authority = authority.clone();
        tokio::spawn(async move { authority.arm(ArmCommand::default()).await })
    };
    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();

    let entries = audit.read_ledger().await.unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries[0].ts <= entries[1].ts);
    // Final state matches the later entry.
    assert_eq!(audit.replay_state().await.unwrap(), entries[1].to_state());
    assert!(authority.is_action_allowed(DEVICE_TOPIC).await);
}
