//! Consent state machine data model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The topic gating physical-device actions.
pub const DEVICE_TOPIC: &str = "device";

/// Default lifetime of an armed window when the command does not specify one.
pub fn default_arm_duration() -> Duration {
    Duration::minutes(10)
}

/// The authorization state gating device-affecting actions.
///
/// A single process-wide value, mutated only through the consent authority.
/// `armed_until` is present exactly when `active` is true; permission checks
/// re-evaluate expiry at call time and never trust the stored flag alone.
///
/// # Examples
///
/// ```
/// use vigil_core::ConsentState;
/// use chrono::Utc;
///
/// let state = ConsentState::disarmed();
/// assert!(!state.permits("device", Utc::now()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConsentState {
    /// Whether consent is currently granted
    pub active: bool,
    /// End of the armed window; present exactly when `active` is true
    pub armed_until: Option<DateTime<Utc>>,
    /// Topics currently permitted
    pub allowed_modes: BTreeSet<String>,
    /// Explicit denials that override `allowed_modes`
    pub revoked_topics: BTreeSet<String>,
}

impl ConsentState {
    /// The initial, fully-disabled state.
    pub fn disarmed() -> Self {
        Self::default()
    }

    /// Whether `topic` is permitted at instant `now`.
    ///
    /// True only if consent is active, the armed window has not passed, the
    /// topic is allowed, and the topic is not explicitly revoked. Expiry is
    /// evaluated lazily here: a stale `active` flag with a passed
    /// `armed_until` reports denial.
    pub fn permits(&self, topic: &str, now: DateTime<Utc>) -> bool {
        if !self.active {
            return false;
        }
        // Missing deadline while active is ambiguous state: deny.
        let Some(armed_until) = self.armed_until else {
            return false;
        };
        if now >= armed_until {
            return false;
        }
        self.allowed_modes.contains(topic) && !self.revoked_topics.contains(topic)
    }

    /// Whether the armed window has passed at instant `now`.
    pub fn expired(&self, now: DateTime<Utc>) -> bool {
        match (self.active, self.armed_until) {
            (true, Some(armed_until)) => now >= armed_until,
            // Active with no deadline cannot be trusted; treat as expired.
            (true, None) => true,
            (false, _) => false,
        }
    }

    /// Capture this state as a ledger entry timestamped `ts`.
    pub fn to_entry(&self, ts: DateTime<Utc>) -> ConsentLedgerEntry {
        ConsentLedgerEntry {
            ts,
            active: self.active,
            allowed_modes: self.allowed_modes.clone(),
            revoked_topics: self.revoked_topics.clone(),
            armed_until: self.armed_until,
        }
    }

    /// Reconstruct the state by folding an ordered ledger from empty state.
    ///
    /// This is the replay contract: the current state must always be
    /// derivable solely from the ledger sequence. Entries are full
    /// snapshots, so the fold applies each one wholesale; folding a prefix
    /// reconstructs the state as of that prefix.
    pub fn replay<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a ConsentLedgerEntry>,
    {
        entries
            .into_iter()
            .fold(Self::disarmed(), |_, entry| entry.to_state())
    }
}

/// One immutable entry in the append-only consent ledger.
///
/// A full snapshot of the state after the transition it records. The ordered
/// sequence of entries is the only durable authorization history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentLedgerEntry {
    /// Transition timestamp
    pub ts: DateTime<Utc>,
    /// Consent flag after the transition
    pub active: bool,
    /// Allowed topics snapshot
    pub allowed_modes: BTreeSet<String>,
    /// Revoked topics snapshot
    pub revoked_topics: BTreeSet<String>,
    /// Armed window deadline, if any
    pub armed_until: Option<DateTime<Utc>>,
}

impl ConsentLedgerEntry {
    /// The consent state this entry snapshots.
    pub fn to_state(&self) -> ConsentState {
        ConsentState {
            active: self.active,
            armed_until: self.armed_until,
            allowed_modes: self.allowed_modes.clone(),
            revoked_topics: self.revoked_topics.clone(),
        }
    }
}

/// Parameters for an arm transition.
///
/// Omitted fields preserve the existing state: `duration` falls back to
/// [`default_arm_duration`], and absent topic sets leave the current sets
/// untouched.
///
/// # Examples
///
/// ```
/// use vigil_core::ArmCommandBuilder;
/// use chrono::Duration;
///
/// let cmd = ArmCommandBuilder::default()
///     .duration(Duration::minutes(30))
///     .build()
///     .unwrap();
/// assert_eq!(cmd.effective_duration(), Duration::minutes(30));
/// ```
#[derive(Debug, Clone, Default, derive_builder::Builder)]
#[builder(setter(into, strip_option), default)]
pub struct ArmCommand {
    /// Armed window length; defaults to ten minutes
    pub duration: Option<Duration>,
    /// Replacement for the allowed topic set
    pub allowed_modes: Option<BTreeSet<String>>,
    /// Replacement for the revoked topic set
    pub revoked_topics: Option<BTreeSet<String>>,
}

impl ArmCommand {
    /// The duration this command arms for.
    pub fn effective_duration(&self) -> Duration {
        self.duration.unwrap_or_else(default_arm_duration)
    }
}
