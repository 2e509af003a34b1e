//! Trait definitions for the Vigil consent authorization core.
//!
//! This crate draws the boundary between the core and its external
//! collaborators: control channels, device event sources, posting clients,
//! and the persistence layer. It also carries the two internal seams
//! ([`ConsentGate`] and [`PendingTaskCanceler`]) that let the consent
//! authority and the task scheduler reference each other without a crate
//! cycle.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod channel;
mod device;
mod gate;
mod posting;
mod store;

pub use channel::{ControlChannel, InboundCommand, MessageId};
pub use device::{DeviceEvent, DeviceEventSource};
pub use gate::{ConsentGate, PendingTaskCanceler};
pub use posting::{PostId, PostingClient};
pub use store::{EventStore, LedgerStore};
