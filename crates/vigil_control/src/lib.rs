//! Control plane: command routing and expiry watching.
//!
//! [`CommandRouter`] turns raw control-channel text into command intents and
//! forwards the known ones to the consent authority. [`ExpiryWatcher`] is an
//! independent periodic tick that drives eager expiry, so consent converges
//! to disarmed even when nothing else is happening.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod router;
mod watcher;

pub use router::CommandRouter;
pub use watcher::ExpiryWatcher;
