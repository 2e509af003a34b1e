//! Consent authorization state machine.
//!
//! [`ConsentAuthority`] owns the single source of truth for "is this action
//! allowed now." Every mutation serializes through one lock around the
//! state + ledger-append pair, so concurrent callers observe transitions as
//! a strict sequence and a half-applied transition can never escape.
//!
//! The governing policy is fail-safe: ambiguity, missing data, or an
//! internal error during a permission check resolves to denial, never to
//! implicit permission.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod authority;

pub use authority::{ConsentAuthority, SafeModeReport};
