//! # ccr-contracts
//!
//! Validation contracts for every form the portal accepts.
//!
//! A contract checks the raw submitted values and, when they are acceptable,
//! returns them in typed form. Contracts never touch storage; facts that need
//! a lookup (is the chosen client really a client?) are passed in by the
//! caller.

pub mod accounts;
pub mod base;
pub mod documents;
pub mod messages;
pub mod progress;
pub mod projects;

pub use base::*;
