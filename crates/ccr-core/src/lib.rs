//! # ccr-core
//!
//! Core types, traits, and utilities for the CCR project portal.
//!
//! This crate provides the foundational building blocks used across all other crates:
//! - The portal error type and validation error collection
//! - Result type aliases
//! - Core entity traits
//! - The two-decimal `Percent` value type
//! - Configuration types

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::*;
pub use result::*;
pub use traits::*;
pub use types::*;
