//! # ccr-auth
//!
//! Authentication and authorization for the CCR project portal.
//!
//! ## Features
//!
//! - Password hashing with argon2
//! - Server-side sessions with one-shot flash messages
//! - Role gates: pure functions of the caller and facts about the resource

pub mod password;
pub mod permissions;
pub mod session;

pub use password::{hash_password, verify_password, PasswordError};
pub use permissions::{Access, CurrentUser};
pub use session::{
    extract_session_id, CookieConfig, FlashLevel, FlashMessage, MemorySessionStore, SameSite,
    Session, SessionError, SessionStore,
};
