//! Session authentication
//!
//! Sessions are kept server-side; the browser only holds the session id in an
//! HttpOnly cookie. Flash messages ride on the session until the next page
//! that renders them.

use std::collections::HashMap;
use std::sync::RwLock;

use ccr_core::config::AuthConfig;
use ccr_core::traits::Id;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Session errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session not found")]
    NotFound,
    #[error("Session expired")]
    Expired,
    #[error("Session store unavailable")]
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// One-shot message shown on the next rendered page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: FlashLevel,
    pub text: String,
}

impl FlashMessage {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Success,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Error,
            text: text.into(),
        }
    }
}

/// Session data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    /// None for anonymous sessions
    pub user_id: Option<Id>,
    pub flash: Vec<FlashMessage>,
    pub created_at: DateTime<Utc>,
    pub accessed_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: Option<Id>, lifetime_seconds: i64) -> Self {
        let now = Utc::now();
        Self {
            id: generate_session_id(),
            user_id,
            flash: Vec::new(),
            created_at: now,
            accessed_at: now,
            expires_at: now + Duration::seconds(lifetime_seconds),
        }
    }

    pub fn authenticated(user_id: Id, lifetime_seconds: i64) -> Self {
        Self::new(Some(user_id), lifetime_seconds)
    }

    pub fn anonymous(lifetime_seconds: i64) -> Self {
        Self::new(None, lifetime_seconds)
    }

    pub fn is_valid(&self) -> bool {
        Utc::now() < self.expires_at
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    pub fn touch(&mut self) {
        self.accessed_at = Utc::now();
    }

    pub fn push_flash(&mut self, message: FlashMessage) {
        self.flash.push(message);
    }

    /// Drain pending flash messages
    pub fn take_flash(&mut self) -> Vec<FlashMessage> {
        std::mem::take(&mut self.flash)
    }
}

/// Generate a random 64-character alphanumeric session id
fn generate_session_id() -> String {
    use rand::Rng;
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    const SESSION_ID_LENGTH: usize = 64;

    let mut rng = rand::rng();
    (0..SESSION_ID_LENGTH)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// Session store trait for different backends
pub trait SessionStore: Send + Sync {
    /// Get a live session by id; expired sessions are never returned
    fn get(&self, session_id: &str) -> Option<Session>;

    /// Insert or replace a session
    fn set(&self, session: Session) -> Result<(), SessionError>;

    fn delete(&self, session_id: &str) -> Result<(), SessionError>;

    /// Delete all sessions for a user
    fn delete_user_sessions(&self, user_id: Id) -> Result<usize, SessionError>;

    /// Drop expired sessions
    fn cleanup_expired(&self) -> Result<usize, SessionError>;
}

/// In-process session store
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    fn remove_where(&self, predicate: impl Fn(&Session) -> bool) -> Result<usize, SessionError> {
        let mut sessions = self.sessions.write().map_err(|_| SessionError::Unavailable)?;
        let before = sessions.len();
        sessions.retain(|_, s| !predicate(s));
        Ok(before - sessions.len())
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, session_id: &str) -> Option<Session> {
        match self.sessions.read() {
            Ok(sessions) => sessions.get(session_id).cloned().filter(|s| s.is_valid()),
            Err(_) => {
                tracing::warn!("Session store lock poisoned; treating request as anonymous");
                None
            }
        }
    }

    fn set(&self, session: Session) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().map_err(|_| SessionError::Unavailable)?;
        sessions.insert(session.id.clone(), session);
        Ok(())
    }

    fn delete(&self, session_id: &str) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().map_err(|_| SessionError::Unavailable)?;
        sessions.remove(session_id);
        Ok(())
    }

    fn delete_user_sessions(&self, user_id: Id) -> Result<usize, SessionError> {
        let removed = self.remove_where(|s| s.user_id == Some(user_id))?;
        if removed > 0 {
            tracing::debug!(user_id, removed, "Sessions revoked");
        }
        Ok(removed)
    }

    fn cleanup_expired(&self) -> Result<usize, SessionError> {
        let now = Utc::now();
        self.remove_where(|s| s.expires_at <= now)
    }
}

/// Cookie configuration for sessions
#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub name: String,
    pub path: String,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
    pub max_age: Option<i64>,
}

#[derive(Debug, Clone, Copy)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: "ccr_session".to_string(),
            path: "/".to_string(),
            secure: true,
            http_only: true,
            same_site: SameSite::Lax,
            max_age: None,
        }
    }
}

impl CookieConfig {
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            name: config.cookie_name.clone(),
            secure: config.cookie_secure,
            max_age: Some(config.session_lifetime_seconds),
            ..Default::default()
        }
    }

    /// Build the `Set-Cookie` value carrying a session id
    pub fn build_cookie(&self, session_id: &str) -> String {
        let mut parts = vec![
            format!("{}={}", self.name, session_id),
            format!("Path={}", self.path),
        ];

        if self.secure {
            parts.push("Secure".to_string());
        }
        if self.http_only {
            parts.push("HttpOnly".to_string());
        }

        parts.push(
            match self.same_site {
                SameSite::Strict => "SameSite=Strict",
                SameSite::Lax => "SameSite=Lax",
                SameSite::None => "SameSite=None",
            }
            .to_string(),
        );

        if let Some(max_age) = self.max_age {
            parts.push(format!("Max-Age={}", max_age));
        }

        parts.join("; ")
    }

    /// Build the `Set-Cookie` value that clears the session
    pub fn build_clear_cookie(&self) -> String {
        format!("{}=; Path={}; Max-Age=0; HttpOnly", self.name, self.path)
    }
}

/// Extract the session id from a `Cookie` header
pub fn extract_session_id(cookie_header: &str, cookie_name: &str) -> Option<String> {
    cookie_header
        .split(';')
        .filter_map(|part| part.trim().split_once('='))
        .find(|(name, _)| name.trim() == cookie_name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
