//! Shared types for the HTTP API layer.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rusqlite::Connection;

use crate::api::error::ApiError;
use crate::authorization::Principal;
use crate::db::sqlite::open_database;

/// Session lifetime. A token that has not been presented within this window
/// is discarded on the next sweep.
const SESSION_TTL_SECS: u64 = 24 * 60 * 60;

/// Shared context for all API routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub db_path: Arc<PathBuf>,
    pub sessions: Arc<Mutex<SessionStore>>,
}

impl ApiContext {
    pub fn new(db_path: PathBuf) -> Self {
        Self {
            db_path: Arc::new(db_path),
            sessions: Arc::new(Mutex::new(SessionStore::new())),
        }
    }

    /// Open a connection to the application database.
    pub fn open_db(&self) -> Result<Connection, ApiError> {
        open_database(self.db_path.as_ref()).map_err(|e| ApiError::Internal(e.to_string()))
    }

    /// Issue a session token for an authenticated principal.
    pub fn issue_token(&self, principal: Principal) -> Result<String, ApiError> {
        let token = generate_token();
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|_| ApiError::Internal("session lock".into()))?;
        sessions.insert(hash_token(&token), principal);
        Ok(token)
    }

    /// Look up the principal for a presented bearer token.
    pub fn authenticate(&self, token: &str) -> Result<Principal, ApiError> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|_| ApiError::Internal("session lock".into()))?;
        sessions.validate(&hash_token(token)).ok_or(ApiError::Unauthorized)
    }
}

struct SessionEntry {
    principal: Principal,
    last_seen: Instant,
}

/// In-memory session store keyed by SHA-256 token hash. Raw tokens are
/// never retained server-side.
pub struct SessionStore {
    entries: HashMap<[u8; 32], SessionEntry>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            ttl: Duration::from_secs(SESSION_TTL_SECS),
        }
    }

    pub fn insert(&mut self, token_hash: [u8; 32], principal: Principal) {
        if self.entries.len() > 1000 {
            self.sweep();
        }
        self.entries.insert(
            token_hash,
            SessionEntry {
                principal,
                last_seen: Instant::now(),
            },
        );
    }

    /// Validate a token hash, refreshing its idle timer on success.
    pub fn validate(&mut self, token_hash: &[u8; 32]) -> Option<Principal> {
        let ttl = self.ttl;
        let entry = self.entries.get_mut(token_hash)?;
        if entry.last_seen.elapsed() > ttl {
            self.entries.remove(token_hash);
            return None;
        }
        entry.last_seen = Instant::now();
        Some(entry.principal.clone())
    }

    pub fn remove(&mut self, token_hash: &[u8; 32]) {
        self.entries.remove(token_hash);
    }

    fn sweep(&mut self) {
        let ttl = self.ttl;
        self.entries.retain(|_, e| e.last_seen.elapsed() < ttl);
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Hash a bearer token string using SHA-256.
pub fn hash_token(token: &str) -> [u8; 32] {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().into()
}

/// Generate a random bearer token (URL-safe base64, 32 bytes of entropy).
pub fn generate_token() -> String {
    use base64::Engine;
    let bytes: [u8; 32] = rand::random();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}
