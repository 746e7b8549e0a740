//! Session store - persisted authentication state
//!
//! Single owner of the JWT and the signed-in user's profile. The session
//! lives in a JSON file under the platform config directory so it survives
//! restarts, mirroring how the browser build kept it in local storage.
//! Only `store` and `clear` may write credentials; everything else reads.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::Result;
use crate::models::SessionUser;

/// Environment variable that overrides the session file location
pub const SESSION_PATH_ENV: &str = "USERDESK_SESSION_PATH";

/// What gets written to disk
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedSession {
    token: String,
    user: SessionUser,
}

/// Shared, persistent session state.
///
/// Cheap to clone; all clones observe the same in-memory state, so the
/// API client's 401 handling and the rest of the application stay in
/// agreement about whether anyone is signed in.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
    state: Arc<Mutex<Option<PersistedSession>>>,
}

impl SessionStore {
    /// Open the session store at the default location, loading any
    /// previously persisted session. A missing or unreadable file simply
    /// means nobody is signed in.
    pub fn open() -> Self {
        Self::at(default_session_path())
    }

    /// Open a session store backed by an explicit file path
    pub fn at(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = load_session(&path);
        Self {
            path,
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Store a fresh token and user profile, replacing any prior session
    pub fn store(&self, token: &str, user: &SessionUser) -> Result<()> {
        let session = PersistedSession {
            token: token.to_string(),
            user: user.clone(),
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_vec_pretty(&session)?)?;

        *self.state.lock().unwrap() = Some(session);
        Ok(())
    }

    /// Clear the session unconditionally. Idempotent: clearing an already
    /// anonymous store is a no-op.
    pub fn clear(&self) {
        *self.state.lock().unwrap() = None;
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => log::warn!("failed to remove session file: {}", err),
        }
    }

    /// The stored JWT, if any. Pure read.
    pub fn token(&self) -> Option<String> {
        self.state.lock().unwrap().as_ref().map(|s| s.token.clone())
    }

    /// The signed-in user's profile, if any. Pure read.
    pub fn current_user(&self) -> Option<SessionUser> {
        self.state.lock().unwrap().as_ref().map(|s| s.user.clone())
    }

    /// True iff a token is present and its expiry claim is in the future.
    ///
    /// The payload is decoded without verifying the signature (the client
    /// does not hold the secret); a token that cannot be decoded at all is
    /// treated as not logged in.
    pub fn is_logged_in(&self) -> bool {
        match self.token() {
            Some(token) => match token_expiry(&token) {
                Some(exp) => exp > Utc::now().timestamp(),
                None => false,
            },
            None => false,
        }
    }
}

/// Extract the `exp` claim from a JWT without verifying the signature.
/// Returns None for anything that does not look like a decodable JWT.
pub fn token_expiry(token: &str) -> Option<i64> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    claims.get("exp")?.as_i64()
}

fn default_session_path() -> PathBuf {
    if let Ok(path) = std::env::var(SESSION_PATH_ENV) {
        return PathBuf::from(path);
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("userdesk")
        .join("session.json")
}

fn load_session(path: &Path) -> Option<PersistedSession> {
    let bytes = std::fs::read(path).ok()?;
    match serde_json::from_slice(&bytes) {
        Ok(session) => Some(session),
        Err(err) => {
            log::warn!("ignoring unreadable session file: {}", err);
            None
        }
    }
}
