//! Persisted auth session.

use crate::{DurableStorage, StorageKeys, StorageResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The signed-in user as returned by the auth backend.
///
/// Fields the client does not interpret are kept in `extra` so the stored
/// session round-trips without loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Workflow role (writer, reviewer, editor, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AuthUser {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
            name: None,
            role: None,
            extra: Map::new(),
        }
    }
}

/// End-user session: `{access_token, refresh_token, user}`.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    pub user: AuthUser,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

/// Typed access to the persisted session under [`StorageKeys::AUTH_SESSION`].
pub struct SessionStore {
    storage: Box<dyn DurableStorage>,
}

impl SessionStore {
    /// Create a new session store with the given storage backend
    pub fn new(storage: Box<dyn DurableStorage>) -> Self {
        Self { storage }
    }

    /// Load the persisted session.
    ///
    /// A value that no longer parses is treated as no session: it is logged
    /// and deleted so the next start does not trip over it again.
    pub fn load_session(&self) -> StorageResult<Option<Session>> {
        let Some(raw) = self.storage.get(StorageKeys::AUTH_SESSION)? else {
            return Ok(None);
        };

        match serde_json::from_str::<Session>(&raw) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable persisted session");
                self.storage.delete(StorageKeys::AUTH_SESSION)?;
                Ok(None)
            }
        }
    }

    /// Persist a session, replacing any previous one.
    pub fn save_session(&self, session: &Session) -> StorageResult<()> {
        let raw = serde_json::to_string(session)?;
        self.storage.set(StorageKeys::AUTH_SESSION, &raw)
    }

    /// Remove the persisted session. Returns whether one existed.
    pub fn clear_session(&self) -> StorageResult<bool> {
        self.storage.delete(StorageKeys::AUTH_SESSION)
    }

    /// Check whether a session is persisted.
    pub fn has_session(&self) -> StorageResult<bool> {
        self.storage.has(StorageKeys::AUTH_SESSION)
    }
}
