//! Payloads exchanged with the auth backend and returned to callers.

use serde::{Deserialize, Serialize};
use studio_storage::{AuthUser, Session};

/// `data` of [`crate::SessionManager::get_user`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserData {
    pub user: Option<AuthUser>,
}

/// `data` of [`crate::SessionManager::get_session`] and sign-in calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    pub session: Option<Session>,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub pin: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChangePinRequest<'a> {
    pub current_pin: &'a str,
    pub new_pin: &'a str,
}

/// Successful login body. The user may be omitted, in which case it is
/// resolved lazily through `/api/auth/me`.
#[derive(Deserialize)]
pub(crate) struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub user: Option<AuthUser>,
}
