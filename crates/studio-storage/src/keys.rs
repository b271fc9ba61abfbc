//! Storage key constants.

/// Storage keys used by the studio client
pub struct StorageKeys;

impl StorageKeys {
    /// Serialized auth session: `{access_token, refresh_token, user}`.
    /// Absence of the key means "no session".
    pub const AUTH_SESSION: &'static str = "studio.auth.session";
}
