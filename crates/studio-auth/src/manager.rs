//! Process-wide end-user session.
//!
//! The manager owns the in-memory token and user, mirrors them into the
//! [`SessionStore`], and tells subscribers about every transition. All
//! requests to the custom backend go through [`SessionManager::send`], which
//! attaches the bearer token and drops the session on a 401.

use crate::error::{AuthError, AuthResult};
use crate::events::{invoke, AuthCallback, AuthChangeEvent, Subscribers, Subscription};
use crate::session_fsm::{SessionMachine, SessionMachineInput, SessionStatus};
use crate::types::{ChangePinRequest, LoginRequest, LoginResponse, SessionData, UserData};
use reqwest::StatusCode;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use studio_core::{ApiError, ApiResponse};
use studio_storage::{AuthUser, Session, SessionStore};
use tracing::{debug, info, warn};
use url::Url;

const LOGIN_PATH: &str = "/api/auth/login";
const LOGOUT_PATH: &str = "/api/auth/logout";
const ME_PATH: &str = "/api/auth/me";
const CHANGE_PIN_PATH: &str = "/api/auth/change-pin";

struct SessionState {
    machine: SessionMachine,
    access_token: Option<String>,
    refresh_token: Option<String>,
    user: Option<AuthUser>,
}

impl SessionState {
    fn anonymous() -> Self {
        Self {
            machine: SessionMachine::new(),
            access_token: None,
            refresh_token: None,
            user: None,
        }
    }

    fn session(&self) -> Option<Session> {
        match (&self.access_token, &self.user) {
            (Some(access_token), Some(user)) => Some(Session {
                access_token: access_token.clone(),
                refresh_token: self.refresh_token.clone().unwrap_or_default(),
                user: user.clone(),
            }),
            _ => None,
        }
    }

    fn adopt(&mut self, session: Session, input: SessionMachineInput) {
        self.access_token = Some(session.access_token);
        self.refresh_token = Some(session.refresh_token);
        self.user = Some(session.user);
        self.transition(input);
    }

    fn clear(&mut self, input: SessionMachineInput) {
        self.access_token = None;
        self.refresh_token = None;
        self.user = None;
        self.transition(input);
    }

    fn transition(&mut self, input: SessionMachineInput) {
        if self.machine.consume(&input).is_err() {
            warn!(state = ?self.machine.state(), "Ignoring impossible session transition");
        }
    }
}

/// Auth shim: single end-user session shared by the whole process.
pub struct SessionManager {
    http_client: reqwest::Client,
    backend_url: String,
    store: SessionStore,
    state: Mutex<SessionState>,
    subscribers: Arc<Subscribers>,
}

impl SessionManager {
    /// Create the manager and restore any persisted session.
    ///
    /// Restoring is silent: subscribers learn about it through their
    /// `INITIAL_SESSION` event.
    pub fn new(store: SessionStore, backend_url: &str) -> AuthResult<Self> {
        Self::with_http_client(reqwest::Client::new(), store, backend_url)
    }

    pub fn with_http_client(
        http_client: reqwest::Client,
        store: SessionStore,
        backend_url: &str,
    ) -> AuthResult<Self> {
        let parsed = Url::parse(backend_url)?;
        if parsed.cannot_be_a_base() {
            return Err(AuthError::InvalidBackend(backend_url.to_string()));
        }

        let mut state = SessionState::anonymous();
        match store.load_session() {
            Ok(Some(session)) => {
                info!(user_id = %session.user.id, "Restored persisted session");
                state.adopt(session, SessionMachineInput::SessionRestored);
            }
            Ok(None) => debug!("No persisted session"),
            Err(e) => warn!(error = %e, "Failed to read persisted session"),
        }

        Ok(Self {
            http_client,
            backend_url: backend_url.trim_end_matches('/').to_string(),
            store,
            state: Mutex::new(state),
            subscribers: Arc::new(Subscribers::default()),
        })
    }

    /// Backend root without a trailing slash.
    pub fn backend_url(&self) -> &str {
        &self.backend_url
    }

    /// HTTP client shared with the other backend shims.
    pub fn http_client(&self) -> &reqwest::Client {
        &self.http_client
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.backend_url, path)
    }

    pub fn state(&self) -> SessionStatus {
        SessionStatus::from(self.state.lock().unwrap().machine.state())
    }

    pub fn access_token(&self) -> Option<String> {
        self.state.lock().unwrap().access_token.clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// Install a session, persist it, and notify `SIGNED_IN`.
    pub fn save_session(&self, session: Session) {
        info!(user_id = %session.user.id, "Session saved");
        {
            let mut state = self.state.lock().unwrap();
            state.adopt(session.clone(), SessionMachineInput::SessionSaved);
        }
        if let Err(e) = self.store.save_session(&session) {
            warn!(error = %e, "Failed to persist session");
        }
        self.subscribers.notify(AuthChangeEvent::SignedIn, Some(&session));
    }

    /// Drop local state and storage, then notify `SIGNED_OUT`.
    fn clear_local(&self, input: SessionMachineInput) {
        {
            let mut state = self.state.lock().unwrap();
            state.clear(input);
        }
        if let Err(e) = self.store.clear_session() {
            warn!(error = %e, "Failed to clear persisted session");
        }
        self.subscribers.notify(AuthChangeEvent::SignedOut, None);
    }

    /// Sign out. The remote logout call is best effort; the local sign-out
    /// always happens and the result never carries an error.
    pub async fn sign_out(&self) -> ApiResponse<()> {
        if let Some(token) = self.access_token() {
            let request = self
                .http_client
                .post(self.endpoint(LOGOUT_PATH))
                .bearer_auth(token);
            match request.send().await {
                Ok(response) if !response.status().is_success() => {
                    debug!(status = %response.status(), "Remote logout rejected");
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "Remote logout failed"),
            }
        }

        info!("Signed out");
        self.clear_local(SessionMachineInput::SignedOut);
        ApiResponse::empty()
    }

    /// Log in against the backend with email and PIN.
    pub async fn sign_in_with_pin(&self, email: &str, pin: &str) -> ApiResponse<SessionData> {
        let request = self
            .http_client
            .post(self.endpoint(LOGIN_PATH))
            .json(&LoginRequest { email, pin });
        let body = match read_json(request.send().await, "Login failed").await {
            Ok(body) => body,
            Err(error) => return ApiResponse::err(error),
        };

        let payload = if body.get("session").is_some_and(Value::is_object) {
            body["session"].clone()
        } else {
            body
        };
        let login: LoginResponse = match serde_json::from_value(payload) {
            Ok(login) => login,
            Err(e) => {
                return ApiResponse::err(ApiError::with_code(
                    format!("Unexpected login response: {}", e),
                    ApiError::PARSE_ERROR,
                ))
            }
        };

        match login.user {
            Some(user) => {
                let session = Session {
                    access_token: login.access_token,
                    refresh_token: login.refresh_token,
                    user,
                };
                self.save_session(session.clone());
                ApiResponse::ok(SessionData {
                    session: Some(session),
                })
            }
            None => {
                // Persisted once the user is known; see `get_user`.
                info!("Signed in without user payload");
                {
                    let mut state = self.state.lock().unwrap();
                    state.access_token = Some(login.access_token);
                    state.refresh_token = Some(login.refresh_token);
                    state.user = None;
                    state.transition(SessionMachineInput::SessionSaved);
                }
                if let Err(e) = self.store.clear_session() {
                    warn!(error = %e, "Failed to clear previous persisted session");
                }
                self.subscribers.notify(AuthChangeEvent::SignedIn, None);
                ApiResponse::ok(SessionData { session: None })
            }
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Current session rebuilt from memory.
    pub fn get_session(&self) -> ApiResponse<SessionData> {
        let session = self.state.lock().unwrap().session();
        ApiResponse::ok(SessionData { session })
    }

    /// Current user: memory, then storage, then `/api/auth/me` when only a
    /// token is held. Not being signed in is a null user, not an error.
    pub async fn get_user(&self) -> ApiResponse<UserData> {
        let token = {
            let state = self.state.lock().unwrap();
            if let (Some(_), Some(user)) = (&state.access_token, &state.user) {
                return ApiResponse::ok(UserData {
                    user: Some(user.clone()),
                });
            }
            state.access_token.clone()
        };

        match self.store.load_session() {
            Ok(Some(session)) => {
                let user = session.user.clone();
                debug!(user_id = %user.id, "Reloaded session from storage");
                self.state
                    .lock()
                    .unwrap()
                    .adopt(session, SessionMachineInput::SessionRestored);
                return ApiResponse::ok(UserData { user: Some(user) });
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Failed to reload persisted session"),
        }

        match token {
            Some(token) => self.fetch_current_user(token).await,
            None => ApiResponse::ok(UserData { user: None }),
        }
    }

    async fn fetch_current_user(&self, token: String) -> ApiResponse<UserData> {
        let request = self.http_client.get(self.endpoint(ME_PATH));
        let body = match read_json(self.send(request).await, "Failed to load current user").await {
            Ok(body) => body,
            Err(error) => return ApiResponse::err(error),
        };

        let payload = if body.get("user").is_some_and(Value::is_object) {
            body["user"].clone()
        } else {
            body
        };
        let user: AuthUser = match serde_json::from_value(payload) {
            Ok(user) => user,
            Err(e) => {
                return ApiResponse::err(ApiError::with_code(
                    format!("Unexpected user response: {}", e),
                    ApiError::PARSE_ERROR,
                ))
            }
        };

        let session = {
            let mut state = self.state.lock().unwrap();
            if state.access_token.as_deref() == Some(token.as_str()) {
                state.user = Some(user.clone());
                state.session()
            } else {
                None
            }
        };
        if let Some(session) = session {
            if let Err(e) = self.store.save_session(&session) {
                warn!(error = %e, "Failed to persist session");
            }
        }

        ApiResponse::ok(UserData { user: Some(user) })
    }

    // ------------------------------------------------------------------
    // Subscriptions
    // ------------------------------------------------------------------

    /// Register a callback. It is invoked immediately with `INITIAL_SESSION`
    /// and the current session, then on every later transition.
    ///
    /// `INITIAL_SESSION` is always the first event a callback sees: the
    /// callback joins the subscriber list only after it has been delivered.
    pub fn on_auth_state_change<F>(&self, callback: F) -> Subscription
    where
        F: Fn(AuthChangeEvent, Option<&Session>) + Send + Sync + 'static,
    {
        let callback: AuthCallback = Arc::new(callback);
        let session = self.state.lock().unwrap().session();
        invoke(&callback, AuthChangeEvent::InitialSession, session.as_ref());
        let id = self.subscribers.add(callback);
        Subscription::new(id, &self.subscribers)
    }

    // ------------------------------------------------------------------
    // Backend calls
    // ------------------------------------------------------------------

    /// Send a request to the custom backend with the bearer token attached.
    ///
    /// A 401 signs the session out locally before the response is handed
    /// back unchanged.
    pub async fn send(&self, request: reqwest::RequestBuilder) -> reqwest::Result<reqwest::Response> {
        let request = match self.access_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            warn!(path = response.url().path(), "Backend rejected session token");
            self.clear_local(SessionMachineInput::Unauthorized);
        }
        Ok(response)
    }

    /// Change the PIN of the signed-in user.
    pub async fn change_pin(&self, current_pin: &str, new_pin: &str) -> ApiResponse<Value> {
        let request = self
            .http_client
            .post(self.endpoint(CHANGE_PIN_PATH))
            .json(&ChangePinRequest {
                current_pin,
                new_pin,
            });
        match read_json(self.send(request).await, "Failed to change PIN").await {
            Ok(Value::Null) => ApiResponse::empty(),
            Ok(body) => ApiResponse::ok(body),
            Err(error) => ApiResponse::err(error),
        }
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("backend_url", &self.backend_url)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// Reduce a backend response to its JSON body or a `{message}` error.
///
/// Error messages come from the body's `error`, then `message`, then
/// `fallback`. An empty success body is `Value::Null`.
pub async fn read_json(
    result: reqwest::Result<reqwest::Response>,
    fallback: &str,
) -> Result<Value, ApiError> {
    let response = result.map_err(|e| {
        warn!(error = %e, "Backend request failed");
        ApiError::network(e.to_string())
    })?;
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| ApiError::network(e.to_string()))?;
    let body: Option<Value> = serde_json::from_str(&text).ok();

    if !status.is_success() {
        let field = |key: &str| {
            body.as_ref()
                .and_then(|body| body.get(key))
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        let message = field("error")
            .or_else(|| field("message"))
            .unwrap_or_else(|| fallback.to_string());
        debug!(status = %status, "Backend returned error");
        return Err(ApiError::new(message));
    }

    match body {
        Some(body) => Ok(body),
        None if text.trim().is_empty() => Ok(Value::Null),
        None => Err(ApiError::with_code(
            format!("{}: response was not JSON", fallback),
            ApiError::PARSE_ERROR,
        )),
    }
}
