//! Studio data client.
//!
//! One [`StudioClient`] is built at process start and shared. It bundles
//! three independent shims:
//!
//! - [`StudioClient::from`] / [`StudioClient::rpc`]: PostgREST queries signed
//!   with the static service key from [`Config::api_key`];
//! - [`StudioClient::auth`]: the end-user session, persisted locally;
//! - [`StudioClient::storage`]: uploads and public URLs on the custom backend,
//!   signed with the end-user token.
//!
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use studio_client::{Config, Paths, StudioClient};
//!
//! let paths = Paths::new()?;
//! let config = Config::load(&paths)?;
//! studio_client::init_logging(&config.log_level);
//!
//! let client = StudioClient::from_paths(&config, &paths)?;
//! let scripts = client
//!     .from("scripts")
//!     .select("id,title,status")
//!     .eq("status", "review")
//!     .execute()
//!     .await;
//! # let _ = scripts;
//! # Ok(())
//! # }
//! ```

mod error;

pub use error::{ClientError, ClientResult};
pub use studio_auth::{AuthChangeEvent, SessionManager, SessionStatus, Subscription};
pub use studio_core::{init_logging, ApiError, ApiResponse, Config, Paths};
pub use studio_files::{BucketApi, StorageClient, UploadData, UploadOptions};
pub use studio_rest::{
    CountMode, FilterOperator, FilterValue, OrderOptions, PostgrestClient, PostgrestResponse,
    QueryBuilder, SelectOptions, UpsertOptions,
};
pub use studio_storage::{AuthUser, DurableStorage, MemoryStorage, Session};

use serde::Serialize;
use std::sync::Arc;
use studio_storage::SessionStore;

/// Entry point bundling the query builder, the session, and file storage.
#[derive(Debug, Clone)]
pub struct StudioClient {
    db: PostgrestClient,
    auth: Arc<SessionManager>,
    storage: StorageClient,
}

impl StudioClient {
    /// Build the client over the given durable storage. Any persisted
    /// session is restored.
    pub fn new(config: &Config, storage: Box<dyn DurableStorage>) -> ClientResult<Self> {
        config.warn_if_incomplete();
        let missing_endpoints: Vec<&'static str> = config
            .missing_settings()
            .into_iter()
            .filter(|setting| *setting != "api_key")
            .collect();
        if !missing_endpoints.is_empty() {
            return Err(ClientError::MissingSettings(missing_endpoints));
        }

        let http_client = reqwest::Client::new();
        let db = PostgrestClient::with_http_client(http_client.clone(), &config.rest_url, &config.api_key)?;
        let auth = Arc::new(SessionManager::with_http_client(
            http_client,
            SessionStore::new(storage),
            &config.backend_url,
        )?);
        let storage = StorageClient::new(auth.clone());

        tracing::info!(
            rest_url = %config.rest_url,
            backend_url = %config.backend_url,
            session = ?auth.state(),
            "Studio client ready"
        );
        Ok(Self { db, auth, storage })
    }

    /// Build the client with file storage under `paths`.
    pub fn from_paths(config: &Config, paths: &Paths) -> ClientResult<Self> {
        paths.ensure_dirs()?;
        let storage = studio_storage::create_storage(paths)?;
        Self::new(config, storage)
    }

    /// Start a PostgREST query against `table`.
    pub fn from(&self, table: &str) -> QueryBuilder {
        self.db.from(table)
    }

    /// Call a PostgREST stored function.
    pub fn rpc<P: Serialize>(&self, function: &str, params: P) -> QueryBuilder {
        self.db.rpc(function, params)
    }

    pub fn db(&self) -> &PostgrestClient {
        &self.db
    }

    pub fn auth(&self) -> &SessionManager {
        &self.auth
    }

    pub fn storage(&self) -> &StorageClient {
        &self.storage
    }
}
