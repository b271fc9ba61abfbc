//! PostgREST query builder for the studio client.
//!
//! A fluent chain on [`QueryBuilder`] records one request; [`QueryBuilder::execute`]
//! sends it and normalises the outcome into a [`PostgrestResponse`]:
//!
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use studio_rest::{OrderOptions, PostgrestClient};
//!
//! let db = PostgrestClient::new("https://db.example.com/rest/v1", "service-key")?;
//! let response = db
//!     .from("scripts")
//!     .select("id,title,status")
//!     .in_("status", ["review", "approved"])
//!     .order_with("created_at", OrderOptions::descending())
//!     .range(0, 19)
//!     .execute()
//!     .await;
//! let rows = response.into_result()?;
//! # let _ = rows;
//! # Ok(())
//! # }
//! ```

mod builder;
mod client;
mod error;
mod filter;
mod order;
mod response;

pub use builder::{CountMode, QueryBuilder, SelectOptions, UpsertOptions};
pub use client::PostgrestClient;
pub use error::{RestError, RestResult};
pub use filter::{FilterOperator, FilterValue};
pub use order::OrderOptions;
pub use response::PostgrestResponse;
pub use studio_core::ApiError;
