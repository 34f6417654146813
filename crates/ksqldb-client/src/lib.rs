//! ksqlDB Client SDK
//!
//! A Rust HTTP client for the ksqlDB REST API: pull queries with streamed rows,
//! statement execution and cluster inspection.
//!
//! # Features
//!
//! - **Pull Queries**: `POST /query-stream` with a header plus a lazy row stream
//! - **Statements**: `POST /ksql` with typed, tag-dispatched responses
//! - **Cluster Status**: `GET /clusterStatus` decoded into typed per-host records
//! - **Automatic Retries**: Exponential backoff for transient GET failures
//! - **Cancellation**: Every call takes a [`RequestContext`] with an optional deadline
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use futures_util::TryStreamExt;
//! use ksqldb_client::{ClientConfig, KsqlClient, QueryOptions, RequestContext};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = KsqlClient::new(
//!         ClientConfig::builder("http://localhost:8088")
//!             .basic_auth("alice", "secret")
//!             .timeout(Duration::from_secs(30))
//!             .build()?,
//!     )?;
//!
//!     let ctx = RequestContext::background().timeout(Duration::from_secs(10));
//!
//!     let mut options = QueryOptions::new("SELECT * FROM USERS WHERE ID = 'u1';");
//!     options.enable_pull_query_table_scan(true);
//!
//!     let (header, mut rows) = client.pull(&ctx, options).await?;
//!     println!("columns: {:?}", header.column_names);
//!     while let Some(row) = rows.try_next().await? {
//!         println!("{:?}", row);
//!     }
//!
//!     let status = client.get_cluster_status(&ctx).await?;
//!     for host in status.alive_hosts() {
//!         println!("alive: {}", host);
//!     }
//!
//!     client.close();
//!     Ok(())
//! }
//! ```
//!
//! # Error Handling
//!
//! All operations return `Result<T, ClientError>`. Errors include:
//!
//! - `EmptyQuery` / `Syntax`: Rejected locally, nothing was sent
//! - `GetRequest` / `DoRequest`: The transport could not complete the call
//! - `Server`: ksqlDB answered with an error document (`error_code`, `message`)
//! - `Parse` / `Decode`: The body is not JSON, or not the expected shape
//! - `Cancelled` / `Timeout`: The call's context stopped it

pub mod client;
pub mod config;
pub mod constants;
pub mod context;
pub mod decode;
pub mod error;
pub mod query;
mod request;
mod response;
pub mod sql;
pub mod stream;
pub mod transport;
pub mod types;

// Re-exports for convenience
pub use client::{KsqlClient, SharedClient};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use constants::{Endpoint, KSQL_QUERY_PULL_TABLE_SCAN_ENABLED, KSQL_STREAMS_AUTO_OFFSET_RESET};
pub use context::RequestContext;
pub use decode::{decode_into, unmarshal_generic, Decode, DecodeError, JsonMap};
pub use error::{BoxError, ClientError, Result};
pub use query::{sanitize_sql, QueryOptions};
pub use request::{KsqlRequest, QueryStreamRequest};
pub use sql::{SqlParserValidator, SqlSyntaxError, SqlValidator};
pub use stream::RowStream;
pub use transport::{HttpTransport, ReqwestTransport};
pub use types::{
    ClusterStatus, HealthCheck, HostStatus, KsqlPayload, KsqlResponse, KsqlResponseSlice,
    PullHeader, ResponseError, Row, ServerInfo, TopicPartition,
};
