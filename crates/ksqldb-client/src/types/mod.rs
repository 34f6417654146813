//! Response types for the ksqlDB API.
//!
//! Records reached through the generic decoder implement [`crate::decode::Decode`];
//! [`ResponseError`] is decoded straight from the error body with serde.

pub mod cluster;
pub mod command;
pub mod query;
pub mod server;

use serde::{Deserialize, Serialize};

pub use cluster::{
    ClusterStatus, HostStatus, HostStoreLags, PartitionLag, QueryStandbyInfo, StoreLag,
    TopicPartition,
};
pub use command::{
    CommandStatus, CommandStatusEntity, Field, KsqlPayload, KsqlResponse, KsqlResponseSlice,
    Query, QueryDescription, QueryInfo, Schema, SourceDescription, Stream, Table, Warning,
};
pub use query::{PullHeader, Row};
pub use server::{HealthCheck, HealthCheckDetail, ServerInfo};

/// Error document sent by ksqlDB with a non-success status.
///
/// Returned as the error value itself (see [`crate::ClientError::Server`]), so the
/// server-supplied detail reaches the caller unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("ksqldb error {error_code}: {message}")]
pub struct ResponseError {
    /// Error class, e.g. `statement_error` or `generic_error`
    #[serde(rename = "@type", default)]
    pub error_type: String,
    /// ksqlDB error code (HTTP status followed by a sub-code, e.g. 40001)
    #[serde(default)]
    pub error_code: i64,
    #[serde(default)]
    pub message: String,
    /// Statement that failed, for statement errors
    #[serde(rename = "statementText", default, skip_serializing_if = "Option::is_none")]
    pub statement_text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<serde_json::Value>,
}

impl ResponseError {
    /// HTTP status class encoded in the first three digits of `error_code`.
    pub fn http_status(&self) -> Option<u16> {
        let code = self.error_code;
        if code >= 10_000 {
            u16::try_from(code / 100).ok()
        } else {
            u16::try_from(code).ok()
        }
    }
}
