//! Endpoint paths and well-known ksqlDB property keys.

use std::fmt;

/// Property that lets pull queries scan a whole table instead of requiring a key lookup.
pub const KSQL_QUERY_PULL_TABLE_SCAN_ENABLED: &str = "ksql.query.pull.table.scan.enabled";

/// Property controlling where a new query starts reading its source topics.
pub const KSQL_STREAMS_AUTO_OFFSET_RESET: &str = "ksql.streams.auto.offset.reset";

/// Media type for the newline-delimited response of `/query-stream`.
pub const DELIMITED_CONTENT_TYPE: &str = "application/vnd.ksqlapi.delimited.v1";

/// Media type ksqlDB expects on the command endpoint.
pub const KSQL_CONTENT_TYPE: &str = "application/vnd.ksql.v1+json";

/// REST endpoints exposed by a ksqlDB server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Statements (DDL, DML, SHOW/DESCRIBE) returning a buffered JSON array.
    Ksql,
    /// Pull and push queries returning a stream of frames.
    QueryStream,
    /// Per-host cluster status snapshot.
    ClusterStatus,
    /// Server version and cluster ids.
    Info,
    /// Liveness of the server and its dependencies.
    HealthCheck,
}

impl Endpoint {
    pub const fn path(self) -> &'static str {
        match self {
            Endpoint::Ksql => "/ksql",
            Endpoint::QueryStream => "/query-stream",
            Endpoint::ClusterStatus => "/clusterStatus",
            Endpoint::Info => "/info",
            Endpoint::HealthCheck => "/healthcheck",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_paths() {
        assert_eq!(Endpoint::Ksql.path(), "/ksql");
        assert_eq!(Endpoint::QueryStream.to_string(), "/query-stream");
        assert_eq!(Endpoint::ClusterStatus.path(), "/clusterStatus");
    }
}
