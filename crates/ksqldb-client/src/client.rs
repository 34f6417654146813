//! ksqlDB client: pull queries, statements and cluster inspection.

use crate::config::ClientConfig;
use crate::constants::Endpoint;
use crate::context::RequestContext;
use crate::decode::{decode_into, unmarshal_generic, unmarshal_value, Decode};
use crate::error::{ClientError, Result};
use crate::query::QueryOptions;
use crate::request::{build_command_request, build_stream_request, KsqlRequest, QueryStreamRequest};
use crate::response::{handle_get_request, handle_request_error, read_body, read_response};
use crate::sql::{SqlParserValidator, SqlValidator};
use crate::stream::{error_frame, is_error_frame, FrameReader, RowStream};
use crate::transport::{HttpTransport, ReqwestTransport};
use crate::types::{ClusterStatus, HealthCheck, KsqlResponseSlice, PullHeader, Row, ServerInfo};
use futures_util::{TryFutureExt, TryStreamExt};
use reqwest::StatusCode;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Client for a ksqlDB server.
///
/// The client owns its transport and closes it exactly once, either through
/// [`KsqlClient::close`] or when dropped. Calls made after `close` fail with
/// [`ClientError::Closed`]. All calls take `&self` and may run concurrently.
pub struct KsqlClient {
    transport: Arc<dyn HttpTransport>,
    validator: Arc<dyn SqlValidator>,
    parse_sql: bool,
    closed: AtomicBool,
}

impl KsqlClient {
    /// Create a new client builder with the given base URL.
    pub fn builder(base_url: impl Into<String>) -> crate::config::ClientConfigBuilder {
        crate::config::ClientConfigBuilder::new(base_url)
    }

    /// Create a client talking HTTP through `reqwest`.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(&config)?;
        let mut client = Self::with_transport(Arc::new(transport));
        client.parse_sql = config.parse_sql;
        Ok(client)
    }

    /// Create a client over an arbitrary transport.
    pub fn with_transport(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            validator: Arc::new(SqlParserValidator),
            parse_sql: false,
            closed: AtomicBool::new(false),
        }
    }

    /// Replace the validator used by the local syntax check.
    pub fn with_validator(mut self, validator: impl SqlValidator + 'static) -> Self {
        self.validator = Arc::new(validator);
        self
    }

    /// Turn the local syntax check for pull queries on or off.
    pub fn enable_parse_sql(&mut self, enabled: bool) {
        self.parse_sql = enabled;
    }

    pub fn parse_sql_enabled(&self) -> bool {
        self.parse_sql
    }

    /// Full URL of `endpoint` on the configured server.
    pub fn url(&self, endpoint: Endpoint) -> String {
        self.transport.get_url(endpoint)
    }

    pub fn transport(&self) -> &Arc<dyn HttpTransport> {
        &self.transport
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Run a pull query.
    ///
    /// Returns the result header and a lazy stream of rows. The query text is
    /// checked for emptiness, optionally syntax-checked, then sanitized before
    /// being sent; validation failures never reach the network.
    pub async fn pull(
        &self,
        ctx: &RequestContext,
        mut options: QueryOptions,
    ) -> Result<(PullHeader, RowStream)> {
        self.ensure_open()?;

        if options.empty_query() {
            return Err(ClientError::EmptyQuery);
        }

        if self.parse_sql {
            let errors = self.validator.validate(&options.sql);
            if !errors.is_empty() {
                tracing::debug!(errors = errors.len(), "Pull query failed syntax check");
                return Err(ClientError::Syntax { errors });
            }
        }

        options.sanitize_query();

        let payload = QueryStreamRequest {
            sql: options.sql,
            properties: options.properties,
        };
        let request = build_stream_request(ctx, &*self.transport, &payload)?;
        let start = Instant::now();

        tracing::debug!(sql = %payload.sql, "Sending pull query");

        let response = ctx
            .run(self.transport.execute(request).map_err(ClientError::DoRequest))
            .await?;
        let status = response.status();

        if status != StatusCode::OK {
            let body = read_body(ctx, response).await?;
            return Err(handle_request_error(status, &body));
        }

        let mut reader = FrameReader::new(response, ctx.clone());
        let header = read_header(&mut reader).await?;

        tracing::debug!(
            query_id = ?header.query_id,
            columns = header.column_names.len(),
            duration_ms = %start.elapsed().as_millis(),
            "Pull query started"
        );

        Ok((header, RowStream::new(reader)))
    }

    /// Run a pull query and collect every row.
    pub async fn pull_all(
        &self,
        ctx: &RequestContext,
        options: QueryOptions,
    ) -> Result<(PullHeader, Vec<Row>)> {
        let (header, rows) = self.pull(ctx, options).await?;
        let rows: Vec<Row> = rows.try_collect().await?;
        Ok((header, rows))
    }

    // =========================================================================
    // Statements
    // =========================================================================

    /// Execute one or more statements through `POST /ksql`.
    pub async fn execute(&self, ctx: &RequestContext, sql: &str) -> Result<KsqlResponseSlice> {
        self.execute_with_properties(ctx, sql, HashMap::new()).await
    }

    /// Execute statements with streams properties, e.g. `ksql.streams.auto.offset.reset`.
    pub async fn execute_with_properties(
        &self,
        ctx: &RequestContext,
        sql: &str,
        streams_properties: HashMap<String, String>,
    ) -> Result<KsqlResponseSlice> {
        self.ensure_open()?;

        if sql.trim().is_empty() {
            return Err(ClientError::EmptyQuery);
        }

        let payload = KsqlRequest {
            ksql: sql.to_string(),
            streams_properties,
        };
        let request = build_command_request(ctx, &*self.transport, &payload)?;
        let start = Instant::now();

        let response = ctx
            .run(self.transport.execute(request).map_err(ClientError::DoRequest))
            .await?;
        let body = read_response(ctx, response).await?;

        let value = unmarshal_value(&body)?;
        let responses = KsqlResponseSlice::decode(&value, "")?;

        tracing::debug!(
            statements = responses.len(),
            duration_ms = %start.elapsed().as_millis(),
            "Statements executed"
        );

        Ok(responses)
    }

    // =========================================================================
    // Cluster & Server
    // =========================================================================

    /// Fetch the per-host cluster status snapshot.
    pub async fn get_cluster_status(&self, ctx: &RequestContext) -> Result<ClusterStatus> {
        let status: ClusterStatus = self.get_decoded(ctx, Endpoint::ClusterStatus).await?;
        tracing::debug!(hosts = status.cluster_status.len(), "Cluster status received");
        Ok(status)
    }

    /// Fetch server version and cluster ids.
    pub async fn server_info(&self, ctx: &RequestContext) -> Result<ServerInfo> {
        self.get_decoded(ctx, Endpoint::Info).await
    }

    /// Fetch server health.
    pub async fn health_check(&self, ctx: &RequestContext) -> Result<HealthCheck> {
        self.get_decoded(ctx, Endpoint::HealthCheck).await
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Close the transport. Later calls to `close` do nothing.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.transport.close();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    // =========================================================================
    // Internal
    // =========================================================================

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(ClientError::Closed);
        }
        Ok(())
    }

    /// GET `endpoint`, then decode its body in two stages.
    async fn get_decoded<T: Decode>(&self, ctx: &RequestContext, endpoint: Endpoint) -> Result<T> {
        self.ensure_open()?;

        let url = self.transport.get_url(endpoint);
        let start = Instant::now();

        let body = handle_get_request(ctx, &*self.transport, &url).await?;
        let generic = unmarshal_generic(&body)?;
        let value = decode_into::<T>(generic)?;

        tracing::debug!(
            endpoint = %endpoint,
            duration_ms = %start.elapsed().as_millis(),
            "Response decoded"
        );

        Ok(value)
    }
}

impl Drop for KsqlClient {
    fn drop(&mut self) {
        self.close();
    }
}

/// Read and decode the header frame of a query stream.
async fn read_header(reader: &mut FrameReader) -> Result<PullHeader> {
    let line = reader
        .next_line()
        .await?
        .ok_or_else(|| ClientError::Parse("empty query stream".to_string()))?;

    let generic = unmarshal_generic(&line)?;
    let value = serde_json::Value::Object(generic);
    if is_error_frame(&value) {
        return Err(error_frame(value));
    }

    Ok(PullHeader::decode(&value, "")?)
}

/// Thread-safe shared client.
pub type SharedClient = Arc<KsqlClient>;
