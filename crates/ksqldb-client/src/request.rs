//! Construction of outbound POST requests.

use crate::constants::{Endpoint, DELIMITED_CONTENT_TYPE, KSQL_CONTENT_TYPE};
use crate::context::RequestContext;
use crate::error::{ClientError, Result};
use crate::transport::HttpTransport;
use reqwest::header::{HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, Request, Url};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

/// Added to the context deadline so the context, not the HTTP client, times out.
const DEADLINE_GRACE: Duration = Duration::from_secs(1);

/// Body of `POST /ksql`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KsqlRequest {
    pub ksql: String,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub streams_properties: HashMap<String, String>,
}

/// Body of `POST /query-stream`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueryStreamRequest {
    pub sql: String,
    pub properties: HashMap<String, String>,
}

/// Build a `POST /ksql` statement request.
pub(crate) fn build_command_request(
    ctx: &RequestContext,
    transport: &dyn HttpTransport,
    payload: &KsqlRequest,
) -> Result<Request> {
    build_post_request(ctx, transport, Endpoint::Ksql, payload, KSQL_CONTENT_TYPE, KSQL_CONTENT_TYPE)
}

/// Build a `POST /query-stream` request asking for the delimited row format.
pub(crate) fn build_stream_request(
    ctx: &RequestContext,
    transport: &dyn HttpTransport,
    payload: &QueryStreamRequest,
) -> Result<Request> {
    build_post_request(
        ctx,
        transport,
        Endpoint::QueryStream,
        payload,
        "application/json",
        DELIMITED_CONTENT_TYPE,
    )
}

/// Serialize `payload` and build a POST to `endpoint`.
///
/// The `Authorization` header is only set when the transport supplies non-empty
/// credentials. A deadline on `ctx` becomes the request timeout, set slightly
/// later so an expired call reports [`ClientError::Timeout`].
pub(crate) fn build_post_request<P: Serialize>(
    ctx: &RequestContext,
    transport: &dyn HttpTransport,
    endpoint: Endpoint,
    payload: &P,
    content_type: &'static str,
    accept: &'static str,
) -> Result<Request> {
    if ctx.is_cancelled() {
        return Err(ClientError::Cancelled);
    }

    let body = serde_json::to_vec(payload).map_err(ClientError::Serialization)?;

    let raw_url = transport.get_url(endpoint);
    let url = Url::parse(&raw_url).map_err(|e| ClientError::RequestBuild(e.to_string()))?;

    let mut request = Request::new(Method::POST, url);
    let headers = request.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(ACCEPT, HeaderValue::from_static(accept));

    if let Some(credentials) = transport.basic_auth().filter(|c| !c.is_empty()) {
        let value = HeaderValue::from_str(&format!("Basic {}", credentials))
            .map_err(|e| ClientError::RequestBuild(e.to_string()))?;
        headers.insert(AUTHORIZATION, value);
    }

    *request.body_mut() = Some(body.into());

    if let Some(remaining) = ctx.remaining() {
        *request.timeout_mut() = Some(remaining + DEADLINE_GRACE);
    }

    tracing::debug!(url = %request.url(), endpoint = %endpoint, "Built request");
    Ok(request)
}
