//! Reading and status-checking HTTP responses.

use crate::context::RequestContext;
use crate::error::{ClientError, Result};
use crate::transport::HttpTransport;
use crate::types::ResponseError;
use futures_util::TryFutureExt;
use reqwest::StatusCode;

/// GET `url` through the transport and return the body of a 200 response.
///
/// Transport failures map to [`ClientError::GetRequest`]. Any other status is
/// turned into an error by [`handle_request_error`].
pub(crate) async fn handle_get_request(
    ctx: &RequestContext,
    transport: &dyn HttpTransport,
    url: &str,
) -> Result<Vec<u8>> {
    tracing::debug!(url = %url, "GET request");

    let response = ctx
        .run(transport.get(url).map_err(ClientError::GetRequest))
        .await?;

    read_response(ctx, response).await
}

/// Drain the body of `response`; non-200 statuses become errors.
///
/// The body is released when the response is dropped, on every path.
pub(crate) async fn read_response(
    ctx: &RequestContext,
    response: reqwest::Response,
) -> Result<Vec<u8>> {
    let status = response.status();
    let body = read_body(ctx, response).await?;

    if status != StatusCode::OK {
        return Err(handle_request_error(status, &body));
    }

    tracing::trace!(status = %status, bytes = body.len(), "Response received");
    Ok(body)
}

/// Drain a response body without looking at the status.
pub(crate) async fn read_body(ctx: &RequestContext, response: reqwest::Response) -> Result<Vec<u8>> {
    let bytes = ctx
        .run(response.bytes().map_err(|e| ClientError::BodyRead(e.into())))
        .await?;
    Ok(Vec::from(bytes))
}

/// Error for a non-success response with the given body.
///
/// A body that decodes as a ksqlDB error document is returned as
/// [`ClientError::Server`]; anything else as [`ClientError::ErrorBody`].
pub(crate) fn handle_request_error(status: StatusCode, body: &[u8]) -> ClientError {
    match serde_json::from_slice::<ResponseError>(body) {
        Ok(err) => {
            tracing::warn!(
                status = %status,
                error_code = err.error_code,
                message = %err.message,
                "ksqlDB returned an error"
            );
            ClientError::Server(err)
        }
        Err(e) => {
            tracing::warn!(status = %status, error = %e, "Unreadable error response");
            ClientError::ErrorBody(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &'static str) -> reqwest::Response {
        reqwest::Response::from(
            http::Response::builder()
                .status(status)
                .body(body)
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_ok_body_returned() {
        let body = read_response(&RequestContext::background(), response(200, r#"{"a":1}"#))
            .await
            .unwrap();
        assert_eq!(body, br#"{"a":1}"#);
    }

    #[tokio::test]
    async fn test_server_error_decoded() {
        let err = read_response(
            &RequestContext::background(),
            response(
                400,
                r#"{"@type":"statement_error","error_code":40001,"message":"bad statement"}"#,
            ),
        )
        .await
        .unwrap_err();

        let server = err.server_error().unwrap();
        assert_eq!(server.error_code, 40001);
        assert_eq!(server.error_type, "statement_error");
        assert_eq!(server.message, "bad statement");
    }

    #[tokio::test]
    async fn test_undecodable_error_body() {
        let err = read_response(
            &RequestContext::background(),
            response(502, "<html>bad gateway</html>"),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ClientError::ErrorBody(_)));
        assert!(err.to_string().starts_with("ksqldb error: "));
    }

    #[tokio::test]
    async fn test_non_200_success_is_error() {
        let err = read_response(&RequestContext::background(), response(204, "{}"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Server(_)));
    }

    #[tokio::test]
    async fn test_cancelled_before_read() {
        let ctx = RequestContext::background();
        ctx.cancellation_token().cancel();
        let err = read_response(&ctx, response(200, "{}")).await.unwrap_err();
        assert!(matches!(err, ClientError::Cancelled));
    }
}
