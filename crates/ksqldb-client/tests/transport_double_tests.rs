//! Client behavior over an in-memory transport.
//!
//! These tests verify:
//! - Transport failures surface with their fixed messages
//! - The transport is closed exactly once, on success and failure paths
//! - Validation failures never reach the transport

use async_trait::async_trait;
use futures_util::TryStreamExt;
use ksqldb_client::{
    BoxError, ClientError, Endpoint, HttpTransport, KsqlClient, QueryOptions, RequestContext,
    SharedClient, SqlSyntaxError, SqlValidator,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ============================================================================
// Test Helpers
// ============================================================================

/// Canned reply: `None` makes the call fail with the transport error "error"
type Reply = Option<(u16, &'static str)>;

#[derive(Default)]
struct CountingTransport {
    get_reply: Reply,
    execute_reply: Reply,
    gets: AtomicUsize,
    executes: AtomicUsize,
    closes: AtomicUsize,
}

impl CountingTransport {
    fn replying_to_get(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            get_reply: reply,
            ..Default::default()
        })
    }

    fn replying_to_execute(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            execute_reply: reply,
            ..Default::default()
        })
    }

    fn calls(&self) -> usize {
        self.gets.load(Ordering::SeqCst) + self.executes.load(Ordering::SeqCst)
    }

    fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

fn respond(reply: Reply) -> Result<reqwest::Response, BoxError> {
    match reply {
        Some((status, body)) => Ok(reqwest::Response::from(
            http::Response::builder().status(status).body(body).unwrap(),
        )),
        None => Err("error".into()),
    }
}

#[async_trait]
impl HttpTransport for CountingTransport {
    fn get_url(&self, endpoint: Endpoint) -> String {
        format!("http://localhost{}", endpoint.path())
    }

    async fn get(&self, _url: &str) -> Result<reqwest::Response, BoxError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        respond(self.get_reply)
    }

    async fn execute(&self, _request: reqwest::Request) -> Result<reqwest::Response, BoxError> {
        self.executes.fetch_add(1, Ordering::SeqCst);
        respond(self.execute_reply)
    }

    fn basic_auth(&self) -> Option<String> {
        None
    }

    fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

fn client_over(transport: &Arc<CountingTransport>) -> KsqlClient {
    KsqlClient::with_transport(transport.clone())
}

// ============================================================================
// Cluster Status Tests
// ============================================================================

#[tokio::test]
async fn test_get_failure_message_and_close() {
    let transport = CountingTransport::replying_to_get(None);
    let client = client_over(&transport);

    let err = client
        .get_cluster_status(&RequestContext::background())
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "ksqldb get request failed: error");
    assert_eq!(transport.closes(), 0);

    drop(client);
    assert_eq!(transport.closes(), 1);
}

#[tokio::test]
async fn test_parse_error_closes_once() {
    let transport = CountingTransport::replying_to_get(Some((200, "true")));
    let client = client_over(&transport);

    let result = client.get_cluster_status(&RequestContext::background()).await;
    assert!(matches!(result, Err(ClientError::Parse(_))));

    client.close();
    client.close();
    drop(client);
    assert_eq!(transport.closes(), 1);
}

#[tokio::test]
async fn test_cluster_status_success() {
    let transport = CountingTransport::replying_to_get(Some((
        200,
        r#"{"clusterStatus": {"localhost:8088": {"hostAlive": true, "lastStatusUpdateMs": 1617609098808}}}"#,
    )));
    let client = client_over(&transport);

    let status = client
        .get_cluster_status(&RequestContext::background())
        .await
        .unwrap();

    assert_eq!(status.alive_hosts(), vec!["localhost:8088"]);
    assert_eq!(transport.gets.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_concurrent_calls_share_client() {
    let transport = CountingTransport::replying_to_get(Some((200, r#"{"clusterStatus": {}}"#)));
    let client: SharedClient = Arc::new(client_over(&transport));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move {
                client
                    .get_cluster_status(&RequestContext::background())
                    .await
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }

    assert_eq!(transport.gets.load(Ordering::SeqCst), 4);
    drop(client);
    assert_eq!(transport.closes(), 1);
}

// ============================================================================
// Pull Query Tests
// ============================================================================

#[tokio::test]
async fn test_pull_transport_failure_message() {
    let transport = CountingTransport::replying_to_execute(None);
    let client = client_over(&transport);

    let err = client
        .pull(
            &RequestContext::background(),
            QueryOptions::new("select * from bla;"),
        )
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "can't do request: error");
    assert!(matches!(err, ClientError::DoRequest(_)));
}

#[tokio::test]
async fn test_pull_empty_query_makes_no_call() {
    let transport = CountingTransport::replying_to_execute(None);
    let client = client_over(&transport);

    let err = client
        .pull(&RequestContext::background(), QueryOptions::new(""))
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::EmptyQuery));
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn test_pull_syntax_error_makes_no_call() {
    let transport = CountingTransport::replying_to_execute(None);
    let mut client = client_over(&transport);
    client.enable_parse_sql(true);

    let err = client
        .pull(
            &RequestContext::background(),
            QueryOptions::new("select * from bla"),
        )
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "1 sql syntax error(s) found");
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn test_pull_syntax_ok_reaches_transport() {
    let transport = CountingTransport::replying_to_execute(None);
    let mut client = client_over(&transport);
    client.enable_parse_sql(true);

    let err = client
        .pull(
            &RequestContext::background(),
            QueryOptions::new("select * from bla;"),
        )
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "can't do request: error");
    assert_eq!(transport.executes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_pull_custom_validator() {
    struct RejectAll;

    impl SqlValidator for RejectAll {
        fn validate(&self, _sql: &str) -> Vec<SqlSyntaxError> {
            vec![SqlSyntaxError::new("first"), SqlSyntaxError::new("second")]
        }
    }

    let transport = CountingTransport::replying_to_execute(None);
    let mut client = client_over(&transport).with_validator(RejectAll);
    client.enable_parse_sql(true);

    let err = client
        .pull(
            &RequestContext::background(),
            QueryOptions::new("select * from bla;"),
        )
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "2 sql syntax error(s) found");
    match err {
        ClientError::Syntax { errors } => assert_eq!(errors[1].message, "second"),
        other => panic!("Expected Syntax, got: {:?}", other),
    }
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn test_pull_rows_from_double() {
    let transport = CountingTransport::replying_to_execute(Some((
        200,
        "{\"queryId\":\"q1\",\"columnNames\":[\"ID\"],\"columnTypes\":[\"STRING\"]}\n[\"a\"]\n\n[\"b\"]\n",
    )));
    let client = client_over(&transport);

    let (header, rows) = client
        .pull(
            &RequestContext::background(),
            QueryOptions::new("select * from t;"),
        )
        .await
        .unwrap();
    let rows: Vec<_> = rows.try_collect().await.unwrap();

    assert_eq!(header.query_id.as_deref(), Some("q1"));
    assert_eq!(rows, vec![vec![serde_json::json!("a")], vec![serde_json::json!("b")]]);
}

#[tokio::test]
async fn test_cancelled_context_makes_no_call() {
    let transport = CountingTransport::replying_to_get(None);
    let client = client_over(&transport);

    let ctx = RequestContext::background();
    ctx.cancellation_token().cancel();

    let err = client.get_cluster_status(&ctx).await.unwrap_err();
    assert!(err.is_cancellation());

    let err = client
        .pull(&ctx, QueryOptions::new("select * from t;"))
        .await
        .unwrap_err();
    assert!(err.is_cancellation());
    assert_eq!(transport.calls(), 0);
}

// ============================================================================
// Statement Tests
// ============================================================================

#[tokio::test]
async fn test_execute_transport_failure_message() {
    let transport = CountingTransport::replying_to_execute(None);
    let client = client_over(&transport);

    let err = client
        .execute(&RequestContext::background(), "LIST STREAMS;")
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "can't do request: error");
}

#[tokio::test]
async fn test_execute_unknown_type_kept() {
    let transport = CountingTransport::replying_to_execute(Some((
        200,
        r#"[{"@type": "kafka_topics", "statementText": "LIST TOPICS;", "topics": [{"name": "t"}]}]"#,
    )));
    let client = client_over(&transport);

    let responses = client
        .execute(&RequestContext::background(), "LIST TOPICS;")
        .await
        .unwrap();

    assert_eq!(responses[0].type_name(), "kafka_topics");
    assert_eq!(responses[0].statement_text, "LIST TOPICS;");
}
