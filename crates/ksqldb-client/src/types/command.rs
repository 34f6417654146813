//! Responses of the command endpoint (`POST /ksql`).
//!
//! The endpoint answers with a JSON array, one entity per statement, each
//! discriminated by `@type`. Decoding reads the discriminator first and then
//! only the payload that belongs to it; a payload key of another variant on the
//! same entity is a decode error.

use crate::decode::{Decode, DecodeError, Fields, JsonMap};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// Ordered sequence of entities as emitted by the server.
pub type KsqlResponseSlice = Vec<KsqlResponse>;

/// Discriminator value and payload key of each known response variant.
const PAYLOAD_KEYS: [(&str, &str); 6] = [
    ("currentStatus", "commandStatus"),
    ("streams", "streams"),
    ("tables", "tables"),
    ("queries", "queries"),
    ("queryDescription", "queryDescription"),
    ("sourceDescription", "sourceDescription"),
];

/// One entity of a command response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KsqlResponse {
    pub statement_text: String,
    pub warnings: Vec<Warning>,
    pub payload: KsqlPayload,
}

impl KsqlResponse {
    /// The `@type` discriminator this entity was decoded from.
    pub fn type_name(&self) -> &str {
        match &self.payload {
            KsqlPayload::CurrentStatus(_) => "currentStatus",
            KsqlPayload::Streams(_) => "streams",
            KsqlPayload::Tables(_) => "tables",
            KsqlPayload::Queries(_) => "queries",
            KsqlPayload::QueryDescription(_) => "queryDescription",
            KsqlPayload::SourceDescription(_) => "sourceDescription",
            KsqlPayload::Other { type_name, .. } => type_name,
        }
    }
}

/// Payload of a command response entity, one case per `@type`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "@type", content = "payload", rename_all = "camelCase")]
pub enum KsqlPayload {
    CurrentStatus(CommandStatusEntity),
    Streams(Vec<Stream>),
    Tables(Vec<Table>),
    Queries(Vec<Query>),
    QueryDescription(QueryDescription),
    SourceDescription(SourceDescription),
    /// A `@type` this client does not model, kept as received.
    Other { type_name: String, body: JsonMap },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Warning {
    pub message: String,
}

/// Result of a DDL/DML statement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandStatusEntity {
    pub command_id: String,
    pub command_status: CommandStatus,
    /// -1 if the operation was unsuccessful
    pub command_sequence_number: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandStatus {
    pub status: String,
    pub message: String,
    pub query_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stream {
    pub name: String,
    pub topic: String,
    pub key_format: String,
    pub value_format: String,
    pub is_windowed: bool,
    #[serde(rename = "type")]
    pub source_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub name: String,
    pub topic: String,
    pub key_format: String,
    pub value_format: String,
    pub is_windowed: bool,
    #[serde(rename = "type")]
    pub source_type: String,
}

/// Entry of `SHOW QUERIES`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    pub id: String,
    pub query_string: String,
    pub sinks: Vec<String>,
    pub sink_kafka_topics: Vec<String>,
    pub query_type: String,
    pub state: String,
}

/// Column schema. Struct, array and map types nest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(rename = "type")]
    pub schema_type: String,
    pub fields: Vec<Field>,
    pub member_schema: Option<Box<Schema>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Field {
    pub name: String,
    pub schema: Schema,
}

/// Result of `EXPLAIN <query id>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryDescription {
    pub id: String,
    pub statement_text: String,
    pub fields: Vec<Field>,
    pub sources: Vec<String>,
    pub sinks: Vec<String>,
    pub execution_plan: String,
    pub topology: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryInfo {
    pub id: String,
    pub query_string: String,
    pub sinks: Vec<String>,
    pub sink_kafka_topics: Vec<String>,
    pub status_count: HashMap<String, i64>,
    pub query_type: String,
    pub state: String,
}

/// Result of `DESCRIBE [EXTENDED] <source>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDescription {
    pub name: String,
    pub read_queries: Vec<QueryInfo>,
    pub write_queries: Vec<QueryInfo>,
    pub fields: Vec<Field>,
    #[serde(rename = "type")]
    pub source_type: String,
    pub timestamp: String,
    pub key_format: String,
    pub value_format: String,
    pub topic: String,
    pub extended: bool,
    pub statistics: String,
    pub error_stats: String,
    pub replication: i32,
    pub partitions: i32,
}

impl Decode for KsqlResponse {
    fn decode(value: &Value, path: &str) -> Result<Self, DecodeError> {
        let fields = Fields::new(value, path)?;
        let type_name: String = fields.require("@type")?;

        if let Some((_, own_key)) = PAYLOAD_KEYS.iter().find(|(name, _)| *name == type_name) {
            let foreign: Vec<&str> = PAYLOAD_KEYS
                .iter()
                .map(|(_, key)| *key)
                .filter(|key| key != own_key)
                .collect();
            fields.reject_any(&foreign)?;
        }

        let payload = match decode_payload(&type_name, &fields)? {
            Some(payload) => payload,
            None => KsqlPayload::Other {
                body: fields.to_map(),
                type_name,
            },
        };

        Ok(Self {
            statement_text: fields.get("statementText")?,
            warnings: fields.get("warnings")?,
            payload,
        })
    }
}

fn decode_payload(
    type_name: &str,
    fields: &Fields<'_>,
) -> Result<Option<KsqlPayload>, DecodeError> {
    let payload = match type_name {
        "currentStatus" => KsqlPayload::CurrentStatus(CommandStatusEntity {
            command_id: fields.get("commandId")?,
            command_status: fields.require("commandStatus")?,
            command_sequence_number: fields.get("commandSequenceNumber")?,
        }),
        "streams" => KsqlPayload::Streams(fields.get("streams")?),
        "tables" => KsqlPayload::Tables(fields.get("tables")?),
        "queries" => KsqlPayload::Queries(fields.get("queries")?),
        "queryDescription" => KsqlPayload::QueryDescription(fields.require("queryDescription")?),
        "sourceDescription" => {
            KsqlPayload::SourceDescription(fields.require("sourceDescription")?)
        }
        _ => return Ok(None),
    };
    Ok(Some(payload))
}

impl Decode for Warning {
    fn decode(value: &Value, path: &str) -> Result<Self, DecodeError> {
        // Older servers send bare strings.
        if let Value::String(message) = value {
            return Ok(Self {
                message: message.clone(),
            });
        }
        let fields = Fields::new(value, path)?;
        Ok(Self {
            message: fields.get("message")?,
        })
    }
}

impl Decode for CommandStatus {
    fn decode(value: &Value, path: &str) -> Result<Self, DecodeError> {
        let fields = Fields::new(value, path)?;
        Ok(Self {
            status: fields.get("status")?,
            message: fields.get("message")?,
            query_id: fields.get("queryId")?,
        })
    }
}

impl Decode for Stream {
    fn decode(value: &Value, path: &str) -> Result<Self, DecodeError> {
        let fields = Fields::new(value, path)?;
        Ok(Self {
            name: fields.get("name")?,
            topic: fields.get("topic")?,
            key_format: fields.get("keyFormat")?,
            value_format: value_format(&fields)?,
            is_windowed: fields.get("isWindowed")?,
            source_type: fields.get("type")?,
        })
    }
}

impl Decode for Table {
    fn decode(value: &Value, path: &str) -> Result<Self, DecodeError> {
        let fields = Fields::new(value, path)?;
        Ok(Self {
            name: fields.get("name")?,
            topic: fields.get("topic")?,
            key_format: fields.get("keyFormat")?,
            value_format: value_format(&fields)?,
            is_windowed: fields.get("isWindowed")?,
            source_type: fields.get("type")?,
        })
    }
}

/// `valueFormat`, or the single `format` field older servers send.
fn value_format(fields: &Fields<'_>) -> Result<String, DecodeError> {
    if fields.contains("valueFormat") {
        fields.get("valueFormat")
    } else {
        fields.get("format")
    }
}

impl Decode for Query {
    fn decode(value: &Value, path: &str) -> Result<Self, DecodeError> {
        let fields = Fields::new(value, path)?;
        Ok(Self {
            id: fields.get("id")?,
            query_string: fields.get("queryString")?,
            sinks: fields.get("sinks")?,
            sink_kafka_topics: fields.get("sinkKafkaTopics")?,
            query_type: fields.get("queryType")?,
            state: fields.get("state")?,
        })
    }
}

impl Decode for Schema {
    fn decode(value: &Value, path: &str) -> Result<Self, DecodeError> {
        let fields = Fields::new(value, path)?;
        Ok(Self {
            schema_type: fields.get("type")?,
            fields: fields.get("fields")?,
            member_schema: fields.get("memberSchema")?,
        })
    }
}

impl Decode for Field {
    fn decode(value: &Value, path: &str) -> Result<Self, DecodeError> {
        let fields = Fields::new(value, path)?;
        Ok(Self {
            name: fields.get("name")?,
            schema: fields.get("schema")?,
        })
    }
}

impl Decode for QueryDescription {
    fn decode(value: &Value, path: &str) -> Result<Self, DecodeError> {
        let fields = Fields::new(value, path)?;
        Ok(Self {
            id: fields.get("id")?,
            statement_text: fields.get("statementText")?,
            fields: fields.get("fields")?,
            sources: fields.get("sources")?,
            sinks: fields.get("sinks")?,
            execution_plan: fields.get("executionPlan")?,
            topology: fields.get("topology")?,
        })
    }
}

impl Decode for QueryInfo {
    fn decode(value: &Value, path: &str) -> Result<Self, DecodeError> {
        let fields = Fields::new(value, path)?;
        Ok(Self {
            id: fields.get("id")?,
            query_string: fields.get("queryString")?,
            sinks: fields.get("sinks")?,
            sink_kafka_topics: fields.get("sinkKafkaTopics")?,
            status_count: fields.get("statusCount")?,
            query_type: fields.get("queryType")?,
            state: fields.get("state")?,
        })
    }
}

impl Decode for SourceDescription {
    fn decode(value: &Value, path: &str) -> Result<Self, DecodeError> {
        let fields = Fields::new(value, path)?;
        Ok(Self {
            name: fields.get("name")?,
            read_queries: fields.get("readQueries")?,
            write_queries: fields.get("writeQueries")?,
            fields: fields.get("fields")?,
            source_type: fields.get("type")?,
            timestamp: fields.get("timestamp")?,
            key_format: fields.get("keyFormat")?,
            value_format: value_format(&fields)?,
            topic: fields.get("topic")?,
            extended: fields.get("extended")?,
            statistics: fields.get("statistics")?,
            error_stats: fields.get("errorStats")?,
            replication: fields.get("replication")?,
            partitions: fields.get("partitions")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::DecodeReason;
    use serde_json::json;

    fn decode_slice(value: Value) -> Result<KsqlResponseSlice, DecodeError> {
        Vec::<KsqlResponse>::decode(&value, "")
    }

    #[test]
    fn test_current_status() {
        let responses = decode_slice(json!([{
            "@type": "currentStatus",
            "statementText": "CREATE STREAM s (id INT) WITH (kafka_topic='s', value_format='JSON');",
            "commandId": "stream/`S`/create",
            "commandStatus": {"status": "SUCCESS", "message": "Stream created"},
            "commandSequenceNumber": 2,
            "warnings": []
        }]))
        .unwrap();

        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].type_name(), "currentStatus");
        match &responses[0].payload {
            KsqlPayload::CurrentStatus(entity) => {
                assert_eq!(entity.command_id, "stream/`S`/create");
                assert_eq!(entity.command_status.status, "SUCCESS");
                assert_eq!(entity.command_sequence_number, 2);
            }
            other => panic!("Expected CurrentStatus, got: {:?}", other),
        }
    }

    #[test]
    fn test_streams_and_order_preserved() {
        let responses = decode_slice(json!([
            {
                "@type": "streams",
                "statementText": "SHOW STREAMS;",
                "streams": [
                    {"type": "STREAM", "name": "PAGEVIEWS", "topic": "pageviews",
                     "keyFormat": "KAFKA", "valueFormat": "JSON", "isWindowed": false}
                ],
                "warnings": [{"message": "deprecated"}]
            },
            {
                "@type": "tables",
                "statementText": "SHOW TABLES;",
                "tables": [
                    {"type": "TABLE", "name": "USERS", "topic": "users",
                     "format": "AVRO", "isWindowed": true}
                ]
            }
        ]))
        .unwrap();

        assert_eq!(responses[0].type_name(), "streams");
        assert_eq!(responses[0].warnings[0].message, "deprecated");
        match &responses[0].payload {
            KsqlPayload::Streams(streams) => {
                assert_eq!(streams[0].name, "PAGEVIEWS");
                assert_eq!(streams[0].value_format, "JSON");
                assert_eq!(streams[0].source_type, "STREAM");
            }
            other => panic!("Expected Streams, got: {:?}", other),
        }
        match &responses[1].payload {
            KsqlPayload::Tables(tables) => {
                assert_eq!(tables[0].value_format, "AVRO");
                assert!(tables[0].is_windowed);
            }
            other => panic!("Expected Tables, got: {:?}", other),
        }
    }

    #[test]
    fn test_source_description() {
        let responses = decode_slice(json!([{
            "@type": "sourceDescription",
            "statementText": "DESCRIBE USERS;",
            "sourceDescription": {
                "name": "USERS",
                "readQueries": [],
                "writeQueries": [{"id": "CTAS_USERS_1", "queryString": "CREATE TABLE ...",
                                  "sinks": ["USERS"], "statusCount": {"RUNNING": 1}}],
                "fields": [
                    {"name": "ID", "schema": {"type": "STRING"}},
                    {"name": "TAGS", "schema": {"type": "ARRAY", "memberSchema": {"type": "STRING"}}}
                ],
                "type": "TABLE",
                "topic": "users",
                "partitions": 6,
                "replication": 1
            }
        }]))
        .unwrap();

        match &responses[0].payload {
            KsqlPayload::SourceDescription(desc) => {
                assert_eq!(desc.name, "USERS");
                assert_eq!(desc.partitions, 6);
                assert_eq!(desc.write_queries[0].status_count["RUNNING"], 1);
                let member = desc.fields[1].schema.member_schema.as_ref().unwrap();
                assert_eq!(member.schema_type, "STRING");
            }
            other => panic!("Expected SourceDescription, got: {:?}", other),
        }
    }

    #[test]
    fn test_foreign_payload_rejected() {
        let err = decode_slice(json!([{
            "@type": "streams",
            "streams": [],
            "tables": []
        }]))
        .unwrap_err();

        assert_eq!(err.path, "[0]");
        assert_eq!(err.reason, DecodeReason::Unexpected("tables".to_string()));
    }

    #[test]
    fn test_missing_discriminator() {
        let err = decode_slice(json!([{"streams": []}])).unwrap_err();
        assert_eq!(err.path, "[0].@type");
        assert_eq!(err.reason, DecodeReason::Missing);
    }

    #[test]
    fn test_unknown_type_kept() {
        let responses = decode_slice(json!([{
            "@type": "properties",
            "statementText": "SHOW PROPERTIES;",
            "properties": [{"name": "ksql.streams.num.stream.threads", "value": "4"}]
        }]))
        .unwrap();

        assert_eq!(responses[0].type_name(), "properties");
        match &responses[0].payload {
            KsqlPayload::Other { body, .. } => assert!(body.contains_key("properties")),
            other => panic!("Expected Other, got: {:?}", other),
        }
    }

    #[test]
    fn test_legacy_string_warnings() {
        let responses = decode_slice(json!([{
            "@type": "queries",
            "queries": [{"id": "Q1", "queryString": "SELECT 1;", "sinks": ["S"]}],
            "warnings": ["plain text"]
        }]))
        .unwrap();

        assert_eq!(responses[0].warnings[0].message, "plain text");
    }
}
