//! Server metadata: `GET /info` and `GET /healthcheck`.

use crate::decode::{Decode, DecodeError, Fields};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// Contents of the `KsqlServerInfo` object returned by `/info`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    pub version: String,
    pub kafka_cluster_id: String,
    pub ksql_service_id: String,
    pub server_status: String,
}

impl Decode for ServerInfo {
    fn decode(value: &Value, path: &str) -> Result<Self, DecodeError> {
        let outer = Fields::new(value, path)?;
        let inner_path = crate::decode::field_path(path, "KsqlServerInfo");
        let info = match outer.raw("KsqlServerInfo") {
            Some(inner) => inner,
            None => return Err(DecodeError::missing(&inner_path)),
        };
        let fields = Fields::new(info, &inner_path)?;
        Ok(Self {
            version: fields.get("version")?,
            kafka_cluster_id: fields.get("kafkaClusterId")?,
            ksql_service_id: fields.get("ksqlServiceId")?,
            server_status: fields.get("serverStatus")?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheck {
    pub is_healthy: bool,
    /// Subsystem (`metastore`, `kafka`, ...) -> health
    pub details: HashMap<String, HealthCheckDetail>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckDetail {
    pub is_healthy: bool,
}

impl Decode for HealthCheck {
    fn decode(value: &Value, path: &str) -> Result<Self, DecodeError> {
        let fields = Fields::new(value, path)?;
        Ok(Self {
            is_healthy: fields.get("isHealthy")?,
            details: fields.get("details")?,
        })
    }
}

impl Decode for HealthCheckDetail {
    fn decode(value: &Value, path: &str) -> Result<Self, DecodeError> {
        let fields = Fields::new(value, path)?;
        Ok(Self {
            is_healthy: fields.get("isHealthy")?,
        })
    }
}
