//! Cluster status snapshot returned by `GET /clusterStatus`.
//!
//! All map keys (host addresses, query ids, store names, partition numbers) are
//! server-assigned and kept exactly as received.

use crate::decode::{Decode, DecodeError, Fields};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// Per-host view of the cluster at the moment of the call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterStatus {
    /// Host address (`host:port`) -> status
    pub cluster_status: HashMap<String, HostStatus>,
}

impl ClusterStatus {
    /// Host addresses, sorted.
    pub fn hosts(&self) -> Vec<&str> {
        let mut hosts: Vec<&str> = self.cluster_status.keys().map(String::as_str).collect();
        hosts.sort_unstable();
        hosts
    }

    /// Host addresses reported alive, sorted.
    pub fn alive_hosts(&self) -> Vec<&str> {
        let mut hosts: Vec<&str> = self
            .cluster_status
            .iter()
            .filter(|(_, status)| status.host_alive)
            .map(|(host, _)| host.as_str())
            .collect();
        hosts.sort_unstable();
        hosts
    }

    pub fn host(&self, address: &str) -> Option<&HostStatus> {
        self.cluster_status.get(address)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostStatus {
    pub host_alive: bool,
    pub last_status_update_ms: i64,
    /// Query id -> active/standby assignment on this host
    pub active_standby_per_query: HashMap<String, QueryStandbyInfo>,
    pub host_store_lags: HostStoreLags,
}

impl HostStatus {
    pub fn last_status_update(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.last_status_update_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryStandbyInfo {
    pub active_stores: Vec<String>,
    pub active_partitions: Vec<TopicPartition>,
    pub stand_by_stores: Vec<String>,
    pub stand_by_partitions: Vec<TopicPartition>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct TopicPartition {
    pub topic: String,
    pub partition: i32,
}

impl TopicPartition {
    pub fn new(topic: impl Into<String>, partition: i32) -> Self {
        Self {
            topic: topic.into(),
            partition,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostStoreLags {
    /// State store key -> lag
    pub state_store_lags: HashMap<String, StoreLag>,
    pub update_time_ms: i64,
}

impl HostStoreLags {
    pub fn update_time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.update_time_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreLag {
    /// Stringified partition number -> lag
    pub lag_by_partition: HashMap<String, PartitionLag>,
    pub size: i64,
}

impl StoreLag {
    /// Sum of `offset_lag` over all partitions.
    pub fn total_offset_lag(&self) -> i64 {
        self.lag_by_partition.values().map(|l| l.offset_lag).sum()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionLag {
    pub current_offset_position: i64,
    pub end_offset_position: i64,
    pub offset_lag: i64,
}

impl Decode for ClusterStatus {
    fn decode(value: &Value, path: &str) -> Result<Self, DecodeError> {
        let fields = Fields::new(value, path)?;
        Ok(Self {
            cluster_status: fields.get("clusterStatus")?,
        })
    }
}

impl Decode for HostStatus {
    fn decode(value: &Value, path: &str) -> Result<Self, DecodeError> {
        let fields = Fields::new(value, path)?;
        Ok(Self {
            host_alive: fields.get("hostAlive")?,
            last_status_update_ms: fields.get("lastStatusUpdateMs")?,
            active_standby_per_query: fields.get("activeStandbyPerQuery")?,
            host_store_lags: fields.get("hostStoreLags")?,
        })
    }
}

impl Decode for QueryStandbyInfo {
    fn decode(value: &Value, path: &str) -> Result<Self, DecodeError> {
        let fields = Fields::new(value, path)?;
        Ok(Self {
            active_stores: fields.get("activeStores")?,
            active_partitions: fields.get("activePartitions")?,
            stand_by_stores: fields.get("standByStores")?,
            stand_by_partitions: fields.get("standByPartitions")?,
        })
    }
}

impl Decode for TopicPartition {
    fn decode(value: &Value, path: &str) -> Result<Self, DecodeError> {
        let fields = Fields::new(value, path)?;
        Ok(Self {
            topic: fields.get("topic")?,
            partition: fields.get("partition")?,
        })
    }
}

impl Decode for HostStoreLags {
    fn decode(value: &Value, path: &str) -> Result<Self, DecodeError> {
        let fields = Fields::new(value, path)?;
        Ok(Self {
            state_store_lags: fields.get("stateStoreLags")?,
            update_time_ms: fields.get("updateTimeMs")?,
        })
    }
}

impl Decode for StoreLag {
    fn decode(value: &Value, path: &str) -> Result<Self, DecodeError> {
        let fields = Fields::new(value, path)?;
        Ok(Self {
            lag_by_partition: fields.get("lagByPartition")?,
            size: fields.get("size")?,
        })
    }
}

impl Decode for PartitionLag {
    fn decode(value: &Value, path: &str) -> Result<Self, DecodeError> {
        let fields = Fields::new(value, path)?;
        Ok(Self {
            current_offset_position: fields.get("currentOffsetPosition")?,
            end_offset_position: fields.get("endOffsetPosition")?,
            offset_lag: fields.get("offsetLag")?,
        })
    }
}
