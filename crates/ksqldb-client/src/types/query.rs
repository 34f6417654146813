//! Frames of the `/query-stream` response.

use crate::decode::{Decode, DecodeError, Fields};
use serde::Serialize;
use serde_json::Value;

/// One result row, values in column order.
pub type Row = Vec<Value>;

/// First frame of a query stream: the result schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PullHeader {
    /// Only set for push queries and scalable pull queries
    pub query_id: Option<String>,
    pub column_names: Vec<String>,
    pub column_types: Vec<String>,
}

impl PullHeader {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.column_names.iter().position(|c| c == name)
    }

    /// Value of column `name` in `row`.
    pub fn value<'r>(&self, row: &'r Row, name: &str) -> Option<&'r Value> {
        row.get(self.column_index(name)?)
    }
}

impl Decode for PullHeader {
    fn decode(value: &Value, path: &str) -> Result<Self, DecodeError> {
        let fields = Fields::new(value, path)?;
        Ok(Self {
            query_id: fields.get("queryId")?,
            column_names: fields.get("columnNames")?,
            column_types: fields.get("columnTypes")?,
        })
    }
}
