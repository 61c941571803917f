// Record transform: doubles one numeric field of every record in a list.

use serde::Deserialize;
use serde_json::{Number, Value};
use thiserror::Error;
use tracing::debug;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum ProcessError {
    #[error("expected a list of records, got {found}")]
    NotAList { found: &'static str },

    #[error("record {index} is not an object (got {found})")]
    NotARecord { index: usize, found: &'static str },

    #[error("record {index} has no `{field}` field")]
    MissingField { index: usize, field: String },

    #[error("record {index}: `{field}` is not a number (got {found})")]
    NotNumeric {
        index: usize,
        field: String,
        found: &'static str,
    },

    #[error("record {index}: doubled value is out of range")]
    Overflow { index: usize },
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// The `[processor]` section of snippet.toml.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Name of the record field to double.
    pub field: String,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            field: "value".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// DataProcessor
// ---------------------------------------------------------------------------

/// Maps a JSON list of records to the list of their doubled field values.
#[derive(Debug, Clone, Default)]
pub struct DataProcessor {
    config: ProcessorConfig,
}

impl DataProcessor {
    pub fn new(config: ProcessorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Double the configured field of every record in `data`.
    ///
    /// `data` must be a JSON array of objects whose field holds a number.
    /// Output order and length match the input. Integers are doubled with
    /// checked arithmetic and stay integers; floats stay floats. The first
    /// invalid record aborts the transform with its index.
    pub fn process(&self, data: &Value) -> Result<Vec<Number>, ProcessError> {
        let items = data.as_array().ok_or(ProcessError::NotAList {
            found: json_kind(data),
        })?;

        let field = self.config.field.as_str();
        let out = items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let record = item.as_object().ok_or(ProcessError::NotARecord {
                    index,
                    found: json_kind(item),
                })?;
                let value = record.get(field).ok_or_else(|| ProcessError::MissingField {
                    index,
                    field: field.to_string(),
                })?;
                let Value::Number(n) = value else {
                    return Err(ProcessError::NotNumeric {
                        index,
                        field: field.to_string(),
                        found: json_kind(value),
                    });
                };
                double(n).ok_or(ProcessError::Overflow { index })
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(records = out.len(), field, "processed records");
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Multiply a JSON number by two, keeping its integer/float representation.
fn double(n: &Number) -> Option<Number> {
    if let Some(u) = n.as_u64() {
        u.checked_mul(2).map(Number::from)
    } else if let Some(i) = n.as_i64() {
        i.checked_mul(2).map(Number::from)
    } else {
        n.as_f64().and_then(|f| Number::from_f64(f * 2.0))
    }
}

/// Human-readable name of a JSON value's kind, for error messages.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
