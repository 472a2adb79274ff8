//! CSV backend
//!
//! Data is a JSON array of rows. With a header, rows are objects keyed by
//! column name; without one, rows are arrays. Fields are read back as
//! strings.

use super::{Seed, StorageBackend};
use crate::data_node::DataNode;
use crate::error::DataError;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use weft_model::{DataNodeId, Properties};

/// Tag of this backend
pub const STORAGE_TYPE: &str = "csv";

/// Required property: file path
pub const PATH_PROPERTY: &str = "path";

/// Optional property: first row is a header (default `true`)
pub const HAS_HEADER_PROPERTY: &str = "has_header";

/// Backend reading and writing CSV files
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvBackend;

impl CsvBackend {
    /// Create backend
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn path(node: &DataNode) -> Result<&str, DataError> {
        node.properties()
            .get(PATH_PROPERTY)
            .and_then(Value::as_str)
            .ok_or_else(|| DataError::missing(STORAGE_TYPE, PATH_PROPERTY))
    }

    fn has_header(node: &DataNode) -> bool {
        node.properties()
            .get(HAS_HEADER_PROPERTY)
            .and_then(Value::as_bool)
            .unwrap_or(true)
    }

    fn unsupported(reason: impl Into<String>) -> DataError {
        DataError::UnsupportedData {
            storage_type: STORAGE_TYPE.to_string(),
            reason: reason.into(),
        }
    }
}

impl StorageBackend for CsvBackend {
    fn storage_type(&self) -> &str {
        STORAGE_TYPE
    }

    fn init(&self, _id: &DataNodeId, properties: &mut Properties) -> Result<Seed, DataError> {
        let path = properties
            .get(PATH_PROPERTY)
            .and_then(Value::as_str)
            .ok_or_else(|| DataError::missing(STORAGE_TYPE, PATH_PROPERTY))?;
        let existing = Path::new(path).is_file();

        properties
            .entry(HAS_HEADER_PROPERTY.to_string())
            .or_insert(Value::Bool(true));

        Ok(if existing { Seed::Existing } else { Seed::Empty })
    }

    fn read(&self, node: &DataNode) -> Result<Value, DataError> {
        let path = Self::path(node)?;
        let has_header = Self::has_header(node);

        let mut reader = match ::csv::ReaderBuilder::new()
            .has_headers(has_header)
            .from_path(path)
        {
            Ok(reader) => reader,
            Err(e) if matches!(e.kind(), ::csv::ErrorKind::Io(io) if io.kind() == std::io::ErrorKind::NotFound) => {
                return Err(DataError::NoData(node.id().to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let headers = if has_header {
            Some(reader.headers()?.clone())
        } else {
            None
        };

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let row = match &headers {
                Some(headers) => Value::Object(
                    headers
                        .iter()
                        .zip(record.iter())
                        .map(|(name, field)| (name.to_string(), Value::String(field.to_string())))
                        .collect::<Map<_, _>>(),
                ),
                None => Value::Array(record.iter().map(|f| Value::String(f.to_string())).collect()),
            };
            rows.push(row);
        }
        Ok(Value::Array(rows))
    }

    fn write(&self, node: &DataNode, data: &Value) -> Result<(), DataError> {
        let path = Self::path(node)?;
        let rows = data
            .as_array()
            .ok_or_else(|| Self::unsupported("non-array data"))?;

        if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| DataError::io(parent, e))?;
        }
        let mut writer = ::csv::WriterBuilder::new().flexible(true).from_path(path)?;

        let columns: Option<Vec<String>> = match rows.first() {
            Some(Value::Object(first)) => Some(first.keys().cloned().collect()),
            _ => None,
        };
        if let (Some(columns), true) = (&columns, Self::has_header(node)) {
            writer.write_record(columns)?;
        }

        for row in rows {
            let fields: Vec<String> = match (row, &columns) {
                (Value::Object(map), Some(columns)) => columns
                    .iter()
                    .map(|c| map.get(c).map(field_text).unwrap_or_default())
                    .collect(),
                (Value::Array(values), None) => values.iter().map(field_text).collect(),
                _ => return Err(Self::unsupported("rows mixing objects and arrays")),
            };
            writer.write_record(&fields)?;
        }
        writer.flush().map_err(|e| DataError::io(path, e))?;

        tracing::debug!(id = %node.id(), rows = rows.len(), path, "Wrote csv data");
        Ok(())
    }
}

fn field_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
