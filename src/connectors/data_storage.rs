// Copyright © 2024 Pathway

use std::any::type_name;
use std::borrow::Cow;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::info;
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::engine::error::{DynError, Error as EngineError};
use crate::engine::value::CompoundType;
use crate::engine::{Dataset, Key, Record, Schema, Value};

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ReadError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("malformed JSON at line {line}: {source}")]
    MalformedLine {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Dataset(#[from] EngineError),

    #[error("line {line} is not a JSON object")]
    NotAnObject { line: usize },

    #[error("cannot convert field {field:?} at line {line}: {source}")]
    Conversion {
        line: usize,
        field: String,
        #[source]
        source: DynError,
    },
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum WriteError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("value can't be serialized: {0}")]
    Serialization(#[source] DynError),

    #[error("schema mapping for partition {partition:?} failed: {source}")]
    Mapping {
        partition: String,
        #[source]
        source: DynError,
    },

    #[error("sink rejected partition {partition:?}: {message}")]
    Rejected { partition: String, message: String },
}

/// Supplier of the dataset to route.
pub trait DatasetSource {
    fn read(&mut self) -> Result<Dataset, ReadError>;

    fn short_description(&self) -> Cow<'static, str> {
        type_name::<Self>().into()
    }
}

/// Destination for one or more partitions.
pub trait Writer: Send {
    fn write(&mut self, partition: &str, data: &Dataset) -> Result<(), WriteError>;

    fn flush(&mut self) -> Result<(), WriteError> {
        Ok(())
    }

    fn retriable(&self) -> bool {
        false
    }

    fn name(&self) -> String {
        let short_description: Cow<'static, str> = type_name::<Self>().into();
        short_description
            .split("::")
            .last()
            .unwrap_or_default()
            .to_string()
    }
}

/// A dataset already held in memory.
#[derive(Debug, Clone)]
pub struct MemorySource {
    dataset: Dataset,
}

impl MemorySource {
    pub fn new(dataset: Dataset) -> Self {
        Self { dataset }
    }
}

impl DatasetSource for MemorySource {
    fn read(&mut self) -> Result<Dataset, ReadError> {
        Ok(self.dataset.clone())
    }
}

/// Reads one JSON object per line and projects it on `schema`. Fields
/// missing from an object become `None`; fields outside the schema are
/// ignored.
pub struct JsonLinesReader {
    path: PathBuf,
    schema: Arc<Schema>,
}

impl JsonLinesReader {
    pub fn new(path: impl Into<PathBuf>, schema: impl Into<Arc<Schema>>) -> Self {
        Self {
            path: path.into(),
            schema: schema.into(),
        }
    }

    fn parse_line(&self, line_number: usize, line: &str) -> Result<Record, ReadError> {
        let json: JsonValue =
            serde_json::from_str(line).map_err(|source| ReadError::MalformedLine {
                line: line_number,
                source,
            })?;
        let JsonValue::Object(object) = json else {
            return Err(ReadError::NotAnObject { line: line_number });
        };
        let mut values = Vec::with_capacity(self.schema.len());
        for column in self.schema.columns() {
            let raw = object.get(&column.name).map_or(Value::None, Value::from_json);
            let value = CompoundType::new(column.type_, true)
                .convert_value(raw)
                .map_err(|source| ReadError::Conversion {
                    line: line_number,
                    field: column.name.clone(),
                    source,
                })?;
            values.push(value);
        }
        let line_key = i64::try_from(line_number).unwrap_or(i64::MAX);
        Ok(Record::new(
            Key::for_values(&[Value::Int(line_key)]),
            values,
        ))
    }
}

impl DatasetSource for JsonLinesReader {
    fn read(&mut self) -> Result<Dataset, ReadError> {
        let reader = BufReader::new(File::open(&self.path)?);
        let mut records = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(self.parse_line(index + 1, &line)?);
        }
        info!(
            "{}: {} record(s) read",
            self.path.display(),
            records.len()
        );
        Ok(Dataset::new(self.schema.clone(), records)?)
    }

    fn short_description(&self) -> Cow<'static, str> {
        format!("JsonLines({})", self.path.display()).into()
    }
}

/// Appends every written partition to one file, one JSON object per record.
pub struct JsonLinesWriter {
    writer: BufWriter<File>,
    output_path: PathBuf,
}

impl JsonLinesWriter {
    pub fn create(output_path: impl AsRef<Path>) -> Result<Self, WriteError> {
        let output_path = output_path.as_ref().to_path_buf();
        let writer = BufWriter::new(File::create(&output_path)?);
        Ok(Self {
            writer,
            output_path,
        })
    }
}

impl Writer for JsonLinesWriter {
    fn write(&mut self, _partition: &str, data: &Dataset) -> Result<(), WriteError> {
        for row in data.rows() {
            let mut object = JsonMap::with_capacity(row.values().len());
            for (column, value) in row.schema().columns().iter().zip(row.values()) {
                object.insert(
                    column.name.clone(),
                    value.to_json().map_err(WriteError::Serialization)?,
                );
            }
            serde_json::to_writer(&mut self.writer, &object)?;
            self.writer.write_all(b"\n")?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), WriteError> {
        self.writer.flush()?;
        Ok(())
    }

    fn name(&self) -> String {
        format!("JsonLines({})", self.output_path.display())
    }
}

#[derive(Default, Debug)]
pub struct NullWriter;

impl NullWriter {
    pub fn new() -> Self {
        Self
    }
}

impl Writer for NullWriter {
    fn write(&mut self, _partition: &str, _data: &Dataset) -> Result<(), WriteError> {
        Ok(())
    }
}
