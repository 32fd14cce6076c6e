//! dbt source YAML entity model
//!
//! Mirrors the subset of a dbt `sources:` file that sourcegen reads and
//! writes. Field declaration order is the key order written back to disk.
//! Keys the model does not name are kept in `extra` so they survive a
//! load/merge/store cycle untouched.

use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::{Mapping, Value};
use sourcegen_core::{ColumnDescriptor, DatasetSnapshot, TableDescriptor};

/// Version written for new documents
pub const DEFAULT_VERSION: u32 = 2;

/// Opaque `meta:` mapping
pub type Meta = Mapping;

/// Opaque `tests:` list
pub type Tests = Vec<Value>;

/// A column entry under `tables[].columns`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    #[serde(deserialize_with = "scalar_string")]
    pub name: String,

    #[serde(
        default,
        deserialize_with = "optional_scalar_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub data_type: Option<String>,

    /// Never null; an empty description is omitted when written
    #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tests: Option<Tests>,

    /// Keys not modelled above (e.g. `quote`, `constraints`)
    #[serde(flatten)]
    pub extra: Mapping,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: None,
            description: String::new(),
            meta: None,
            tests: None,
            extra: Mapping::new(),
        }
    }

    /// Build a column for a warehouse column that has no document entry yet
    pub fn from_descriptor(descriptor: &ColumnDescriptor) -> Self {
        Self {
            data_type: Some(descriptor.data_type.clone()),
            description: descriptor.description.clone().unwrap_or_default(),
            ..Self::new(descriptor.name.clone())
        }
    }

    pub fn with_data_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = Some(data_type.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn with_tests(mut self, tests: Tests) -> Self {
        self.tests = Some(tests);
        self
    }
}

/// A table entry under `sources[].tables`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Name dbt uses in `source()` calls
    #[serde(deserialize_with = "scalar_string")]
    pub name: String,

    /// Physical table name when it differs from `name`
    #[serde(
        default,
        deserialize_with = "optional_scalar_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub identifier: Option<String>,

    #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tests: Option<Tests>,

    /// Keys not modelled above (e.g. `freshness`, `loaded_at_field`)
    #[serde(flatten)]
    pub extra: Mapping,

    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<Column>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identifier: None,
            description: String::new(),
            meta: None,
            tests: None,
            extra: Mapping::new(),
            columns: Vec::new(),
        }
    }

    /// Build a table for a warehouse table that has no document entry yet
    pub fn from_descriptor(descriptor: &TableDescriptor) -> Self {
        Self {
            description: descriptor.description.clone().unwrap_or_default(),
            columns: descriptor.columns.iter().map(Column::from_descriptor).collect(),
            ..Self::new(descriptor.table_id.clone())
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn with_tests(mut self, tests: Tests) -> Self {
        self.tests = Some(tests);
        self
    }

    pub fn with_columns(mut self, columns: Vec<Column>) -> Self {
        self.columns = columns;
        self
    }

    /// Find a column by name
    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Get column names
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

/// One entry of the top-level `sources:` list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    #[serde(deserialize_with = "scalar_string")]
    pub name: String,

    /// Warehouse project
    #[serde(
        default,
        deserialize_with = "optional_scalar_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub database: Option<String>,

    /// Warehouse dataset
    #[serde(
        rename = "schema",
        default,
        deserialize_with = "optional_scalar_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub schema_name: Option<String>,

    #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,

    /// Keys not modelled above (e.g. `loader`, `freshness`)
    #[serde(flatten)]
    pub extra: Mapping,

    #[serde(default, deserialize_with = "null_as_default")]
    pub tables: Vec<Table>,
}

impl Source {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            database: None,
            schema_name: None,
            description: String::new(),
            meta: None,
            extra: Mapping::new(),
            tables: Vec::new(),
        }
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn with_schema(mut self, schema_name: impl Into<String>) -> Self {
        self.schema_name = Some(schema_name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn with_tables(mut self, tables: Vec<Table>) -> Self {
        self.tables = tables;
        self
    }

    /// Find a table by its document name
    pub fn find_table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Get table names
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }
}

/// A whole source YAML file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDocument {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default, deserialize_with = "null_as_default")]
    pub sources: Vec<Source>,
}

fn default_version() -> u32 {
    DEFAULT_VERSION
}

impl SourceDocument {
    /// Create an empty document (version 2, no sources)
    pub fn new() -> Self {
        Self {
            version: DEFAULT_VERSION,
            sources: Vec::new(),
        }
    }

    /// Build a document describing a snapshot with nothing to merge against
    ///
    /// The single source is named `source_name`, or after the dataset when
    /// none is given.
    pub fn from_snapshot(snapshot: &DatasetSnapshot, source_name: Option<&str>) -> Self {
        let name = source_name.unwrap_or(&snapshot.dataset_id);
        let source = Source::new(name)
            .with_database(snapshot.project_id.clone())
            .with_schema(snapshot.dataset_id.clone())
            .with_tables(snapshot.tables.iter().map(Table::from_descriptor).collect());

        Self {
            version: DEFAULT_VERSION,
            sources: vec![source],
        }
    }

    pub fn with_sources(mut self, sources: Vec<Source>) -> Self {
        self.sources = sources;
        self
    }
}

impl Default for SourceDocument {
    fn default() -> Self {
        Self::new()
    }
}

/// Treat an explicit YAML `null` like a missing key
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Read a string field, accepting unquoted numbers and booleans
///
/// Hand-written files often carry `name: 20240101` or `description: 2024`,
/// which YAML parses as numbers. A `null` reads as the empty string.
fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(optional_scalar_string(deserializer)?.unwrap_or_default())
}

fn optional_scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Tagged(tagged) => Err(serde::de::Error::custom(format!(
            "expected a string, found tagged value {}",
            tagged.tag
        ))),
        _ => Err(serde::de::Error::custom("expected a string, found a sequence or mapping")),
    }
}
