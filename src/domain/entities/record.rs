use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::domain::entities::edit::FormRules;

/// Primary key of a record, unique within its collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(value) => write!(f, "{value}"),
            RecordId::Text(value) => write!(f, "{value}"),
        }
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        RecordId::Int(value)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        RecordId::Text(value.to_string())
    }
}

/// Scalar view of one record field, used by sorting, filtering and export.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(f64),
    /// Number that keeps its wire text for display ("12.50").
    Decimal(f64, String),
    Text(String),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn optional_text(value: Option<&str>) -> Self {
        match value {
            Some(text) => FieldValue::Text(text.to_string()),
            None => FieldValue::Null,
        }
    }

    pub fn optional_number(value: Option<i64>) -> Self {
        match value {
            Some(number) => FieldValue::Number(number as f64),
            None => FieldValue::Null,
        }
    }

    /// Decimal strings as sent by the backend ("12.50"); anything that does not
    /// parse is kept as text so placeholders like "N/A" still render.
    pub fn decimal(value: Option<&str>) -> Self {
        match value {
            None => FieldValue::Null,
            Some(text) => match text.trim().parse::<f64>() {
                Ok(number) if number.is_finite() => FieldValue::Decimal(number, text.to_string()),
                _ => FieldValue::Text(text.to_string()),
            },
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(value) | FieldValue::Decimal(value, _) => Some(*value),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    pub fn display(&self) -> String {
        match self {
            FieldValue::Null => String::new(),
            FieldValue::Bool(value) => value.to_string(),
            FieldValue::Number(value) => format!("{value}"),
            FieldValue::Decimal(_, text) | FieldValue::Text(text) => text.clone(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value as f64)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Number(f64::from(value))
    }
}

/// A typed item of a backend collection.
pub trait Record:
    Clone + PartialEq + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    fn id(&self) -> RecordId;

    /// Field lookup by wire name. Unknown fields are `Null`.
    fn field(&self, name: &str) -> FieldValue;
}

/// Record type reachable through a REST collection endpoint.
pub trait Collection: Record {
    /// Path of the list endpoint relative to the API base, with trailing slash.
    const ENDPOINT: &'static str;
    /// Human readable label used in titles and export filenames.
    const LABEL: &'static str;
    /// Whether list requests carry the selected centre as a `centre` parameter.
    const CENTRE_SCOPED: bool = false;

    fn columns() -> &'static [Column];

    /// Path records are created at. Most collections accept POST on the list path.
    fn create_path() -> &'static str {
        Self::ENDPOINT
    }

    fn form_rules() -> FormRules {
        FormRules::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellFormat {
    #[default]
    Plain,
    /// Booleans render as "Active" / "Inactive".
    ActiveFlag,
    /// Null or blank values render as "-".
    DashIfEmpty,
}

/// Declared column of a collection's table and exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub field: &'static str,
    pub label: &'static str,
    pub format: CellFormat,
    pub sortable: bool,
}

impl Column {
    pub const fn new(field: &'static str, label: &'static str) -> Self {
        Self {
            field,
            label,
            format: CellFormat::Plain,
            sortable: true,
        }
    }

    pub const fn with_format(mut self, format: CellFormat) -> Self {
        self.format = format;
        self
    }

    pub const fn unsortable(mut self) -> Self {
        self.sortable = false;
        self
    }

    pub fn render<R: Record>(&self, record: &R) -> String {
        let value = record.field(self.field);
        match self.format {
            CellFormat::Plain => value.display(),
            CellFormat::ActiveFlag => match value {
                FieldValue::Bool(true) => "Active".to_string(),
                FieldValue::Bool(false) => "Inactive".to_string(),
                other => other.display(),
            },
            CellFormat::DashIfEmpty => {
                if value.is_blank() {
                    "-".to_string()
                } else {
                    value.display()
                }
            }
        }
    }
}

/// Projects records onto columns as display strings, in record order.
pub fn project_rows<R: Record>(records: &[R], columns: &[Column]) -> Vec<Vec<String>> {
    records
        .iter()
        .map(|record| columns.iter().map(|column| column.render(record)).collect())
        .collect()
}

pub fn column_labels(columns: &[Column]) -> Vec<String> {
    columns.iter().map(|column| column.label.to_string()).collect()
}
