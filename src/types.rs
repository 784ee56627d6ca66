use crate::config;
use crate::error::SchemaError;
use crate::util::format_plain;
use serde::Serialize;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;
use tabled::Tabled;

/// A single value in a dataset row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Number(f64),
    Null,
}

impl Cell {
    /// The value used for grouping and for matching filter selections.
    ///
    /// Numbers use their plain display form so a numeric-looking category
    /// still matches the strings a user picked.
    pub fn key(&self) -> Cow<'_, str> {
        match self {
            Cell::Text(s) => Cow::Borrowed(s.as_str()),
            Cell::Number(n) => Cow::Owned(format_plain(*n)),
            Cell::Null => Cow::Borrowed(config::NOT_SPECIFIED),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Text written to a CSV export. Nulls become empty fields.
    pub fn to_field(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => format_plain(*n),
            Cell::Null => String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColumnKind {
    Text,
    Numeric,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

/// Analytical role of a column, independent of how the raw file spelled it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnRole {
    EventType,
    Ethnicity,
    LifeCycle,
    Department,
    Year,
    Sex,
    Disability,
    PeoplePerOccurrence,
    PeopleSubjectToAttention,
    Events,
    PeopleArrived,
}

impl ColumnRole {
    pub fn column_name(self) -> &'static str {
        match self {
            ColumnRole::EventType => config::EVENT_TYPE,
            ColumnRole::Ethnicity => config::ETHNICITY,
            ColumnRole::LifeCycle => config::LIFE_CYCLE,
            ColumnRole::Department => config::DEPARTMENT,
            ColumnRole::Year => config::YEAR,
            ColumnRole::Sex => config::SEX,
            ColumnRole::Disability => config::DISABILITY,
            ColumnRole::PeoplePerOccurrence => config::PEOPLE_PER_OCCURRENCE,
            ColumnRole::PeopleSubjectToAttention => config::PEOPLE_SUBJECT_TO_ATTENTION,
            ColumnRole::Events => config::EVENTS,
            ColumnRole::PeopleArrived => config::PEOPLE_ARRIVED,
        }
    }
}

/// Ordered column list with a name index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<Column>,
    index: HashMap<String, usize>,
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Self {
        let index = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), i))
            .collect();
        Self { columns, index }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn kind(&self, name: &str) -> Option<ColumnKind> {
        self.position(name).map(|i| self.columns[i].kind)
    }

    pub fn has_role(&self, role: ColumnRole) -> bool {
        self.contains(role.column_name())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

static NULL_CELL: Cell = Cell::Null;

/// One row. Cells are positional and follow the dataset schema.
pub type Record = Vec<Cell>;

/// Cell `idx` of `row`; short rows read as `Cell::Null`.
pub fn cell_at(row: &Record, idx: usize) -> &Cell {
    row.get(idx).unwrap_or(&NULL_CELL)
}

/// An ordered collection of rows sharing one schema.
///
/// Datasets are never mutated after construction; filtering and exclusion
/// build new datasets that share the same `Arc<Schema>`.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    label: String,
    schema: Arc<Schema>,
    rows: Vec<Record>,
}

impl Dataset {
    pub fn new(label: impl Into<String>, schema: Schema, rows: Vec<Record>) -> Self {
        Self { label: label.into(), schema: Arc::new(schema), rows }
    }

    /// A dataset with the same label and schema but a different row set.
    pub fn with_rows(&self, rows: Vec<Record>) -> Self {
        Self { label: self.label.clone(), schema: Arc::clone(&self.schema), rows }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of `column`, or a `MissingColumn` error naming this dataset.
    pub fn require_column(&self, column: &str) -> Result<usize, SchemaError> {
        self.schema.position(column).ok_or_else(|| SchemaError::MissingColumn {
            dataset: self.label.clone(),
            column: column.to_string(),
        })
    }

    /// Like [`Dataset::require_column`], additionally checking the column is numeric.
    pub fn require_numeric(&self, column: &str) -> Result<usize, SchemaError> {
        let idx = self.require_column(column)?;
        if self.schema.columns()[idx].kind != ColumnKind::Numeric {
            return Err(SchemaError::NotNumeric {
                dataset: self.label.clone(),
                column: column.to_string(),
            });
        }
        Ok(idx)
    }

    /// Iterate one column's cells. Short rows yield `Cell::Null`.
    pub fn column_cells(&self, idx: usize) -> impl Iterator<Item = &Cell> {
        self.rows.iter().map(move |r| cell_at(r, idx))
    }
}

/// One output row of a grouping operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub key: String,
    pub values: Vec<f64>,
}

impl AggregateRow {
    /// Measure `i`, or 0 when the row has fewer measures.
    pub fn value(&self, i: usize) -> f64 {
        self.values.get(i).copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct KpiRow {
    #[serde(rename = "Indicator")]
    #[tabled(rename = "Indicator")]
    pub indicator: String,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: String,
}
