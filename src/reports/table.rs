use chrono::NaiveDate;
use serde::ser::Serializer;
use serde::Serialize;
use thiserror::Error;

/// One typed scalar in a report table.
///
/// Non-finite floats (the division-by-zero sentinel) serialize to JSON
/// null, as does an SQL NULL.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Int(i64),
    Float(f64),
    Date(NaiveDate),
    Null,
}

impl Cell {
    /// Numeric view of the cell, used by derived-column arithmetic.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(v) => Some(*v as f64),
            Cell::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }
}

impl Serialize for Cell {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Cell::Text(v) => serializer.serialize_str(v),
            Cell::Int(v) => serializer.serialize_i64(*v),
            Cell::Float(v) if v.is_finite() => serializer.serialize_f64(*v),
            Cell::Float(_) => serializer.serialize_none(),
            Cell::Date(v) => v.serialize(serializer),
            Cell::Null => serializer.serialize_none(),
        }
    }
}

/// A named column of equal-typed-enough cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Cell>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Cell>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

#[derive(Error, Debug)]
#[error("column {name} has {actual} values, table has {expected} rows")]
pub struct ColumnLengthMismatch {
    pub name: String,
    pub expected: usize,
    pub actual: usize,
}

/// Table-shaped report result: ordered named columns, all equal length.
///
/// Produced fresh per dispatch call and exclusively owned by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportTable {
    columns: Vec<Column>,
}

impl ReportTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_columns(columns: Vec<Column>) -> Result<Self, ColumnLengthMismatch> {
        let mut table = Self::new();
        for column in columns {
            table.push_column(column)?;
        }
        Ok(table)
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Appends a column; its length must match the existing row count.
    pub fn push_column(&mut self, column: Column) -> Result<(), ColumnLengthMismatch> {
        if !self.columns.is_empty() && column.values.len() != self.row_count() {
            return Err(ColumnLengthMismatch {
                name: column.name,
                expected: self.row_count(),
                actual: column.values.len(),
            });
        }
        self.columns.push(column);
        Ok(())
    }

    /// Replaces a same-named column in place, or appends if absent.
    /// Column order is preserved on replacement.
    pub fn set_column(&mut self, column: Column) -> Result<(), ColumnLengthMismatch> {
        if column.values.len() != self.row_count() && !self.columns.is_empty() {
            return Err(ColumnLengthMismatch {
                name: column.name,
                expected: self.row_count(),
                actual: column.values.len(),
            });
        }
        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => {
                existing.values = column.values;
                Ok(())
            }
            None => {
                self.columns.push(column);
                Ok(())
            }
        }
    }
}
