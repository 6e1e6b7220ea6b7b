//! Column-named table of raw string cells.

use crate::domain::error::TradingSystemError;
use crate::domain::validate::{TableArgs, Tabular};
use serde::Serialize;
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Frame {
    /// Every row must have one cell per column.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self, TradingSystemError> {
        if let Some((i, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(TradingSystemError::data_validation(format!(
                "row {} has {} fields, expected {}",
                i + 1,
                row.len(),
                columns.len()
            )));
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| r[idx].as_str()).collect())
    }

    /// Parse a column as `f64`.
    pub fn numeric_column(&self, name: &str) -> Result<Vec<f64>, TradingSystemError> {
        self.parse_column(name)
    }

    /// Every cell of `name` parsed as `T`; the first bad cell is a
    /// validation error naming its row.
    pub fn parse_column<T>(&self, name: &str) -> Result<Vec<T>, TradingSystemError>
    where
        T: FromStr,
        T::Err: Display,
    {
        let cells = self.column(name).ok_or_else(|| {
            TradingSystemError::data_validation(format!("missing column {name}"))
        })?;
        cells
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                cell.trim().parse::<T>().map_err(|e| {
                    TradingSystemError::data_validation(format!(
                        "invalid {name} value {cell:?} in row {}: {e}",
                        i + 1
                    ))
                })
            })
            .collect()
    }
}

impl Tabular for Frame {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(String::as_str).collect()
    }
}

impl TableArgs for Frame {
    fn tables(&self) -> Vec<&dyn Tabular> {
        vec![self]
    }
}
