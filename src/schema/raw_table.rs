// src/schema/raw_table.rs

use anyhow::{anyhow, Context, Result};

/// Declarative rename map, `(source column, canonical column)`. Projection
/// keeps exactly these columns, in this order, under the new names.
pub type ColumnMap = [(&'static str, &'static str)];

/// A loosely-typed table straight out of a CSV file or a flattened JSON
/// array: column names plus one `Vec<String>` per row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Like `column_index`, but a missing column is an error.
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| anyhow!("missing column `{}` (have: {})", name, self.headers.join(", ")))
    }

    pub fn lowercase_headers(&mut self) {
        for h in &mut self.headers {
            *h = h.to_lowercase();
        }
    }

    /// Cell at `(row, col)`; short rows read as empty.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Rename + filter in one step.
    pub fn project(&self, map: &ColumnMap) -> Result<RawTable> {
        let indices = map
            .iter()
            .map(|(from, _)| self.require_column(from))
            .collect::<Result<Vec<_>>>()
            .context("projecting table")?;

        let headers = map.iter().map(|(_, to)| to.to_string()).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                indices
                    .iter()
                    .map(|&i| row.get(i).cloned().unwrap_or_default())
                    .collect()
            })
            .collect();

        Ok(RawTable { headers, rows })
    }
}
