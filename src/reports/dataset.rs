use crate::error::{AppError, Result};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// Tabular dataset read from a CSV file with a header row
#[derive(Debug, Clone)]
pub struct Dataset {
    headers: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<String>>,
}

impl Dataset {
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| {
            AppError::Report(format!("cannot open dataset {}: {e}", path.display()))
        })?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let index = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), i))
            .collect();

        let rows = reader
            .records()
            .map(|record| record.map(|r| r.iter().map(str::to_string).collect()))
            .collect::<std::result::Result<Vec<Vec<String>>, csv::Error>>()?;

        Ok(Self {
            headers,
            index,
            rows,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn column_index(&self, name: &str) -> Result<usize> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| AppError::Report(format!("dataset has no {name} column")))
    }

    /// Raw cell values of a column
    pub fn text_column(&self, name: &str) -> Result<Vec<&str>> {
        let i = self.column_index(name)?;
        Ok(self.rows.iter().map(|row| row[i].as_str()).collect())
    }

    /// Parsed values of a column, `None` for empty cells
    pub fn numeric_column(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let i = self.column_index(name)?;
        self.rows
            .iter()
            .enumerate()
            .map(|(line, row)| parse_cell(&row[i]).map_err(|value| {
                AppError::Report(format!(
                    "row {}: {name} value {value:?} is not numeric",
                    line + 1
                ))
            }))
            .collect()
    }

    /// Columns in which every non-empty cell parses as a number (and at least
    /// one cell is non-empty), in header order
    pub fn numeric_columns(&self) -> Vec<&str> {
        self.headers
            .iter()
            .enumerate()
            .filter(|(i, _)| {
                let mut seen = false;
                for row in &self.rows {
                    match parse_cell(&row[*i]) {
                        Ok(Some(_)) => seen = true,
                        Ok(None) => {}
                        Err(_) => return false,
                    }
                }
                seen
            })
            .map(|(_, name)| name.as_str())
            .collect()
    }
}

fn parse_cell(cell: &str) -> std::result::Result<Option<f64>, &str> {
    if cell.is_empty() {
        return Ok(None);
    }
    cell.parse::<f64>().map(Some).map_err(|_| cell)
}
