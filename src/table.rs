use std::path::{Path, PathBuf};

use polars::prelude::*;
use tracing::debug;

use crate::error::{MetaError, Result};

/// A header-plus-rows metadata table with every cell kept as text.
///
/// Column names are trimmed; fixed fields are looked up case-insensitively.
/// Null cells are stored as empty strings.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    columns: Vec<String>,
    lowered: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Read the table at `path`, or `None` when no such file exists.
    pub fn read(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            debug!(path = %path.display(), "table absent");
            return Ok(None);
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let table = match read_csv_as_strings(path.to_path_buf()) {
            Ok(df) => Self::from_frame(name, &df)?,
            // no header line at all
            Err(MetaError::Polars(PolarsError::NoData(_))) => Self::new(name, vec![], vec![]),
            Err(e) => return Err(e),
        };
        debug!(path = %path.display(), rows = table.len(), "table read");
        Ok(Some(table))
    }

    /// Build a table from a DataFrame whose columns are all String typed.
    pub fn from_frame(name: impl Into<String>, df: &DataFrame) -> Result<Self> {
        let columns: Vec<String> = df
            .get_column_names_str()
            .iter()
            .map(|c| c.trim().to_string())
            .collect();

        let mut rows = vec![Vec::with_capacity(columns.len()); df.height()];
        for column in df.get_columns() {
            for (i, value) in column.str()?.into_iter().enumerate() {
                rows[i].push(value.unwrap_or("").to_string());
            }
        }

        Ok(Self::new(name, columns, rows))
    }

    pub fn new(name: impl Into<String>, columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let columns: Vec<String> = columns.into_iter().map(|c| c.trim().to_string()).collect();
        let lowered = columns.iter().map(|c| c.to_lowercase()).collect();
        Self {
            name: name.into(),
            columns,
            lowered,
            rows,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, label: &str) -> bool {
        self.position(label).is_some()
    }

    /// Fail with `MissingColumn` unless every label is present. A table
    /// without a header has no rows and passes.
    pub fn require_columns(&self, required: &[&str]) -> Result<()> {
        if self.columns.is_empty() {
            return Ok(());
        }
        for &label in required {
            if !self.has_column(label) {
                return Err(MetaError::MissingColumn {
                    table: self.name.clone(),
                    column: label.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Iterate rows; `fixed` lists the labelled fields so that
    /// [`Row::extras`] can skip them.
    pub fn rows<'a>(&'a self, fixed: &'a [&'a str]) -> impl Iterator<Item = Row<'a>> + 'a {
        self.rows.iter().enumerate().map(move |(index, cells)| Row {
            table: self,
            index,
            cells,
            fixed,
        })
    }

    fn position(&self, label: &str) -> Option<usize> {
        let label = label.to_lowercase();
        self.lowered.iter().position(|c| *c == label)
    }
}

/// One row of a [`Table`].
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    table: &'a Table,
    index: usize,
    cells: &'a [String],
    fixed: &'a [&'a str],
}

impl<'a> Row<'a> {
    /// Zero-based position of the row in its table.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn table_name(&self) -> &'a str {
        &self.table.name
    }

    /// Trimmed value of a labelled field; empty when the column is absent.
    pub fn field(&self, label: &str) -> &'a str {
        self.table
            .position(label)
            .and_then(|i| self.cells.get(i))
            .map(|v| v.trim())
            .unwrap_or("")
    }

    /// Every column not named in the fixed labels, as raw `(column, cell)`
    /// pairs in header order.
    pub fn extras(&self) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        let fixed = self.fixed;
        let table = self.table;
        let cells = self.cells;
        table
            .columns
            .iter()
            .zip(table.lowered.iter())
            .enumerate()
            .filter(move |(_, (_, lowered))| {
                !fixed.iter().any(|f| f.eq_ignore_ascii_case(lowered.as_str()))
            })
            .map(move |(i, (column, _))| {
                (column.as_str(), cells.get(i).map(|v| v.as_str()).unwrap_or(""))
            })
    }

    /// Optional float field: empty is `None`, garbage is a fault.
    pub fn opt_f64(&self, label: &str) -> Result<Option<f64>> {
        let value = self.field(label);
        if value.is_empty() {
            return Ok(None);
        }
        value
            .parse::<f64>()
            .map(Some)
            .map_err(|e| MetaError::malformed(self.table_name(), self.index, label, value, e))
    }

    /// Optional integer field: empty is `None`, garbage is a fault.
    pub fn opt_i64(&self, label: &str) -> Result<Option<i64>> {
        let value = self.field(label);
        if value.is_empty() {
            return Ok(None);
        }
        value
            .parse::<i64>()
            .map(Some)
            .map_err(|e| MetaError::malformed(self.table_name(), self.index, label, value, e))
    }

    /// Optional text field: empty is `None`.
    pub fn opt_string(&self, label: &str) -> Option<String> {
        let value = self.field(label);
        (!value.is_empty()).then(|| value.to_string())
    }
}

/// Read a CSV file with all columns as String dtype.
fn read_csv_as_strings(path: PathBuf) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0)) // all columns as String
        .try_into_reader_with_file_path(Some(path))?
        .finish()?;
    Ok(df)
}
