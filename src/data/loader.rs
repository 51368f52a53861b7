//! Loading datasets from files through polars

use super::{ColumnKind, Dataset};
use crate::error::{EvalError, Result};
use ndarray::Array2;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// CSV loader producing a [`Dataset`]
#[derive(Debug, Clone)]
pub struct DataLoader {
    has_header: bool,
    delimiter: u8,
    infer_schema_length: Option<usize>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self {
            has_header: true,
            delimiter: b',',
            infer_schema_length: Some(100),
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// Read a CSV file into a polars `DataFrame`
    pub fn read_csv(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let file = File::open(path.as_ref())?;

        let parse_opts = CsvParseOptions::default().with_separator(self.delimiter);

        let df = CsvReadOptions::default()
            .with_has_header(self.has_header)
            .with_infer_schema_length(self.infer_schema_length)
            .with_parse_options(parse_opts)
            .into_reader_with_file_handle(file)
            .finish()?;

        debug!(path = %path.as_ref().display(), rows = df.height(), cols = df.width(), "read csv");
        Ok(df)
    }

    /// Read a CSV file and convert it to a [`Dataset`]
    pub fn load_csv(&self, path: impl AsRef<Path>) -> Result<Dataset> {
        let df = self.read_csv(path)?;
        Dataset::from_dataframe(&df)
    }
}

impl Dataset {
    /// Convert a polars frame; every column must be numeric and null-free
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        let n_rows = df.height();
        let columns = df.get_columns();

        let mut names = Vec::with_capacity(columns.len());
        let mut values = Array2::zeros((n_rows, columns.len()));

        for (j, column) in columns.iter().enumerate() {
            let name = column.name().to_string();

            match column.dtype() {
                DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 |
                DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64 |
                DataType::Float32 | DataType::Float64 | DataType::Boolean => {}
                other => {
                    return Err(EvalError::Data(format!(
                        "column '{}' has non-numeric type {}",
                        name, other
                    )));
                }
            }

            let casted = column.as_materialized_series().cast(&DataType::Float64)?;
            let ca = casted.f64()?;

            for (i, value) in ca.into_iter().enumerate() {
                values[[i, j]] = value.ok_or_else(|| {
                    EvalError::Data(format!("missing value in column '{}' at row {}", name, i))
                })?;
            }

            names.push(name);
        }

        let kinds = vec![ColumnKind::Numeric; names.len()];
        Dataset::new(names, values, kinds)
    }
}
