//! CSV Data Loader Module
//! Handles CSV file loading and cleaning of the medal table using Polars.

use crate::data::processor::{DataProcessor, ProcessorError};
use polars::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("CSV file not found: {0}")]
    NotFound(PathBuf),
    #[error("CSV file has no header row: {0}")]
    NoHeader(PathBuf),
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Failed to read CSV: {0}")]
    Io(#[from] std::io::Error),
    #[error("Missing expected column: {0}")]
    MissingColumn(String),
    #[error("No data loaded")]
    NoData,
}

impl From<ProcessorError> for LoaderError {
    fn from(err: ProcessorError) -> Self {
        match err {
            ProcessorError::PolarsError(e) => LoaderError::CsvError(e),
            ProcessorError::MissingColumn(name) => LoaderError::MissingColumn(name),
        }
    }
}

/// Cell values read as missing in every column. Empty cells are already null.
pub const NA_TOKENS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Handles CSV file loading with Polars for high performance.
pub struct MedalLoader {
    df: Option<DataFrame>,
}

impl Default for MedalLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl MedalLoader {
    pub fn new() -> Self {
        Self { df: None }
    }

    /// Load a CSV file and clean it.
    ///
    /// The returned table has trimmed column names and Float64 medal columns.
    /// Unparsable medal cells become null, they never fail the load.
    pub fn load_csv(&mut self, file_path: &Path) -> Result<&DataFrame, LoaderError> {
        if !file_path.is_file() {
            return Err(LoaderError::NotFound(file_path.to_path_buf()));
        }
        if fs::metadata(file_path)?.len() == 0 {
            return Err(LoaderError::NoHeader(file_path.to_path_buf()));
        }

        let raw = LazyCsvReader::new(file_path)
            .with_has_header(true)
            .with_infer_schema_length(Some(10000))
            .with_ignore_errors(true)
            .with_null_values(Some(NullValues::AllColumns(
                NA_TOKENS.iter().map(|t| PlSmallStr::from_static(*t)).collect(),
            )))
            .finish()?
            .collect()?;

        if raw.width() == 0 {
            return Err(LoaderError::NoHeader(file_path.to_path_buf()));
        }

        let df = DataProcessor::clean(raw)?;
        info!(
            path = %file_path.display(),
            rows = df.height(),
            columns = df.width(),
            "loaded medal table"
        );

        self.df = Some(df);
        self.df.as_ref().ok_or(LoaderError::NoData)
    }

    /// Get the number of rows in the DataFrame.
    pub fn get_row_count(&self) -> usize {
        self.df.as_ref().map(|df| df.height()).unwrap_or(0)
    }

    /// Take ownership of the cleaned table.
    pub fn into_dataframe(self) -> Result<DataFrame, LoaderError> {
        self.df.ok_or(LoaderError::NoData)
    }
}
