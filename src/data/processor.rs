//! Data Processor Module
//! Handles data cleaning (header trimming, numeric coercion) and row extraction.

use polars::prelude::*;
use thiserror::Error;
use tracing::debug;

/// Column holding the country name.
pub const COUNTRY_COLUMN: &str = "countries";

/// Medal columns coerced to Float64 during cleaning.
pub const TARGET_COLUMNS: [&str; 4] = ["summer_gold", "summer_total", "total_gold", "total_total"];

/// Every column the charts read.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    COUNTRY_COLUMN,
    "summer_gold",
    "summer_total",
    "winter_gold",
    "winter_total",
    "total_gold",
    "total_total",
];

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Missing expected column: {0}")]
    MissingColumn(String),
}

/// One row of the medal table.
#[derive(Debug, Clone, PartialEq)]
pub struct CountryMedalRecord {
    pub country: String,
    pub summer_gold: Option<f64>,
    pub summer_total: Option<f64>,
    pub winter_gold: Option<f64>,
    pub winter_total: Option<f64>,
    pub total_gold: Option<f64>,
    pub total_total: Option<f64>,
}

/// Handles data cleaning and transformation operations.
pub struct DataProcessor;

impl DataProcessor {
    /// Trim column names and coerce the target medal columns to Float64.
    pub fn clean(mut df: DataFrame) -> Result<DataFrame, ProcessorError> {
        Self::trim_column_names(&mut df)?;

        for name in TARGET_COLUMNS {
            let column = df
                .column(name)
                .map_err(|_| ProcessorError::MissingColumn(name.to_string()))?;
            let nulls_before = column.null_count();
            let coerced = Self::coerce_numeric(column)?;
            let coerced_missing = coerced.null_count().saturating_sub(nulls_before);
            if coerced_missing > 0 {
                debug!(column = name, cells = coerced_missing, "unparsable cells set to missing");
            }
            df.with_column(coerced)?;
        }

        Ok(df)
    }

    fn trim_column_names(df: &mut DataFrame) -> PolarsResult<()> {
        let trimmed: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| name.trim().to_string())
            .collect();
        df.set_column_names(trimmed)
    }

    /// Convert a column to Float64; values that fail to parse or are not
    /// finite ("inf", "NaN") become null.
    fn coerce_numeric(column: &Column) -> PolarsResult<Column> {
        let parsed: Vec<Option<f64>> = match column.dtype() {
            DataType::String => column
                .str()?
                .into_iter()
                .map(|v| v.and_then(|s| s.trim().parse::<f64>().ok()))
                .collect(),
            _ => {
                let as_f64 = column.cast(&DataType::Float64)?;
                let values: Vec<Option<f64>> = as_f64.f64()?.into_iter().collect();
                values
            }
        };
        let finite: Vec<Option<f64>> = parsed
            .into_iter()
            .map(|v| v.filter(|x| x.is_finite()))
            .collect();
        Ok(Column::new(column.name().clone(), finite))
    }

    /// Get list of numeric column names, in header order.
    pub fn numeric_columns(df: &DataFrame) -> Vec<String> {
        df.get_columns()
            .iter()
            .filter(|col| {
                matches!(
                    col.dtype(),
                    DataType::Float32
                        | DataType::Float64
                        | DataType::Int8
                        | DataType::Int16
                        | DataType::Int32
                        | DataType::Int64
                        | DataType::UInt8
                        | DataType::UInt16
                        | DataType::UInt32
                        | DataType::UInt64
                )
            })
            .map(|col| col.name().to_string())
            .collect()
    }

    /// Values of a numeric column as f64, NaN folded into missing.
    pub fn column_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<f64>>> {
        let as_f64 = df.column(name)?.cast(&DataType::Float64)?;
        let values = as_f64
            .f64()?
            .into_iter()
            .map(|v| v.filter(|x| !x.is_nan()))
            .collect();
        Ok(values)
    }

    /// Extract the typed medal rows. Fails if any chart column is missing.
    pub fn records(df: &DataFrame) -> Result<Vec<CountryMedalRecord>, ProcessorError> {
        if let Some(missing) = REQUIRED_COLUMNS
            .iter()
            .find(|name| df.column(name).is_err())
        {
            return Err(ProcessorError::MissingColumn(missing.to_string()));
        }

        let countries = df.column(COUNTRY_COLUMN)?.cast(&DataType::String)?;
        let countries: Vec<String> = countries
            .str()?
            .into_iter()
            .map(|v| v.unwrap_or_default().to_string())
            .collect();

        let summer_gold = Self::column_values(df, "summer_gold")?;
        let summer_total = Self::column_values(df, "summer_total")?;
        let winter_gold = Self::column_values(df, "winter_gold")?;
        let winter_total = Self::column_values(df, "winter_total")?;
        let total_gold = Self::column_values(df, "total_gold")?;
        let total_total = Self::column_values(df, "total_total")?;

        let records = countries
            .into_iter()
            .enumerate()
            .map(|(i, country)| CountryMedalRecord {
                country,
                summer_gold: summer_gold[i],
                summer_total: summer_total[i],
                winter_gold: winter_gold[i],
                winter_total: winter_total[i],
                total_gold: total_gold[i],
                total_total: total_total[i],
            })
            .collect();

        Ok(records)
    }

    /// Select the `n` records with the largest key, in descending key order.
    ///
    /// Records with a missing key are skipped. Ties keep input order.
    pub fn top_n<F>(records: &[CountryMedalRecord], n: usize, key: F) -> Vec<CountryMedalRecord>
    where
        F: Fn(&CountryMedalRecord) -> Option<f64>,
    {
        let mut keyed: Vec<(f64, &CountryMedalRecord)> = records
            .iter()
            .filter_map(|r| key(r).map(|k| (k, r)))
            .collect();
        // sort_by is stable
        keyed.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        keyed.into_iter().take(n).map(|(_, r)| r.clone()).collect()
    }
}
