//! Statistics Calculator Module
//! Handles descriptive statistics, Pearson correlation, skewness and kurtosis
//! over the numeric columns of the medal table.

use crate::data::DataProcessor;
use polars::prelude::*;
use rayon::prelude::*;
use serde::Serialize;
use statrs::statistics::Statistics;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// Descriptive statistics for a single column.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub q50: f64,
    pub q75: f64,
    pub max: f64,
}

impl ColumnSummary {
    fn empty(column: &str) -> Self {
        Self {
            column: column.to_string(),
            count: 0,
            mean: f64::NAN,
            std: f64::NAN,
            min: f64::NAN,
            q25: f64::NAN,
            q50: f64::NAN,
            q75: f64::NAN,
            max: f64::NAN,
        }
    }
}

/// A single per-column moment (skewness or kurtosis).
#[derive(Debug, Clone, Serialize)]
pub struct ColumnMoment {
    pub column: String,
    pub value: f64,
}

/// Pairwise Pearson correlation over the numeric columns.
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Everything computed from the cleaned table.
#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    pub rows: usize,
    pub describe: Vec<ColumnSummary>,
    pub correlation: CorrelationMatrix,
    pub skewness: Vec<ColumnMoment>,
    pub kurtosis: Vec<ColumnMoment>,
}

impl StatsReport {
    pub fn compute(df: &DataFrame) -> Result<Self, StatsError> {
        Ok(Self {
            rows: df.height(),
            describe: StatsCalculator::describe(df)?,
            correlation: StatsCalculator::correlate(df)?,
            skewness: StatsCalculator::skewness(df)?,
            kurtosis: StatsCalculator::kurtosis(df)?,
        })
    }
}

/// Handles statistical calculations with multi-threading support.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Compute descriptive statistics for an array of non-missing values.
    pub fn compute_descriptive_stats(column: &str, values: &[f64]) -> ColumnSummary {
        let n = values.len();
        if n == 0 {
            return ColumnSummary::empty(column);
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        ColumnSummary {
            column: column.to_string(),
            count: n,
            mean: values.iter().mean(),
            // sample std, NaN for a single value
            std: values.iter().std_dev(),
            min: sorted[0],
            q25: Self::percentile(&sorted, 25.0),
            q50: Self::percentile(&sorted, 50.0),
            q75: Self::percentile(&sorted, 75.0),
            max: sorted[n - 1],
        }
    }

    /// Calculate percentile using linear interpolation (NumPy compatible).
    fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let n = sorted_values.len();
        if n == 0 {
            return f64::NAN;
        }
        if n == 1 {
            return sorted_values[0];
        }

        let rank = (p / 100.0) * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = (rank.ceil() as usize).min(n - 1);
        let frac = rank - lower as f64;

        if lower == upper {
            sorted_values[lower]
        } else {
            sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
        }
    }

    /// Pearson correlation over the rows where both values are present.
    pub fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> f64 {
        let pairs: Vec<(f64, f64)> = xs
            .iter()
            .zip(ys.iter())
            .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
            .collect();
        if pairs.len() < 2 {
            return f64::NAN;
        }

        let n = pairs.len() as f64;
        let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
        let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

        let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
        for (x, y) in &pairs {
            let dx = x - mean_x;
            let dy = y - mean_y;
            sxy += dx * dy;
            sxx += dx * dx;
            syy += dy * dy;
        }
        if sxx == 0.0 || syy == 0.0 {
            return f64::NAN;
        }

        (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
    }

    /// Biased (Fisher) skewness: m3 / m2^1.5.
    pub fn sample_skewness(values: &[f64]) -> f64 {
        if values.len() < 2 {
            return f64::NAN;
        }
        let Some((m2, m3, _)) = Self::central_moments(values) else {
            return f64::NAN;
        };
        m3 / m2.powf(1.5)
    }

    /// Biased excess kurtosis: m4 / m2^2 - 3.
    pub fn excess_kurtosis(values: &[f64]) -> f64 {
        if values.len() < 4 {
            return f64::NAN;
        }
        let Some((m2, _, m4)) = Self::central_moments(values) else {
            return f64::NAN;
        };
        m4 / (m2 * m2) - 3.0
    }

    /// Second, third and fourth central moments. `None` for zero variance.
    fn central_moments(values: &[f64]) -> Option<(f64, f64, f64)> {
        let n = values.len() as f64;
        let mean = values.iter().mean();
        let m2 = values.iter().population_variance();
        if m2 <= (f64::EPSILON * mean).powi(2) {
            return None;
        }
        let m3 = values.iter().map(|x| (x - mean).powi(3)).sum::<f64>() / n;
        let m4 = values.iter().map(|x| (x - mean).powi(4)).sum::<f64>() / n;
        Some((m2, m3, m4))
    }

    /// Non-missing values of a column.
    fn present_values(df: &DataFrame, column: &str) -> Result<Vec<f64>, StatsError> {
        Ok(DataProcessor::column_values(df, column)?
            .into_iter()
            .flatten()
            .collect())
    }

    /// Descriptive statistics for every numeric column, in header order.
    pub fn describe(df: &DataFrame) -> Result<Vec<ColumnSummary>, StatsError> {
        DataProcessor::numeric_columns(df)
            .par_iter()
            .map(|column| {
                let values = Self::present_values(df, column)?;
                Ok(Self::compute_descriptive_stats(column, &values))
            })
            .collect()
    }

    /// Pairwise Pearson correlation matrix over the numeric columns.
    pub fn correlate(df: &DataFrame) -> Result<CorrelationMatrix, StatsError> {
        let columns = DataProcessor::numeric_columns(df);
        let data: Vec<Vec<Option<f64>>> = columns
            .iter()
            .map(|c| DataProcessor::column_values(df, c))
            .collect::<PolarsResult<_>>()?;

        let k = columns.len();
        // upper triangle only, mirrored below to keep the matrix symmetric
        let upper: Vec<Vec<f64>> = (0..k)
            .into_par_iter()
            .map(|i| {
                (i..k)
                    .map(|j| {
                        let r = Self::pearson(&data[i], &data[j]);
                        if i == j && !r.is_nan() {
                            1.0
                        } else {
                            r
                        }
                    })
                    .collect()
            })
            .collect();

        let mut values = vec![vec![f64::NAN; k]; k];
        for (i, row) in upper.iter().enumerate() {
            for (offset, &r) in row.iter().enumerate() {
                let j = i + offset;
                values[i][j] = r;
                values[j][i] = r;
            }
        }

        Ok(CorrelationMatrix { columns, values })
    }

    /// Skewness of every numeric column over its non-missing values.
    pub fn skewness(df: &DataFrame) -> Result<Vec<ColumnMoment>, StatsError> {
        Self::per_column(df, Self::sample_skewness)
    }

    /// Excess kurtosis of every numeric column over its non-missing values.
    pub fn kurtosis(df: &DataFrame) -> Result<Vec<ColumnMoment>, StatsError> {
        Self::per_column(df, Self::excess_kurtosis)
    }

    fn per_column<F>(df: &DataFrame, moment: F) -> Result<Vec<ColumnMoment>, StatsError>
    where
        F: Fn(&[f64]) -> f64 + Sync,
    {
        DataProcessor::numeric_columns(df)
            .par_iter()
            .map(|column| {
                let values = Self::present_values(df, column)?;
                Ok(ColumnMoment {
                    column: column.clone(),
                    value: moment(&values),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn corr_get(matrix: &CorrelationMatrix, a: &str, b: &str) -> f64 {
        let i = matrix.columns.iter().position(|c| c == a).unwrap();
        let j = matrix.columns.iter().position(|c| c == b).unwrap();
        matrix.values[i][j]
    }

    fn medal_frame() -> DataFrame {
        DataFrame::new(vec![
            Column::new("countries".into(), vec!["USA", "China", "Norway", "Chad"]),
            Column::new(
                "summer_gold".into(),
                vec![Some(39.0), None, Some(4.0), Some(1.0)],
            ),
            Column::new("summer_total".into(), vec![113.0, 88.0, 12.0, 1.0]),
            Column::new("winter_total".into(), vec![25.0, 15.0, 37.0, 0.0]),
            Column::new("flat".into(), vec![5.0, 5.0, 5.0, 5.0]),
            Column::new("empty".into(), vec![None::<f64>, None, None, None]),
        ])
        .unwrap()
    }

    #[test]
    fn test_descriptive_stats_quartiles() {
        let s = StatsCalculator::compute_descriptive_stats("x", &[4.0, 1.0, 3.0, 2.0]);
        assert_eq!(s.count, 4);
        assert!((s.mean - 2.5).abs() < EPS);
        assert!((s.std - (5.0f64 / 3.0).sqrt()).abs() < EPS);
        assert_eq!(s.min, 1.0);
        assert!((s.q25 - 1.75).abs() < EPS);
        assert!((s.q50 - 2.5).abs() < EPS);
        assert!((s.q75 - 3.25).abs() < EPS);
        assert_eq!(s.max, 4.0);
    }

    #[test]
    fn test_describe_counts_and_mean_skip_missing() {
        let df = medal_frame();
        let summaries = StatsCalculator::describe(&df).unwrap();
        let names: Vec<&str> = summaries.iter().map(|s| s.column.as_str()).collect();
        assert_eq!(
            names,
            vec!["summer_gold", "summer_total", "winter_total", "flat", "empty"]
        );

        let gold = &summaries[0];
        assert_eq!(gold.count, 3);
        assert!((gold.mean - 44.0 / 3.0).abs() < EPS);

        let empty = &summaries[4];
        assert_eq!(empty.count, 0);
        assert!(empty.mean.is_nan());
    }

    #[test]
    fn test_single_value_has_undefined_std() {
        let s = StatsCalculator::compute_descriptive_stats("x", &[7.0]);
        assert_eq!(s.count, 1);
        assert_eq!(s.mean, 7.0);
        assert!(s.std.is_nan());
    }

    #[test]
    fn test_correlation_symmetric_with_unit_diagonal() {
        let df = medal_frame();
        let corr = StatsCalculator::correlate(&df).unwrap();
        assert_eq!(corr.len(), 5);

        for i in 0..corr.len() {
            for j in 0..corr.len() {
                let (a, b) = (corr.values[i][j], corr.values[j][i]);
                assert!(a == b || (a.is_nan() && b.is_nan()), "({i},{j})");
            }
        }
        for name in ["summer_gold", "summer_total", "winter_total"] {
            assert_eq!(corr_get(&corr, name, name), 1.0);
        }
    }

    #[test]
    fn test_constant_and_empty_columns_are_nan() {
        let df = medal_frame();
        let corr = StatsCalculator::correlate(&df).unwrap();
        assert!(corr_get(&corr, "flat", "flat").is_nan());
        assert!(corr_get(&corr, "flat", "summer_total").is_nan());
        assert!(corr_get(&corr, "empty", "summer_total").is_nan());
    }

    #[test]
    fn test_pearson_uses_pairwise_complete_rows() {
        let xs = [Some(1.0), Some(2.0), None, Some(3.0)];
        let ys = [Some(2.0), Some(4.0), Some(100.0), Some(6.0)];
        assert!((StatsCalculator::pearson(&xs, &ys) - 1.0).abs() < EPS);

        let inverse = [Some(3.0), Some(2.0), Some(0.0), Some(1.0)];
        assert!((StatsCalculator::pearson(&xs, &inverse) + 1.0).abs() < EPS);
    }

    #[test]
    fn test_skewness_and_kurtosis_values() {
        assert!((StatsCalculator::sample_skewness(&[1.0, 2.0, 10.0]) - 0.674_555_484_5).abs() < 1e-8);
        assert!(StatsCalculator::sample_skewness(&[1.0, 2.0, 3.0]).abs() < EPS);
        assert!((StatsCalculator::excess_kurtosis(&[1.0, 2.0, 3.0, 4.0]) + 1.36).abs() < EPS);

        let heavy = [1.0, 2.0, 3.0, 4.0, 100.0];
        assert!((StatsCalculator::sample_skewness(&heavy) - 1.497_536_703_3).abs() < 1e-8);
        assert!((StatsCalculator::excess_kurtosis(&heavy) - 0.246_716_489_3).abs() < 1e-8);
    }

    #[test]
    fn test_moments_undefined_for_small_or_flat_samples() {
        assert!(StatsCalculator::sample_skewness(&[1.0]).is_nan());
        assert!(StatsCalculator::excess_kurtosis(&[1.0, 2.0, 3.0]).is_nan());
        assert!(StatsCalculator::sample_skewness(&[5.0, 5.0, 5.0]).is_nan());
        assert!(StatsCalculator::excess_kurtosis(&[5.0, 5.0, 5.0, 5.0]).is_nan());
    }

    #[test]
    fn test_skewness_per_column_drops_missing() {
        let df = medal_frame();
        let skew = StatsCalculator::skewness(&df).unwrap();
        let gold = skew.iter().find(|m| m.column == "summer_gold").unwrap();
        assert!((gold.value - StatsCalculator::sample_skewness(&[39.0, 4.0, 1.0])).abs() < EPS);

        let kurt = StatsCalculator::kurtosis(&df).unwrap();
        let gold = kurt.iter().find(|m| m.column == "summer_gold").unwrap();
        assert!(gold.value.is_nan());
    }

    #[test]
    fn test_report_serializes_nan_as_null() {
        let report = StatsReport::compute(&medal_frame()).unwrap();
        assert_eq!(report.rows, 4);
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["describe"][4]["mean"].is_null());
    }
}
