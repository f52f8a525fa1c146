//! Stats module - Descriptive statistics and correlation

mod calculator;

pub use calculator::{
    ColumnMoment, ColumnSummary, CorrelationMatrix, StatsCalculator, StatsError, StatsReport,
};
