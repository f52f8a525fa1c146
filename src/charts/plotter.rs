//! Chart Plotter Module
//! Prepares the series drawn by the static renderer: top-N selections,
//! grouped bar geometry, pie slices and the heatmap color scale.

use crate::data::{CountryMedalRecord, DataProcessor};
use plotters::style::RGBColor;

/// Countries shown on the line and bar charts.
pub const TOP_COUNTRIES: usize = 10;
/// Countries given their own pie slice.
pub const PIE_COUNTRIES: usize = 5;
/// Width of a single bar, in category units.
pub const BAR_WIDTH: f64 = 0.35;
/// Label of the remainder pie slice.
pub const OTHER_LABEL: &str = "Other Countries";

pub const SUMMER_COLOR: RGBColor = RGBColor(52, 152, 219); // Blue
pub const WINTER_COLOR: RGBColor = RGBColor(231, 76, 60); // Red

pub const PALETTE: [RGBColor; 10] = [
    RGBColor(52, 152, 219),  // Blue
    RGBColor(231, 76, 60),   // Red
    RGBColor(46, 204, 113),  // Green
    RGBColor(155, 89, 182),  // Purple
    RGBColor(243, 156, 18),  // Orange
    RGBColor(26, 188, 156),  // Teal
    RGBColor(233, 30, 99),   // Pink
    RGBColor(0, 188, 212),   // Cyan
    RGBColor(121, 85, 72),   // Brown
    RGBColor(96, 125, 139),  // Blue Grey
];

/// Summer and winter totals of the top countries by `total_total`.
#[derive(Debug, Clone, PartialEq)]
pub struct LineChartData {
    pub countries: Vec<String>,
    pub summer_total: Vec<Option<f64>>,
    pub winter_total: Vec<Option<f64>>,
}

/// One bar of the grouped gold chart: `[left, right]` on the x axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub left: f64,
    pub right: f64,
    pub value: f64,
}

/// Pair of bars flanking the tick of one country.
#[derive(Debug, Clone, PartialEq)]
pub struct GoldBarGroup {
    pub country: String,
    pub summer: Option<Bar>,
    pub winter: Option<Bar>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub label: String,
    pub value: f64,
}

/// Builds chart series from the medal records.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Top countries by total medals, largest first.
    pub fn line_series(records: &[CountryMedalRecord]) -> LineChartData {
        let top = DataProcessor::top_n(records, TOP_COUNTRIES, |r| r.total_total);
        LineChartData {
            countries: top.iter().map(|r| r.country.clone()).collect(),
            summer_total: top.iter().map(|r| r.summer_total).collect(),
            winter_total: top.iter().map(|r| r.winter_total).collect(),
        }
    }

    /// Top countries by total gold, each with a summer bar left of the tick
    /// and a winter bar right of it.
    pub fn gold_bars(records: &[CountryMedalRecord]) -> Vec<GoldBarGroup> {
        DataProcessor::top_n(records, TOP_COUNTRIES, |r| r.total_gold)
            .into_iter()
            .enumerate()
            .map(|(i, r)| {
                let position = i as f64;
                let summer_center = position - BAR_WIDTH / 2.0;
                let winter_center = position + BAR_WIDTH / 2.0;
                GoldBarGroup {
                    country: r.country,
                    summer: r.summer_gold.map(|v| Self::bar_at(summer_center, v)),
                    winter: r.winter_gold.map(|v| Self::bar_at(winter_center, v)),
                }
            })
            .collect()
    }

    fn bar_at(center: f64, value: f64) -> Bar {
        Bar {
            left: center - BAR_WIDTH / 2.0,
            right: center + BAR_WIDTH / 2.0,
            value,
        }
    }

    /// Top five countries by total medals plus an "Other Countries" slice
    /// holding the rest of the grand total.
    pub fn pie_slices(records: &[CountryMedalRecord]) -> Vec<PieSlice> {
        let top = DataProcessor::top_n(records, PIE_COUNTRIES, |r| r.total_total);
        let grand_total: f64 = records.iter().filter_map(|r| r.total_total).sum();
        let top_total: f64 = top.iter().filter_map(|r| r.total_total).sum();

        let mut slices: Vec<PieSlice> = top
            .into_iter()
            .map(|r| PieSlice {
                value: r.total_total.unwrap_or(0.0),
                label: r.country,
            })
            .collect();
        slices.push(PieSlice {
            label: OTHER_LABEL.to_string(),
            value: grand_total - top_total,
        });
        slices
    }

    /// Consecutive present values as `(position, value)` runs; a missing
    /// value ends the current run.
    pub fn present_runs(values: &[Option<f64>]) -> Vec<Vec<(f64, f64)>> {
        let mut runs = Vec::new();
        let mut current = Vec::new();
        for (i, value) in values.iter().enumerate() {
            match value {
                Some(v) => current.push((i as f64, *v)),
                None if !current.is_empty() => runs.push(std::mem::take(&mut current)),
                None => {}
            }
        }
        if !current.is_empty() {
            runs.push(current);
        }
        runs
    }

    /// Label for a category axis whose ticks sit on integer positions.
    pub fn category_label(x: f64, labels: &[String]) -> String {
        let idx = x.round();
        if (x - idx).abs() > 1e-6 || idx < 0.0 {
            return String::new();
        }
        labels.get(idx as usize).cloned().unwrap_or_default()
    }

    /// Diverging blue-white-red scale for correlations in [-1, 1].
    pub fn coolwarm(r: f64) -> RGBColor {
        const COLD: (f64, f64, f64) = (59.0, 76.0, 192.0);
        const MID: (f64, f64, f64) = (221.0, 221.0, 221.0);
        const WARM: (f64, f64, f64) = (180.0, 4.0, 38.0);

        if r.is_nan() {
            return RGBColor(255, 255, 255);
        }
        let t = r.clamp(-1.0, 1.0);
        let (from, to, frac) = if t < 0.0 {
            (MID, COLD, -t)
        } else {
            (MID, WARM, t)
        };
        let mix = |a: f64, b: f64| (a + (b - a) * frac).round() as u8;
        RGBColor(mix(from.0, to.0), mix(from.1, to.1), mix(from.2, to.2))
    }

    /// Upper bound for a value axis, leaving headroom above the largest value.
    pub fn axis_max<I>(values: I) -> f64
    where
        I: IntoIterator<Item = f64>,
    {
        let max = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(0.0f64, f64::max);
        if max <= 0.0 {
            1.0
        } else {
            max * 1.1
        }
    }
}
