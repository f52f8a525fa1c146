//! Static Chart Renderer
//! Draws the four medal charts as PNG files with plotters.
//!
//! Charts, in render order:
//! 1. Line: summer vs winter totals of the top 10 countries by total medals
//! 2. Grouped bar: summer vs winter golds of the top 10 countries by total golds
//! 3. Heatmap: correlation matrix of every numeric column, annotated per cell
//! 4. Pie: share of total medals of the top 5 countries plus the rest

use crate::charts::plotter::{
    ChartPlotter, GoldBarGroup, LineChartData, PieSlice, BAR_WIDTH, PALETTE, SUMMER_COLOR,
    WINTER_COLOR,
};
use crate::data::{DataProcessor, ProcessorError};
use crate::stats::{CorrelationMatrix, StatsCalculator, StatsError};
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use polars::prelude::DataFrame;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

const FONT: &str = "sans-serif";

pub const LINE_CHART_FILE: &str = "total_medals_line.png";
pub const BAR_CHART_FILE: &str = "gold_medals_bar.png";
pub const HEATMAP_FILE: &str = "correlation_heatmap.png";
pub const PIE_CHART_FILE: &str = "medal_share_pie.png";

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Failed to read medal table: {0}")]
    Data(#[from] ProcessorError),
    #[error("Failed to compute correlations: {0}")]
    Stats(#[from] StatsError),
    #[error("Drawing failed: {0}")]
    Drawing(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Nothing to draw for {0}")]
    NoData(&'static str),
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for ChartError {
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        ChartError::Drawing(err.to_string())
    }
}

/// Writes chart images into an output directory.
pub struct StaticChartRenderer {
    out_dir: PathBuf,
    width: u32,
    height: u32,
}

impl StaticChartRenderer {
    pub fn new(out_dir: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        Self {
            out_dir: out_dir.into(),
            width,
            height,
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Render all four charts in the fixed order: line, bar, heatmap, pie.
    ///
    /// `on_rendered` runs for each image as soon as it is written, before the
    /// next chart is drawn.
    pub fn render_all<F>(
        &self,
        df: &DataFrame,
        mut on_rendered: F,
    ) -> Result<Vec<PathBuf>, ChartError>
    where
        F: FnMut(&Path),
    {
        fs::create_dir_all(&self.out_dir)?;

        let stages: [fn(&Self, &DataFrame) -> Result<PathBuf, ChartError>; 4] = [
            Self::render_line_chart,
            Self::render_bar_chart,
            Self::render_heatmap,
            Self::render_pie_chart,
        ];
        let mut written = Vec::with_capacity(stages.len());
        for render in stages {
            let path = render(self, df)?;
            on_rendered(&path);
            written.push(path);
        }
        Ok(written)
    }

    fn bold(size: u32) -> FontDesc<'static> {
        (FONT, size).into_font().style(FontStyle::Bold)
    }

    fn rotated(size: u32) -> FontDesc<'static> {
        (FONT, size).into_font().transform(FontTransform::Rotate90)
    }

    /// Total medals for the top 10 countries, summer and winter as two lines.
    pub fn render_line_chart(&self, df: &DataFrame) -> Result<PathBuf, ChartError> {
        let records = DataProcessor::records(df)?;
        let data = ChartPlotter::line_series(&records);
        let path = self.out_dir.join(LINE_CHART_FILE);

        self.draw_line_chart(&path, &data)?;
        info!(path = %path.display(), countries = data.countries.len(), "rendered line chart");
        Ok(path)
    }

    fn draw_line_chart(&self, path: &Path, data: &LineChartData) -> Result<(), ChartError> {
        let n = data.countries.len().max(1);
        let y_max = ChartPlotter::axis_max(
            data.summer_total
                .iter()
                .chain(data.winter_total.iter())
                .flatten()
                .copied(),
        );

        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(
                "Total Medals for Top 10 Countries in Summer and Winter Olympics",
                Self::bold(24),
            )
            .margin(20)
            .x_label_area_size(110)
            .y_label_area_size(70)
            .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), 0f64..y_max)?;

        chart
            .configure_mesh()
            .x_labels(n)
            .x_label_formatter(&|x| ChartPlotter::category_label(*x, &data.countries))
            .x_label_style(Self::rotated(14))
            .x_desc("Countries")
            .y_desc("Total Medals")
            .axis_desc_style(Self::bold(16))
            .draw()?;

        let series = [
            ("Summer Total Medals", &data.summer_total, SUMMER_COLOR),
            ("Winter Total Medals", &data.winter_total, WINTER_COLOR),
        ];
        for (label, values, color) in series {
            // a missing value breaks the line
            for (run_idx, run) in ChartPlotter::present_runs(values).into_iter().enumerate() {
                let anno = chart
                    .draw_series(LineSeries::new(run, color.stroke_width(2)).point_size(4))?;
                if run_idx == 0 {
                    anno.label(label).legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                    });
                }
            }
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.9))
            .border_style(&BLACK)
            .label_font((FONT, 16))
            .draw()?;

        root.present()?;
        Ok(())
    }

    /// Summer and winter gold medals for the top 10 countries by total golds.
    pub fn render_bar_chart(&self, df: &DataFrame) -> Result<PathBuf, ChartError> {
        let records = DataProcessor::records(df)?;
        let groups = ChartPlotter::gold_bars(&records);
        let path = self.out_dir.join(BAR_CHART_FILE);

        self.draw_bar_chart(&path, &groups)?;
        info!(
            path = %path.display(),
            countries = groups.len(),
            bar_width = BAR_WIDTH,
            "rendered grouped bar chart"
        );
        Ok(path)
    }

    fn draw_bar_chart(&self, path: &Path, groups: &[GoldBarGroup]) -> Result<(), ChartError> {
        let countries: Vec<String> = groups.iter().map(|g| g.country.clone()).collect();
        let n = countries.len().max(1);
        let y_max = ChartPlotter::axis_max(
            groups
                .iter()
                .flat_map(|g| [g.summer, g.winter])
                .flatten()
                .map(|b| b.value),
        );

        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(
                "Top 10 Countries by Total Gold Medals in Summer and Winter Olympics",
                Self::bold(24),
            )
            .margin(20)
            .x_label_area_size(110)
            .y_label_area_size(70)
            .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), 0f64..y_max)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(n)
            .x_label_formatter(&|x| ChartPlotter::category_label(*x, &countries))
            .x_label_style(Self::rotated(14))
            .x_desc("Countries")
            .y_desc("Gold Medals")
            .axis_desc_style(Self::bold(16))
            .draw()?;

        chart
            .draw_series(groups.iter().filter_map(|g| g.summer).map(|b| {
                Rectangle::new([(b.left, 0.0), (b.right, b.value)], SUMMER_COLOR.filled())
            }))?
            .label("Summer Gold Medals")
            .legend(|(x, y)| Rectangle::new([(x, y - 6), (x + 14, y + 6)], SUMMER_COLOR.filled()));

        chart
            .draw_series(groups.iter().filter_map(|g| g.winter).map(|b| {
                Rectangle::new([(b.left, 0.0), (b.right, b.value)], WINTER_COLOR.filled())
            }))?
            .label("Winter Gold Medals")
            .legend(|(x, y)| Rectangle::new([(x, y - 6), (x + 14, y + 6)], WINTER_COLOR.filled()));

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.9))
            .border_style(&BLACK)
            .label_font((FONT, 16))
            .draw()?;

        root.present()?;
        Ok(())
    }

    /// Correlation heatmap of every numeric column.
    pub fn render_heatmap(&self, df: &DataFrame) -> Result<PathBuf, ChartError> {
        let matrix = StatsCalculator::correlate(df)?;
        if matrix.is_empty() {
            return Err(ChartError::NoData("correlation heatmap"));
        }
        let path = self.out_dir.join(HEATMAP_FILE);

        self.draw_heatmap(&path, &matrix)?;
        info!(path = %path.display(), columns = matrix.len(), "rendered correlation heatmap");
        Ok(path)
    }

    fn draw_heatmap(&self, path: &Path, matrix: &CorrelationMatrix) -> Result<(), ChartError> {
        let k = matrix.len();
        // first column at the top of the grid
        let row_y = |i: usize| (k - 1 - i) as f64;
        let row_labels: Vec<String> = matrix.columns.iter().rev().cloned().collect();

        let side = self.width.max(self.height);
        let root = BitMapBackend::new(path, (side, side)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(
                "Correlation Heatmap of Medal and Participation Metrics",
                Self::bold(24),
            )
            .margin(20)
            .x_label_area_size(140)
            .y_label_area_size(140)
            .build_cartesian_2d(-0.5f64..(k as f64 - 0.5), -0.5f64..(k as f64 - 0.5))?;

        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(k)
            .y_labels(k)
            .x_label_formatter(&|x| ChartPlotter::category_label(*x, &matrix.columns))
            .y_label_formatter(&|y| ChartPlotter::category_label(*y, &row_labels))
            .x_label_style(Self::rotated(13))
            .y_label_style(Self::bold(13))
            .draw()?;

        let cells: Vec<(f64, f64, f64)> = (0..k)
            .flat_map(|i| (0..k).map(move |j| (j as f64, row_y(i), matrix.values[i][j])))
            .collect();

        chart.draw_series(cells.iter().map(|&(x, y, r)| {
            Rectangle::new(
                [(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)],
                ChartPlotter::coolwarm(r).filled(),
            )
        }))?;
        chart.draw_series(cells.iter().map(|&(x, y, _)| {
            Rectangle::new([(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)], WHITE.stroke_width(1))
        }))?;

        let annotation_size = if k > 12 { 10 } else { 14 };
        chart.draw_series(cells.iter().map(|&(x, y, r)| {
            let text = if r.is_nan() {
                "nan".to_string()
            } else {
                format!("{:.2}", r)
            };
            let color = if r.abs() > 0.6 { &WHITE } else { &BLACK };
            let style = TextStyle::from((FONT, annotation_size).into_font())
                .color(color)
                .pos(Pos::new(HPos::Center, VPos::Center));
            Text::new(text, (x, y), style)
        }))?;

        root.present()?;
        Ok(())
    }

    /// Medal share of the top 5 countries, remainder as "Other Countries".
    pub fn render_pie_chart(&self, df: &DataFrame) -> Result<PathBuf, ChartError> {
        let records = DataProcessor::records(df)?;
        let slices = ChartPlotter::pie_slices(&records);
        let path = self.out_dir.join(PIE_CHART_FILE);

        self.draw_pie_chart(&path, &slices)?;
        info!(path = %path.display(), slices = slices.len(), "rendered pie chart");
        Ok(path)
    }

    fn draw_pie_chart(&self, path: &Path, slices: &[PieSlice]) -> Result<(), ChartError> {
        let sizes: Vec<f64> = slices.iter().map(|s| s.value.max(0.0)).collect();
        if sizes.iter().sum::<f64>() <= 0.0 {
            return Err(ChartError::NoData("medal share pie chart"));
        }
        let labels: Vec<String> = slices.iter().map(|s| s.label.clone()).collect();
        let colors: Vec<RGBColor> = (0..slices.len())
            .map(|i| PALETTE[i % PALETTE.len()])
            .collect();

        let side = self.height;
        let root = BitMapBackend::new(path, (side, side)).into_drawing_area();
        root.fill(&WHITE)?;
        let root = root.titled(
            "Distribution of Total Medals Among Top 5 Countries",
            Self::bold(22),
        )?;

        let (w, h) = root.dim_in_pixel();
        let center = (w as i32 / 2, h as i32 / 2);
        let radius = f64::from(w.min(h)) * 0.32;

        let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
        pie.start_angle(140.0);
        pie.label_style(Self::bold(16).color(&BLACK));
        pie.percentages(Self::bold(14).color(&WHITE));
        root.draw(&pie)?;

        root.present()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use polars::prelude::Column;
    use std::cell::RefCell;
    use tempfile::tempdir;

    fn medal_frame(with_winter_total: bool, total_total: Vec<Option<f64>>) -> Result<DataFrame> {
        let n = total_total.len();
        let countries: Vec<String> = (0..n).map(|i| format!("Country {i}")).collect();
        let scaled = |k: f64| -> Vec<f64> { (0..n).map(|i| k * (i as f64 + 1.0)).collect() };

        let mut columns = vec![
            Column::new("countries".into(), countries),
            Column::new("summer_gold".into(), scaled(3.0)),
            Column::new("summer_total".into(), scaled(10.0)),
            Column::new("winter_gold".into(), scaled(1.0)),
        ];
        if with_winter_total {
            columns.push(Column::new("winter_total".into(), scaled(4.0)));
        }
        columns.push(Column::new("total_gold".into(), scaled(4.0)));
        columns.push(Column::new("total_total".into(), total_total));
        columns.push(Column::new(
            "summer_participations".into(),
            (0..n).map(|i| (i as i64 * 7) % 5 + 1).collect::<Vec<i64>>(),
        ));
        Ok(DataProcessor::clean(DataFrame::new(columns)?)?)
    }

    fn totals(n: usize) -> Vec<Option<f64>> {
        (0..n).map(|i| Some(14.0 * (i as f64 + 1.0))).collect()
    }

    #[test]
    fn test_render_all_writes_charts_in_order() -> Result<()> {
        let dir = tempdir()?;
        let df = medal_frame(true, totals(12))?;
        let renderer = StaticChartRenderer::new(dir.path(), 640, 480);

        let seen = RefCell::new(Vec::new());
        let written = renderer.render_all(&df, |path| {
            // nothing after this chart exists yet
            let later = [LINE_CHART_FILE, BAR_CHART_FILE, HEATMAP_FILE, PIE_CHART_FILE]
                .iter()
                .skip(seen.borrow().len() + 1)
                .any(|name| dir.path().join(name).exists());
            assert!(!later, "{} displayed after a later chart", path.display());
            seen.borrow_mut().push(path.to_path_buf());
        })?;

        let names: Vec<&str> = written
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
            .collect();
        assert_eq!(
            names,
            vec![LINE_CHART_FILE, BAR_CHART_FILE, HEATMAP_FILE, PIE_CHART_FILE]
        );
        assert_eq!(seen.into_inner(), written);
        for path in &written {
            assert!(path.is_file(), "{} missing", path.display());
            assert!(fs::metadata(path)?.len() > 0);
        }
        Ok(())
    }

    #[test]
    fn test_line_chart_missing_column_is_data_error() -> Result<()> {
        let dir = tempdir()?;
        let df = medal_frame(false, totals(5))?;
        let renderer = StaticChartRenderer::new(dir.path(), 640, 480);

        let err = renderer.render_line_chart(&df).unwrap_err();
        assert!(matches!(
            err,
            ChartError::Data(ProcessorError::MissingColumn(ref c)) if c == "winter_total"
        ));
        assert!(!dir.path().join(LINE_CHART_FILE).exists());
        Ok(())
    }

    #[test]
    fn test_pie_chart_without_totals_has_no_data() -> Result<()> {
        let dir = tempdir()?;
        let df = medal_frame(true, vec![None; 6])?;
        let renderer = StaticChartRenderer::new(dir.path(), 640, 480);

        let err = renderer.render_pie_chart(&df).unwrap_err();
        assert!(matches!(err, ChartError::NoData(_)));
        Ok(())
    }

    #[test]
    fn test_render_all_stops_at_first_failure() -> Result<()> {
        let dir = tempdir()?;
        let df = medal_frame(false, totals(5))?;
        let renderer = StaticChartRenderer::new(dir.path(), 640, 480);

        let mut shown = 0;
        let result = renderer.render_all(&df, |_| shown += 1);
        assert!(matches!(result, Err(ChartError::Data(_))));
        assert_eq!(shown, 0);
        Ok(())
    }
}
