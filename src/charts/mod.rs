//! Charts module - Chart data preparation and static rendering

mod plotter;
mod renderer;

pub use renderer::StaticChartRenderer;
