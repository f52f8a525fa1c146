//! Data module - CSV loading and cleaning

mod loader;
mod processor;

pub use loader::MedalLoader;
pub use processor::{CountryMedalRecord, DataProcessor, ProcessorError};
