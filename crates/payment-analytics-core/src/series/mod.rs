pub mod assembler;
pub mod labels;

pub use assembler::{assemble_series, Series, SeriesMetric, SeriesOrder, SeriesPoint, SeriesSelection, SeriesSpec};
pub use labels::{bucket_label, display_name, Category};
