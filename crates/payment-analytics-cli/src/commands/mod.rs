pub mod chart;
pub mod presets;
