mod generate_chart;

pub use generate_chart::*;
