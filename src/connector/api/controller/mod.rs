pub mod generate_chart_controller;
pub mod health_controller;

pub use generate_chart_controller::{GenerateChartBody, GenerateChartController};
pub use health_controller::{HealthController, HealthStatus};
