use serde::Serialize;

use super::super::Container;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    pub provider_configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub tracked_clients: usize,
}

pub struct HealthController<'a> {
    container: &'a Container,
}

impl<'a> HealthController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub fn status(&self) -> HealthStatus {
        HealthStatus {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
            provider_configured: self.container.generate_chart_use_case().is_configured(),
            model: self.container.model().map(String::from),
            tracked_clients: self.container.rate_limiter().tracked_clients(),
        }
    }
}
