use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::{middleware, Extension, Json};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::domain::ChartReply;

use super::container::AllowedOrigin;
use super::controller::{GenerateChartBody, GenerateChartController, HealthController, HealthStatus};
use super::rate_limit::{enforce_rate_limit, ClientId};
use super::{ApiError, Container};

pub const GENERATE_CHART_PATH: &str = "/api/generate-chart";
pub const HEALTH_PATH: &str = "/health";

/// Builds and serves the HTTP surface.
///
/// Every route under `/api` passes the per-client rate limiter first; the
/// health route does not. CORS admits only the configured origin.
pub struct Router;

impl Router {
    pub fn build(container: Arc<Container>) -> axum::Router {
        let api = axum::Router::new()
            .route(GENERATE_CHART_PATH, post(generate_chart))
            .route_layer(middleware::from_fn_with_state(
                Arc::clone(&container),
                enforce_rate_limit,
            ));

        axum::Router::new()
            .route(HEALTH_PATH, get(health))
            .merge(api)
            .layer(cors_layer(container.allowed_origin()))
            .layer(TraceLayer::new_for_http())
            .with_state(container)
    }

    /// Serve until `shutdown` resolves. Peer addresses are recorded for rate
    /// limiting.
    pub async fn serve<F>(
        listener: TcpListener,
        container: Arc<Container>,
        shutdown: F,
    ) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if let Ok(addr) = listener.local_addr() {
            info!("Listening on http://{}", addr);
        }
        let app = Self::build(container);
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await
    }
}

fn cors_layer(origin: &AllowedOrigin) -> CorsLayer {
    let allow_origin = match origin {
        AllowedOrigin::Any => AllowOrigin::any(),
        // A list match omits the header for foreign origins.
        AllowedOrigin::Exact(value) => AllowOrigin::list([value.clone()]),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

async fn generate_chart(
    State(container): State<Arc<Container>>,
    Extension(ClientId(client_id)): Extension<ClientId>,
    body: Result<Json<GenerateChartBody>, JsonRejection>,
) -> Result<Json<ChartReply>, ApiError> {
    let Json(body) = body?;
    let reply = GenerateChartController::new(&container)
        .generate(body, &client_id)
        .await?;
    Ok(Json(reply))
}

async fn health(State(container): State<Arc<Container>>) -> Json<HealthStatus> {
    Json(HealthController::new(&container).status())
}
