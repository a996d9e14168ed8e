use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::{debug, warn};

use crate::domain::{Admission, DomainError};

use super::{ApiError, Container};

const UNKNOWN_CLIENT: &str = "unknown";

/// Request extension carrying the id the limiter charged the request to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientId(pub String);

/// Client id used for rate limiting: the peer IP address.
pub fn client_id(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// Middleware rejecting callers over their window's ceiling before the
/// handler runs.
pub async fn enforce_rate_limit(
    State(container): State<Arc<Container>>,
    mut request: Request,
    next: Next,
) -> Response {
    let client = client_id(&request);

    match container.rate_limiter().admit(&client, Instant::now()) {
        Admission::Allow => {
            debug!(client = %client, "Rate limit check passed");
            request.extensions_mut().insert(ClientId(client));
            next.run(request).await
        }
        Admission::Deny { retry_after } => {
            warn!(
                client = %client,
                retry_after_secs = retry_after.as_secs(),
                "Rate limit exceeded"
            );
            ApiError::from(DomainError::RateLimited { retry_after }).into_response()
        }
    }
}
