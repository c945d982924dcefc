use std::time::Instant;

use actix_web::{
    Error,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
};
use tracing::{debug, warn};

/**
 * Requests slower than this are logged as warnings.
 */
const SLOW_REQUEST_MILLIS: u128 = 1000;

/**
 * Middleware for timing requests. Logs method, path, status and duration under the
 * `performance` target.
 */
pub async fn timing_middleware(request: ServiceRequest, next: Next<impl MessageBody>) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let start_time = Instant::now();
    let path = request.path().to_owned();
    let method = request.method().clone();
    let response = next.call(request).await;
    let status = match &response {
        Ok(service_response) => service_response.status().as_u16(),
        Err(err) => err.as_response_error().status_code().as_u16(),
    };
    let elapsed = start_time.elapsed().as_millis();
    if elapsed >= SLOW_REQUEST_MILLIS {
        warn!(target: "performance", "Slow request {} {} with status {} took {}ms", method, path, status, elapsed);
    } else {
        debug!(target: "performance", "Request {} {} with status {} took {}ms", method, path, status, elapsed);
    }
    response
}
