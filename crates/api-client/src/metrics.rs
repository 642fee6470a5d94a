//! Request metrics
//!
//! - `api_requests_total` (counter): labels `method`, `status`
//! - `api_transport_errors_total` (counter)
//! - `api_forced_logouts_total` (counter)
//!
//! Without an installed recorder these calls are no-ops.

/// Record a request that reached the backend.
pub fn record_request(method: &str, status: u16) {
    metrics::counter!("api_requests_total", "method" => method.to_string(), "status" => status.to_string())
        .increment(1);
}

/// Record a request that never got an HTTP response.
pub fn record_transport_error() {
    metrics::counter!("api_transport_errors_total").increment(1);
}

/// Record a session ended because the backend answered 401.
pub fn record_forced_logout() {
    metrics::counter!("api_forced_logouts_total").increment(1);
}
