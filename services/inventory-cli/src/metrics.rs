//! Prometheus recorder for `--metrics`
//!
//! Collects the counters emitted by the identity and api-client crates:
//! - `token_acquisitions_total` (labels `mode`, `outcome`)
//! - `api_requests_total` (labels `method`, `status`)
//! - `api_transport_errors_total`
//! - `api_forced_logouts_total`

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and return a handle for rendering metrics.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}
