//! Structured logging configuration.
//!
//! Records emitted by `cup_bracket` through the `log` facade are bridged into
//! the same subscriber, so library and server events share one output.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Log levels come from `RUST_LOG`, defaulting to `info` with sqlx and hyper
/// quietened.
///
/// # Example
///
/// ```no_run
/// use cup_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,hyper=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log how long an operation took, warning when it is slow
///
/// # Example
///
/// ```
/// use cup_server::logging::log_performance;
/// use std::time::Instant;
///
/// let start = Instant::now();
/// // ... rebuild the bracket ...
/// log_performance("bracket_rebuild", start.elapsed().as_millis() as u64, Some("12 teams"));
/// ```
pub fn log_performance(operation: &str, duration_ms: u64, metadata: Option<&str>) {
    if duration_ms > 1000 {
        tracing::warn!(
            operation = operation,
            duration_ms = duration_ms,
            metadata = metadata,
            "PERFORMANCE: Slow operation"
        );
    } else {
        tracing::debug!(
            operation = operation,
            duration_ms = duration_ms,
            metadata = metadata,
            "Performance metric"
        );
    }
}

/// Log a completed API request
pub fn log_api_request(
    request_id: &str,
    method: &str,
    path: &str,
    status_code: u16,
    duration_ms: u64,
) {
    tracing::info!(
        request_id = request_id,
        http_method = method,
        http_path = path,
        http_status = status_code,
        duration_ms = duration_ms,
        "Request completed"
    );
}

/// Log a live feed connection opening or closing
pub fn log_feed_connection(subscriber_id: u64, connected: bool, subscribers: usize) {
    if connected {
        tracing::info!(
            subscriber_id = subscriber_id,
            subscribers = subscribers,
            "Live feed viewer connected"
        );
    } else {
        tracing::info!(
            subscriber_id = subscriber_id,
            subscribers = subscribers,
            "Live feed viewer disconnected"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_performance() {
        log_performance("test_operation", 500, Some("metadata"));
        log_performance("slow_operation", 2000, None);
    }

    #[test]
    fn test_log_api_request() {
        log_api_request("abc", "GET", "/api/v1/scores", 200, 4);
        log_api_request("def", "POST", "/api/v1/registrations", 400, 12);
    }

    #[test]
    fn test_log_feed_connection() {
        log_feed_connection(1, true, 1);
        log_feed_connection(1, false, 0);
    }
}
