//! # Prometheus Metrics
//!
//! HTTP-level metrics (request counts, latency, errors) are recorded in
//! middleware. Domain-level gauges (orders by status, menu items, cart
//! lines, users) are updated on each `/metrics` scrape (pull model) —
//! see the metrics handler in `lib.rs`.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use prometheus::{
    Encoder, GaugeVec, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};

/// Shared metrics state backed by a Prometheus registry.
#[derive(Clone)]
pub struct ApiMetrics {
    inner: Arc<Inner>,
}

struct Inner {
    registry: Registry,

    // -- HTTP middleware metrics (push model) --
    http_requests_total: IntCounterVec,
    http_request_duration_seconds: HistogramVec,
    http_errors_total: IntCounterVec,

    // -- Domain gauges (pull model, updated on /metrics scrape) --
    orders_total: GaugeVec,
    menu_items_total: prometheus::Gauge,
    cart_lines_total: prometheus::Gauge,
    users_total: prometheus::Gauge,
}

impl std::fmt::Debug for ApiMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiMetrics").finish_non_exhaustive()
    }
}

impl ApiMetrics {
    /// Create a new metrics instance with a fresh Prometheus registry.
    pub fn new() -> Self {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("lemon_http_requests_total", "Total HTTP requests"),
            &["method", "path", "status"],
        )
        .expect("metric can be created");

        let http_request_duration_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "lemon_http_request_duration_seconds",
                "HTTP request duration in seconds",
            )
            .buckets(vec![
                0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ]),
            &["method", "path"],
        )
        .expect("metric can be created");

        let http_errors_total = IntCounterVec::new(
            Opts::new("lemon_http_errors_total", "Total HTTP errors (4xx and 5xx)"),
            &["method", "path", "status"],
        )
        .expect("metric can be created");

        let orders_total = GaugeVec::new(
            Opts::new("lemon_orders_total", "Total orders by status"),
            &["status"],
        )
        .expect("metric can be created");

        let menu_items_total =
            prometheus::Gauge::new("lemon_menu_items_total", "Total menu items in the catalog")
                .expect("metric can be created");

        let cart_lines_total = prometheus::Gauge::new(
            "lemon_cart_lines_total",
            "Pending cart lines across all customers",
        )
        .expect("metric can be created");

        let users_total = prometheus::Gauge::new("lemon_users_total", "Known principals")
            .expect("metric can be created");

        registry
            .register(Box::new(http_requests_total.clone()))
            .expect("metric can be registered");
        registry
            .register(Box::new(http_request_duration_seconds.clone()))
            .expect("metric can be registered");
        registry
            .register(Box::new(http_errors_total.clone()))
            .expect("metric can be registered");
        registry
            .register(Box::new(orders_total.clone()))
            .expect("metric can be registered");
        registry
            .register(Box::new(menu_items_total.clone()))
            .expect("metric can be registered");
        registry
            .register(Box::new(cart_lines_total.clone()))
            .expect("metric can be registered");
        registry
            .register(Box::new(users_total.clone()))
            .expect("metric can be registered");

        Self {
            inner: Arc::new(Inner {
                registry,
                http_requests_total,
                http_request_duration_seconds,
                http_errors_total,
                orders_total,
                menu_items_total,
                cart_lines_total,
                users_total,
            }),
        }
    }

    /// Record an HTTP request (called by the middleware).
    fn record_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.inner
            .http_requests_total
            .with_label_values(&[method, path, &status_str])
            .inc();

        self.inner
            .http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);

        if status >= 400 {
            self.inner
                .http_errors_total
                .with_label_values(&[method, path, &status_str])
                .inc();
        }
    }

    // -- Domain gauge accessors (used by the /metrics handler) --

    /// Access the orders-by-status gauge for updating.
    pub fn orders_total(&self) -> &GaugeVec {
        &self.inner.orders_total
    }

    /// Access the menu item count gauge for updating.
    pub fn menu_items_total(&self) -> &prometheus::Gauge {
        &self.inner.menu_items_total
    }

    /// Access the cart line count gauge for updating.
    pub fn cart_lines_total(&self) -> &prometheus::Gauge {
        &self.inner.cart_lines_total
    }

    /// Access the user count gauge for updating.
    pub fn users_total(&self) -> &prometheus::Gauge {
        &self.inner.users_total
    }

    /// Gather all metrics and encode to Prometheus text format.
    pub fn gather_and_encode(&self) -> Result<String, String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| format!("failed to encode metrics: {e}"))?;
        String::from_utf8(buffer)
            .map_err(|e| format!("metrics encoding produced invalid UTF-8: {e}"))
    }
}

impl Default for ApiMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize a request path by replacing UUID segments with `{id}`.
///
/// Prevents cardinality explosion in Prometheus labels.
fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if segment.len() == 36
                && segment.chars().enumerate().all(|(i, c)| {
                    if i == 8 || i == 13 || i == 18 || i == 23 {
                        c == '-'
                    } else {
                        c.is_ascii_hexdigit()
                    }
                })
            {
                "{id}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Axum middleware recording request count, latency, and error count.
pub async fn metrics_middleware(
    axum::Extension(metrics): axum::Extension<ApiMetrics>,
    req: Request,
    next: Next,
) -> Response {
    let method = req.method().to_string();
    let path = normalize_path(req.uri().path());
    let start = Instant::now();

    let response = next.run(req).await;

    let status = response.status().as_u16();
    metrics.record_request(&method, &path, status, start.elapsed().as_secs_f64());
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_path_replaces_uuids() {
        assert_eq!(
            normalize_path("/api/orders/8d8ac610-566d-4ef0-9c22-186b2a5ed793"),
            "/api/orders/{id}"
        );
        assert_eq!(normalize_path("/api/menu-items"), "/api/menu-items");
        assert_eq!(
            normalize_path("/api/groups/manager/users/alice"),
            "/api/groups/manager/users/alice"
        );
    }

    #[test]
    fn gather_and_encode_includes_recorded_requests() {
        let metrics = ApiMetrics::new();
        metrics.record_request("GET", "/api/menu-items", 200, 0.003);
        metrics.record_request("POST", "/api/orders", 400, 0.001);

        let text = metrics.gather_and_encode().unwrap();
        assert!(text.contains("lemon_http_requests_total"));
        assert!(text.contains("lemon_http_errors_total"));
    }
}
