//! Prometheus metrics exposed at `GET /api/metrics`.

use std::fmt;

use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;
use services::ReconcileReport;

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct RequestLabels {
    pub method: String,
    /// Status class: "2xx", "4xx", ...
    pub status: String,
}

pub struct Metrics {
    registry: Registry,
    requests: Family<RequestLabels, Counter>,
    reconciled: Counter,
    reconcile_failures: Counter,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::with_prefix("petboard");
        let requests = Family::<RequestLabels, Counter>::default();
        let reconciled = Counter::default();
        let reconcile_failures = Counter::default();

        registry.register("http_requests", "HTTP requests by method and status class", requests.clone());
        registry.register("blob_intents_resolved", "Blob intents settled by the reconciler", reconciled.clone());
        registry.register("blob_intents_failed", "Reconcile attempts that failed", reconcile_failures.clone());

        Self {
            registry,
            requests,
            reconciled,
            reconcile_failures,
        }
    }

    pub fn observe_request(&self, method: &str, status: u16) {
        self.requests
            .get_or_create(&RequestLabels {
                method: method.to_string(),
                status: format!("{}xx", status / 100),
            })
            .inc();
    }

    pub fn observe_reconcile(&self, report: &ReconcileReport) {
        self.reconciled.inc_by(report.resolved);
        self.reconcile_failures.inc_by(report.failed);
    }

    pub fn render(&self) -> Result<String, fmt::Error> {
        let mut out = String::new();
        encode(&mut out, &self.registry)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_request_and_reconcile_counters() {
        let metrics = Metrics::new();
        metrics.observe_request("GET", 200);
        metrics.observe_request("GET", 204);
        metrics.observe_request("PUT", 403);
        metrics.observe_reconcile(&ReconcileReport { resolved: 3, failed: 1 });

        let text = metrics.render().unwrap();
        assert!(text.contains(r#"petboard_http_requests_total{method="GET",status="2xx"} 2"#));
        assert!(text.contains(r#"petboard_http_requests_total{method="PUT",status="4xx"} 1"#));
        assert!(text.contains("petboard_blob_intents_resolved_total 3"));
        assert!(text.contains("petboard_blob_intents_failed_total 1"));
    }
}
