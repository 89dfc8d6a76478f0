use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry};
use tracing::info;
use std::sync::Arc;
use tokio::sync::OnceCell;


// Declare the static OnceCell to hold the Metrics.
static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the static `Metrics`.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE.get_or_init(|| async {
        info!("Initializing Metrics ...");
        Metrics::new()}
    ).await
}


#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Token metrics
    pub token_signings: IntCounter,
    pub token_sign_failures: IntCounterVec,
    pub token_forced_refreshes: IntCounter,
    pub token_issued_at: IntGauge,

    // Push metrics
    pub push_requests: IntCounterVec,
    pub push_failures: IntCounterVec,
    pub push_duration: HistogramVec,

    // Config/runtime
    pub config_validation_errors: IntCounter,
    pub up: IntGauge,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("pushtoken".into()), None).unwrap();

        let metrics: Arc<Metrics> = Arc::new(Self {
            // Token
            token_signings: IntCounter::new("token_signings_total", "Provider tokens signed by the refresher").unwrap(),
            token_sign_failures: IntCounterVec::new(Opts::new("token_sign_failures_total", "Token signing failures by kind"),&["kind"],).unwrap(),
            token_forced_refreshes: IntCounter::new("token_forced_refreshes_total", "Tokens re-signed after the gateway rejected them").unwrap(),
            token_issued_at: IntGauge::new("token_issued_at_unix_seconds", "Issue time of the cached provider token").unwrap(),

            // Push
            push_requests: IntCounterVec::new(Opts::new("push_requests_total", "Push requests by HTTP status"),&["status"],).unwrap(),
            push_failures: IntCounterVec::new(Opts::new("push_failures_total", "Push failures by reason"),&["reason"],).unwrap(),
            push_duration: HistogramVec::new(HistogramOpts::new("push_duration_seconds", "Push request duration seconds").buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),&["topic"],).unwrap(),

            // Config/runtime
            config_validation_errors: IntCounter::new("config_validation_errors_total","Validation errors during startup",).unwrap(),
            up: IntGauge::new("up", "1 if service is healthy").unwrap(),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.token_signings.clone())).unwrap();
        reg.register(Box::new(metrics.token_sign_failures.clone())).unwrap();
        reg.register(Box::new(metrics.token_forced_refreshes.clone())).unwrap();
        reg.register(Box::new(metrics.token_issued_at.clone())).unwrap();
        reg.register(Box::new(metrics.push_requests.clone())).unwrap();
        reg.register(Box::new(metrics.push_failures.clone())).unwrap();
        reg.register(Box::new(metrics.push_duration.clone())).unwrap();
        reg.register(Box::new(metrics.config_validation_errors.clone())).unwrap();
        reg.register(Box::new(metrics.up.clone())).unwrap();

        metrics
    }
}
