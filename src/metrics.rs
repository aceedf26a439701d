use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref CHECKOUTS_CREATED: IntCounter = IntCounter::new(
        "payments_checkouts_created_total",
        "Checkouts persisted by the forward path"
    )
    .expect("metric can be created");
    pub static ref PAYMENT_LINKS_CREATED: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "payments_links_created_total",
            "Payment links successfully created, by provider"
        ),
        &["provider"]
    )
    .expect("metric can be created");
    pub static ref GATEWAY_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "payments_gateway_failures_total",
            "Failed gateway link creations, by provider"
        ),
        &["provider"]
    )
    .expect("metric can be created");
    pub static ref WEBHOOKS_RECEIVED: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "payments_webhooks_received_total",
            "Webhook deliveries accepted for processing, by provider"
        ),
        &["provider"]
    )
    .expect("metric can be created");
    pub static ref WEBHOOKS_DUPLICATE: IntCounter = IntCounter::new(
        "payments_webhooks_duplicate_total",
        "Webhook deliveries dropped by the idempotency gate"
    )
    .expect("metric can be created");
    pub static ref PAYMENTS_SUCCEEDED: IntCounter = IntCounter::new(
        "payments_succeeded_total",
        "Payment intents driven to SUCCEEDED"
    )
    .expect("metric can be created");
    pub static ref PAYMENTS_FAILED: IntCounter = IntCounter::new(
        "payments_failed_total",
        "Payment intents driven to FAILED"
    )
    .expect("metric can be created");
    pub static ref LEDGER_POSTINGS: IntCounter = IntCounter::new(
        "payments_ledger_postings_total",
        "Balanced ledger transactions written"
    )
    .expect("metric can be created");
}

/// Register all metrics with the process registry. Idempotent enough for a
/// single boot path; duplicate registration is reported once and ignored.
pub fn register_metrics() {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(CHECKOUTS_CREATED.clone()),
        Box::new(PAYMENT_LINKS_CREATED.clone()),
        Box::new(GATEWAY_FAILURES.clone()),
        Box::new(WEBHOOKS_RECEIVED.clone()),
        Box::new(WEBHOOKS_DUPLICATE.clone()),
        Box::new(PAYMENTS_SUCCEEDED.clone()),
        Box::new(PAYMENTS_FAILED.clone()),
        Box::new(LEDGER_POSTINGS.clone()),
    ];
    for collector in collectors {
        if let Err(e) = REGISTRY.register(collector) {
            tracing::debug!("metric registration skipped: {}", e);
        }
    }
}

/// Render the registry in prometheus text exposition format.
pub async fn metrics_handler() -> Result<String, String> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| format!("could not encode metrics: {}", e))?;
    String::from_utf8(buffer).map_err(|e| format!("metrics are not valid utf-8: {}", e))
}
