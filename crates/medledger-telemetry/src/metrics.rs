//! Prometheus metrics for the registry core.
//!
//! All metrics follow the naming convention: `medledger_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, HistogramOpts, HistogramVec, Opts,
    Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // ISSUANCE
    // =========================================================================

    /// Documents uploaded to the blob store
    pub static ref BLOBS_STAGED: Counter = Counter::new(
        "medledger_blobs_staged_total",
        "Total documents staged in the blob store"
    ).expect("metric creation failed");

    /// Records minted on the ledger
    pub static ref RECORDS_COMMITTED: Counter = Counter::new(
        "medledger_records_committed_total",
        "Total records committed to the ledger"
    ).expect("metric creation failed");

    /// Failed commits by error kind
    pub static ref COMMIT_FAILURES: CounterVec = CounterVec::new(
        Opts::new("medledger_commit_failures_total", "Failed commits by error kind"),
        &["kind"]  // ledger, connectivity, outcome_unknown, ...
    ).expect("metric creation failed");

    // =========================================================================
    // RETRIEVAL
    // =========================================================================

    /// Per-record lookups during fan-out
    pub static ref RECORD_LOOKUPS: CounterVec = CounterVec::new(
        Opts::new("medledger_record_lookups_total", "Per-record lookups by outcome"),
        &["outcome"]  // success, failure
    ).expect("metric creation failed");

    // =========================================================================
    // LEDGER TRANSPORT
    // =========================================================================

    /// Ledger round-trip latency by RPC method
    pub static ref LEDGER_CALL_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "medledger_ledger_call_duration_seconds",
            "Time spent in ledger RPC calls"
        ).buckets(exponential_buckets(0.005, 2.0, 12).expect("valid buckets")),
        &["operation"]
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
///
/// Calling it more than once is harmless.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(BLOBS_STAGED.clone()),
        Box::new(RECORDS_COMMITTED.clone()),
        Box::new(COMMIT_FAILURES.clone()),
        Box::new(RECORD_LOOKUPS.clone()),
        Box::new(LEDGER_CALL_DURATION.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
