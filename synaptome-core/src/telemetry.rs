//! Counters emitted by the generators when the `metrics` feature is enabled.

#[cfg(feature = "metrics")]
pub(crate) fn record_round(model: &'static str) {
    metrics::counter!("generation_rounds", "model" => model).increment(1);
}

#[cfg(not(feature = "metrics"))]
pub(crate) fn record_round(_model: &'static str) {}

#[cfg(feature = "metrics")]
pub(crate) fn record_rejected(count: usize) {
    if count > 0 {
        metrics::counter!("generation_rejected_edges").increment(count as u64);
    }
}

#[cfg(not(feature = "metrics"))]
pub(crate) fn record_rejected(_count: usize) {}

#[cfg(feature = "metrics")]
pub(crate) fn record_repair(model: &'static str) {
    metrics::counter!("generation_repair_steps", "model" => model).increment(1);
}

#[cfg(not(feature = "metrics"))]
pub(crate) fn record_repair(_model: &'static str) {}
