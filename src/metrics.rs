use crate::model::LatencySummary;
use hdrhistogram::Histogram;

/// Summarize per-operation latencies (milliseconds) with an HDR histogram.
pub fn latency_summary(samples_ms: &[u64]) -> LatencySummary {
    let Ok(mut hist) = Histogram::<u64>::new(3) else {
        return LatencySummary::default();
    };
    for &ms in samples_ms {
        // Auto-resizing histograms only reject values beyond u64 range.
        let _ = hist.record(ms);
    }
    if hist.is_empty() {
        return LatencySummary::default();
    }
    LatencySummary {
        samples: hist.len(),
        min_ms: Some(hist.min()),
        mean_ms: Some(hist.mean()),
        p50_ms: Some(hist.value_at_quantile(0.50)),
        p90_ms: Some(hist.value_at_quantile(0.90)),
        p99_ms: Some(hist.value_at_quantile(0.99)),
        max_ms: Some(hist.max()),
    }
}
