use std::time::{Duration, Instant};

/// Human-readable duration with automatic unit scaling (`1.94ms`, `2.34s`).
pub fn fmt_duration(d: Duration) -> String {
    format!("{d:.2?}")
}

/// Warn when `operation`, started at `start`, has been running longer than `threshold`.
pub fn log_if_slow(start: Instant, threshold: Duration, operation: &str) {
    let elapsed = start.elapsed();
    if elapsed > threshold {
        tracing::warn!(
            operation,
            duration = fmt_duration(elapsed),
            threshold = fmt_duration(threshold),
            "Slow operation"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_duration_scales_units() {
        assert_eq!(fmt_duration(Duration::from_millis(1500)), "1.50s");
        assert_eq!(fmt_duration(Duration::from_micros(250)), "250.00µs");
    }
}
