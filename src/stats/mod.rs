//! Timing and statistics helpers shared by the probes

use std::time::Duration;

/// Arithmetic mean; 0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator); 0 for fewer than two values
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }

    let avg = mean(values);
    let sum_squared_diff: f64 = values
        .iter()
        .map(|&x| {
            let diff = x - avg;
            diff * diff
        })
        .sum();

    (sum_squared_diff / (values.len() - 1) as f64).sqrt()
}

/// Throughput in megabits per second (10^6 bits); 0 for a zero-length window
pub fn throughput_mbps(bytes: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return 0.0;
    }
    (bytes as f64 * 8.0) / (secs * 1_000_000.0)
}

/// Round half away from zero to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Milliseconds as a float
pub fn duration_ms(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

/// Accumulates round-trip samples for one latency run
#[derive(Debug, Clone, Default)]
pub struct LatencySummary {
    samples_ms: Vec<f64>,
    attempted: u32,
}

impl LatencySummary {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples_ms: Vec::with_capacity(capacity),
            attempted: 0,
        }
    }

    /// Record a completed round trip
    pub fn record_success(&mut self, elapsed: Duration) {
        self.attempted += 1;
        self.samples_ms.push(duration_ms(elapsed));
    }

    /// Record a sample that did not complete
    pub fn record_failure(&mut self) {
        self.attempted += 1;
    }

    pub fn successful(&self) -> u32 {
        self.samples_ms.len() as u32
    }

    pub fn attempted(&self) -> u32 {
        self.attempted
    }

    pub fn samples_ms(&self) -> &[f64] {
        &self.samples_ms
    }

    /// Mean latency of the successful samples
    pub fn mean_ms(&self) -> f64 {
        mean(&self.samples_ms)
    }

    /// Jitter as the sample standard deviation of the successful samples
    pub fn jitter_ms(&self) -> f64 {
        sample_std_dev(&self.samples_ms)
    }
}
