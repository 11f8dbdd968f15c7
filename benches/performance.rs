//! Performance benchmarks for the statistics and result helpers
//!
//! These run on every measurement, so they should stay negligible next to
//! the network time they summarise.

use clap::Parser;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use qos_speedtest::{
    cli::Cli,
    config::ConfigParser,
    models::{Config, LatencyMeasurement, MeasurementResult, ThroughputMeasurement},
    stats::{mean, round2, sample_std_dev, throughput_mbps, LatencySummary},
};
use std::hint::black_box;
use std::time::Duration;

/// Round-trip times spread between 10 and 110 ms
fn create_sample_rtts(count: usize) -> Vec<Duration> {
    (0..count)
        .map(|i| Duration::from_micros(10_000 + (i as u64 * 7_919) % 100_000))
        .collect()
}

/// Benchmark latency aggregation over growing sample counts
fn benchmark_latency_statistics(c: &mut Criterion) {
    let mut group = c.benchmark_group("latency_statistics");

    for size in [3, 10, 100, 1000].iter() {
        let rtts = create_sample_rtts(*size);
        let samples_ms: Vec<f64> = rtts.iter().map(|d| d.as_secs_f64() * 1000.0).collect();

        group.bench_with_input(BenchmarkId::new("summary", size), size, |b, _| {
            b.iter(|| {
                let mut summary = LatencySummary::with_capacity(rtts.len());
                for rtt in &rtts {
                    summary.record_success(*rtt);
                }
                black_box((summary.mean_ms(), summary.jitter_ms()));
            });
        });

        group.bench_with_input(BenchmarkId::new("mean_and_std_dev", size), size, |b, _| {
            b.iter(|| {
                let values = black_box(&samples_ms);
                black_box((mean(values), sample_std_dev(values)));
            });
        });
    }

    group.finish();
}

/// Benchmark throughput conversion and result assembly
fn benchmark_result_assembly(c: &mut Criterion) {
    let mut group = c.benchmark_group("result_assembly");

    group.bench_function("throughput_mbps", |b| {
        b.iter(|| {
            let mbps = throughput_mbps(black_box(10 * 1024 * 1024), black_box(Duration::from_millis(8_431)));
            black_box(round2(mbps));
        });
    });

    group.bench_function("measurement_result", |b| {
        let latency = LatencyMeasurement {
            latency_ms: 23.456,
            jitter_ms: 4.321,
            successful_samples: 5,
            attempted_samples: 5,
        };
        let download = ThroughputMeasurement::new(94.123, Duration::from_secs(3), 36 * 1024 * 1024, "https://mirror.test");
        let upload = ThroughputMeasurement::new(18.9, Duration::from_millis(2_200), 5 * 1024 * 1024, "https://echo.test");

        b.iter(|| {
            let result = MeasurementResult::new(
                black_box(&latency),
                black_box(&download),
                Some(black_box(&upload)),
                Duration::from_secs(16),
            );
            black_box(serde_json::to_string(&result).ok());
        });
    });

    group.finish();
}

/// Benchmark configuration parsing and validation
fn benchmark_config_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("config_parsing");

    group.bench_function("parse_cli_args", |b| {
        let args = [
            "qos-speedtest",
            "--port",
            "9000",
            "--download-url",
            "https://mirror-a.test/10MB.bin",
            "--download-url",
            "https://mirror-b.test/10MB.bin",
            "--fast-accept-mbps",
            "1.5",
        ];
        b.iter(|| {
            let cli = Cli::try_parse_from(black_box(&args));
            black_box(cli.ok());
        });
    });

    group.bench_function("apply_overrides_and_validate", |b| {
        let cli = Cli::parse_from(["qos-speedtest", "--port", "9000", "--concurrent-probes"]);
        let parser = ConfigParser::new(cli);
        b.iter(|| {
            let mut config = Config::default();
            parser.apply_cli_overrides(&mut config);
            black_box(config.validate().is_ok());
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_latency_statistics,
    benchmark_result_assembly,
    benchmark_config_parsing
);
criterion_main!(benches);
