// Benchmark for G-code line parsing and streaming throughput
// Run with: cargo bench

use criterion::{Criterion, criterion_group, criterion_main};
use grbl_sim::{SimClock, Simulator, Streamer};
use grbl_shared::gcode::parse_line;
use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;

fn bench_parse_line(c: &mut Criterion) {
    let lines: Vec<String> = (0..10_000)
        .map(|i| format!("G1 X{} Y{} Z-0.5 F1500 (pass {})", i, i, i))
        .collect();
    c.bench_function("parse 10k G1 lines", |b| {
        b.iter(|| {
            let mut count = 0;
            for line in &lines {
                if parse_line(black_box(line)).is_ok() {
                    count += 1;
                }
            }
            assert_eq!(count, 10_000);
        });
    });
}

fn bench_stream_program(c: &mut Criterion) {
    let program: Vec<String> = (0..200)
        .map(|i| format!("G1 X{} Y{} F6000", i % 50, (i * 7) % 50))
        .collect();
    c.bench_function("stream 200 feed moves", |b| {
        b.iter(|| {
            let clock = SimClock::new();
            let sim = Simulator::with_clock(Arc::new(clock.clone()));
            let mut streamer = Streamer::new(sim, clock, Duration::from_millis(10));
            let summary = streamer.run(&program).unwrap();
            assert_eq!(summary.errors, 0);
        });
    });
}

criterion_group!(benches, bench_parse_line, bench_stream_program);
criterion_main!(benches);
