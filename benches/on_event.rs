use std::hint::black_box;

use ph_capture::{Pipeline, RingBuffer, SourceId};

fn main() {
    divan::main();
}

#[divan::bench(args = [8, 64, 1024])]
fn ring_push_pop(bencher: divan::Bencher, capacity: usize) {
    let mut ring = RingBuffer::new(capacity).unwrap();
    bencher.bench_local(move || {
        for value in 0..capacity as u64 - 1 {
            let _ = black_box(ring.push(value));
        }
        while let Some(value) = ring.pop() {
            black_box(value);
        }
    });
}

#[divan::bench]
fn on_event(bencher: divan::Bencher) {
    let pipeline = Pipeline::new(1024, 1024).unwrap();
    let stage = std::sync::Arc::clone(pipeline.producer().stage());
    bencher.bench_local(move || {
        let capture = pipeline.producer().on_event(black_box(SourceId::Button5));
        black_box(stage.pop());
        capture
    });
}

#[divan::bench(args = [1, 7, 15])]
fn expand_burst(bencher: divan::Bencher, burst: usize) {
    let pipeline = Pipeline::new(16, 16).unwrap();
    bencher.bench_local(move || {
        for _ in 0..burst {
            pipeline.producer().on_event(SourceId::RockerEast);
        }
        let stats = pipeline.run_pending();
        while let Some(record) = pipeline.channel().try_read_one() {
            black_box(record);
        }
        stats
    });
}
