// In benches/marshal_bench.rs

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use sfh::native::marshal::{blank_buffer, marshal, unmarshal};
use sfh::FormatSpec;

/// Builds a full `sfhlonam_`-style listing: 100 blank-padded 8-byte slots.
fn generate_name_listing(slots: usize) -> Vec<u8> {
    let mut names = blank_buffer(slots * 8);
    for (slot, field) in names.chunks_exact_mut(8).enumerate() {
        let name = format!("SIG{:03}", slot);
        field[..name.len()].copy_from_slice(name.as_bytes());
    }
    names
}

// --- Benchmark Suite ---

fn bench_marshal_boundary(c: &mut Criterion) {
    let listing = generate_name_listing(100);

    let mut group = c.benchmark_group("marshal");
    group.bench_function("marshal_name", |b| {
        b.iter(|| black_box(marshal(black_box("AUGD12345")).len()))
    });
    group.bench_function("unmarshal_listing_100", |b| {
        b.iter(|| {
            black_box(&listing)
                .chunks_exact(8)
                .map(unmarshal)
                .collect::<Vec<String>>()
        })
    });
    group.bench_function("unmarshal_modus_nul_padded", |b| {
        b.iter(|| unmarshal(black_box(b"OP\0\0\0\0\0\0")))
    });
    group.finish();
}

fn bench_format_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("format_spec");
    for input in ["float32", "        ", "1794"] {
        group.bench_function(format!("parse_{:?}", input), |b| {
            b.iter(|| FormatSpec::parse(black_box(input)).and_then(|spec| spec.resolve()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_marshal_boundary, bench_format_parsing);
criterion_main!(benches);
