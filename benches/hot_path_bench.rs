use criterion::{Criterion, criterion_group, criterion_main};

use sqlbridge::SqlBridge;
use sqlbridge::cache::Fingerprint;
use sqlbridge::driver::DriverCapabilities;
use sqlbridge::statement::{Dialect, StatementConfig};
use sqlbridge::translator::{self, PlaceholderStyle};
use sqlbridge::types::ParamSet;

/// The per-call costs that must stay flat for the pipeline to keep up with
/// a native driver: fingerprinting, the cache hit path, and per-row binding
/// against an already-rendered statement.
fn bench_hot_path(c: &mut Criterion) {
    let sql = "SELECT id, name, total FROM orders WHERE customer = :customer AND total > :total";
    let config = StatementConfig::default();

    let mut group = c.benchmark_group("hot_path");

    group.bench_function("fingerprint", |b| {
        b.iter(|| std::hint::black_box(Fingerprint::compute(sql, Dialect::Generic, &config)));
    });

    let bridge = SqlBridge::new();
    bridge.compile(sql, Dialect::Generic, &config).unwrap();
    group.bench_function("compile_cache_hit", |b| {
        b.iter(|| std::hint::black_box(bridge.compile(sql, Dialect::Generic, &config).unwrap()));
    });

    let statement = bridge.compile(sql, Dialect::Generic, &config).unwrap();
    let caps = DriverCapabilities {
        placeholder_style: PlaceholderStyle::Positional,
        bypass_wrapping: true,
    };
    let rendered = translator::render(&statement, caps.placeholder_style);
    let values = ParamSet::named([("customer", 12i64), ("total", 500i64)]);
    group.bench_function("bind_one_row", |b| {
        b.iter(|| {
            std::hint::black_box(
                translator::bind_values(&rendered, &values, &caps, false).unwrap(),
            )
        });
    });

    group.bench_function("convert_reuses_rendering", |b| {
        b.iter(|| {
            std::hint::black_box(
                translator::convert(&statement, &values, caps.placeholder_style, &caps, false)
                    .unwrap(),
            )
        });
    });

    group.finish();
}

criterion_group!(benches, bench_hot_path);
criterion_main!(benches);
