use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use silo_storage::{Containment, Storage};
use std::hint::black_box;
use std::time::Duration;
use tempfile::TempDir;

// ============================================================================
// Benchmark: Path Resolution
// ============================================================================

fn bench_path_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("path_resolution");

    let temp = TempDir::new().unwrap();
    let rt = tokio::runtime::Runtime::new().unwrap();
    let storage = rt.block_on(async { Storage::builder().root(temp.path()).connect().await.unwrap() });
    let bucket = storage.bucket("bench").unwrap();

    group.bench_function("simple_key", |b| {
        b.iter(|| black_box(bucket.resolve("test.dat").unwrap()));
    });

    group.bench_function("nested_key", |b| {
        b.iter(|| black_box(bucket.resolve("foo/bar/baz/test.dat").unwrap()));
    });

    group.bench_function("rejected_key", |b| {
        b.iter(|| black_box(bucket.resolve("foo/../../etc/passwd").is_err()));
    });

    group.bench_function("segments", |b| {
        b.iter(|| {
            black_box(
                storage
                    .resolver()
                    .resolve(bucket.name(), ["a/b", "c.txt"], Containment::Descendant)
                    .unwrap(),
            )
        });
    });

    group.finish();
}

// ============================================================================
// Benchmark: Content Hashing
// ============================================================================

fn bench_hashing(c: &mut Criterion) {
    let mut group = c.benchmark_group("hashing");

    let temp = TempDir::new().unwrap();
    let rt = tokio::runtime::Runtime::new().unwrap();
    let storage = rt.block_on(async { Storage::builder().root(temp.path()).connect().await.unwrap() });

    let sizes = [("1KB", 1024), ("100KB", 100 * 1024), ("1MB", 1024 * 1024)];

    for (name, size) in sizes {
        let data: Vec<u8> = (0..size).map(|i| u8::try_from(i % 256).unwrap()).collect();
        let path = temp.path().join(format!("hash_{name}.bin"));
        std::fs::write(&path, &data).unwrap();

        group.throughput(Throughput::Bytes(u64::try_from(size).unwrap_or(u64::MAX)));

        group.bench_with_input(BenchmarkId::new("in_memory", name), &data, |b, data| {
            b.iter(|| black_box(storage.hasher().digest_bytes(data)));
        });

        group.bench_with_input(BenchmarkId::new("streamed_file", name), &path, |b, path| {
            b.to_async(&rt).iter(|| async { black_box(storage.hasher().digest(path).await.unwrap()) });
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Upload Paths
// ============================================================================

fn bench_uploads(c: &mut Criterion) {
    let mut group = c.benchmark_group("uploads");
    group.measurement_time(Duration::from_secs(10));

    let temp = TempDir::new().unwrap();
    let rt = tokio::runtime::Runtime::new().unwrap();
    let storage = rt.block_on(async { Storage::builder().root(temp.path()).connect().await.unwrap() });
    let bucket = storage.bucket("bench").unwrap();

    let sizes = [("1KB", 1024), ("10KB", 10 * 1024), ("100KB", 100 * 1024)];

    for (name, size) in sizes {
        let data: Vec<u8> = (0..size).map(|i| u8::try_from(i % 256).unwrap()).collect();
        group.throughput(Throughput::Bytes(u64::try_from(size).unwrap_or(u64::MAX)));

        // After the first iteration every upload takes the dedup path.
        group.bench_with_input(BenchmarkId::new("hashed_dedup", name), &data, |b, data| {
            b.to_async(&rt).iter(|| async {
                black_box(bucket.upload("dedup/x.bin", None, &mut data.as_slice()).await.unwrap());
            });
        });

        group.bench_with_input(BenchmarkId::new("direct_put", name), &data, |b, data| {
            b.to_async(&rt).iter(|| async {
                black_box(bucket.put(&format!("direct/{name}.bin"), &mut data.as_slice()).await.unwrap());
            });
        });
    }

    group.finish();
}

// ============================================================================
// Criterion Configuration
// ============================================================================

criterion_group!(benches, bench_path_resolution, bench_hashing, bench_uploads);

criterion_main!(benches);
