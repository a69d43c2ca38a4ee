//! Benchmarks for ypak package and reader operations

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use tempfile::TempDir;
use ypak::{ByteArena, PackageReader, PackageWriter, Reader, Source};

const ENTRY_COUNT: usize = 64;
const ENTRY_SIZE: usize = 16 * 1024;

/// Half text-like (compressible), half noise-like (not)
fn entry_payload(i: usize) -> Vec<u8> {
    let mut state = i as u32 ^ 0x9e37_79b9;
    (0..ENTRY_SIZE)
        .map(|j| {
            if i % 2 == 0 {
                b"lorem ipsum dolor sit amet "[j % 27]
            } else {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                state as u8
            }
        })
        .collect()
}

fn build_package(path: &std::path::Path, payloads: &[Vec<u8>]) {
    let mut writer = PackageWriter::create(path).unwrap();
    for (i, payload) in payloads.iter().enumerate() {
        writer
            .add(format!("entry_{:03}", i), Source::from_bytes(payload.clone()))
            .unwrap();
    }
    writer.commit().unwrap();
}

fn package_benchmarks(c: &mut Criterion) {
    let payloads: Vec<Vec<u8>> = (0..ENTRY_COUNT).map(entry_payload).collect();

    c.bench_function("package_commit", |b| {
        b.iter_batched(
            || TempDir::new().unwrap(),
            |dir| build_package(&dir.path().join("bench.ypk"), &payloads),
            BatchSize::PerIteration,
        )
    });

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bench.ypk");
    build_package(&path, &payloads);

    c.bench_function("package_open_index", |b| {
        b.iter(|| PackageReader::create(black_box(&path)).unwrap())
    });

    let package = PackageReader::create(&path).unwrap();
    c.bench_function("package_read_all_entries", |b| {
        b.iter(|| {
            for index in 0..package.len() {
                let source = package.open(index).unwrap();
                black_box(source.to_buffer(0).unwrap());
            }
        })
    });
}

fn reader_benchmarks(c: &mut Criterion) {
    let text: String = (0..10_000).map(|i| format!("line number {}\r\n", i)).collect();
    let direct = Source::from_buffer(ByteArena::from_slice(text.as_bytes()));
    let chunked = Source::from_subrange(&direct, 0, direct.size());

    c.bench_function("read_line_direct", |b| {
        b.iter(|| {
            let mut reader = Reader::new(&direct);
            let mut line = String::new();
            while reader.read_line(&mut line) {
                black_box(&line);
            }
        })
    });

    c.bench_function("read_line_chunked", |b| {
        b.iter(|| {
            let mut reader = Reader::new(&chunked);
            let mut line = String::new();
            while reader.read_line(&mut line) {
                black_box(&line);
            }
        })
    });
}

criterion_group!(benches, package_benchmarks, reader_benchmarks);
criterion_main!(benches);
