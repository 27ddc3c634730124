use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use mapped_device::Device;
use std::hint::black_box;
use std::io::{SeekFrom, Write};
use std::path::Path;
use tempfile::tempdir;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

/// 测试参数
const FILE_SIZE: u64 = 1024 * 1024 * 256; // 256MB
const READ_SIZE: usize = 4096; // 每次读取 4KB
const READS_PER_ITER: u64 = 1024;

/// 伪随机偏移，保证各实现读取相同的位置
fn offsets() -> impl Iterator<Item = u64> {
    let blocks = FILE_SIZE / READ_SIZE as u64;
    (0..READS_PER_ITER).map(move |i| (i.wrapping_mul(2_654_435_761) % blocks) * READ_SIZE as u64)
}

/// 使用 tokio::fs::File 进行 seek + read
async fn bench_tokio_file(path: &Path) {
    let mut file = tokio::fs::File::open(path).await.unwrap();
    let mut buf = vec![0u8; READ_SIZE];

    for offset in offsets() {
        file.seek(SeekFrom::Start(offset)).await.unwrap();
        file.read_exact(&mut buf).await.unwrap();
    }
}

/// 映射模式借用映射，缓冲模式每次读取分配独立缓冲区
fn bench_data_at(device: &Device) {
    for offset in offsets() {
        let bytes = device.data_at(offset, READ_SIZE).unwrap();
        black_box(&bytes);
    }
}

/// 缓冲模式 + 调用者提供的缓冲区
fn bench_buffered_read_at(device: &Device) {
    let mut buf = vec![0u8; READ_SIZE];
    for offset in offsets() {
        device.read_exact_at(offset, &mut buf).unwrap();
        black_box(&buf);
    }
}

fn read_paths_benchmark(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bench.img");

    // 创建测试镜像
    let mut file = std::fs::File::create(&path).unwrap();
    let chunk = vec![0x5Au8; 1024 * 1024];
    for _ in 0..FILE_SIZE / chunk.len() as u64 {
        file.write_all(&chunk).unwrap();
    }
    file.sync_all().unwrap();
    drop(file);

    let mapped = Device::open(&path).unwrap();
    let buffered = Device::options().map(false).open(&path).unwrap();

    let mut group = c.benchmark_group("read_paths");
    group.sample_size(20);

    let runtime = tokio::runtime::Runtime::new().unwrap();
    let label = format!("{}x{}KB", READS_PER_ITER, READ_SIZE / 1024);

    group.bench_function(BenchmarkId::new("tokio_file", &label), |b| {
        b.to_async(&runtime).iter(|| bench_tokio_file(&path));
    });

    group.bench_function(BenchmarkId::new("device_mapped", &label), |b| {
        b.iter(|| bench_data_at(&mapped));
    });

    group.bench_function(BenchmarkId::new("device_buffered", &label), |b| {
        b.iter(|| bench_data_at(&buffered));
    });

    group.bench_function(BenchmarkId::new("device_buffered_read_at", &label), |b| {
        b.iter(|| bench_buffered_read_at(&buffered));
    });

    group.finish();
}

criterion_group!(benches, read_paths_benchmark);
criterion_main!(benches);
