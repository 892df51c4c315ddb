use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde::{Deserialize, Serialize};

#[derive(Clone, Serialize, Deserialize)]
struct Repo {
    id: u64,
    name: String,
    full_name: String,
    description: Option<String>,
    private: bool,
    fork: bool,
    stargazers_count: u32,
    forks_count: u32,
    topics: Vec<String>,
}

fn repos(count: usize) -> Vec<Repo> {
    (0..count)
        .map(|i| Repo {
            id: i as u64,
            name: format!("repo-{i}"),
            full_name: format!("owner/repo-{i}"),
            description: if i % 3 == 0 {
                None
            } else {
                Some(format!("description for repo {i} with some length to it"))
            },
            private: i % 2 == 0,
            fork: i % 5 == 0,
            stargazers_count: (i * 37 % 10_000) as u32,
            forks_count: (i * 11 % 500) as u32,
            topics: vec!["rust".to_owned(), "serde".to_owned(), format!("t{i}")],
        })
        .collect()
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    for count in [10usize, 100, 1_000] {
        let data = repos(count);
        let encoded = serde_tron::to_string(&data).expect("encode");
        group.throughput(Throughput::Bytes(encoded.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &data, |b, data| {
            b.iter(|| serde_tron::to_string(black_box(data)).expect("encode"));
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    for count in [10usize, 100, 1_000] {
        let encoded = serde_tron::to_string(&repos(count)).expect("encode");
        group.throughput(Throughput::Bytes(encoded.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(count),
            &encoded,
            |b, encoded| {
                b.iter(|| {
                    serde_tron::from_str::<Vec<Repo>>(black_box(encoded)).expect("decode")
                });
            },
        );
    }
    group.finish();
}

fn bench_parse_to_value(c: &mut Criterion) {
    let encoded = serde_tron::to_string(&repos(1_000)).expect("encode");
    let mut group = c.benchmark_group("parse_to_value");
    group.throughput(Throughput::Bytes(encoded.len() as u64));
    group.bench_function("1000", |b| {
        b.iter(|| serde_tron::parse_str(black_box(&encoded)).expect("parse"));
    });
    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode, bench_parse_to_value);
criterion_main!(benches);
