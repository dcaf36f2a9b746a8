//! Benchmarks for cloudplat core operations.
//!
//! Run with: cargo bench
//!
//! Results include 95% confidence intervals via Criterion.

use cloudplat::core::types::{BaseContext, CloudProvider, ResourceContext, ResourceDescriptor};
use cloudplat::core::{dispatcher, parser, resolver};
use cloudplat::provenance::hasher;
use cloudplat::stacks::{backend_resources, BackendOptions, Naming};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use indexmap::IndexMap;

fn base() -> BaseContext {
    BaseContext {
        provider: CloudProvider::Aws,
        region: "us-east-1".to_string(),
        tags: IndexMap::from([("Project".to_string(), "bench".to_string())]),
    }
}

fn backend() -> Vec<ResourceDescriptor> {
    let naming = Naming::new("acme", "bench", "dev");
    backend_resources(&naming, CloudProvider::Aws, &BackendOptions::default()).unwrap()
}

fn bench_descriptor_hash(c: &mut Criterion) {
    let descriptors = backend();
    c.bench_function("hash_descriptor_backend", |b| {
        b.iter(|| {
            for d in &descriptors {
                black_box(hasher::hash_descriptor(black_box(d)));
            }
        });
    });
}

fn bench_resolve(c: &mut Criterion) {
    let descriptors = backend();
    let context: ResourceContext = dispatcher::create_resources(CloudProvider::Aws, &descriptors, &base()).unwrap();
    let base = base();

    let mut group = c.benchmark_group("resolve_descriptor");
    for d in &descriptors {
        group.bench_with_input(BenchmarkId::from_parameter(&d.kind), d, |b, d| {
            b.iter(|| black_box(resolver::resolve_descriptor(black_box(d), &context, &base)));
        });
    }
    group.finish();
}

fn bench_dispatch(c: &mut Criterion) {
    let descriptors = backend();
    let base = base();
    c.bench_function("create_resources_backend", |b| {
        b.iter(|| {
            let ctx = dispatcher::create_resources(CloudProvider::Aws, black_box(&descriptors), &base).unwrap();
            black_box(ctx);
        });
    });
}

fn bench_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate_descriptors");
    for n in [6, 60, 600] {
        let descriptors: Vec<ResourceDescriptor> = backend()
            .into_iter()
            .cycle()
            .take(n)
            .enumerate()
            .map(|(i, d)| {
                let key = format!("{}{}", d.context_key(), i);
                d.with_key(key)
            })
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &descriptors, |b, ds| {
            b.iter(|| black_box(parser::validate_descriptors(black_box(ds))));
        });
    }
    group.finish();
}

fn bench_name_tag(c: &mut Criterion) {
    let naming = Naming::new("acme", "shop", "prod");
    c.bench_function("name_tag", |b| {
        b.iter(|| black_box(naming.name_tag(black_box("backend-network"))));
    });
}

criterion_group!(
    benches,
    bench_descriptor_hash,
    bench_resolve,
    bench_dispatch,
    bench_validate,
    bench_name_tag
);
criterion_main!(benches);
