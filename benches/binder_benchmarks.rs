//! Argument validation and binding benchmarks

use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use vpnas_rpc::{binder, validate, Args, MethodCatalog, Value};

fn validation_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("validation");

    let catalog = MethodCatalog::builtin().unwrap();
    let contract = catalog.lookup("UserPropDel").unwrap();
    let keys = Value::from(vec!["prop_autologin"; 64]);

    group.bench_function("list_of_64_strings", |b| {
        b.iter(|| {
            let result = validate::validate(black_box(&keys), &contract.params[1]);
            black_box(result)
        });
    });

    group.finish();
}

fn binding_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("binding");

    let catalog = MethodCatalog::builtin().unwrap();
    let disconnect = catalog.lookup("DisconnectUsers").unwrap();

    group.bench_function("positional_only", |b| {
        let args = Args::new()
            .arg(vec!["alice", "bob"])
            .arg(true)
            .arg("maintenance")
            .arg("please reconnect")
            .arg(false);
        b.iter(|| black_box(binder::bind(disconnect, black_box(&args))));
    });

    group.bench_function("named_with_defaults", |b| {
        let args = Args::new()
            .named("users", vec!["alice"])
            .named("reason", "maintenance");
        b.iter(|| black_box(binder::bind(disconnect, black_box(&args))));
    });

    group.bench_function("rejected_arity", |b| {
        let args = Args::from(vec![Value::Nil; 6]);
        b.iter(|| black_box(binder::bind(disconnect, black_box(&args))));
    });

    group.finish();
}

fn catalog_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("catalog");

    group.bench_function("load_builtin", |b| {
        b.iter(|| black_box(MethodCatalog::builtin().unwrap()));
    });

    let catalog = MethodCatalog::builtin().unwrap();
    group.bench_function("lookup", |b| {
        b.iter(|| black_box(catalog.lookup(black_box("GetVPNStatus")).is_ok()));
    });

    group.finish();
}

criterion_group!(benches, validation_benchmark, binding_benchmark, catalog_benchmark);
criterion_main!(benches);
