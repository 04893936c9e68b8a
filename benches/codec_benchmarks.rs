//! XML-RPC wire codec benchmarks

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::collections::BTreeMap;
use std::hint::black_box;
use vpnas_rpc::transport::xmlrpc;
use vpnas_rpc::Value;

fn profile(index: usize) -> Value {
    let mut props = BTreeMap::new();
    props.insert("type".to_string(), Value::from("user_connect"));
    props.insert("prop_autologin".to_string(), Value::from(index % 2 == 0));
    props.insert("conn_group".to_string(), Value::from(format!("group{}", index % 8)));
    Value::Struct(props)
}

fn profiles(count: usize) -> Value {
    let members = (0..count)
        .map(|i| (format!("user{i}"), profile(i)))
        .collect::<BTreeMap<_, _>>();
    Value::Struct(members)
}

fn encode_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_call");

    for count in [1usize, 16, 256] {
        let args = vec![Value::from("alice"), profiles(count)];
        group.bench_with_input(BenchmarkId::from_parameter(count), &args, |b, args| {
            b.iter(|| black_box(xmlrpc::encode_call("UserPropReplace", black_box(args)).unwrap()));
        });
    }

    group.finish();
}

fn decode_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_response");

    for count in [1usize, 16, 256] {
        let body = xmlrpc::encode_response(&Ok(profiles(count))).unwrap();
        group.throughput(Throughput::Bytes(body.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &body, |b, body| {
            b.iter(|| black_box(xmlrpc::decode_response(black_box(body)).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, encode_benchmark, decode_benchmark);
criterion_main!(benches);
