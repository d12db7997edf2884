// Canonicalization & signing benchmarks for ethseal.
//
// Covers serializability validation, canonical encoding, digest
// computation, and the full sign/verify round trip at a realistic record
// size.

use criterion::{criterion_group, criterion_main, Criterion, Throughput};

use ethseal::canonical::canonicalize;
use ethseal::digester;
use ethseal::provider::LocalKeyProvider;
use ethseal::record::{validate, Value};
use ethseal::signer;
use ethseal::verifier;

fn sample_record(address: &str) -> Value {
    let tags = Value::list(["friend", "work", "mainnet"]);
    let meta = Value::from_pairs([
        ("source", Value::from("import")),
        ("score", Value::from(42i64)),
    ]);
    Value::from_pairs([
        ("version", Value::from("1.0.0")),
        ("deleted", Value::from(0i64)),
        ("wallet", Value::from(address)),
        ("name", Value::from("Sam")),
        ("avatar", Value::from("https://example.com/avatar/sam.png")),
        ("remark", Value::from("no remark")),
        ("timestamp", Value::from(1_700_000_000_000i64)),
        ("tags", tags),
        ("meta", meta),
    ])
}

fn bench_validate(c: &mut Criterion) {
    let record = sample_record("0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045");
    c.bench_function("record/validate", |b| {
        b.iter(|| validate(&record).unwrap());
    });
}

fn bench_canonicalize(c: &mut Criterion) {
    let record = sample_record("0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045");
    let message_len = canonicalize(&record, &[]).unwrap().len();

    let mut group = c.benchmark_group("canonical");
    group.throughput(Throughput::Bytes(message_len as u64));
    group.bench_function("canonicalize", |b| {
        b.iter(|| canonicalize(&record, &[]).unwrap());
    });
    group.finish();
}

fn bench_digest(c: &mut Criterion) {
    let record = sample_record("0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045");
    c.bench_function("digester/hash_object", |b| {
        b.iter(|| digester::hash_object(&record, &[]).unwrap());
    });
}

fn bench_sign_and_verify(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("tokio runtime");
    let provider = LocalKeyProvider::generate();
    let address = provider.address().unwrap().to_string();
    let record = sample_record(&address);

    c.bench_function("signer/sign_object", |b| {
        b.iter(|| {
            runtime
                .block_on(signer::sign_object(&provider, &record, &[]))
                .unwrap()
        });
    });

    let signature = runtime
        .block_on(signer::sign_object(&provider, &record, &[]))
        .unwrap()
        .to_hex();
    c.bench_function("verifier/validate_object", |b| {
        b.iter(|| {
            runtime
                .block_on(verifier::validate_object(
                    &provider, &address, &record, &signature, &[],
                ))
                .unwrap()
        });
    });
}

criterion_group!(
    benches,
    bench_validate,
    bench_canonicalize,
    bench_digest,
    bench_sign_and_verify
);
criterion_main!(benches);
