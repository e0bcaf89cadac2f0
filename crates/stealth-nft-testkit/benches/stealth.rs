use criterion::{black_box, criterion_group, criterion_main, Criterion};

use stealth_nft_core::{
    check_record, derive_stealth_address, recover_stealth_private_key, scan, EphemeralSecret,
    RecordEntry, SecretKey,
};

fn bench_derive(c: &mut Criterion) {
    let receiver = SecretKey::generate().public_key();
    let secret = EphemeralSecret::random();

    c.bench_function("derive_stealth_address", |b| {
        b.iter(|| derive_stealth_address(black_box(&receiver), black_box(&secret)))
    });
}

fn bench_recover(c: &mut Criterion) {
    let receiver = SecretKey::generate();
    let payment = derive_stealth_address(&receiver.public_key(), &EphemeralSecret::random())
        .expect("valid inputs");

    c.bench_function("recover_stealth_private_key", |b| {
        b.iter(|| recover_stealth_private_key(black_box(&receiver), black_box(&payment.ephemeral)))
    });

    let record = payment.to_record();
    c.bench_function("check_record", |b| {
        b.iter(|| check_record(black_box(&receiver), black_box(&record)))
    });
}

fn bench_scan(c: &mut Criterion) {
    let receiver = SecretKey::generate();
    let other = SecretKey::generate().public_key();
    let entries: Vec<RecordEntry> = (1..=256u64)
        .map(|seq| {
            let payment = derive_stealth_address(&other, &EphemeralSecret::random())
                .expect("valid inputs");
            RecordEntry {
                seq,
                record: payment.to_record(),
                recorded_at: 0,
            }
        })
        .collect();

    c.bench_function("scan_256_records", |b| {
        b.iter(|| scan(black_box(&receiver), entries.iter()))
    });
}

criterion_group!(benches, bench_derive, bench_recover, bench_scan);
criterion_main!(benches);
