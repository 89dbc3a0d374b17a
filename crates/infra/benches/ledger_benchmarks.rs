use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use pteronest_core::{Money, UserId};
use pteronest_infra::{DEFAULT_HISTORY_LIMIT, Ledger};

fn user(i: usize) -> UserId {
    UserId::new(format!("user-{i}")).unwrap()
}

fn bench_credit_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("credit_latency");
    group.throughput(Throughput::Elements(1));

    group.bench_function("credit_single_user", |b| {
        let ledger = Ledger::new();
        let u = user(0);
        b.iter(|| black_box(ledger.credit(&u, Money::from_minor(1)).unwrap()));
    });

    group.bench_function("credit_then_debit", |b| {
        let ledger = Ledger::new();
        let u = user(0);
        b.iter(|| {
            ledger.credit(&u, Money::from_units(1)).unwrap();
            black_box(ledger.debit(&u, Money::from_units(1)).unwrap())
        });
    });

    group.finish();
}

fn bench_parallel_credits(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel_credits");

    for threads in [1usize, 4, 8].iter() {
        let per_thread = 250usize;
        group.throughput(Throughput::Elements((threads * per_thread) as u64));

        group.bench_with_input(BenchmarkId::new("same_user", threads), threads, |b, &threads| {
            b.iter(|| {
                let ledger = Ledger::new();
                let u = user(0);
                std::thread::scope(|s| {
                    for _ in 0..threads {
                        s.spawn(|| {
                            for _ in 0..per_thread {
                                ledger.credit(&u, Money::from_minor(1)).unwrap();
                            }
                        });
                    }
                });
                black_box(ledger.balance(&u))
            });
        });

        group.bench_with_input(BenchmarkId::new("distinct_users", threads), threads, |b, &threads| {
            b.iter(|| {
                let ledger = Ledger::new();
                std::thread::scope(|s| {
                    for t in 0..threads {
                        let ledger = &ledger;
                        s.spawn(move || {
                            let u = user(t);
                            for _ in 0..per_thread {
                                ledger.credit(&u, Money::from_minor(1)).unwrap();
                            }
                        });
                    }
                });
                black_box(ledger.balance(&user(0)))
            });
        });
    }

    group.finish();
}

fn bench_history_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("history_queries");

    for history_len in [10usize, 1_000, 10_000].iter() {
        let ledger = Ledger::new();
        let u = user(0);
        for _ in 0..*history_len {
            ledger.credit(&u, Money::from_minor(1)).unwrap();
        }

        group.bench_with_input(BenchmarkId::new("recent_10", history_len), history_len, |b, _| {
            b.iter(|| black_box(ledger.recent_transactions(&u, DEFAULT_HISTORY_LIMIT).unwrap()));
        });

        group.bench_with_input(BenchmarkId::new("verify_replay", history_len), history_len, |b, _| {
            b.iter(|| black_box(ledger.verify(&u).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_credit_latency,
    bench_parallel_credits,
    bench_history_queries
);
criterion_main!(benches);
