use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lightning_lane::guests::{compare_ineligible, GuestResolver};
use lightning_lane::model::{Guest, IneligibleReason};
use lightning_lane::wire::ApiGuest;
use rand::{seq::SliceRandom, thread_rng, Rng};
use std::sync::Arc;
use std::thread;

const REASONS: [IneligibleReason; 6] = [
    IneligibleReason::InvalidParkAdmission,
    IneligibleReason::ParkReservationNeeded,
    IneligibleReason::LightningLaneNeeded,
    IneligibleReason::ExperienceLimitReached,
    IneligibleReason::TooEarly,
    IneligibleReason::TooEarlyForParkHopping,
];

fn random_party(size: usize) -> (Vec<ApiGuest>, Vec<ApiGuest>) {
    let mut rng = thread_rng();
    let mut eligible = Vec::new();
    let mut ineligible = Vec::new();
    for i in 0..size {
        let guest = ApiGuest {
            id: format!("guest{}", i),
            first_name: format!("First{}", rng.gen_range(0..100)),
            last_name: "Guest".to_string(),
            primary: i == 0,
            character_id: Some(format!("{}", rng.gen_range(10000..20000))),
            ..Default::default()
        };
        if rng.gen_bool(0.5) {
            eligible.push(guest);
        } else {
            let reason = *REASONS.choose(&mut rng).unwrap();
            let eligible_after = (reason == IneligibleReason::TooEarly)
                .then(|| format!("{:02}:00:00", rng.gen_range(8..20)));
            ineligible.push(ApiGuest {
                ineligible_reason: Some(reason),
                eligible_after,
                ..guest
            });
        }
    }
    (eligible, ineligible)
}

// Resolution of one eligibility response, by party size
pub fn resolve_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("guest_resolution");

    for size in [4, 12, 48].iter() {
        let (eligible, ineligible) = random_party(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            let resolver = GuestResolver::new();
            resolver.set_party_ids((0..*size).step_by(2).map(|i| format!("guest{}", i)));
            b.iter(|| black_box(resolver.resolve(&eligible, &ineligible)));
        });
    }

    group.finish();
}

// Several eligibility responses landing on one shared resolver
pub fn concurrent_resolve_benchmark(c: &mut Criterion) {
    c.bench_function("guest_resolution_concurrent", |b| {
        let parties: Vec<_> = (0..8).map(|_| random_party(12)).collect();
        b.iter(|| {
            let resolver = Arc::new(GuestResolver::new());
            let handles: Vec<_> = parties
                .iter()
                .cloned()
                .map(|(eligible, ineligible)| {
                    let resolver = Arc::clone(&resolver);
                    thread::spawn(move || resolver.resolve(&eligible, &ineligible))
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }
            black_box(resolver.cache_len())
        });
    });
}

pub fn sort_benchmark(c: &mut Criterion) {
    let resolver = GuestResolver::new();
    let (_, ineligible) = random_party(200);
    let guests: Vec<Guest> = ineligible.iter().map(|g| resolver.convert(g)).collect();

    c.bench_function("ineligible_sort", |b| {
        b.iter(|| {
            let mut guests = guests.clone();
            guests.sort_by(compare_ineligible);
            black_box(guests)
        });
    });
}

criterion_group!(
    benches,
    resolve_benchmark,
    concurrent_resolve_benchmark,
    sort_benchmark
);
criterion_main!(benches);
