use criterion::{Criterion, criterion_group, criterion_main};
use geo_tracker::geo::{GeoPoint, haversine_distance};
use geo_tracker::observations::{Observation, ObservationDetail};
use geo_tracker::proximity::nearest_observation;
use std::hint::black_box;

fn bench(c: &mut Criterion) {
    let amsterdam = GeoPoint::new(52.379_189, 4.899_431);
    let naples = GeoPoint::new(40.820_887, 14.422_816);

    c.bench_function("geo::haversine_distance", |b| {
        b.iter(|| haversine_distance(black_box(&amsterdam), black_box(&naples)));
    });

    // A dense urban scan: one observer, a thousand access points.
    let observations: Vec<Observation> = (0..1000)
        .map(|i| {
            Observation::new(
                GeoPoint::new(
                    52.35 + f64::from(i) * 1e-4,
                    4.85 + f64::from(i % 100) * 1e-4,
                ),
                ObservationDetail::Wifi {
                    ssid: format!("ap-{i}"),
                    signal_dbm: Some(-40.0 - f64::from(i % 50)),
                },
            )
        })
        .collect();

    c.bench_function("proximity::nearest_observation", |b| {
        b.iter(|| nearest_observation(black_box(amsterdam), black_box(&observations)));
    });
}

criterion_group!(benches, bench);
criterion_main!(benches);
