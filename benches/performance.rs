use criterion::{criterion_group, criterion_main, Criterion};
use endosim::prelude::*;
use std::hint::black_box;

fn spec(compound: &str, amount: f64, interval: f64) -> DoseSpec {
    DoseSpec::new(
        Substance::compound(compound),
        amount,
        Route::Intramuscular,
        interval,
        0.0,
    )
    .unwrap()
}

/// 20-week, five-compound advanced treatment (~50 doses after expansion)
fn example_treatment() -> Treatment {
    Treatment::builder()
        .id("bench")
        .stage(
            Stage::new(
                0,
                8,
                vec![
                    spec("testosterone-enanthate", 250.0, 3.5),
                    spec("nandrolone-decanoate", 200.0, 7.0),
                ],
            )
            .unwrap(),
        )
        .stage(
            Stage::new(
                8,
                16,
                vec![
                    spec("testosterone-cypionate", 250.0, 3.5),
                    spec("trenbolone-acetate", 75.0, 3.0),
                ],
            )
            .unwrap(),
        )
        .stage(Stage::new(16, 20, vec![spec("testosterone-propionate", 100.0, 3.0)]).unwrap())
        .build()
        .unwrap()
}

fn simulate_20_weeks_daily(catalog: &Catalog, treatment: &Treatment) {
    let grid = TimeGrid::daily(0.0, 140.0).unwrap();
    let result = simulate(catalog, treatment, &grid).unwrap();
    let indices = effect_indices(catalog, &result).unwrap();
    black_box((result, indices));
}

fn calibrate_five_samples(catalog: &Catalog, treatment: &Treatment) {
    let report = calibrate(catalog, treatment).unwrap();
    black_box(report);
}

fn criterion_benchmark(c: &mut Criterion) {
    let catalog = Catalog::reference();
    let treatment = example_treatment();

    c.bench_function("simulate 20w daily", |b| {
        b.iter(|| simulate_20_weeks_daily(black_box(&catalog), black_box(&treatment)))
    });

    let mut sampled = example_treatment();
    for t in [28.0, 56.0, 84.0, 112.0, 133.0] {
        sampled.add_sample(BloodSample::new(t, 500.0 + t));
    }
    c.bench_function("calibrate 5 samples", |b| {
        b.iter(|| calibrate_five_samples(black_box(&catalog), black_box(&sampled)))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
