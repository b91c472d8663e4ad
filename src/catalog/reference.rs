//! Compiled-in reference catalog
//!
//! Half-lives, route kinetics, and potency weights for the common injectable
//! and oral esters. Values are reference data for simulation, not clinical
//! guidance; per-subject deviation is what the calibration factor absorbs.

use super::{Blend, Catalog, Compound, Potency, Route, RouteKinetics};

struct Entry {
    id: &'static str,
    name: &'static str,
    half_life: f64,
    // (anabolic, androgenic), testosterone = 1.0
    potency: (f64, f64),
    routes: &'static [(Route, f64, f64)], // (route, bioavailability, ka day⁻¹)
}

const COMPOUNDS: &[Entry] = &[
    Entry {
        id: "testosterone-propionate",
        name: "Testosterone propionate",
        half_life: 0.8,
        potency: (1.0, 1.0),
        routes: &[(Route::Intramuscular, 1.0, 1.8)],
    },
    Entry {
        id: "testosterone-phenylpropionate",
        name: "Testosterone phenylpropionate",
        half_life: 1.5,
        potency: (1.0, 1.0),
        routes: &[(Route::Intramuscular, 1.0, 1.3)],
    },
    Entry {
        id: "testosterone-isocaproate",
        name: "Testosterone isocaproate",
        half_life: 4.0,
        potency: (1.0, 1.0),
        routes: &[(Route::Intramuscular, 1.0, 0.8)],
    },
    Entry {
        id: "testosterone-enanthate",
        name: "Testosterone enanthate",
        half_life: 4.5,
        potency: (1.0, 1.0),
        routes: &[
            (Route::Intramuscular, 1.0, 0.7),
            (Route::Subcutaneous, 0.95, 0.5),
        ],
    },
    Entry {
        id: "testosterone-cypionate",
        name: "Testosterone cypionate",
        half_life: 5.0,
        potency: (1.0, 1.0),
        routes: &[
            (Route::Intramuscular, 1.0, 0.6),
            (Route::Subcutaneous, 0.95, 0.45),
        ],
    },
    Entry {
        id: "testosterone-decanoate",
        name: "Testosterone decanoate",
        half_life: 7.5,
        potency: (1.0, 1.0),
        routes: &[(Route::Intramuscular, 1.0, 0.35)],
    },
    Entry {
        id: "testosterone-undecanoate",
        name: "Testosterone undecanoate",
        half_life: 20.9,
        potency: (1.0, 1.0),
        routes: &[(Route::Intramuscular, 1.0, 0.12), (Route::Oral, 0.07, 3.0)],
    },
    Entry {
        id: "testosterone-gel",
        name: "Testosterone (transdermal gel)",
        half_life: 0.4,
        potency: (1.0, 1.0),
        routes: &[(Route::Transdermal, 0.1, 4.0)],
    },
    Entry {
        id: "nandrolone-decanoate",
        name: "Nandrolone decanoate",
        half_life: 7.5,
        potency: (1.25, 0.37),
        routes: &[(Route::Intramuscular, 1.0, 0.35)],
    },
    Entry {
        id: "trenbolone-acetate",
        name: "Trenbolone acetate",
        half_life: 1.0,
        potency: (5.0, 5.0),
        routes: &[(Route::Intramuscular, 1.0, 1.5)],
    },
    Entry {
        id: "oxandrolone",
        name: "Oxandrolone",
        half_life: 0.4,
        potency: (6.3, 0.24),
        routes: &[(Route::Oral, 0.97, 8.0)],
    },
];

// (blend id, name, components as (compound id, mg/mL))
const BLENDS: &[(&str, &str, &[(&str, f64)])] = &[(
    "sustanon-250",
    "Sustanon 250",
    &[
        ("testosterone-propionate", 30.0),
        ("testosterone-phenylpropionate", 60.0),
        ("testosterone-isocaproate", 60.0),
        ("testosterone-decanoate", 100.0),
    ],
)];

pub(super) fn build() -> Catalog {
    let compounds = COMPOUNDS
        .iter()
        .map(|entry| {
            let potency = Potency::new(entry.potency.0, entry.potency.1)
                .expect("reference potency is valid");
            let mut compound = Compound::new(entry.id, entry.name, entry.half_life, potency)
                .expect("reference compound is valid");
            for &(route, bioavailability, absorption_rate) in entry.routes {
                compound = compound.with_route(
                    route,
                    RouteKinetics::new(bioavailability, absorption_rate)
                        .expect("reference kinetics are valid"),
                );
            }
            compound
        })
        .collect();

    let blends = BLENDS
        .iter()
        .map(|(id, name, components)| {
            Blend::new(
                *id,
                *name,
                components
                    .iter()
                    .map(|(compound, concentration)| (compound.to_string(), *concentration))
                    .collect(),
            )
            .expect("reference blend is valid")
        })
        .collect();

    Catalog::new(compounds, blends).expect("reference catalog is consistent")
}
