//! Compound and blend reference data
//!
//! The catalog holds the immutable pharmacokinetic reference data the rest of
//! the engine works from: per-compound elimination half-lives, per-route
//! bioavailability and absorption kinetics, and relative potency weights.
//! Blends resolve to weighted mixtures of catalog compounds.
//!
//! A [Catalog] is an explicit value, constructed once and passed into every
//! simulation or calibration call. It is never mutated by the engine.
//!
//! # Usage
//!
//! ```
//! use endosim::catalog::{Catalog, Route};
//!
//! let catalog = Catalog::reference();
//! let compound = catalog.compound("testosterone-enanthate").unwrap();
//! let kinetics = compound.kinetics(Route::Intramuscular).unwrap();
//! assert!(kinetics.bioavailability() > 0.0);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

mod reference;

/// Errors arising from invalid or missing catalog data
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Elimination half-life must be positive and finite
    #[error("invalid half-life {value} for compound '{id}'")]
    InvalidHalfLife { id: String, value: f64 },

    /// Bioavailability must be within (0, 1]
    #[error("invalid bioavailability {0}")]
    InvalidBioavailability(f64),

    /// Absorption rate constant must be positive and finite
    #[error("invalid absorption rate {0}")]
    InvalidAbsorptionRate(f64),

    /// Potency weights must be non-negative and finite
    #[error("invalid potency weight {0}")]
    InvalidPotency(f64),

    /// Blend component concentrations must be positive and finite
    #[error("invalid concentration {value} in blend '{id}'")]
    InvalidConcentration { id: String, value: f64 },

    /// A blend must contain at least one component
    #[error("blend '{0}' has no components")]
    EmptyBlend(String),

    /// Compound lookup by an id not present in the catalog
    #[error("unknown compound '{0}'")]
    UnknownCompound(String),

    /// Blend lookup by an id not present in the catalog
    #[error("unknown blend '{0}'")]
    UnknownBlend(String),

    /// Two catalog entries share an id
    #[error("duplicate catalog id '{0}'")]
    DuplicateId(String),

    /// The compound does not define kinetics for the requested route
    #[error("compound '{id}' does not support route {route}")]
    RouteNotSupported { id: String, route: Route },

    /// The catalog JSON could not be parsed
    #[error("failed to parse catalog JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Administration route for a dose
///
/// Routes are a fixed enumeration; a compound that does not define kinetics
/// for a route reports [CatalogError::RouteNotSupported] rather than falling
/// back to defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Route {
    /// Intramuscular depot injection
    Intramuscular,
    /// Subcutaneous injection
    Subcutaneous,
    /// Oral administration
    Oral,
    /// Transdermal gel or patch
    Transdermal,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Route::Intramuscular => write!(f, "intramuscular"),
            Route::Subcutaneous => write!(f, "subcutaneous"),
            Route::Oral => write!(f, "oral"),
            Route::Transdermal => write!(f, "transdermal"),
        }
    }
}

/// Route-specific absorption kinetics for a compound
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RouteKinetics {
    bioavailability: f64,
    absorption_rate: f64,
}

impl RouteKinetics {
    /// Create validated route kinetics
    ///
    /// # Arguments
    ///
    /// * `bioavailability` - Fraction of the dose reaching circulation, in (0, 1]
    /// * `absorption_rate` - First-order absorption rate constant in day⁻¹, > 0
    pub fn new(bioavailability: f64, absorption_rate: f64) -> Result<Self, CatalogError> {
        if !bioavailability.is_finite() || bioavailability <= 0.0 || bioavailability > 1.0 {
            return Err(CatalogError::InvalidBioavailability(bioavailability));
        }
        if !absorption_rate.is_finite() || absorption_rate <= 0.0 {
            return Err(CatalogError::InvalidAbsorptionRate(absorption_rate));
        }
        Ok(Self {
            bioavailability,
            absorption_rate,
        })
    }

    /// Fraction of the administered dose reaching systemic circulation
    pub fn bioavailability(&self) -> f64 {
        self.bioavailability
    }

    /// First-order absorption rate constant (day⁻¹)
    pub fn absorption_rate(&self) -> f64 {
        self.absorption_rate
    }
}

/// Relative potency weights, normalized to testosterone = 1.0
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Potency {
    anabolic: f64,
    androgenic: f64,
}

impl Potency {
    /// Create validated potency weights
    pub fn new(anabolic: f64, androgenic: f64) -> Result<Self, CatalogError> {
        for w in [anabolic, androgenic] {
            if !w.is_finite() || w < 0.0 {
                return Err(CatalogError::InvalidPotency(w));
            }
        }
        Ok(Self {
            anabolic,
            androgenic,
        })
    }

    /// Anabolic weight relative to testosterone
    pub fn anabolic(&self) -> f64 {
        self.anabolic
    }

    /// Androgenic weight relative to testosterone
    pub fn androgenic(&self) -> f64 {
        self.androgenic
    }
}

/// A single compound with its elimination and absorption reference data
///
/// Compounds are created at catalog load and never mutated by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Compound {
    id: String,
    name: String,
    half_life: f64,
    routes: HashMap<Route, RouteKinetics>,
    potency: Potency,
}

impl Compound {
    /// Create a new compound with no supported routes
    ///
    /// # Arguments
    ///
    /// * `id` - Stable catalog identifier
    /// * `name` - Human-readable name
    /// * `half_life` - Elimination half-life in days, > 0
    /// * `potency` - Anabolic/androgenic potency weights
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        half_life: f64,
        potency: Potency,
    ) -> Result<Self, CatalogError> {
        let id = id.into();
        if !half_life.is_finite() || half_life <= 0.0 {
            return Err(CatalogError::InvalidHalfLife {
                id,
                value: half_life,
            });
        }
        Ok(Self {
            id,
            name: name.into(),
            half_life,
            routes: HashMap::new(),
            potency,
        })
    }

    /// Add kinetics for an administration route
    pub fn with_route(mut self, route: Route, kinetics: RouteKinetics) -> Self {
        self.routes.insert(route, kinetics);
        self
    }

    /// Catalog identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Human-readable name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Elimination half-life in days
    pub fn half_life(&self) -> f64 {
        self.half_life
    }

    /// First-order elimination rate constant, ln(2) / half-life (day⁻¹)
    pub fn elimination_rate(&self) -> f64 {
        std::f64::consts::LN_2 / self.half_life
    }

    /// Potency weights for the effect-index aggregator
    pub fn potency(&self) -> Potency {
        self.potency
    }

    /// Whether the compound defines kinetics for a route
    pub fn supports(&self, route: Route) -> bool {
        self.routes.contains_key(&route)
    }

    /// Kinetics for a route, or [CatalogError::RouteNotSupported]
    pub fn kinetics(&self, route: Route) -> Result<RouteKinetics, CatalogError> {
        self.routes
            .get(&route)
            .copied()
            .ok_or_else(|| CatalogError::RouteNotSupported {
                id: self.id.clone(),
                route,
            })
    }
}

/// One component of a blend: a compound at a fixed concentration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlendComponent {
    compound: String,
    concentration: f64,
}

impl BlendComponent {
    /// Compound id of this component
    pub fn compound(&self) -> &str {
        &self.compound
    }

    /// Concentration of this component (mg/mL)
    pub fn concentration(&self) -> f64 {
        self.concentration
    }
}

/// A fixed mixture of compounds administered as a single dose
///
/// Component mass fractions are derived by normalizing each component's
/// concentration by the blend's total concentration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blend {
    id: String,
    name: String,
    components: Vec<BlendComponent>,
}

impl Blend {
    /// Create a validated blend
    ///
    /// # Arguments
    ///
    /// * `id` - Stable catalog identifier
    /// * `name` - Human-readable name
    /// * `components` - Ordered `(compound id, concentration mg/mL)` pairs
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        components: Vec<(String, f64)>,
    ) -> Result<Self, CatalogError> {
        let id = id.into();
        if components.is_empty() {
            return Err(CatalogError::EmptyBlend(id));
        }
        let components = components
            .into_iter()
            .map(|(compound, concentration)| {
                if !concentration.is_finite() || concentration <= 0.0 {
                    return Err(CatalogError::InvalidConcentration {
                        id: id.clone(),
                        value: concentration,
                    });
                }
                Ok(BlendComponent {
                    compound,
                    concentration,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            id,
            name: name.into(),
            components,
        })
    }

    /// Catalog identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Human-readable name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ordered components of the blend
    pub fn components(&self) -> &[BlendComponent] {
        &self.components
    }

    /// Sum of component concentrations (mg/mL)
    pub fn total_concentration(&self) -> f64 {
        self.components.iter().map(|c| c.concentration).sum()
    }

    /// Split an administered dose mass into per-compound masses
    ///
    /// Each component receives `amount × concentration / total`, so the
    /// returned masses sum to `amount`.
    pub fn component_doses(&self, amount: f64) -> Vec<(&str, f64)> {
        let total = self.total_concentration();
        self.components
            .iter()
            .map(|c| (c.compound.as_str(), amount * c.concentration / total))
            .collect()
    }
}

/// What a dose administers: a single compound or a blend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Substance {
    /// A catalog compound, by id
    Compound(String),
    /// A catalog blend, by id
    Blend(String),
}

impl Substance {
    /// Convenience constructor for a compound reference
    pub fn compound(id: impl Into<String>) -> Self {
        Substance::Compound(id.into())
    }

    /// Convenience constructor for a blend reference
    pub fn blend(id: impl Into<String>) -> Self {
        Substance::Blend(id.into())
    }
}

/// Immutable catalog of compounds and blends
///
/// The catalog validates that blends reference known compounds and that ids
/// are unique. It is cheap to clone and safe to share across parallel runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    compounds: HashMap<String, Compound>,
    blends: HashMap<String, Blend>,
}

impl Catalog {
    /// Build a catalog from validated compounds and blends
    pub fn new(compounds: Vec<Compound>, blends: Vec<Blend>) -> Result<Self, CatalogError> {
        let mut compound_map = HashMap::with_capacity(compounds.len());
        for compound in compounds {
            if compound_map.contains_key(&compound.id) {
                return Err(CatalogError::DuplicateId(compound.id));
            }
            compound_map.insert(compound.id.clone(), compound);
        }
        let mut blend_map = HashMap::with_capacity(blends.len());
        for blend in blends {
            for component in &blend.components {
                if !compound_map.contains_key(&component.compound) {
                    return Err(CatalogError::UnknownCompound(component.compound.clone()));
                }
            }
            if blend_map.contains_key(&blend.id) || compound_map.contains_key(&blend.id) {
                return Err(CatalogError::DuplicateId(blend.id));
            }
            blend_map.insert(blend.id.clone(), blend);
        }
        Ok(Self {
            compounds: compound_map,
            blends: blend_map,
        })
    }

    /// Load a catalog from JSON text
    ///
    /// The expected shape mirrors [Compound] and [Blend]:
    ///
    /// ```json
    /// {
    ///   "compounds": [{
    ///     "id": "testosterone-enanthate",
    ///     "name": "Testosterone enanthate",
    ///     "half_life": 4.5,
    ///     "potency": { "anabolic": 1.0, "androgenic": 1.0 },
    ///     "routes": { "Intramuscular": { "bioavailability": 1.0, "absorption_rate": 0.7 } }
    ///   }],
    ///   "blends": []
    /// }
    /// ```
    ///
    /// All numeric fields are re-validated through the same constructors used
    /// for programmatic catalogs.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let spec: CatalogSpec = serde_json::from_str(json)?;
        let compounds = spec
            .compounds
            .into_iter()
            .map(|c| {
                let potency = Potency::new(c.potency.anabolic, c.potency.androgenic)?;
                let mut compound = Compound::new(c.id, c.name, c.half_life, potency)?;
                for (route, kinetics) in c.routes {
                    compound = compound.with_route(
                        route,
                        RouteKinetics::new(kinetics.bioavailability, kinetics.absorption_rate)?,
                    );
                }
                Ok(compound)
            })
            .collect::<Result<Vec<_>, CatalogError>>()?;
        let blends = spec
            .blends
            .into_iter()
            .map(|b| {
                Blend::new(
                    b.id,
                    b.name,
                    b.components
                        .into_iter()
                        .map(|c| (c.compound, c.concentration))
                        .collect(),
                )
            })
            .collect::<Result<Vec<_>, CatalogError>>()?;
        Catalog::new(compounds, blends)
    }

    /// The compiled-in reference catalog of common hormone esters
    pub fn reference() -> Self {
        reference::build()
    }

    /// Look up a compound by id
    pub fn compound(&self, id: &str) -> Result<&Compound, CatalogError> {
        self.compounds
            .get(id)
            .ok_or_else(|| CatalogError::UnknownCompound(id.to_string()))
    }

    /// Look up a blend by id
    pub fn blend(&self, id: &str) -> Result<&Blend, CatalogError> {
        self.blends
            .get(id)
            .ok_or_else(|| CatalogError::UnknownBlend(id.to_string()))
    }

    /// All compounds in the catalog, in arbitrary order
    pub fn compounds(&self) -> impl Iterator<Item = &Compound> {
        self.compounds.values()
    }

    /// All blends in the catalog, in arbitrary order
    pub fn blends(&self) -> impl Iterator<Item = &Blend> {
        self.blends.values()
    }
}

// Raw JSON shapes, validated into domain types by `from_json`.
#[derive(Deserialize)]
struct CatalogSpec {
    compounds: Vec<CompoundSpec>,
    #[serde(default)]
    blends: Vec<BlendSpec>,
}

#[derive(Deserialize)]
struct CompoundSpec {
    id: String,
    name: String,
    half_life: f64,
    potency: PotencySpec,
    #[serde(default)]
    routes: HashMap<Route, RouteKineticsSpec>,
}

#[derive(Deserialize)]
struct PotencySpec {
    anabolic: f64,
    androgenic: f64,
}

#[derive(Deserialize)]
struct RouteKineticsSpec {
    bioavailability: f64,
    absorption_rate: f64,
}

#[derive(Deserialize)]
struct BlendSpec {
    id: String,
    name: String,
    components: Vec<BlendComponentSpec>,
}

#[derive(Deserialize)]
struct BlendComponentSpec {
    compound: String,
    concentration: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn test_compound() -> Compound {
        Compound::new(
            "test-e",
            "Testosterone enanthate",
            4.5,
            Potency::new(1.0, 1.0).unwrap(),
        )
        .unwrap()
        .with_route(Route::Intramuscular, RouteKinetics::new(1.0, 0.7).unwrap())
    }

    #[test]
    fn test_compound_validation() {
        let potency = Potency::new(1.0, 1.0).unwrap();
        assert!(Compound::new("a", "A", 0.0, potency).is_err());
        assert!(Compound::new("a", "A", -1.0, potency).is_err());
        assert!(Compound::new("a", "A", f64::NAN, potency).is_err());
        assert!(Compound::new("a", "A", f64::INFINITY, potency).is_err());
        assert!(Compound::new("a", "A", 4.5, potency).is_ok());
    }

    #[test]
    fn test_route_kinetics_validation() {
        assert!(RouteKinetics::new(0.0, 0.7).is_err());
        assert!(RouteKinetics::new(1.5, 0.7).is_err());
        assert!(RouteKinetics::new(1.0, 0.0).is_err());
        assert!(RouteKinetics::new(1.0, f64::NAN).is_err());
        assert!(RouteKinetics::new(0.95, 0.7).is_ok());
    }

    #[test]
    fn test_elimination_rate() {
        let compound = test_compound();
        assert_relative_eq!(
            compound.elimination_rate(),
            std::f64::consts::LN_2 / 4.5,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_unsupported_route_is_typed() {
        let compound = test_compound();
        assert!(compound.kinetics(Route::Intramuscular).is_ok());
        match compound.kinetics(Route::Oral) {
            Err(CatalogError::RouteNotSupported { id, route }) => {
                assert_eq!(id, "test-e");
                assert_eq!(route, Route::Oral);
            }
            other => panic!("expected RouteNotSupported, got {other:?}"),
        }
    }

    #[test]
    fn test_blend_mass_conservation() {
        let blend = Blend::new(
            "mix",
            "Mix",
            vec![
                ("a".to_string(), 30.0),
                ("b".to_string(), 60.0),
                ("c".to_string(), 60.0),
                ("d".to_string(), 100.0),
            ],
        )
        .unwrap();
        assert_relative_eq!(blend.total_concentration(), 250.0);

        let doses = blend.component_doses(250.0);
        let total: f64 = doses.iter().map(|(_, mass)| mass).sum();
        assert_relative_eq!(total, 250.0, max_relative = 1e-12);
        assert_relative_eq!(doses[0].1, 30.0, max_relative = 1e-12);
        assert_relative_eq!(doses[3].1, 100.0, max_relative = 1e-12);
    }

    #[test]
    fn test_blend_requires_components() {
        assert!(matches!(
            Blend::new("empty", "Empty", vec![]),
            Err(CatalogError::EmptyBlend(_))
        ));
        assert!(Blend::new("bad", "Bad", vec![("a".to_string(), 0.0)]).is_err());
    }

    #[test]
    fn test_catalog_rejects_unknown_blend_component() {
        let blend = Blend::new("mix", "Mix", vec![("nope".to_string(), 100.0)]).unwrap();
        let result = Catalog::new(vec![test_compound()], vec![blend]);
        assert!(matches!(result, Err(CatalogError::UnknownCompound(_))));
    }

    #[test]
    fn test_catalog_lookup() {
        let catalog = Catalog::new(vec![test_compound()], vec![]).unwrap();
        assert!(catalog.compound("test-e").is_ok());
        assert!(matches!(
            catalog.compound("missing"),
            Err(CatalogError::UnknownCompound(_))
        ));
    }

    #[test]
    fn test_reference_catalog_is_valid() {
        let catalog = Catalog::reference();
        assert!(catalog.compounds().count() >= 5);
        for compound in catalog.compounds() {
            assert!(compound.half_life() > 0.0);
            assert!(compound.elimination_rate().is_finite());
        }
        for blend in catalog.blends() {
            for component in blend.components() {
                assert!(catalog.compound(component.compound()).is_ok());
            }
        }
    }

    #[test]
    fn test_catalog_from_json() {
        let json = r#"{
            "compounds": [{
                "id": "test-e",
                "name": "Testosterone enanthate",
                "half_life": 4.5,
                "potency": { "anabolic": 1.0, "androgenic": 1.0 },
                "routes": {
                    "Intramuscular": { "bioavailability": 1.0, "absorption_rate": 0.7 }
                }
            }],
            "blends": []
        }"#;
        let catalog = Catalog::from_json(json).unwrap();
        let compound = catalog.compound("test-e").unwrap();
        assert_relative_eq!(compound.half_life(), 4.5);
        assert!(compound.supports(Route::Intramuscular));
    }

    #[test]
    fn test_catalog_from_json_revalidates() {
        let json = r#"{
            "compounds": [{
                "id": "bad",
                "name": "Bad",
                "half_life": -1.0,
                "potency": { "anabolic": 1.0, "androgenic": 1.0 }
            }]
        }"#;
        assert!(matches!(
            Catalog::from_json(json),
            Err(CatalogError::InvalidHalfLife { .. })
        ));
    }
}
