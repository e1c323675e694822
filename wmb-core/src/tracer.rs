//! Tracer models: what a tracer contributes to the daily mass balance.
//!
//! A [`Tracer`] carries the two constants every species needs (initial and
//! rain concentration) plus a [`TracerKind`] tag. Conservative species have
//! no evaporative mass flux; stable isotopes of water are enriched during
//! evaporation and expose the composition of the evaporating vapour through
//! [`Tracer::evaporative_flux`].

use serde::{Deserialize, Serialize};

/// Absolute zero offset for converting °C to K.
pub const KELVIN_OFFSET: f64 = 273.15;

/// Kinetic fractionation constant for ¹⁸O (‰).
pub const KINETIC_CONSTANT_18O: f64 = 14.2;

/// Kinetic fractionation constant for ²H (‰).
pub const KINETIC_CONSTANT_2H: f64 = 12.5;

/// Stable isotope species of water.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IsotopeSpecies {
    /// δ¹⁸O
    #[serde(rename = "18O")]
    Oxygen18,
    /// δ²H
    #[serde(rename = "2H")]
    Deuterium,
}

impl IsotopeSpecies {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "18o" | "o18" | "oxygen18" | "d18o" => Some(IsotopeSpecies::Oxygen18),
            "2h" | "h2" | "deuterium" | "d2h" | "dd" => Some(IsotopeSpecies::Deuterium),
            _ => None,
        }
    }

    /// Equilibrium liquid/vapour fractionation factor α⁺ (> 1) at
    /// `temperature` in °C, after Horita & Wesolowski (1994).
    pub fn equilibrium_factor(&self, temperature: f64) -> f64 {
        let t = temperature + KELVIN_OFFSET;
        let thousand_ln_alpha = match self {
            IsotopeSpecies::Oxygen18 => {
                -7.685 + 6.7123 * (1e3 / t) - 1.6664 * (1e6 / t.powi(2))
                    + 0.35041 * (1e9 / t.powi(3))
            }
            IsotopeSpecies::Deuterium => {
                1158.8 * (t.powi(3) / 1e9) - 1620.1 * (t.powi(2) / 1e6) + 794.84 * (t / 1e3)
                    - 161.04
                    + 2.9992 * (1e9 / t.powi(3))
            }
        };
        (thousand_ln_alpha / 1000.0).exp()
    }

    /// Kinetic fractionation constant Cₖ (‰).
    pub fn kinetic_constant(&self) -> f64 {
        match self {
            IsotopeSpecies::Oxygen18 => KINETIC_CONSTANT_18O,
            IsotopeSpecies::Deuterium => KINETIC_CONSTANT_2H,
        }
    }
}

/// Isotopic composition assumed for atmospheric moisture over the water body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AtmosphericVapour {
    /// δA in isotopic equilibrium with the rain composition at air temperature.
    EquilibriumWithRain,
    /// A fixed δA (‰).
    Fixed(f64),
}

/// Craig-Gordon evaporation model for one isotope species.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IsotopeModel {
    pub species: IsotopeSpecies,
    pub atmospheric_vapour: AtmosphericVapour,
    /// Turbulence parameter θ scaling the kinetic enrichment; 1 for small
    /// water bodies.
    pub turbulence: f64,
}

impl IsotopeModel {
    pub fn new(species: IsotopeSpecies) -> Self {
        IsotopeModel {
            species,
            atmospheric_vapour: AtmosphericVapour::EquilibriumWithRain,
            turbulence: 1.0,
        }
    }

    /// Equilibrium enrichment ε⁺ = (α⁺ − 1)·1000 (‰).
    pub fn equilibrium_enrichment(&self, temperature: f64) -> f64 {
        (self.species.equilibrium_factor(temperature) - 1.0) * 1000.0
    }

    /// Kinetic enrichment εₖ = θ·Cₖ·(1 − h) (‰).
    pub fn kinetic_enrichment(&self, relative_humidity: f64) -> f64 {
        self.turbulence * self.species.kinetic_constant() * (1.0 - relative_humidity)
    }

    /// δA for the given air temperature and rain composition.
    pub fn atmospheric_composition(&self, temperature: f64, rain: f64) -> f64 {
        match self.atmospheric_vapour {
            AtmosphericVapour::Fixed(delta) => delta,
            AtmosphericVapour::EquilibriumWithRain => {
                let alpha = self.species.equilibrium_factor(temperature);
                let epsilon = (alpha - 1.0) * 1000.0;
                (rain - epsilon) / alpha
            }
        }
    }

    /// Composition δE of the evaporating vapour (‰) from a water body at
    /// composition `lake`.
    ///
    /// The denominator `1 − h + εₖ/1000` is strictly positive for
    /// h ∈ [0, 1) with θ ≥ 0.
    pub fn evaporate_composition(
        &self,
        temperature: f64,
        relative_humidity: f64,
        lake: f64,
        rain: f64,
    ) -> f64 {
        let h = relative_humidity;
        let alpha = self.species.equilibrium_factor(temperature);
        let epsilon = (alpha - 1.0) * 1000.0;
        let epsilon_k = self.kinetic_enrichment(h);
        let delta_a = self.atmospheric_composition(temperature, rain);
        ((lake - epsilon) / alpha - h * delta_a - epsilon_k) / (1.0 - h + epsilon_k / 1000.0)
    }
}

/// Tracer variant tag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TracerKind {
    /// No fractionation: evaporation removes water but no tracer mass.
    Conservative,
    /// Stable isotope enriched during evaporation.
    Isotope(IsotopeModel),
}

/// A dissolved or isotopic species tracked through the water balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tracer {
    name: String,
    initial_concentration: f64,
    rain_concentration: f64,
    kind: TracerKind,
}

impl Tracer {
    pub fn conservative(
        name: impl Into<String>,
        initial_concentration: f64,
        rain_concentration: f64,
    ) -> Self {
        Tracer {
            name: name.into(),
            initial_concentration,
            rain_concentration,
            kind: TracerKind::Conservative,
        }
    }

    pub fn isotope(
        name: impl Into<String>,
        initial_concentration: f64,
        rain_concentration: f64,
        model: IsotopeModel,
    ) -> Self {
        Tracer {
            name: name.into(),
            initial_concentration,
            rain_concentration,
            kind: TracerKind::Isotope(model),
        }
    }

    /// Identifier used for the output column.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Concentration C₀ seeding day 0 (`M₀ = V₀·C₀`).
    pub fn initial_concentration(&self) -> f64 {
        self.initial_concentration
    }

    /// Concentration of incoming precipitation, constant across a run.
    pub fn rain_concentration(&self) -> f64 {
        self.rain_concentration
    }

    pub fn kind(&self) -> &TracerKind {
        &self.kind
    }

    pub fn is_isotope(&self) -> bool {
        matches!(self.kind, TracerKind::Isotope(_))
    }

    /// Tracer concentration carried by evaporating water, per unit of
    /// evaporated volume.
    ///
    /// Returns `None` for conservative tracers, whose evaporative mass flux
    /// is zero by definition. For isotopes this is the Craig-Gordon δE at
    /// the given air temperature (°C), relative humidity (fraction, not
    /// percent) and current lake composition. No normalisation is applied
    /// to the inputs.
    pub fn evaporative_flux(
        &self,
        temperature: f64,
        relative_humidity: f64,
        current_concentration: f64,
    ) -> Option<f64> {
        match &self.kind {
            TracerKind::Conservative => None,
            TracerKind::Isotope(model) => Some(model.evaporate_composition(
                temperature,
                relative_humidity,
                current_concentration,
                self.rain_concentration,
            )),
        }
    }
}
