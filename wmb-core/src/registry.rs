use csv::ReaderBuilder;
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{
    error::{BalanceError, Result},
    tracer::{AtmosphericVapour, IsotopeModel, IsotopeSpecies, Tracer},
};

/// Embedded CSV of the default tracer definitions.
pub static CSV_OBJECT: &str = include_str!("../fixtures/tracers.csv");

/// One row of a tracer definition CSV.
///
/// Expected columns: `name, kind, initial, rain, species, atmospheric_vapour,
/// turbulence`. The last three only apply to isotopes and may be blank.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct TracerRecord {
    pub name: String,
    /// `conservative` or `isotope`
    pub kind: String,
    pub initial: f64,
    pub rain: f64,
    #[serde(default)]
    pub species: Option<String>,
    /// Fixed δA (‰); blank means vapour in equilibrium with rain
    #[serde(default)]
    pub atmospheric_vapour: Option<f64>,
    #[serde(default)]
    pub turbulence: Option<f64>,
}

impl TryFrom<TracerRecord> for Tracer {
    type Error = BalanceError;

    fn try_from(record: TracerRecord) -> Result<Self> {
        let name = record.name.trim().to_string();
        if name.is_empty() {
            return Err(BalanceError::TracerDefinition("empty tracer name".to_string()));
        }
        match record.kind.trim().to_lowercase().as_str() {
            "conservative" => Ok(Tracer::conservative(name, record.initial, record.rain)),
            "isotope" => {
                let species_str = record.species.as_deref().unwrap_or("");
                let species = IsotopeSpecies::parse(species_str).ok_or_else(|| {
                    BalanceError::TracerDefinition(format!(
                        "{}: unknown isotope species '{}'",
                        name, species_str
                    ))
                })?;
                let mut model = IsotopeModel::new(species);
                if let Some(delta_a) = record.atmospheric_vapour {
                    model.atmospheric_vapour = AtmosphericVapour::Fixed(delta_a);
                }
                if let Some(theta) = record.turbulence {
                    if !(theta.is_finite() && theta >= 0.0) {
                        return Err(BalanceError::TracerDefinition(format!(
                            "{}: turbulence must be non-negative, got {}",
                            name, theta
                        )));
                    }
                    model.turbulence = theta;
                }
                Ok(Tracer::isotope(name, record.initial, record.rain, model))
            }
            other => Err(BalanceError::TracerDefinition(format!(
                "{}: unknown tracer kind '{}'",
                name, other
            ))),
        }
    }
}

/// Named collection of tracer definitions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TracerRegistry {
    tracers: Vec<Tracer>,
}

impl TracerRegistry {
    /// Registry from the embedded default definitions.
    pub fn embedded() -> Result<Self> {
        Self::parse_csv(CSV_OBJECT)
    }

    /// Parse a CSV string of tracer definitions.
    pub fn parse_csv(csv_object: &str) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(b',')
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(csv_object.as_bytes());
        let mut registry = TracerRegistry::default();
        for row in rdr.deserialize::<TracerRecord>() {
            registry.insert(row?.try_into()?);
        }
        Ok(registry)
    }

    /// Read tracer definitions from a CSV file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let body = std::fs::read_to_string(path.as_ref())?;
        let registry = Self::parse_csv(&body)?;
        info!(
            "Loaded {} tracer definitions from {}",
            registry.len(),
            path.as_ref().display()
        );
        Ok(registry)
    }

    /// Add a tracer, replacing any existing definition of the same name.
    pub fn insert(&mut self, tracer: Tracer) {
        match self.tracers.iter_mut().find(|t| t.name() == tracer.name()) {
            Some(existing) => *existing = tracer,
            None => self.tracers.push(tracer),
        }
    }

    /// Overlay `other` on top of this registry.
    pub fn merge(&mut self, other: TracerRegistry) {
        for tracer in other.tracers {
            self.insert(tracer);
        }
    }

    pub fn get(&self, name: &str) -> Result<&Tracer> {
        self.tracers
            .iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| BalanceError::UnknownTracer(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tracer> {
        self.tracers.iter()
    }

    pub fn len(&self) -> usize {
        self.tracers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracers.is_empty()
    }
}

fn parse_number(field: &str, what: &str, spec: &str) -> Result<f64> {
    field.trim().parse::<f64>().map_err(|_| {
        BalanceError::TracerDefinition(format!("'{}': {} is not a number", spec, what))
    })
}

/// Parse an inline conservative tracer definition `NAME:C0:CRAIN`.
pub fn parse_conservative(spec: &str) -> Result<Tracer> {
    let parts: Vec<&str> = spec.split(':').collect();
    match parts.as_slice() {
        [name, initial, rain] if !name.trim().is_empty() => Ok(Tracer::conservative(
            name.trim(),
            parse_number(initial, "C0", spec)?,
            parse_number(rain, "CRAIN", spec)?,
        )),
        _ => Err(BalanceError::TracerDefinition(format!(
            "'{}': expected NAME:C0:CRAIN",
            spec
        ))),
    }
}

/// Parse an inline isotope tracer definition `NAME:SPECIES:C0:CRAIN`.
pub fn parse_isotope(spec: &str) -> Result<Tracer> {
    let parts: Vec<&str> = spec.split(':').collect();
    match parts.as_slice() {
        [name, species, initial, rain] if !name.trim().is_empty() => {
            let species = IsotopeSpecies::parse(species).ok_or_else(|| {
                BalanceError::TracerDefinition(format!(
                    "'{}': unknown isotope species '{}'",
                    spec, species
                ))
            })?;
            Ok(Tracer::isotope(
                name.trim(),
                parse_number(initial, "C0", spec)?,
                parse_number(rain, "CRAIN", spec)?,
                IsotopeModel::new(species),
            ))
        }
        _ => Err(BalanceError::TracerDefinition(format!(
            "'{}': expected NAME:SPECIES:C0:CRAIN",
            spec
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracer::TracerKind;

    #[test]
    fn test_embedded_registry() {
        let registry = TracerRegistry::embedded().unwrap();
        assert_eq!(registry.len(), 4);
        let cl = registry.get("Cl").unwrap();
        assert!(!cl.is_isotope());
        assert_eq!(cl.initial_concentration(), 120.0);
        let d18o = registry.get("d18O").unwrap();
        match d18o.kind() {
            TracerKind::Isotope(model) => {
                assert_eq!(model.species, IsotopeSpecies::Oxygen18);
                assert_eq!(model.atmospheric_vapour, AtmosphericVapour::EquilibriumWithRain);
            }
            TracerKind::Conservative => panic!("d18O should be an isotope"),
        }
    }

    #[test]
    fn test_unknown_tracer() {
        let registry = TracerRegistry::embedded().unwrap();
        assert!(matches!(
            registry.get("Na"),
            Err(BalanceError::UnknownTracer(name)) if name == "Na"
        ));
    }

    #[test]
    fn test_merge_overrides_by_name() {
        let mut registry = TracerRegistry::embedded().unwrap();
        let user = TracerRegistry::parse_csv(
            "name,kind,initial,rain,species,atmospheric_vapour,turbulence\n\
             Cl,conservative,80,0,,,\n\
             d18O,isotope,-1,-6,18O,-14.5,0.5\n\
             SO4,conservative,30,1,,,\n",
        )
        .unwrap();
        registry.merge(user);
        assert_eq!(registry.len(), 5);
        assert_eq!(registry.get("Cl").unwrap().initial_concentration(), 80.0);
        match registry.get("d18O").unwrap().kind() {
            TracerKind::Isotope(model) => {
                assert_eq!(model.atmospheric_vapour, AtmosphericVapour::Fixed(-14.5));
                assert_eq!(model.turbulence, 0.5);
            }
            TracerKind::Conservative => panic!("d18O should be an isotope"),
        }
        let names: Vec<&str> = registry.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["Cl", "EC", "d18O", "d2H", "SO4"]);
    }

    #[test]
    fn test_bad_definitions() {
        let header = "name,kind,initial,rain,species,atmospheric_vapour,turbulence\n";
        for row in [
            "X,radioactive,1,1,,,\n",
            "X,isotope,1,1,13C,,\n",
            "X,isotope,1,1,18O,,-1\n",
            ",conservative,1,1,,,\n",
        ] {
            let csv = format!("{header}{row}");
            assert!(
                matches!(
                    TracerRegistry::parse_csv(&csv),
                    Err(BalanceError::TracerDefinition(_))
                ),
                "{row}"
            );
        }
    }

    #[test]
    fn test_inline_definitions() {
        let cl = parse_conservative("Cl:120:2.5").unwrap();
        assert_eq!(cl.name(), "Cl");
        assert_eq!(cl.rain_concentration(), 2.5);
        let d2h = parse_isotope("d2H:2H:-15:-32").unwrap();
        assert!(d2h.is_isotope());
        assert_eq!(d2h.initial_concentration(), -15.0);
        assert!(parse_conservative("Cl:120").is_err());
        assert!(parse_conservative("Cl:abc:1").is_err());
        assert!(parse_isotope("d2H:3H:-15:-32").is_err());
    }
}
