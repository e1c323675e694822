//! Tracer selection: embedded registry, user CSV and inline definitions.

use anyhow::Context;
use log::info;
use wmb_core::{
    registry::{parse_conservative, parse_isotope, TracerRegistry},
    tracer::{AtmosphericVapour, Tracer, TracerKind},
};

use crate::TracerArgs;

/// Build the registry described by `args`.
///
/// Embedded definitions come first, then the `--tracers` CSV, then inline
/// `--conservative`/`--isotope` definitions; later sources replace earlier
/// ones with the same name.
pub fn build_registry(args: &TracerArgs) -> anyhow::Result<TracerRegistry> {
    let mut registry =
        TracerRegistry::embedded().context("embedded tracer definitions are invalid")?;
    if let Some(path) = &args.tracers {
        let user = TracerRegistry::from_path(path)
            .with_context(|| format!("failed to read tracer definitions from {}", path))?;
        registry.merge(user);
    }
    for spec in &args.conservative {
        registry.insert(parse_conservative(spec)?);
    }
    for spec in &args.isotope {
        registry.insert(parse_isotope(spec)?);
    }
    Ok(registry)
}

/// Tracers to run: the named ones, else the inline ones, else all.
pub fn select_tracers(args: &TracerArgs) -> anyhow::Result<Vec<Tracer>> {
    let registry = build_registry(args)?;
    let selected: Vec<Tracer> = if !args.names.is_empty() {
        args.names
            .iter()
            .map(|name| registry.get(name).cloned())
            .collect::<Result<_, _>>()?
    } else if !(args.conservative.is_empty() && args.isotope.is_empty()) {
        let mut inline = Vec::new();
        for spec in &args.conservative {
            inline.push(parse_conservative(spec)?);
        }
        for spec in &args.isotope {
            inline.push(parse_isotope(spec)?);
        }
        inline
    } else {
        registry.iter().cloned().collect()
    };
    info!(
        "Selected tracers: {}",
        selected
            .iter()
            .map(|t| t.name())
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(selected)
}

/// One-line description of a tracer for listings.
pub fn describe(tracer: &Tracer) -> String {
    let kind = match tracer.kind() {
        TracerKind::Conservative => "conservative".to_string(),
        TracerKind::Isotope(model) => {
            let vapour = match model.atmospheric_vapour {
                AtmosphericVapour::EquilibriumWithRain => "vapour in equilibrium with rain".to_string(),
                AtmosphericVapour::Fixed(delta) => format!("vapour {}", delta),
            };
            format!("isotope {:?}, {}, theta {}", model.species, vapour, model.turbulence)
        }
    };
    format!(
        "{:<8} C0={:<8} Crain={:<8} {}",
        tracer.name(),
        tracer.initial_concentration(),
        tracer.rain_concentration(),
        kind
    )
}

pub fn run_list(args: &TracerArgs) -> anyhow::Result<()> {
    let registry = build_registry(args)?;
    for tracer in registry.iter() {
        println!("{}", describe(tracer));
    }
    Ok(())
}
