//! Day-by-day tracer mass balance recurrence.
//!
//! Day 0 is seeded from the tracer's initial concentration. Every later day
//! adds the rain flux and subtracts the evaporative and closure fluxes that
//! were computed from the *previous* day's state:
//!
//! ```text
//! M[0] = V[0]·C₀
//! M[i] = M[i−1] + ΔM_P(i−1) − ΔM_E(i−1) − ΔM_I(i−1)
//! C[i] = M[i] / V[i]
//! ```
//!
//! The one-day lag between computing a flux and applying it is kept
//! exactly as the scheme defines it.

use chrono::NaiveDate;
use log::{debug, info};
use serde::Serialize;

use wmb_core::{
    error::{BalanceError, Result},
    observation::ObservationRecord,
    tracer::Tracer,
};

use crate::fluxes::{DailyFlux, DailySeries, ValidationMode};

/// Default ratio of pan evaporation to open-water evaporation.
pub const DEFAULT_PAN_FACTOR: f64 = 1.2;

/// Tracer mass fluxes computed at the end of one day, applied on the next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PendingFlux {
    /// Mass delivered by rain, `C_rain · P`
    pub rain: f64,
    /// Mass carried off by evaporation, `δE · E / pan_factor`; zero for
    /// conservative tracers
    pub evaporation: f64,
    /// Mass carried by the closure residual, `C · I`
    pub inflow: f64,
}

impl PendingFlux {
    fn for_day(
        tracer: &Tracer,
        observation: &ObservationRecord,
        flux: &DailyFlux,
        concentration: f64,
        pan_factor: f64,
        strict: bool,
    ) -> Result<Self> {
        let inflow = flux.inflow.ok_or_else(|| {
            BalanceError::Sequence(format!("inflow undefined on {}", flux.date))
        })?;
        if strict && tracer.is_isotope() && observation.relative_humidity >= 1.0 {
            return Err(BalanceError::domain(
                observation.date,
                format!(
                    "relative humidity {} leaves no evaporative flux for {}",
                    observation.relative_humidity,
                    tracer.name()
                ),
            ));
        }
        let evaporation = match tracer.evaporative_flux(
            observation.temperature,
            observation.relative_humidity,
            concentration,
        ) {
            Some(delta_e) if strict && !delta_e.is_finite() => {
                return Err(BalanceError::domain(
                    observation.date,
                    format!("non-finite evaporate composition for {}", tracer.name()),
                ));
            }
            Some(delta_e) => delta_e * (flux.pan_evaporation / pan_factor),
            None => 0.0,
        };
        Ok(PendingFlux {
            rain: tracer.rain_concentration() * flux.precipitation,
            evaporation,
            inflow: concentration * inflow,
        })
    }

    /// Net mass change these fluxes apply to the following day.
    pub fn net(&self) -> f64 {
        self.rain - self.evaporation - self.inflow
    }
}

/// Tracer mass and concentration for one day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyMass {
    pub date: NaiveDate,
    pub mass: f64,
    pub concentration: f64,
    /// Fluxes computed from this day's state; `None` on the last day
    pub pending: Option<PendingFlux>,
}

/// Output of one mass balance run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConcentrationSeries {
    tracer: String,
    days: Vec<DailyMass>,
}

impl ConcentrationSeries {
    pub fn tracer_name(&self) -> &str {
        &self.tracer
    }

    pub fn days(&self) -> &[DailyMass] {
        &self.days
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn masses(&self) -> Vec<f64> {
        self.days.iter().map(|d| d.mass).collect()
    }

    pub fn concentrations(&self) -> Vec<f64> {
        self.days.iter().map(|d| d.concentration).collect()
    }
}

/// Propagate `tracer` through `series` one day at a time.
///
/// `pan_factor` converts pan evaporation to open-water evaporation and must
/// be positive. A zero volume fails with [`BalanceError::Domain`] unless the
/// series was loaded in [`ValidationMode::Compatible`], in which case the
/// resulting Inf/NaN propagates. The last day's undefined inflow is never
/// read.
pub fn run(series: &DailySeries, tracer: &Tracer, pan_factor: f64) -> Result<ConcentrationSeries> {
    if !(pan_factor.is_finite() && pan_factor > 0.0) {
        return Err(BalanceError::Parameter {
            name: "pan_factor".to_string(),
            reason: format!("must be positive, got {}", pan_factor),
        });
    }
    let strict = series.mode() == ValidationMode::Strict;
    let n = series.len();

    let mut days: Vec<DailyMass> = Vec::with_capacity(n);
    let mut mass = 0.0;
    let mut pending_flux_from_previous_day: Option<PendingFlux> = None;

    for (i, (observation, flux)) in series.days().enumerate() {
        if strict && observation.volume == 0.0 {
            return Err(BalanceError::domain(observation.date, "zero volume"));
        }

        let concentration = match pending_flux_from_previous_day.take() {
            None => {
                mass = observation.volume * tracer.initial_concentration();
                // M0 / V0 by construction; kept exact
                tracer.initial_concentration()
            }
            Some(pending) => {
                mass += pending.net();
                mass / observation.volume
            }
        };

        let pending = if i + 1 < n {
            Some(PendingFlux::for_day(
                tracer,
                observation,
                flux,
                concentration,
                pan_factor,
                strict,
            )?)
        } else {
            None
        };

        debug!(
            "{} {}: M={} C={} pending={:?}",
            tracer.name(),
            observation.date,
            mass,
            concentration,
            pending
        );

        days.push(DailyMass {
            date: observation.date,
            mass,
            concentration,
            pending,
        });
        pending_flux_from_previous_day = pending;
    }

    if let (Some(first), Some(last)) = (days.first(), days.last()) {
        info!(
            "{}: {} days, C {} -> {} (pan factor {})",
            tracer.name(),
            days.len(),
            first.concentration,
            last.concentration,
            pan_factor
        );
    }

    Ok(ConcentrationSeries {
        tracer: tracer.name().to_string(),
        days,
    })
}
