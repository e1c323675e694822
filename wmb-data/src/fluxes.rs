//! Daily water fluxes derived from raw observations.

use chrono::NaiveDate;
use log::{info, warn};
use serde::Serialize;

use wmb_core::{
    date_range::check_consecutive,
    error::{BalanceError, Result},
    observation::ObservationRecord,
};

/// How strictly [`load`] checks observations for physical plausibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ValidationMode {
    /// Reject non-physical days with a [`BalanceError::Domain`].
    #[default]
    Strict,
    /// Accept anything that parses; NaN and Inf propagate through the run.
    Compatible,
}

/// Water fluxes for one day, all in m³.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyFlux {
    pub date: NaiveDate,
    /// Precipitation volume `P = area × rain / 1000`
    pub precipitation: f64,
    /// Pan evaporation volume `E = area × evaporation / 1000`
    pub pan_evaporation: f64,
    /// Storage decrease to the next day, `V[i] − V[i+1]`; `None` on the last day
    pub storage_decrease: Option<f64>,
    /// Closure residual `I = P − E − dV`; `None` on the last day
    pub inflow: Option<f64>,
}

/// Validated observations together with their derived fluxes.
///
/// Only [`load`] builds a `DailySeries`, so every series handed to the
/// recurrence carries its derived columns.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySeries {
    observations: Vec<ObservationRecord>,
    fluxes: Vec<DailyFlux>,
    mode: ValidationMode,
}

impl DailySeries {
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn observations(&self) -> &[ObservationRecord] {
        &self.observations
    }

    pub fn fluxes(&self) -> &[DailyFlux] {
        &self.fluxes
    }

    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.observations.iter().map(|o| o.date)
    }

    /// Observation and flux for each day, in date order.
    pub fn days(&self) -> impl Iterator<Item = (&ObservationRecord, &DailyFlux)> {
        self.observations.iter().zip(self.fluxes.iter())
    }
}

/// Derive the daily fluxes for a date-ordered run of observations.
///
/// The observations must be non-empty, strictly consecutive days; gaps are
/// never interpolated. In [`ValidationMode::Strict`] every day must also
/// have a positive area and volume, non-negative rain and evaporation,
/// relative humidity within [0, 1] and a finite temperature.
///
/// `dV` looks forward to the next day's volume, so the last day has no
/// `dV` and no inflow.
pub fn load(observations: &[ObservationRecord], mode: ValidationMode) -> Result<DailySeries> {
    let dates: Vec<NaiveDate> = observations.iter().map(|o| o.date).collect();
    check_consecutive(&dates)?;

    if mode == ValidationMode::Strict {
        for record in observations {
            validate(record)?;
        }
    }

    let mut fluxes = Vec::with_capacity(observations.len());
    for (i, record) in observations.iter().enumerate() {
        let precipitation = record.area * record.rain / 1000.0;
        let pan_evaporation = record.area * record.evaporation / 1000.0;
        let storage_decrease = observations
            .get(i + 1)
            .map(|next| record.volume - next.volume);
        let inflow = storage_decrease.map(|dv| precipitation - pan_evaporation - dv);
        fluxes.push(DailyFlux {
            date: record.date,
            precipitation,
            pan_evaporation,
            storage_decrease,
            inflow,
        });
    }

    if mode == ValidationMode::Compatible {
        let non_finite = fluxes
            .iter()
            .filter(|f| {
                !(f.precipitation.is_finite()
                    && f.pan_evaporation.is_finite()
                    && f.inflow.map_or(true, f64::is_finite))
            })
            .count();
        if non_finite > 0 {
            warn!(
                "{} day(s) with non-finite fluxes accepted in compatibility mode",
                non_finite
            );
        }
    }

    info!(
        "Derived fluxes for {} days ({} to {})",
        fluxes.len(),
        dates[0],
        dates[dates.len() - 1]
    );

    Ok(DailySeries {
        observations: observations.to_vec(),
        fluxes,
        mode,
    })
}

fn validate(record: &ObservationRecord) -> Result<()> {
    let date = record.date;
    if !(record.area.is_finite() && record.area > 0.0) {
        return Err(BalanceError::domain(
            date,
            format!("area must be positive, got {}", record.area),
        ));
    }
    if !(record.volume.is_finite() && record.volume > 0.0) {
        return Err(BalanceError::domain(
            date,
            format!("volume must be positive, got {}", record.volume),
        ));
    }
    if !(record.rain.is_finite() && record.rain >= 0.0) {
        return Err(BalanceError::domain(
            date,
            format!("rain must be non-negative, got {}", record.rain),
        ));
    }
    if !(record.evaporation.is_finite() && record.evaporation >= 0.0) {
        return Err(BalanceError::domain(
            date,
            format!("evaporation must be non-negative, got {}", record.evaporation),
        ));
    }
    if !record.temperature.is_finite() {
        return Err(BalanceError::domain(date, "temperature is not finite"));
    }
    if !(0.0..=1.0).contains(&record.relative_humidity) {
        return Err(BalanceError::domain(
            date,
            format!(
                "relative humidity must be a fraction in [0, 1], got {}",
                record.relative_humidity
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{day, record, three_day_records};
    use approx::assert_relative_eq;

    #[test]
    fn test_three_day_fluxes() {
        let series = load(&three_day_records(), ValidationMode::Strict).unwrap();
        let fluxes = series.fluxes();
        let p: Vec<f64> = fluxes.iter().map(|f| f.precipitation).collect();
        let e: Vec<f64> = fluxes.iter().map(|f| f.pan_evaporation).collect();
        assert_eq!(p, vec![10.0, 0.0, 0.0]);
        assert_eq!(e, vec![0.0, 5.0, 5.0]);
        assert_eq!(fluxes[0].storage_decrease, Some(5.0));
        assert_eq!(fluxes[1].storage_decrease, Some(5.0));
        assert_eq!(fluxes[0].inflow, Some(5.0));
        assert_eq!(fluxes[1].inflow, Some(-10.0));
    }

    #[test]
    fn test_last_day_is_undefined() {
        let series = load(&three_day_records(), ValidationMode::Strict).unwrap();
        let last = series.fluxes().last().unwrap();
        assert_eq!(last.storage_decrease, None);
        assert_eq!(last.inflow, None);
    }

    #[test]
    fn test_single_day() {
        let series = load(&[record(1, 500.0, 2.0, 1.0, 40.0)], ValidationMode::Strict).unwrap();
        assert_eq!(series.len(), 1);
        let flux = series.fluxes()[0];
        assert_relative_eq!(flux.precipitation, 1.0);
        assert_relative_eq!(flux.pan_evaporation, 0.5);
        assert_eq!(flux.inflow, None);
    }

    #[test]
    fn test_closure_identity() {
        let records = vec![
            record(1, 1200.0, 3.5, 4.1, 250.0),
            record(2, 1180.0, 0.0, 6.2, 247.3),
            record(3, 1175.0, 12.0, 2.0, 251.9),
        ];
        let series = load(&records, ValidationMode::Strict).unwrap();
        for (i, flux) in series.fluxes().iter().take(2).enumerate() {
            let dv = records[i].volume - records[i + 1].volume;
            assert_relative_eq!(flux.storage_decrease.unwrap(), dv);
            assert_relative_eq!(
                flux.inflow.unwrap(),
                flux.precipitation - flux.pan_evaporation - dv
            );
        }
    }

    #[test]
    fn test_empty_is_sequence_error() {
        assert!(matches!(
            load(&[], ValidationMode::Strict),
            Err(BalanceError::Sequence(_))
        ));
    }

    #[test]
    fn test_gap_is_sequence_error_in_both_modes() {
        let mut records = three_day_records();
        records[2].date = day(5);
        for mode in [ValidationMode::Strict, ValidationMode::Compatible] {
            assert!(matches!(load(&records, mode), Err(BalanceError::Sequence(_))));
        }
    }

    #[test]
    fn test_strict_rejects_non_physical_days() {
        let cases: [fn(&mut ObservationRecord); 7] = [
            |r| r.volume = 0.0,
            |r| r.volume = -4.0,
            |r| r.area = 0.0,
            |r| r.relative_humidity = 65.0,
            |r| r.relative_humidity = -0.1,
            |r| r.rain = -1.0,
            |r| r.temperature = f64::NAN,
        ];
        for mutate in cases {
            let mut records = three_day_records();
            mutate(&mut records[1]);
            match load(&records, ValidationMode::Strict) {
                Err(BalanceError::Domain { date, .. }) => assert_eq!(date, day(2)),
                other => panic!("expected domain error, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_compatible_accepts_non_physical_days() {
        let mut records = three_day_records();
        records[1].volume = 0.0;
        records[1].relative_humidity = 65.0;
        let series = load(&records, ValidationMode::Compatible).unwrap();
        assert_eq!(series.mode(), ValidationMode::Compatible);
        assert_eq!(series.fluxes()[0].storage_decrease, Some(100.0));
    }
}
