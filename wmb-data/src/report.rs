//! Output table: observations, derived fluxes and one column per tracer run.
//!
//! # CSV Format
//!
//! `date,area,rain,evaporation,volume,temperature,rh,<tracer>_sample...,P,E,dV,I,<tracer>...`
//!
//! `rh` is written as a fraction. Undefined cells (the last day's `dV` and
//! `I`, unsampled days) are left empty.

use log::info;
use std::{io::Write, path::Path};

use wmb_core::{
    error::{BalanceError, Result},
    observation::{SampleColumn, REQUIRED_COLUMNS},
};
use wmb_utils::dates::format_date;

use crate::{
    fluxes::DailySeries,
    mass_balance::ConcentrationSeries,
    metrics::{compare, SampleComparison},
};

/// Derived flux column names, in output order.
pub const FLUX_COLUMNS: [&str; 4] = ["P", "E", "dV", "I"];

/// A named concentration column attached by [`BalanceTable::report`].
#[derive(Debug, Clone, PartialEq)]
pub struct TracerColumn {
    pub name: String,
    pub values: Vec<f64>,
}

/// Observation table extended with derived fluxes and tracer columns.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceTable {
    series: DailySeries,
    samples: Vec<SampleColumn>,
    columns: Vec<TracerColumn>,
}

impl BalanceTable {
    pub fn new(series: DailySeries) -> Self {
        BalanceTable {
            series,
            samples: Vec::new(),
            columns: Vec::new(),
        }
    }

    /// Attach laboratory sample columns read alongside the observations.
    pub fn with_samples(mut self, samples: Vec<SampleColumn>) -> Result<Self> {
        for sample in &samples {
            if sample.values.len() != self.series.len() {
                return Err(BalanceError::Sequence(format!(
                    "{} has {} rows, expected {}",
                    sample.column_name(),
                    sample.values.len(),
                    self.series.len()
                )));
            }
        }
        self.samples = samples;
        Ok(self)
    }

    pub fn series(&self) -> &DailySeries {
        &self.series
    }

    pub fn columns(&self) -> &[TracerColumn] {
        &self.columns
    }

    /// Concentration column for `name`, if a run has been reported.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    pub fn sample(&self, tracer: &str) -> Option<&SampleColumn> {
        self.samples.iter().find(|s| s.tracer == tracer)
    }

    /// Attach a run's concentrations under its tracer name.
    ///
    /// A column of the same name is overwritten in place; new names are
    /// appended.
    pub fn report(&mut self, run: &ConcentrationSeries) -> Result<()> {
        if run.len() != self.series.len() {
            return Err(BalanceError::Sequence(format!(
                "{} has {} days, table has {}",
                run.tracer_name(),
                run.len(),
                self.series.len()
            )));
        }
        let column = TracerColumn {
            name: run.tracer_name().to_string(),
            values: run.concentrations(),
        };
        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
        Ok(())
    }

    /// Agreement of a reported column with its `_sample` column.
    pub fn comparison(&self, tracer: &str) -> Option<SampleComparison> {
        let simulated = self.column(tracer)?;
        let samples = self.sample(tracer)?;
        compare(tracer, simulated, &samples.values)
    }

    /// Header row of [`BalanceTable::write_csv`].
    pub fn headers(&self) -> Vec<String> {
        let mut headers = vec!["date".to_string()];
        headers.extend(REQUIRED_COLUMNS.iter().map(|c| c.to_string()));
        headers.extend(self.samples.iter().map(|s| s.column_name()));
        headers.extend(FLUX_COLUMNS.iter().map(|c| c.to_string()));
        headers.extend(self.columns.iter().map(|c| c.name.clone()));
        headers
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(self.headers())?;
        for (i, (observation, flux)) in self.series.days().enumerate() {
            let mut row = vec![
                format_date(&observation.date),
                observation.area.to_string(),
                observation.rain.to_string(),
                observation.evaporation.to_string(),
                observation.volume.to_string(),
                observation.temperature.to_string(),
                observation.relative_humidity.to_string(),
            ];
            row.extend(self.samples.iter().map(|s| cell(s.values[i])));
            row.push(flux.precipitation.to_string());
            row.push(flux.pan_evaporation.to_string());
            row.push(cell(flux.storage_decrease));
            row.push(cell(flux.inflow));
            row.extend(self.columns.iter().map(|c| c.values[i].to_string()));
            wtr.write_record(&row)?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Write the table to a CSV file.
    pub fn to_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path.as_ref())?;
        self.write_csv(std::io::BufWriter::new(file))?;
        info!(
            "Wrote {} rows x {} columns to {}",
            self.series.len(),
            self.headers().len(),
            path.as_ref().display()
        );
        Ok(())
    }
}

fn cell(value: Option<f64>) -> String {
    value.map_or(String::new(), |v| v.to_string())
}
