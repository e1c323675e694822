//! `plot` subcommand: modelled concentration as a line, samples as hollow
//! markers.

use anyhow::anyhow;
use chrono::{NaiveDate, TimeDelta};
use log::info;
use plotters::{coord::Shift, prelude::*};
use std::ops::Range;

use wmb_data::BalanceTable;

use crate::{balance::compute_table, BalanceArgs};

/// Points to draw for one tracer.
#[derive(Debug, Clone, PartialEq)]
pub struct TracerChart {
    pub tracer: String,
    pub modelled: Vec<(NaiveDate, f64)>,
    pub samples: Vec<(NaiveDate, f64)>,
}

impl TracerChart {
    /// Pull the modelled column and its `_sample` column out of a table.
    /// Non-finite modelled values are dropped.
    pub fn from_table(table: &BalanceTable, tracer: &str) -> Option<Self> {
        let column = table.column(tracer)?;
        let dates: Vec<NaiveDate> = table.series().dates().collect();
        let modelled = dates
            .iter()
            .zip(column)
            .filter(|(_, c)| c.is_finite())
            .map(|(d, c)| (*d, *c))
            .collect();
        let samples = table
            .sample(tracer)
            .map(|s| {
                dates
                    .iter()
                    .zip(&s.values)
                    .filter_map(|(d, v)| v.map(|v| (*d, v)))
                    .collect()
            })
            .unwrap_or_default();
        Some(TracerChart {
            tracer: tracer.to_string(),
            modelled,
            samples,
        })
    }

    /// Date axis covering every point; never empty.
    pub fn x_range(&self) -> Option<Range<NaiveDate>> {
        let dates = self.modelled.iter().chain(&self.samples).map(|(d, _)| *d);
        let start = dates.clone().min()?;
        let end = dates.max()?;
        let end = if end > start { end } else { start + TimeDelta::days(1) };
        Some(start..end)
    }

    /// Value axis covering every point with 5 % padding; never empty.
    pub fn y_range(&self) -> Option<Range<f64>> {
        let values = self.modelled.iter().chain(&self.samples).map(|(_, v)| *v);
        let min = values.clone().fold(f64::INFINITY, f64::min);
        let max = values.fold(f64::NEG_INFINITY, f64::max);
        if !(min.is_finite() && max.is_finite()) {
            return None;
        }
        let pad = if max > min { (max - min) * 0.05 } else { 1.0 };
        Some((min - pad)..(max + pad))
    }

    fn draw<DB>(&self, root: DrawingArea<DB, Shift>) -> Result<(), Box<dyn std::error::Error>>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let x_range: RangedDate<NaiveDate> = self.x_range().ok_or("nothing to plot")?.into();
        let y_range = self.y_range().ok_or("nothing to plot")?;

        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .margin(10i32)
            .x_label_area_size(30u32)
            .y_label_area_size(50u32)
            .build_cartesian_2d(x_range, y_range)?;
        chart
            .configure_mesh()
            .x_labels(8_usize)
            .y_desc(self.tracer.as_str())
            .draw()?;

        chart
            .draw_series(LineSeries::new(self.modelled.iter().copied(), &BLUE))?
            .label(self.tracer.as_str())
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

        if !self.samples.is_empty() {
            let sample_label = format!("{}_sample", self.tracer);
            chart
                .draw_series(
                    self.samples
                        .iter()
                        .map(|point| Circle::new(*point, 4, BLUE.stroke_width(1))),
                )?
                .label(sample_label)
                .legend(|(x, y)| Circle::new((x + 10, y), 4, BLUE.stroke_width(1)));
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
        root.present()?;
        Ok(())
    }

    /// Render the chart as an SVG document.
    pub fn to_svg(&self, size: (u32, u32)) -> anyhow::Result<String> {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
            self.draw(root)
                .map_err(|e| anyhow!("failed to draw {}: {}", self.tracer, e))?;
        }
        Ok(svg)
    }
}

pub fn run_plot(args: &BalanceArgs, output: &str, size: (u32, u32)) -> anyhow::Result<()> {
    let table = compute_table(args)?;
    let tracer = table
        .columns()
        .first()
        .map(|c| c.name.clone())
        .ok_or_else(|| anyhow!("no tracer to plot"))?;
    if table.columns().len() > 1 {
        info!("Several tracers selected; plotting {}", tracer);
    }
    let chart = TracerChart::from_table(&table, &tracer)
        .ok_or_else(|| anyhow!("no column for {}", tracer))?;
    let svg = chart.to_svg(size)?;
    std::fs::write(output, svg)?;
    info!(
        "Plotted {} ({} modelled days, {} samples) to {}",
        tracer,
        chart.modelled.len(),
        chart.samples.len(),
        output
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 3, d).unwrap()
    }

    fn chart() -> TracerChart {
        TracerChart {
            tracer: "d18O".to_string(),
            modelled: vec![(date(1), -2.0), (date(2), -1.0), (date(3), 0.0)],
            samples: vec![(date(2), -1.5)],
        }
    }

    #[test]
    fn test_ranges() {
        let chart = chart();
        assert_eq!(chart.x_range().unwrap(), date(1)..date(3));
        let y = chart.y_range().unwrap();
        assert!((y.start - -2.1).abs() < 1e-12);
        assert!((y.end - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_single_point_ranges_are_not_empty() {
        let chart = TracerChart {
            tracer: "Cl".to_string(),
            modelled: vec![(date(1), 5.0)],
            samples: Vec::new(),
        };
        assert_eq!(chart.x_range().unwrap(), date(1)..date(2));
        assert_eq!(chart.y_range().unwrap(), 4.0..6.0);
    }

    #[test]
    fn test_empty_chart_has_no_ranges() {
        let chart = TracerChart {
            tracer: "Cl".to_string(),
            modelled: Vec::new(),
            samples: Vec::new(),
        };
        assert!(chart.x_range().is_none());
        assert!(chart.y_range().is_none());
        assert!(chart.to_svg((400, 200)).is_err());
    }

    #[test]
    fn test_to_svg() {
        let svg = chart().to_svg((400, 200)).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("d18O_sample"));
    }
}
