//! `run` subcommand: mass balances for every selected tracer.

use anyhow::Context;
use log::{info, warn};
use serde_json::json;
use wmb_core::observation::ObservationTable;
use wmb_data::{load, run, BalanceTable, ValidationMode};

use crate::{tracers::select_tracers, BalanceArgs};

/// Load the observations and run every selected tracer into a table.
pub fn compute_table(args: &BalanceArgs) -> anyhow::Result<BalanceTable> {
    let observations = ObservationTable::from_path(&args.input)
        .with_context(|| format!("failed to read observations from {}", args.input))?;
    let mode = if args.compatible {
        ValidationMode::Compatible
    } else {
        ValidationMode::Strict
    };
    let series = load(&observations.records, mode)?;
    let mut table = BalanceTable::new(series).with_samples(observations.samples)?;

    for tracer in select_tracers(&args.tracer)? {
        let result = run(table.series(), &tracer, args.pan_factor)
            .with_context(|| format!("mass balance failed for {}", tracer.name()))?;
        table.report(&result)?;
        match table.comparison(tracer.name()) {
            Some(cmp) => info!(
                "{}: {} samples, bias {:.4}, RMSE {:.4}, MAE {:.4}",
                cmp.tracer, cmp.count, cmp.bias, cmp.rmse, cmp.mae
            ),
            None => info!("{}: no samples to compare against", tracer.name()),
        }
    }
    if table.columns().is_empty() {
        warn!("No tracers selected; writing fluxes only");
    }
    Ok(table)
}

/// JSON summary of a finished table: one entry per tracer column.
pub fn summarize(table: &BalanceTable, pan_factor: f64) -> serde_json::Value {
    let tracers: Vec<serde_json::Value> = table
        .columns()
        .iter()
        .map(|column| {
            json!({
                "tracer": column.name,
                "first": column.values.first(),
                "last": column.values.last(),
                "comparison": table.comparison(&column.name),
            })
        })
        .collect();
    json!({
        "days": table.series().len(),
        "pan_factor": pan_factor,
        "tracers": tracers,
    })
}

pub fn run_balance(args: &BalanceArgs, output: &str, summary: Option<&str>) -> anyhow::Result<()> {
    let table = compute_table(args)?;
    table
        .to_path(output)
        .with_context(|| format!("failed to write {}", output))?;
    if let Some(path) = summary {
        let body = serde_json::to_string_pretty(&summarize(&table, args.pan_factor))?;
        std::fs::write(path, body).with_context(|| format!("failed to write {}", path))?;
        info!("Summary written to {}", path);
    }
    info!("Mass balance complete. Output: {}", output);
    Ok(())
}
