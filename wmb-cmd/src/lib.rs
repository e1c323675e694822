//! Command implementations for WMB CLI.
//!
//! Provides subcommands for running tracer mass balances over a daily
//! observation table, plotting a modelled tracer against its samples and
//! listing the available tracer definitions.

use clap::{Args, Subcommand};
use wmb_data::DEFAULT_PAN_FACTOR;

pub mod balance;
pub mod plot;
pub mod tracers;

/// Where tracer definitions come from and which ones to run.
#[derive(Args, Debug, Clone, Default)]
pub struct TracerArgs {
    /// Tracer(s) to run, by name (default: every defined tracer)
    #[arg(short = 't', long = "tracer")]
    pub names: Vec<String>,

    /// CSV of extra tracer definitions, overriding embedded ones by name
    #[arg(long)]
    pub tracers: Option<String>,

    /// Ad-hoc conservative tracer, NAME:C0:CRAIN
    #[arg(long, value_name = "NAME:C0:CRAIN")]
    pub conservative: Vec<String>,

    /// Ad-hoc isotope tracer, NAME:SPECIES:C0:CRAIN (SPECIES is 18O or 2H)
    #[arg(long, value_name = "NAME:SPECIES:C0:CRAIN")]
    pub isotope: Vec<String>,
}

/// Options shared by every subcommand that runs the mass balance.
#[derive(Args, Debug, Clone)]
pub struct BalanceArgs {
    /// Daily observation CSV (date,area,rain,evaporation,volume,temperature,rh)
    #[arg(short = 'i', long)]
    pub input: String,

    /// Ratio of pan evaporation to open-water evaporation
    #[arg(long, default_value_t = DEFAULT_PAN_FACTOR)]
    pub pan_factor: f64,

    /// Skip physical plausibility checks and let NaN/Inf propagate
    #[arg(long)]
    pub compatible: bool,

    #[command(flatten)]
    pub tracer: TracerArgs,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run tracer mass balances and write the output table
    Run {
        #[command(flatten)]
        balance: BalanceArgs,

        /// Output path for the balance table CSV
        #[arg(short = 'o', long)]
        output: String,

        /// Optional JSON summary of each run and its sample comparison
        #[arg(long)]
        summary: Option<String>,
    },

    /// Plot a modelled tracer against its laboratory samples (SVG)
    Plot {
        #[command(flatten)]
        balance: BalanceArgs,

        /// Output path for the SVG chart
        #[arg(short = 'o', long)]
        output: String,

        /// Chart width in pixels
        #[arg(long, default_value_t = 800)]
        width: u32,

        /// Chart height in pixels
        #[arg(long, default_value_t = 300)]
        height: u32,
    },

    /// List the available tracer definitions
    Tracers {
        #[command(flatten)]
        tracer: TracerArgs,
    },
}

pub fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Run {
            balance,
            output,
            summary,
        } => balance::run_balance(&balance, &output, summary.as_deref()),
        Command::Plot {
            balance,
            output,
            width,
            height,
        } => plot::run_plot(&balance, &output, (width, height)),
        Command::Tracers { tracer } => tracers::run_list(&tracer),
    }
}
