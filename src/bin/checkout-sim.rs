//! Checkout simulation CLI
//!
//! Runs one supermarket checkout simulation and prints a summary.
//! Ctrl-C (or SIGTERM) stops the run gracefully.
//!
//! # Example
//!
//! ```bash
//! # Reference store: 3 registers, 20 customers, 1 unit = 1ms
//! checkout-sim
//!
//! # Faster, reproducible run with customers retrying closed registers
//! checkout-sim -r 2 -c 40 --unit-us 100 --seed 7 --retry
//!
//! # Per-event logs
//! RUST_LOG=checkout=debug checkout-sim
//! ```

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use checkout::{
    BackoffPolicy, Config, JoinPolicy, LogWriter, ServiceTally, SimulationDriver, Subscribe,
    UnitRange,
};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Supermarket checkout simulation
#[derive(Parser, Debug)]
#[command(name = "checkout-sim")]
#[command(version, about, long_about = None)]
struct Args {
    /// Number of registers
    #[arg(short = 'r', long, default_value = "3")]
    registers: usize,

    /// Number of customers
    #[arg(short = 'c', long, default_value = "20")]
    customers: usize,

    /// Minimum delay between two arrivals (units)
    #[arg(long, default_value = "900")]
    arrival_min: u64,

    /// Maximum delay between two arrivals (units)
    #[arg(long, default_value = "3000")]
    arrival_max: u64,

    /// Minimum service time (units)
    #[arg(long, default_value = "5000")]
    service_min: u64,

    /// Maximum service time (units)
    #[arg(long, default_value = "6000")]
    service_max: u64,

    /// Continuous service after which a cashier asks for a break (units)
    #[arg(long, default_value = "6000")]
    break_threshold: u64,

    /// Real duration of one simulated unit, in microseconds
    #[arg(long, default_value = "1000")]
    unit_us: u64,

    /// Seconds to wait for agents after Ctrl-C
    #[arg(long, default_value = "5")]
    grace: u64,

    /// Random seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Customers retry instead of leaving when every register is closed
    #[arg(long)]
    retry: bool,
}

impl Args {
    fn config(&self) -> Config {
        let join_policy = if self.retry {
            JoinPolicy::Retry {
                backoff: BackoffPolicy::default(),
                max_attempts: None,
            }
        } else {
            JoinPolicy::Abandon
        };
        Config {
            registers: self.registers,
            customers: self.customers,
            arrival: UnitRange::new(self.arrival_min, self.arrival_max),
            service: UnitRange::new(self.service_min, self.service_max),
            break_threshold: self.break_threshold,
            unit: Duration::from_micros(self.unit_us),
            grace: Duration::from_secs(self.grace),
            join_policy,
            seed: self.seed,
            ..Config::default()
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let cfg = args.config();
    info!(
        registers = cfg.registers,
        customers = cfg.customers,
        unit_us = args.unit_us,
        seed = ?cfg.seed,
        retry = args.retry,
        "starting simulation"
    );

    let tally = Arc::new(ServiceTally::new());
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new()), tally.clone()];

    let sim = match SimulationDriver::builder(cfg).with_subscribers(subs).build() {
        Ok(sim) => sim,
        Err(e) => {
            error!(error = %e, "cannot start simulation");
            return ExitCode::FAILURE;
        }
    };

    match sim.run_until_signal().await {
        Ok(report) => {
            let tally = tally.snapshot().await;
            println!("outcome:          {:?}", report.outcome);
            println!("cashiers:         {}", report.cashiers_total);
            println!("served:           {}", report.served);
            println!("abandoned:        {}", report.abandoned);
            println!("left in queues:   {}", report.left_in_queues);
            println!("operations:       {}", tally.grants.len());
            println!("replacements:     {}", tally.replacements);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(label = e.as_label(), error = %e, "simulation failed");
            ExitCode::FAILURE
        }
    }
}
