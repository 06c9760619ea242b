//! # substate
//!
//! Runs the robot subsystems against the simulation driver at a fixed period.
//! Configuration comes from a single TOML file (see `substate_runtime::config`);
//! without `--config` the built-in defaults are used.

use clap::Parser;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

use substate_common::config::LogLevel;
use substate_hal::ActuatorRegistry;
use substate_runtime::config::RuntimeConfig;
use substate_runtime::cycle::Scheduler;
use substate_runtime::subsystems::build_subsystems;
use substate_runtime::telemetry::{MemoryTelemetry, TelemetrySink, TracingTelemetry};

/// substate: run robot subsystems on named states
#[derive(Parser, Debug)]
#[command(name = "substate")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Fixed-period runner for robot subsystems driven by named states")]
struct Args {
    /// Path to the runtime configuration TOML.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Stop after N cycles (overrides `max_cycles` from the config).
    #[arg(long, value_name = "N")]
    cycles: Option<u64>,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,

    /// Print the final telemetry snapshot as JSON on exit.
    #[arg(long)]
    dump: bool,
}

fn main() {
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => RuntimeConfig::load_validated(path),
        None => Ok(RuntimeConfig::default()),
    };
    setup_tracing(&args, config.as_ref().ok().map(|c| c.shared.log_level));

    info!("substate v{} starting...", env!("CARGO_PKG_VERSION"));

    let result = config
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error>)
        .and_then(|config| run(&args, config));
    if let Err(e) = result {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("substate shutdown complete");
}

fn run(args: &Args, config: RuntimeConfig) -> Result<(), Box<dyn std::error::Error>> {
    match &args.config {
        Some(path) => info!("Loaded config from {:?}", path),
        None => info!("No config given, using defaults"),
    }
    info!(
        "Robot '{}': period {} us, subsystems {:?}",
        config.shared.service_name,
        config.cycle_time_us,
        config.enabled_subsystems()
    );

    let memory = MemoryTelemetry::new();
    let telemetry: Arc<dyn TelemetrySink> = if args.dump {
        Arc::new(memory.clone())
    } else {
        Arc::new(TracingTelemetry)
    };

    let registry = ActuatorRegistry::with_builtin();
    info!("Actuator drivers: {:?}", registry.list_drivers());
    let subsystems = build_subsystems(&config, &registry, telemetry)?;

    let mut scheduler = Scheduler::new(config.cycle_time())
        .with_subsystems(subsystems)
        .with_script(config.script.clone());

    let running = scheduler.running_flag();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        running.store(false, Ordering::SeqCst);
    })?;

    scheduler.run(args.cycles.or(config.max_cycles));
    scheduler.stop_all();

    if args.dump {
        println!("{}", memory.to_json()?);
    }
    Ok(())
}

fn setup_tracing(args: &Args, configured: Option<LogLevel>) {
    let directive: Directive = match (args.verbose, configured) {
        (true, _) => Level::DEBUG.into(),
        (false, Some(level)) => level
            .as_directive()
            .parse()
            .unwrap_or_else(|_| Level::INFO.into()),
        (false, None) => Level::INFO.into(),
    };

    let filter = EnvFilter::from_default_env().add_directive(directive);

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
