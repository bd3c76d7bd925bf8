// Document Flow Simulator - Main Entry Point
//
// You can run it via Cargo:
//
// ```console
// $ cargo build --release
// $ ./target/release/docflow-sim --replications 10 --seed 42
// ```
//
// Or with a configuration file and a CSV report:
//
// ```console
// $ ./target/release/docflow-sim --config scenario.json --report runs.csv --output-format csv --verbose
// ```

use anyhow::{Context, Result};
use clap::Parser;
use docflow_sim::catalog::CategoryCatalog;
use docflow_sim::simulation::{write_report, LoggingConfig, ReplicationRunner, ReplicationSet};
use docflow_sim::types::config::CliArgs;
use docflow_sim::types::SimulationConfig;
use std::process;
use tracing::{error, info};

fn main() {
    let args = CliArgs::parse();

    if args.print_config {
        match SimulationConfig::default().print_json() {
            Ok(json) => {
                println!("{}", json);
                return;
            }
            Err(e) => {
                eprintln!("Failed to serialize default configuration: {}", e);
                process::exit(1);
            }
        }
    }

    let mut logging = LoggingConfig::for_cli(args.verbose, args.debug);
    if args.json_logs {
        logging = logging.with_json_format();
    }
    if let Some(dir) = &args.log_dir {
        logging = logging.with_file_logging(dir.clone());
    }
    let _logging_guard = match logging.init() {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            process::exit(1);
        }
    };

    info!("Starting document flow simulator");

    let dry_run = args.dry_run;
    let config = match SimulationConfig::from_cli_args(args) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        process::exit(1);
    }

    info!("Configuration loaded and validated successfully");

    if dry_run {
        eprintln!("Configuration validation successful!");
        eprintln!("Dry run mode - simulation will not be executed.");
        print_configuration_summary(&config);
        return;
    }

    print_startup_banner(&config);

    if let Err(e) = run(config) {
        error!("Simulation failed: {:#}", e);
        process::exit(1);
    }

    info!("Document flow simulator completed successfully");
}

/// Load the catalog, run every replication and export the report
fn run(config: SimulationConfig) -> Result<()> {
    let catalog = CategoryCatalog::from_config(&config).context("loading category tables")?;
    eprintln!("Categories: {}", catalog.len());

    let report_path = config.report_path.clone();
    let format = config.output_format;
    let runner = ReplicationRunner::new(config, catalog);

    eprintln!("Running {} replications...", runner.config().replications);
    let set = runner.run_all().context("running replications")?;

    print_results(&set);

    if let Some(path) = report_path {
        write_report(&set, &path, format)
            .with_context(|| format!("writing {} report to {}", format, path))?;
        eprintln!("Report written to: {}", path);
    }
    Ok(())
}

fn print_startup_banner(config: &SimulationConfig) {
    eprintln!("Document Flow Simulator");
    eprintln!("=======================");
    eprintln!("A discrete-event model of a multi-stage document processing operation");
    eprintln!();

    print_configuration_summary(config);
}

fn print_configuration_summary(config: &SimulationConfig) {
    let staffing = &config.staffing;
    eprintln!("Configuration:");
    eprintln!("  Production Period: {} days", config.production_period_days);
    eprintln!("  Productivity: {:.0}%", config.productivity * 100.0);
    eprintln!(
        "  Arrivals per Batch: {:.0} (std dev {:.0})",
        config.arrival_mean, config.arrival_std_dev
    );
    eprintln!(
        "  Classification Staff: {} trained, {} in training",
        staffing.classification_employees, staffing.classification_trainees
    );
    eprintln!(
        "  Coding Staff: {} trained, {} in training",
        staffing.coding_employees, staffing.coding_trainees
    );
    eprintln!(
        "  Placement Staff: {} trained, {} in training",
        staffing.placement_employees, staffing.placement_trainees
    );
    eprintln!(
        "  Support Staff: {} trained, {} in training",
        staffing.support_employees, staffing.support_trainees
    );
    eprintln!(
        "  Division Rules: classification {}, coding {}, placement {}",
        config.routing.classification_rule, config.routing.coding_rule, config.routing.placement_rule
    );
    if config.routing.combined_stages {
        eprintln!("  Classification and coding combined");
    }
    eprintln!("  Replications: {}", config.replications);
    eprintln!("  Output Format: {}", config.output_format);
    if let Some(seed) = config.seed {
        eprintln!("  Random Seed: {}", seed);
    }
    eprintln!();
}

fn print_results(set: &ReplicationSet) {
    if let Some(last) = set.reports.last() {
        eprintln!("\nLast replication ({}):", last.run_id);
        eprintln!("{}", last.statistics);
    }
    println!("{}", set.summary.to_table());
}
