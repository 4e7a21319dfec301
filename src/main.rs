//! contention-bench - compare counter accumulation strategies
//!
//! Runs the same parallel increment workload against a global lock,
//! sharded locks and a channel funnel, then prints a comparison.

use anyhow::Result;
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

use contention_bench::benchmark::{format_count, Orchestrator};
use contention_bench::config::{BenchmarkConfig, CliArgs, OutputFormat};
use contention_bench::metrics::MetricsReporter;
use contention_bench::workload::NamedWorkload;

fn setup_logging(verbose: bool, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else if verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

fn print_banner(config: &BenchmarkConfig) {
    if config.quiet || config.output_format != OutputFormat::Text {
        return;
    }

    let workload = &config.workload;
    println!("contention-bench v{}", env!("CARGO_PKG_VERSION"));
    println!("====================================");
    println!("Workload: {}", config.workload_name);
    println!(
        "Workers: {}, Increments: {} ({} per worker), Remainder: {:?}",
        workload.workers,
        format_count(workload.expected_total()),
        format_count(workload.increments_per_worker()),
        workload.remainder
    );
    println!(
        "Delay: {}ns, Shards: {}, Channel: {}",
        workload.delay.as_nanos(),
        workload.effective_shards(),
        if workload.channel_capacity == 0 {
            "unbounded".to_string()
        } else {
            format!("bounded({})", workload.channel_capacity)
        }
    );
    println!(
        "Strategies: {}",
        config
            .strategies
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(" -> ")
    );
    println!("====================================");
}

fn run() -> Result<()> {
    // Parse CLI arguments
    let args = CliArgs::parse_args();

    // Setup logging
    setup_logging(args.verbose, args.quiet);

    if NamedWorkload::parse(&args.workload).is_none() {
        println!("Unknown workload: {}", args.workload);
        print!("{}", NamedWorkload::usage());
        return Ok(());
    }

    // Build configuration
    let config = BenchmarkConfig::from_cli(&args)
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

    print_banner(&config);

    let orchestrator = Orchestrator::new(config.clone())?;
    let results = orchestrator.run_all()?;

    let reporter = MetricsReporter::new(config.output_format);
    if config.output_format != OutputFormat::Text || !config.quiet {
        reporter.report(&config.workload, &results)?;
    }

    Ok(())
}

fn main() {
    if let Err(e) = run() {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}
