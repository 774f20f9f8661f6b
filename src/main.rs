//! IOC Enrichr - Bounded fan-out IOC enrichment with distributed tracing
//!
//! Reads a list of indicators, enriches them through the example module and
//! writes the results to stdout.

use clap::Parser;
use ioc_enrichr::config::Config;
use ioc_enrichr::logging::AppLogger;
use ioc_enrichr::modules::ExampleModule;
use ioc_enrichr::tracing::{init_subscriber, OtelBackend, TracerLogger};
use ioc_enrichr::triage::{IocType, TriageModule, TriageRequest};
use opentelemetry::Context;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// IOC Enrichr - enrich threat indicators with bounded concurrent lookups
#[derive(Parser, Debug)]
#[command(name = "ioc-enrichr")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// File with one indicator per line ("-" for stdin)
    #[arg(short, long, default_value = "-")]
    input: PathBuf,

    /// Indicator type (domain, ip, email, cve, md5, sha256, ...)
    #[arg(short = 't', long, default_value = "domain")]
    ioc_type: String,

    /// Whether to output full dumps of the fetched data
    #[arg(long)]
    verbose: bool,
}

fn read_indicators(input: &PathBuf) -> anyhow::Result<Vec<String>> {
    let content = if input.as_os_str() == "-" {
        std::io::read_to_string(std::io::stdin())?
    } else {
        std::fs::read_to_string(input)?
    };

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::load(&args.config)?;

    // Install the layered subscriber and the tracer provider
    let guard = init_subscriber(&config.tracing_config())?;

    info!("Starting IOC Enrichr v{}", env!("CARGO_PKG_VERSION"));

    let logger = AppLogger::new(config.logging.tags.clone(), config.logging.labels.clone());
    let backend = Arc::new(OtelBackend::new(guard.provider().clone()));
    let tracer = Arc::new(TracerLogger::new(backend, logger));

    // Ctrl-C stops new admissions; in-flight lookups finish
    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping new lookups");
            ctrl_c_cancel.cancel();
        }
    });

    let iocs = read_indicators(&args.input)?;
    let ioc_type: IocType = args.ioc_type.parse()?;
    let request = TriageRequest {
        iocs,
        ioc_type,
        verbose: args.verbose,
    };

    info!(
        indicators = request.iocs.len(),
        ioc_type = %request.ioc_type,
        "Running triage"
    );

    let module = ExampleModule::new(&config.enrich, Arc::clone(&tracer))?;
    let results = module.triage(&Context::new(), &cancel, &request).await?;

    for data in &results {
        println!("# {}", data.title);
        for line in &data.metadata {
            println!("## {}", line);
        }
        println!("{}", data.data);
    }

    // Flush spans before exit, on a fresh token so an interrupt above does
    // not skip the flush
    if let Err(e) = tracer.close(&CancellationToken::new()).await {
        warn!(error = %e, "Tracer shutdown incomplete");
    }

    Ok(())
}
