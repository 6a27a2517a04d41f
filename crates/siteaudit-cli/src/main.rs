mod args;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use args::Args;
use siteaudit_cli::{
    JsonLinesSink, parse_domain_list, render_batch_summary, render_report, targets_from_domains,
};
use siteaudit_core::{AuditSink, MemorySink, ScanResult, Scanner, ScannerConfig, run_batch};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing based on verbosity; RUST_LOG wins when set
    let filter = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&args)?;
    let domains = collect_domains(&args)?;
    let targets = targets_from_domains(&domains);
    if targets.is_empty() {
        bail!("no domains to scan");
    }
    info!(
        targets = targets.len(),
        timeout_ms = config.timeout_ms,
        "starting audit"
    );

    let sink: Box<dyn AuditSink> = match &args.records {
        Some(path) => Box::new(
            JsonLinesSink::create(path)
                .with_context(|| format!("failed to create records file {}", path.display()))?,
        ),
        None => Box::new(MemorySink::new()),
    };

    let scanner = Scanner::new(config).context("failed to initialize scanner")?;

    let mut results: Vec<ScanResult> = Vec::new();
    let summary = run_batch(&scanner, &*sink, &targets, |_, result| {
        if args.json {
            results.push(result.clone());
        } else {
            print!("{}", render_report(result));
        }
    })
    .await;

    if args.json {
        let json = serde_json::to_string_pretty(&results).context("failed to serialize results")?;
        println!("{json}");
        eprint!("{}", render_batch_summary(&summary));
    } else {
        print!("{}", render_batch_summary(&summary));
    }

    if let Some(path) = &args.records {
        debug!(path = %path.display(), "records written");
    }
    Ok(())
}

/// Config file first, then flag overrides
fn load_config(args: &Args) -> Result<ScannerConfig> {
    let mut config = match &args.config {
        Some(path) => ScannerConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ScannerConfig::default(),
    };

    if let Some(timeout_ms) = args.timeout_ms {
        config.timeout_ms = timeout_ms;
    }
    Ok(config)
}

/// Positional domains followed by the `--file` list
fn collect_domains(args: &Args) -> Result<Vec<String>> {
    let mut domains: Vec<String> = args
        .domains
        .iter()
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .collect();

    if let Some(path) = &args.file {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read domain list {}", path.display()))?;
        domains.extend(parse_domain_list(&content));
    }
    Ok(domains)
}
