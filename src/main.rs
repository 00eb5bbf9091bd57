//! Dementor main entry point
//!
//! This is the command-line interface for the Dementor link extractor.

use clap::Parser;
use dementor::banner::{print_banner, prompt_for_url};
use dementor::batch::{run_batch, BatchStore};
use dementor::config::{load_config_with_hash, Config};
use dementor::convert::PythonConverter;
use dementor::escalate::Controller;
use dementor::fetch::{
    DirectFetch, FetchStrategy, LibraryCrawl, RegionTargeted, ScriptedBrowser, StealthBrowser,
    Target,
};
use dementor::sitemap::RunOutcome;
use dementor::{regions, RunReport};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Dementor: an escalating same-site link extractor
///
/// Dementor pulls the set of same-site links out of a target page, stepping
/// through increasingly sophisticated fetch strategies until enough links
/// are found, and writes the result as a sitemap document.
#[derive(Parser, Debug)]
#[command(name = "dementor")]
#[command(version = "1.0.0")]
#[command(about = "Escalating same-site link extractor", long_about = None)]
struct Cli {
    /// Target URL (prompted interactively when omitted)
    #[arg(value_name = "URL")]
    url: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Sitemap output path (overrides the configured path)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Convert the sitemap to Markdown documents after a successful run
    #[arg(long)]
    convert: bool,

    /// Run the region-targeted generator for a region code (repeatable)
    #[arg(long = "region", value_name = "CODE")]
    regions: Vec<String>,

    /// List known region codes and exit
    #[arg(long, conflicts_with = "regions")]
    list_regions: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    if cli.list_regions {
        print!("{}", regions::overview());
        return Ok(());
    }

    // Load and validate configuration
    let mut config = match &cli.config {
        Some(path) => {
            let (config, hash) = load_config_with_hash(path)?;
            tracing::info!("Configuration loaded from {} (hash: {})", path.display(), hash);
            config
        }
        None => Config::default(),
    };

    if let Some(output) = &cli.output {
        config.output.sitemap_path = output.display().to_string();
    }

    if !cli.regions.is_empty() {
        return handle_regions(&config, &cli.regions).await;
    }

    // Presence of the store environment switches to batch mode
    if let Some(store) = BatchStore::from_env() {
        tracing::info!("Store credentials present, running in batch mode");
        let summary = run_batch(&config, &store, cli.convert).await?;
        println!(
            "Batch finished: {} rows, {} succeeded, {} failed",
            summary.rows, summary.succeeded, summary.failed
        );
        return Ok(());
    }

    handle_single(&config, cli.url, cli.convert).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("dementor=info,warn"),
            1 => EnvFilter::new("dementor=debug,info"),
            2 => EnvFilter::new("dementor=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Builds the standard four-level escalation ladder
fn default_ladder(config: &Config) -> Vec<Box<dyn FetchStrategy>> {
    vec![
        Box::new(LibraryCrawl::new(config.crawl.clone(), config.fetch.clone())),
        Box::new(DirectFetch::new(config.fetch.clone())),
        Box::new(ScriptedBrowser::new(config.fetch.clone())),
        Box::new(StealthBrowser::new(config.fetch.clone())),
    ]
}

/// Handles a single-target run (interactive or URL argument)
async fn handle_single(
    config: &Config,
    url: Option<String>,
    convert: bool,
) -> anyhow::Result<()> {
    let raw_url = match url {
        Some(url) => url,
        None => {
            print_banner();
            prompt_for_url()?
        }
    };

    let target = Target::from_user_input(&raw_url)?;
    println!("Ziel-URL: {}\n", target);

    let mut controller = Controller::new(config, default_ladder(config));
    if convert {
        controller =
            controller.with_converter(Box::new(PythonConverter::new(config.convert.clone())));
    }

    let report = controller.run(&target).await?;
    print_report(&report);

    Ok(())
}

/// Handles the region-targeted generator for explicit region codes
async fn handle_regions(config: &Config, codes: &[String]) -> anyhow::Result<()> {
    let mut results: Vec<(&'static regions::Region, RunOutcome)> = Vec::new();

    for code in codes {
        let region = regions::by_code(code)
            .ok_or_else(|| anyhow::anyhow!("unknown region code: {}", code))?;

        tracing::info!("Region run: {} ({})", region.name, region.code);

        let sitemap_path = region_sitemap_path(config, region);
        let ladder: Vec<Box<dyn FetchStrategy>> = vec![Box::new(RegionTargeted::new(
            region,
            config.fetch.clone(),
        ))];

        let mut controller =
            Controller::new(config, ladder).with_sitemap_path(sitemap_path.clone());

        // Region runs target the fixed services URL
        let target = Target::new(dementor::fetch::DEFAULT_SERVICES_URL)?;

        match controller.run(&target).await {
            Ok(report) => results.push((region, report.outcome)),
            Err(e) => {
                tracing::error!("Region {} failed: {}", region.code, e);
                results.push((region, RunOutcome::InsufficientAcrossAllLevels(0)));
            }
        }
    }

    print_region_summary(&results);
    Ok(())
}

/// Per-region sitemap path next to the configured single-run output
fn region_sitemap_path(config: &Config, region: &regions::Region) -> PathBuf {
    let parent = Path::new(&config.output.sitemap_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    parent.join(format!("{}-sitemap.xml", region.code.to_lowercase()))
}

/// Prints the terminal outcome of a single run
fn print_report(report: &RunReport) {
    println!();
    match report.outcome {
        RunOutcome::Success(count) => {
            println!(
                "Success: {} links after {} level(s)",
                count, report.levels_attempted
            );
            println!("Sitemap: {}", report.sitemap_path.display());
            match report.conversion {
                Some(true) => println!("Conversion: completed"),
                Some(false) => println!("Conversion: FAILED (sitemap remains valid)"),
                None => {}
            }
        }
        RunOutcome::InsufficientAcrossAllLevels(count) => {
            println!(
                "Insufficient: only {} link(s) after exhausting all {} level(s).",
                count, report.levels_attempted
            );
            println!("The target likely has strong anti-automation defenses.");
            println!("Sitemap: {}", report.sitemap_path.display());
        }
        RunOutcome::Degenerate => {
            println!("Degenerate: a single-link sitemap is not a usable dataset.");
            println!("Quarantined at: {}", report.sitemap_path.display());
        }
    }
}

/// Prints the per-region summary table
fn print_region_summary(results: &[(&'static regions::Region, RunOutcome)]) {
    println!("\nRegion                      | Code | Links | Status");
    println!("----------------------------|------|-------|-------");

    let mut succeeded = 0;
    for (region, outcome) in results {
        let (links, status) = match outcome {
            RunOutcome::Success(count) => {
                succeeded += 1;
                (*count, "ok")
            }
            RunOutcome::InsufficientAcrossAllLevels(count) => (*count, "insufficient"),
            RunOutcome::Degenerate => (1, "degenerate"),
        };
        println!(
            "{:<27} | {:<4} | {:>5} | {}",
            region.name, region.code, links, status
        );
    }

    println!(
        "\n{} of {} regions succeeded",
        succeeded,
        results.len()
    );
}
