mod config;
mod error;
mod models;
mod pipeline;
mod scraper;
mod storage;
mod utils;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::AppConfig;
use crate::models::DATE_FORMAT;
use crate::pipeline::Pipeline;
use crate::scraper::browser::ChromiumSurface;
use crate::storage::sheet::fit;
use crate::storage::{ResultStore, COLUMNS};

#[derive(Parser)]
#[command(name = "listing-crawler", about = "Recent-listing crawler for paginated feeds", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Crawl the feed and merge recent listings into the output file
    Crawl {
        /// Start page (overrides crawl.start_url)
        #[arg(short, long)]
        url: Option<String>,

        /// Output file (overrides storage.output_path)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the stored listings
    Show {
        /// Only the last N rows
        #[arg(short = 'n', long)]
        last: Option<usize>,
    },

    /// Show output file statistics
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "listing_crawler=info,warn",
        1 => "listing_crawler=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::new(filter))
        .init();

    let mut config = AppConfig::load()?;
    let store: ResultStore = ResultStore::default();

    match cli.command {
        Command::Crawl { url, output } => {
            if let Some(url) = url {
                config.crawl.start_url = url;
            }
            if let Some(output) = output {
                config.storage.output_path = output;
            }

            let _t = utils::Timer::start("Crawl");
            let surface = ChromiumSurface::launch(&config.browser)
                .await
                .context("Failed to launch browser")?;

            let today = Local::now().date_naive();
            let result = Pipeline::new(config).run(&surface, &store, today).await;
            surface.shutdown().await;

            let report = result.context("Crawl aborted")?;
            info!(
                "Done: {} pages | {} items | {} accepted | {} stored ({} new) | {}",
                report.pages_visited,
                report.items_seen,
                report.accepted,
                report.saved.total,
                report.saved.added,
                report.stop,
            );
        }

        Command::Show { last } => {
            let rows = store.load(&config.storage.output_path);
            let skip = last.map(|n| rows.len().saturating_sub(n)).unwrap_or(0);

            let header: Vec<String> = COLUMNS.iter().map(|c| fit(c.name, c.width)).collect();
            println!("{}", header.join(" │ "));
            println!("{}", "─".repeat(COLUMNS.iter().map(|c| c.width + 3).sum::<usize>()));
            for row in rows.iter().skip(skip) {
                let cells = [row.date.to_string(), row.location.clone(), row.url.clone()];
                let line: Vec<String> = cells
                    .iter()
                    .zip(COLUMNS.iter())
                    .map(|(cell, col)| fit(cell, col.width))
                    .collect();
                println!("{}", line.join(" │ "));
            }
        }

        Command::Stats => {
            let path = &config.storage.output_path;
            let rows = store.load(path);
            let dates: Vec<_> = rows.iter().filter_map(|r| r.date.calendar()).collect();
            let min = dates.iter().min();
            let max = dates.iter().max();

            println!("─────────────────────────────────");
            println!("  Listing crawler — {}", path.display());
            println!("─────────────────────────────────");
            println!("  Listings : {}", rows.len());
            println!("  Dated    : {}", dates.len());
            println!("  From     : {}", min.map(|d| d.format(DATE_FORMAT).to_string()).unwrap_or("—".into()));
            println!("  To       : {}", max.map(|d| d.format(DATE_FORMAT).to_string()).unwrap_or("—".into()));
            println!("─────────────────────────────────");
        }
    }

    Ok(())
}
