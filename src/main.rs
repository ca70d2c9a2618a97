mod catalog;
mod config;
mod db;
mod dom;
mod pagination;
mod pipeline;
mod products;
mod snapshot;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};

use crate::config::{Config, NavPolicy, Timeouts};
use crate::pipeline::CategoryOutcome;
use crate::snapshot::StaticBrowser;

#[derive(Parser)]
#[command(name = "velo_scraper", about = "Bike catalog scraper (snapshot-driven)")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl a directory of saved catalog pages and persist the products
    Run {
        /// Directory of saved pages; URL /catalog/road/ maps to
        /// catalog_road.html, expanded variant catalog_road.expanded.html
        #[arg(long)]
        pages: PathBuf,
        /// Catalog root URL
        #[arg(long, default_value = config::ROOT_URL)]
        url: String,
        #[arg(long, default_value = db::DEFAULT_DB_PATH)]
        db: String,
        /// Fail a category when its navigation is never confirmed, instead
        /// of extracting from the current page state
        #[arg(long)]
        strict_navigation: bool,
    },
    /// Show persisted catalog statistics
    Stats {
        #[arg(long, default_value = db::DEFAULT_DB_PATH)]
        db: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            pages,
            url,
            db: db_path,
            strict_navigation,
        } => {
            println!(
                "({}) Run started against {}",
                chrono::Local::now().format("%H:%M:%S"),
                url
            );
            let conn = db::connect(&db_path)?;
            db::init_schema(&conn)?;
            let mut browser = StaticBrowser::from_dir(&pages)?;
            let config = Config {
                // Snapshot pages are fully rendered, so every wait resolves
                // on its first probe.
                timeouts: Timeouts::immediate(),
                nav_policy: if strict_navigation {
                    NavPolicy::AbortCategory
                } else {
                    NavPolicy::ContinueDegraded
                },
                ..Config::default()
            };

            let reports = pipeline::run(&mut browser, &conn, &config, &url)?;
            if reports.is_empty() {
                println!("No categories discovered; nothing to do.");
                return Ok(());
            }

            println!("{:<28} | {:>6} | {}", "Category", "Saved", "Outcome");
            println!("{}", "-".repeat(60));
            let mut saved_total = 0usize;
            let mut failed = 0usize;
            for report in &reports {
                match &report.outcome {
                    CategoryOutcome::Done { saved, pagination } => {
                        saved_total += saved;
                        println!(
                            "{:<28} | {:>6} | {:?}",
                            truncate(&report.name, 28),
                            saved,
                            pagination
                        );
                    }
                    CategoryOutcome::Failed(reason) => {
                        failed += 1;
                        println!(
                            "{:<28} | {:>6} | failed: {}",
                            truncate(&report.name, 28),
                            "-",
                            reason
                        );
                    }
                }
            }
            println!(
                "\n{} categories ({} failed), {} products saved in {:.1}s",
                reports.len(),
                failed,
                saved_total,
                t0.elapsed().as_secs_f64()
            );
        }
        Commands::Stats { db: db_path } => {
            let conn = db::connect(&db_path)?;
            db::init_schema(&conn)?;
            let stats = db::get_stats(&conn)?;
            println!("Total products: {}", stats.total);
            if let Some(at) = &stats.last_parsed_at {
                println!("Last parsed:    {}", at);
            }
            for (category, count) in &stats.categories {
                println!("  {:<28} {}", truncate(category, 28), count);
            }
        }
    }

    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}
