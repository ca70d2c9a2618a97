use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rusqlite::Connection;
use tracing::{info, warn};

use crate::catalog::{self, Category};
use crate::config::{Config, NavPolicy};
use crate::db;
use crate::dom::{self, Browser, Wait};
use crate::pagination::{self, Pagination};
use crate::products;

/// How one category ended up.
#[derive(Debug)]
pub enum CategoryOutcome {
    Done {
        saved: usize,
        pagination: Pagination,
    },
    Failed(String),
}

#[derive(Debug)]
pub struct CategoryReport {
    pub name: String,
    pub url: String,
    pub outcome: CategoryOutcome,
}

/// Drive the full run: discovery, then one pass per category.
///
/// Category failures are isolated: the category's transaction is dropped
/// (rolled back) and the loop continues. Only a session-level failure from
/// the browser or the store propagates out of here; categories committed
/// before it stay persisted.
pub fn run<B: Browser>(
    browser: &mut B,
    conn: &Connection,
    config: &Config,
    root_url: &str,
) -> Result<Vec<CategoryReport>> {
    browser
        .navigate(root_url)
        .with_context(|| format!("opening catalog root {root_url}"))?;
    let categories = catalog::discover(browser, config);
    info!("categories loaded from {root_url}: {}", categories.len());

    let pb = ProgressBar::new(categories.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );

    let mut reports = Vec::with_capacity(categories.len());
    for category in &categories {
        pb.set_message(category.name.clone());
        info!("opening category {}...", category.name);
        // A navigate error is session-level (browser gone) and aborts the
        // run; rows committed for earlier categories stay persisted.
        browser
            .navigate(&category.url)
            .with_context(|| format!("opening category {}", category.url))?;
        let outcome = match process_category(browser, conn, config, category) {
            Ok((saved, pagination)) => CategoryOutcome::Done { saved, pagination },
            Err(e) => {
                warn!(
                    "error processing category '{}' ({}): {e:#}",
                    category.name, category.url
                );
                CategoryOutcome::Failed(format!("{e:#}"))
            }
        };
        reports.push(CategoryReport {
            name: category.name.clone(),
            url: category.url.clone(),
            outcome,
        });
        pb.inc(1);
    }
    pb.finish_and_clear();
    Ok(reports)
}

/// One category, one attempt: confirm navigation, normalize pagination,
/// extract, persist in a single transaction. The caller has already issued
/// the navigate; errors out of here are category-scoped.
fn process_category<B: Browser>(
    browser: &mut B,
    conn: &Connection,
    config: &Config,
    category: &Category,
) -> Result<(usize, Pagination)> {
    let nav = Wait::new(config.timeouts.navigation, config.timeouts.poll);
    if let Err(e) = dom::wait_url(browser, &category.url, nav) {
        match config.nav_policy {
            NavPolicy::AbortCategory => bail!("navigation not confirmed: {e}"),
            NavPolicy::ContinueDegraded => {
                warn!(
                    "navigation to {} not confirmed, continuing on current page state: {e}",
                    category.url
                );
            }
        }
    }

    let pagination = pagination::normalize(browser, config);
    let records = products::extract(browser, config);

    // Any error from here until commit drops the transaction, rolling the
    // category back.
    let tx = conn.unchecked_transaction()?;
    let saved = db::save_products(&tx, &category.name, &records)?;
    tx.commit()?;
    info!("category '{}': saved {} products", category.name, saved);
    Ok((saved, pagination))
}
