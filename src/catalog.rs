use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::dom::{self, Browser, Element, Wait};

/// One catalog category. Keyed by URL (unique), name carried alongside, so
/// two categories sharing a display name both survive discovery.
#[derive(Debug, Clone)]
pub struct Category {
    pub name: String,
    pub url: String,
}

/// Read the category set from the loaded catalog root page, in DOM order.
///
/// A discovery timeout is not fatal: the run proceeds with an empty set.
/// Blocks missing the link or the label are skipped.
pub fn discover<B: Browser>(browser: &B, config: &Config) -> Vec<Category> {
    let wait = Wait::new(config.timeouts.discovery, config.timeouts.poll);
    let blocks = match dom::wait_all(browser, &config.selectors.category_block, wait) {
        Ok(blocks) => blocks,
        Err(e) => {
            warn!("category discovery: {e}");
            return Vec::new();
        }
    };
    info!("found {} category blocks", blocks.len());

    let mut seen = HashSet::new();
    let mut categories = Vec::new();
    for block in &blocks {
        let Some(url) = block.attr("href").filter(|u| !u.is_empty()) else {
            debug!("category block without link, skipping");
            continue;
        };
        let name = block
            .query(&config.selectors.category_label)
            .first()
            .map(|label| label.text().trim().to_string())
            .unwrap_or_default();
        if name.is_empty() {
            debug!("category block without label ({url}), skipping");
            continue;
        }
        if !seen.insert(url.clone()) {
            debug!("duplicate category url {url}, skipping");
            continue;
        }
        categories.push(Category { name, url });
    }
    info!("{} categories have links", categories.len());
    categories
}
