use tracing::{debug, info, warn};

use crate::config::Config;
use crate::dom::{self, Browser, Wait};

/// Terminal outcome of the one-pass pagination check on a category listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pagination {
    /// No pagination indicator appeared within the bound.
    Absent,
    /// The show-all control was clicked and the indicator disappeared.
    Expanded,
    /// Control missing/unclickable or the indicator never went away; the
    /// currently rendered subset of items is used as-is.
    ExpansionFailed,
}

/// Detect pagination and expand the listing to show all items.
///
/// Runs exactly once per category; no outcome is retried.
pub fn normalize<B: Browser>(browser: &mut B, config: &Config) -> Pagination {
    let selectors = &config.selectors;
    let timeouts = &config.timeouts;

    let probe = Wait::new(timeouts.pagination_probe, timeouts.poll);
    if dom::wait_present(browser, &selectors.pagination, probe).is_err() {
        debug!("pagination not detected");
        return Pagination::Absent;
    }
    info!("pagination detected, expanding");

    let clickable = Wait::new(timeouts.control_click, timeouts.poll);
    let control = match dom::wait_clickable(browser, &selectors.show_all_control, clickable) {
        Ok(control) => control,
        Err(e) => {
            warn!("show-all control not available: {e}");
            return Pagination::ExpansionFailed;
        }
    };
    if let Err(e) = browser.click(&control) {
        warn!("clicking show-all control failed: {e}");
        return Pagination::ExpansionFailed;
    }

    let expansion = Wait::new(timeouts.expansion, timeouts.poll);
    match dom::wait_absent(browser, &selectors.pagination, expansion) {
        Ok(()) => {
            info!("category expanded");
            Pagination::Expanded
        }
        Err(e) => {
            warn!("category still paginated after expand: {e}");
            Pagination::ExpansionFailed
        }
    }
}
