use std::time::Duration;

pub const ROOT_URL: &str = "https://velo1000.ru/catalog/";

/// CSS selectors for the catalog's structural contract.
#[derive(Debug, Clone)]
pub struct Selectors {
    /// Category block on the catalog root; carries the link attribute.
    pub category_block: String,
    /// Label inside a category block.
    pub category_label: String,
    /// Indicator that a listing is paginated.
    pub pagination: String,
    /// Items-per-page control set to its maximum value.
    pub show_all_control: String,
    pub product_block: String,
    pub product_label: String,
    pub product_price: String,
    /// Class marking a struck-through (superseded) price variant.
    pub struck_price_class: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            category_block: ".catalog__block".into(),
            category_label: ".catalog__label".into(),
            pagination: ".pagination".into(),
            show_all_control: ".top__items-count[data-count='999']".into(),
            product_block: ".product__block".into(),
            product_label: ".product__label".into(),
            product_price: ".product__price".into(),
            struck_price_class: "product__price--old".into(),
        }
    }
}

/// All wait bounds, one field per call site.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    pub poll: Duration,
    pub discovery: Duration,
    pub navigation: Duration,
    pub pagination_probe: Duration,
    pub control_click: Duration,
    pub expansion: Duration,
    pub product_list: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            poll: Duration::from_millis(500),
            discovery: Duration::from_secs(3),
            navigation: Duration::from_secs(10),
            pagination_probe: Duration::from_secs(3),
            control_click: Duration::from_secs(3),
            expansion: Duration::from_secs(15),
            product_list: Duration::from_secs(60),
        }
    }
}

impl Timeouts {
    /// Zero bounds: every wait probes exactly once. Snapshot pages are fully
    /// rendered up front, so nothing is gained by polling.
    pub fn immediate() -> Self {
        Self {
            poll: Duration::ZERO,
            discovery: Duration::ZERO,
            navigation: Duration::ZERO,
            pagination_probe: Duration::ZERO,
            control_click: Duration::ZERO,
            expansion: Duration::ZERO,
            product_list: Duration::ZERO,
        }
    }
}

/// What to do when category navigation is never confirmed by the URL wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavPolicy {
    /// Proceed against whatever page state is current (the listing may be
    /// stale or partial).
    #[default]
    ContinueDegraded,
    /// Fail the category instead of extracting from an unconfirmed page.
    AbortCategory,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub selectors: Selectors,
    pub timeouts: Timeouts,
    pub nav_policy: NavPolicy,
}
