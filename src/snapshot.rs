use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use scraper::{Html, Selector};
use tracing::{debug, warn};

use crate::dom::{Browser, Element};

const EXPANDED_SUFFIX: &str = ".expanded";

/// `Browser` over saved HTML pages.
///
/// Pages are keyed by URL path. A page may carry an expanded variant: clicking
/// an element with a `data-count` attribute (the items-per-page control) swaps
/// the current page to it, which is how a real listing drops its pagination
/// after "show all" is clicked.
pub struct StaticBrowser {
    pages: HashMap<String, PageSet>,
    current_url: String,
    current_key: Option<String>,
    dom: Option<Html>,
}

struct PageSet {
    initial: String,
    expanded: Option<String>,
}

impl StaticBrowser {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            current_url: String::new(),
            current_key: None,
            dom: None,
        }
    }

    /// Load every `*.html` file in `dir`. A file named `<key>.expanded.html`
    /// becomes the expanded variant of `<key>.html`.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let mut browser = Self::new();
        let entries =
            fs::read_dir(dir).with_context(|| format!("reading page dir {}", dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("html") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let html = fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            match stem.strip_suffix(EXPANDED_SUFFIX) {
                Some(key) => browser.entry(key).expanded = Some(html),
                None => browser.entry(stem).initial = html,
            }
        }
        for (key, set) in &browser.pages {
            if set.initial.is_empty() && set.expanded.is_some() {
                warn!("orphan expanded variant for {key}: no {key}.html in {}", dir.display());
            }
        }
        Ok(browser)
    }

    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.entry(&page_key(url)).initial = html.to_string();
        self
    }

    pub fn with_expanded(mut self, url: &str, html: &str) -> Self {
        self.entry(&page_key(url)).expanded = Some(html.to_string());
        self
    }

    fn entry(&mut self, key: &str) -> &mut PageSet {
        self.pages.entry(key.to_string()).or_insert_with(|| PageSet {
            initial: String::new(),
            expanded: None,
        })
    }
}

impl Default for StaticBrowser {
    fn default() -> Self {
        Self::new()
    }
}

impl Browser for StaticBrowser {
    type Elem = StaticElement;

    fn navigate(&mut self, url: &str) -> Result<()> {
        let key = page_key(url);
        match self.pages.get(&key) {
            Some(page) => {
                self.current_url = url.to_string();
                self.dom = Some(Html::parse_document(&page.initial));
                self.current_key = Some(key);
            }
            None => {
                // Page never loads; the current URL stays put and the URL
                // wait reports the failure.
                warn!("no snapshot for {url}");
            }
        }
        Ok(())
    }

    fn current_url(&self) -> String {
        self.current_url.clone()
    }

    fn query(&self, css: &str) -> Vec<StaticElement> {
        let Some(dom) = &self.dom else {
            return Vec::new();
        };
        let Ok(selector) = Selector::parse(css) else {
            warn!("invalid selector: {css}");
            return Vec::new();
        };
        dom.select(&selector).map(StaticElement::capture).collect()
    }

    fn click(&mut self, element: &StaticElement) -> Result<()> {
        if element.attr("data-count").is_none() {
            return Ok(());
        }
        let Some(key) = &self.current_key else {
            return Ok(());
        };
        if let Some(expanded) = self.pages.get(key).and_then(|p| p.expanded.as_deref()) {
            debug!("loading expanded variant of {key}");
            self.dom = Some(Html::parse_document(expanded));
        } else {
            debug!("no expanded variant of {key}; click has no effect");
        }
        Ok(())
    }
}

/// Owned capture of one element: attributes and text are snapshotted, the
/// subtree is re-parsed on scoped queries.
pub struct StaticElement {
    html: String,
    text: String,
    attrs: HashMap<String, String>,
}

impl StaticElement {
    fn capture(el: scraper::ElementRef<'_>) -> Self {
        let attrs = el
            .value()
            .attrs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            html: el.html(),
            text: el.text().collect::<Vec<_>>().join(" "),
            attrs,
        }
    }
}

impl Element for StaticElement {
    fn query(&self, css: &str) -> Vec<StaticElement> {
        let Ok(selector) = Selector::parse(css) else {
            warn!("invalid selector: {css}");
            return Vec::new();
        };
        let fragment = Html::parse_fragment(&self.html);
        fragment
            .select(&selector)
            .map(StaticElement::capture)
            .collect()
    }

    fn attr(&self, name: &str) -> Option<String> {
        self.attrs.get(name).cloned()
    }

    fn text(&self) -> String {
        self.text.clone()
    }

    fn is_interactable(&self) -> bool {
        true
    }
}

/// Map a URL to its page key: the path with slashes collapsed to underscores.
/// `https://velo1000.ru/catalog/road/` and `/catalog/road/` both map to
/// `catalog_road`.
pub fn page_key(url: &str) -> String {
    let path = match url.split_once("://") {
        Some((_, rest)) => rest.find('/').map(|i| &rest[i..]).unwrap_or("/"),
        None => url,
    };
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        "index".to_string()
    } else {
        trimmed.replace('/', "_")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_key_strips_host_and_slashes() {
        assert_eq!(page_key("https://velo1000.ru/catalog/"), "catalog");
        assert_eq!(page_key("/catalog/road/"), "catalog_road");
        assert_eq!(page_key("https://velo1000.ru/"), "index");
        assert_eq!(page_key("https://velo1000.ru"), "index");
    }

    #[test]
    fn navigate_and_query() {
        let mut b = StaticBrowser::new()
            .with_page("/catalog/", r#"<a class="catalog__block" href="/catalog/road/">x</a>"#);
        b.navigate("/catalog/").unwrap();
        assert_eq!(b.current_url(), "/catalog/");
        let els = b.query(".catalog__block");
        assert_eq!(els.len(), 1);
        assert_eq!(els[0].attr("href").as_deref(), Some("/catalog/road/"));
    }

    #[test]
    fn navigate_to_missing_page_keeps_url() {
        let mut b = StaticBrowser::new().with_page("/catalog/", "<p>root</p>");
        b.navigate("/catalog/").unwrap();
        b.navigate("/catalog/nowhere/").unwrap();
        assert_eq!(b.current_url(), "/catalog/");
    }

    #[test]
    fn click_on_count_control_loads_expanded_variant() {
        let mut b = StaticBrowser::new()
            .with_page(
                "/catalog/road/",
                r#"<div class="pagination"></div><span class="top__items-count" data-count="999">999</span>"#,
            )
            .with_expanded("/catalog/road/", r#"<div class="items">all</div>"#);
        b.navigate("/catalog/road/").unwrap();
        assert_eq!(b.query(".pagination").len(), 1);

        let control = b.query(".top__items-count").pop().unwrap();
        b.click(&control).unwrap();
        assert!(b.query(".pagination").is_empty());
        assert_eq!(b.query(".items").len(), 1);
    }

    #[test]
    fn click_without_expanded_variant_is_a_no_op() {
        let mut b = StaticBrowser::new().with_page(
            "/catalog/road/",
            r#"<div class="pagination"></div><span data-count="999">999</span>"#,
        );
        b.navigate("/catalog/road/").unwrap();
        let control = b.query("[data-count]").pop().unwrap();
        b.click(&control).unwrap();
        assert_eq!(b.query(".pagination").len(), 1);
    }

    #[test]
    fn scoped_element_query() {
        let mut b = StaticBrowser::new().with_page(
            "/p/",
            r#"<div class="product__block"><span class="product__label">Bike</span></div>
               <span class="product__label">Outside</span>"#,
        );
        b.navigate("/p/").unwrap();
        let block = b.query(".product__block").pop().unwrap();
        let labels = block.query(".product__label");
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].text().trim(), "Bike");
    }

    #[test]
    fn from_dir_keeps_orphan_expanded_variant_as_empty_page() {
        let dir = std::env::temp_dir().join(format!("velo_snap_orphan_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("catalog_mtb.expanded.html"), "<p>all pages</p>").unwrap();

        let mut b = StaticBrowser::from_dir(&dir).unwrap();
        let set = b.pages.get("catalog_mtb").unwrap();
        assert!(set.initial.is_empty());
        assert!(set.expanded.is_some());
        b.navigate("/catalog/mtb/").unwrap();
        assert!(b.query("p").is_empty());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn from_dir_picks_up_expanded_variants() {
        let dir = std::env::temp_dir().join(format!("velo_snap_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("catalog_road.html"), "<p>one page</p>").unwrap();
        fs::write(dir.join("catalog_road.expanded.html"), "<p>all pages</p>").unwrap();

        let mut b = StaticBrowser::from_dir(&dir).unwrap();
        b.navigate("/catalog/road/").unwrap();
        assert_eq!(b.query("p").len(), 1);
        let set = b.pages.get("catalog_road").unwrap();
        assert!(set.expanded.is_some());

        fs::remove_dir_all(&dir).unwrap();
    }
}
