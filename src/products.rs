use tracing::{debug, info, warn};

use crate::config::{Config, Selectors};
use crate::dom::{self, Browser, Element, Wait};

/// One extracted product. The name is non-empty by construction; containers
/// without one never produce a record. The price may be unknown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRecord {
    pub name: String,
    pub price_minor: Option<i64>,
}

/// Extract all products from the rendered listing.
///
/// Rendering can be slow, so the container wait carries the longest bound in
/// the run. A timeout yields zero records for the category.
pub fn extract<B: Browser>(browser: &B, config: &Config) -> Vec<ProductRecord> {
    let wait = Wait::new(config.timeouts.product_list, config.timeouts.poll);
    let blocks = match dom::wait_all(browser, &config.selectors.product_block, wait) {
        Ok(blocks) => blocks,
        Err(e) => {
            warn!("product list never rendered: {e}");
            return Vec::new();
        }
    };
    info!("loaded {} product blocks", blocks.len());
    blocks
        .iter()
        .filter_map(|block| extract_one(block, &config.selectors))
        .collect()
}

fn extract_one<E: Element>(block: &E, selectors: &Selectors) -> Option<ProductRecord> {
    let name = block
        .query(&selectors.product_label)
        .first()
        .map(|label| label.text().trim().to_string())
        .unwrap_or_default();
    if name.is_empty() {
        debug!("product block without name, skipping");
        return None;
    }
    Some(ProductRecord {
        name,
        price_minor: extract_price(block, selectors),
    })
}

/// A product may show a struck-through original price next to the current
/// one, either as a sibling price element or nested inside it. Prefer the
/// first price element without strike-through styling, minus the text of any
/// struck descendants; fall back to the raw text of the whole price element.
fn extract_price<E: Element>(block: &E, selectors: &Selectors) -> Option<i64> {
    let candidates = block.query(&selectors.product_price);
    let text = match candidates.iter().find(|c| !is_struck(*c, selectors)) {
        Some(current) => text_without_struck(current, selectors),
        None => candidates.first()?.text(),
    };
    price_to_minor(&text)
}

/// The element's text with every struck descendant's text removed, so a
/// nested original price does not merge its digits into the current one.
fn text_without_struck<E: Element>(element: &E, selectors: &Selectors) -> String {
    let struck_selector = format!(
        ".{}, [style*='line-through']",
        selectors.struck_price_class
    );
    let mut text = element.text();
    for struck in element.query(&struck_selector) {
        let struck_text = struck.text();
        if !struck_text.is_empty() {
            text = text.replacen(&struck_text, "", 1);
        }
    }
    text
}

fn is_struck<E: Element>(element: &E, selectors: &Selectors) -> bool {
    let marked = element.attr("class").is_some_and(|classes| {
        classes
            .split_whitespace()
            .any(|c| c == selectors.struck_price_class)
    });
    marked
        || element
            .attr("style")
            .is_some_and(|style| style.contains("line-through"))
}

/// Convert displayed price text to minor currency units.
///
/// The site renders whole units with no decimal fraction ("12 990 ₽"), so the
/// digit string is scaled by 100. No digits or overflow yield `None`, never
/// an error.
pub fn price_to_minor(text: &str) -> Option<i64> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<i64>().ok()?.checked_mul(100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Timeouts;
    use crate::snapshot::StaticBrowser;

    const URL: &str = "/catalog/road/";

    fn test_config() -> Config {
        Config {
            timeouts: Timeouts::immediate(),
            ..Config::default()
        }
    }

    fn extract_from(html: &str) -> Vec<ProductRecord> {
        let mut b = StaticBrowser::new().with_page(URL, html);
        b.navigate(URL).unwrap();
        extract(&b, &test_config())
    }

    #[test]
    fn price_normalization() {
        assert_eq!(price_to_minor("1 234 ₽"), Some(123_400));
        assert_eq!(price_to_minor("500"), Some(50_000));
        assert_eq!(price_to_minor("12 990 ₽"), Some(1_299_000));
        assert_eq!(price_to_minor(""), None);
        assert_eq!(price_to_minor("abc"), None);
    }

    #[test]
    fn price_overflow_is_null() {
        assert_eq!(price_to_minor("99999999999999999999"), None);
    }

    #[test]
    fn nameless_block_produces_no_record() {
        let records = extract_from(
            r#"<div class="product__block"><span class="product__price">5 000 ₽</span></div>
               <div class="product__block">
                 <span class="product__label">Bike A</span>
                 <span class="product__price">10 000 ₽</span>
               </div>"#,
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Bike A");
        assert_eq!(records[0].price_minor, Some(1_000_000));
    }

    #[test]
    fn missing_price_element_yields_null_price() {
        let records =
            extract_from(r#"<div class="product__block"><span class="product__label">Bike B</span></div>"#);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].price_minor, None);
    }

    #[test]
    fn unparseable_price_yields_null_price() {
        let records = extract_from(
            r#"<div class="product__block">
                 <span class="product__label">Bike C</span>
                 <span class="product__price">по запросу</span>
               </div>"#,
        );
        assert_eq!(records[0].price_minor, None);
    }

    #[test]
    fn sale_price_preferred_over_struck_original() {
        let records = extract_from(
            r#"<div class="product__block">
                 <span class="product__label">Bike D</span>
                 <span class="product__price product__price--old">12 000 ₽</span>
                 <span class="product__price">10 000 ₽</span>
               </div>"#,
        );
        assert_eq!(records[0].price_minor, Some(1_000_000));
    }

    #[test]
    fn inline_line_through_counts_as_struck() {
        let records = extract_from(
            r#"<div class="product__block">
                 <span class="product__label">Bike E</span>
                 <span class="product__price" style="text-decoration: line-through">9 000 ₽</span>
                 <span class="product__price">8 000 ₽</span>
               </div>"#,
        );
        assert_eq!(records[0].price_minor, Some(800_000));
    }

    #[test]
    fn nested_struck_variant_excluded_from_price_text() {
        // The original price sits inside the price element, carrying only
        // the modifier class; its digits must not merge into the current
        // price.
        let records = extract_from(
            r#"<div class="product__block">
                 <span class="product__label">Bike G</span>
                 <span class="product__price"><span class="product__price--old">12 990 ₽</span> 10 000 ₽</span>
               </div>"#,
        );
        assert_eq!(records[0].price_minor, Some(1_000_000));
    }

    #[test]
    fn nested_line_through_variant_excluded_from_price_text() {
        let records = extract_from(
            r#"<div class="product__block">
                 <span class="product__label">Bike H</span>
                 <span class="product__price"><s style="text-decoration: line-through">9 000 ₽</s> 8 000 ₽</span>
               </div>"#,
        );
        assert_eq!(records[0].price_minor, Some(800_000));
    }

    #[test]
    fn all_prices_struck_falls_back_to_first() {
        let records = extract_from(
            r#"<div class="product__block">
                 <span class="product__label">Bike F</span>
                 <span class="product__price product__price--old">7 000 ₽</span>
               </div>"#,
        );
        assert_eq!(records[0].price_minor, Some(700_000));
    }

    #[test]
    fn empty_listing_times_out_to_zero_records() {
        assert!(extract_from("<p>nothing rendered</p>").is_empty());
    }
}
