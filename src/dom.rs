use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

/// Signal returned by the bounded waits when the condition never held.
#[derive(Debug, Error)]
#[error("timed out after {waited_ms}ms waiting for {condition}")]
pub struct WaitTimeout {
    pub condition: String,
    pub waited_ms: u128,
}

/// One rendered DOM element: scoped query, attribute/text reads, clickability.
pub trait Element {
    /// Select descendants of this element by CSS selector.
    fn query(&self, css: &str) -> Vec<Self>
    where
        Self: Sized;
    fn attr(&self, name: &str) -> Option<String>;
    fn text(&self) -> String;
    fn is_interactable(&self) -> bool;
}

/// A browser session rendering one page at a time.
///
/// `navigate` and `click` return `Err` only for session-level failures
/// (browser gone); a page that fails to load is reported through the waits.
pub trait Browser {
    type Elem: Element;

    fn navigate(&mut self, url: &str) -> anyhow::Result<()>;
    fn current_url(&self) -> String;
    /// Select elements in the current page by CSS selector.
    fn query(&self, css: &str) -> Vec<Self::Elem>;
    fn click(&mut self, element: &Self::Elem) -> anyhow::Result<()>;
}

/// Per-call wait bounds. Timeouts are always passed explicitly; there are no
/// ambient defaults.
#[derive(Debug, Clone, Copy)]
pub struct Wait {
    pub timeout: Duration,
    pub poll: Duration,
}

impl Wait {
    pub fn new(timeout: Duration, poll: Duration) -> Self {
        Self { timeout, poll }
    }
}

/// Poll `probe` until it yields a value or `wait.timeout` elapses.
///
/// The probe always runs at least once, so a zero timeout means exactly one
/// check (the snapshot backend renders everything up front and never needs
/// more).
pub fn wait_for<B: Browser, T>(
    browser: &B,
    wait: Wait,
    condition: &str,
    mut probe: impl FnMut(&B) -> Option<T>,
) -> Result<T, WaitTimeout> {
    let start = Instant::now();
    loop {
        if let Some(value) = probe(browser) {
            return Ok(value);
        }
        if start.elapsed() >= wait.timeout {
            return Err(WaitTimeout {
                condition: condition.to_string(),
                waited_ms: start.elapsed().as_millis(),
            });
        }
        thread::sleep(wait.poll);
    }
}

/// Wait until at least one element matches `css`, returning all matches.
pub fn wait_all<B: Browser>(
    browser: &B,
    css: &str,
    wait: Wait,
) -> Result<Vec<B::Elem>, WaitTimeout> {
    wait_for(browser, wait, css, |b| {
        let elements = b.query(css);
        if elements.is_empty() {
            None
        } else {
            Some(elements)
        }
    })
}

/// Wait until an element matches `css`, returning the first match.
pub fn wait_present<B: Browser>(
    browser: &B,
    css: &str,
    wait: Wait,
) -> Result<B::Elem, WaitTimeout> {
    wait_for(browser, wait, css, |b| b.query(css).into_iter().next())
}

/// Wait until no element matches `css`.
pub fn wait_absent<B: Browser>(browser: &B, css: &str, wait: Wait) -> Result<(), WaitTimeout> {
    let condition = format!("absence of {css}");
    wait_for(browser, wait, &condition, |b| {
        if b.query(css).is_empty() {
            Some(())
        } else {
            None
        }
    })
}

/// Wait until an element matching `css` is present and interactable.
pub fn wait_clickable<B: Browser>(
    browser: &B,
    css: &str,
    wait: Wait,
) -> Result<B::Elem, WaitTimeout> {
    let condition = format!("clickable {css}");
    wait_for(browser, wait, &condition, |b| {
        b.query(css).into_iter().find(|e| e.is_interactable())
    })
}

/// Wait until the browser reports `url` as the current URL.
pub fn wait_url<B: Browser>(browser: &B, url: &str, wait: Wait) -> Result<(), WaitTimeout> {
    let condition = format!("url == {url}");
    wait_for(browser, wait, &condition, |b| {
        if b.current_url() == url {
            Some(())
        } else {
            None
        }
    })
}
