use scraper::{Html, Selector};

const HEADER_SELECTOR: &str = ".mn-connections__header";

/// Best-effort source of the connection count the page displays.
///
/// Never fails: an absent or unreadable count is 0.
pub trait DisplayedCountSource: Send + Sync {
    fn displayed_count(&self) -> u32;
}

/// A count known up front.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedCount(pub u32);

impl DisplayedCountSource for FixedCount {
    fn displayed_count(&self) -> u32 {
        self.0
    }
}

/// Reads the count from a snapshot of the connections page markup.
#[derive(Debug, Clone)]
pub struct HtmlHeaderCount {
    html: String,
}

impl HtmlHeaderCount {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }
}

impl DisplayedCountSource for HtmlHeaderCount {
    fn displayed_count(&self) -> u32 {
        let Ok(selector) = Selector::parse(HEADER_SELECTOR) else {
            return 0;
        };
        let document = Html::parse_document(&self.html);
        document
            .select(&selector)
            .next()
            .map(|header| parse_displayed_count(&header.text().collect::<String>()))
            .unwrap_or(0)
    }
}

/// `"1,234 Connections"` -> 1234. Only the first word counts; thousands
/// separators are dropped and leading digits parsed, so `"500+"` is 500.
pub fn parse_displayed_count(text: &str) -> u32 {
    let Some(first) = text.split_whitespace().next() else {
        return 0;
    };
    let digits: String = first
        .chars()
        .filter(|c| *c != ',')
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().unwrap_or(0)
}
