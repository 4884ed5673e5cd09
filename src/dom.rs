//! DOM heuristics for listing pages
//!
//! Used when structured data is missing or incomplete. Each function reads
//! the parsed document and returns plain data; applying it to a record is
//! left to [`crate::parser`].

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::config::SelectorConfig;
use crate::error::{QuintoError, Result};

static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));

/// Minimum length (in characters) for a generic address match
const MIN_FALLBACK_ADDRESS_CHARS: usize = 10;

/// How many trailing breadcrumb links may hold the location
const BREADCRUMB_TAIL: usize = 2;

/// Selectors compiled once from [`SelectorConfig`]
#[derive(Debug, Clone)]
pub struct DomSelectors {
    pub title: Vec<Selector>,
    pub address_container: Selector,
    pub address_paragraphs: Selector,
    pub address_fallbacks: Vec<Selector>,
    pub breadcrumbs: Selector,
    pub geo_keywords: Vec<String>,
    pub main_info: Selector,
    pub price_table: Selector,
    pub price_labels: Selector,
    pub price_values: Selector,
}

impl DomSelectors {
    pub fn compile(config: &SelectorConfig) -> Result<Self> {
        Ok(Self {
            title: compile_all(&config.title)?,
            address_container: compile(&config.address_container)?,
            address_paragraphs: compile(&config.address_paragraphs)?,
            address_fallbacks: compile_all(&config.address_fallbacks)?,
            breadcrumbs: compile(&config.breadcrumbs)?,
            geo_keywords: config.geo_keywords.iter().map(|k| k.to_lowercase()).collect(),
            main_info: compile(&config.main_info)?,
            price_table: compile(&config.price_table)?,
            price_labels: compile(&config.price_labels)?,
            price_values: compile(&config.price_values)?,
        })
    }
}

/// Parse a CSS selector, reporting the offending text on failure
pub fn compile(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|_| QuintoError::SelectorError(selector.to_string()))
}

fn compile_all(selectors: &[String]) -> Result<Vec<Selector>> {
    selectors.iter().map(|s| compile(s)).collect()
}

/// Non-empty text nodes of an element, trimmed and joined with spaces
pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Collapse runs of whitespace into single spaces
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text, " ").trim().to_string()
}

/// First non-empty match of the prioritized title selectors
pub fn extract_title(document: &Html, selectors: &DomSelectors) -> Option<String> {
    selectors.title.iter().find_map(|selector| {
        document
            .select(selector)
            .next()
            .map(element_text)
            .filter(|t| !t.is_empty())
    })
}

/// One way of locating the address
pub type AddressStrategy = fn(&Html, &DomSelectors) -> Option<String>;

/// Address strategies in priority order
pub const ADDRESS_STRATEGIES: [(&str, AddressStrategy); 4] = [
    ("paragraphs", address_from_paragraphs),
    ("container", address_from_container),
    ("fallback", address_from_fallbacks),
    ("breadcrumb", address_from_breadcrumbs),
];

/// Run the address waterfall, returning the winning strategy and its text
pub fn extract_address(document: &Html, selectors: &DomSelectors) -> Option<(&'static str, String)> {
    ADDRESS_STRATEGIES
        .iter()
        .find_map(|(name, strategy)| strategy(document, selectors).map(|a| (*name, a)))
}

/// Paragraphs inside the address container, repeated lines dropped
pub fn address_from_paragraphs(document: &Html, selectors: &DomSelectors) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();
    for paragraph in document.select(&selectors.address_paragraphs) {
        let text = element_text(paragraph);
        if !text.is_empty() && !parts.contains(&text) {
            parts.push(text);
        }
    }
    (!parts.is_empty()).then(|| parts.join(", "))
}

/// Full text of the address container
pub fn address_from_container(document: &Html, selectors: &DomSelectors) -> Option<String> {
    let container = document.select(&selectors.address_container).next()?;
    let text = collapse_whitespace(&element_text(container));
    (!text.is_empty()).then_some(text)
}

/// Generic "address"/"location" elements long enough to be an address
pub fn address_from_fallbacks(document: &Html, selectors: &DomSelectors) -> Option<String> {
    selectors.address_fallbacks.iter().find_map(|selector| {
        document
            .select(selector)
            .map(element_text)
            .find(|text| text.chars().count() > MIN_FALLBACK_ADDRESS_CHARS)
    })
}

/// Trailing breadcrumb links that mention a known place keyword
pub fn address_from_breadcrumbs(document: &Html, selectors: &DomSelectors) -> Option<String> {
    let links: Vec<String> = document.select(&selectors.breadcrumbs).map(element_text).collect();
    let tail = &links[links.len().saturating_sub(BREADCRUMB_TAIL)..];

    tail.iter()
        .find(|text| {
            let lower = text.to_lowercase();
            selectors.geo_keywords.iter().any(|k| lower.contains(k.as_str()))
        })
        .cloned()
}

/// Text fragments of the "main info" blocks
pub fn detail_fragments(document: &Html, selectors: &DomSelectors) -> Vec<String> {
    document
        .select(&selectors.main_info)
        .map(element_text)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Label/value pairs from the price table.
///
/// The value is the last matching candidate in the row: tooltips and icons
/// render a duplicate value before the real one.
pub fn price_rows(document: &Html, selectors: &DomSelectors) -> Vec<(String, String)> {
    let mut rows = Vec::new();

    for row in document.select(&selectors.price_table) {
        let Some(label) = row
            .select(&selectors.price_labels)
            .next()
            .map(element_text)
            .filter(|l| !l.is_empty())
        else {
            continue;
        };

        let Some(value) = row.select(&selectors.price_values).last().map(element_text) else {
            continue;
        };

        if !value.is_empty() {
            rows.push((label, value));
        }
    }

    rows
}
