//! JSON-LD (schema.org) extraction
//!
//! Listing pages embed one or more `application/ld+json` blocks. Each block is
//! read independently; a block that fails to parse is skipped and never stops
//! the remaining extraction.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;

use crate::record::{PropertyRecord, STRUCTURED_PRICE_LABEL};

static JSONLD_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"script[type="application/ld+json"]"#).expect("Invalid JSON-LD selector")
});

/// `@type` fragments that mark an item as the listed property
const LISTING_TYPE_KEYWORDS: [&str; 5] = ["place", "residence", "apartment", "house", "realestate"];

/// Address keys joined, in this order, into `address_street`
const ADDRESS_KEYS: [&str; 3] = ["streetAddress", "addressLocality", "addressRegion"];

/// Result of reading one JSON-LD block
#[derive(Debug, Clone, PartialEq)]
pub enum BlockOutcome {
    Parsed(Value),
    Skipped(String),
}

/// Parse the text of one JSON-LD block
pub fn read_block(text: &str) -> BlockOutcome {
    let text = text.trim();
    if text.is_empty() {
        return BlockOutcome::Skipped("empty block".into());
    }
    match serde_json::from_str::<Value>(text) {
        Ok(value) => BlockOutcome::Parsed(value),
        Err(e) => BlockOutcome::Skipped(e.to_string()),
    }
}

/// Check whether an item's `@type` names a kind of property
/// Handles both a single type string and an array of types
pub fn is_listing(item: &Value) -> bool {
    let matches = |t: &str| {
        let lower = t.to_lowercase();
        LISTING_TYPE_KEYWORDS.iter().any(|k| lower.contains(k))
    };
    match item.get("@type") {
        Some(Value::String(s)) => matches(s),
        Some(Value::Array(types)) => types.iter().filter_map(Value::as_str).any(matches),
        _ => false,
    }
}

/// Pick the object describing the listing.
///
/// Lists (and `@graph` containers) yield their first property-typed item,
/// falling back to the first item.
pub fn select_listing(value: &Value) -> Option<&Value> {
    let selected = match value {
        Value::Array(items) => pick_from(items),
        Value::Object(map) => match map.get("@graph") {
            Some(Value::Array(graph)) => pick_from(graph),
            _ => Some(value),
        },
        _ => None,
    };
    selected.filter(|v| v.is_object())
}

fn pick_from(items: &[Value]) -> Option<&Value> {
    items.iter().find(|item| is_listing(item)).or_else(|| items.first())
}

/// Map one listing object onto the record. Returns true if anything was set.
///
/// Blocks are applied in document order, so when several carry an address
/// or an offer the last one wins for both.
pub fn apply_listing(item: &Value, record: &mut PropertyRecord) -> bool {
    let mut changed = false;

    if let Some(Value::Object(address)) = item.get("address") {
        let parts: Vec<&str> = ADDRESS_KEYS
            .iter()
            .filter_map(|key| address.get(*key).and_then(Value::as_str))
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect();
        if !parts.is_empty() {
            record.address_street = Some(parts.join(", "));
            changed = true;
        }
    }

    let offer = match item.get("offers") {
        Some(Value::Array(offers)) => offers.first(),
        Some(obj @ Value::Object(_)) => Some(obj),
        _ => None,
    };

    if let Some(offer) = offer {
        if let Some(price) = offer.get("price").and_then(price_text) {
            let currency = offer
                .get("priceCurrency")
                .and_then(Value::as_str)
                .unwrap_or("");
            let formatted = format!("{} {}", currency, price);
            record.prices.insert(STRUCTURED_PRICE_LABEL, formatted.trim());
            changed = true;
        }
    }

    changed
}

/// Render a price value; null, blank and zero prices count as absent
fn price_text(price: &Value) -> Option<String> {
    match price {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    }
}

/// Apply every usable JSON-LD block in the document. Returns the number of
/// blocks that were parsed and mapped.
pub fn extract_structured(document: &Html, record: &mut PropertyRecord) -> usize {
    let mut applied = 0;

    for script in document.select(&JSONLD_SELECTOR) {
        let text: String = script.text().collect();
        match read_block(&text) {
            BlockOutcome::Parsed(value) => match select_listing(&value) {
                Some(item) => {
                    apply_listing(item, record);
                    applied += 1;
                }
                None => debug!(url = record.url(), "JSON-LD block holds no object"),
            },
            BlockOutcome::Skipped(reason) => {
                debug!(url = record.url(), %reason, "Skipping JSON-LD block");
            }
        }
    }

    applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> PropertyRecord {
        PropertyRecord::new("https://www.quintoandar.com.br/imovel/1")
    }

    #[test]
    fn test_read_block_skips_malformed() {
        assert!(matches!(read_block(r#"{"@type": "Apartment","#), BlockOutcome::Skipped(_)));
        assert!(matches!(read_block("   "), BlockOutcome::Skipped(_)));
        assert!(matches!(read_block(r#"{"a": 1}"#), BlockOutcome::Parsed(_)));
    }

    #[test]
    fn test_is_listing_type_variants() {
        assert!(is_listing(&json!({"@type": "Apartment"})));
        assert!(is_listing(&json!({"@type": "SingleFamilyResidence"})));
        assert!(is_listing(&json!({"@type": ["Product", "RealEstateListing"]})));
        assert!(!is_listing(&json!({"@type": "BreadcrumbList"})));
        assert!(!is_listing(&json!({"name": "no type"})));
    }

    #[test]
    fn test_select_listing_prefers_property_type() {
        let value = json!([
            {"@type": "BreadcrumbList"},
            {"@type": "Apartment", "name": "Apto"}
        ]);
        let item = select_listing(&value).unwrap();
        assert_eq!(item["name"], "Apto");
    }

    #[test]
    fn test_select_listing_falls_back_to_first() {
        let value = json!([{"@type": "Organization", "name": "QA"}, {"@type": "WebPage"}]);
        assert_eq!(select_listing(&value).unwrap()["name"], "QA");
        assert!(select_listing(&json!([])).is_none());
        assert!(select_listing(&json!("text")).is_none());
    }

    #[test]
    fn test_select_listing_from_graph() {
        let value = json!({"@graph": [{"@type": "WebSite"}, {"@type": "House", "name": "Casa"}]});
        assert_eq!(select_listing(&value).unwrap()["name"], "Casa");
    }

    #[test]
    fn test_apply_listing_address_and_offer() {
        let item = json!({
            "@type": "Apartment",
            "address": {
                "streetAddress": "Rua Tuiuti",
                "addressLocality": "São Paulo",
                "addressRegion": ""
            },
            "offers": [{"price": 2500, "priceCurrency": "BRL"}, {"price": 1}]
        });
        let mut r = record();
        assert!(apply_listing(&item, &mut r));
        assert_eq!(r.address_street.as_deref(), Some("Rua Tuiuti, São Paulo"));
        assert_eq!(r.prices.get(STRUCTURED_PRICE_LABEL), Some("BRL 2500"));
    }

    #[test]
    fn test_apply_listing_zero_price_ignored() {
        let item = json!({"offers": {"price": 0, "priceCurrency": "BRL"}});
        let mut r = record();
        assert!(!apply_listing(&item, &mut r));
        assert!(r.prices.is_empty());
    }

    #[test]
    fn test_apply_listing_price_without_currency_is_trimmed() {
        let item = json!({"offers": {"price": "3100"}});
        let mut r = record();
        apply_listing(&item, &mut r);
        assert_eq!(r.prices.get(STRUCTURED_PRICE_LABEL), Some("3100"));
    }

    #[test]
    fn test_extract_structured_continues_after_bad_block() {
        let html = r#"
            <html><head>
            <script type="application/ld+json">{ not json </script>
            <script type="application/ld+json">
            {"@type": "Apartment", "address": {"streetAddress": "Rua Itapura, 300"}}
            </script>
            </head><body></body></html>
        "#;
        let document = Html::parse_document(html);
        let mut r = record();
        assert_eq!(extract_structured(&document, &mut r), 1);
        assert_eq!(r.address_street.as_deref(), Some("Rua Itapura, 300"));
    }

    #[test]
    fn test_last_block_wins_for_address_and_price() {
        let html = r#"
            <html><head>
            <script type="application/ld+json">
            {"@type": "Apartment", "address": {"streetAddress": "Rua Antiga"}, "offers": {"price": 1000, "priceCurrency": "BRL"}}
            </script>
            <script type="application/ld+json">
            {"@type": "Apartment", "address": {"streetAddress": "Rua Tuiuti", "addressRegion": "SP"}, "offers": {"price": 2500, "priceCurrency": "BRL"}}
            </script>
            <script type="application/ld+json">{"@type": "Apartment", "address": {"streetAddress": "  "}}</script>
            </head><body></body></html>
        "#;
        let document = Html::parse_document(html);
        let mut r = record();
        assert_eq!(extract_structured(&document, &mut r), 3);
        assert_eq!(r.address_street.as_deref(), Some("Rua Tuiuti, SP"));
        assert_eq!(r.prices.get(STRUCTURED_PRICE_LABEL), Some("BRL 2500"));
        assert_eq!(r.prices.len(), 1);
    }
}
