//! Listing page → [`PropertyRecord`]
//!
//! Extraction order is fixed: JSON-LD, title, address, detail blocks, price
//! table. Later steps only fill what earlier steps left empty.

use std::panic::{self, AssertUnwindSafe};

use scraper::Html;
use tracing::{debug, error};

use crate::config::{AreaStyle, SelectorConfig};
use crate::dom::{self, DomSelectors};
use crate::error::Result;
use crate::record::{fill_text, PropertyRecord, Status};
use crate::structured;

/// One stage of the extraction sequence
type Step = fn(&Extractor, &Html, &mut PropertyRecord);

/// Extraction stages in the order they run
const STEPS: [(&str, Step); 5] = [
    ("structured", Extractor::extract_structured),
    ("title", Extractor::extract_title),
    ("address", Extractor::extract_address),
    ("details", Extractor::extract_details),
    ("prices", Extractor::extract_prices),
];

/// Compiled, read-only extraction settings shared by all workers
#[derive(Debug, Clone)]
pub struct Extractor {
    selectors: DomSelectors,
    area_style: AreaStyle,
}

impl Extractor {
    pub fn new(config: &SelectorConfig) -> Result<Self> {
        Ok(Self {
            selectors: DomSelectors::compile(config)?,
            area_style: config.area_style,
        })
    }

    /// Parse one listing page.
    ///
    /// Missing or blank markup yields `no_content`. A failure inside the
    /// extraction sequence yields `parse_error`; fields set before the
    /// failure are kept.
    pub fn parse(&self, html: Option<&str>, url: &str) -> PropertyRecord {
        self.parse_with(html, url, &STEPS)
    }

    fn parse_with(&self, html: Option<&str>, url: &str, steps: &[(&str, Step)]) -> PropertyRecord {
        let html = match html {
            Some(h) if !h.trim().is_empty() => h,
            _ => return PropertyRecord::failed(url, Status::NoContent),
        };

        let mut record = PropertyRecord::new(url);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let document = Html::parse_document(html);
            for (name, step) in steps {
                debug!(url, step = *name, "Running extraction step");
                step(self, &document, &mut record);
            }
        }));

        match outcome {
            Ok(()) => {
                record.finish(Status::Success);
            }
            Err(payload) => {
                error!(url, error = %panic_message(payload.as_ref()), "Error parsing property");
                record.finish(Status::ParseError);
            }
        }
        record
    }

    fn extract_structured(&self, document: &Html, record: &mut PropertyRecord) {
        structured::extract_structured(document, record);
    }

    fn extract_title(&self, document: &Html, record: &mut PropertyRecord) {
        if let Some(title) = dom::extract_title(document, &self.selectors) {
            fill_text(&mut record.title, &title);
        }
    }

    fn extract_address(&self, document: &Html, record: &mut PropertyRecord) {
        // JSON-LD already provided one
        if record.has_address() {
            return;
        }

        match dom::extract_address(document, &self.selectors) {
            Some((strategy, address)) => {
                debug!(url = record.url(), strategy, "Address found");
                fill_text(&mut record.address_street, &address);
            }
            None => debug!(url = record.url(), "Could not extract address"),
        }
    }

    fn extract_details(&self, document: &Html, record: &mut PropertyRecord) {
        for fragment in dom::detail_fragments(document, &self.selectors) {
            if !record.update_from_text(&fragment, self.area_style) {
                debug!(url = record.url(), fragment = %fragment, "Detail fragment left no mark");
            }
        }

        // Second chance for details that only appear in the title
        if let Some(title) = record.title.clone() {
            record.update_from_text(&title, self.area_style);
        }
    }

    fn extract_prices(&self, document: &Html, record: &mut PropertyRecord) {
        for (label, value) in dom::price_rows(document, &self.selectors) {
            record.prices.insert(label, value);
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Answer, STRUCTURED_PRICE_LABEL};

    fn extractor() -> Extractor {
        Extractor::new(&SelectorConfig::default()).unwrap()
    }

    const URL: &str = "https://www.quintoandar.com.br/imovel/893456789";

    #[test]
    fn test_empty_markup_is_no_content() {
        let ex = extractor();
        for html in [None, Some(""), Some("  \n ")] {
            let record = ex.parse(html, URL);
            assert_eq!(record.status(), Status::NoContent);
            assert_eq!(record.url(), URL);
            assert!(record.title.is_none());
            assert!(record.address_street.is_none());
            assert!(record.area.is_none());
            assert!(record.rooms.is_none());
            assert!(record.prices.is_empty());
        }
    }

    #[test]
    fn test_structured_address_beats_heuristics() {
        let html = r#"<html><head>
            <script type="application/ld+json">
            {"@type": "Apartment", "address": {"streetAddress": "Rua Tuiuti, 1200", "addressLocality": "São Paulo"}}
            </script></head><body>
            <div data-testid="address-container"><p>Rua Errada, 1</p></div>
        </body></html>"#;
        let record = extractor().parse(Some(html), URL);
        assert_eq!(record.status(), Status::Success);
        assert_eq!(record.address_street.as_deref(), Some("Rua Tuiuti, 1200, São Paulo"));
    }

    #[test]
    fn test_malformed_jsonld_does_not_abort() {
        let html = r#"<html><head>
            <script type="application/ld+json">{"@type": "Apartment", "offers": {"price": </script>
            </head><body>
            <h1 data-testid="listing-title">Apartamento para alugar</h1>
            <div data-testid="address-container"><p>Rua Itapura</p></div>
        </body></html>"#;
        let record = extractor().parse(Some(html), URL);
        assert_eq!(record.status(), Status::Success);
        assert_eq!(record.title.as_deref(), Some("Apartamento para alugar"));
        assert_eq!(record.address_street.as_deref(), Some("Rua Itapura"));
        assert!(record.prices.get(STRUCTURED_PRICE_LABEL).is_none());
    }

    #[test]
    fn test_title_recovery_pass() {
        let html = r#"<html><body>
            <h1 data-testid="listing-title">Casa com 3 quartos, aceita pet</h1>
        </body></html>"#;
        let record = extractor().parse(Some(html), URL);
        assert_eq!(record.rooms, Some(3));
        // one fragment updates one field category
        assert_eq!(record.pet_allowed, Answer::No);
    }

    #[test]
    fn test_title_pass_respects_detail_values() {
        let html = r#"<html><body>
            <h1 data-testid="listing-title">Apartamento com 4 quartos</h1>
            <div data-testid="house-main-info">
                <div class="MainInfo_iconDescriptionWrapper__St8RA">2 quartos</div>
            </div>
        </body></html>"#;
        let record = extractor().parse(Some(html), URL);
        assert_eq!(record.rooms, Some(2));
    }

    #[test]
    fn test_structured_price_and_table_prices_coexist() {
        let html = r#"<html><head>
            <script type="application/ld+json">
            [{"@type": "BreadcrumbList"}, {"@type": "Residence", "offers": {"price": "2500", "priceCurrency": "BRL"}}]
            </script></head><body>
            <ul data-testid="listing-price-table">
                <li><span>Aluguel</span><div><p>R$ 0</p></div><div><p>R$ 2.500</p></div></li>
            </ul>
        </body></html>"#;
        let record = extractor().parse(Some(html), URL);
        let labels: Vec<_> = record.prices.labels().collect();
        assert_eq!(labels, vec![STRUCTURED_PRICE_LABEL, "Aluguel"]);
        assert_eq!(record.prices.get("Aluguel"), Some("R$ 2.500"));
        assert_eq!(record.prices.get(STRUCTURED_PRICE_LABEL), Some("BRL 2500"));
    }

    #[test]
    fn test_with_unit_area_style() {
        let config = SelectorConfig {
            area_style: AreaStyle::WithUnit,
            ..Default::default()
        };
        let ex = Extractor::new(&config).unwrap();
        let html = r#"<div data-testid="house-main-info">
            <div class="MainInfo_iconDescriptionWrapper__St8RA">58 m²</div>
        </div>"#;
        let record = ex.parse(Some(html), URL);
        assert_eq!(record.area.as_deref(), Some("58 m²"));
    }

    #[test]
    fn test_failing_step_keeps_earlier_fields() {
        fn explode(_: &Extractor, _: &Html, _: &mut PropertyRecord) {
            panic!("price table exploded");
        }

        let html = r#"<html><body>
            <h1 data-testid="listing-title">Apartamento com 2 quartos</h1>
            <div data-testid="address-container"><p>Rua Tuiuti, 1200</p></div>
            <ul data-testid="listing-price-table">
                <li><span>Aluguel</span><div><p>R$ 2.500</p></div></li>
            </ul>
        </body></html>"#;

        let steps: Vec<(&str, Step)> = STEPS[..3]
            .iter()
            .copied()
            .chain([("explode", explode as Step)])
            .chain(STEPS[3..].iter().copied())
            .collect();

        let record = extractor().parse_with(Some(html), URL, &steps);
        assert_eq!(record.status(), Status::ParseError);
        assert_eq!(record.title.as_deref(), Some("Apartamento com 2 quartos"));
        assert_eq!(record.address_street.as_deref(), Some("Rua Tuiuti, 1200"));
        // steps after the failure never ran
        assert_eq!(record.rooms, None);
        assert!(record.prices.is_empty());
    }

    #[test]
    fn test_quintoandar_title_is_not_a_floor() {
        let html = r#"<html><body><h1>Casa para alugar | QuintoAndar</h1></body></html>"#;
        let record = extractor().parse(Some(html), URL);
        assert_eq!(record.status(), Status::Success);
        assert_eq!(record.floor, None);
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
    }
}
