//! Batch driver: fetch and parse every listing URL on a bounded worker pool

use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use tracing::info;

use crate::error::{QuintoError, Result};
use crate::fetch::PageSource;
use crate::parser::Extractor;
use crate::record::{PropertyRecord, Status};

/// Log progress every this many completed listings
const PROGRESS_EVERY: usize = 50;

/// All records of a batch plus the success tally
#[derive(Debug, Default)]
pub struct BatchReport {
    pub records: Vec<PropertyRecord>,
    pub success: usize,
    pub failed: usize,
}

impl BatchReport {
    pub fn from_records(records: Vec<PropertyRecord>) -> Self {
        let success = records
            .iter()
            .filter(|r| r.status() == Status::Success)
            .count();
        Self {
            failed: records.len() - success,
            success,
            records,
        }
    }

    pub fn total(&self) -> usize {
        self.records.len()
    }
}

/// Fetch one listing and turn it into a record
pub fn process_url<S: PageSource>(source: &S, extractor: &Extractor, url: &str) -> PropertyRecord {
    match source.fetch_html(url) {
        Some(html) => extractor.parse(Some(&html), url),
        None => PropertyRecord::failed(url, Status::FetchFailed),
    }
}

/// Process every URL with at most `concurrency` listings in flight.
///
/// Individual failures end up as `fetch_failed`/`parse_error` records; the
/// batch itself only fails if the worker pool cannot be created. Record
/// order is not meaningful.
pub fn scrape_all<S: PageSource>(
    urls: &[String],
    source: &S,
    extractor: &Extractor,
    concurrency: usize,
) -> Result<BatchReport> {
    if urls.is_empty() {
        return Ok(BatchReport::default());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(concurrency.max(1))
        .thread_name(|i| format!("quinto-worker-{}", i))
        .build()
        .map_err(|e| QuintoError::PoolError(e.to_string()))?;

    let total = urls.len();
    info!(total, concurrency, "Starting to fetch properties");

    let completed = AtomicUsize::new(0);
    let records: Vec<PropertyRecord> = pool.install(|| {
        urls.par_iter()
            .map(|url| {
                let record = process_url(source, extractor, url);
                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                if done % PROGRESS_EVERY == 0 || done == total {
                    info!(done, total, "Completed properties");
                }
                record
            })
            .collect()
    });

    let report = BatchReport::from_records(records);
    info!(success = report.success, failed = report.failed, "Fetching complete");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SelectorConfig;
    use std::collections::HashMap;

    struct FakeSite(HashMap<String, String>);

    impl PageSource for FakeSite {
        fn fetch_html(&self, url: &str) -> Option<String> {
            self.0.get(url).cloned()
        }
    }

    fn site() -> FakeSite {
        let mut pages = HashMap::new();
        pages.insert(
            "https://qa.test/imovel/1".to_string(),
            r#"<h1 data-testid="listing-title">Apartamento 1</h1>"#.to_string(),
        );
        pages.insert(
            "https://qa.test/imovel/2".to_string(),
            r#"<h1 data-testid="listing-title">Apartamento 2</h1>"#.to_string(),
        );
        pages.insert("https://qa.test/imovel/blank".to_string(), String::new());
        FakeSite(pages)
    }

    #[test]
    fn test_process_url_fetch_failed() {
        let extractor = Extractor::new(&SelectorConfig::default()).unwrap();
        let record = process_url(&site(), &extractor, "https://qa.test/imovel/404");
        assert_eq!(record.status(), Status::FetchFailed);
    }

    #[test]
    fn test_scrape_all_keeps_every_url() {
        let extractor = Extractor::new(&SelectorConfig::default()).unwrap();
        let urls: Vec<String> = ["1", "2", "404", "blank"]
            .iter()
            .map(|id| format!("https://qa.test/imovel/{}", id))
            .collect();

        let report = scrape_all(&urls, &site(), &extractor, 2).unwrap();
        assert_eq!(report.total(), 4);
        assert_eq!(report.success, 2);
        assert_eq!(report.failed, 2);

        let status_of = |url: &str| {
            report
                .records
                .iter()
                .find(|r| r.url() == url)
                .map(|r| r.status())
        };
        assert_eq!(status_of("https://qa.test/imovel/404"), Some(Status::FetchFailed));
        assert_eq!(status_of("https://qa.test/imovel/blank"), Some(Status::NoContent));
        assert_eq!(status_of("https://qa.test/imovel/1"), Some(Status::Success));
    }

    #[test]
    fn test_scrape_all_empty_input() {
        let extractor = Extractor::new(&SelectorConfig::default()).unwrap();
        let report = scrape_all(&[], &site(), &extractor, 4).unwrap();
        assert_eq!(report.total(), 0);
    }
}
