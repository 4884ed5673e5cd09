//! Listing URL collection
//!
//! Walks the search results page by page and gathers listing card links.
//! URL lists can be saved and reloaded so a scrape can be re-run without
//! walking the search again.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use scraper::{Html, Selector};
use tracing::{info, warn};
use url::Url;

use crate::config::{OutputConfig, SearchConfig};
use crate::dom;
use crate::error::Result;
use crate::fetch::PageSource;

/// Absolute https links of every listing card in a results page.
/// Query strings and fragments are dropped; order follows the page.
pub fn listing_links(html: &str, cards: &Selector, base: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for card in document.select(cards) {
        let Some(href) = card.value().attr("href") else {
            continue;
        };
        let Ok(mut url) = base.join(href.trim()) else {
            continue;
        };
        if url.scheme() != "https" {
            continue;
        }
        url.set_query(None);
        url.set_fragment(None);

        let url = url.to_string();
        if seen.insert(url.clone()) {
            links.push(url);
        }
    }

    links
}

/// URL of the n-th results page (pages start at 1)
pub fn page_url(listing_url: &str, page_param: &str, page: usize) -> Result<String> {
    let mut url = Url::parse(listing_url)?;
    if page > 1 {
        url.query_pairs_mut().append_pair(page_param, &page.to_string());
    }
    Ok(url.to_string())
}

/// Collects listing URLs from the search results
pub struct UrlCollector<'a, S: PageSource> {
    source: &'a S,
    search: &'a SearchConfig,
    cards: Selector,
}

impl<'a, S: PageSource> UrlCollector<'a, S> {
    pub fn new(source: &'a S, search: &'a SearchConfig, card_selector: &str) -> Result<Self> {
        Ok(Self {
            source,
            search,
            cards: dom::compile(card_selector)?,
        })
    }

    /// Walk result pages until one adds nothing new, `max_pages` is reached,
    /// or `limit` URLs are known.
    pub fn collect(&self, max_pages: usize, limit: usize) -> Result<Vec<String>> {
        let listing_url = self.search.listing_url();
        let base = Url::parse(&listing_url)?;
        info!(url = %listing_url, "Starting URL collection");

        let mut seen: HashSet<String> = HashSet::new();
        let mut urls: Vec<String> = Vec::new();

        for page in 1..=max_pages {
            let url = page_url(&listing_url, &self.search.page_param, page)?;
            let Some(html) = self.source.fetch_html(&url) else {
                warn!(page, url = %url, "Could not load results page");
                break;
            };

            let fresh: Vec<String> = listing_links(&html, &self.cards, &base)
                .into_iter()
                .filter(|u| seen.insert(u.clone()))
                .collect();

            if fresh.is_empty() {
                info!(page, "No new URLs found - reached end");
                break;
            }

            info!(page, new = fresh.len(), total = urls.len() + fresh.len(), "Found new URLs");
            urls.extend(fresh);

            if urls.len() >= limit {
                urls.truncate(limit);
                break;
            }
        }

        info!(total = urls.len(), "Collection complete");
        Ok(urls)
    }
}

/// Default URL list for a neighborhood, reused across runs
pub fn urls_file(output: &OutputConfig, neighborhood: &str) -> PathBuf {
    output.urls_dir().join(format!("urls_{}.txt", neighborhood))
}

/// Load URLs from a text file (one URL per line, blank lines skipped)
pub fn load_urls(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

/// Save URLs to a text file, one per line
pub fn save_urls(path: &Path, urls: &[String]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut content = urls.join("\n");
    content.push('\n');
    std::fs::write(path, content)?;
    Ok(())
}
