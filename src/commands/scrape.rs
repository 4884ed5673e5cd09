use std::path::{Path, PathBuf};

use colored::Colorize;
use inquire::Confirm;
use tracing::info;

use quinto::collect::{self, UrlCollector};
use quinto::config::Config;
use quinto::error::{QuintoError, Result};
use quinto::fetch::HttpFetcher;
use quinto::output::{self, Summary};
use quinto::pipeline;
use quinto::Extractor;

/// Collect listing URLs and save them to a file
pub fn cmd_collect(
    config: &Config,
    pages: Option<usize>,
    limit: Option<usize>,
    output: Option<PathBuf>,
) -> Result<()> {
    let fetcher = HttpFetcher::new(&config.http);
    let urls = collect_urls(
        config,
        &fetcher,
        pages.unwrap_or(config.search.max_pages),
        limit.unwrap_or(config.search.max_urls),
    )?;

    let path = output.unwrap_or_else(|| collect::urls_file(&config.output, &config.search.neighborhood));
    collect::save_urls(&path, &urls)?;
    println!(
        "{} Saved {} URLs to {}",
        "✓".green(),
        urls.len().to_string().cyan(),
        path.display()
    );
    Ok(())
}

/// Fetch and parse listings, then write a CSV and print a summary
pub fn cmd_scrape(
    config: &Config,
    urls: Option<PathBuf>,
    output: Option<PathBuf>,
    concurrency: Option<usize>,
    yes: bool,
) -> Result<()> {
    // Compile selectors before any network work
    let extractor = Extractor::new(&config.selectors)?;
    let fetcher = HttpFetcher::new(&config.http);

    println!("{}", "QuintoAndar property scraper".bold());
    println!("Target neighborhood: {}", config.search.neighborhood.cyan());

    let urls = match urls {
        Some(path) => load_nonempty(&path)?,
        None => reuse_or_collect(config, &fetcher, yes)?,
    };

    let concurrency = concurrency.unwrap_or(config.http.concurrency).max(1);
    let report = pipeline::scrape_all(&urls, &fetcher, &extractor, concurrency)?;

    let path = output.unwrap_or_else(|| {
        output::default_output_file(
            &config.output,
            &config.search.neighborhood,
            &chrono::Local::now(),
        )
    });
    output::save_csv(&path, &report.records)?;
    println!("\n{} Results saved to {}", "✓".green(), path.display().to_string().cyan());

    Summary::from_records(&report.records).print();
    Ok(())
}

fn load_nonempty(path: &Path) -> Result<Vec<String>> {
    let urls = collect::load_urls(path)?;
    if urls.is_empty() {
        return Err(QuintoError::NoUrls);
    }
    info!(count = urls.len(), path = %path.display(), "Loaded URLs");
    Ok(urls)
}

/// Use the saved URL list for this neighborhood if the user agrees,
/// otherwise walk the search results and save a fresh one.
fn reuse_or_collect(config: &Config, fetcher: &HttpFetcher, yes: bool) -> Result<Vec<String>> {
    let path = collect::urls_file(&config.output, &config.search.neighborhood);

    if path.exists() {
        let reuse = yes
            || Confirm::new(&format!("Found existing URLs file {}. Use it?", path.display()))
                .with_default(true)
                .prompt()
                .unwrap_or(false);
        if reuse {
            return load_nonempty(&path);
        }
    }

    let urls = collect_urls(config, fetcher, config.search.max_pages, config.search.max_urls)?;
    collect::save_urls(&path, &urls)?;
    info!(count = urls.len(), path = %path.display(), "Saved URLs");
    Ok(urls)
}

fn collect_urls(
    config: &Config,
    fetcher: &HttpFetcher,
    max_pages: usize,
    limit: usize,
) -> Result<Vec<String>> {
    let collector = UrlCollector::new(fetcher, &config.search, &config.selectors.listing_cards)?;
    let urls = collector.collect(max_pages, limit)?;
    if urls.is_empty() {
        return Err(QuintoError::NoUrls);
    }
    Ok(urls)
}
