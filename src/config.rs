use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{QuintoError, Result};

/// Global quinto configuration
///
/// Every section is optional in the TOML file; missing keys fall back to
/// the defaults below.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub selectors: SelectorConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Which search results to walk
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Neighborhood slug as used in marketplace URLs (e.g., "tatuape")
    pub neighborhood: String,
    pub base_url: String,
    /// Stop collecting once this many URLs are known
    pub max_urls: usize,
    /// Maximum number of result pages to walk
    pub max_pages: usize,
    /// Query parameter carrying the result page number
    pub page_param: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            neighborhood: "tatuape".into(),
            base_url: "https://www.quintoandar.com.br".into(),
            max_urls: 100,
            max_pages: 10,
            page_param: "pagina".into(),
        }
    }
}

impl SearchConfig {
    /// Search results URL for the configured neighborhood
    pub fn listing_url(&self) -> String {
        format!(
            "{}/alugar/imovel/{}-sao-paulo-sp-brasil",
            self.base_url.trim_end_matches('/'),
            self.neighborhood
        )
    }
}

/// HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Number of listing pages fetched in parallel
    pub concurrency: usize,
    pub timeout_secs: u64,
    /// Attempts per URL before giving up
    pub retries: u32,
    /// Base delay for retry backoff
    pub rate_limit_delay_ms: u64,
    pub user_agent: String,
    /// Extra request headers
    pub headers: BTreeMap<String, String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        let headers = [
            ("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
            ("Accept-Language", "pt-BR,pt;q=0.9,en-US;q=0.7,en;q=0.6"),
            ("DNT", "1"),
            ("Upgrade-Insecure-Requests", "1"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            concurrency: 8,
            timeout_secs: 20,
            retries: 3,
            rate_limit_delay_ms: 500,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .into(),
            headers,
        }
    }
}

/// How a parsed area is written to the record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaStyle {
    /// Digits only: "72"
    #[default]
    Bare,
    /// Digits plus unit: "72 m²"
    WithUnit,
}

/// CSS selectors and keyword lists used by the extractor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Anchors of listing cards on the search results page
    pub listing_cards: String,
    /// Title candidates, tried in order
    pub title: Vec<String>,
    pub address_container: String,
    pub address_paragraphs: String,
    /// Generic address/location selectors, tried in order
    pub address_fallbacks: Vec<String>,
    pub breadcrumbs: String,
    /// Lowercase keywords that mark a breadcrumb as a location
    pub geo_keywords: Vec<String>,
    pub main_info: String,
    pub price_table: String,
    pub price_labels: String,
    pub price_values: String,
    pub area_style: AreaStyle,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            listing_cards: "div[data-testid='house-card-container-rent'] a".into(),
            title: vec![
                "h1[data-testid='listing-title']".into(),
                "h1".into(),
                "h2".into(),
            ],
            address_container: "div[data-testid='address-container']".into(),
            address_paragraphs: "div[data-testid='address-container'] p".into(),
            address_fallbacks: vec![
                "[data-testid*='address']".into(),
                "[class*='address' i]".into(),
                "[class*='location' i]".into(),
                ".address".into(),
                ".location".into(),
            ],
            breadcrumbs: "[class*='breadcrumb' i] a, nav a".into(),
            geo_keywords: ["sp", "paulo", "são", "rua", "av"]
                .into_iter()
                .map(String::from)
                .collect(),
            main_info: "div[data-testid='house-main-info'] .MainInfo_iconDescriptionWrapper__St8RA"
                .into(),
            price_table: "ul[data-testid='listing-price-table'] li".into(),
            price_labels: "span, h4".into(),
            price_values: "div > p, div > h4".into(),
            area_style: AreaStyle::default(),
        }
    }
}

/// Where results and URL lists are written
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("database"),
        }
    }
}

impl OutputConfig {
    /// Directory for CSV results
    pub fn data_dir(&self) -> PathBuf {
        self.dir.join("data")
    }

    /// Directory for saved URL lists
    pub fn urls_dir(&self) -> PathBuf {
        self.dir.join("urls")
    }
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist. Otherwise `QUINTO_CONFIG` is consulted,
    /// then the default location; a missing default file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from(path);
        }
        let config_path = Self::config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            QuintoError::ConfigError(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| QuintoError::ConfigError(e.to_string()))
    }

    /// Get the config file path
    ///
    /// Supports QUINTO_CONFIG environment variable override
    pub fn config_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var("QUINTO_CONFIG") {
            return Ok(PathBuf::from(path));
        }
        let dirs = ProjectDirs::from("", "", "quinto")
            .ok_or_else(|| QuintoError::ConfigError("Could not determine config directory".into()))?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    fn validate(&self) -> Result<()> {
        if self.http.concurrency == 0 {
            return Err(QuintoError::ConfigError(
                "http.concurrency must be at least 1".into(),
            ));
        }
        if self.http.retries == 0 {
            return Err(QuintoError::ConfigError(
                "http.retries must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
