use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuintoError {
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("Invalid selector '{0}'")]
    SelectorError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Worker pool error: {0}")]
    PoolError(String),

    #[error("No listing URLs to process")]
    NoUrls,
}

impl QuintoError {
    /// Get an actionable hint for how to resolve this error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            QuintoError::SelectorError(_) => Some(
                "Fix the selector in the [selectors] section:\n  quinto config show"
            ),
            QuintoError::TomlError(_) | QuintoError::ConfigError(_) => Some(
                "Regenerate a default config with:\n  quinto config init --force"
            ),
            QuintoError::NoUrls => Some(
                "Collect URLs first (check your connection if this keeps failing):\n  quinto collect\nOr pass a URL file: quinto scrape --urls <file>"
            ),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, QuintoError>;
