//! The property record produced for every listing URL, and its update rules.
//!
//! Scalar fields follow a "first writer wins" policy: once an extractor has
//! stored a non-empty value, later extractors leave it alone. Structured data
//! runs before the DOM heuristics, so it gets priority for free.

use serde::ser::{Serialize, Serializer};
use std::fmt;

/// Price-table label used for the offer found in JSON-LD
pub const STRUCTURED_PRICE_LABEL: &str = "Preço (LD)";

/// Processing state of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Pending,
    Success,
    ParseError,
    FetchFailed,
    NoContent,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Success => "success",
            Status::ParseError => "parse_error",
            Status::FetchFailed => "fetch_failed",
            Status::NoContent => "no_content",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Status::Pending)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Yes/no answer for amenity flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Answer {
    Yes,
    No,
}

impl Answer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Answer::Yes => "yes",
            Answer::No => "no",
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Price label/value pairs in the order they were discovered.
///
/// Re-inserting a label replaces its value but keeps its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Prices(Vec<(String, String)>);

impl Prices {
    pub fn insert(&mut self, label: impl Into<String>, value: impl Into<String>) {
        let label = label.into();
        let value = value.into();
        match self.0.iter_mut().find(|(l, _)| *l == label) {
            Some(entry) => entry.1 = value,
            None => self.0.push((label, value)),
        }
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(l, v)| (l.as_str(), v.as_str()))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(l, _)| l.as_str())
    }
}

impl Serialize for Prices {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

/// One listing's extracted data
#[derive(Debug, Clone, serde::Serialize)]
pub struct PropertyRecord {
    url: String,
    pub title: Option<String>,
    pub address_street: Option<String>,
    /// Normalized area, see [`crate::config::AreaStyle`]
    pub area: Option<String>,
    pub rooms: Option<u32>,
    pub suites: u32,
    pub bathrooms: Option<u32>,
    pub parking_spots: Option<u32>,
    /// Raw floor fragment, e.g. "3º andar"
    pub floor: Option<String>,
    pub pet_allowed: Answer,
    pub furnished: Answer,
    pub near_metro: Answer,
    pub prices: Prices,
    status: Status,
}

impl PropertyRecord {
    /// Create an empty, pending record for a listing URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
            address_street: None,
            area: None,
            rooms: None,
            suites: 0,
            bathrooms: None,
            parking_spots: None,
            floor: None,
            pet_allowed: Answer::No,
            furnished: Answer::Yes,
            near_metro: Answer::No,
            prices: Prices::default(),
            status: Status::Pending,
        }
    }

    /// Create a record that never received any markup
    pub fn failed(url: impl Into<String>, status: Status) -> Self {
        let mut record = Self::new(url);
        record.finish(status);
        record
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Move out of `pending`. Returns false (and changes nothing) if the
    /// record already reached a terminal status.
    pub fn finish(&mut self, status: Status) -> bool {
        if self.status.is_terminal() || !status.is_terminal() {
            return false;
        }
        self.status = status;
        true
    }

    pub fn has_address(&self) -> bool {
        self.address_street.as_deref().is_some_and(|a| !a.is_empty())
    }
}

/// Store `value` only if the slot is still empty
pub fn fill<T>(slot: &mut Option<T>, value: Option<T>) -> bool {
    match (slot.is_none(), value) {
        (true, Some(v)) => {
            *slot = Some(v);
            true
        }
        _ => false,
    }
}

/// Store trimmed text only if the slot is empty and the text is not
pub fn fill_text(slot: &mut Option<String>, value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() || slot.as_deref().is_some_and(|s| !s.is_empty()) {
        return false;
    }
    *slot = Some(value.to_string());
    true
}
