//! Text classifier for listing detail fragments
//!
//! A fragment is a short run of text such as "72 m²", "2 quartos (1 suíte)"
//! or "Aceita pet". Each fragment updates at most one field category; the
//! rules are tested in a fixed order and the first match wins.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::AreaStyle;
use crate::record::{fill, fill_text, Answer, PropertyRecord};

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("Invalid number regex"));

static AREA_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*m(?:²|Â²)").expect("Invalid area regex"));

static ROOMS_RE: Lazy<Adjacent> = Lazy::new(|| Adjacent::new("quartos?"));
static SUITES_RE: Lazy<Adjacent> = Lazy::new(|| Adjacent::new("su[ií]tes?"));
static BATHROOMS_RE: Lazy<Adjacent> = Lazy::new(|| Adjacent::new("banheiros?"));
static PARKING_RE: Lazy<Adjacent> = Lazy::new(|| Adjacent::new("vagas?"));

static NO_PARKING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:sem|nenhuma|não\s+possui|não\s+tem)\s+vagas?")
        .expect("Invalid no-parking regex")
});

static FLOOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bandar\b").expect("Invalid floor regex"));

const AREA_MARKERS: [&str; 2] = ["m²", "mÂ²"];
const UNFURNISHED: [&str; 3] = ["sem mobília", "sem mobilia", "sem mobiliá"];

const ROOMS_RANGE: (u32, u32) = (1, 10);
const SUITES_RANGE: (u32, u32) = (1, 5);
const BATHROOMS_RANGE: (u32, u32) = (1, 10);
const PARKING_RANGE: (u32, u32) = (0, 10);

/// A number written right before or right after a keyword
struct Adjacent {
    before: Regex,
    after: Regex,
}

impl Adjacent {
    fn new(keyword: &str) -> Self {
        Self {
            before: Regex::new(&format!(r"(?i)(\d+)\s*{}", keyword))
                .expect("Invalid keyword regex"),
            after: Regex::new(&format!(r"(?i){}\s*:?\s*(\d+)", keyword))
                .expect("Invalid keyword regex"),
        }
    }

    /// First adjacent number inside `range`, preferring the "2 quartos" form
    fn find(&self, text: &str, range: (u32, u32)) -> Option<u32> {
        [&self.before, &self.after]
            .into_iter()
            .filter_map(|re| re.captures(text))
            .filter_map(|caps| caps[1].parse::<u32>().ok())
            .find(|n| (range.0..=range.1).contains(n))
    }
}

/// What a fragment says about the listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate {
    /// Area marker present; `None` if no number could be read
    Area(Option<String>),
    /// Room count, plus a suite count when the fragment mentions suites
    Rooms {
        rooms: Option<u32>,
        suites: Option<u32>,
    },
    Bathrooms(Option<u32>),
    Parking(Option<u32>),
    Floor(String),
    PetsAllowed,
    Unfurnished,
    NearMetro,
}

/// Extract the first integer in the text
pub fn parse_number(text: &str) -> Option<u32> {
    NUMBER_RE.find(text)?.as_str().parse().ok()
}

/// Normalize an area statement such as "72\u{a0}m²"
pub fn clean_area(text: &str, style: AreaStyle) -> Option<String> {
    let text = text.replace('\u{a0}', " ");
    let caps = AREA_RE.captures(&text)?;
    let digits = &caps[1];
    Some(match style {
        AreaStyle::Bare => digits.to_string(),
        AreaStyle::WithUnit => format!("{} m²", digits),
    })
}

/// Decide which field a fragment updates
pub fn classify(text: &str, style: AreaStyle) -> Option<FieldUpdate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let lower = text.to_lowercase();

    if AREA_MARKERS.iter().any(|m| text.contains(m)) && !lower.contains("quarto") {
        return Some(FieldUpdate::Area(clean_area(text, style)));
    }

    if lower.contains("quarto") {
        let suites = (lower.contains("suíte") || lower.contains("suite")).then(|| {
            match SUITES_RE.find(text, SUITES_RANGE) {
                Some(n) => Some(n),
                // keyword without any number means a single suite
                None if !has_number_near_suite(text) => Some(1),
                None => None,
            }
        });
        return Some(FieldUpdate::Rooms {
            rooms: ROOMS_RE.find(text, ROOMS_RANGE),
            suites: suites.flatten(),
        });
    }

    if lower.contains("banheiro") {
        return Some(FieldUpdate::Bathrooms(BATHROOMS_RE.find(text, BATHROOMS_RANGE)));
    }

    if lower.contains("vaga") {
        if NO_PARKING_RE.is_match(text) {
            return Some(FieldUpdate::Parking(Some(0)));
        }
        return Some(FieldUpdate::Parking(PARKING_RE.find(text, PARKING_RANGE)));
    }

    if FLOOR_RE.is_match(text) {
        return Some(FieldUpdate::Floor(text.to_string()));
    }

    if lower.contains("aceita pet") {
        return Some(FieldUpdate::PetsAllowed);
    }

    if UNFURNISHED.iter().any(|p| lower.contains(p)) {
        return Some(FieldUpdate::Unfurnished);
    }

    if lower.contains("metrô") {
        return Some(FieldUpdate::NearMetro);
    }

    None
}

fn has_number_near_suite(text: &str) -> bool {
    SUITES_RE.before.is_match(text) || SUITES_RE.after.is_match(text)
}

impl PropertyRecord {
    /// Classify a fragment and apply it. Returns true if a field changed.
    pub fn update_from_text(&mut self, text: &str, style: AreaStyle) -> bool {
        match classify(text, style) {
            Some(update) => self.apply(update),
            None => false,
        }
    }

    /// Apply a classified fragment, respecting "first writer wins" guards
    pub fn apply(&mut self, update: FieldUpdate) -> bool {
        match update {
            FieldUpdate::Area(area) => fill(&mut self.area, area),
            FieldUpdate::Rooms { rooms, suites } => {
                let rooms_changed = fill(&mut self.rooms, rooms);
                let suites_changed = match suites {
                    Some(n) if self.suites == 0 => {
                        self.suites = n;
                        true
                    }
                    _ => false,
                };
                rooms_changed || suites_changed
            }
            FieldUpdate::Bathrooms(n) => fill(&mut self.bathrooms, n),
            FieldUpdate::Parking(n) => fill(&mut self.parking_spots, n),
            FieldUpdate::Floor(text) => fill_text(&mut self.floor, &text),
            FieldUpdate::PetsAllowed => set_answer(&mut self.pet_allowed, Answer::Yes),
            FieldUpdate::Unfurnished => set_answer(&mut self.furnished, Answer::No),
            FieldUpdate::NearMetro => set_answer(&mut self.near_metro, Answer::Yes),
        }
    }
}

fn set_answer(slot: &mut Answer, value: Answer) -> bool {
    let changed = *slot != value;
    *slot = value;
    changed
}
