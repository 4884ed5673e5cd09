//! Tabular output and run summary

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};
use colored::Colorize;

use crate::config::OutputConfig;
use crate::error::Result;
use crate::record::{PropertyRecord, Status};

/// Columns present in every row, before the price columns
pub const FIXED_COLUMNS: [&str; 13] = [
    "url",
    "status",
    "title",
    "address_street",
    "area",
    "rooms",
    "suites",
    "bathrooms",
    "parking_spots",
    "floor",
    "pet_allowed",
    "furnished",
    "near_metro",
];

/// Excel needs the byte order mark to read UTF-8 correctly
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Union of all price labels across records, in first-seen order
pub fn price_columns(records: &[PropertyRecord]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for label in records.iter().flat_map(|r| r.prices.labels()) {
        if !columns.iter().any(|c| c == label) {
            columns.push(label.to_string());
        }
    }
    columns
}

fn opt<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}

/// Flatten a record into one row matching `FIXED_COLUMNS` + `price_columns`
pub fn to_row(record: &PropertyRecord, price_columns: &[String]) -> Vec<String> {
    let mut row = vec![
        record.url().to_string(),
        record.status().to_string(),
        opt(&record.title),
        opt(&record.address_street),
        opt(&record.area),
        opt(&record.rooms),
        record.suites.to_string(),
        opt(&record.bathrooms),
        opt(&record.parking_spots),
        opt(&record.floor),
        record.pet_allowed.to_string(),
        record.furnished.to_string(),
        record.near_metro.to_string(),
    ];
    row.extend(
        price_columns
            .iter()
            .map(|label| record.prices.get(label).unwrap_or_default().to_string()),
    );
    row
}

/// Write records as CSV (with BOM) to any writer
pub fn write_csv<W: Write>(mut out: W, records: &[PropertyRecord]) -> Result<()> {
    out.write_all(UTF8_BOM)?;

    let prices = price_columns(records);
    let mut writer = csv::Writer::from_writer(out);

    let header: Vec<&str> = FIXED_COLUMNS
        .iter()
        .copied()
        .chain(prices.iter().map(String::as_str))
        .collect();
    writer.write_record(&header)?;

    for record in records {
        writer.write_record(to_row(record, &prices))?;
    }
    writer.flush()?;
    Ok(())
}

/// Write records to a CSV file, creating parent directories
pub fn save_csv(path: &Path, records: &[PropertyRecord]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    write_csv(BufWriter::new(file), records)
}

/// Timestamped results file, e.g. `database/data/quintoandar_tatuape_20250101_120000.csv`
pub fn default_output_file<Tz: TimeZone>(
    output: &OutputConfig,
    neighborhood: &str,
    now: &DateTime<Tz>,
) -> PathBuf
where
    Tz::Offset: std::fmt::Display,
{
    output.data_dir().join(format!(
        "quintoandar_{}_{}.csv",
        neighborhood,
        now.format("%Y%m%d_%H%M%S")
    ))
}

/// Run statistics shown after a scrape
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total: usize,
    pub successful: usize,
    pub with_address: usize,
    /// Mean of the numeric areas, if any record has one
    pub average_area: Option<f64>,
    /// Listings per room count
    pub rooms: BTreeMap<u32, usize>,
}

impl Summary {
    pub fn from_records(records: &[PropertyRecord]) -> Self {
        let areas: Vec<f64> = records
            .iter()
            .filter_map(|r| r.area.as_deref())
            .filter_map(area_value)
            .collect();

        let mut rooms = BTreeMap::new();
        for count in records.iter().filter_map(|r| r.rooms) {
            *rooms.entry(count).or_insert(0) += 1;
        }

        Self {
            total: records.len(),
            successful: records
                .iter()
                .filter(|r| r.status() == Status::Success)
                .count(),
            with_address: records.iter().filter(|r| r.has_address()).count(),
            average_area: (!areas.is_empty())
                .then(|| areas.iter().sum::<f64>() / areas.len() as f64),
            rooms,
        }
    }

    pub fn success_rate(&self) -> f64 {
        percent(self.successful, self.total)
    }

    pub fn address_rate(&self) -> f64 {
        percent(self.with_address, self.total)
    }

    pub fn print(&self) {
        println!("\n{}", "Summary".bold());
        println!("  Total properties:    {}", self.total.to_string().cyan());
        println!("  Successfully parsed: {}", self.successful.to_string().green());
        println!("  With addresses:      {}", self.with_address.to_string().cyan());
        println!("  Success rate:        {:.1}%", self.success_rate());
        println!("  Address rate:        {:.1}%", self.address_rate());

        if let Some(area) = self.average_area {
            println!("  Average area:        {:.1} m²", area);
        }

        if !self.rooms.is_empty() {
            println!("  {}:", "Rooms".bold());
            for (rooms, count) in &self.rooms {
                println!("    {}: {}", rooms, count.to_string().cyan());
            }
        }
    }
}

/// Numeric part of an area string ("72" or "72 m²")
fn area_value(area: &str) -> Option<f64> {
    area.split_whitespace().next()?.parse().ok()
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}
