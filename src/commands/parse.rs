use std::path::Path;

use colored::Colorize;

use quinto::config::Config;
use quinto::error::Result;
use quinto::record::{PropertyRecord, Status};
use quinto::Extractor;

/// Run the extractor over a saved HTML file
pub fn cmd_parse(config: &Config, file: &Path, url: Option<String>, json: bool) -> Result<()> {
    let extractor = Extractor::new(&config.selectors)?;
    let html = std::fs::read_to_string(file)?;
    let url = url.unwrap_or_else(|| file.display().to_string());

    let record = extractor.parse(Some(&html), &url);

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print_record(&record);
    }
    Ok(())
}

fn print_record(record: &PropertyRecord) {
    let status = match record.status() {
        Status::Success => record.status().as_str().green(),
        other => other.as_str().red(),
    };
    println!("{} [{}]", record.url().bold(), status);

    let show = |label: &str, value: Option<String>| {
        let value = value.unwrap_or_else(|| "-".dimmed().to_string());
        println!("  {:<14} {}", format!("{}:", label), value);
    };

    show("Title", record.title.clone());
    show("Address", record.address_street.clone());
    show("Area", record.area.clone());
    show("Rooms", record.rooms.map(|n| n.to_string()));
    show("Suites", Some(record.suites.to_string()));
    show("Bathrooms", record.bathrooms.map(|n| n.to_string()));
    show("Parking", record.parking_spots.map(|n| n.to_string()));
    show("Floor", record.floor.clone());
    show("Pets", Some(record.pet_allowed.to_string()));
    show("Furnished", Some(record.furnished.to_string()));
    show("Near metro", Some(record.near_metro.to_string()));

    if !record.prices.is_empty() {
        println!("  {}:", "Prices".bold());
        for (label, value) in record.prices.iter() {
            println!("    {}: {}", label, value.cyan());
        }
    }
}
