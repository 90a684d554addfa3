// JSON import/export of zones and of the reading sheet

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use chrono::NaiveDate;

use fiche_engine::sheet::ReadingSheet;
use fiche_engine::zone::Zone;
use fiche_engine::Document;

use crate::error::IoError;

/// `zones-personnalisees-YYYY-MM-DD.json`
pub fn zones_export_filename(date: NaiveDate) -> String {
    format!("zones-personnalisees-{}.json", date.format("%Y-%m-%d"))
}

/// `fiche-lecture-{slug}.json`
pub fn sheet_export_filename(sheet: &ReadingSheet) -> String {
    format!("fiche-lecture-{}.json", sheet.slug())
}

/// Pretty-printed JSON array of every zone, deleted ones included.
pub fn export_zones(zones: &[Zone]) -> Result<String, IoError> {
    Ok(serde_json::to_string_pretty(zones)?)
}

pub fn export_zones_to(zones: &[Zone], path: &Path) -> Result<(), IoError> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, zones)?;
    writer.flush()?;
    log::info!("exported {} zones to {}", zones.len(), path.display());
    Ok(())
}

/// Parse a JSON array of zones. Anything else is rejected.
pub fn parse_zones(json: &str) -> Result<Vec<Zone>, IoError> {
    Ok(serde_json::from_str(json)?)
}

/// Append the zones in `json` to the document. Returns how many were added.
pub fn import_zones(doc: &mut Document, json: &str) -> Result<usize, IoError> {
    let zones = parse_zones(json)?;
    Ok(doc.import_zones(zones))
}

pub fn import_zones_from(doc: &mut Document, path: &Path) -> Result<usize, IoError> {
    let zones: Vec<Zone> = serde_json::from_reader(BufReader::new(File::open(path)?))?;
    let count = doc.import_zones(zones);
    log::info!("imported {} zones from {}", count, path.display());
    Ok(count)
}

pub fn export_sheet(sheet: &ReadingSheet) -> Result<String, IoError> {
    Ok(serde_json::to_string_pretty(sheet)?)
}

pub fn export_sheet_to(sheet: &ReadingSheet, path: &Path) -> Result<(), IoError> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, sheet)?;
    writer.flush()?;
    Ok(())
}

/// Parse an exported sheet. Fields missing from the file keep their
/// empty default; an empty citation list falls back to one blank citation.
pub fn parse_sheet(json: &str) -> Result<ReadingSheet, IoError> {
    let parsed: ReadingSheet = serde_json::from_str(json)?;
    let mut sheet = ReadingSheet::default();
    for (name, value) in parsed.fields() {
        sheet.set_field(name, value);
    }
    if !parsed.citations.is_empty() {
        sheet.citations = parsed.citations;
    }
    Ok(sheet)
}
