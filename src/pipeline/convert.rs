use anyhow::{Result, anyhow};
use chrono::NaiveDate;

use crate::domain::record::RawEmailRecord;
use crate::llm::Converter;
use crate::store::Store;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertReport {
    pub converted: usize,
    pub skipped: usize,
    pub failed: usize,
}

enum Outcome {
    Converted(String),
    Skipped(String),
}

/// Turn every not-yet-converted record in `raw` into a markdown artifact in
/// `out`. The artifact's existence under its derived name is the idempotency
/// marker; converter failures cost one record each and the run continues.
pub fn convert_records(
    raw: &dyn Store,
    out: &dyn Store,
    converter: &dyn Converter,
) -> Result<ConvertReport> {
    let keys: Vec<String> = raw
        .list()?
        .into_iter()
        .filter(|k| k.ends_with(".json"))
        .collect();
    println!("Found {} email files to convert", keys.len());

    let mut report = ConvertReport::default();

    for key in &keys {
        match convert_one(raw, out, converter, key) {
            Ok(Outcome::Converted(name)) => {
                println!("  converted: {name}");
                report.converted += 1;
            }
            Ok(Outcome::Skipped(name)) => {
                log::debug!("skipping {key} ({name} already exists)");
                report.skipped += 1;
            }
            Err(e) => {
                log::warn!("conversion failed for {key}: {e:#}");
                report.failed += 1;
            }
        }
    }

    println!(
        "Conversion complete. Success: {}, skipped: {}, failed: {}",
        report.converted, report.skipped, report.failed
    );
    Ok(report)
}

fn convert_one(
    raw: &dyn Store,
    out: &dyn Store,
    converter: &dyn Converter,
    key: &str,
) -> Result<Outcome> {
    let bytes = raw.read(key)?;
    let record: RawEmailRecord =
        serde_json::from_slice(&bytes).map_err(|e| anyhow!("malformed record {key}: {e}"))?;

    // The plain-text body may be empty; the converter sees it regardless.
    let essay = converter.convert(&record.body.text)?;
    let name = artifact_name(essay.date, &essay.title);

    // Filename-based dedup: two records deriving the same date+title collide
    // and the later one is skipped without re-invoking the converter's write.
    if out.exists(&name) {
        return Ok(Outcome::Skipped(name));
    }

    out.write(&name, essay.content.as_bytes())?;
    Ok(Outcome::Converted(name))
}

/// `"<day> <abbreviated-month> <2-digit-year> <sanitized-title>.md"`.
pub fn artifact_name(date: NaiveDate, title: &str) -> String {
    format!("{} {}.md", date.format("%-d %b %y"), sanitize_title(title))
}

/// Strip filesystem-hostile characters, collapse whitespace runs, trim, and
/// truncate to 150 characters.
fn sanitize_title(title: &str) -> String {
    let stripped: String = title
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*'))
        .collect();
    stripped
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(150)
        .collect()
}
