use crate::models::CatalogItem;
use anyhow::{Context, Result};
use csv::Writer;
use std::io::Write;
use std::path::Path;

const HEADERS: [&str; 10] = [
    "Program_Code",
    "University",
    "Faculty",
    "Department",
    "City",
    "Score_Type",
    "Year",
    "Score",
    "Rank",
    "Quota",
];

/// Write `items` as CSV to `path`, one row per program.
pub fn write_items_csv(path: &Path, items: &[CatalogItem]) -> Result<()> {
    let writer = Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
    write_items(writer, items)
}

pub fn write_items<W: Write>(mut writer: Writer<W>, items: &[CatalogItem]) -> Result<()> {
    writer.write_record(HEADERS)?;

    for item in items {
        let year = item.year.to_string();
        let score = format!("{:.5}", item.score);
        let rank = item.rank.to_string();
        let quota = item.quota.to_string();
        writer.write_record([
            item.id.as_str(),
            item.university_name.as_str(),
            item.faculty.as_str(),
            item.department_name.as_str(),
            item.city.as_str(),
            item.score_type.as_str(),
            year.as_str(),
            score.as_str(),
            rank.as_str(),
            quota.as_str(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
