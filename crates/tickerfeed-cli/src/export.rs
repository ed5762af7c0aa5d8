use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use tickerfeed_core::{AggregatedDataset, NewsRecord};

const HEADER: [&str; 4] = ["TITLE", "LINK", "CONTENT", "RELEASE_TIME"];

/// `<dir>/<base>_<YYYYmmdd_HHMMSS>.csv`
pub fn timestamped_path(dir: &Path, base_name: &str, at: DateTime<Local>) -> PathBuf {
    dir.join(format!("{base_name}_{}.csv", at.format("%Y%m%d_%H%M%S")))
}

/// Write the dataset as CSV under a timestamped name and return the path.
pub fn write_csv(dataset: &AggregatedDataset, base_name: &str, dir: &Path) -> Result<PathBuf> {
    let path = timestamped_path(dir, base_name, Local::now());
    write_csv_to(&dataset.records, &path)?;
    Ok(path)
}

/// Write `records` to exactly `path`, header first, in slice order.
pub fn write_csv_to(records: &[NewsRecord], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    writer.write_record(HEADER)?;
    for record in records {
        writer.write_record([
            &record.title,
            &record.link,
            &record.content,
            &record.release_time,
        ])?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to flush {}", path.display()))?;
    Ok(())
}
