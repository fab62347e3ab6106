//! CSV export of the tracker tables, and bulk import of lab readings.
//!
//! Exports rewrite the target file in full. Imports validate every row the
//! same way `MeasurementLog::record` does and skip the rows that fail.

use crate::dates;
use crate::{AdherenceEngine, Measurement, MeasurementLog, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A row in the measurements CSV (both directions)
#[derive(Debug, Serialize, Deserialize)]
struct MeasurementRow {
    date: String,
    viral_load_copies_per_ml: Option<f64>,
    cd4_count_cells_per_mm3: Option<f64>,
}

impl From<&Measurement> for MeasurementRow {
    fn from(m: &Measurement) -> Self {
        MeasurementRow {
            date: m.date.to_string(),
            viral_load_copies_per_ml: m.viral_load_copies_per_ml,
            cd4_count_cells_per_mm3: m.cd4_count_cells_per_mm3,
        }
    }
}

impl TryFrom<MeasurementRow> for Measurement {
    type Error = crate::Error;

    fn try_from(row: MeasurementRow) -> Result<Self> {
        let date = dates::parse_date(&row.date)?;
        Ok(Measurement::new(
            date,
            row.viral_load_copies_per_ml,
            row.cd4_count_cells_per_mm3,
        ))
    }
}

#[derive(Debug, Serialize)]
struct RefillRow<'a> {
    medication_id: String,
    medication: &'a str,
    fill_date: String,
    supply_days: u32,
    coverage_end: String,
}

#[derive(Debug, Serialize)]
struct GapRow<'a> {
    medication_id: String,
    medication: &'a str,
    gap_start: String,
    gap_end: String,
    duration_days: i64,
}

/// Outcome of a bulk import
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
}

/// Write all lab readings, oldest first. Returns the number of rows.
pub fn export_measurements(log: &MeasurementLog, path: &Path) -> Result<usize> {
    let mut writer = writer_for(path)?;
    for m in log.list() {
        writer.serialize(MeasurementRow::from(m))?;
    }
    writer.flush()?;

    tracing::info!("Exported {} measurements to {:?}", log.len(), path);
    Ok(log.len())
}

/// Write every refill of every medication with its coverage end
pub fn export_refills(engine: &AdherenceEngine, path: &Path) -> Result<usize> {
    let mut writer = writer_for(path)?;
    let mut count = 0;

    for med in engine.medications() {
        for refill in &med.refill_history {
            writer.serialize(RefillRow {
                medication_id: med.id.to_string(),
                medication: &med.name,
                fill_date: refill.fill_date.to_string(),
                supply_days: refill.supply_days,
                coverage_end: refill.coverage_end().to_string(),
            })?;
            count += 1;
        }
    }
    writer.flush()?;

    tracing::info!("Exported {} refills to {:?}", count, path);
    Ok(count)
}

/// Write the adherence gaps of every medication
pub fn export_gaps(engine: &AdherenceEngine, tolerance_days: u32, path: &Path) -> Result<usize> {
    let mut writer = writer_for(path)?;
    let mut count = 0;

    for med in engine.medications() {
        for gap in engine.adherence_gaps(med.id, tolerance_days)? {
            writer.serialize(GapRow {
                medication_id: med.id.to_string(),
                medication: &med.name,
                gap_start: gap.gap_start.to_string(),
                gap_end: gap.gap_end.to_string(),
                duration_days: gap.duration_days,
            })?;
            count += 1;
        }
    }
    writer.flush()?;

    tracing::info!("Exported {} adherence gaps to {:?}", count, path);
    Ok(count)
}

/// Record every valid row of a measurements CSV into `log`
pub fn import_measurements(log: &mut MeasurementLog, path: &Path) -> Result<ImportReport> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)?;
    let mut report = ImportReport::default();

    for (idx, result) in reader.deserialize::<MeasurementRow>().enumerate() {
        let line = idx + 2;
        let outcome = result
            .map_err(crate::Error::from)
            .and_then(Measurement::try_from)
            .and_then(|m| log.record(m));

        match outcome {
            Ok(()) => report.imported += 1,
            Err(e) => {
                tracing::warn!("Skipping measurement row at line {}: {}", line, e);
                report.skipped += 1;
            }
        }
    }

    tracing::info!(
        "Imported {} measurements from {:?} ({} skipped)",
        report.imported,
        path,
        report.skipped
    );
    Ok(report)
}

fn writer_for(path: &Path) -> Result<csv::Writer<std::fs::File>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(csv::Writer::from_path(path)?)
}
