//! Append-only, date-ordered log of lab readings.

use crate::{Field, Measurement, Result, ValidationError};
use serde::{Deserialize, Serialize};

/// Lab readings kept sorted ascending by date
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeasurementLog {
    entries: Vec<Measurement>,
}

impl MeasurementLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and insert a reading, keeping date order.
    ///
    /// Readings that share a date stay in the order they were recorded.
    pub fn record(&mut self, measurement: Measurement) -> Result<()> {
        validate(&measurement)?;

        let idx = self
            .entries
            .partition_point(|m| m.date <= measurement.date);
        tracing::debug!(
            "Recorded measurement for {} at position {}",
            measurement.date,
            idx
        );
        self.entries.insert(idx, measurement);
        Ok(())
    }

    /// All readings, oldest first
    pub fn list(&self) -> &[Measurement] {
        &self.entries
    }

    /// All readings, newest first (display order of the readings table)
    pub fn newest_first(&self) -> impl Iterator<Item = &Measurement> {
        self.entries.iter().rev()
    }

    pub fn latest(&self) -> Option<&Measurement> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Re-check and re-sort readings after deserializing a snapshot
    pub(crate) fn restore_order(&mut self) -> std::result::Result<(), String> {
        for m in &self.entries {
            validate(m).map_err(|e| format!("measurement on {}: {}", m.date, e))?;
        }
        self.entries.sort_by_key(|m| m.date);
        Ok(())
    }
}

fn validate(m: &Measurement) -> std::result::Result<(), ValidationError> {
    if m.viral_load_copies_per_ml.is_none() && m.cd4_count_cells_per_mm3.is_none() {
        return Err(ValidationError::new(
            Field::Measurement,
            "at least one of viral load or CD4 count is required",
        ));
    }
    check_value(Field::ViralLoad, m.viral_load_copies_per_ml)?;
    check_value(Field::Cd4Count, m.cd4_count_cells_per_mm3)?;
    Ok(())
}

fn check_value(field: Field, value: Option<f64>) -> std::result::Result<(), ValidationError> {
    match value {
        Some(v) if !v.is_finite() => Err(ValidationError::new(
            field,
            format!("must be a finite number, got {}", v),
        )),
        Some(v) if v < 0.0 => Err(ValidationError::new(
            field,
            format!("must not be negative, got {}", v),
        )),
        _ => Ok(()),
    }
}
