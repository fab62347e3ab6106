//! Demonstration data.
//!
//! Five months of improving lab results and one medication filled on time,
//! built through the same validated operations a user would call.

use crate::{Measurement, Result, Tracker};
use chrono::NaiveDate;

/// (date, viral load copies/mL, CD4 cells/mm³)
const SAMPLE_LABS: &[(&str, f64, f64)] = &[
    ("2025-01-15", 1200.0, 350.0),
    ("2025-02-15", 800.0, 420.0),
    ("2025-03-15", 500.0, 480.0),
    ("2025-04-15", 200.0, 550.0),
    ("2025-05-01", 50.0, 620.0),
];

const SAMPLE_MEDICATION: &str = "Biktarvy";

/// (fill date, supply days); the first entry is the start date
const SAMPLE_REFILLS: &[(&str, i64)] = &[
    ("2025-01-01", 30),
    ("2025-02-01", 30),
    ("2025-03-01", 30),
    ("2025-04-01", 90),
];

/// Build the demonstration tracker
pub fn demo_tracker() -> Result<Tracker> {
    let mut tracker = Tracker::default();

    for &(date, viral_load, cd4) in SAMPLE_LABS {
        tracker
            .measurements
            .record(Measurement::new(date_of(date)?, Some(viral_load), Some(cd4)))?;
    }

    let (start, initial_supply) = SAMPLE_REFILLS[0];
    let id = tracker
        .medications
        .add_medication(SAMPLE_MEDICATION, date_of(start)?, initial_supply)?;
    for &(date, supply) in &SAMPLE_REFILLS[1..] {
        tracker.medications.add_refill(id, date_of(date)?, supply)?;
    }

    tracing::debug!(
        "Built demo tracker: {} measurements, {} refills",
        SAMPLE_LABS.len(),
        SAMPLE_REFILLS.len()
    );
    Ok(tracker)
}

fn date_of(s: &str) -> Result<NaiveDate> {
    Ok(crate::dates::parse_date(s)?)
}
