//! Core domain types for the adherence tracker.
//!
//! This module defines the fundamental types used throughout the system:
//! - Lab measurements (viral load and CD4 count)
//! - Medications and their refill events
//! - Derived adherence values (gaps, supply status, summaries)

use crate::dates;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Lab Measurements
// ============================================================================

/// A single lab reading. Either channel may be missing, but not both.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Measurement {
    pub date: NaiveDate,
    pub viral_load_copies_per_ml: Option<f64>,
    pub cd4_count_cells_per_mm3: Option<f64>,
}

impl Measurement {
    pub fn new(
        date: NaiveDate,
        viral_load_copies_per_ml: Option<f64>,
        cd4_count_cells_per_mm3: Option<f64>,
    ) -> Self {
        Self {
            date,
            viral_load_copies_per_ml,
            cd4_count_cells_per_mm3,
        }
    }
}

// ============================================================================
// Medications
// ============================================================================

/// One pharmacy fill. Covers `[fill_date, fill_date + supply_days)`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefillEvent {
    pub fill_date: NaiveDate,
    pub supply_days: u32,
}

impl RefillEvent {
    /// Exclusive end of the coverage interval
    pub fn coverage_end(&self) -> NaiveDate {
        dates::add_days(self.fill_date, self.supply_days)
    }
}

/// A tracked medication and its refill history (ascending by fill date)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Medication {
    pub id: Uuid,
    pub name: String,
    pub start_date: NaiveDate,
    pub refill_history: Vec<RefillEvent>,
}

impl Medication {
    /// The latest-dated refill; among equal dates, the one added last
    pub fn last_refill(&self) -> Option<&RefillEvent> {
        self.refill_history.last()
    }
}

// ============================================================================
// Derived Values
// ============================================================================

/// An uncovered span between two coverage intervals
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdherenceGap {
    /// Exclusive end of the earlier coverage interval
    pub gap_start: NaiveDate,
    /// Fill date of the next refill
    pub gap_end: NaiveDate,
    pub duration_days: i64,
}

/// Whether the most recent refill still covers a given day
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SupplyStatus {
    Active {
        days_remaining: i64,
        supply_end: NaiveDate,
    },
    RefillNeeded {
        supply_end: NaiveDate,
        days_overdue: i64,
    },
}

impl SupplyStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, SupplyStatus::Active { .. })
    }

    /// Days of supply left, `None` once a refill is needed
    pub fn days_remaining(&self) -> Option<i64> {
        match self {
            SupplyStatus::Active { days_remaining, .. } => Some(*days_remaining),
            SupplyStatus::RefillNeeded { .. } => None,
        }
    }
}

/// Everything a medication card shows: status plus gap history
#[derive(Clone, Debug, Serialize)]
pub struct MedicationSummary {
    pub id: Uuid,
    pub name: String,
    pub start_date: NaiveDate,
    pub refill_count: usize,
    pub status: SupplyStatus,
    pub gaps: Vec<AdherenceGap>,
}
