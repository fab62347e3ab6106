//! Adherence engine: supply status and gap detection over refill histories.
//!
//! The engine owns every medication's refill history and recomputes all
//! derived values on demand:
//! - Current status looks only at the latest-dated refill
//! - Gaps are found pairwise over consecutive refills in fill-date order
//! - Nothing derived is cached, so results never go stale

use crate::dates;
use crate::{
    AdherenceGap, Field, Medication, MedicationSummary, RefillEvent, Result, SupplyStatus,
    ValidationError,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Uncovered days tolerated between refills before a gap is reported
pub const DEFAULT_GAP_TOLERANCE_DAYS: u32 = 3;

/// Owner of all medications and their refill histories
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdherenceEngine {
    medications: Vec<Medication>,
}

impl AdherenceEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a medication, recording its initial fill on `start_date`
    pub fn add_medication(
        &mut self,
        name: &str,
        start_date: NaiveDate,
        initial_supply_days: i64,
    ) -> Result<Uuid> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::new(Field::MedicationName, "must not be empty").into());
        }
        let supply_days = validate_supply(start_date, initial_supply_days)?;

        let medication = Medication {
            id: Uuid::new_v4(),
            name: name.to_string(),
            start_date,
            refill_history: vec![RefillEvent {
                fill_date: start_date,
                supply_days,
            }],
        };
        let id = medication.id;

        tracing::debug!(
            "Added medication {} ({}) starting {} with {} days",
            medication.name,
            id,
            start_date,
            supply_days
        );
        self.medications.push(medication);
        Ok(id)
    }

    /// Record a refill. Early (overlapping) and future-dated fills are accepted.
    pub fn add_refill(
        &mut self,
        medication_id: Uuid,
        fill_date: NaiveDate,
        supply_days: i64,
    ) -> Result<()> {
        let supply_days = validate_supply(fill_date, supply_days)?;
        let medication = self.medication_mut(medication_id)?;

        let event = RefillEvent {
            fill_date,
            supply_days,
        };
        let idx = medication
            .refill_history
            .partition_point(|r| r.fill_date <= fill_date);
        medication.refill_history.insert(idx, event);

        tracing::debug!(
            "Added refill for {} on {} ({} days), {} refills total",
            medication.name,
            fill_date,
            supply_days,
            medication.refill_history.len()
        );
        Ok(())
    }

    /// Supply status on `as_of`, judged by the latest-dated refill alone.
    ///
    /// An earlier refill whose interval outlasts the latest one does not
    /// extend coverage here.
    pub fn current_status(&self, medication_id: Uuid, as_of: NaiveDate) -> Result<SupplyStatus> {
        status_of(self.medication(medication_id)?, as_of)
    }

    /// Uncovered spans longer than `tolerance_days`, ordered by start
    pub fn adherence_gaps(
        &self,
        medication_id: Uuid,
        tolerance_days: u32,
    ) -> Result<Vec<AdherenceGap>> {
        let medication = self.medication(medication_id)?;
        Ok(find_gaps(&medication.refill_history, tolerance_days))
    }

    /// Status and gaps for every medication, in the order they were added
    pub fn summaries(&self, as_of: NaiveDate, tolerance_days: u32) -> Result<Vec<MedicationSummary>> {
        self.medications
            .iter()
            .map(|m| -> Result<MedicationSummary> {
                Ok(MedicationSummary {
                    id: m.id,
                    name: m.name.clone(),
                    start_date: m.start_date,
                    refill_count: m.refill_history.len(),
                    status: status_of(m, as_of)?,
                    gaps: find_gaps(&m.refill_history, tolerance_days),
                })
            })
            .collect()
    }

    pub fn medication(&self, medication_id: Uuid) -> Result<&Medication> {
        self.medications
            .iter()
            .find(|m| m.id == medication_id)
            .ok_or_else(|| unknown_medication(medication_id))
    }

    /// First medication whose name matches, ignoring case
    pub fn find_by_name(&self, name: &str) -> Option<&Medication> {
        let name = name.trim();
        self.medications
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(name))
    }

    /// All medications, in the order they were added
    pub fn medications(&self) -> &[Medication] {
        &self.medications
    }

    pub fn is_empty(&self) -> bool {
        self.medications.is_empty()
    }

    /// Re-check and re-sort histories after deserializing.
    ///
    /// A snapshot edited by hand may break any invariant the mutation
    /// methods uphold: names, supply lengths, at least one fill, ordering.
    pub(crate) fn restore_order(&mut self) -> std::result::Result<(), String> {
        for medication in &mut self.medications {
            if medication.name.trim().is_empty() {
                return Err(format!("medication {} has an empty name", medication.id));
            }
            if medication.refill_history.is_empty() {
                return Err(format!(
                    "medication {} ({}) has no refills",
                    medication.name, medication.id
                ));
            }
            for refill in &medication.refill_history {
                validate_supply(refill.fill_date, i64::from(refill.supply_days)).map_err(|e| {
                    format!(
                        "{} refill on {}: {}",
                        medication.name, refill.fill_date, e
                    )
                })?;
            }
            medication.refill_history.sort_by_key(|r| r.fill_date);
        }
        Ok(())
    }

    fn medication_mut(&mut self, medication_id: Uuid) -> Result<&mut Medication> {
        self.medications
            .iter_mut()
            .find(|m| m.id == medication_id)
            .ok_or_else(|| unknown_medication(medication_id))
    }
}

/// Gap detection over a history sorted ascending by fill date.
///
/// Strictly pairwise: each refill is compared with the next one only, and
/// overlapping intervals are not merged.
pub fn find_gaps(history: &[RefillEvent], tolerance_days: u32) -> Vec<AdherenceGap> {
    history
        .windows(2)
        .filter_map(|pair| {
            let coverage_end = pair[0].coverage_end();
            let next_fill = pair[1].fill_date;
            let uncovered = dates::days_between(coverage_end, next_fill);

            (uncovered > i64::from(tolerance_days)).then(|| AdherenceGap {
                gap_start: coverage_end,
                gap_end: next_fill,
                duration_days: uncovered,
            })
        })
        .collect()
}

fn status_of(medication: &Medication, as_of: NaiveDate) -> Result<SupplyStatus> {
    let last = medication.last_refill().ok_or_else(|| {
        crate::Error::State(format!("medication {} has no refills", medication.id))
    })?;
    let supply_end = last.coverage_end();
    let remaining = dates::days_between(as_of, supply_end);

    if remaining >= 0 {
        Ok(SupplyStatus::Active {
            days_remaining: remaining,
            supply_end,
        })
    } else {
        Ok(SupplyStatus::RefillNeeded {
            supply_end,
            days_overdue: -remaining,
        })
    }
}

/// Positive, and short enough that the coverage end is a real date
fn validate_supply(
    fill_date: NaiveDate,
    supply_days: i64,
) -> std::result::Result<u32, ValidationError> {
    if supply_days <= 0 {
        return Err(ValidationError::new(
            Field::SupplyDays,
            format!("must be positive, got {}", supply_days),
        ));
    }
    let too_large = || {
        ValidationError::new(
            Field::SupplyDays,
            format!("{} days from {} is past the end of the calendar", supply_days, fill_date),
        )
    };
    let days = u32::try_from(supply_days).map_err(|_| too_large())?;
    dates::checked_add_days(fill_date, days).ok_or_else(too_large)?;
    Ok(days)
}

fn unknown_medication(id: Uuid) -> crate::Error {
    ValidationError::new(Field::MedicationId, format!("no medication with id {}", id)).into()
}
