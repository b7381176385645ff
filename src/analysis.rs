//! Deterministic summary of a phase for reporting
//!
//! Groups logged entries into calendar weeks and computes averages and
//! progress. Read-only: nothing here feeds back into calorie adjustment.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::goals::qualifying_weeks;
use crate::models::entry::latest_on_or_before;
use crate::models::{DailyEntry, PhaseKind, PhaseStatus, UserProfile};
use crate::weeks::{calendar_week_index, count_entries_per_week, week_monday, DAYS_PER_WEEK};

/// ---------------------------------------------------------------------------
/// Weekly Summary
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklySummary {
  /// Calendar week number, 0 = week containing the phase start
  pub week: usize,
  /// Monday of the week
  pub week_start: NaiveDate,
  pub entries: usize,
  pub avg_weight: Option<f64>,
  /// Days with food logged
  pub food_days: usize,
  pub avg_calories: Option<f64>,
  pub avg_protein: Option<f64>,
  pub avg_carbs: Option<f64>,
  pub avg_fat: Option<f64>,
}

impl WeeklySummary {
  fn compute(week: usize, week_start: NaiveDate, entries: &[&DailyEntry]) -> Self {
    let food: Vec<_> = entries.iter().filter(|e| e.calories > 0.0).collect();

    Self {
      week,
      week_start,
      entries: entries.len(),
      avg_weight: mean(entries.iter().map(|e| e.bodyweight)),
      food_days: food.len(),
      avg_calories: mean(food.iter().map(|e| e.calories)),
      avg_protein: mean(food.iter().map(|e| e.protein)),
      avg_carbs: mean(food.iter().map(|e| e.carbs)),
      avg_fat: mean(food.iter().map(|e| e.fat)),
    }
  }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
  let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
  (count > 0).then(|| sum / count as f64)
}

/// ---------------------------------------------------------------------------
/// Phase Summary
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseSummary {
  pub kind: PhaseKind,
  pub status: PhaseStatus,
  pub start_date: NaiveDate,
  pub end_date: NaiveDate,
  pub days_elapsed: i64,
  pub start_weight: f64,
  pub goal_weight: f64,
  pub current_weight: Option<f64>,
  /// current - start
  pub total_change: Option<f64>,
  /// Fraction of the start-to-goal distance covered; None for maintenance
  pub progress: Option<f64>,
  pub goal_calories: f64,
  /// Scoreable weeks not yet settled
  pub pending_weeks: usize,
  pub weeks: Vec<WeeklySummary>,
}

impl PhaseSummary {
  pub fn compute(profile: &UserProfile, entries: &[DailyEntry], today: NaiveDate) -> Self {
    let phase = &profile.phase;
    let last_day = today.min(phase.end_date - Duration::days(1));

    let in_phase: Vec<DailyEntry> = entries
      .iter()
      .filter(|e| e.date >= phase.start_date && e.date <= last_day)
      .cloned()
      .collect();

    let weeks = Self::compute_weeks(&in_phase, phase.start_date);

    let current_weight = latest_on_or_before(entries, today).map(|e| e.bodyweight);
    let total_change = current_weight.map(|w| w - phase.start_weight);

    let distance = phase.goal_weight - phase.start_weight;
    let progress = match (phase.kind, total_change) {
      (PhaseKind::Maintain, _) => None,
      (_, Some(change)) if distance.abs() > f64::EPSILON => Some(change / distance),
      _ => None,
    };

    Self {
      kind: phase.kind,
      status: phase.status,
      start_date: phase.start_date,
      end_date: phase.end_date,
      days_elapsed: (last_day - phase.start_date).num_days().max(0),
      start_weight: phase.start_weight,
      goal_weight: phase.goal_weight,
      current_weight,
      total_change,
      progress,
      goal_calories: phase.goal_calories,
      pending_weeks: qualifying_weeks(phase, entries, today),
      weeks,
    }
  }

  fn compute_weeks(entries: &[DailyEntry], phase_start: NaiveDate) -> Vec<WeeklySummary> {
    let counts = count_entries_per_week(entries, phase_start);
    let first_monday = week_monday(phase_start);

    (0..counts.len())
      .map(|week| {
        let in_week: Vec<&DailyEntry> = entries
          .iter()
          .filter(|e| calendar_week_index(e.date, phase_start) == Some(week))
          .collect();
        let week_start = first_monday + Duration::days(week as i64 * DAYS_PER_WEEK);
        WeeklySummary::compute(week, week_start, &in_week)
      })
      .collect()
  }
}
