//! Weekly goal evaluation
//!
//! Each fully observed week is scored against the phase's target weekly
//! change using a tolerance band specific to the phase kind. Two consecutive
//! weeks missing on the same side trigger a calorie adjustment.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{DailyEntry, PhaseKind, PhaseRecord};
use crate::weeks::{weight_change, WeekWindows};

/// Same-side misses needed before calories are adjusted
pub const CONSECUTIVE_WEEKS_TO_ADJUST: u32 = 2;

/// Fixed band for maintenance, lb/week either side of target
pub const MAINTENANCE_TOLERANCE: f64 = 0.20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
  WithinRange,
  LostTooLittle,
  LostTooMuch,
  GainedTooLittle,
  GainedTooMuch,
}

impl std::fmt::Display for GoalStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::WithinRange => write!(f, "within range"),
      Self::LostTooLittle => write!(f, "lost too little"),
      Self::LostTooMuch => write!(f, "lost too much"),
      Self::GainedTooLittle => write!(f, "gained too little"),
      Self::GainedTooMuch => write!(f, "gained too much"),
    }
  }
}

/// Acceptable weekly change, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToleranceBand {
  pub lower: f64,
  pub upper: f64,
}

/// Band around the target for a phase kind.
///
/// Cut: 20% of the target on the fast-loss side, 10% on the slow side.
/// Bulk mirrors it: 10% on the slow-gain side, 20% on the fast side.
/// Maintenance: a flat 0.2 lb either way.
pub fn tolerance_band(kind: PhaseKind, target: f64) -> ToleranceBand {
  match kind {
    PhaseKind::Cut => ToleranceBand {
      lower: target + target * 0.20,
      upper: target + target.abs() * 0.10,
    },
    PhaseKind::Maintain => ToleranceBand {
      lower: target - MAINTENANCE_TOLERANCE,
      upper: target + MAINTENANCE_TOLERANCE,
    },
    PhaseKind::Bulk => ToleranceBand {
      lower: target - target * 0.10,
      upper: target + target * 0.20,
    },
  }
}

pub fn classify_week(kind: PhaseKind, target: f64, observed: f64) -> GoalStatus {
  let band = tolerance_band(kind, target);

  if observed < band.lower {
    match kind {
      PhaseKind::Cut | PhaseKind::Maintain => GoalStatus::LostTooMuch,
      PhaseKind::Bulk => GoalStatus::GainedTooLittle,
    }
  } else if observed > band.upper {
    match kind {
      PhaseKind::Cut => GoalStatus::LostTooLittle,
      PhaseKind::Maintain | PhaseKind::Bulk => GoalStatus::GainedTooMuch,
    }
  } else {
    GoalStatus::WithinRange
  }
}

/// Result of scanning the unsettled weeks of a phase
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoalCheck {
  pub status: GoalStatus,
  /// Sum of the raw weekly changes of the consecutive misses
  pub accumulated: f64,
  /// Number of weeks in `accumulated`
  pub weeks: u32,
  /// Last day with no deviation pending after it
  pub settled_through: Option<NaiveDate>,
  /// Fully observed weeks looked at
  pub weeks_scored: usize,
}

#[derive(Debug, Default)]
struct MissStreak {
  weeks: u32,
  total: f64,
}

impl MissStreak {
  fn push(&mut self, delta: f64) {
    self.weeks += 1;
    self.total += delta;
  }

  fn reset(&mut self) {
    self.weeks = 0;
    self.total = 0.0;
  }
}

/// Walk fully observed weeks from the phase anchor, stopping as soon as one
/// side has missed twice in a row.
pub fn evaluate_weeks(phase: &PhaseRecord, entries: &[DailyEntry], today: NaiveDate) -> GoalCheck {
  let mut below = MissStreak::default();
  let mut above = MissStreak::default();
  let mut settled_through = None;
  let mut weeks_scored = 0;

  let windows = WeekWindows::new(phase.evaluation_anchor(), phase.end_date)
    .take_while(|w| w.is_complete(today));

  for window in windows {
    weeks_scored += 1;

    let change = if window.has_enough_entries(entries) {
      weight_change(entries, &window, phase.start_date)
    } else {
      None
    };

    let Some(change) = change else {
      tracing::debug!(week_start = %window.start, "week has too few entries, skipping");
      below.reset();
      above.reset();
      settled_through = Some(window.end);
      continue;
    };

    let status = classify_week(phase.kind, phase.target_weekly_change, change.total);
    tracing::debug!(
      week_start = %window.start,
      change = change.total,
      target = phase.target_weekly_change,
      %status,
      "scored week"
    );

    if status == GoalStatus::WithinRange {
      below.reset();
      above.reset();
      settled_through = Some(window.end);
      continue;
    }

    let band = tolerance_band(phase.kind, phase.target_weekly_change);
    let streak = if change.total < band.lower {
      above.reset();
      &mut below
    } else {
      below.reset();
      &mut above
    };

    streak.push(change.total);
    if streak.weeks >= CONSECUTIVE_WEEKS_TO_ADJUST {
      return GoalCheck {
        status,
        accumulated: streak.total,
        weeks: streak.weeks,
        settled_through: Some(window.end),
        weeks_scored,
      };
    }
  }

  GoalCheck {
    status: GoalStatus::WithinRange,
    accumulated: 0.0,
    weeks: 0,
    settled_through,
    weeks_scored,
  }
}

/// Fully observed weeks since the anchor with enough entries to score
pub fn qualifying_weeks(phase: &PhaseRecord, entries: &[DailyEntry], today: NaiveDate) -> usize {
  WeekWindows::new(phase.evaluation_anchor(), phase.end_date)
    .take_while(|w| w.is_complete(today))
    .filter(|w| w.has_enough_entries(entries))
    .count()
}
