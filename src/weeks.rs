//! Week windowing and weekly weight trend
//!
//! Entries are sparse: a day without a weigh-in is simply missing. Weeks are
//! 7-day windows anchored at the phase's evaluation anchor, and a week's
//! weight change is the sum of day-over-day differences of the entries
//! inside it.

use chrono::{Datelike, Duration, NaiveDate};

use crate::models::DailyEntry;

pub const DAYS_PER_WEEK: i64 = 7;

/// Weeks with fewer entries than this carry too little signal to score
pub const MIN_ENTRIES_PER_WEEK: usize = 3;

/// ---------------------------------------------------------------------------
/// Week Windows
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekWindow {
  pub index: usize,
  pub start: NaiveDate,
  /// Inclusive
  pub end: NaiveDate,
}

impl WeekWindow {
  /// Index of the first entry dated on or after the window start
  pub fn first_entry_index(&self, entries: &[DailyEntry]) -> Option<usize> {
    let idx = entries.partition_point(|e| e.date < self.start);
    (idx < entries.len()).then_some(idx)
  }

  pub fn entry_count(&self, entries: &[DailyEntry]) -> usize {
    self.entries(entries).len()
  }

  /// Entries dated within [start, end]
  pub fn entries<'a>(&self, entries: &'a [DailyEntry]) -> &'a [DailyEntry] {
    let lo = entries.partition_point(|e| e.date < self.start);
    let hi = entries.partition_point(|e| e.date <= self.end);
    &entries[lo..hi.max(lo)]
  }

  pub fn has_enough_entries(&self, entries: &[DailyEntry]) -> bool {
    self.entry_count(entries) >= MIN_ENTRIES_PER_WEEK
  }

  /// A week is fully observed once its last day is in the past
  pub fn is_complete(&self, today: NaiveDate) -> bool {
    self.end < today
  }
}

/// Successive 7-day windows from `anchor` until a window would start on or
/// after `end_date`. The last window is truncated to the day before `end_date`.
#[derive(Debug, Clone)]
pub struct WeekWindows {
  next_start: NaiveDate,
  end_date: NaiveDate,
  index: usize,
}

impl WeekWindows {
  pub fn new(anchor: NaiveDate, end_date: NaiveDate) -> Self {
    Self {
      next_start: anchor,
      end_date,
      index: 0,
    }
  }
}

impl Iterator for WeekWindows {
  type Item = WeekWindow;

  fn next(&mut self) -> Option<Self::Item> {
    if self.next_start >= self.end_date {
      return None;
    }

    let start = self.next_start;
    let last_phase_day = self.end_date - Duration::days(1);
    let end = (start + Duration::days(DAYS_PER_WEEK - 1)).min(last_phase_day);
    let window = WeekWindow {
      index: self.index,
      start,
      end,
    };

    self.next_start = start + Duration::days(DAYS_PER_WEEK);
    self.index += 1;
    Some(window)
  }
}

/// ---------------------------------------------------------------------------
/// Weight Trend
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightChange {
  /// Net change over the week, lb
  pub total: f64,
  pub entries: usize,
  pub last_date: NaiveDate,
}

/// Sum of day-over-day weight differences for entries inside the window.
///
/// The first entry of the window is compared with the entry before it, so
/// the week-to-week step is counted. Entries dated before `phase_start`
/// never serve as the comparison point: the first in-phase day contributes
/// zero.
pub fn weight_change(
  entries: &[DailyEntry],
  window: &WeekWindow,
  phase_start: NaiveDate,
) -> Option<WeightChange> {
  let first = window.first_entry_index(entries)?;

  let mut total = 0.0;
  let mut count = 0;
  let mut last_date = None;

  for (k, entry) in entries[first..].iter().enumerate() {
    if entry.date > window.end {
      break;
    }

    let preceding = match (first + k).checked_sub(1).and_then(|p| entries.get(p)) {
      Some(prev) if prev.date >= phase_start => prev.bodyweight,
      _ => entry.bodyweight,
    };

    total += entry.bodyweight - preceding;
    count += 1;
    last_date = Some(entry.date);
  }

  last_date.map(|last_date| WeightChange {
    total,
    entries: count,
    last_date,
  })
}

/// ---------------------------------------------------------------------------
/// Calendar Week Buckets
/// ---------------------------------------------------------------------------

/// Monday of the week containing `date`
pub fn week_monday(date: NaiveDate) -> NaiveDate {
  date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Calendar week number of `date`, counting the week containing
/// `phase_start` as week 0. None before the phase.
pub fn calendar_week_index(date: NaiveDate, phase_start: NaiveDate) -> Option<usize> {
  if date < phase_start {
    return None;
  }
  let weeks = (week_monday(date) - week_monday(phase_start)).num_days() / DAYS_PER_WEEK;
  Some(weeks as usize)
}

/// Entries per Monday-based calendar week since the phase start, indexed by
/// week number. Weeks without entries count zero.
pub fn count_entries_per_week(entries: &[DailyEntry], phase_start: NaiveDate) -> Vec<usize> {
  let mut counts: Vec<usize> = Vec::new();

  for entry in entries {
    let Some(week) = calendar_week_index(entry.date, phase_start) else {
      continue;
    };
    if counts.len() <= week {
      counts.resize(week + 1, 0);
    }
    counts[week] += 1;
  }

  counts
}
