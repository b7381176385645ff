use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One calendar day of logged data: the day's weigh-in plus food totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DailyEntry {
  pub date: NaiveDate,
  /// Bodyweight in pounds
  pub bodyweight: f64,
  pub calories: f64,
  /// Grams
  pub protein: f64,
  pub carbs: f64,
  pub fat: f64,
}

impl DailyEntry {
  /// Entry with a weigh-in and nothing eaten
  pub fn weigh_in(date: NaiveDate, bodyweight: f64) -> Self {
    Self {
      date,
      bodyweight,
      calories: 0.0,
      protein: 0.0,
      carbs: 0.0,
      fat: 0.0,
    }
  }
}

/// For appending a food log line (without id)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFoodLog {
  pub date: NaiveDate,
  pub description: String,
  pub calories: f64,
  pub protein: f64,
  pub carbs: f64,
  pub fat: f64,
}

/// Check that entries are usable by the engine: strictly ascending dates,
/// positive bodyweight, finite non-negative nutrients.
pub fn validate_entries(entries: &[DailyEntry]) -> Result<(), String> {
  for (i, entry) in entries.iter().enumerate() {
    if !entry.bodyweight.is_finite() || entry.bodyweight <= 0.0 {
      return Err(format!(
        "Entry on {} has invalid bodyweight {}",
        entry.date, entry.bodyweight
      ));
    }

    let nutrients = [entry.calories, entry.protein, entry.carbs, entry.fat];
    if nutrients.iter().any(|n| !n.is_finite() || *n < 0.0) {
      return Err(format!("Entry on {} has negative or non-finite nutrients", entry.date));
    }

    if i > 0 && entries[i - 1].date >= entry.date {
      return Err(format!(
        "Entries out of order: {} follows {}",
        entry.date,
        entries[i - 1].date
      ));
    }
  }

  Ok(())
}

/// Most recent entry on or before `date`
pub fn latest_on_or_before(entries: &[DailyEntry], date: NaiveDate) -> Option<&DailyEntry> {
  let idx = entries.partition_point(|e| e.date <= date);
  idx.checked_sub(1).map(|i| &entries[i])
}

#[cfg(test)]
mod tests {
  use super::*;

  fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
  }

  #[test]
  fn test_validate_accepts_sparse_sorted_entries() {
    let entries = vec![
      DailyEntry::weigh_in(day(1), 180.0),
      DailyEntry::weigh_in(day(3), 179.8),
      DailyEntry::weigh_in(day(9), 179.1),
    ];
    assert!(validate_entries(&entries).is_ok());
  }

  #[test]
  fn test_validate_rejects_duplicate_dates() {
    let entries = vec![
      DailyEntry::weigh_in(day(1), 180.0),
      DailyEntry::weigh_in(day(1), 179.8),
    ];
    let err = validate_entries(&entries).unwrap_err();
    assert!(err.contains("out of order"), "got: {}", err);
  }

  #[test]
  fn test_validate_rejects_bad_bodyweight() {
    let entries = vec![DailyEntry::weigh_in(day(1), 0.0)];
    assert!(validate_entries(&entries).is_err());

    let entries = vec![DailyEntry::weigh_in(day(1), f64::NAN)];
    assert!(validate_entries(&entries).is_err());
  }

  #[test]
  fn test_validate_rejects_negative_calories() {
    let mut entry = DailyEntry::weigh_in(day(1), 180.0);
    entry.calories = -20.0;
    assert!(validate_entries(&[entry]).is_err());
  }

  #[test]
  fn test_latest_on_or_before() {
    let entries = vec![
      DailyEntry::weigh_in(day(1), 180.0),
      DailyEntry::weigh_in(day(5), 179.0),
    ];
    assert_eq!(latest_on_or_before(&entries, day(4)).unwrap().bodyweight, 180.0);
    assert_eq!(latest_on_or_before(&entries, day(5)).unwrap().bodyweight, 179.0);
    assert!(latest_on_or_before(&entries, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()).is_none());
  }
}
