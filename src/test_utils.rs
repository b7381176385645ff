//! Test utilities and helpers for unit testing
//!
//! This module provides common test infrastructure including:
//! - Database setup/teardown
//! - Entry and profile factories
//! - Scripted decision provider

use std::collections::VecDeque;

use chrono::{Duration, NaiveDate};
use sqlx::SqlitePool;

use crate::macro_split::{split_macros, MacroSettings};
use crate::models::{
  ActivityLevel, DailyEntry, PhaseKind, PhaseRecord, PhaseStatus, Sex, UserProfile,
};
use crate::progression::{
  DecisionProvider, GoalDecision, GoalSurpassed, ThresholdDecision,
};
use crate::threshold::ThresholdBreach;

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database for testing
/// Runs all migrations and returns a ready-to-use pool
///
/// Uses max_connections(1) to prevent multiple pool connections from creating
/// isolated in-memory databases, which would cause intermittent test failures
pub async fn setup_test_db() -> SqlitePool {
  let pool = sqlx::sqlite::SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await
    .expect("Failed to create in-memory database");

  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .expect("Failed to run migrations");

  pool
}

/// Close a test database pool
pub async fn teardown_test_db(pool: SqlitePool) {
  pool.close().await;
}

/// ---------------------------------------------------------------------------
/// Entry Factories
/// ---------------------------------------------------------------------------

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
}

/// One weigh-in per consecutive day starting at `start`
pub fn daily_entries(start: NaiveDate, weights: &[f64]) -> Vec<DailyEntry> {
  weights
    .iter()
    .enumerate()
    .map(|(i, &w)| DailyEntry::weigh_in(start + Duration::days(i as i64), w))
    .collect()
}

/// Seven daily weigh-ins per week, moving linearly so each week's
/// day-over-day sum equals its entry in `weekly_changes`.
///
/// The first in-phase day contributes nothing, so week one spreads its change
/// over six steps. Later weeks use seven, counting the step from the
/// previous week's last day.
pub fn weekly_entries(start: NaiveDate, start_weight: f64, weekly_changes: &[f64]) -> Vec<DailyEntry> {
  let mut weights = vec![start_weight];
  let mut level = start_weight;

  for (week, &change) in weekly_changes.iter().enumerate() {
    let steps = if week == 0 { 6 } else { 7 };
    for step in 1..=steps {
      weights.push(level + change * step as f64 / steps as f64);
    }
    level += change;
  }

  daily_entries(start, &weights)
}

/// ---------------------------------------------------------------------------
/// Profile Factories
/// ---------------------------------------------------------------------------

/// Active 12-week cut starting at 181.1 lb, 2400 kcal goal
pub fn mock_cut_phase(start: NaiveDate, target_weekly_change: f64) -> PhaseRecord {
  PhaseRecord {
    kind: PhaseKind::Cut,
    status: PhaseStatus::Active,
    start_date: start,
    end_date: start + Duration::weeks(12),
    last_checked_date: start,
    start_weight: 181.1,
    goal_weight: 175.1,
    target_weekly_change,
    goal_calories: 2400.0,
    duration_weeks: 12,
    min_duration_weeks: 4,
    max_duration_weeks: 16,
  }
}

/// 180 lb user with a 2650 kcal TDEE on a -0.5 lb/week cut
pub fn mock_profile(phase_start: NaiveDate) -> UserProfile {
  UserProfile {
    name: "Test User".to_string(),
    sex: Sex::Male,
    bodyweight: 180.0,
    height_cm: 180.0,
    age: 30,
    activity_level: ActivityLevel::ModeratelyActive,
    tdee: 2650.0,
    macros: split_macros(180.0, 2400.0, &MacroSettings::default()).macros,
    phase: mock_cut_phase(phase_start, -0.5),
    phase_history: Vec::new(),
  }
}

/// ---------------------------------------------------------------------------
/// Decision Provider
/// ---------------------------------------------------------------------------

/// Replays queued answers. An unexpected prompt is an error, so tests catch
/// decisions the engine should not have asked for.
#[derive(Debug, Default)]
pub struct ScriptedDecisions {
  pub threshold: VecDeque<ThresholdDecision>,
  pub goal: VecDeque<GoalDecision>,
  pub threshold_calls: usize,
  pub goal_calls: usize,
}

impl ScriptedDecisions {
  pub fn with_threshold(decisions: Vec<ThresholdDecision>) -> Self {
    Self {
      threshold: decisions.into(),
      ..Self::default()
    }
  }

  pub fn with_goal(decisions: Vec<GoalDecision>) -> Self {
    Self {
      goal: decisions.into(),
      ..Self::default()
    }
  }
}

impl DecisionProvider for ScriptedDecisions {
  fn on_threshold(&mut self, _breach: &ThresholdBreach) -> Result<ThresholdDecision, String> {
    self.threshold_calls += 1;
    self
      .threshold
      .pop_front()
      .ok_or_else(|| "no scripted threshold decision".to_string())
  }

  fn on_goal_surpassed(&mut self, _context: &GoalSurpassed) -> Result<GoalDecision, String> {
    self.goal_calls += 1;
    self
      .goal
      .pop_front()
      .ok_or_else(|| "no scripted goal decision".to_string())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_weekly_entries_shape() {
    let entries = weekly_entries(date(2024, 1, 1), 181.1, &[-0.3, -0.3]);

    assert_eq!(entries.len(), 14);
    assert_eq!(entries[0].bodyweight, 181.1);
    assert!((entries[6].bodyweight - 180.8).abs() < 1e-9);
    assert!((entries[13].bodyweight - 180.5).abs() < 1e-9);
    assert_eq!(entries[13].date, date(2024, 1, 14));
  }

  #[tokio::test]
  async fn test_setup_test_db_runs_migrations() {
    let pool = setup_test_db().await;

    let tables: Vec<(String,)> =
      sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
        .fetch_all(&pool)
        .await
        .unwrap();
    let names: Vec<&str> = tables.iter().map(|(n,)| n.as_str()).collect();

    assert!(names.contains(&"weigh_ins"));
    assert!(names.contains(&"food_logs"));
    assert!(names.contains(&"user_profile"));

    teardown_test_db(pool).await;
  }
}
