//! Calorie goal adjustment after a persistent weekly deviation

use serde::{Deserialize, Serialize};

use crate::goals::GoalCheck;
use crate::macro_split::{rebalance, CalorieClamp, MacroProfile, MacroSettings};
use crate::models::phase::KCAL_PER_POUND;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalorieAdjustment {
  pub previous_goal: f64,
  pub requested_goal: f64,
  /// Goal after macro bounds were applied
  pub applied_goal: f64,
  /// kcal/day removed from the goal (negative means added)
  pub daily_delta: f64,
  /// Part of the requested change the macros could not absorb
  pub residual_kcal: f64,
  pub clamped: bool,
  pub clamp: Option<CalorieClamp>,
  pub macros: MacroProfile,
}

/// kcal/day to remove from the goal given `weeks` of observed change
/// summing to `accumulated`. Positive when weight moved up relative to the
/// target (too little loss or too much gain).
pub fn daily_calorie_delta(accumulated: f64, weeks: u32, target_weekly_change: f64) -> f64 {
  if weeks == 0 {
    return 0.0;
  }
  let average = accumulated / weeks as f64;
  (average - target_weekly_change) * KCAL_PER_POUND / 7.0
}

/// Shift the calorie goal by the weekly deviation in `check` and move the
/// macros with it.
pub fn adjust_calories(
  goal_calories: f64,
  macros: &MacroProfile,
  bodyweight: f64,
  target_weekly_change: f64,
  check: &GoalCheck,
  settings: &MacroSettings,
) -> CalorieAdjustment {
  let daily_delta = daily_calorie_delta(check.accumulated, check.weeks, target_weekly_change);
  let requested_goal = goal_calories - daily_delta;

  let split = rebalance(macros, bodyweight, goal_calories, requested_goal, settings);
  let residual_kcal = requested_goal - split.goal_calories;

  tracing::info!(
    status = %check.status,
    previous_goal = goal_calories,
    requested_goal,
    applied_goal = split.goal_calories,
    "adjusted calorie goal"
  );

  CalorieAdjustment {
    previous_goal: goal_calories,
    requested_goal,
    applied_goal: split.goal_calories,
    daily_delta,
    residual_kcal,
    clamped: split.clamp.is_some(),
    clamp: split.clamp,
    macros: split.macros,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::goals::GoalStatus;
  use crate::macro_split::split_macros;

  fn check(status: GoalStatus, accumulated: f64, weeks: u32) -> GoalCheck {
    GoalCheck {
      status,
      accumulated,
      weeks,
      settled_through: None,
      weeks_scored: weeks as usize,
    }
  }

  #[test]
  fn test_delta_for_slow_cut() {
    // Averaging -0.3 against -0.5 is 0.2 lb/week short: 100 kcal/day
    let delta = daily_calorie_delta(-0.6, 2, -0.5);
    assert!((delta - 100.0).abs() < 1e-9);
  }

  #[test]
  fn test_delta_for_slow_bulk_is_negative() {
    let delta = daily_calorie_delta(0.4, 2, 0.5);
    assert!((delta - -150.0).abs() < 1e-9);
  }

  #[test]
  fn test_delta_without_weeks_is_zero() {
    assert_eq!(daily_calorie_delta(-0.6, 0, -0.5), 0.0);
  }

  #[test]
  fn test_lost_too_little_lowers_goal() {
    let settings = MacroSettings::default();
    let macros = split_macros(180.0, 2400.0, &settings).macros;

    let adj = adjust_calories(
      2400.0,
      &macros,
      180.0,
      -0.5,
      &check(GoalStatus::LostTooLittle, -0.6, 2),
      &settings,
    );

    assert!((adj.applied_goal - 2300.0).abs() < 1e-6);
    assert!(!adj.clamped);
    assert_eq!(adj.residual_kcal, 0.0);
    assert!((adj.macros.fat.grams - 55.56).abs() < 0.01);
    assert!((adj.macros.carbs.grams - 270.0).abs() < 1e-6);
  }

  #[test]
  fn test_lost_too_much_raises_goal_through_carbs() {
    let settings = MacroSettings::default();
    let macros = split_macros(180.0, 2400.0, &settings).macros;

    let adj = adjust_calories(
      2400.0,
      &macros,
      180.0,
      -0.5,
      &check(GoalStatus::LostTooMuch, -1.6, 2),
      &settings,
    );

    // -0.8 average is 0.3 lb/week too fast: +150 kcal
    assert!((adj.applied_goal - 2550.0).abs() < 1e-6);
    assert!((adj.macros.carbs.grams - 307.5).abs() < 1e-6);
  }

  #[test]
  fn test_unreachable_goal_is_clamped() {
    let settings = MacroSettings::default();
    let macros = split_macros(180.0, 1000.0, &settings).macros;

    let adj = adjust_calories(
      918.0,
      &macros,
      180.0,
      -0.5,
      &check(GoalStatus::LostTooLittle, 0.0, 2),
      &settings,
    );

    assert!(adj.clamped);
    assert!((adj.applied_goal - 918.0).abs() < 1e-6);
    assert!((adj.residual_kcal - -250.0).abs() < 1e-6);
    assert!(adj.macros.within_bounds());
  }
}
