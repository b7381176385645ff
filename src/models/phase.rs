//! Diet phase record and its lifecycle
//!
//! A phase is a time-boxed goal (cut / maintain / bulk) with a target weekly
//! bodyweight change. Phases move through:
//! - scheduled -> active (on or after the start date)
//! - active -> completed (end date reached)
//! - active -> stopped (ended early by a forced decision)
//! - active <-> paused (user action)

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// kcal in one pound of bodyweight
pub const KCAL_PER_POUND: f64 = 3500.0;

/// Largest allowed weekly change as a fraction of start weight
pub const MAX_WEEKLY_RATE: f64 = 0.01;

// ---------------------------------------------------------------------------
/// Phase Kind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    /// Calorie deficit, losing weight
    Cut,
    /// Calorie balance, holding weight
    Maintain,
    /// Calorie surplus, gaining weight
    Bulk,
}

impl PhaseKind {
    /// Allowed phase length in weeks (min, max)
    pub fn duration_bounds(self) -> (u32, u32) {
        match self {
            Self::Cut => (4, 16),
            Self::Maintain => (2, 52),
            Self::Bulk => (4, 26),
        }
    }
}

impl std::fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cut => write!(f, "cut"),
            Self::Maintain => write!(f, "maintain"),
            Self::Bulk => write!(f, "bulk"),
        }
    }
}

impl std::str::FromStr for PhaseKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cut" => Ok(Self::Cut),
            "maintain" | "maintenance" => Ok(Self::Maintain),
            "bulk" => Ok(Self::Bulk),
            _ => Err(format!("Unknown phase kind: {}", s)),
        }
    }
}

// ---------------------------------------------------------------------------
/// Phase Status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    /// Start date still in the future
    #[default]
    Scheduled,
    Active,
    Paused,
    /// Ran to its end date
    Completed,
    /// Ended early
    Stopped,
}

impl std::fmt::Display for PhaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scheduled => write!(f, "scheduled"),
            Self::Active => write!(f, "active"),
            Self::Paused => write!(f, "paused"),
            Self::Completed => write!(f, "completed"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

// ---------------------------------------------------------------------------
/// Error Handling
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PhaseError {
    #[error("End date {end} is before start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },

    #[error("A {kind} lasts {min}-{max} weeks, got {weeks}")]
    DurationOutOfBounds {
        kind: PhaseKind,
        weeks: u32,
        min: u32,
        max: u32,
    },

    #[error("Goal weight {goal} does not suit a {kind} starting at {start}")]
    GoalDirection {
        kind: PhaseKind,
        start: f64,
        goal: f64,
    },

    #[error("Weekly change of {rate:.2} lb exceeds the {limit:.2} lb safety limit")]
    RateTooAggressive { rate: f64, limit: f64 },

    #[error("Weights must be positive")]
    InvalidWeight,

    #[error("Cannot {action} a {status} phase")]
    InvalidTransition {
        action: &'static str,
        status: PhaseStatus,
    },
}

// ---------------------------------------------------------------------------
/// Phase Plan: what the user picks at onboarding
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhasePlan {
    pub kind: PhaseKind,
    pub start_date: NaiveDate,
    /// Ignored for maintenance (goal is the start weight)
    pub goal_weight: f64,
    pub duration_weeks: u32,
}

// ---------------------------------------------------------------------------
/// Phase Record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseRecord {
    pub kind: PhaseKind,
    pub status: PhaseStatus,
    pub start_date: NaiveDate,
    /// First day after the phase
    pub end_date: NaiveDate,
    /// End of the last settled week (start_date until a week settles)
    pub last_checked_date: NaiveDate,
    pub start_weight: f64,
    pub goal_weight: f64,
    /// lb/week, negative for a cut
    pub target_weekly_change: f64,
    pub goal_calories: f64,
    pub duration_weeks: u32,
    pub min_duration_weeks: u32,
    pub max_duration_weeks: u32,
}

impl PhaseRecord {
    /// Build a phase from a plan, validating dates, duration, goal direction
    /// and weekly rate. Calorie goal is TDEE shifted by the target rate.
    pub fn from_plan(
        plan: &PhasePlan,
        start_weight: f64,
        tdee: f64,
        today: NaiveDate,
    ) -> Result<Self, PhaseError> {
        let goal_needed = plan.kind != PhaseKind::Maintain;
        if !(start_weight > 0.0) || (goal_needed && !(plan.goal_weight > 0.0)) {
            return Err(PhaseError::InvalidWeight);
        }

        let (min, max) = plan.kind.duration_bounds();
        if plan.duration_weeks < min || plan.duration_weeks > max {
            return Err(PhaseError::DurationOutOfBounds {
                kind: plan.kind,
                weeks: plan.duration_weeks,
                min,
                max,
            });
        }

        let goal_weight = match plan.kind {
            PhaseKind::Maintain => start_weight,
            _ => plan.goal_weight,
        };

        let direction_ok = match plan.kind {
            PhaseKind::Cut => goal_weight < start_weight,
            PhaseKind::Bulk => goal_weight > start_weight,
            PhaseKind::Maintain => true,
        };
        if !direction_ok {
            return Err(PhaseError::GoalDirection {
                kind: plan.kind,
                start: start_weight,
                goal: goal_weight,
            });
        }

        let target_weekly_change = (goal_weight - start_weight) / plan.duration_weeks as f64;
        let limit = start_weight * MAX_WEEKLY_RATE;
        if target_weekly_change.abs() > limit {
            return Err(PhaseError::RateTooAggressive {
                rate: target_weekly_change,
                limit,
            });
        }

        let end_date = plan.start_date + Duration::weeks(plan.duration_weeks as i64);
        if end_date < plan.start_date {
            return Err(PhaseError::EndBeforeStart {
                start: plan.start_date,
                end: end_date,
            });
        }

        let status = if plan.start_date <= today {
            PhaseStatus::Active
        } else {
            PhaseStatus::Scheduled
        };

        Ok(Self {
            kind: plan.kind,
            status,
            start_date: plan.start_date,
            end_date,
            last_checked_date: plan.start_date,
            start_weight,
            goal_weight,
            target_weekly_change,
            goal_calories: calorie_goal(tdee, target_weekly_change),
            duration_weeks: plan.duration_weeks,
            min_duration_weeks: min,
            max_duration_weeks: max,
        })
    }

    /// Maintenance phase effective today for `weeks` weeks. Used when a phase
    /// is ended early, so the duration may fall under the usual minimum.
    pub fn maintenance_from(today: NaiveDate, weight: f64, weeks: u32, tdee: f64) -> Self {
        let weeks = weeks.max(1);
        let (min, max) = PhaseKind::Maintain.duration_bounds();

        Self {
            kind: PhaseKind::Maintain,
            status: PhaseStatus::Active,
            start_date: today,
            end_date: today + Duration::weeks(weeks as i64),
            last_checked_date: today,
            start_weight: weight,
            goal_weight: weight,
            target_weekly_change: 0.0,
            goal_calories: tdee,
            duration_weeks: weeks,
            min_duration_weeks: min.min(weeks),
            max_duration_weeks: max.max(weeks),
        }
    }

    /// First day of the next window to evaluate
    pub fn evaluation_anchor(&self) -> NaiveDate {
        if self.last_checked_date <= self.start_date {
            self.start_date
        } else {
            self.last_checked_date + Duration::days(1)
        }
    }

    /// Move the high-water mark forward; never backward
    pub fn advance_last_checked(&mut self, date: NaiveDate) {
        if date > self.last_checked_date {
            self.last_checked_date = date;
        }
    }

    /// Whole weeks left (rounded up), at least one
    pub fn remaining_weeks(&self, today: NaiveDate) -> u32 {
        let days = (self.end_date - today).num_days().max(0);
        ((days + 6) / 7).max(1) as u32
    }

    /// True once current weight reaches or passes the goal
    pub fn goal_surpassed(&self, current_weight: f64) -> bool {
        match self.kind {
            PhaseKind::Cut => current_weight <= self.goal_weight,
            PhaseKind::Bulk => current_weight >= self.goal_weight,
            PhaseKind::Maintain => false,
        }
    }

    /// Replace the goal weight mid-phase and re-derive the weekly target
    /// over the remaining weeks.
    pub fn retarget(
        &mut self,
        goal_weight: f64,
        current_weight: f64,
        tdee: f64,
        today: NaiveDate,
    ) -> Result<(), PhaseError> {
        let weeks = self.remaining_weeks(today);

        let direction_ok = match self.kind {
            PhaseKind::Cut => goal_weight < current_weight,
            PhaseKind::Bulk => goal_weight > current_weight,
            PhaseKind::Maintain => true,
        };
        if !direction_ok || goal_weight <= 0.0 {
            return Err(PhaseError::GoalDirection {
                kind: self.kind,
                start: current_weight,
                goal: goal_weight,
            });
        }

        let rate = (goal_weight - current_weight) / weeks as f64;
        let limit = current_weight * MAX_WEEKLY_RATE;
        if rate.abs() > limit {
            return Err(PhaseError::RateTooAggressive { rate, limit });
        }

        self.goal_weight = goal_weight;
        self.target_weekly_change = rate;
        self.goal_calories = calorie_goal(tdee, rate);
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), PhaseError> {
        match self.status {
            PhaseStatus::Active => {
                self.status = PhaseStatus::Paused;
                Ok(())
            }
            status => Err(PhaseError::InvalidTransition {
                action: "pause",
                status,
            }),
        }
    }

    pub fn resume(&mut self) -> Result<(), PhaseError> {
        match self.status {
            PhaseStatus::Paused => {
                self.status = PhaseStatus::Active;
                Ok(())
            }
            status => Err(PhaseError::InvalidTransition {
                action: "resume",
                status,
            }),
        }
    }
}

/// Daily calorie goal for a weekly change rate
pub fn calorie_goal(tdee: f64, weekly_change: f64) -> f64 {
    tdee + weekly_change * KCAL_PER_POUND / 7.0
}
