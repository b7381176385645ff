//! Adaptive Phase Progress Engine
//!
//! One evaluation pass over a profile snapshot and its logged entries:
//! - activate a scheduled phase once its start date arrives
//! - close a phase that reached its end date
//! - check the cumulative-change safety threshold
//! - score fully observed weeks and adjust calories after two same-side misses
//!
//! Key principles:
//! - Pure: takes `&UserProfile`, returns a new one inside `Evaluation`
//! - Forced decisions go through a `DecisionProvider`, never stdin directly
//! - `last_checked_date` only moves forward, so re-running is harmless

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calories::{adjust_calories, CalorieAdjustment};
use crate::goals::{evaluate_weeks, qualifying_weeks, GoalStatus, CONSECUTIVE_WEEKS_TO_ADJUST};
use crate::macro_split::{rebalance, split_macros, MacroSettings, MacroSplit};
use crate::models::entry::{latest_on_or_before, validate_entries};
use crate::models::{DailyEntry, PhaseError, PhaseKind, PhasePlan, PhaseRecord, PhaseStatus, UserProfile};
use crate::threshold::{check_threshold, ThresholdBreach};

// ---------------------------------------------------------------------------
/// Error Handling
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid entry data: {0}")]
    Data(String),

    #[error(transparent)]
    Phase(#[from] PhaseError),

    #[error("Decision provider failed: {0}")]
    Decision(String),
}

// ---------------------------------------------------------------------------
/// Decisions: what the user chooses when the engine cannot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdDecision {
    /// Stop the phase and hold the current weight for the remaining weeks
    SwitchToMaintenance,
    StartNewPhase(PhasePlan),
    Continue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalDecision {
    /// New goal weight for the rest of the phase
    AdjustGoal(f64),
    StartNewPhase(PhasePlan),
    Continue,
}

/// Context for a phase whose goal is already met when it activates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoalSurpassed {
    pub kind: PhaseKind,
    pub goal_weight: f64,
    pub current_weight: f64,
    pub start_date: NaiveDate,
}

pub trait DecisionProvider {
    fn on_threshold(&mut self, breach: &ThresholdBreach) -> Result<ThresholdDecision, String>;

    fn on_goal_surpassed(&mut self, context: &GoalSurpassed) -> Result<GoalDecision, String>;
}

// ---------------------------------------------------------------------------
/// Evaluation Result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseChange {
    SwitchedToMaintenance,
    NewPhase,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Scheduled phase, start date still ahead
    NotStarted,
    /// Paused or already finished, nothing evaluated
    Inactive(PhaseStatus),
    /// End date reached during this pass
    Completed,
    /// Phase replaced by a forced decision
    PhaseChanged(PhaseChange),
    InsufficientData { qualifying_weeks: usize },
    OnTrack { weeks_scored: usize },
    Adjusted {
        status: GoalStatus,
        adjustment: CalorieAdjustment,
    },
}

#[derive(Debug, Clone)]
pub struct Evaluation {
    pub profile: UserProfile,
    pub outcome: Outcome,
    /// User-facing notes collected during the pass
    pub messages: Vec<String>,
    /// Latest logged weight on or before the evaluation date
    pub current_weight: f64,
}

// ---------------------------------------------------------------------------
/// Progress Engine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct ProgressEngine {
    pub settings: MacroSettings,
}

impl ProgressEngine {
    pub fn new(settings: MacroSettings) -> Self {
        Self { settings }
    }

    pub fn evaluate(
        &self,
        profile: &UserProfile,
        entries: &[DailyEntry],
        today: NaiveDate,
        decisions: &mut dyn DecisionProvider,
    ) -> Result<Evaluation, EngineError> {
        validate_entries(entries).map_err(EngineError::Data)?;

        let current_weight = latest_on_or_before(entries, today)
            .map(|e| e.bodyweight)
            .unwrap_or(profile.bodyweight);

        let mut pass = Pass {
            settings: &self.settings,
            profile: profile.clone(),
            messages: Vec::new(),
            current_weight,
            today,
        };
        let outcome = pass.run(entries, decisions)?;

        Ok(Evaluation {
            profile: pass.profile,
            outcome,
            messages: pass.messages,
            current_weight,
        })
    }
}

/// Mutable state of one evaluation
struct Pass<'a> {
    settings: &'a MacroSettings,
    profile: UserProfile,
    messages: Vec<String>,
    current_weight: f64,
    today: NaiveDate,
}

impl Pass<'_> {
    fn run(
        &mut self,
        entries: &[DailyEntry],
        decisions: &mut dyn DecisionProvider,
    ) -> Result<Outcome, EngineError> {
        match self.profile.phase.status {
            PhaseStatus::Paused | PhaseStatus::Completed | PhaseStatus::Stopped => {
                return Ok(Outcome::Inactive(self.profile.phase.status));
            }
            PhaseStatus::Scheduled => {
                if self.today < self.profile.phase.start_date {
                    return Ok(Outcome::NotStarted);
                }
                if let Some(outcome) = self.activate(decisions)? {
                    return Ok(outcome);
                }
            }
            PhaseStatus::Active => {}
        }

        if self.today >= self.profile.phase.end_date {
            self.profile.phase.status = PhaseStatus::Completed;
            tracing::info!(kind = %self.profile.phase.kind, "phase completed");
            self.messages
                .push(format!("Your {} phase has ended.", self.profile.phase.kind));
            return Ok(Outcome::Completed);
        }

        if let Some(breach) = check_threshold(&self.profile.phase, self.current_weight) {
            if let Some(outcome) = self.handle_breach(&breach, decisions)? {
                return Ok(outcome);
            }
        }

        self.score_weeks(entries)
    }

    /// Scheduled -> active. Returns an outcome when the goal-surpassed
    /// decision replaced the phase.
    fn activate(&mut self, decisions: &mut dyn DecisionProvider) -> Result<Option<Outcome>, EngineError> {
        let phase = &mut self.profile.phase;
        phase.status = PhaseStatus::Active;
        phase.start_weight = self.current_weight;
        phase.last_checked_date = phase.start_date;

        tracing::info!(
            kind = %phase.kind,
            start_weight = self.current_weight,
            "phase activated"
        );
        self.messages.push(format!(
            "Your {} phase has started at {:.1} lb.",
            phase.kind, self.current_weight
        ));

        if !phase.goal_surpassed(self.current_weight) {
            return Ok(None);
        }

        let context = GoalSurpassed {
            kind: phase.kind,
            goal_weight: phase.goal_weight,
            current_weight: self.current_weight,
            start_date: phase.start_date,
        };
        let decision = decisions
            .on_goal_surpassed(&context)
            .map_err(EngineError::Decision)?;

        match decision {
            GoalDecision::AdjustGoal(goal_weight) => {
                let previous_goal = self.profile.phase.goal_calories;
                self.profile.phase.retarget(
                    goal_weight,
                    self.current_weight,
                    self.profile.tdee,
                    self.today,
                )?;
                let target = self.profile.phase.goal_calories;
                let split = rebalance(
                    &self.profile.macros,
                    self.profile.bodyweight,
                    previous_goal,
                    target,
                    self.settings,
                );
                self.apply_split(split);
                self.messages
                    .push(format!("Goal weight changed to {:.1} lb.", goal_weight));
                Ok(None)
            }
            GoalDecision::StartNewPhase(plan) => {
                self.start_new_phase(&plan)?;
                Ok(Some(Outcome::PhaseChanged(PhaseChange::NewPhase)))
            }
            GoalDecision::Continue => Ok(None),
        }
    }

    fn handle_breach(
        &mut self,
        breach: &ThresholdBreach,
        decisions: &mut dyn DecisionProvider,
    ) -> Result<Option<Outcome>, EngineError> {
        tracing::warn!(
            kind = %breach.kind,
            change = breach.change,
            limit = breach.limit,
            "cumulative weight change past threshold"
        );

        match decisions.on_threshold(breach).map_err(EngineError::Decision)? {
            ThresholdDecision::SwitchToMaintenance => {
                let weeks = self.profile.phase.remaining_weeks(self.today);
                let maintenance = PhaseRecord::maintenance_from(
                    self.today,
                    self.current_weight,
                    weeks,
                    self.profile.tdee,
                );
                self.replace_phase(maintenance);
                self.messages.push(format!(
                    "Switched to maintenance at {:.1} lb for {} weeks.",
                    self.current_weight, weeks
                ));
                Ok(Some(Outcome::PhaseChanged(PhaseChange::SwitchedToMaintenance)))
            }
            ThresholdDecision::StartNewPhase(plan) => {
                self.start_new_phase(&plan)?;
                Ok(Some(Outcome::PhaseChanged(PhaseChange::NewPhase)))
            }
            ThresholdDecision::Continue => Ok(None),
        }
    }

    fn score_weeks(&mut self, entries: &[DailyEntry]) -> Result<Outcome, EngineError> {
        let phase = &self.profile.phase;
        let qualifying = qualifying_weeks(phase, entries, self.today);
        if qualifying < CONSECUTIVE_WEEKS_TO_ADJUST as usize {
            tracing::debug!(qualifying, "not enough scoreable weeks");
            return Ok(Outcome::InsufficientData {
                qualifying_weeks: qualifying,
            });
        }

        let check = evaluate_weeks(phase, entries, self.today);
        if let Some(settled) = check.settled_through {
            self.profile.phase.advance_last_checked(settled);
        }

        if check.status == GoalStatus::WithinRange {
            return Ok(Outcome::OnTrack {
                weeks_scored: check.weeks_scored,
            });
        }

        let phase = &self.profile.phase;
        let adjustment = adjust_calories(
            phase.goal_calories,
            &self.profile.macros,
            self.profile.bodyweight,
            phase.target_weekly_change,
            &check,
            self.settings,
        );

        self.profile.phase.goal_calories = adjustment.applied_goal;
        self.profile.macros = adjustment.macros;

        self.messages.push(format!(
            "You {} for {} weeks. Calorie goal changed from {:.0} to {:.0} kcal.",
            check.status, check.weeks, adjustment.previous_goal, adjustment.applied_goal
        ));
        if adjustment.clamped {
            self.messages.push(format!(
                "Macro limits only allowed {:.0} of the requested {:.0} kcal.",
                adjustment.applied_goal, adjustment.requested_goal
            ));
        }

        Ok(Outcome::Adjusted {
            status: check.status,
            adjustment,
        })
    }

    fn start_new_phase(&mut self, plan: &PhasePlan) -> Result<(), EngineError> {
        let next = PhaseRecord::from_plan(plan, self.current_weight, self.profile.tdee, self.today)?;
        self.messages.push(format!(
            "Started a new {} phase on {} for {} weeks.",
            next.kind, next.start_date, next.duration_weeks
        ));
        self.replace_phase(next);
        Ok(())
    }

    /// Stop the current phase, archive it, and move macros to the new goal
    fn replace_phase(&mut self, next: PhaseRecord) {
        let previous_goal = self.profile.phase.goal_calories;
        let target = next.goal_calories;

        let mut stopped = std::mem::replace(&mut self.profile.phase, next);
        stopped.status = PhaseStatus::Stopped;
        tracing::info!(
            stopped = %stopped.kind,
            started = %self.profile.phase.kind,
            "phase replaced"
        );
        self.profile.phase_history.push(stopped);

        let split = if self.profile.macros.within_bounds() {
            rebalance(
                &self.profile.macros,
                self.profile.bodyweight,
                previous_goal,
                target,
                self.settings,
            )
        } else {
            split_macros(self.profile.bodyweight, target, self.settings)
        };
        self.apply_split(split);
    }

    fn apply_split(&mut self, split: MacroSplit) {
        if split.clamp.is_some() {
            self.messages.push(format!(
                "Calorie goal set to {:.0} kcal to keep macros within limits.",
                split.goal_calories
            ));
        }
        self.profile.phase.goal_calories = split.goal_calories;
        self.profile.macros = split.macros;
    }
}
