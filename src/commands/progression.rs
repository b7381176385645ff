//! Weekly check command and the terminal decision prompt

use std::io::{BufRead, Write};

use chrono::NaiveDate;

use super::{format_targets, require_profile};
use crate::db::{load_entries, save_profile, DbPool};
use crate::macro_split::MacroSettings;
use crate::models::{PhaseKind, PhasePlan};
use crate::progression::{
    DecisionProvider, GoalDecision, GoalSurpassed, Outcome, PhaseChange, ProgressEngine,
    ThresholdDecision,
};
use crate::threshold::ThresholdBreach;

/// Evaluate the stored profile against logged entries and save the result
pub async fn check(
    pool: &DbPool,
    settings: &MacroSettings,
    today: NaiveDate,
    decisions: &mut dyn DecisionProvider,
    dry_run: bool,
) -> Result<String, String> {
    let profile = require_profile(pool).await?;
    let entries = load_entries(pool)
        .await
        .map_err(|e| format!("Failed to load entries: {}", e))?;

    let engine = ProgressEngine::new(settings.clone());
    let evaluation = engine
        .evaluate(&profile, &entries, today, decisions)
        .map_err(|e| e.to_string())?;

    if !dry_run && evaluation.profile != profile {
        save_profile(pool, &evaluation.profile)
            .await
            .map_err(|e| format!("Failed to save profile: {}", e))?;
    }

    let mut lines = vec![describe_outcome(&evaluation.outcome)];
    lines.extend(evaluation.messages.iter().cloned());
    lines.push(format_targets(&evaluation.profile));
    if dry_run {
        lines.push("(dry run, nothing saved)".to_string());
    }
    Ok(lines.join("\n"))
}

fn describe_outcome(outcome: &Outcome) -> String {
    match outcome {
        Outcome::NotStarted => "Phase has not started yet.".to_string(),
        Outcome::Inactive(status) => format!("Phase is {}, nothing to check.", status),
        Outcome::Completed => "Phase complete.".to_string(),
        Outcome::PhaseChanged(PhaseChange::SwitchedToMaintenance) => {
            "Switched to maintenance.".to_string()
        }
        Outcome::PhaseChanged(PhaseChange::NewPhase) => "Started a new phase.".to_string(),
        Outcome::InsufficientData { qualifying_weeks } => format!(
            "Not enough data yet: {} complete week(s) with 3+ weigh-ins, need 2.",
            qualifying_weeks
        ),
        Outcome::OnTrack { weeks_scored } => {
            format!("On track ({} week(s) checked).", weeks_scored)
        }
        Outcome::Adjusted { status, .. } => format!("Adjusted: {} two weeks running.", status),
    }
}

// ---------------------------------------------------------------------------
/// Terminal Decision Prompt
// ---------------------------------------------------------------------------

/// Asks the user on `output` and reads answers from `input`
pub struct PromptDecisions<R, W> {
    input: R,
    output: W,
    today: NaiveDate,
}

impl<R: BufRead, W: Write> PromptDecisions<R, W> {
    pub fn new(input: R, output: W, today: NaiveDate) -> Self {
        Self {
            input,
            output,
            today,
        }
    }

    fn ask(&mut self, question: &str) -> Result<String, String> {
        write!(self.output, "{} ", question).map_err(|e| e.to_string())?;
        self.output.flush().map_err(|e| e.to_string())?;

        let mut line = String::new();
        let read = self.input.read_line(&mut line).map_err(|e| e.to_string())?;
        if read == 0 {
            return Err("no answer given".to_string());
        }
        Ok(line.trim().to_string())
    }

    fn ask_number<T: std::str::FromStr>(&mut self, question: &str) -> Result<T, String> {
        let answer = self.ask(question)?;
        answer
            .parse()
            .map_err(|_| format!("'{}' is not a valid number", answer))
    }

    fn ask_plan(&mut self) -> Result<PhasePlan, String> {
        let kind: PhaseKind = self.ask("Phase (cut/maintain/bulk):")?.parse()?;
        let goal_weight = match kind {
            PhaseKind::Maintain => 0.0,
            _ => self.ask_number("Goal weight (lb):")?,
        };
        let duration_weeks = self.ask_number("Duration (weeks):")?;

        Ok(PhasePlan {
            kind,
            start_date: self.today,
            goal_weight,
            duration_weeks,
        })
    }
}

impl<R: BufRead, W: Write> DecisionProvider for PromptDecisions<R, W> {
    fn on_threshold(&mut self, breach: &ThresholdBreach) -> Result<ThresholdDecision, String> {
        writeln!(
            self.output,
            "Your {} has moved {:.1} lb from {:.1} lb, past the {:.1} lb limit.",
            breach.kind, breach.change, breach.start_weight, breach.limit
        )
        .map_err(|e| e.to_string())?;

        match self.ask("[m]aintenance, [n]ew phase or [c]ontinue?")?.as_str() {
            "m" | "maintenance" => Ok(ThresholdDecision::SwitchToMaintenance),
            "n" | "new" => Ok(ThresholdDecision::StartNewPhase(self.ask_plan()?)),
            "c" | "continue" => Ok(ThresholdDecision::Continue),
            other => Err(format!("unrecognized choice '{}'", other)),
        }
    }

    fn on_goal_surpassed(&mut self, context: &GoalSurpassed) -> Result<GoalDecision, String> {
        writeln!(
            self.output,
            "You are at {:.1} lb, already past your {} goal of {:.1} lb.",
            context.current_weight, context.kind, context.goal_weight
        )
        .map_err(|e| e.to_string())?;

        match self.ask("[g]oal change, [n]ew phase or [c]ontinue?")?.as_str() {
            "g" | "goal" => Ok(GoalDecision::AdjustGoal(self.ask_number("New goal weight (lb):")?)),
            "n" | "new" => Ok(GoalDecision::StartNewPhase(self.ask_plan()?)),
            "c" | "continue" => Ok(GoalDecision::Continue),
            other => Err(format!("unrecognized choice '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{load_profile, record_weigh_in};
    use crate::test_utils::*;
    use serial_test::serial;
    use std::io::Cursor;

    fn breach() -> ThresholdBreach {
        ThresholdBreach {
            kind: PhaseKind::Cut,
            start_weight: 181.1,
            current_weight: 160.0,
            change: 21.1,
            limit: 18.11,
        }
    }

    async fn seed_weeks(pool: &DbPool, weekly_changes: &[f64]) {
        for entry in weekly_entries(date(2024, 1, 1), 181.1, weekly_changes) {
            record_weigh_in(pool, entry.date, entry.bodyweight).await.unwrap();
        }
    }

    #[tokio::test]
    #[serial]
    async fn test_check_saves_adjustment() {
        let pool = setup_test_db().await;
        save_profile(&pool, &mock_profile(date(2024, 1, 1))).await.unwrap();
        seed_weeks(&pool, &[-0.3, -0.3, -0.5]).await;

        let report = check(
            &pool,
            &MacroSettings::default(),
            date(2024, 1, 22),
            &mut ScriptedDecisions::default(),
            false,
        )
        .await
        .unwrap();

        assert!(report.contains("lost too little"));
        let saved = load_profile(&pool).await.unwrap().unwrap();
        assert!((saved.phase.goal_calories - 2300.0).abs() < 1e-6);
        assert_eq!(saved.phase.last_checked_date, date(2024, 1, 14));

        teardown_test_db(pool).await;
    }

    #[tokio::test]
    #[serial]
    async fn test_check_dry_run_saves_nothing() {
        let pool = setup_test_db().await;
        let profile = mock_profile(date(2024, 1, 1));
        save_profile(&pool, &profile).await.unwrap();
        seed_weeks(&pool, &[-0.3, -0.3, -0.5]).await;

        let report = check(
            &pool,
            &MacroSettings::default(),
            date(2024, 1, 22),
            &mut ScriptedDecisions::default(),
            true,
        )
        .await
        .unwrap();

        assert!(report.contains("dry run"));
        assert_eq!(load_profile(&pool).await.unwrap(), Some(profile));

        teardown_test_db(pool).await;
    }

    #[tokio::test]
    #[serial]
    async fn test_check_reports_insufficient_data() {
        let pool = setup_test_db().await;
        save_profile(&pool, &mock_profile(date(2024, 1, 1))).await.unwrap();
        seed_weeks(&pool, &[-0.5]).await;

        let report = check(
            &pool,
            &MacroSettings::default(),
            date(2024, 1, 9),
            &mut ScriptedDecisions::default(),
            false,
        )
        .await
        .unwrap();

        assert!(report.contains("Not enough data yet: 1 complete week"));

        teardown_test_db(pool).await;
    }

    #[test]
    fn test_prompt_threshold_maintenance() {
        let mut output = Vec::new();
        let mut prompt = PromptDecisions::new(Cursor::new("m\n"), &mut output, date(2024, 2, 1));

        let decision = prompt.on_threshold(&breach()).unwrap();

        assert_eq!(decision, ThresholdDecision::SwitchToMaintenance);
        let shown = String::from_utf8(output).unwrap();
        assert!(shown.contains("past the 18.1 lb limit"));
    }

    #[test]
    fn test_prompt_threshold_new_phase() {
        let mut prompt = PromptDecisions::new(
            Cursor::new("n\nbulk\n170\n12\n"),
            Vec::new(),
            date(2024, 2, 1),
        );

        let decision = prompt.on_threshold(&breach()).unwrap();

        assert_eq!(
            decision,
            ThresholdDecision::StartNewPhase(PhasePlan {
                kind: PhaseKind::Bulk,
                start_date: date(2024, 2, 1),
                goal_weight: 170.0,
                duration_weeks: 12,
            })
        );
    }

    #[test]
    fn test_prompt_goal_adjust() {
        let context = GoalSurpassed {
            kind: PhaseKind::Cut,
            goal_weight: 175.0,
            current_weight: 174.0,
            start_date: date(2024, 2, 1),
        };
        let mut prompt = PromptDecisions::new(Cursor::new("g\n170.5\n"), Vec::new(), date(2024, 2, 1));

        assert_eq!(
            prompt.on_goal_surpassed(&context).unwrap(),
            GoalDecision::AdjustGoal(170.5)
        );
    }

    #[test]
    fn test_prompt_rejects_unknown_and_eof() {
        let mut prompt = PromptDecisions::new(Cursor::new("x\n"), Vec::new(), date(2024, 2, 1));
        assert!(prompt.on_threshold(&breach()).is_err());

        let mut empty = PromptDecisions::new(Cursor::new(""), Vec::new(), date(2024, 2, 1));
        assert!(empty.on_threshold(&breach()).is_err());
    }
}
