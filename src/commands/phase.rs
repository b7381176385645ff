//! Profile and phase commands: init, status, pause, resume

use chrono::NaiveDate;

use super::{format_targets, require_profile};
use crate::analysis::PhaseSummary;
use crate::db::{load_entries, load_profile, save_profile, DbPool};
use crate::macro_split::{split_macros, MacroSettings};
use crate::models::profile::estimate_tdee;
use crate::models::{ActivityLevel, PhaseKind, PhasePlan, PhaseRecord, Sex, UserProfile};

#[derive(Debug, Clone, clap::Args)]
pub struct InitArgs {
  #[arg(long)]
  pub name: String,

  /// male or female
  #[arg(long)]
  pub sex: Sex,

  /// Pounds
  #[arg(long)]
  pub bodyweight: f64,

  #[arg(long)]
  pub height_cm: f64,

  #[arg(long)]
  pub age: u32,

  /// sedentary, light, moderate, very or extra
  #[arg(long, default_value = "moderate")]
  pub activity: ActivityLevel,

  /// cut, maintain or bulk
  #[arg(long)]
  pub phase: PhaseKind,

  /// Required for cut and bulk
  #[arg(long)]
  pub goal_weight: Option<f64>,

  #[arg(long)]
  pub weeks: u32,

  /// Defaults to today (YYYY-MM-DD)
  #[arg(long)]
  pub start: Option<NaiveDate>,

  /// Replace an existing profile
  #[arg(long)]
  pub force: bool,
}

pub async fn init(
  pool: &DbPool,
  args: InitArgs,
  settings: &MacroSettings,
  today: NaiveDate,
) -> Result<String, String> {
  let existing = load_profile(pool)
    .await
    .map_err(|e| format!("Failed to load profile: {}", e))?;
  if existing.is_some() && !args.force {
    return Err("A profile already exists. Pass --force to replace it.".to_string());
  }

  if !(args.height_cm > 0.0) || args.age == 0 {
    return Err("Height and age must be positive".to_string());
  }

  let goal_weight = match (args.phase, args.goal_weight) {
    (PhaseKind::Maintain, _) => args.bodyweight,
    (_, Some(goal)) => goal,
    (kind, None) => return Err(format!("--goal-weight is required for a {}", kind)),
  };

  let tdee = estimate_tdee(args.sex, args.bodyweight, args.height_cm, args.age, args.activity);
  let plan = PhasePlan {
    kind: args.phase,
    start_date: args.start.unwrap_or(today),
    goal_weight,
    duration_weeks: args.weeks,
  };
  let mut phase = PhaseRecord::from_plan(&plan, args.bodyweight, tdee, today).map_err(|e| e.to_string())?;

  let split = split_macros(args.bodyweight, phase.goal_calories, settings);
  phase.goal_calories = split.goal_calories;

  let profile = UserProfile {
    name: args.name,
    sex: args.sex,
    bodyweight: args.bodyweight,
    height_cm: args.height_cm,
    age: args.age,
    activity_level: args.activity,
    tdee,
    macros: split.macros,
    phase,
    phase_history: Vec::new(),
  };

  save_profile(pool, &profile)
    .await
    .map_err(|e| format!("Failed to save profile: {}", e))?;

  tracing::info!(
    kind = %profile.phase.kind,
    tdee,
    goal_calories = profile.phase.goal_calories,
    "created profile"
  );

  Ok(format!(
    "Created a {}-week {} phase starting {} ({}).\nTDEE: {:.0} kcal\n{}",
    profile.phase.duration_weeks,
    profile.phase.kind,
    profile.phase.start_date,
    profile.phase.status,
    profile.tdee,
    format_targets(&profile)
  ))
}

pub async fn status(pool: &DbPool, today: NaiveDate) -> Result<String, String> {
  let profile = require_profile(pool).await?;
  let entries = load_entries(pool)
    .await
    .map_err(|e| format!("Failed to load entries: {}", e))?;

  let summary = PhaseSummary::compute(&profile, &entries, today);
  Ok(format_summary(&summary, &profile))
}

fn format_summary(summary: &PhaseSummary, profile: &UserProfile) -> String {
  let mut lines = vec![format!(
    "{} phase ({}), {} to {}, day {}",
    summary.kind, summary.status, summary.start_date, summary.end_date, summary.days_elapsed
  )];

  match (summary.current_weight, summary.total_change) {
    (Some(current), Some(change)) => lines.push(format!(
      "Weight: {:.1} lb ({:+.1} since start, goal {:.1})",
      current, change, summary.goal_weight
    )),
    _ => lines.push("Weight: no weigh-ins yet".to_string()),
  }
  if let Some(progress) = summary.progress {
    lines.push(format!("Progress: {:.0}%", progress * 100.0));
  }

  for week in &summary.weeks {
    let weight = week
      .avg_weight
      .map(|w| format!("{:.1} lb", w))
      .unwrap_or_else(|| "-".to_string());
    let calories = week
      .avg_calories
      .map(|c| format!("{:.0} kcal", c))
      .unwrap_or_else(|| "-".to_string());
    lines.push(format!(
      "Week {} ({}): {} entries, avg {}, {}",
      week.week + 1,
      week.week_start,
      week.entries,
      weight,
      calories
    ));
  }

  lines.push(format_targets(profile));
  lines.join("\n")
}

pub async fn pause(pool: &DbPool) -> Result<String, String> {
  let mut profile = require_profile(pool).await?;
  profile.phase.pause().map_err(|e| e.to_string())?;
  save_profile(pool, &profile)
    .await
    .map_err(|e| format!("Failed to save profile: {}", e))?;

  tracing::info!(kind = %profile.phase.kind, "phase paused");
  Ok(format!("Paused your {} phase.", profile.phase.kind))
}

pub async fn resume(pool: &DbPool) -> Result<String, String> {
  let mut profile = require_profile(pool).await?;
  profile.phase.resume().map_err(|e| e.to_string())?;
  save_profile(pool, &profile)
    .await
    .map_err(|e| format!("Failed to save profile: {}", e))?;

  tracing::info!(kind = %profile.phase.kind, "phase resumed");
  Ok(format!("Resumed your {} phase.", profile.phase.kind))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::record_weigh_in;
  use crate::models::PhaseStatus;
  use crate::test_utils::*;
  use serial_test::serial;

  fn cut_args() -> InitArgs {
    InitArgs {
      name: "Sam".to_string(),
      sex: Sex::Male,
      bodyweight: 180.0,
      height_cm: 180.0,
      age: 30,
      activity: ActivityLevel::ModeratelyActive,
      phase: PhaseKind::Cut,
      goal_weight: Some(174.0),
      weeks: 12,
      start: None,
      force: false,
    }
  }

  #[tokio::test]
  #[serial]
  async fn test_init_creates_active_phase() {
    let pool = setup_test_db().await;
    let today = date(2024, 1, 1);

    init(&pool, cut_args(), &MacroSettings::default(), today).await.unwrap();
    let profile = load_profile(&pool).await.unwrap().unwrap();

    assert_eq!(profile.phase.kind, PhaseKind::Cut);
    assert_eq!(profile.phase.status, PhaseStatus::Active);
    assert!((profile.phase.target_weekly_change - -0.5).abs() < 1e-9);
    assert!((profile.phase.goal_calories - (profile.tdee - 250.0)).abs() < 1e-6);
    assert!((profile.macros.calories() - profile.phase.goal_calories).abs() < 1e-6);
    assert!(profile.macros.within_bounds());

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  #[serial]
  async fn test_init_refuses_to_overwrite() {
    let pool = setup_test_db().await;
    let today = date(2024, 1, 1);

    init(&pool, cut_args(), &MacroSettings::default(), today).await.unwrap();
    assert!(init(&pool, cut_args(), &MacroSettings::default(), today).await.is_err());

    let forced = InitArgs {
      force: true,
      ..cut_args()
    };
    assert!(init(&pool, forced, &MacroSettings::default(), today).await.is_ok());

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  #[serial]
  async fn test_init_cut_requires_goal_weight() {
    let pool = setup_test_db().await;
    let args = InitArgs {
      goal_weight: None,
      ..cut_args()
    };

    let err = init(&pool, args, &MacroSettings::default(), date(2024, 1, 1))
      .await
      .unwrap_err();
    assert!(err.contains("--goal-weight"));

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  #[serial]
  async fn test_pause_and_resume_persist() {
    let pool = setup_test_db().await;
    save_profile(&pool, &mock_profile(date(2024, 1, 1))).await.unwrap();

    pause(&pool).await.unwrap();
    let paused = load_profile(&pool).await.unwrap().unwrap();
    assert_eq!(paused.phase.status, PhaseStatus::Paused);
    assert!(pause(&pool).await.is_err());

    resume(&pool).await.unwrap();
    let resumed = load_profile(&pool).await.unwrap().unwrap();
    assert_eq!(resumed.phase.status, PhaseStatus::Active);

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  #[serial]
  async fn test_status_reports_weeks() {
    let pool = setup_test_db().await;
    save_profile(&pool, &mock_profile(date(2024, 1, 1))).await.unwrap();
    for (i, w) in [181.0, 180.8, 180.6, 180.5].iter().enumerate() {
      record_weigh_in(&pool, date(2024, 1, 1 + i as u32), *w).await.unwrap();
    }

    let report = status(&pool, date(2024, 1, 4)).await.unwrap();

    assert!(report.contains("cut phase (active)"));
    assert!(report.contains("Week 1 (2024-01-01): 4 entries"));
    assert!(report.contains("Calories: 2400 kcal"));

    teardown_test_db(pool).await;
  }
}
