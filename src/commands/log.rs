//! Logging commands: weigh-ins and food

use chrono::NaiveDate;

use crate::db::{record_food_log, record_weigh_in, DbPool};
use crate::models::NewFoodLog;

#[derive(Debug, Clone, clap::Args)]
pub struct FoodArgs {
  /// What was eaten
  pub description: String,

  #[arg(long, default_value_t = 0.0)]
  pub calories: f64,

  /// Grams
  #[arg(long, default_value_t = 0.0)]
  pub protein: f64,

  #[arg(long, default_value_t = 0.0)]
  pub carbs: f64,

  #[arg(long, default_value_t = 0.0)]
  pub fat: f64,

  /// Defaults to today (YYYY-MM-DD)
  #[arg(long)]
  pub date: Option<NaiveDate>,
}

pub async fn weigh(pool: &DbPool, date: NaiveDate, bodyweight: f64) -> Result<String, String> {
  record_weigh_in(pool, date, bodyweight)
    .await
    .map_err(|e| format!("Failed to record weigh-in: {}", e))?;

  tracing::info!(%date, bodyweight, "recorded weigh-in");
  Ok(format!("Logged {:.1} lb for {}.", bodyweight, date))
}

pub async fn food(pool: &DbPool, args: FoodArgs, today: NaiveDate) -> Result<String, String> {
  let log = NewFoodLog {
    date: args.date.unwrap_or(today),
    description: args.description,
    calories: args.calories,
    protein: args.protein,
    carbs: args.carbs,
    fat: args.fat,
  };

  let id = record_food_log(pool, &log)
    .await
    .map_err(|e| format!("Failed to record food log: {}", e))?;

  tracing::info!(id, date = %log.date, calories = log.calories, "recorded food log");
  Ok(format!(
    "Logged {} ({:.0} kcal, {:.0}P/{:.0}C/{:.0}F) for {}.",
    log.description, log.calories, log.protein, log.carbs, log.fat, log.date
  ))
}
