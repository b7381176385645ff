use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::models::{DailyEntry, NewFoodLog, UserProfile};

pub type DbPool = SqlitePool;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
  #[error("Database error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Migration failed: {0}")]
  Migrate(#[from] sqlx::migrate::MigrateError),

  #[error("Failed to create database directory: {0}")]
  Io(#[from] std::io::Error),

  #[error("Stored profile is unreadable: {0}")]
  Profile(#[from] serde_json::Error),

  #[error("Invalid input: {0}")]
  InvalidInput(String),
}

/// Open (creating if needed) the database file and run migrations
pub async fn initialize_db(path: &Path) -> Result<DbPool, DbError> {
  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    fs::create_dir_all(parent)?;
  }

  let db_url = format!("sqlite://{}?mode=rwc", path.display());
  tracing::debug!(path = %path.display(), "initializing database");

  let pool = SqlitePoolOptions::new()
    .max_connections(5)
    .connect(&db_url)
    .await?;

  sqlx::migrate!("./migrations").run(&pool).await?;

  tracing::debug!("database ready");
  Ok(pool)
}

/// ---------------------------------------------------------------------------
/// Entries
/// ---------------------------------------------------------------------------

/// Log a weigh-in; a second weigh-in on the same day replaces the first
pub async fn record_weigh_in(pool: &DbPool, date: NaiveDate, bodyweight: f64) -> Result<(), DbError> {
  if !bodyweight.is_finite() || bodyweight <= 0.0 {
    return Err(DbError::InvalidInput(format!("bodyweight must be positive, got {}", bodyweight)));
  }

  sqlx::query(
    r#"
    INSERT INTO weigh_ins (date, bodyweight)
    VALUES (?1, ?2)
    ON CONFLICT(date) DO UPDATE SET bodyweight = excluded.bodyweight
    "#,
  )
  .bind(date)
  .bind(bodyweight)
  .execute(pool)
  .await?;

  Ok(())
}

/// Append a food log line, returning its id
pub async fn record_food_log(pool: &DbPool, log: &NewFoodLog) -> Result<i64, DbError> {
  let nutrients = [log.calories, log.protein, log.carbs, log.fat];
  if nutrients.iter().any(|n| !n.is_finite() || *n < 0.0) {
    return Err(DbError::InvalidInput("nutrients must be non-negative".to_string()));
  }

  let result = sqlx::query(
    r#"
    INSERT INTO food_logs (date, description, calories, protein, carbs, fat)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
    "#,
  )
  .bind(log.date)
  .bind(&log.description)
  .bind(log.calories)
  .bind(log.protein)
  .bind(log.carbs)
  .bind(log.fat)
  .execute(pool)
  .await?;

  Ok(result.last_insert_rowid())
}

/// One entry per weigh-in day, ascending, with that day's food summed.
/// Food logged on days without a weigh-in is not part of any entry.
pub async fn load_entries(pool: &DbPool) -> Result<Vec<DailyEntry>, DbError> {
  let entries = sqlx::query_as::<_, DailyEntry>(
    r#"
    SELECT
      w.date AS date,
      w.bodyweight AS bodyweight,
      CAST(COALESCE(SUM(f.calories), 0) AS REAL) AS calories,
      CAST(COALESCE(SUM(f.protein), 0) AS REAL) AS protein,
      CAST(COALESCE(SUM(f.carbs), 0) AS REAL) AS carbs,
      CAST(COALESCE(SUM(f.fat), 0) AS REAL) AS fat
    FROM weigh_ins w
    LEFT JOIN food_logs f ON f.date = w.date
    GROUP BY w.date, w.bodyweight
    ORDER BY w.date ASC
    "#,
  )
  .fetch_all(pool)
  .await?;

  Ok(entries)
}

/// ---------------------------------------------------------------------------
/// Profile
/// ---------------------------------------------------------------------------

pub async fn load_profile(pool: &DbPool) -> Result<Option<UserProfile>, DbError> {
  let row: Option<(String,)> = sqlx::query_as("SELECT profile_json FROM user_profile WHERE id = 1")
    .fetch_optional(pool)
    .await?;

  match row {
    Some((json,)) => Ok(Some(serde_json::from_str(&json)?)),
    None => Ok(None),
  }
}

pub async fn save_profile(pool: &DbPool, profile: &UserProfile) -> Result<(), DbError> {
  let json = serde_json::to_string(profile)?;

  sqlx::query(
    r#"
    INSERT INTO user_profile (id, profile_json, updated_at)
    VALUES (1, ?1, datetime('now'))
    ON CONFLICT(id) DO UPDATE SET
      profile_json = excluded.profile_json,
      updated_at = excluded.updated_at
    "#,
  )
  .bind(json)
  .execute(pool)
  .await?;

  Ok(())
}
