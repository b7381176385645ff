pub mod log;
pub mod phase;
pub mod progression;

pub use progression::PromptDecisions;

use crate::db::{load_profile, DbPool};
use crate::models::UserProfile;

/// Load the stored profile, or explain how to create one
pub async fn require_profile(pool: &DbPool) -> Result<UserProfile, String> {
  load_profile(pool)
    .await
    .map_err(|e| format!("Failed to load profile: {}", e))?
    .ok_or_else(|| "No profile found. Run `phase-coach init` first.".to_string())
}

/// Current calorie goal and macro grams, one line each
pub fn format_targets(profile: &UserProfile) -> String {
  let m = &profile.macros;
  format!(
    "Calories: {:.0} kcal\nProtein:  {:.0} g ({:.0}-{:.0})\nCarbs:    {:.0} g ({:.0}-{:.0})\nFat:      {:.0} g ({:.0}-{:.0})",
    profile.phase.goal_calories,
    m.protein.grams,
    m.protein.min,
    m.protein.max,
    m.carbs.grams,
    m.carbs.min,
    m.carbs.max,
    m.fat.grams,
    m.fat.min,
    m.fat.max,
  )
}
