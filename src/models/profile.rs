use serde::{Deserialize, Serialize};

use crate::macro_split::MacroProfile;
use crate::models::phase::PhaseRecord;

const KG_PER_LB: f64 = 0.453_592_37;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
  Male,
  Female,
}

impl std::str::FromStr for Sex {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "male" | "m" => Ok(Self::Male),
      "female" | "f" => Ok(Self::Female),
      _ => Err(format!("Unknown sex: {}", s)),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
  Sedentary,        // Little or no exercise
  LightlyActive,    // 1-3 days/week
  ModeratelyActive, // 3-5 days/week
  VeryActive,       // 6-7 days/week
  ExtraActive,      // Hard training twice a day
}

impl ActivityLevel {
  pub fn factor(self) -> f64 {
    match self {
      ActivityLevel::Sedentary => 1.2,
      ActivityLevel::LightlyActive => 1.375,
      ActivityLevel::ModeratelyActive => 1.55,
      ActivityLevel::VeryActive => 1.725,
      ActivityLevel::ExtraActive => 1.9,
    }
  }
}

impl std::str::FromStr for ActivityLevel {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "sedentary" => Ok(Self::Sedentary),
      "light" | "lightly_active" => Ok(Self::LightlyActive),
      "moderate" | "moderately_active" => Ok(Self::ModeratelyActive),
      "very" | "very_active" => Ok(Self::VeryActive),
      "extra" | "extra_active" => Ok(Self::ExtraActive),
      _ => Err(format!("Unknown activity level: {}", s)),
    }
  }
}

/// Everything the engine knows about the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
  pub name: String,
  pub sex: Sex,
  /// Pounds
  pub bodyweight: f64,
  pub height_cm: f64,
  pub age: u32,
  pub activity_level: ActivityLevel,
  /// Maintenance calories, derived from the fields above
  pub tdee: f64,
  pub macros: MacroProfile,
  pub phase: PhaseRecord,
  /// Phases ended before their end date, oldest first
  #[serde(default)]
  pub phase_history: Vec<PhaseRecord>,
}

/// Mifflin-St Jeor BMR in kcal/day
pub fn mifflin_st_jeor(sex: Sex, bodyweight_lb: f64, height_cm: f64, age: u32) -> f64 {
  let weight_kg = bodyweight_lb * KG_PER_LB;
  let base = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * age as f64;
  match sex {
    Sex::Male => base + 5.0,
    Sex::Female => base - 161.0,
  }
}

pub fn estimate_tdee(
  sex: Sex,
  bodyweight_lb: f64,
  height_cm: f64,
  age: u32,
  activity_level: ActivityLevel,
) -> f64 {
  mifflin_st_jeor(sex, bodyweight_lb, height_cm, age) * activity_level.factor()
}
