//! Macro allocation under per-macro gram bounds
//!
//! Bounds come from bodyweight (g/lb) except the fat ceiling, which is a
//! share of the calorie goal. Calories move between macros through one
//! ordered cascade: each macro in turn takes as much of the change as its
//! headroom to the relevant bound allows, and the rest carries on to the next.

use serde::{Deserialize, Serialize};

const EPSILON: f64 = 1e-9;

/// Slack when checking bounds after float arithmetic
const BOUND_TOLERANCE: f64 = 1e-6;

// ---------------------------------------------------------------------------
/// Macros and cascade orders
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Macro {
  Protein,
  Carbs,
  Fat,
}

impl Macro {
  pub fn kcal_per_gram(self) -> f64 {
    match self {
      Macro::Protein | Macro::Carbs => 4.0,
      Macro::Fat => 9.0,
    }
  }
}

/// Order for taking calories away
pub const REMOVE_ORDER: [Macro; 3] = [Macro::Fat, Macro::Carbs, Macro::Protein];

/// Order for adding calories
pub const ADD_ORDER: [Macro; 3] = [Macro::Carbs, Macro::Fat, Macro::Protein];

/// Where fat's shortfall is borrowed from, or its excess pushed to
pub const FAT_BALANCE_ORDER: [Macro; 2] = [Macro::Carbs, Macro::Protein];

// ---------------------------------------------------------------------------
/// Settings
// ---------------------------------------------------------------------------

/// Per-pound defaults and bounds. Carb ceiling is configurable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroSettings {
  pub protein_per_lb: f64,
  pub carbs_per_lb: f64,
  pub protein_min_per_lb: f64,
  pub protein_max_per_lb: f64,
  pub carbs_min_per_lb: f64,
  pub carbs_max_per_lb: f64,
  pub fat_min_per_lb: f64,
  /// Largest share of the calorie goal fat may supply
  pub fat_max_share: f64,
}

impl Default for MacroSettings {
  fn default() -> Self {
    Self {
      protein_per_lb: 1.0,
      carbs_per_lb: 1.5,
      protein_min_per_lb: 0.3,
      protein_max_per_lb: 2.0,
      carbs_min_per_lb: 0.3,
      carbs_max_per_lb: 4.0,
      fat_min_per_lb: 0.3,
      fat_max_share: 0.4,
    }
  }
}

// ---------------------------------------------------------------------------
/// Bounds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GramRange {
  pub min: f64,
  pub max: f64,
}

/// Gram bounds for one bodyweight and calorie goal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacroBounds {
  pub protein: GramRange,
  pub carbs: GramRange,
  /// `max` is the raw share cap and can fall below `min` for low goals
  pub fat: GramRange,
  fat_max_share: f64,
}

impl MacroBounds {
  pub fn new(bodyweight: f64, goal_calories: f64, settings: &MacroSettings) -> Self {
    Self {
      protein: GramRange {
        min: settings.protein_min_per_lb * bodyweight,
        max: settings.protein_max_per_lb * bodyweight,
      },
      carbs: GramRange {
        min: settings.carbs_min_per_lb * bodyweight,
        max: settings.carbs_max_per_lb * bodyweight,
      },
      fat: GramRange {
        min: settings.fat_min_per_lb * bodyweight,
        max: settings.fat_max_share * goal_calories / Macro::Fat.kcal_per_gram(),
      },
      fat_max_share: settings.fat_max_share,
    }
  }

  /// Calories with every macro at its minimum
  pub fn min_total(&self) -> f64 {
    self.protein.min * Macro::Protein.kcal_per_gram()
      + self.carbs.min * Macro::Carbs.kcal_per_gram()
      + self.fat.min * Macro::Fat.kcal_per_gram()
  }

  /// Largest goal reachable: protein and carbs at maximum with fat at its
  /// share of that same goal.
  pub fn max_total(&self) -> f64 {
    let lean = self.protein.max * Macro::Protein.kcal_per_gram()
      + self.carbs.max * Macro::Carbs.kcal_per_gram();
    lean / (1.0 - self.fat_max_share)
  }

  /// Whether minimum fat fits inside its calorie share
  pub fn fat_floor_fits(&self) -> bool {
    self.fat.min <= self.fat.max + EPSILON
  }

  pub fn is_feasible(&self, goal_calories: f64) -> bool {
    self.fat_floor_fits()
      && self.min_total() <= goal_calories + EPSILON
      && goal_calories <= self.max_total() + EPSILON
  }

  fn range(&self, m: Macro) -> GramRange {
    match m {
      Macro::Protein => self.protein,
      Macro::Carbs => self.carbs,
      // Stored ceiling never drops below the floor
      Macro::Fat => GramRange {
        min: self.fat.min,
        max: self.fat.max.max(self.fat.min),
      },
    }
  }
}

// ---------------------------------------------------------------------------
/// Macro Profile
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacroTarget {
  pub grams: f64,
  pub min: f64,
  pub max: f64,
}

impl MacroTarget {
  pub fn within_bounds(&self) -> bool {
    self.grams >= self.min - BOUND_TOLERANCE && self.grams <= self.max + BOUND_TOLERANCE
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacroProfile {
  pub protein: MacroTarget,
  pub carbs: MacroTarget,
  pub fat: MacroTarget,
}

impl MacroProfile {
  fn with_grams(bounds: &MacroBounds, protein: f64, carbs: f64, fat: f64) -> Self {
    let target = |m: Macro, grams: f64| {
      let range = bounds.range(m);
      MacroTarget {
        grams,
        min: range.min,
        max: range.max,
      }
    };
    Self {
      protein: target(Macro::Protein, protein),
      carbs: target(Macro::Carbs, carbs),
      fat: target(Macro::Fat, fat),
    }
  }

  fn at_minimum(bounds: &MacroBounds) -> Self {
    let r = |m| bounds.range(m).min;
    Self::with_grams(bounds, r(Macro::Protein), r(Macro::Carbs), r(Macro::Fat))
  }

  fn at_maximum(bounds: &MacroBounds) -> Self {
    let r = |m| bounds.range(m).max;
    Self::with_grams(bounds, r(Macro::Protein), r(Macro::Carbs), r(Macro::Fat))
  }

  pub fn get(&self, m: Macro) -> &MacroTarget {
    match m {
      Macro::Protein => &self.protein,
      Macro::Carbs => &self.carbs,
      Macro::Fat => &self.fat,
    }
  }

  fn get_mut(&mut self, m: Macro) -> &mut MacroTarget {
    match m {
      Macro::Protein => &mut self.protein,
      Macro::Carbs => &mut self.carbs,
      Macro::Fat => &mut self.fat,
    }
  }

  /// Replace bounds, keeping grams
  pub fn apply_bounds(&mut self, bounds: &MacroBounds) {
    for m in [Macro::Protein, Macro::Carbs, Macro::Fat] {
      let range = bounds.range(m);
      let target = self.get_mut(m);
      target.min = range.min;
      target.max = range.max;
    }
  }

  pub fn calories(&self) -> f64 {
    [Macro::Protein, Macro::Carbs, Macro::Fat]
      .iter()
      .map(|&m| self.get(m).grams * m.kcal_per_gram())
      .sum()
  }

  pub fn within_bounds(&self) -> bool {
    self.protein.within_bounds() && self.carbs.within_bounds() && self.fat.within_bounds()
  }

  /// Spread `kcal` over macros in `order`. Positive values raise macros
  /// toward their maximum, negative values lower them toward their minimum.
  /// Returns what could not be placed, with the sign of `kcal`.
  pub fn cascade(&mut self, kcal: f64, order: &[Macro]) -> f64 {
    let mut remaining = kcal;

    for &m in order {
      if remaining.abs() <= EPSILON {
        break;
      }

      let kcal_per_gram = m.kcal_per_gram();
      let target = self.get_mut(m);
      let headroom = if remaining > 0.0 {
        (target.max - target.grams) * kcal_per_gram
      } else {
        (target.grams - target.min) * kcal_per_gram
      }
      .max(0.0);

      let moved = remaining.abs().min(headroom).copysign(remaining);
      target.grams += moved / kcal_per_gram;
      remaining -= moved;
    }

    if remaining.abs() <= EPSILON {
      0.0
    } else {
      remaining
    }
  }

  /// Bring fat inside its bounds by trading calories with carbs, then
  /// protein. The goal must already be feasible for the bounds, which
  /// leaves room for the whole trade.
  fn settle_fat(&mut self) {
    let fat_kcal = Macro::Fat.kcal_per_gram();

    if self.fat.grams < self.fat.min {
      let shortfall = (self.fat.min - self.fat.grams) * fat_kcal;
      self.fat.grams = self.fat.min;
      self.cascade(-shortfall, &FAT_BALANCE_ORDER);
    } else if self.fat.grams > self.fat.max {
      let excess = (self.fat.grams - self.fat.max) * fat_kcal;
      self.fat.grams = self.fat.max;
      self.cascade(excess, &FAT_BALANCE_ORDER);
    }
  }
}

// ---------------------------------------------------------------------------
/// Allocation
// ---------------------------------------------------------------------------

/// Why the calorie goal was overridden
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalorieClamp {
  /// Goal too low: every macro at its minimum
  Minimum,
  /// Goal too high: every macro at its maximum
  Maximum,
  /// Cascade ran out of headroom part way
  Residual,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacroSplit {
  pub macros: MacroProfile,
  pub goal_calories: f64,
  pub clamp: Option<CalorieClamp>,
}

fn clamp_to_minimum(bodyweight: f64, goal_calories: f64, settings: &MacroSettings) -> MacroSplit {
  let total = MacroBounds::new(bodyweight, goal_calories, settings).min_total();
  let bounds = MacroBounds::new(bodyweight, total, settings);
  tracing::warn!(
    goal_calories,
    override_calories = total,
    "calorie goal cannot cover minimum macros, clamping to minimums"
  );
  MacroSplit {
    macros: MacroProfile::at_minimum(&bounds),
    goal_calories: total,
    clamp: Some(CalorieClamp::Minimum),
  }
}

fn clamp_to_maximum(bodyweight: f64, goal_calories: f64, settings: &MacroSettings) -> MacroSplit {
  let total = MacroBounds::new(bodyweight, goal_calories, settings).max_total();
  let bounds = MacroBounds::new(bodyweight, total, settings);
  tracing::warn!(
    goal_calories,
    override_calories = total,
    "calorie goal exceeds maximum macros, clamping to maximums"
  );
  MacroSplit {
    macros: MacroProfile::at_maximum(&bounds),
    goal_calories: total,
    clamp: Some(CalorieClamp::Maximum),
  }
}

/// Fresh protein / carbs / fat split for a calorie goal.
///
/// Protein and carbs start at their per-pound defaults and fat takes the
/// remaining calories. Fat outside its bounds is pulled back in by trading
/// with carbs, then protein. Goals no split can reach are overridden to the
/// nearest reachable total.
pub fn split_macros(bodyweight: f64, goal_calories: f64, settings: &MacroSettings) -> MacroSplit {
  let bounds = MacroBounds::new(bodyweight, goal_calories, settings);

  if bounds.min_total() > goal_calories || !bounds.fat_floor_fits() {
    return clamp_to_minimum(bodyweight, goal_calories, settings);
  }
  if goal_calories > bounds.max_total() {
    return clamp_to_maximum(bodyweight, goal_calories, settings);
  }

  let protein = (settings.protein_per_lb * bodyweight).clamp(bounds.protein.min, bounds.protein.max);
  let carbs = (settings.carbs_per_lb * bodyweight).clamp(bounds.carbs.min, bounds.carbs.max);
  let fat = (goal_calories
    - protein * Macro::Protein.kcal_per_gram()
    - carbs * Macro::Carbs.kcal_per_gram())
    / Macro::Fat.kcal_per_gram();

  let mut macros = MacroProfile::with_grams(&bounds, protein, carbs, fat);
  macros.settle_fat();

  MacroSplit {
    macros,
    goal_calories,
    clamp: None,
  }
}

/// Move an existing split from one calorie goal to another through the
/// cascade: removals come out of fat, carbs, protein in that order;
/// additions go to carbs, fat, protein.
///
/// Falls back to a fresh split when the current macros no longer fit their
/// bounds, and to the min / max clamp when the new goal is unreachable.
pub fn rebalance(
  macros: &MacroProfile,
  bodyweight: f64,
  from_goal: f64,
  to_goal: f64,
  settings: &MacroSettings,
) -> MacroSplit {
  let current_bounds = MacroBounds::new(bodyweight, from_goal, settings);
  let mut current = *macros;
  current.apply_bounds(&current_bounds);
  if !current.within_bounds() {
    tracing::info!("current macros outside bounds, recomputing split");
    return split_macros(bodyweight, to_goal, settings);
  }

  let bounds = MacroBounds::new(bodyweight, to_goal, settings);
  if !bounds.is_feasible(to_goal) {
    return split_macros(bodyweight, to_goal, settings);
  }

  let delta = to_goal - from_goal;
  let order: &[Macro] = if delta < 0.0 { &REMOVE_ORDER } else { &ADD_ORDER };

  let mut next = current;
  next.apply_bounds(&bounds);
  let residual = next.cascade(delta, order);

  if residual == 0.0 {
    return MacroSplit {
      macros: next,
      goal_calories: to_goal,
      clamp: None,
    };
  }

  let achieved = from_goal + (delta - residual);
  tracing::warn!(
    requested = to_goal,
    achieved,
    "macro bounds could not absorb the full calorie change"
  );
  next.apply_bounds(&MacroBounds::new(bodyweight, achieved, settings));
  MacroSplit {
    macros: next,
    goal_calories: achieved,
    clamp: Some(CalorieClamp::Residual),
  }
}
