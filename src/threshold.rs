//! Cumulative weight change safety check
//!
//! A cut that has lost more than 10% of the starting weight, or a bulk that
//! has gained more than 10%, needs a decision before evaluation continues.

use serde::{Deserialize, Serialize};

use crate::models::{PhaseKind, PhaseRecord};

/// Fraction of start weight a phase may move before a decision is forced
pub const THRESHOLD_FRACTION: f64 = 0.10;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdBreach {
  pub kind: PhaseKind,
  pub start_weight: f64,
  pub current_weight: f64,
  /// |current - start|
  pub change: f64,
  pub limit: f64,
}

pub fn check_threshold(phase: &PhaseRecord, current_weight: f64) -> Option<ThresholdBreach> {
  let limit = phase.start_weight * THRESHOLD_FRACTION;
  let change = (current_weight - phase.start_weight).abs();

  let breached = match phase.kind {
    PhaseKind::Cut => current_weight < phase.start_weight && change > limit,
    PhaseKind::Bulk => current_weight > phase.start_weight && change > limit,
    PhaseKind::Maintain => false,
  };

  breached.then_some(ThresholdBreach {
    kind: phase.kind,
    start_weight: phase.start_weight,
    current_weight,
    change,
    limit,
  })
}
