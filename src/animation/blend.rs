//! Layered pose blending.
//!
//! Sources are grouped into priority tiers. Inside a tier, values are averaged
//! by power; the tier then covers `min(sum of powers, 1)` of whatever lies
//! beneath it, like alpha-compositing layers. Tiers are applied from lowest to
//! highest priority on top of the identity delta, so a tier at full power hides
//! everything below it and a weaker tier lets the rest show through.

use serde::{Deserialize, Serialize};

use crate::core::types::Vec2;
use crate::math::{Angle, Lerp, Transform2D};

/// A partial local pose produced by one source for one bone.
///
/// Values are deltas over the bone's rest pose: rotation and translation add,
/// scale multiplies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseDelta {
    pub rotation: Option<f32>,
    pub translation: Option<Vec2>,
    pub scale: Option<Vec2>,
}

impl PoseDelta {
    pub fn rotation(rotation: f32) -> Self {
        Self {
            rotation: Some(rotation),
            ..Default::default()
        }
    }

    pub fn translation(translation: Vec2) -> Self {
        Self {
            translation: Some(translation),
            ..Default::default()
        }
    }

    pub fn scale(scale: Vec2) -> Self {
        Self {
            scale: Some(scale),
            ..Default::default()
        }
    }

    /// `true` if no channel is set.
    pub fn is_empty(&self) -> bool {
        self.rotation.is_none() && self.translation.is_none() && self.scale.is_none()
    }
}

/// One source's contribution to a bone.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeightedPose {
    pub priority: i32,
    pub power: f32,
    pub pose: PoseDelta,
}

/// Combine the contributions of one tier.
///
/// Returns the tier's coverage (sum of positive weights, capped at 1) and its
/// weight-normalized value. Non-positive weights are ignored. Values are folded
/// in order, so with equal weights on exactly opposite angles the later one wins.
pub fn blend_tier<T: Lerp>(contributions: impl IntoIterator<Item = (f32, T)>) -> Option<(f32, T)> {
    let mut total = 0.0;
    let mut acc: Option<T> = None;
    for (weight, value) in contributions {
        if weight <= 0.0 {
            continue;
        }
        total += weight;
        acc = Some(match acc {
            None => value,
            Some(current) => current.lerp(&value, weight / total),
        });
    }
    acc.map(|value| (total.min(1.0), value))
}

/// Composite tiers, lowest priority first, over `base`.
pub fn blend<T: Lerp>(base: T, tiers: impl IntoIterator<Item = (f32, T)>) -> T {
    tiers.into_iter().fold(base, |acc, (coverage, value)| {
        if coverage >= 1.0 {
            value
        } else if coverage <= 0.0 {
            acc
        } else {
            acc.lerp(&value, coverage)
        }
    })
}

/// Blend every channel of a bone's contributions into a resolved delta.
///
/// Channels missing from all contributions stay at identity.
pub fn blend_pose(samples: &[WeightedPose]) -> Transform2D {
    let mut sorted;
    let samples = if samples.is_sorted_by_key(|s| s.priority) {
        samples
    } else {
        sorted = samples.to_vec();
        sorted.sort_by_key(|s| s.priority);
        &sorted
    };

    let tiers = || samples.chunk_by(|a, b| a.priority == b.priority);

    let rotation = blend(
        Angle(0.0),
        tiers().filter_map(|tier| {
            blend_tier(tier.iter().filter_map(|s| s.pose.rotation.map(|r| (s.power, Angle(r)))))
        }),
    );
    let translation = blend(
        Vec2::ZERO,
        tiers().filter_map(|tier| blend_tier(tier.iter().filter_map(|s| s.pose.translation.map(|t| (s.power, t))))),
    );
    let scale = blend(
        Vec2::ONE,
        tiers().filter_map(|tier| blend_tier(tier.iter().filter_map(|s| s.pose.scale.map(|v| (s.power, v))))),
    );

    Transform2D {
        rotation: rotation.0,
        translation,
        scale,
    }
}

/// Apply a resolved delta to a rest pose.
pub fn apply_delta(rest: &Transform2D, delta: &Transform2D) -> Transform2D {
    Transform2D {
        rotation: rest.rotation + delta.rotation,
        translation: rest.translation + delta.translation,
        scale: rest.scale * delta.scale,
    }
}
