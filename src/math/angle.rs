//! Angle helpers and the interpolation trait shared by sampling and blending.

use std::f32::consts::{PI, TAU};

use crate::core::types::Vec2;

/// Trait for types that can be linearly interpolated.
pub trait Lerp: Copy {
    fn lerp(&self, other: &Self, t: f32) -> Self;
}

impl Lerp for f32 {
    #[inline]
    fn lerp(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Lerp for Vec2 {
    #[inline]
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Vec2::lerp(*self, *other, t)
    }
}

/// A rotation in radians that interpolates along the shortest arc.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Angle(pub f32);

impl Lerp for Angle {
    #[inline]
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Angle(lerp_angle(self.0, other.0, t))
    }
}

/// Wrap an angle into `(-PI, PI]`.
#[inline]
pub fn wrap_angle(radians: f32) -> f32 {
    let wrapped = (radians + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI { wrapped + TAU } else { wrapped }
}

/// Signed shortest difference `to - from`, in `(-PI, PI]`.
#[inline]
pub fn shortest_delta(from: f32, to: f32) -> f32 {
    wrap_angle(to - from)
}

/// Interpolate from `a` toward `b` along the shortest arc.
///
/// The result is continuous with `a` (not wrapped), so `lerp_angle(170°, -170°, 0.5)`
/// yields `180°` rather than jumping across the seam.
#[inline]
pub fn lerp_angle(a: f32, b: f32, t: f32) -> f32 {
    a + shortest_delta(a, b) * t
}
