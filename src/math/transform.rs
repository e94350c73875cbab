//! 2D rotation/translation/scale transforms and hierarchy composition.

use serde::{Deserialize, Serialize};

use crate::core::types::{Affine2, Vec2};

/// Rotation (radians), translation and non-uniform scale in 2D.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform2D {
    pub rotation: f32,
    pub translation: Vec2,
    pub scale: Vec2,
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform2D {
    pub const IDENTITY: Self = Self {
        rotation: 0.0,
        translation: Vec2::ZERO,
        scale: Vec2::ONE,
    };

    pub fn new(rotation: f32, translation: Vec2, scale: Vec2) -> Self {
        Self {
            rotation,
            translation,
            scale,
        }
    }

    /// Create a translation-only transform.
    pub fn from_translation(translation: Vec2) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    /// Create a rotation-only transform.
    pub fn from_rotation(rotation: f32) -> Self {
        Self {
            rotation,
            ..Self::IDENTITY
        }
    }

    /// Placement matrix: scale, then rotate, then translate.
    pub fn to_affine(&self) -> Affine2 {
        Affine2::from_scale_angle_translation(self.scale, self.rotation, self.translation)
    }
}

/// Matrix of a bone relative to its parent's frame.
///
/// Points are scaled, moved by `offset + local.translation`, then rotated by
/// `local.rotation` about the parent's origin. The offset is fixed per bone
/// and always sits inside the bone's own rotation, so a rotating bone swings
/// around the joint it hangs from.
///
/// This is deliberately not `T(offset) * R(rotation) * T(translation) * S(scale)`:
/// that order would spin a bone in place at its offset instead of swinging it
/// around its parent, which breaks the quarter-circle chain behavior tested in
/// `animation::transformer`.
pub fn bone_affine(offset: Vec2, local: &Transform2D) -> Affine2 {
    Affine2::from_angle(local.rotation)
        * Affine2::from_translation(offset + local.translation)
        * Affine2::from_scale(local.scale)
}

/// Compose a bone's world transform from its parent's world transform.
///
/// Returns the summary record (accumulated rotation and scale, exact origin)
/// together with the full world matrix.
pub fn compose(
    parent: &Transform2D,
    parent_affine: &Affine2,
    offset: Vec2,
    local: &Transform2D,
) -> (Transform2D, Affine2) {
    let affine = *parent_affine * bone_affine(offset, local);
    let world = Transform2D {
        rotation: parent.rotation + local.rotation,
        translation: affine.translation,
        scale: parent.scale * local.scale,
    };
    (world, affine)
}
