//! Bone description

use serde::{Deserialize, Serialize};

use crate::core::types::Vec2;
use crate::math::Transform2D;

/// A single joint in a skeletal hierarchy.
///
/// The bone's name is the key it is stored under in its
/// [`Skeleton`](super::Skeleton); the bone itself only refers to its parent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bone {
    /// Parent bone name, `None` for roots.
    pub parent: Option<String>,
    /// Evaluation tie-break among bones at the same depth (lower first).
    pub layer: i32,
    /// Fixed displacement from the parent's origin. Not animatable.
    pub offset: Vec2,
    /// Rest rotation in radians.
    pub default_rotation: f32,
    /// Rest translation relative to the parent.
    pub default_translation: Vec2,
    /// Rest scale.
    pub default_scale: Vec2,
}

impl Default for Bone {
    fn default() -> Self {
        Self {
            parent: None,
            layer: 0,
            offset: Vec2::ZERO,
            default_rotation: 0.0,
            default_translation: Vec2::ZERO,
            default_scale: Vec2::ONE,
        }
    }
}

impl Bone {
    /// Create a bone hanging from `parent` at `offset`, with an identity rest pose.
    pub fn new(parent: Option<&str>, layer: i32, offset: Vec2) -> Self {
        Self {
            parent: parent.map(str::to_owned),
            layer,
            offset,
            ..Default::default()
        }
    }

    /// Create a root bone.
    pub fn root(layer: i32) -> Self {
        Self::new(None, layer, Vec2::ZERO)
    }

    /// Set the rest pose.
    pub fn with_default(mut self, rotation: f32, translation: Vec2, scale: Vec2) -> Self {
        self.default_rotation = rotation;
        self.default_translation = translation;
        self.default_scale = scale;
        self
    }

    /// The rest pose as a local transform.
    pub fn default_transform(&self) -> Transform2D {
        Transform2D {
            rotation: self.default_rotation,
            translation: self.default_translation,
            scale: self.default_scale,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bone_creation() {
        let bone = Bone::new(Some("spine"), 2, Vec2::new(0.0, 10.0));
        assert_eq!(bone.parent.as_deref(), Some("spine"));
        assert_eq!(bone.layer, 2);
        assert_eq!(bone.offset, Vec2::new(0.0, 10.0));
        assert_eq!(bone.default_transform(), Transform2D::IDENTITY);
        assert!(!bone.is_root());
    }

    #[test]
    fn test_root_bone() {
        let bone = Bone::root(0);
        assert!(bone.is_root());
        assert_eq!(bone.offset, Vec2::ZERO);
    }

    #[test]
    fn test_with_default() {
        let bone = Bone::root(0).with_default(0.5, Vec2::new(1.0, 2.0), Vec2::splat(3.0));
        let rest = bone.default_transform();
        assert_eq!(rest.rotation, 0.5);
        assert_eq!(rest.translation, Vec2::new(1.0, 2.0));
        assert_eq!(rest.scale, Vec2::splat(3.0));
    }
}
