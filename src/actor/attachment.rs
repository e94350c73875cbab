//! Visuals pinned to bones

use crate::core::types::Affine2;
use crate::math::Transform2D;

/// A visual carried by a bone.
///
/// `visual` is opaque to the engine; `None` marks a slot that is set up but
/// has nothing to draw yet.
#[derive(Clone, Debug)]
pub struct Attachment<V> {
    pub bone: String,
    pub visual: Option<V>,
    /// Draw order among attachments of bones at the same position in render order.
    pub layer: i32,
    /// Placement relative to the bone.
    pub local: Transform2D,
}

impl<V> Attachment<V> {
    pub fn new(bone: impl Into<String>, visual: V) -> Self {
        Self {
            bone: bone.into(),
            visual: Some(visual),
            layer: 0,
            local: Transform2D::IDENTITY,
        }
    }

    /// An attachment with no visual yet.
    pub fn empty(bone: impl Into<String>) -> Self {
        Self {
            bone: bone.into(),
            visual: None,
            layer: 0,
            local: Transform2D::IDENTITY,
        }
    }

    pub fn with_layer(mut self, layer: i32) -> Self {
        self.layer = layer;
        self
    }

    pub fn with_local(mut self, local: Transform2D) -> Self {
        self.local = local;
        self
    }

    /// World matrix of the visual given its bone's world matrix.
    pub fn world_affine(&self, bone_affine: &Affine2) -> Affine2 {
        *bone_affine * self.local.to_affine()
    }
}

/// One entry of a draw list: a visual and where to put it.
#[derive(Clone, Debug)]
pub struct DrawCommand<'a, V> {
    pub bone: &'a str,
    pub visual: &'a V,
    pub transform: Affine2,
    pub layer: i32,
}
