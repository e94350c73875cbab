//! Flat, upload-ready snapshot of a transformer's world matrices

use bytemuck::{Pod, Zeroable};

use super::transformer::Transformer;
use crate::core::error::Error;
use crate::core::types::{Affine2, Mat2, Result, Vec2};

/// One bone's world matrix in a GPU-friendly layout (32 bytes).
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct GpuBoneAffine {
    /// Column-major 2x2 linear part
    pub matrix: [[f32; 2]; 2],
    pub translation: [f32; 2],
    pub depth: u32,
    pub layer: i32,
}

impl GpuBoneAffine {
    pub fn from_affine(affine: Affine2, depth: u32, layer: i32) -> Self {
        Self {
            matrix: affine.matrix2.to_cols_array_2d(),
            translation: affine.translation.to_array(),
            depth,
            layer,
        }
    }

    pub fn identity() -> Self {
        Self::from_affine(Affine2::IDENTITY, 0, 0)
    }

    pub fn to_affine(&self) -> Affine2 {
        Affine2::from_mat2_translation(Mat2::from_cols_array_2d(&self.matrix), Vec2::from_array(self.translation))
    }
}

/// World matrices of every bone, in evaluation order.
#[derive(Clone, Debug, Default)]
pub struct PoseBuffer {
    rows: Vec<GpuBoneAffine>,
    names: Vec<String>,
}

impl PoseBuffer {
    /// Snapshot the last computed frame of `transformer`.
    ///
    /// Fails with [`Error::InvalidSkeleton`] while the skeleton is not validated.
    pub fn from_transformer(transformer: &Transformer) -> Result<Self> {
        let skeleton = transformer.skeleton().read();
        let order = skeleton.render_order().ok_or(Error::InvalidSkeleton)?;

        let mut buffer = Self {
            rows: Vec::with_capacity(order.len()),
            names: Vec::with_capacity(order.len()),
        };
        for &id in order {
            let (Some(name), Some(bone)) = (skeleton.bone_name(id), skeleton.bone(id)) else {
                continue;
            };
            let depth = skeleton.depth(id).unwrap_or(0) as u32;
            buffer
                .rows
                .push(GpuBoneAffine::from_affine(transformer.global_affine_by_id(id), depth, bone.layer));
            buffer.names.push(name.to_owned());
        }
        Ok(buffer)
    }

    pub fn rows(&self) -> &[GpuBoneAffine] {
        &self.rows
    }

    /// Bone name of each row.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn index_of(&self, bone: &str) -> Option<usize> {
        self.names.iter().position(|n| n == bone)
    }

    /// Raw bytes for a storage buffer upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.rows)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
