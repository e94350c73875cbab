//! Bone overlay geometry for a debug renderer

use crate::animation::Transformer;
use crate::core::config::DebugConfig;
use crate::core::types::Vec2;

const AXIS_X_COLOR: [f32; 4] = [1.0, 0.2, 0.2, 1.0];
const AXIS_Y_COLOR: [f32; 4] = [0.2, 1.0, 0.2, 1.0];

/// A world-space line segment.
#[derive(Clone, Debug, PartialEq)]
pub struct DebugLine {
    pub start: Vec2,
    pub end: Vec2,
    pub color: [f32; 4],
    pub label: Option<String>,
}

/// Overlay segments for the last computed frame of `transformer`.
///
/// Empty while the skeleton is invalid or when nothing is enabled.
pub fn debug_lines(transformer: &Transformer, config: &DebugConfig) -> Vec<DebugLine> {
    let mut lines = Vec::new();
    if !config.draw_bones && !config.draw_axes {
        return lines;
    }

    let skeleton = transformer.skeleton().read();
    let Some(order) = skeleton.render_order() else {
        return lines;
    };

    for &id in order {
        let affine = transformer.global_affine_by_id(id);

        if config.draw_bones {
            if let Some(parent) = skeleton.parent_id(id) {
                lines.push(DebugLine {
                    start: transformer.global_affine_by_id(parent).translation,
                    end: affine.translation,
                    color: config.bone_color,
                    label: config
                        .draw_names
                        .then(|| skeleton.bone_name(id).map(str::to_owned))
                        .flatten(),
                });
            }
        }

        if config.draw_axes {
            for (axis, color) in [(Vec2::X, AXIS_X_COLOR), (Vec2::Y, AXIS_Y_COLOR)] {
                lines.push(DebugLine {
                    start: affine.translation,
                    end: affine.transform_point2(axis * config.axis_length),
                    color,
                    label: None,
                });
            }
        }
    }
    lines
}
