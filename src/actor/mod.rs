//! Actors: a transformer plus the visuals riding on its bones

pub mod attachment;
pub mod debug;

pub use attachment::{Attachment, DrawCommand};
pub use debug::{debug_lines, DebugLine};

use crate::animation::{FiredEvent, FrameStatus, SharedSkeleton, Transformer};
use crate::core::config::{DebugConfig, TransformerConfig};
use crate::core::error::Error;
use crate::core::types::Result;

/// Receives animation events as an actor updates.
pub trait EventSink {
    fn on_event(&mut self, event: &FiredEvent);
}

impl EventSink for Vec<FiredEvent> {
    fn on_event(&mut self, event: &FiredEvent) {
        self.push(event.clone());
    }
}

impl<F: FnMut(&FiredEvent)> EventSink for F {
    fn on_event(&mut self, event: &FiredEvent) {
        self(event)
    }
}

/// An animated entity: one transformer and its attachments.
#[derive(Debug)]
pub struct Actor<V> {
    transformer: Transformer,
    attachments: Vec<Attachment<V>>,
}

impl<V> Actor<V> {
    pub fn new(skeleton: SharedSkeleton) -> Self {
        Self::with_config(skeleton, TransformerConfig::default())
    }

    pub fn with_config(skeleton: SharedSkeleton, config: TransformerConfig) -> Self {
        Self {
            transformer: Transformer::with_config(skeleton, config),
            attachments: Vec::new(),
        }
    }

    pub fn transformer(&self) -> &Transformer {
        &self.transformer
    }

    pub fn transformer_mut(&mut self) -> &mut Transformer {
        &mut self.transformer
    }

    /// Add an attachment. Its bone must exist in the skeleton.
    pub fn attach(&mut self, attachment: Attachment<V>) -> Result<usize> {
        if !self.transformer.skeleton().read().contains(&attachment.bone) {
            return Err(Error::UnknownBone(attachment.bone));
        }
        self.attachments.push(attachment);
        Ok(self.attachments.len() - 1)
    }

    pub fn detach(&mut self, index: usize) -> Option<Attachment<V>> {
        (index < self.attachments.len()).then(|| self.attachments.remove(index))
    }

    pub fn attachments(&self) -> &[Attachment<V>] {
        &self.attachments
    }

    pub fn attachments_mut(&mut self) -> &mut [Attachment<V>] {
        &mut self.attachments
    }

    /// Advance every animation by `delta_time`, run the frame and hand crossed events to `sink`.
    ///
    /// A skipped frame delivers nothing; its crossings are reported by the next computed frame.
    pub fn update(&mut self, delta_time: f32, sink: &mut impl EventSink) -> FrameStatus {
        self.transformer.advance_all(delta_time);
        let status = self.transformer.update();
        if status == FrameStatus::Computed {
            for event in self.transformer.events() {
                sink.on_event(event);
            }
        }
        status
    }

    /// Visuals to draw this frame, in bone render order then attachment layer.
    ///
    /// Fails with [`Error::InvalidSkeleton`] while the skeleton is not validated.
    pub fn draw_list(&self) -> Result<Vec<DrawCommand<'_, V>>> {
        let skeleton = self.transformer.skeleton().read();
        let order = skeleton.render_order().ok_or_else(|| {
            log::warn!("Refusing to draw actor: skeleton is not validated");
            Error::InvalidSkeleton
        })?;

        let mut rank = vec![usize::MAX; skeleton.id_capacity()];
        for (position, id) in order.iter().enumerate() {
            rank[id.index()] = position;
        }

        let mut commands = Vec::with_capacity(self.attachments.len());
        for attachment in &self.attachments {
            let Some(id) = skeleton.find_bone(&attachment.bone) else {
                log::debug!("Attachment on removed bone '{}' skipped", attachment.bone);
                continue;
            };
            let Some(visual) = attachment.visual.as_ref() else {
                log::debug!("Attachment on '{}' has no visual", attachment.bone);
                continue;
            };
            let command = DrawCommand {
                bone: attachment.bone.as_str(),
                visual,
                transform: attachment.world_affine(&self.transformer.global_affine_by_id(id)),
                layer: attachment.layer,
            };
            commands.push(((rank[id.index()], attachment.layer), command));
        }

        commands.sort_by_key(|(key, _)| *key);
        Ok(commands.into_iter().map(|(_, command)| command).collect())
    }

    pub fn debug_lines(&self, config: &DebugConfig) -> Vec<DebugLine> {
        debug::debug_lines(&self.transformer, config)
    }
}
