//! Runtime pose evaluation: blending registered sources and propagating
//! transforms through the bone hierarchy.
//!
//! A frame is driven entirely by the caller:
//!
//! 1. advance each registration's own variables (e.g. [`Transformer::advance`]),
//! 2. call [`Transformer::update`] (or `calculate_local` + `calculate_global`),
//! 3. read [`Transformer::global_pose`] and [`Transformer::events`].
//!
//! `update` never touches registration time by itself.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::blend::{apply_delta, blend_pose, WeightedPose};
use super::skeleton::{BoneId, SharedSkeleton, Skeleton};
use super::source::{SamplePose, Source, Variables};
use crate::core::config::TransformerConfig;
use crate::core::error::Error;
use crate::core::types::{Affine2, Result};
use crate::math::{compose, Transform2D};

/// Which bones a registration drives.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum BoneMask {
    #[default]
    All,
    Bones(HashSet<String>),
}

impl BoneMask {
    /// Mask covering exactly the given bones.
    pub fn bones<I, S>(bones: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        BoneMask::Bones(bones.into_iter().map(Into::into).collect())
    }

    /// Mask covering `bone` and all of its descendants.
    pub fn subtree(skeleton: &Skeleton, bone: &str) -> Result<Self> {
        Ok(BoneMask::Bones(skeleton.bone_list(Some(bone))?.into_iter().collect()))
    }

    pub fn contains(&self, bone: &str) -> bool {
        match self {
            BoneMask::All => true,
            BoneMask::Bones(bones) => bones.contains(bone),
        }
    }

    fn check(&self, skeleton: &Skeleton) -> Result<()> {
        if let BoneMask::Bones(bones) = self {
            if let Some(missing) = bones.iter().find(|b| !skeleton.contains(b)) {
                return Err(Error::UnknownBone(missing.clone()));
            }
        }
        Ok(())
    }
}

/// An event crossed by a registration's playhead during the last update.
#[derive(Clone, Debug, PartialEq)]
pub struct FiredEvent {
    pub registration: String,
    pub event: String,
    pub time: f32,
}

/// Outcome of a per-frame calculation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameStatus {
    Computed,
    /// The skeleton was not valid; poses keep their previous values.
    SkippedInvalidSkeleton,
}

#[derive(Debug)]
struct Registration {
    name: String,
    source: Source,
    priority: i32,
    power: f32,
    mask: BoneMask,
    variables: Variables,
    /// Playhead at the previous update, for event sweeps.
    last_time: f32,
}

impl Registration {
    fn is_active(&self) -> bool {
        self.power > 0.0
    }
}

/// Blends weighted pose sources into local and world bone transforms for one actor.
#[derive(Debug)]
pub struct Transformer {
    skeleton: SharedSkeleton,
    config: TransformerConfig,
    registrations: Vec<Registration>,
    index: HashMap<String, usize>,
    /// Placement of the whole actor, applied outside every root bone.
    pub root: Transform2D,
    local_pose: Vec<Transform2D>,
    global_pose: Vec<Transform2D>,
    global_affine: Vec<Affine2>,
    pose_version: Option<u64>,
    events: Vec<FiredEvent>,
    scratch: Vec<WeightedPose>,
}

impl Transformer {
    /// Create a transformer with default configuration.
    pub fn new(skeleton: SharedSkeleton) -> Self {
        Self::with_config(skeleton, TransformerConfig::default())
    }

    pub fn with_config(skeleton: SharedSkeleton, config: TransformerConfig) -> Self {
        Self {
            skeleton,
            config,
            registrations: Vec::new(),
            index: HashMap::new(),
            root: Transform2D::IDENTITY,
            local_pose: Vec::new(),
            global_pose: Vec::new(),
            global_affine: Vec::new(),
            pose_version: None,
            events: Vec::new(),
            scratch: Vec::new(),
        }
    }

    pub fn skeleton(&self) -> &SharedSkeleton {
        &self.skeleton
    }

    pub fn config(&self) -> &TransformerConfig {
        &self.config
    }

    // ---------------------------------------------------------------------
    // Registrations
    // ---------------------------------------------------------------------

    /// Register a source under a unique name, inactive (power 0, priority 0).
    ///
    /// Animation sources get `time = 0` and `speed` seeded into their variables.
    /// Mask bones and static pose bones must exist in the skeleton.
    pub fn register(&mut self, name: impl Into<String>, source: impl Into<Source>, mask: Option<BoneMask>) -> Result<()> {
        let name = name.into();
        if self.index.contains_key(&name) {
            return Err(Error::DuplicateRegistration(name));
        }

        let source = source.into();
        let mask = mask.unwrap_or_default();
        {
            let skeleton = self.skeleton.read();
            mask.check(&skeleton)?;
            match &source {
                Source::StaticPose(pose) => {
                    if let Some(missing) = pose.bone_names().find(|b| !skeleton.contains(b)) {
                        return Err(Error::UnknownBone(missing.to_owned()));
                    }
                }
                Source::Animation(animation) => {
                    if !Arc::ptr_eq(animation.skeleton(), &self.skeleton) {
                        log::warn!(
                            "Animation '{}' registered as '{}' was authored against a different skeleton",
                            animation.name(),
                            name
                        );
                    }
                }
                Source::Function(_) => {}
            }
        }

        let variables = if source.as_animation().is_some() {
            Variables::playback(self.config.default_speed)
        } else {
            Variables::new()
        };

        log::debug!("Registered '{}' ({:?})", name, source);
        self.index.insert(name.clone(), self.registrations.len());
        self.registrations.push(Registration {
            last_time: variables.time(),
            name,
            source,
            priority: 0,
            power: 0.0,
            mask,
            variables,
        });
        Ok(())
    }

    /// Remove a registration.
    pub fn unregister(&mut self, name: &str) -> Result<()> {
        let idx = self
            .index
            .remove(name)
            .ok_or_else(|| Error::UnknownRegistration(name.to_owned()))?;
        self.registrations.remove(idx);
        for (i, reg) in self.registrations.iter().enumerate().skip(idx) {
            self.index.insert(reg.name.clone(), i);
        }
        Ok(())
    }

    /// Registration names in registration order.
    pub fn registration_names(&self) -> impl Iterator<Item = &str> {
        self.registrations.iter().map(|r| r.name.as_str())
    }

    pub fn set_priority(&mut self, name: &str, priority: i32) -> Result<()> {
        self.registration_mut(name)?.priority = priority;
        Ok(())
    }

    pub fn priority(&self, name: &str) -> Result<i32> {
        Ok(self.registration(name)?.priority)
    }

    /// Set activation weight. 0 (or below) deactivates; values above 1 are allowed
    /// but a tier never covers more than 1.
    pub fn set_power(&mut self, name: &str, power: f32) -> Result<()> {
        self.registration_mut(name)?.power = power;
        Ok(())
    }

    pub fn power(&self, name: &str) -> Result<f32> {
        Ok(self.registration(name)?.power)
    }

    pub fn is_active(&self, name: &str) -> Result<bool> {
        Ok(self.registration(name)?.is_active())
    }

    pub fn set_bone_mask(&mut self, name: &str, mask: BoneMask) -> Result<()> {
        mask.check(&self.skeleton.read())?;
        self.registration_mut(name)?.mask = mask;
        Ok(())
    }

    pub fn bone_mask(&self, name: &str) -> Result<&BoneMask> {
        Ok(&self.registration(name)?.mask)
    }

    pub fn variables(&self, name: &str) -> Result<&Variables> {
        Ok(&self.registration(name)?.variables)
    }

    pub fn variables_mut(&mut self, name: &str) -> Result<&mut Variables> {
        Ok(&mut self.registration_mut(name)?.variables)
    }

    /// Advance a registration's playhead by `delta_time * speed`.
    pub fn advance(&mut self, name: &str, delta_time: f32) -> Result<()> {
        self.registration_mut(name)?.variables.advance(delta_time);
        Ok(())
    }

    /// Advance every animation registration, active or not.
    pub fn advance_all(&mut self, delta_time: f32) {
        for reg in &mut self.registrations {
            if reg.source.as_animation().is_some() {
                reg.variables.advance(delta_time);
            }
        }
    }

    fn registration(&self, name: &str) -> Result<&Registration> {
        self.index
            .get(name)
            .map(|&idx| &self.registrations[idx])
            .ok_or_else(|| Error::UnknownRegistration(name.to_owned()))
    }

    fn registration_mut(&mut self, name: &str) -> Result<&mut Registration> {
        match self.index.get(name) {
            Some(&idx) => Ok(&mut self.registrations[idx]),
            None => Err(Error::UnknownRegistration(name.to_owned())),
        }
    }

    // ---------------------------------------------------------------------
    // Per-frame evaluation
    // ---------------------------------------------------------------------

    /// Blend local poses, propagate world poses and collect crossed events.
    ///
    /// The event feed only ever holds the events of this call; a skipped
    /// frame leaves it empty.
    pub fn update(&mut self) -> FrameStatus {
        self.events.clear();
        let status = self.calculate_local();
        if status == FrameStatus::Computed {
            self.calculate_global();
            self.collect_events();
        }
        status
    }

    /// Blend every active source into each bone's local transform.
    pub fn calculate_local(&mut self) -> FrameStatus {
        let shared = Arc::clone(&self.skeleton);
        let skeleton = shared.read();
        let Some(order) = skeleton.render_order() else {
            self.report_invalid();
            return FrameStatus::SkippedInvalidSkeleton;
        };
        self.sync_storage(&skeleton);

        let mut active: Vec<&Registration> = self.registrations.iter().filter(|r| r.is_active()).collect();
        active.sort_by_key(|r| r.priority);

        for &id in order {
            let (Some(name), Some(bone)) = (skeleton.bone_name(id), skeleton.bone(id)) else {
                continue;
            };

            self.scratch.clear();
            for reg in &active {
                if !reg.mask.contains(name) {
                    continue;
                }
                let pose = reg.source.sample(&reg.variables, name);
                if !pose.is_empty() {
                    self.scratch.push(WeightedPose {
                        priority: reg.priority,
                        power: reg.power,
                        pose,
                    });
                }
            }

            let rest = bone.default_transform();
            self.local_pose[id.index()] = if self.scratch.is_empty() {
                rest
            } else {
                apply_delta(&rest, &blend_pose(&self.scratch))
            };
        }

        log::trace!("Blended {} bones from {} active sources", order.len(), active.len());
        FrameStatus::Computed
    }

    /// Compose world transforms in hierarchy order from the current local poses.
    pub fn calculate_global(&mut self) -> FrameStatus {
        let shared = Arc::clone(&self.skeleton);
        let skeleton = shared.read();
        let Some(order) = skeleton.render_order() else {
            self.report_invalid();
            return FrameStatus::SkippedInvalidSkeleton;
        };
        self.sync_storage(&skeleton);

        let root_affine = self.root.to_affine();
        for &id in order {
            let Some(bone) = skeleton.bone(id) else {
                continue;
            };
            let (parent, parent_affine) = match skeleton.parent_id(id) {
                Some(parent) => (self.global_pose[parent.index()], self.global_affine[parent.index()]),
                None => (self.root, root_affine),
            };
            let (world, affine) = compose(&parent, &parent_affine, bone.offset, &self.local_pose[id.index()]);
            self.global_pose[id.index()] = world;
            self.global_affine[id.index()] = affine;
        }

        FrameStatus::Computed
    }

    /// Sweep each animation registration's playhead since the previous update.
    ///
    /// Negative speed reports the crossed events in reverse time order.
    fn collect_events(&mut self) {
        for reg in &mut self.registrations {
            let Some(animation) = reg.source.as_animation() else {
                continue;
            };
            let now = reg.variables.time();
            if now != reg.last_time {
                let reverse = reg.variables.speed() < 0.0;
                for event in animation.events_between(reg.last_time, now, reverse) {
                    self.events.push(FiredEvent {
                        registration: reg.name.clone(),
                        event: event.name.clone(),
                        time: event.time,
                    });
                }
            }
            reg.last_time = now;
        }
    }

    fn report_invalid(&self) {
        if self.config.warn_on_invalid_skeleton {
            log::warn!("Skipping pose update: skeleton is not validated");
        }
    }

    /// Resize pose storage after a structural change, seeding locals with rest poses.
    fn sync_storage(&mut self, skeleton: &Skeleton) {
        if self.pose_version == Some(skeleton.version()) {
            return;
        }
        let capacity = skeleton.id_capacity();
        self.local_pose = (0..capacity)
            .map(|i| {
                skeleton
                    .bone(BoneId(i as u32))
                    .map(|b| b.default_transform())
                    .unwrap_or_default()
            })
            .collect();
        self.global_pose = vec![Transform2D::IDENTITY; capacity];
        self.global_affine = vec![Affine2::IDENTITY; capacity];
        self.pose_version = Some(skeleton.version());
    }

    // ---------------------------------------------------------------------
    // Results
    // ---------------------------------------------------------------------

    /// Events crossed during the last [`update`](Self::update), in playback order.
    pub fn events(&self) -> &[FiredEvent] {
        &self.events
    }

    /// Take the events of the last update, leaving the feed empty.
    pub fn take_events(&mut self) -> Vec<FiredEvent> {
        std::mem::take(&mut self.events)
    }

    /// Local transform of a bone from the last computed frame.
    pub fn local_pose(&self, bone: &str) -> Result<Transform2D> {
        let id = self.bone_id(bone)?;
        Ok(self.local_pose_by_id(id))
    }

    /// World transform of a bone from the last computed frame.
    pub fn global_pose(&self, bone: &str) -> Result<Transform2D> {
        let id = self.bone_id(bone)?;
        Ok(self.global_pose_by_id(id))
    }

    /// World matrix of a bone from the last computed frame.
    pub fn global_affine(&self, bone: &str) -> Result<Affine2> {
        let id = self.bone_id(bone)?;
        Ok(self.global_affine_by_id(id))
    }

    pub fn local_pose_by_id(&self, id: BoneId) -> Transform2D {
        self.local_pose.get(id.index()).copied().unwrap_or_default()
    }

    pub fn global_pose_by_id(&self, id: BoneId) -> Transform2D {
        self.global_pose.get(id.index()).copied().unwrap_or_default()
    }

    pub fn global_affine_by_id(&self, id: BoneId) -> Affine2 {
        self.global_affine.get(id.index()).copied().unwrap_or(Affine2::IDENTITY)
    }

    /// `(bone name, world transform)` in evaluation order. Empty while the skeleton is invalid.
    pub fn global_poses(&self) -> Vec<(String, Transform2D)> {
        let skeleton = self.skeleton.read();
        skeleton
            .render_order()
            .unwrap_or(&[])
            .iter()
            .filter_map(|&id| {
                skeleton
                    .bone_name(id)
                    .map(|name| (name.to_owned(), self.global_pose_by_id(id)))
            })
            .collect()
    }

    fn bone_id(&self, bone: &str) -> Result<BoneId> {
        self.skeleton
            .read()
            .find_bone(bone)
            .ok_or_else(|| Error::UnknownBone(bone.to_owned()))
    }
}
