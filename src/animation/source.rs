//! Pose sources that can be registered on a transformer.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::blend::PoseDelta;
use super::clip::Animation;

/// Per-registration state, e.g. an animation's playhead.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Variables {
    values: HashMap<String, f32>,
}

impl Variables {
    pub const TIME: &'static str = "time";
    pub const SPEED: &'static str = "speed";

    pub fn new() -> Self {
        Self::default()
    }

    /// Variables seeded for animation playback.
    pub fn playback(speed: f32) -> Self {
        let mut vars = Self::new();
        vars.set(Self::TIME, 0.0);
        vars.set(Self::SPEED, speed);
        vars
    }

    pub fn get(&self, key: &str) -> Option<f32> {
        self.values.get(key).copied()
    }

    pub fn set(&mut self, key: impl Into<String>, value: f32) {
        self.values.insert(key.into(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<f32> {
        self.values.remove(key)
    }

    /// Playhead, 0 if unset.
    pub fn time(&self) -> f32 {
        self.get(Self::TIME).unwrap_or(0.0)
    }

    pub fn set_time(&mut self, time: f32) {
        self.set(Self::TIME, time);
    }

    /// Playback rate, 1 if unset.
    pub fn speed(&self) -> f32 {
        self.get(Self::SPEED).unwrap_or(1.0)
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.set(Self::SPEED, speed);
    }

    /// Move the playhead by `delta_time * speed`.
    pub fn advance(&mut self, delta_time: f32) {
        let time = self.time() + delta_time * self.speed();
        self.set_time(time);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.values.iter().map(|(k, &v)| (k.as_str(), v))
    }
}

/// Anything that can produce a per-bone pose delta from registration state.
pub trait SamplePose: Send + Sync {
    fn sample(&self, variables: &Variables, bone: &str) -> PoseDelta;
}

impl SamplePose for Animation {
    fn sample(&self, variables: &Variables, bone: &str) -> PoseDelta {
        self.sample_track(bone, variables.time())
    }
}

/// A fixed table of per-bone deltas.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticPose {
    bones: HashMap<String, PoseDelta>,
}

impl StaticPose {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, bone: impl Into<String>, pose: PoseDelta) -> Self {
        self.set(bone, pose);
        self
    }

    pub fn set(&mut self, bone: impl Into<String>, pose: PoseDelta) {
        self.bones.insert(bone.into(), pose);
    }

    pub fn get(&self, bone: &str) -> Option<&PoseDelta> {
        self.bones.get(bone)
    }

    pub fn bone_names(&self) -> impl Iterator<Item = &str> {
        self.bones.keys().map(String::as_str)
    }
}

impl SamplePose for StaticPose {
    fn sample(&self, _variables: &Variables, bone: &str) -> PoseDelta {
        self.bones.get(bone).copied().unwrap_or_default()
    }
}

/// Pose-generating callback.
pub type PoseFn = Arc<dyn Fn(&Variables, &str) -> PoseDelta + Send + Sync>;

/// A registered pose source.
#[derive(Clone)]
pub enum Source {
    Animation(Arc<Animation>),
    StaticPose(Arc<StaticPose>),
    Function(PoseFn),
}

impl Source {
    /// Wrap a closure as a source.
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&Variables, &str) -> PoseDelta + Send + Sync + 'static,
    {
        Source::Function(Arc::new(f))
    }

    pub fn as_animation(&self) -> Option<&Arc<Animation>> {
        match self {
            Source::Animation(animation) => Some(animation),
            _ => None,
        }
    }
}

impl SamplePose for Source {
    fn sample(&self, variables: &Variables, bone: &str) -> PoseDelta {
        match self {
            Source::Animation(animation) => SamplePose::sample(animation.as_ref(), variables, bone),
            Source::StaticPose(pose) => SamplePose::sample(pose.as_ref(), variables, bone),
            Source::Function(f) => f(variables, bone),
        }
    }
}

impl From<Arc<Animation>> for Source {
    fn from(animation: Arc<Animation>) -> Self {
        Source::Animation(animation)
    }
}

impl From<Animation> for Source {
    fn from(animation: Animation) -> Self {
        Source::Animation(Arc::new(animation))
    }
}

impl From<StaticPose> for Source {
    fn from(pose: StaticPose) -> Self {
        Source::StaticPose(Arc::new(pose))
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Animation(animation) => f.debug_tuple("Animation").field(&animation.name()).finish(),
            Source::StaticPose(pose) => f.debug_tuple("StaticPose").field(pose).finish(),
            Source::Function(_) => f.write_str("Function(..)"),
        }
    }
}
