//! Animation clip, keyframe and event system

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::blend::PoseDelta;
use super::skeleton::SharedSkeleton;
use crate::core::error::Error;
use crate::core::types::{Result, Vec2};
use crate::math::{Angle, Lerp};

/// A timestamped partial pose on one bone's track.
///
/// Channels left as `None` are skipped when interpolating that channel, so a
/// rotation-only key does not interrupt a running translation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f32,
    pub rotation: Option<f32>,
    pub translation: Option<Vec2>,
    pub scale: Option<Vec2>,
}

impl Keyframe {
    pub fn new(time: f32, rotation: Option<f32>, translation: Option<Vec2>, scale: Option<Vec2>) -> Self {
        Self {
            time,
            rotation,
            translation,
            scale,
        }
    }

    /// Overwrite the channels `other` provides, keep the rest.
    fn merge(&mut self, other: &Keyframe) {
        if other.rotation.is_some() {
            self.rotation = other.rotation;
        }
        if other.translation.is_some() {
            self.translation = other.translation;
        }
        if other.scale.is_some() {
            self.scale = other.scale;
        }
    }
}

/// Keyframes of a single bone, sorted by strictly increasing time.
#[derive(Clone, Debug, Default)]
pub struct BoneTrack {
    keyframes: Vec<Keyframe>,
}

impl BoneTrack {
    /// Create a new empty bone track
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    /// Insert a keyframe in time order, merging channels into an existing key at the same time.
    pub fn add_keyframe(&mut self, keyframe: Keyframe) {
        match self
            .keyframes
            .binary_search_by(|k| k.time.total_cmp(&keyframe.time))
        {
            Ok(pos) => self.keyframes[pos].merge(&keyframe),
            Err(pos) => self.keyframes.insert(pos, keyframe),
        }
    }

    /// Sample every channel at `time`, clamped to the track's range.
    pub fn sample(&self, time: f32) -> PoseDelta {
        PoseDelta {
            rotation: self.sample_channel(time, |k| k.rotation.map(Angle)).map(|a| a.0),
            translation: self.sample_channel(time, |k| k.translation),
            scale: self.sample_channel(time, |k| k.scale),
        }
    }

    /// Get the duration of this track (time of last keyframe)
    pub fn duration(&self) -> f32 {
        self.keyframes.last().map(|k| k.time).unwrap_or(0.0)
    }

    fn sample_channel<T: Lerp>(&self, time: f32, channel: impl Fn(&Keyframe) -> Option<T>) -> Option<T> {
        let mut before = None;
        let mut after = None;
        for keyframe in &self.keyframes {
            let Some(value) = channel(keyframe) else {
                continue;
            };
            if keyframe.time <= time {
                before = Some((keyframe.time, value));
            } else {
                after = Some((keyframe.time, value));
                break;
            }
        }

        match (before, after) {
            (Some((t0, v0)), Some((t1, v1))) => {
                if time <= t0 {
                    return Some(v0);
                }
                let frac = (time - t0) / (t1 - t0);
                Some(v0.lerp(&v1, frac))
            }
            (Some((_, v)), None) | (None, Some((_, v))) => Some(v),
            (None, None) => None,
        }
    }
}

/// A named event at a point on the animation timeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimationEvent {
    pub time: f32,
    pub name: String,
}

/// A keyframed animation authored against one skeleton.
#[derive(Clone, Debug)]
pub struct Animation {
    name: String,
    skeleton: SharedSkeleton,
    tracks: HashMap<String, BoneTrack>,
    events: Vec<AnimationEvent>,
    duration: f32,
}

impl Animation {
    /// Create a new empty animation
    pub fn new(name: impl Into<String>, skeleton: SharedSkeleton) -> Self {
        Self {
            name: name.into(),
            skeleton,
            tracks: HashMap::new(),
            events: Vec::new(),
            duration: 0.0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn skeleton(&self) -> &SharedSkeleton {
        &self.skeleton
    }

    /// Add a keyframe for `bone` at `time`.
    ///
    /// Fails if the bone is not part of the skeleton or the time is negative or
    /// not finite. An existing key at the same time only has the provided
    /// channels overwritten.
    pub fn add_keyframe(
        &mut self,
        bone: &str,
        time: f32,
        rotation: Option<f32>,
        translation: Option<Vec2>,
        scale: Option<Vec2>,
    ) -> Result<()> {
        check_time(time)?;
        if !self.skeleton.read().contains(bone) {
            return Err(Error::UnknownBone(bone.to_owned()));
        }

        self.tracks
            .entry(bone.to_owned())
            .or_default()
            .add_keyframe(Keyframe::new(time, rotation, translation, scale));
        self.duration = self.duration.max(time);
        Ok(())
    }

    /// Add a named event. Events sharing a time keep insertion order.
    pub fn add_event(&mut self, time: f32, name: impl Into<String>) -> Result<()> {
        check_time(time)?;
        let pos = self.events.partition_point(|e| e.time <= time);
        self.events.insert(
            pos,
            AnimationEvent {
                time,
                name: name.into(),
            },
        );
        self.duration = self.duration.max(time);
        Ok(())
    }

    /// Latest keyframe or event time, 0 when empty.
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Get the track of a bone, if it has one.
    pub fn track(&self, bone: &str) -> Option<&BoneTrack> {
        self.tracks.get(bone)
    }

    pub fn events(&self) -> &[AnimationEvent] {
        &self.events
    }

    /// Sample a bone at `time`. Channels are `None` if the bone has no keys for them.
    pub fn sample(&self, bone: &str, time: f32) -> Result<PoseDelta> {
        if !self.skeleton.read().contains(bone) {
            return Err(Error::UnknownBone(bone.to_owned()));
        }
        Ok(self.sample_track(bone, time))
    }

    /// Sample without checking the bone against the skeleton.
    pub(crate) fn sample_track(&self, bone: &str, time: f32) -> PoseDelta {
        self.tracks
            .get(bone)
            .map(|track| track.sample(time))
            .unwrap_or_default()
    }

    /// Names of events in `(start, end]`, in time order.
    pub fn events_in_range(&self, start: f32, end: f32) -> Vec<&str> {
        self.forward_events(start, end).iter().map(|e| e.name.as_str()).collect()
    }

    /// Events crossed when the playhead moves between `from` and `to`.
    ///
    /// The sweep covers `(min, max]` of the two times. Events come in time
    /// order, or reverse time order when `reverse` is set.
    pub fn events_between(&self, from: f32, to: f32, reverse: bool) -> Vec<&AnimationEvent> {
        let crossed = self.forward_events(from.min(to), from.max(to)).iter();
        if reverse {
            crossed.rev().collect()
        } else {
            crossed.collect()
        }
    }

    fn forward_events(&self, start: f32, end: f32) -> &[AnimationEvent] {
        if end <= start {
            return &[];
        }
        let lo = self.events.partition_point(|e| e.time <= start);
        let hi = self.events.partition_point(|e| e.time <= end);
        &self.events[lo..hi]
    }
}

fn check_time(time: f32) -> Result<()> {
    if time.is_finite() && time >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidTime(time))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{Bone, Skeleton};
    use std::f32::consts::{FRAC_PI_2, PI};

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    fn test_skeleton() -> SharedSkeleton {
        let mut skeleton = Skeleton::new();
        skeleton.set_bone("root", Bone::root(0));
        skeleton.set_bone("arm", Bone::new(Some("root"), 0, Vec2::new(10.0, 0.0)));
        skeleton.validate().unwrap();
        skeleton.into_shared()
    }

    #[test]
    fn test_keyframes_sorted() {
        let mut track = BoneTrack::new();
        track.add_keyframe(Keyframe::new(1.0, Some(1.0), None, None));
        track.add_keyframe(Keyframe::new(0.0, Some(0.0), None, None));
        track.add_keyframe(Keyframe::new(0.5, Some(0.5), None, None));

        let times: Vec<f32> = track.keyframes().iter().map(|k| k.time).collect();
        assert_eq!(times, vec![0.0, 0.5, 1.0]);
        assert_eq!(track.duration(), 1.0);
    }

    #[test]
    fn test_same_time_merges_channels() {
        let mut track = BoneTrack::new();
        track.add_keyframe(Keyframe::new(1.0, Some(1.0), Some(Vec2::X), None));
        track.add_keyframe(Keyframe::new(1.0, None, Some(Vec2::Y), Some(Vec2::splat(2.0))));

        assert_eq!(track.keyframes().len(), 1);
        let key = track.keyframes()[0];
        assert_eq!(key.rotation, Some(1.0));
        assert_eq!(key.translation, Some(Vec2::Y));
        assert_eq!(key.scale, Some(Vec2::splat(2.0)));
    }

    #[test]
    fn test_add_keyframe_unknown_bone() {
        let mut anim = Animation::new("wave", test_skeleton());
        let result = anim.add_keyframe("tail", 0.0, Some(0.0), None, None);
        assert!(matches!(result, Err(Error::UnknownBone(_))));
    }

    #[test]
    fn test_add_keyframe_invalid_time() {
        let mut anim = Animation::new("wave", test_skeleton());
        assert!(matches!(anim.add_keyframe("arm", -1.0, Some(0.0), None, None), Err(Error::InvalidTime(_))));
        assert!(matches!(anim.add_keyframe("arm", f32::NAN, Some(0.0), None, None), Err(Error::InvalidTime(_))));
        assert!(matches!(anim.add_event(f32::INFINITY, "step"), Err(Error::InvalidTime(_))));
    }

    #[test]
    fn test_sample_exact_and_clamped() {
        let mut anim = Animation::new("wave", test_skeleton());
        anim.add_keyframe("arm", 1.0, Some(0.3), Some(Vec2::new(1.0, 2.0)), None).unwrap();
        anim.add_keyframe("arm", 2.0, Some(0.9), Some(Vec2::new(5.0, 6.0)), None).unwrap();

        let exact = anim.sample("arm", 1.0).unwrap();
        assert_eq!(exact.rotation, Some(0.3));
        assert_eq!(exact.translation, Some(Vec2::new(1.0, 2.0)));
        let exact_end = anim.sample("arm", 2.0).unwrap();
        assert_eq!(exact_end.rotation, Some(0.9));

        let before = anim.sample("arm", 0.0).unwrap();
        assert_eq!(before.rotation, Some(0.3));
        let after = anim.sample("arm", 10.0).unwrap();
        assert_eq!(after.translation, Some(Vec2::new(5.0, 6.0)));
        assert_eq!(after.scale, None);
    }

    #[test]
    fn test_sample_interpolates() {
        let mut anim = Animation::new("wave", test_skeleton());
        anim.add_keyframe("arm", 0.0, Some(0.0), Some(Vec2::ZERO), Some(Vec2::ONE)).unwrap();
        anim.add_keyframe("arm", 1.0, Some(FRAC_PI_2), Some(Vec2::new(10.0, 0.0)), Some(Vec2::splat(3.0))).unwrap();

        let mid = anim.sample("arm", 0.5).unwrap();
        assert!(approx_eq(mid.rotation.unwrap(), FRAC_PI_2 / 2.0));
        assert!((mid.translation.unwrap() - Vec2::new(5.0, 0.0)).length() < 1e-4);
        assert!((mid.scale.unwrap() - Vec2::splat(2.0)).length() < 1e-4);
    }

    #[test]
    fn test_rotation_takes_short_path() {
        let mut anim = Animation::new("spin", test_skeleton());
        anim.add_keyframe("arm", 0.0, Some(170f32.to_radians()), None, None).unwrap();
        anim.add_keyframe("arm", 1.0, Some((-170f32).to_radians()), None, None).unwrap();

        let mid = anim.sample("arm", 0.5).unwrap().rotation.unwrap();
        assert!(approx_eq(mid.cos(), -1.0));
        assert!(approx_eq(mid, PI));
        let quarter = anim.sample("arm", 0.25).unwrap().rotation.unwrap();
        assert!(approx_eq(quarter, 175f32.to_radians()));
    }

    #[test]
    fn test_partial_channels_do_not_interrupt() {
        let mut anim = Animation::new("walk", test_skeleton());
        anim.add_keyframe("arm", 0.0, None, Some(Vec2::ZERO), None).unwrap();
        anim.add_keyframe("arm", 1.0, Some(1.0), None, None).unwrap();
        anim.add_keyframe("arm", 2.0, None, Some(Vec2::new(20.0, 0.0)), None).unwrap();

        let pose = anim.sample("arm", 1.0).unwrap();
        // translation interpolates straight across the rotation-only key
        assert!((pose.translation.unwrap() - Vec2::new(10.0, 0.0)).length() < 1e-4);
        // rotation has a single key, so it is constant
        assert_eq!(pose.rotation, Some(1.0));
        assert_eq!(anim.sample("arm", 0.0).unwrap().rotation, Some(1.0));
        assert_eq!(pose.scale, None);
    }

    #[test]
    fn test_sample_without_track() {
        let anim = Animation::new("idle", test_skeleton());
        let pose = anim.sample("root", 0.5).unwrap();
        assert!(pose.is_empty());
        assert!(matches!(anim.sample("tail", 0.5), Err(Error::UnknownBone(_))));
    }

    #[test]
    fn test_duration() {
        let mut anim = Animation::new("walk", test_skeleton());
        assert_eq!(anim.duration(), 0.0);
        anim.add_keyframe("arm", 1.5, Some(0.0), None, None).unwrap();
        anim.add_keyframe("root", 0.5, Some(0.0), None, None).unwrap();
        assert_eq!(anim.duration(), 1.5);
        anim.add_event(2.5, "end").unwrap();
        assert_eq!(anim.duration(), 2.5);
    }

    #[test]
    fn test_events_in_range() {
        let mut anim = Animation::new("walk", test_skeleton());
        anim.add_event(0.5, "step_left").unwrap();
        anim.add_event(1.0, "step_right").unwrap();
        anim.add_event(0.5, "dust").unwrap();

        assert_eq!(anim.events_in_range(0.0, 0.5), vec!["step_left", "dust"]);
        // exclusive start: a tick ending exactly on the event fired it already
        assert!(anim.events_in_range(0.5, 0.9).is_empty());
        assert_eq!(anim.events_in_range(0.9, 1.0), vec!["step_right"]);
        assert_eq!(anim.events_in_range(0.0, 2.0), vec!["step_left", "dust", "step_right"]);
        assert!(anim.events_in_range(0.6, 0.7).is_empty());
        assert!(anim.events_in_range(1.0, 0.0).is_empty());
    }

    #[test]
    fn test_events_between_reverse() {
        let mut anim = Animation::new("walk", test_skeleton());
        anim.add_event(0.5, "a").unwrap();
        anim.add_event(1.0, "b").unwrap();

        let names = |from: f32, to: f32| -> Vec<String> {
            anim.events_between(from, to, true).iter().map(|e| e.name.clone()).collect()
        };
        assert_eq!(names(1.5, 0.0), vec!["b", "a"]);
        // the sweep start is inclusive, its end exclusive
        assert_eq!(names(1.0, 0.5), vec!["b"]);
        assert_eq!(names(0.5, 0.0), vec!["a"]);
        assert_eq!(names(1.0, 0.75), vec!["b"]);
        assert!(names(0.75, 0.6).is_empty());
    }

    #[test]
    fn test_events_between_forward() {
        let mut anim = Animation::new("walk", test_skeleton());
        anim.add_event(0.5, "a").unwrap();
        anim.add_event(1.0, "b").unwrap();

        let names: Vec<&str> = anim.events_between(0.5, 1.0, false).iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["b"]);
        // order of the endpoints does not change the interval
        let names: Vec<&str> = anim.events_between(1.0, 0.0, false).iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
