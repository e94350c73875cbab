//! Skeletal animation system

pub mod bone;
pub mod skeleton;
pub mod clip;
pub mod blend;
pub mod source;
pub mod transformer;
pub mod batch;
pub mod pose_buffer;

pub use bone::Bone;
pub use skeleton::{BoneId, SharedSkeleton, Skeleton};
pub use clip::{Animation, AnimationEvent, BoneTrack, Keyframe};
pub use blend::{PoseDelta, WeightedPose};
pub use source::{PoseFn, SamplePose, Source, StaticPose, Variables};
pub use transformer::{BoneMask, FiredEvent, FrameStatus, Transformer};
pub use batch::update_all;
pub use pose_buffer::{GpuBoneAffine, PoseBuffer};
