//! Updating many independent transformers per frame.

use rayon::prelude::*;

use super::transformer::{FrameStatus, Transformer};
use crate::core::config::BatchConfig;

/// Run [`Transformer::update`] on every transformer.
///
/// Parallelized with rayon once the batch reaches `config.min_parallel`.
/// Returns how many transformers were skipped because their skeleton was invalid.
pub fn update_all(transformers: &mut [Transformer], config: &BatchConfig) -> usize {
    let start = std::time::Instant::now();
    let skipped = if transformers.len() >= config.min_parallel.max(1) {
        transformers
            .par_iter_mut()
            .map(Transformer::update)
            .filter(|status| *status == FrameStatus::SkippedInvalidSkeleton)
            .count()
    } else {
        transformers
            .iter_mut()
            .map(Transformer::update)
            .filter(|status| *status == FrameStatus::SkippedInvalidSkeleton)
            .count()
    };

    log::trace!(
        "Updated {} transformers in {:.2}ms ({} skipped)",
        transformers.len(),
        start.elapsed().as_secs_f64() * 1000.0,
        skipped
    );
    skipped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{Bone, PoseDelta, Skeleton, StaticPose};
    use crate::core::types::Vec2;

    fn actor(rotation: f32) -> Transformer {
        let mut skeleton = Skeleton::new();
        skeleton.set_bone("root", Bone::root(0));
        skeleton.set_bone("arm", Bone::new(Some("root"), 0, Vec2::new(10.0, 0.0)));
        skeleton.validate().unwrap();

        let mut transformer = Transformer::new(skeleton.into_shared());
        transformer
            .register("pose", StaticPose::new().with("root", PoseDelta::rotation(rotation)), None)
            .unwrap();
        transformer.set_power("pose", 1.0).unwrap();
        transformer
    }

    fn check(transformers: &[Transformer]) {
        for (i, transformer) in transformers.iter().enumerate() {
            let arm = transformer.global_pose("arm").unwrap();
            assert!((arm.rotation - i as f32 * 0.1).abs() < 1e-6);
        }
    }

    #[test]
    fn test_update_all_parallel() {
        let mut transformers: Vec<_> = (0..16).map(|i| actor(i as f32 * 0.1)).collect();
        assert_eq!(update_all(&mut transformers, &BatchConfig { min_parallel: 4 }), 0);
        check(&transformers);
    }

    #[test]
    fn test_update_all_sequential() {
        let mut transformers: Vec<_> = (0..3).map(|i| actor(i as f32 * 0.1)).collect();
        assert_eq!(update_all(&mut transformers, &BatchConfig::default()), 0);
        check(&transformers);
    }

    #[test]
    fn test_update_all_counts_skipped() {
        let mut transformers = vec![actor(0.0), actor(0.0)];
        transformers[1].skeleton().write().set_bone("extra", Bone::root(0));
        assert_eq!(update_all(&mut transformers, &BatchConfig { min_parallel: 1 }), 1);
    }

    #[test]
    fn test_update_all_empty() {
        assert_eq!(update_all(&mut [], &BatchConfig::default()), 0);
    }
}
