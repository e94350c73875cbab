use criterion::{criterion_group, criterion_main, Criterion, black_box};

use osteon::animation::{update_all, Animation, Bone, SharedSkeleton, Skeleton, Transformer};
use osteon::core::BatchConfig;

use glam::Vec2;

/// A single chain of `len` bones, each 10 units from its parent.
fn chain(len: usize) -> SharedSkeleton {
    let mut skeleton = Skeleton::new();
    skeleton.set_bone("b0", Bone::root(0));
    for i in 1..len {
        let parent = format!("b{}", i - 1);
        skeleton.set_bone(format!("b{}", i), Bone::new(Some(parent.as_str()), 0, Vec2::new(10.0, 0.0)));
    }
    skeleton.validate().expect("chain is valid");
    skeleton.into_shared()
}

fn wave(skeleton: &SharedSkeleton, len: usize) -> Animation {
    let mut anim = Animation::new("wave", skeleton.clone());
    for i in 0..len {
        let bone = format!("b{}", i);
        anim.add_keyframe(&bone, 0.0, Some(-0.2), None, None).unwrap();
        anim.add_keyframe(&bone, 0.5, Some(0.2), Some(Vec2::new(0.0, 1.0)), None).unwrap();
        anim.add_keyframe(&bone, 1.0, Some(-0.2), None, None).unwrap();
    }
    anim
}

fn animated(len: usize) -> Transformer {
    let skeleton = chain(len);
    let anim = wave(&skeleton, len);
    let mut transformer = Transformer::new(skeleton);
    transformer.register("wave", anim, None).unwrap();
    transformer.set_power("wave", 1.0).unwrap();
    transformer
}

fn bench_validate_64(c: &mut Criterion) {
    let skeleton = chain(64);

    c.bench_function("validate_64", |b| {
        b.iter(|| {
            let mut skeleton = skeleton.write();
            skeleton.set_bone("b0", Bone::root(0));
            black_box(skeleton.validate())
        });
    });
}

fn bench_update_64(c: &mut Criterion) {
    let mut transformer = animated(64);

    c.bench_function("transformer_update_64", |b| {
        b.iter(|| {
            transformer.advance("wave", 1.0 / 60.0).unwrap();
            black_box(transformer.update())
        });
    });
}

fn bench_two_tier_blend_64(c: &mut Criterion) {
    let mut transformer = animated(64);
    let skeleton = transformer.skeleton().clone();
    transformer.register("overlay", wave(&skeleton, 64), None).unwrap();
    transformer.set_priority("overlay", 1).unwrap();
    transformer.set_power("overlay", 0.5).unwrap();
    transformer.variables_mut("overlay").unwrap().set_time(0.3);

    c.bench_function("transformer_two_tier_blend_64", |b| {
        b.iter(|| black_box(transformer.calculate_local()));
    });
}

fn bench_update_all_256x16(c: &mut Criterion) {
    let mut transformers: Vec<_> = (0..256).map(|_| animated(16)).collect();
    let config = BatchConfig::default();

    c.bench_function("update_all_256x16", |b| {
        b.iter(|| black_box(update_all(&mut transformers, &config)));
    });
}

criterion_group!(
    benches,
    bench_validate_64,
    bench_update_64,
    bench_two_tier_blend_64,
    bench_update_all_256x16,
);
criterion_main!(benches);
