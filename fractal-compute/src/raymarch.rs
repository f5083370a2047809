//! Sphere-tracing raymarcher for the volumetric fractal kinds (C3): adaptive
//! safe-step ray integration, central-difference normals, soft shadows,
//! ambient occlusion, and jittered-subpixel anti-aliasing.

use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

use fractal_core::{Camera, CommonParams, Point3, VolumeKind};

use crate::kernels3d::distance_estimate;

#[derive(Clone, Copy, Debug)]
pub struct RayMarchResult {
    pub hit: bool,
    pub distance: f64,
    pub position: Point3<f64>,
    pub normal: Point3<f64>,
    pub iterations: u32,
    pub orbit_trap: f64,
    pub steps: u32,
    pub fog: f64,
    pub ambient_occlusion: f64,
    pub shadow: f64,
}

impl Default for RayMarchResult {
    fn default() -> Self {
        RayMarchResult {
            hit: false,
            distance: 0.0,
            position: Point3::zero(),
            normal: Point3::zero(),
            iterations: 0,
            orbit_trap: f64::MAX,
            steps: 0,
            fog: 0.0,
            ambient_occlusion: 1.0,
            shadow: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct RaymarchOptions {
    pub enable_shadows: bool,
    pub enable_ao: bool,
    pub light_direction: Point3<f64>,
}

impl Default for RaymarchOptions {
    fn default() -> Self {
        RaymarchOptions {
            enable_shadows: true,
            enable_ao: true,
            light_direction: Point3::new(0.5, 0.8, -0.3).normalize(),
        }
    }
}

/// March one ray with adaptive step regulation: the step never jumps by more
/// than the previous distance estimate allowed, preventing overshoot past
/// thin surface features.
pub fn march_ray(
    origin: Point3<f64>,
    direction: Point3<f64>,
    kind: &VolumeKind,
    common: &CommonParams,
    options: &RaymarchOptions,
    cancel: &AtomicBool,
) -> RayMarchResult {
    let mut result = RayMarchResult::default();
    let mut pos = origin;
    let mut total_distance = 0.0f64;
    let mut last_de = f64::MAX;
    let mut last_step = 0.0f64;
    let mut fog = 0.0f64;

    for step in 0..common.max_steps {
        if cancel.load(AtomicOrdering::Relaxed) {
            result.steps = step;
            result.fog = fog;
            return result;
        }

        let de_result = distance_estimate(kind, pos, common.max_iterations, common.bailout);
        let mut de = de_result.distance;

        if step > 0 {
            de = de.min(last_de + last_step);
        }

        if de < common.epsilon {
            result.hit = true;
            result.distance = total_distance;
            result.position = pos;
            result.iterations = de_result.iterations;
            result.orbit_trap = de_result.orbit_trap;
            result.steps = step;
            result.fog = fog;
            result.normal = estimate_normal(pos, kind, common);
            if options.enable_ao {
                result.ambient_occlusion = ambient_occlusion(pos, result.normal, kind, common);
            }
            if options.enable_shadows {
                result.shadow = soft_shadow(pos, options.light_direction, kind, common);
            }
            return result;
        }

        if total_distance > common.max_distance || !de.is_finite() {
            result.steps = step;
            result.fog = fog;
            return result;
        }

        let step_size = de * common.step_multiplier;
        pos = pos.add(&direction.scale(step_size));
        total_distance += step_size;
        last_de = de;
        last_step = step_size;
        fog += 1.0 / (1.0 + de * de * 100.0);
    }

    result.steps = common.max_steps;
    result.fog = fog;
    result
}

fn estimate_normal(pos: Point3<f64>, kind: &VolumeKind, common: &CommonParams) -> Point3<f64> {
    let eps = common.epsilon * 0.5;
    let dx = distance_estimate(kind, pos.add(&Point3::new(eps, 0.0, 0.0)), common.max_iterations, common.bailout).distance
        - distance_estimate(kind, pos.add(&Point3::new(-eps, 0.0, 0.0)), common.max_iterations, common.bailout).distance;
    let dy = distance_estimate(kind, pos.add(&Point3::new(0.0, eps, 0.0)), common.max_iterations, common.bailout).distance
        - distance_estimate(kind, pos.add(&Point3::new(0.0, -eps, 0.0)), common.max_iterations, common.bailout).distance;
    let dz = distance_estimate(kind, pos.add(&Point3::new(0.0, 0.0, eps)), common.max_iterations, common.bailout).distance
        - distance_estimate(kind, pos.add(&Point3::new(0.0, 0.0, -eps)), common.max_iterations, common.bailout).distance;
    Point3::new(dx, dy, dz).normalize()
}

/// 5-sample ambient occlusion: steps along the normal, comparing actual
/// surface distance to the expected free-space distance at each sample.
fn ambient_occlusion(pos: Point3<f64>, normal: Point3<f64>, kind: &VolumeKind, common: &CommonParams) -> f64 {
    let mut occlusion = 0.0f64;
    let mut weight = 1.0f64;
    for i in 1..=5 {
        let sample_dist = i as f64 * common.epsilon * 4.0;
        let sample_pos = pos.add(&normal.scale(sample_dist));
        let de = distance_estimate(kind, sample_pos, common.max_iterations, common.bailout).distance;
        occlusion += weight * (sample_dist - de).max(0.0);
        weight *= 0.6;
    }
    (1.0 - occlusion).clamp(0.0, 1.0)
}

/// Soft shadow via a secondary march toward the light, tracking the minimum
/// ratio of distance-estimate to traveled distance (the standard penumbra
/// approximation).
fn soft_shadow(pos: Point3<f64>, light_dir: Point3<f64>, kind: &VolumeKind, common: &CommonParams) -> f64 {
    let mut total = common.epsilon * 10.0;
    let mut shadow = 1.0f64;
    let origin = pos.add(&light_dir.scale(total));

    for _ in 0..64 {
        let sample_pos = origin.add(&light_dir.scale(total));
        let de = distance_estimate(kind, sample_pos, common.max_iterations, common.bailout).distance;
        if de < common.epsilon {
            return 0.0;
        }
        shadow = shadow.min(16.0 * de / total.max(1e-9));
        total += de;
        if total > common.max_distance {
            break;
        }
    }

    shadow.clamp(0.0, 1.0)
}

/// Render one pixel of a tile with `samples` jittered subpixel rays,
/// averaging their hit results for anti-aliasing.
pub fn march_pixel(
    camera: &Camera,
    px: u32,
    py: u32,
    samples: u32,
    kind: &VolumeKind,
    common: &CommonParams,
    options: &RaymarchOptions,
    cancel: &AtomicBool,
) -> Vec<RayMarchResult> {
    let jitters = subpixel_jitters(samples);
    jitters
        .into_iter()
        .map(|(jx, jy)| {
            let direction = camera.ray_direction(px, py, jx, jy);
            march_ray(camera.position, direction, kind, common, options, cancel)
        })
        .collect()
}

fn subpixel_jitters(samples: u32) -> Vec<(f64, f64)> {
    match samples {
        0 | 1 => vec![(0.5, 0.5)],
        2 => vec![(0.25, 0.25), (0.75, 0.75)],
        _ => vec![(0.25, 0.25), (0.75, 0.25), (0.25, 0.75), (0.75, 0.75)],
    }
}
