//! `Engine`: the external interface of §6, binding the scheduler to the
//! iteration/perturbation/raymarch kernels behind a small, stable API.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, RwLock};

use fractal_core::{
    calculate_precision_bits_with, Camera, EngineConfig, EngineError, FractalKind, FractalParams,
    PlaneKind, Tile, View, VolumeKind, DEFAULT_PRECISION_MARGIN_BITS,
};
use log::{debug, warn};

use crate::bla::BlaTable;
use crate::kernels2d;
use crate::perturbation::{self, PerturbationResult};
use crate::raymarch::{self, RaymarchOptions};
use crate::reference_orbit::ReferenceOrbit;
use crate::scheduler::{Job, JobId, JobOutcome, JobPriority, Scheduler, Stats, WorkerState};
use crate::tile_codec;

pub struct Handle {
    view: View,
    params: FractalParams,
    config: EngineConfig,
    camera: Option<Camera>,
    reference_orbit: RwLock<Option<Arc<ReferenceOrbit>>>,
    bla_table: RwLock<Option<Arc<BlaTable>>>,
    scheduler: Scheduler,
    next_job_id: AtomicU64,
    job_cancel_flags: RwLock<std::collections::HashMap<JobId, Arc<AtomicBool>>>,
}

/// Is this kind routed through the reference-orbit perturbative path? Only
/// the power-2 Mandelbrot branch of `run_plane_tile` uses it; every other
/// plane kind iterates directly and Volume kinds never touch it.
fn uses_perturbation(kind: &FractalKind) -> bool {
    matches!(kind, FractalKind::Plane(PlaneKind::Mandelbrot { power }) if *power == 2.0)
}

pub struct JobHandle(pub JobId);

#[derive(Debug)]
pub enum PollOutcome {
    Pending,
    TileResult(Vec<u8>),
    Glitched,
    Failed(EngineError),
}

/// Snapshots view and parameters, and—for the perturbative Mandelbrot
/// branch—computes the reference orbit and its BLA table up front so every
/// worker shares them read-only. Volumetric kinds require a `camera`.
pub fn engine_prepare(
    view: View,
    params: FractalParams,
    config: EngineConfig,
    camera: Option<Camera>,
) -> Result<Handle, EngineError> {
    params.validate().map_err(EngineError::InvalidParams)?;
    config.validate().map_err(EngineError::InvalidParams)?;

    if matches!(params.kind, FractalKind::Volume(_)) && camera.is_none() {
        return Err(EngineError::InvalidParams(
            "volumetric fractal kinds require a camera".into(),
        ));
    }

    let required_bits = calculate_precision_bits_with(
        &view,
        (view.canvas_width, view.canvas_height),
        params.common.max_iterations as u64,
        config.precision_margin,
    );
    if required_bits > 1 << 20 {
        return Err(EngineError::PrecisionUnsupported {
            required_bits,
        });
    }

    let (reference_orbit, bla_table) = if uses_perturbation(&params.kind) {
        debug!("computing reference orbit at {required_bits} bits");
        let orbit = ReferenceOrbit::compute(&view.center, params.common.max_iterations, params.common.bailout);
        let table = Arc::new(BlaTable::build(&orbit));
        (Some(Arc::new(orbit)), Some(table))
    } else {
        (None, None)
    };

    let worker_count = config.resolved_worker_count();
    Ok(Handle {
        view,
        params,
        config,
        camera,
        reference_orbit: RwLock::new(reference_orbit),
        bla_table: RwLock::new(bla_table),
        scheduler: Scheduler::new(worker_count),
        next_job_id: AtomicU64::new(1),
        job_cancel_flags: RwLock::new(std::collections::HashMap::new()),
    })
}

pub fn engine_submit_tile(handle: &Handle, tile: Tile, priority: JobPriority) -> JobHandle {
    let id = handle.next_job_id.fetch_add(1, AtomicOrdering::Relaxed);
    let cancel_flag = Arc::new(AtomicBool::new(false));
    handle
        .job_cancel_flags
        .write()
        .unwrap()
        .insert(id, cancel_flag.clone());

    let params = handle.params.clone();

    let job = match &params.kind {
        FractalKind::Plane(_) => {
            let view = handle.view.clone();
            let orbit = handle.reference_orbit.read().unwrap().clone();
            let bla = handle.bla_table.read().unwrap().clone();
            let tau_sq = handle.config.glitch_tolerance * handle.config.glitch_tolerance;

            Job {
                id,
                priority,
                cancel_flag,
                run: Box::new(move |cancel| {
                    run_plane_tile(tile, &params, &view, orbit.as_deref(), bla.as_deref(), tau_sq, cancel)
                }),
            }
        }
        FractalKind::Volume(volume_kind) => {
            let volume_kind = volume_kind.clone();
            let camera = handle
                .camera
                .clone()
                .expect("engine_prepare requires a camera for volumetric kinds");
            let options = RaymarchOptions {
                enable_shadows: handle.config.enable_shadows,
                enable_ao: handle.config.enable_ao,
                ..RaymarchOptions::default()
            };
            let aa_samples = handle.config.aa_samples.max(1) as u32;

            Job {
                id,
                priority,
                cancel_flag,
                run: Box::new(move |cancel| {
                    run_volume_tile(tile, &volume_kind, &params.common, &camera, &options, aa_samples, cancel)
                }),
            }
        }
    };

    handle.scheduler.submit(job);
    JobHandle(id)
}

pub fn engine_submit_batch(handle: &Handle, tiles: Vec<Tile>, priority: JobPriority) -> Vec<JobHandle> {
    tiles
        .into_iter()
        .map(|tile| engine_submit_tile(handle, tile, priority))
        .collect()
}

pub fn engine_cancel(handle: &Handle, job: &JobHandle) {
    if let Some(flag) = handle.job_cancel_flags.read().unwrap().get(&job.0) {
        flag.store(true, AtomicOrdering::Relaxed);
    }
}

pub fn engine_cancel_all(handle: &Handle) {
    for flag in handle.job_cancel_flags.read().unwrap().values() {
        flag.store(true, AtomicOrdering::Relaxed);
    }
}

pub fn engine_poll_result(handle: &Handle) -> PollOutcome {
    match handle.scheduler.try_recv() {
        None => PollOutcome::Pending,
        Some(result) => match result.outcome {
            JobOutcome::Completed(bytes) => PollOutcome::TileResult(bytes),
            JobOutcome::Glitched(_) => {
                warn!("tile {} glitched, rebase needed", result.id);
                PollOutcome::Glitched
            }
            JobOutcome::Cancelled => PollOutcome::Failed(EngineError::Cancelled),
            JobOutcome::Failed(reason) => PollOutcome::Failed(EngineError::WorkerError(reason)),
        },
    }
}

pub fn engine_stats(handle: &Handle) -> (Stats, Vec<WorkerState>) {
    (handle.scheduler.stats(), handle.scheduler.worker_states())
}

pub fn engine_dispose(handle: Handle) {
    engine_cancel_all(&handle);
    handle.scheduler.dispose();
}

/// Re-runs reference-orbit computation after a glitch and swaps the shared
/// handle atomically under the write lock; readers already holding an `Arc`
/// clone keep using the old orbit until they drop it. The BLA table is
/// rebuilt alongside it since it's derived from the same orbit.
pub fn engine_rebase(handle: &Handle) {
    let new_orbit = ReferenceOrbit::compute(
        &handle.view.center,
        handle.params.common.max_iterations,
        handle.params.common.bailout,
    );
    let new_bla = Arc::new(BlaTable::build(&new_orbit));
    *handle.reference_orbit.write().unwrap() = Some(Arc::new(new_orbit));
    *handle.bla_table.write().unwrap() = Some(new_bla);
}

fn run_plane_tile(
    tile: Tile,
    params: &FractalParams,
    view: &View,
    orbit: Option<&ReferenceOrbit>,
    bla: Option<&BlaTable>,
    tau_sq: f64,
    cancel: &AtomicBool,
) -> JobOutcome {
    let plane_kind = match &params.kind {
        FractalKind::Plane(k) => k.clone(),
        FractalKind::Volume(_) => return JobOutcome::Failed("tile job submitted for a volumetric kind".into()),
    };

    let width = view.width.to_f64();
    let height = view.height.to_f64();
    let (step_x, step_y) = tile.pixel_step(width, height);
    let (origin_x, origin_y) = tile.origin_offset(width, height);

    let pixel_count = tile.area() as usize;
    let mut iterations = Vec::with_capacity(pixel_count);
    let mut escaped = Vec::with_capacity(pixel_count);
    let mut any_glitched = false;

    for row in 0..tile.height {
        if cancel.load(AtomicOrdering::Relaxed) {
            return JobOutcome::Cancelled;
        }
        for col in 0..tile.width {
            let dx = origin_x + col as f64 * step_x;
            let dy = origin_y + row as f64 * step_y;

            let (n, esc, glitched) = match (&plane_kind, orbit) {
                (PlaneKind::Mandelbrot { power }, Some(orbit)) if *power == 2.0 => {
                    let delta = fractal_core::F64Complex::new(dx, dy);
                    let result: PerturbationResult = perturbation::perturb_f64(
                        orbit,
                        delta,
                        params.common.max_iterations,
                        params.common.bailout,
                        tau_sq,
                        bla,
                    );
                    (result.iterations as f32, result.escaped, result.glitched)
                }
                _ => {
                    let point = fractal_core::F64Complex::new(
                        view.center.0.to_f64() + dx,
                        view.center.1.to_f64() + dy,
                    );
                    let result = kernels2d::iterate(&plane_kind, point, &params.common);
                    (result.iterations as f32, result.escaped, false)
                }
            };

            iterations.push(n);
            escaped.push(esc as u8);
            any_glitched |= glitched;
        }
    }

    let header = tile_codec::encode_header(&tile, false, if any_glitched { 1 } else { 0 });
    let payload = tile_codec::encode_plane_payload(&tile, &iterations, &escaped, None);
    let mut buf = header;
    buf.extend(payload);

    if any_glitched {
        JobOutcome::Glitched(buf)
    } else {
        JobOutcome::Completed(buf)
    }
}

/// Sphere-traces one tile of a volumetric render, dispatching `march_pixel`
/// per pixel and averaging its jittered AA samples. Cancellation is checked
/// per row, and again per step inside `march_ray` itself.
fn run_volume_tile(
    tile: Tile,
    kind: &VolumeKind,
    common: &fractal_core::CommonParams,
    camera: &Camera,
    options: &RaymarchOptions,
    aa_samples: u32,
    cancel: &AtomicBool,
) -> JobOutcome {
    let pixel_count = tile.area() as usize;
    let mut hit = Vec::with_capacity(pixel_count);
    let mut distance = Vec::with_capacity(pixel_count);
    let mut steps = Vec::with_capacity(pixel_count);
    let mut normal = Vec::with_capacity(pixel_count * 3);

    for row in 0..tile.height {
        if cancel.load(AtomicOrdering::Relaxed) {
            return JobOutcome::Cancelled;
        }
        for col in 0..tile.width {
            let px = tile.x + col;
            let py = tile.y + row;
            let samples = raymarch::march_pixel(camera, px, py, aa_samples, kind, common, options, cancel);

            let sample_count = samples.len().max(1) as f64;
            let hit_count = samples.iter().filter(|s| s.hit).count();
            let avg_distance = samples.iter().map(|s| s.distance).sum::<f64>() / sample_count;
            let avg_steps = (samples.iter().map(|s| s.steps as f64).sum::<f64>() / sample_count) as u16;
            let (nx, ny, nz) = if hit_count > 0 {
                let (sx, sy, sz) = samples
                    .iter()
                    .filter(|s| s.hit)
                    .fold((0.0, 0.0, 0.0), |(ax, ay, az), s| (ax + s.normal.x, ay + s.normal.y, az + s.normal.z));
                let n = hit_count as f64;
                (sx / n, sy / n, sz / n)
            } else {
                (0.0, 0.0, 0.0)
            };

            hit.push((hit_count * 2 >= samples.len()) as u8);
            distance.push(avg_distance as f32);
            steps.push(avg_steps);
            normal.push(nx as f32);
            normal.push(ny as f32);
            normal.push(nz as f32);
        }
    }

    let header = tile_codec::encode_header(&tile, true, 0);
    let payload = tile_codec::encode_volume_payload(&tile, &hit, &distance, &steps, &normal);
    let mut buf = header;
    buf.extend(payload);
    JobOutcome::Completed(buf)
}
