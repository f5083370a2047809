//! Iteration kernels (C1), perturbation engine (C2), sphere-tracing
//! raymarcher (C3), and the tile scheduler / `Engine` facade (C4 + §6),
//! built on the scalar and data-model types of `fractal-core`.

pub mod bla;
pub mod engine;
pub mod kernels2d;
pub mod kernels3d;
pub mod perturbation;
pub mod raymarch;
pub mod reference_orbit;
pub mod scheduler;
pub mod tile_codec;

pub use engine::{
    engine_cancel, engine_cancel_all, engine_dispose, engine_poll_result, engine_prepare,
    engine_rebase, engine_stats, engine_submit_batch, engine_submit_tile, Handle, JobHandle,
    PollOutcome,
};
pub use kernels2d::{iterate, smooth_iteration_count, EscapeResult};
pub use perturbation::{perturb_bigfloat, perturb_f64, perturb_floatexp, PerturbationResult};
pub use raymarch::{march_pixel, march_ray, RayMarchResult, RaymarchOptions};
pub use reference_orbit::ReferenceOrbit;
pub use scheduler::{Job, JobId, JobOutcome, JobPriority, Scheduler, Stats, WorkerState};
