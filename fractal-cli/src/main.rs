//! Thin CLI driver exercising the engine's external interface: renders one
//! view to a raw tile-result file and exits with the codes of §6.

use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use fractal_core::{
    get_fractal_config, CommonParams, EngineConfig, EngineError, FractalKind, FractalParams,
    PlaneKind, Tile, View,
};
use fractal_compute::{engine_dispose, engine_poll_result, engine_prepare, engine_submit_batch, JobPriority, PollOutcome};
use log::{error, info};

const EXIT_SUCCESS: u8 = 0;
const EXIT_INVALID_PARAMS: u8 = 2;
const EXIT_PRECISION_EXCEEDED: u8 = 3;
const EXIT_WORKER_FAILURE: u8 = 4;
const EXIT_CANCELLED: u8 = 5;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FractalArg {
    Mandelbrot,
    Julia,
    BurningShip,
    Tricorn,
    MandelPower,
}

impl FractalArg {
    fn config_id(self) -> &'static str {
        match self {
            FractalArg::Mandelbrot => "mandelbrot",
            FractalArg::Julia => "julia",
            FractalArg::BurningShip => "burning-ship",
            FractalArg::Tricorn => "tricorn",
            FractalArg::MandelPower => "mandel-power",
        }
    }

    fn plane_kind(self, mandel_power: f64) -> PlaneKind {
        match self {
            FractalArg::Mandelbrot => PlaneKind::Mandelbrot { power: 2.0 },
            FractalArg::Julia => PlaneKind::Julia {
                c: fractal_core::F64Complex::new(-0.7, 0.27015),
            },
            FractalArg::BurningShip => PlaneKind::BurningShip,
            FractalArg::Tricorn => PlaneKind::Tricorn,
            FractalArg::MandelPower => PlaneKind::MandelPower { n: mandel_power },
        }
    }
}

/// Renders a plane fractal to a raw tile-result file.
#[derive(Parser, Debug)]
#[command(name = "fractal-cli", version, about)]
struct Cli {
    #[arg(long, value_enum, default_value = "mandelbrot")]
    fractal: FractalArg,

    #[arg(long, default_value_t = 3.0)]
    mandel_power: f64,

    #[arg(long)]
    center_x: Option<String>,

    #[arg(long)]
    center_y: Option<String>,

    #[arg(long)]
    width: Option<String>,

    #[arg(long, default_value_t = 800)]
    canvas_width: u32,

    #[arg(long, default_value_t = 600)]
    canvas_height: u32,

    #[arg(long, default_value_t = 1000)]
    max_iterations: u32,

    #[arg(long, default_value_t = 1)]
    worker_count: usize,

    #[arg(long, default_value = "out.tile")]
    output: std::path::PathBuf,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    ExitCode::from(run(cli))
}

fn run(cli: Cli) -> u8 {
    let config = match get_fractal_config(cli.fractal.config_id()) {
        Some(c) => c,
        None => {
            error!("unknown fractal id: {}", cli.fractal.config_id());
            return EXIT_INVALID_PARAMS;
        }
    };

    let precision_bits = 128;
    let view = if let (Some(cx), Some(cy), Some(w)) = (&cli.center_x, &cli.center_y, &cli.width) {
        match View::from_strings(cx, cy, w, w, precision_bits, cli.canvas_width, cli.canvas_height) {
            Ok(v) => v,
            Err(e) => {
                error!("invalid view coordinates: {e}");
                return EXIT_INVALID_PARAMS;
            }
        }
    } else {
        config.default_view(precision_bits, cli.canvas_width, cli.canvas_height)
    };

    let params = FractalParams {
        kind: FractalKind::Plane(cli.fractal.plane_kind(cli.mandel_power)),
        common: CommonParams {
            max_iterations: cli.max_iterations,
            ..Default::default()
        },
    };

    let engine_config = EngineConfig {
        worker_count: cli.worker_count,
        ..Default::default()
    };

    let handle = match engine_prepare(view, params, engine_config, None) {
        Ok(h) => h,
        Err(EngineError::InvalidParams(msg)) => {
            error!("invalid parameters: {msg}");
            return EXIT_INVALID_PARAMS;
        }
        Err(EngineError::PrecisionUnsupported { required_bits }) => {
            error!("precision required ({required_bits} bits) exceeds supported backend");
            return EXIT_PRECISION_EXCEEDED;
        }
        Err(e) => {
            error!("failed to prepare engine: {e}");
            return EXIT_INVALID_PARAMS;
        }
    };

    let tiles = Tile::tile_grid(cli.canvas_width, cli.canvas_height, 64);
    let job_count = tiles.len();
    info!("submitting {job_count} tiles");
    engine_submit_batch(&handle, tiles, JobPriority::Normal);

    let mut rendered = Vec::with_capacity(job_count);
    let deadline = Instant::now() + Duration::from_secs(300);
    let mut exit_code = EXIT_SUCCESS;

    while rendered.len() < job_count && Instant::now() < deadline {
        match engine_poll_result(&handle) {
            PollOutcome::Pending => std::thread::yield_now(),
            PollOutcome::TileResult(bytes) => rendered.push(bytes),
            PollOutcome::Glitched => {
                info!("tile glitched; continuing with degraded result");
            }
            PollOutcome::Failed(EngineError::Cancelled) => {
                exit_code = EXIT_CANCELLED;
                break;
            }
            PollOutcome::Failed(e) => {
                error!("tile failed: {e}");
                exit_code = EXIT_WORKER_FAILURE;
                break;
            }
        }
    }

    if exit_code == EXIT_SUCCESS {
        let mut combined = Vec::new();
        for tile_bytes in &rendered {
            combined.extend_from_slice(tile_bytes);
        }
        if let Err(e) = std::fs::write(&cli.output, &combined) {
            error!("failed to write output: {e}");
            exit_code = EXIT_WORKER_FAILURE;
        } else {
            info!("wrote {} tiles to {:?}", rendered.len(), cli.output);
        }
    }

    engine_dispose(handle);
    exit_code
}
