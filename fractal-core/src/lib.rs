//! Data model shared by the perturbation engine, the sphere-tracing
//! raymarcher, and the tile scheduler: numeric scalars, geometry, fractal
//! parameters, and engine configuration.

mod bigfloat;
mod complex;
mod config;
mod error;
mod floatexp;
mod params;
mod points;
mod precision;
mod tile;
mod view;

pub use bigfloat::BigFloat;
pub use complex::{ComplexDelta, F64Complex, FloatExpComplex, HighPrecisionComplex, Quaternion};
pub use config::{
    calculate_dc_max, calculate_max_iterations, calculate_render_max_iterations,
    get_fractal_config, is_bla_useful, ColorMode, EngineConfig, FractalConfig,
    BURNING_SHIP_CONFIG, JULIA_CONFIG, MANDELBROT_CONFIG, MANDEL_POWER_CONFIG, TRICORN_CONFIG,
};
pub use error::EngineError;
pub use floatexp::FloatExp;
pub use params::{
    Affine3, CommonParams, FractalKind, FractalParams, KleinianVariant, PlaneKind,
    QuatJuliaVariant, VolumeKind,
};
pub use points::{Point, Point3, Rect};
pub use precision::{calculate_precision_bits, calculate_precision_bits_with, DEFAULT_PRECISION_MARGIN_BITS};
pub use tile::{Tile, TileKind, TILE_RESULT_VERSION};
pub use view::{Camera, View};
