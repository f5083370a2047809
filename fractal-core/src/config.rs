//! Fractal configuration registry and engine-wide render configuration.
//!
//! `FractalConfig` is the per-kind static table (glitch tolerance, iteration
//! formula, default view) consulted by both the scheduler and the perturbation
//! engine. `EngineConfig` is the user-facing knob set of §6's configuration
//! table.

use crate::{FloatExp, View};
use serde::{Deserialize, Serialize};

/// Static configuration for one fractal kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FractalConfig {
    pub id: &'static str,
    pub display_name: &'static str,
    pub default_center: (&'static str, &'static str),
    pub default_width: &'static str,
    pub default_height: &'static str,
    /// Glitch detection threshold squared (τ²). Default 1e-6 ↔ τ = 1e-3.
    pub tau_sq: f64,
    pub iteration_multiplier: f64,
    pub iteration_power: f64,
    pub bla_enabled: bool,
}

impl FractalConfig {
    pub fn default_view(&self, precision_bits: usize, canvas_width: u32, canvas_height: u32) -> View {
        View::from_strings(
            self.default_center.0,
            self.default_center.1,
            self.default_width,
            self.default_height,
            precision_bits,
            canvas_width,
            canvas_height,
        )
        .expect("invalid default view coordinates in FractalConfig")
    }
}

pub static MANDELBROT_CONFIG: FractalConfig = FractalConfig {
    id: "mandelbrot",
    display_name: "Mandelbrot Set",
    default_center: ("-0.5", "0.0"),
    default_width: "4.0",
    default_height: "4.0",
    tau_sq: 1e-6,
    iteration_multiplier: 200.0,
    iteration_power: 2.8,
    bla_enabled: true,
};

pub static JULIA_CONFIG: FractalConfig = FractalConfig {
    id: "julia",
    display_name: "Julia Set",
    default_center: ("0.0", "0.0"),
    default_width: "3.0",
    default_height: "3.0",
    tau_sq: 1e-6,
    iteration_multiplier: 200.0,
    iteration_power: 2.8,
    bla_enabled: true,
};

pub static BURNING_SHIP_CONFIG: FractalConfig = FractalConfig {
    id: "burning-ship",
    display_name: "Burning Ship",
    default_center: ("-0.5", "-0.5"),
    default_width: "4.0",
    default_height: "4.0",
    tau_sq: 1e-6,
    iteration_multiplier: 200.0,
    iteration_power: 2.8,
    bla_enabled: true,
};

pub static TRICORN_CONFIG: FractalConfig = FractalConfig {
    id: "tricorn",
    display_name: "Tricorn",
    default_center: ("0.0", "0.0"),
    default_width: "4.0",
    default_height: "4.0",
    tau_sq: 1e-6,
    iteration_multiplier: 200.0,
    iteration_power: 2.8,
    bla_enabled: true,
};

pub static MANDEL_POWER_CONFIG: FractalConfig = FractalConfig {
    id: "mandel-power",
    display_name: "Multibrot",
    default_center: ("0.0", "0.0"),
    default_width: "4.0",
    default_height: "4.0",
    tau_sq: 1e-6,
    iteration_multiplier: 150.0,
    iteration_power: 2.8,
    bla_enabled: true,
};

pub fn get_fractal_config(id: &str) -> Option<&'static FractalConfig> {
    match id {
        "mandelbrot" => Some(&MANDELBROT_CONFIG),
        "julia" => Some(&JULIA_CONFIG),
        "burning-ship" => Some(&BURNING_SHIP_CONFIG),
        "tricorn" => Some(&TRICORN_CONFIG),
        "mandel-power" => Some(&MANDEL_POWER_CONFIG),
        _ => None,
    }
}

/// Maximum `|delta_c|` for any pixel in the view: the distance from the view
/// center to the farthest corner, used for BLA table construction.
///
/// Uses `FloatExp` to avoid underflow when squaring very small view
/// dimensions at extreme zoom (e.g. 10^270, where f64 squaring underflows).
pub fn calculate_dc_max(view: &View) -> FloatExp {
    let half_width = FloatExp::from_bigfloat(&view.width).mul_f64(0.5);
    let half_height = FloatExp::from_bigfloat(&view.height).mul_f64(0.5);
    let norm_sq = FloatExp::norm_sq(&half_width, &half_height);
    FloatExp::from_f64(norm_sq.sqrt())
}

/// Maximum iterations for a render: `multiplier * zoom_exponent^power`, clamped.
pub fn calculate_render_max_iterations(view: &View, config: &FractalConfig) -> u32 {
    let vp_width = view.width.to_f64();

    let zoom = 4.0 / vp_width;
    let zoom_exponent = if zoom.is_finite() && zoom > 0.0 {
        zoom.log10()
    } else {
        0.0
    };

    calculate_max_iterations(zoom_exponent, config.iteration_multiplier, config.iteration_power)
}

pub fn calculate_max_iterations(zoom_exponent: f64, multiplier: f64, power: f64) -> u32 {
    if zoom_exponent <= 0.0 {
        return 1000;
    }
    let raw = multiplier * zoom_exponent.powf(power);
    raw.clamp(1000.0, 10_000_000.0) as u32
}

/// BLA helps most at deep zoom where iteration counts are high.
/// Threshold follows the community convention of enabling it once scale
/// exceeds roughly 1e25 (dc_max below ~1e-25).
pub fn is_bla_useful(dc_max: &FloatExp) -> bool {
    dc_max.to_f64().log2() < -80.0 || dc_max.exp() < -80
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorMode {
    Iteration,
    Smooth,
    OrbitTrap,
    Distance,
    Normal,
}

/// User-facing render configuration (§6's configuration table).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// 0 = auto-detect (`hardware_concurrency - 1`, minimum 1).
    pub worker_count: usize,
    pub max_iterations: u32,
    pub bailout: f64,
    pub epsilon: f64,
    pub step_multiplier: f64,
    /// Fraction of `|Z|` at which δ is deemed invalid.
    pub glitch_tolerance: f64,
    pub series_order: u32,
    pub precision_margin: u64,
    pub aa_samples: u8,
    pub enable_shadows: bool,
    pub enable_ao: bool,
    pub enable_glow: bool,
    pub color_mode: ColorMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_count: 0,
            max_iterations: 1000,
            bailout: 4.0,
            epsilon: 1e-5,
            step_multiplier: 0.9,
            glitch_tolerance: 1e-4,
            series_order: 64,
            precision_margin: 30,
            aa_samples: 1,
            enable_shadows: true,
            enable_ao: true,
            enable_glow: false,
            color_mode: ColorMode::Smooth,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.bailout <= 0.0 {
            return Err("bailout must be positive".into());
        }
        if !(0.0..=1.0).contains(&self.step_multiplier) || self.step_multiplier <= 0.0 {
            return Err("stepMultiplier must be in (0, 1]".into());
        }
        if ![1u8, 2, 4].contains(&self.aa_samples) {
            return Err("aaSamples must be 1, 2, or 4".into());
        }
        Ok(())
    }

    pub fn resolved_worker_count(&self) -> usize {
        if self.worker_count > 0 {
            return self.worker_count;
        }
        std::thread::available_parallelism()
            .map(|n| n.get().saturating_sub(1).max(1))
            .unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BigFloat;

    fn test_view(width: f64, height: f64) -> View {
        View {
            center: (BigFloat::with_precision(-0.5, 64), BigFloat::with_precision(0.0, 64)),
            width: BigFloat::with_precision(width, 64),
            height: BigFloat::with_precision(height, 64),
            rotation: 0.0,
            canvas_width: 800,
            canvas_height: 600,
        }
    }

    #[test]
    fn get_fractal_config_finds_known_kinds() {
        assert!(get_fractal_config("mandelbrot").is_some());
        assert!(get_fractal_config("julia").is_some());
        assert!(get_fractal_config("unknown").is_none());
    }

    #[test]
    fn calculate_dc_max_at_default_zoom() {
        let view = test_view(4.0, 4.0);
        let dc_max = calculate_dc_max(&view).to_f64();
        assert!((dc_max - 2.828).abs() < 0.01);
    }

    #[test]
    fn calculate_max_iterations_increases_with_zoom() {
        let shallow = test_view(4.0, 4.0);
        let deep = test_view(0.0001, 0.0001);
        let shallow_iter = calculate_render_max_iterations(&shallow, &MANDELBROT_CONFIG);
        let deep_iter = calculate_render_max_iterations(&deep, &MANDELBROT_CONFIG);
        assert!(deep_iter > shallow_iter);
    }

    #[test]
    fn bla_useful_at_deep_zoom_only() {
        assert!(is_bla_useful(&FloatExp::from_f64(1e-100)));
        assert!(!is_bla_useful(&FloatExp::from_f64(2.0)));
    }

    #[test]
    fn engine_config_defaults_validate() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn engine_config_rejects_bad_aa_samples() {
        let config = EngineConfig {
            aa_samples: 3,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn resolved_worker_count_honors_explicit_value() {
        let config = EngineConfig {
            worker_count: 7,
            ..Default::default()
        };
        assert_eq!(config.resolved_worker_count(), 7);
    }

    #[test]
    fn resolved_worker_count_auto_detects_when_zero() {
        let config = EngineConfig::default();
        assert!(config.resolved_worker_count() >= 1);
    }
}
