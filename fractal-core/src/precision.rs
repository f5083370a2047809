//! Precision calculation for perturbation rendering.
//!
//! Determines how many mantissa bits the reference orbit needs to represent
//! the view's zoom level and survive iteration error amplification.

use crate::View;

/// Safety margin for rounding errors in arithmetic operations. Matches
/// `precisionMargin`'s documented default in the engine configuration.
pub const DEFAULT_PRECISION_MARGIN_BITS: u64 = 30;

const DEFAULT_MAX_ITERATIONS: u64 = 10_000;

/// Calculate required precision bits for a view's reference orbit.
///
/// `≈ log₂(zoom) + precision_margin`, further widened so that adjacent pixels
/// remain distinguishable at the view's resolution and error amplification
/// over `max_iterations` steps doesn't erode the margin.
pub fn calculate_precision_bits(view: &View, canvas_size: (u32, u32)) -> usize {
    calculate_precision_bits_with(
        view,
        canvas_size,
        DEFAULT_MAX_ITERATIONS,
        DEFAULT_PRECISION_MARGIN_BITS,
    )
}

pub fn calculate_precision_bits_with(
    view: &View,
    canvas_size: (u32, u32),
    max_iterations: u64,
    precision_margin_bits: u64,
) -> usize {
    let (cx, cy) = &view.center;
    let width = &view.width;
    let height = &view.height;

    let px = canvas_size.0 as f64;
    let py = canvas_size.1 as f64;

    let log2_delta_x = width.log2_approx() - px.log2();
    let log2_delta_y = height.log2_approx() - py.log2();
    let log2_min_delta = log2_delta_x.min(log2_delta_y);

    let log2_half_width = width.log2_approx() - 1.0;
    let log2_half_height = height.log2_approx() - 1.0;
    let log2_cx = cx.abs().log2_approx();
    let log2_cy = cy.abs().log2_approx();

    let log2_mx = log2_cx.max(log2_half_width) + 1.0;
    let log2_my = log2_cy.max(log2_half_height) + 1.0;
    let log2_m = log2_mx.max(log2_my);

    let log2_ratio = log2_m - log2_min_delta;
    let bits_from_ratio = log2_ratio.ceil().max(0.0) as u64;

    let iter_bits = if max_iterations > 1 {
        (max_iterations as f64).log2().ceil() as u64
    } else {
        0
    };

    let total_bits = bits_from_ratio + iter_bits + precision_margin_bits;

    (total_bits as usize).next_power_of_two().max(64)
}
