//! Kleinian limit-set fractals (knighty/Apollonian/Schottky families): box
//! fold followed by an inversion with a complex-parameterized radius.

use fractal_core::Point3;

use super::DeResult;

pub fn de(pos: Point3<f64>, box_size: Point3<f64>, klein_r: f64, klein_i: f64, max_iterations: u32) -> DeResult {
    let mut z = pos;
    let mut dr = 1.0f64;
    let mut trap = f64::MAX;

    let min_r2 = (klein_r * klein_r + klein_i * klein_i).max(1e-6);

    for _ in 0..max_iterations {
        z = Point3::new(
            z.x.clamp(-box_size.x, box_size.x) * 2.0 - z.x,
            z.y.clamp(-box_size.y, box_size.y) * 2.0 - z.y,
            z.z.clamp(-box_size.z, box_size.z) * 2.0 - z.z,
        );

        let r2 = (z.x * z.x + z.y * z.y + z.z * z.z).max(1e-300);
        trap = trap.min(r2.sqrt());

        if r2 < min_r2 {
            let factor = min_r2 / r2;
            z = z.scale(factor);
            dr *= factor;
        }

        z = z.scale(klein_r);
        dr *= klein_r.abs();

        z = Point3::new(z.x + klein_i * box_size.x, z.y, z.z);
    }

    let distance = z.length() / dr.abs().max(1e-300);
    DeResult::new(distance.max(0.0), max_iterations, trap)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_finite_for_interior_point() {
        let box_size = Point3::new(1.0, 1.0, 1.0);
        let result = de(Point3::new(0.2, 0.1, 0.0), box_size, 1.0, 0.05, 10);
        assert!(result.distance.is_finite());
    }
}
