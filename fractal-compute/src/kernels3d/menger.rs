//! Menger sponge via the standard fold-and-scale IFS (Rrrola's cross-trick):
//! folds into the first octant, reflects across the diagonal, and subtracts
//! an infinite cross from a unit cube each iteration.

use fractal_core::Point3;

use super::DeResult;

const SCALE: f64 = 3.0;

pub fn de(pos: Point3<f64>, cross_width: f64, max_iterations: u32) -> DeResult {
    let mut z = pos;
    let mut scale = 1.0f64;
    let mut trap = f64::MAX;

    for _ in 0..max_iterations {
        z = Point3::new(z.x.abs(), z.y.abs(), z.z.abs());

        if z.x - z.y < 0.0 {
            z = Point3::new(z.y, z.x, z.z);
        }
        if z.x - z.z < 0.0 {
            z = Point3::new(z.z, z.y, z.x);
        }
        if z.y - z.z < 0.0 {
            z = Point3::new(z.x, z.z, z.y);
        }

        trap = trap.min(z.length());

        z = Point3::new(SCALE * z.x - 2.0, SCALE * z.y - 2.0, SCALE * z.z);
        if z.z > 1.0 {
            z = Point3::new(z.x, z.y, z.z - 2.0);
        }

        scale *= SCALE;
    }

    let box_dist = menger_box_distance(&z, cross_width);
    DeResult::new((box_dist / scale).max(0.0), max_iterations, trap)
}

fn menger_box_distance(z: &Point3<f64>, cross_width: f64) -> f64 {
    let d = Point3::new(
        z.x.abs() - 1.0,
        z.y.abs() - 1.0,
        z.z.abs() - cross_width,
    );
    let inside = d.x.max(d.y).max(d.z).min(0.0);
    let outside = Point3::new(d.x.max(0.0), d.y.max(0.0), d.z.max(0.0)).length();
    inside + outside
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_of_sponge_has_finite_distance() {
        let result = de(Point3::zero(), 1.0, 10);
        assert!(result.distance.is_finite());
        assert!(result.distance >= 0.0);
    }

    #[test]
    fn distance_shrinks_with_more_iterations_for_interior_points() {
        let shallow = de(Point3::new(0.3, 0.2, 0.1), 1.0, 2);
        let deep = de(Point3::new(0.3, 0.2, 0.1), 1.0, 10);
        assert!(deep.distance <= shallow.distance + 1e-6);
    }
}
