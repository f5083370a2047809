//! 3D Sierpinski tetrahedron via plane-fold IFS: reflects across the four
//! tetrahedral symmetry planes, then scales from the farthest vertex.

use fractal_core::Point3;

use super::DeResult;

const SCALE: f64 = 2.0;
const OFFSET: Point3<f64> = Point3 { x: 1.0, y: 1.0, z: 1.0 };

pub fn de(pos: Point3<f64>, max_iterations: u32) -> DeResult {
    let mut z = pos;
    let mut scale = 1.0f64;
    let mut trap = f64::MAX;

    for _ in 0..max_iterations {
        if z.x + z.y < 0.0 {
            z = Point3::new(-z.y, -z.x, z.z);
        }
        if z.x + z.z < 0.0 {
            z = Point3::new(-z.z, z.y, -z.x);
        }
        if z.y + z.z < 0.0 {
            z = Point3::new(z.x, -z.z, -z.y);
        }

        trap = trap.min(z.length());

        z = z.scale(SCALE).sub(&OFFSET.scale(SCALE - 1.0));
        scale *= SCALE;
    }

    let distance = z.length() / scale;
    DeResult::new(distance.max(0.0), max_iterations, trap)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_distance_is_finite() {
        let result = de(Point3::zero(), 10);
        assert!(result.distance.is_finite());
    }

    #[test]
    fn far_point_has_large_distance() {
        let near = de(Point3::new(0.1, 0.1, 0.1), 10);
        let far = de(Point3::new(20.0, 20.0, 20.0), 10);
        assert!(far.distance > near.distance);
    }
}
