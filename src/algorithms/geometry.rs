//! Distance primitive

use crate::core::Point3;

/// Euclidean distance between two points
pub fn distance(p1: &Point3, p2: &Point3) -> f64 {
    (p1 - p2).norm()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_distance_is_symmetric() {
        let a = Point3::new(0.0, -20.0, 20.0);
        let b = Point3::new(400.0, 500.0, 600.0);
        assert_relative_eq!(distance(&a, &b), distance(&b, &a));
    }

    #[test]
    fn test_distance_known_values() {
        let origin = Point3::zeros();
        assert_eq!(distance(&origin, &origin), 0.0);
        assert_relative_eq!(distance(&origin, &Point3::new(3.0, 4.0, 12.0)), 13.0);
        assert_relative_eq!(
            distance(&Point3::new(100.0, 0.0, 0.0), &Point3::new(400.0, 500.0, 600.0)),
            (300.0f64 * 300.0 + 500.0 * 500.0 + 600.0 * 600.0).sqrt()
        );
    }
}
