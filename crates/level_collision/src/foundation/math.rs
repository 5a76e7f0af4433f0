//! Math utilities and types
//!
//! Level geometry lives on an integer grid, but planes, rays and impact
//! points keep full `f64` precision. Matrices use nalgebra's column-vector
//! convention, so a point is transformed as `m * p`.

pub use nalgebra::{Matrix3, Vector3};

/// 3D vector type
pub type Vec3 = Vector3<f64>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f64>;

/// Tolerance used when validating points against planes and slabs.
pub const EPSILON: f64 = 1e-6;

/// One of the three world axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// The X axis
    X,
    /// The Y axis
    Y,
    /// The Z axis
    Z,
}

impl Axis {
    /// All axes, in evaluation order.
    pub const ALL: [Self; 3] = [Self::X, Self::Y, Self::Z];

    /// Index of this axis into a vector.
    pub const fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }

    /// Positive unit vector along this axis.
    pub fn unit(self) -> Vec3 {
        let mut v = Vec3::zeros();
        v[self.index()] = 1.0;
        v
    }
}

/// Round a coordinate onto the integer grid.
///
/// Halves round to even, so shifting by a whole number never changes the
/// rounding of the fractional part.
#[allow(clippy::cast_possible_truncation)]
pub fn snap(value: f64) -> i32 {
    value.round_ties_even() as i32
}

/// Round every component of a vector onto the grid.
pub fn snap_vec(v: &Vec3) -> Vec3 {
    v.map(f64::round_ties_even)
}

/// Math utility functions
pub mod utils {
    use super::{Axis, Mat3, Vec3};

    /// Rotation matrix of `degrees` about `axis`.
    ///
    /// Exact for multiples of 90 degrees, which is what grid-aligned items
    /// are placed with.
    pub fn rotation(axis: Axis, degrees: f64) -> Mat3 {
        let (sin, cos) = match degrees.rem_euclid(360.0) {
            d if d == 0.0 => (0.0, 1.0),
            d if d == 90.0 => (1.0, 0.0),
            d if d == 180.0 => (0.0, -1.0),
            d if d == 270.0 => (-1.0, 0.0),
            d => d.to_radians().sin_cos(),
        };
        match axis {
            Axis::X => Mat3::new(
                1.0, 0.0, 0.0,
                0.0, cos, -sin,
                0.0, sin, cos,
            ),
            Axis::Y => Mat3::new(
                cos, 0.0, sin,
                0.0, 1.0, 0.0,
                -sin, 0.0, cos,
            ),
            Axis::Z => Mat3::new(
                cos, -sin, 0.0,
                sin, cos, 0.0,
                0.0, 0.0, 1.0,
            ),
        }
    }

    /// Component-wise minimum and maximum of a set of points.
    pub fn bounds_of<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Option<(Vec3, Vec3)> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), p| (lo.inf(p), hi.sup(p))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_snap_rounds_half_to_even() {
        assert_eq!(snap(2.5), 2);
        assert_eq!(snap(3.5), 4);
        assert_eq!(snap(-0.5), 0);
        assert_eq!(snap(4.1), 4);
        assert_eq!(snap(-2.85), -3);
    }

    #[test]
    fn test_quarter_turns_are_exact() {
        let rot = utils::rotation(Axis::Z, 90.0);
        assert_eq!(rot * Vec3::x(), Vec3::y());
        let rot = utils::rotation(Axis::X, -90.0);
        assert_eq!(rot * Vec3::y(), -Vec3::z());
    }

    #[test]
    fn test_arbitrary_rotation() {
        let rot = utils::rotation(Axis::Y, 45.0);
        let half = std::f64::consts::FRAC_1_SQRT_2;
        assert_relative_eq!(rot * Vec3::x(), Vec3::new(half, 0.0, -half), epsilon = 1e-12);
    }

    #[test]
    fn test_bounds_of() {
        let points = [Vec3::new(1.0, -2.0, 3.0), Vec3::new(-1.0, 5.0, 0.0)];
        let (lo, hi) = utils::bounds_of(&points).unwrap();
        assert_eq!(lo, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(hi, Vec3::new(1.0, 5.0, 3.0));
        assert!(utils::bounds_of(&[]).is_none());
    }
}
