//! 2D vector math for positions, directions, and velocities.

use serde::{Deserialize, Serialize};

/// 2D vector for positions and directions.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
}

impl Vec2 {
    /// Zero vector.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Unit vector pointing up.
    pub const UP: Self = Self { x: 0.0, y: 1.0 };

    /// Unit vector pointing down.
    pub const DOWN: Self = Self { x: 0.0, y: -1.0 };

    /// Unit vector pointing left.
    pub const LEFT: Self = Self { x: -1.0, y: 0.0 };

    /// Unit vector pointing right.
    pub const RIGHT: Self = Self { x: 1.0, y: 0.0 };

    /// Creates a new Vec2.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the length (magnitude) of the vector.
    #[must_use]
    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Returns a normalized (unit length) version of the vector.
    /// Returns zero vector if the vector has zero length.
    #[must_use]
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len > 0.0 {
            Self {
                x: self.x / len,
                y: self.y / len,
            }
        } else {
            Self::ZERO
        }
    }

    /// Dot product of two vectors.
    #[must_use]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Scale the vector by a scalar.
    #[must_use]
    pub fn scale(self, scalar: f32) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }

    /// Distance between two points.
    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        (self - other).length()
    }

    /// Angle of the vector in radians, measured from the positive X axis.
    #[must_use]
    pub fn angle(self) -> f32 {
        self.y.atan2(self.x)
    }

    /// Unit vector for an angle in radians.
    #[must_use]
    pub fn from_angle(angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self { x: cos, y: sin }
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Mul<f32> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self::Output {
        self.scale(rhs)
    }
}

impl std::ops::Neg for Vec2 {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_length() {
        assert!((Vec2::new(3.0, 4.0).length() - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_axis_constants() {
        assert_eq!(Vec2::UP.dot(Vec2::DOWN), -1.0);
        assert_eq!(Vec2::LEFT.dot(Vec2::RIGHT), -1.0);
        assert_eq!(Vec2::UP.dot(Vec2::RIGHT), 0.0);
    }

    #[test]
    fn test_from_angle_roundtrip() {
        let angle = 0.7_f32;
        let v = Vec2::from_angle(angle);
        assert!((v.angle() - angle).abs() < 1e-6);
        assert!((v.length() - 1.0).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn prop_normalized_is_unit_or_zero(
            x in -1000.0f32..1000.0,
            y in -1000.0f32..1000.0,
        ) {
            let n = Vec2::new(x, y).normalized();
            if n == Vec2::ZERO {
                prop_assert_eq!(Vec2::new(x, y).length(), 0.0);
            } else {
                prop_assert!((n.length() - 1.0).abs() < 1e-3);
            }
        }
    }
}
