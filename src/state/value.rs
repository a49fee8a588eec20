use bevy::prelude::*;
#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// Semantic value decoded from a [`StateBlock`](super::StateBlock).
///
/// Bit fields and integer formats decode into [`Self::Integer`],
/// floating point formats into [`Self::Float`] and composite formats into
/// the matching math type.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize", reflect(Serialize, Deserialize))]
pub enum ControlValue {
    Integer(i64),
    Float(f64),
    Vec2(Vec2),
    Vec3(Vec3),
    Quat(Quat),
}

impl ControlValue {
    /// Returns the value as a float.
    ///
    /// Vectors and quaternions return their length, so any composite
    /// can be treated as an actuation magnitude.
    #[must_use]
    pub fn as_f32(self) -> f32 {
        match self {
            Self::Integer(value) => value as f32,
            Self::Float(value) => value as f32,
            Self::Vec2(value) => value.length(),
            Self::Vec3(value) => value.length(),
            Self::Quat(value) => value.length(),
        }
    }

    /// Like [`Self::as_f32`], but keeps the full precision for scalars.
    #[must_use]
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Integer(value) => value as f64,
            Self::Float(value) => value,
            _ => self.as_f32() as f64,
        }
    }

    /// Returns the value as an integer.
    ///
    /// Floats are rounded to the nearest integer, composites use their length.
    #[must_use]
    pub fn as_i64(self) -> i64 {
        match self {
            Self::Integer(value) => value,
            Self::Float(value) => round(value),
            _ => round(self.as_f64()),
        }
    }

    /// Returns `true` for any non-zero value.
    #[must_use]
    pub fn as_bool(self) -> bool {
        match self {
            Self::Integer(value) => value != 0,
            _ => self.as_f32() != 0.0,
        }
    }

    /// Returns all components packed into [`Vec4`].
    ///
    /// Scalars occupy `x`, missing components are zero.
    #[must_use]
    pub fn to_vec4(self) -> Vec4 {
        match self {
            Self::Integer(_) | Self::Float(_) => Vec4::new(self.as_f32(), 0.0, 0.0, 0.0),
            Self::Vec2(value) => value.extend(0.0).extend(0.0),
            Self::Vec3(value) => value.extend(0.0),
            Self::Quat(value) => Vec4::from(value),
        }
    }
}

// `f64::round` lives in `std`.
fn round(value: f64) -> i64 {
    if value >= 0.0 {
        (value + 0.5) as i64
    } else {
        (value - 0.5) as i64
    }
}

impl Default for ControlValue {
    fn default() -> Self {
        Self::Integer(0)
    }
}

impl From<bool> for ControlValue {
    fn from(value: bool) -> Self {
        Self::Integer(value.into())
    }
}

impl From<i32> for ControlValue {
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<i64> for ControlValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f32> for ControlValue {
    fn from(value: f32) -> Self {
        Self::Float(value.into())
    }
}

impl From<f64> for ControlValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<Vec2> for ControlValue {
    fn from(value: Vec2) -> Self {
        Self::Vec2(value)
    }
}

impl From<Vec3> for ControlValue {
    fn from(value: Vec3) -> Self {
        Self::Vec3(value)
    }
}

impl From<Quat> for ControlValue {
    fn from(value: Quat) -> Self {
        Self::Quat(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars() {
        assert_eq!(ControlValue::from(true).as_f32(), 1.0);
        assert_eq!(ControlValue::from(0.75_f64).as_i64(), 1);
        assert_eq!(ControlValue::from(-1.6_f64).as_i64(), -2);
        assert!(!ControlValue::from(0.0_f32).as_bool());
    }

    #[test]
    fn composites() {
        assert_eq!(ControlValue::from(Vec2::new(3.0, 4.0)).as_f32(), 5.0);
        assert_eq!(
            ControlValue::from(Vec3::X).to_vec4(),
            Vec4::new(1.0, 0.0, 0.0, 0.0)
        );
        assert_eq!(ControlValue::from(Quat::IDENTITY).to_vec4(), Vec4::W);
    }
}
