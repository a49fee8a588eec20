use core::{
    fmt::{self, Debug, Display, Formatter},
    str::FromStr,
};

#[cfg(feature = "reflect")]
use bevy::prelude::*;
#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// Four-character code identifying a state format or a device command.
///
/// Trailing spaces are significant, so `BIT ` and `BIT` are different codes.
#[derive(Default, PartialEq, Eq, Hash, Clone, Copy)]
#[cfg_attr(feature = "reflect", derive(Reflect), reflect(Clone, Debug, PartialEq))]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct FourCc([u8; 4]);

impl FourCc {
    #[must_use]
    pub const fn new(a: u8, b: u8, c: u8, d: u8) -> Self {
        Self([a, b, c, d])
    }

    /// Returns the code as a little-endian integer.
    #[must_use]
    pub const fn to_u32(self) -> u32 {
        u32::from_le_bytes(self.0)
    }

    #[must_use]
    pub const fn bytes(self) -> [u8; 4] {
        self.0
    }
}

impl From<[u8; 4]> for FourCc {
    fn from(value: [u8; 4]) -> Self {
        Self(value)
    }
}

impl FromStr for FourCc {
    type Err = ();

    /// Parses up to four ASCII characters, padding with spaces.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s.len() > 4 || !s.is_ascii() {
            return Err(());
        }

        let mut bytes = [b' '; 4];
        bytes[..s.len()].copy_from_slice(s.as_bytes());
        Ok(Self(bytes))
    }
}

impl Display for FourCc {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        for &byte in &self.0 {
            write!(f, "{}", char::from(byte))?;
        }
        Ok(())
    }
}

impl Debug for FourCc {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "FourCc(\"{self}\")")
    }
}

/// Interpretation of the bits covered by a [`StateBlock`](super::StateBlock).
///
/// All multi-byte formats are little-endian.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum StateFormat {
    /// Unsigned bit field of 1 to 64 bits at any bit alignment.
    Bit,
    /// Two's complement bit field of 2 to 64 bits at any bit alignment.
    SignedBit,
    Byte,
    SignedByte,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Long,
    UnsignedLong,
    Float,
    Double,
    /// Two consecutive `f32`.
    Vector2,
    /// Three consecutive `f32`.
    Vector3,
    /// Four consecutive `f32` in `x`, `y`, `z`, `w` order.
    Quaternion,
}

impl StateFormat {
    pub const BIT: FourCc = FourCc::new(b'B', b'I', b'T', b' ');
    pub const SIGNED_BIT: FourCc = FourCc::new(b'S', b'B', b'I', b'T');
    pub const BYTE: FourCc = FourCc::new(b'B', b'Y', b'T', b'E');
    pub const SIGNED_BYTE: FourCc = FourCc::new(b'S', b'B', b'Y', b'T');
    pub const SHORT: FourCc = FourCc::new(b'S', b'H', b'R', b'T');
    pub const UNSIGNED_SHORT: FourCc = FourCc::new(b'U', b'S', b'H', b'T');
    pub const INT: FourCc = FourCc::new(b'I', b'N', b'T', b' ');
    pub const UNSIGNED_INT: FourCc = FourCc::new(b'U', b'I', b'N', b'T');
    pub const LONG: FourCc = FourCc::new(b'L', b'N', b'G', b' ');
    pub const UNSIGNED_LONG: FourCc = FourCc::new(b'U', b'L', b'N', b'G');
    pub const FLOAT: FourCc = FourCc::new(b'F', b'L', b'T', b' ');
    pub const DOUBLE: FourCc = FourCc::new(b'D', b'B', b'L', b' ');
    pub const VECTOR2: FourCc = FourCc::new(b'V', b'E', b'C', b'2');
    pub const VECTOR3: FourCc = FourCc::new(b'V', b'E', b'C', b'3');
    pub const QUATERNION: FourCc = FourCc::new(b'Q', b'U', b'A', b'T');

    /// Returns the format for the given code or `None` if the code is unknown.
    #[must_use]
    pub fn from_code(code: FourCc) -> Option<Self> {
        let format = match code {
            Self::BIT => Self::Bit,
            Self::SIGNED_BIT => Self::SignedBit,
            Self::BYTE => Self::Byte,
            Self::SIGNED_BYTE => Self::SignedByte,
            Self::SHORT => Self::Short,
            Self::UNSIGNED_SHORT => Self::UnsignedShort,
            Self::INT => Self::Int,
            Self::UNSIGNED_INT => Self::UnsignedInt,
            Self::LONG => Self::Long,
            Self::UNSIGNED_LONG => Self::UnsignedLong,
            Self::FLOAT => Self::Float,
            Self::DOUBLE => Self::Double,
            Self::VECTOR2 => Self::Vector2,
            Self::VECTOR3 => Self::Vector3,
            Self::QUATERNION => Self::Quaternion,
            _ => return None,
        };

        Some(format)
    }

    #[must_use]
    pub fn code(self) -> FourCc {
        match self {
            Self::Bit => Self::BIT,
            Self::SignedBit => Self::SIGNED_BIT,
            Self::Byte => Self::BYTE,
            Self::SignedByte => Self::SIGNED_BYTE,
            Self::Short => Self::SHORT,
            Self::UnsignedShort => Self::UNSIGNED_SHORT,
            Self::Int => Self::INT,
            Self::UnsignedInt => Self::UNSIGNED_INT,
            Self::Long => Self::LONG,
            Self::UnsignedLong => Self::UNSIGNED_LONG,
            Self::Float => Self::FLOAT,
            Self::Double => Self::DOUBLE,
            Self::Vector2 => Self::VECTOR2,
            Self::Vector3 => Self::VECTOR3,
            Self::Quaternion => Self::QUATERNION,
        }
    }

    /// Returns the required size in bits, or `None` for bit fields that accept a range.
    #[must_use]
    pub fn fixed_size(self) -> Option<u32> {
        match self {
            Self::Bit | Self::SignedBit => None,
            Self::Byte | Self::SignedByte => Some(8),
            Self::Short | Self::UnsignedShort => Some(16),
            Self::Int | Self::UnsignedInt | Self::Float => Some(32),
            Self::Long | Self::UnsignedLong | Self::Double | Self::Vector2 => Some(64),
            Self::Vector3 => Some(96),
            Self::Quaternion => Some(128),
        }
    }

    /// Returns `true` if the size is valid for this format.
    #[must_use]
    pub fn accepts_size(self, size_in_bits: u32) -> bool {
        match self {
            Self::Bit => (1..=64).contains(&size_in_bits),
            Self::SignedBit => (2..=64).contains(&size_in_bits),
            _ => self.fixed_size() == Some(size_in_bits),
        }
    }

    #[must_use]
    pub fn is_bit_field(self) -> bool {
        matches!(self, Self::Bit | Self::SignedBit)
    }

    /// Returns `true` for formats decoded into a single number.
    #[must_use]
    pub fn is_scalar(self) -> bool {
        !matches!(self, Self::Vector2 | Self::Vector3 | Self::Quaternion)
    }

    #[must_use]
    pub fn is_integer(self) -> bool {
        self.is_scalar() && !matches!(self, Self::Float | Self::Double)
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    #[test]
    fn parse_pads_with_spaces() {
        assert_eq!("BIT".parse(), Ok(StateFormat::BIT));
        assert_eq!("QUAT".parse(), Ok(StateFormat::QUATERNION));
        assert!("TOOLONG".parse::<FourCc>().is_err());
        assert!("".parse::<FourCc>().is_err());
    }

    #[test]
    fn display() {
        assert_eq!(StateFormat::FLOAT.to_string(), "FLT ");
        assert_eq!(
            alloc::format!("{:?}", StateFormat::VECTOR2),
            "FourCc(\"VEC2\")"
        );
    }

    #[test]
    fn codes_match_formats() {
        for code in [
            StateFormat::BIT,
            StateFormat::SIGNED_BYTE,
            StateFormat::UNSIGNED_LONG,
            StateFormat::DOUBLE,
            StateFormat::QUATERNION,
        ] {
            let format = StateFormat::from_code(code).unwrap();
            assert_eq!(format.code(), code);
        }

        assert_eq!(StateFormat::from_code(FourCc::new(b'N', b'O', b'P', b'E')), None);
    }

    #[test]
    fn sizes() {
        assert!(StateFormat::Bit.accepts_size(1));
        assert!(StateFormat::Bit.accepts_size(64));
        assert!(!StateFormat::Bit.accepts_size(0));
        assert!(!StateFormat::SignedBit.accepts_size(1));
        assert!(StateFormat::Float.accepts_size(32));
        assert!(!StateFormat::Float.accepts_size(16));
        assert!(StateFormat::Quaternion.accepts_size(128));
    }
}
