/*!
Raw device state and its interpretation.

Every device owns a block of raw bytes sized by its layout. Each control describes
where its value lives inside those bytes with a [`StateBlock`]: a byte offset, a
bit offset inside that byte, a size in bits and a [`FourCc`] format code that
selects how the bits are decoded into a [`ControlValue`].

Devices keep two copies of their state in [`StateBuffers`]. The previous copy is
refreshed once at the start of every update pass, which is what makes
per-frame edge detection like [`ButtonView::was_pressed_this_frame`] possible.

All multi-byte values are little-endian regardless of the target platform.
*/

pub mod buffers;
pub mod format;
pub mod value;

use core::ops::Range;

#[cfg(feature = "reflect")]
use bevy::prelude::*;
use bevy::math::{Quat, Vec2, Vec3};
#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// Location and format of a control's value inside a device state buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "reflect", derive(Reflect), reflect(Clone, Debug, PartialEq))]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct StateBlock {
    pub byte_offset: u32,
    /// Offset inside the byte at [`Self::byte_offset`], in 0..8.
    pub bit_offset: u32,
    pub size_in_bits: u32,
    pub format: FourCc,
}

impl StateBlock {
    #[must_use]
    pub const fn new(byte_offset: u32, bit_offset: u32, size_in_bits: u32, format: FourCc) -> Self {
        Self {
            byte_offset,
            bit_offset,
            size_in_bits,
            format,
        }
    }

    /// A single bit, the usual storage for digital buttons.
    #[must_use]
    pub const fn bit(byte_offset: u32, bit_offset: u32) -> Self {
        Self::new(byte_offset, bit_offset, 1, StateFormat::BIT)
    }

    /// Unsigned bit field.
    #[must_use]
    pub const fn bits(byte_offset: u32, bit_offset: u32, size_in_bits: u32) -> Self {
        Self::new(byte_offset, bit_offset, size_in_bits, StateFormat::BIT)
    }

    #[must_use]
    pub const fn byte(byte_offset: u32) -> Self {
        Self::new(byte_offset, 0, 8, StateFormat::BYTE)
    }

    #[must_use]
    pub const fn int(byte_offset: u32) -> Self {
        Self::new(byte_offset, 0, 32, StateFormat::INT)
    }

    #[must_use]
    pub const fn float(byte_offset: u32) -> Self {
        Self::new(byte_offset, 0, 32, StateFormat::FLOAT)
    }

    #[must_use]
    pub const fn vector2(byte_offset: u32) -> Self {
        Self::new(byte_offset, 0, 64, StateFormat::VECTOR2)
    }

    #[must_use]
    pub const fn vector3(byte_offset: u32) -> Self {
        Self::new(byte_offset, 0, 96, StateFormat::VECTOR3)
    }

    #[must_use]
    pub const fn quaternion(byte_offset: u32) -> Self {
        Self::new(byte_offset, 0, 128, StateFormat::QUATERNION)
    }

    /// Absolute bit range covered by this block.
    #[must_use]
    pub fn bit_range(&self) -> Range<u64> {
        let start = self.byte_offset as u64 * 8 + self.bit_offset as u64;
        start..start + self.size_in_bits as u64
    }

    /// Number of bytes touched by this block, starting at [`Self::byte_offset`].
    #[must_use]
    pub fn byte_len(&self) -> u32 {
        (self.bit_offset + self.size_in_bits).div_ceil(8)
    }

    /// Returns `true` if this block shares at least one bit with the given range.
    #[must_use]
    pub fn overlaps(&self, bits: &Range<u64>) -> bool {
        let own = self.bit_range();
        own.start < bits.end && bits.start < own.end
    }

    /// Returns `true` if the given range contains every bit of this block.
    #[must_use]
    pub fn is_inside(&self, bits: &Range<u64>) -> bool {
        let own = self.bit_range();
        bits.start <= own.start && own.end <= bits.end
    }

    /// Decoded state format.
    ///
    /// # Panics
    ///
    /// Panics if the format code is unknown. Layouts validate formats when they're built,
    /// so this can only happen for blocks constructed by hand.
    #[must_use]
    pub fn state_format(&self) -> StateFormat {
        StateFormat::from_code(self.format)
            .unwrap_or_else(|| panic!("`{}` should be a known state format", self.format))
    }

    /// Decodes the block from the buffer.
    ///
    /// The buffer must cover the whole block.
    #[must_use]
    pub fn read(&self, buffer: &[u8]) -> ControlValue {
        let bytes = &buffer[self.byte_offset as usize..];
        match self.state_format() {
            StateFormat::Bit => ControlValue::Integer(self.read_bits(buffer) as i64),
            StateFormat::SignedBit => {
                let shift = 64 - self.size_in_bits;
                let value = ((self.read_bits(buffer) << shift) as i64) >> shift;
                ControlValue::Integer(value)
            }
            StateFormat::Byte => ControlValue::Integer(bytes[0].into()),
            StateFormat::SignedByte => ControlValue::Integer((bytes[0] as i8).into()),
            StateFormat::Short => ControlValue::Integer(i16::from_le_bytes(array(bytes)).into()),
            StateFormat::UnsignedShort => {
                ControlValue::Integer(u16::from_le_bytes(array(bytes)).into())
            }
            StateFormat::Int => ControlValue::Integer(i32::from_le_bytes(array(bytes)).into()),
            StateFormat::UnsignedInt => {
                ControlValue::Integer(u32::from_le_bytes(array(bytes)).into())
            }
            StateFormat::Long => ControlValue::Integer(i64::from_le_bytes(array(bytes))),
            StateFormat::UnsignedLong => {
                ControlValue::Integer(u64::from_le_bytes(array(bytes)) as i64)
            }
            StateFormat::Float => ControlValue::Float(read_f32(bytes, 0).into()),
            StateFormat::Double => ControlValue::Float(f64::from_le_bytes(array(bytes))),
            StateFormat::Vector2 => {
                ControlValue::Vec2(Vec2::new(read_f32(bytes, 0), read_f32(bytes, 1)))
            }
            StateFormat::Vector3 => ControlValue::Vec3(Vec3::new(
                read_f32(bytes, 0),
                read_f32(bytes, 1),
                read_f32(bytes, 2),
            )),
            StateFormat::Quaternion => ControlValue::Quat(Quat::from_xyzw(
                read_f32(bytes, 0),
                read_f32(bytes, 1),
                read_f32(bytes, 2),
                read_f32(bytes, 3),
            )),
        }
    }

    /// Encodes the value into the buffer, leaving bits outside of the block untouched.
    ///
    /// The value is converted to the block's format: floats are rounded for integer formats,
    /// integers are widened for floating point formats and scalars fill the `x` component
    /// of composite formats.
    pub fn write(&self, buffer: &mut [u8], value: ControlValue) {
        let format = self.state_format();
        if format.is_bit_field() {
            self.write_bits(buffer, value.as_i64() as u64);
            return;
        }

        let bytes = &mut buffer[self.byte_offset as usize..];
        match format {
            StateFormat::Bit | StateFormat::SignedBit => unreachable!("bit fields are written above"),
            StateFormat::Byte => bytes[0] = value.as_i64() as u8,
            StateFormat::SignedByte => bytes[0] = value.as_i64() as i8 as u8,
            StateFormat::Short => bytes[..2].copy_from_slice(&(value.as_i64() as i16).to_le_bytes()),
            StateFormat::UnsignedShort => {
                bytes[..2].copy_from_slice(&(value.as_i64() as u16).to_le_bytes())
            }
            StateFormat::Int => bytes[..4].copy_from_slice(&(value.as_i64() as i32).to_le_bytes()),
            StateFormat::UnsignedInt => {
                bytes[..4].copy_from_slice(&(value.as_i64() as u32).to_le_bytes())
            }
            StateFormat::Long | StateFormat::UnsignedLong => {
                bytes[..8].copy_from_slice(&value.as_i64().to_le_bytes())
            }
            StateFormat::Float => write_f32(bytes, 0, value.as_f64() as f32),
            StateFormat::Double => bytes[..8].copy_from_slice(&value.as_f64().to_le_bytes()),
            StateFormat::Vector2 | StateFormat::Vector3 | StateFormat::Quaternion => {
                let components = value.to_vec4().to_array();
                let count = self.size_in_bits as usize / 32;
                for (index, &component) in components.iter().take(count).enumerate() {
                    write_f32(bytes, index, component);
                }
            }
        }
    }

    fn read_bits(&self, buffer: &[u8]) -> u64 {
        let start = self.bit_range().start as usize;
        let mut value = 0;
        for index in 0..self.size_in_bits as usize {
            let bit = start + index;
            if buffer[bit / 8] & (1 << (bit % 8)) != 0 {
                value |= 1 << index;
            }
        }
        value
    }

    fn write_bits(&self, buffer: &mut [u8], value: u64) {
        copy_bits(buffer, self.bit_range(), |index| value & (1 << index) != 0);
    }
}

/// Assigns every bit in `bits` from `source`, which receives the bit index relative
/// to the start of the range.
pub(crate) fn copy_bits(buffer: &mut [u8], bits: Range<u64>, source: impl Fn(u64) -> bool) {
    let start = bits.start;
    for bit in bits {
        let mask = 1 << (bit % 8);
        let byte = &mut buffer[(bit / 8) as usize];
        if source(bit - start) {
            *byte |= mask;
        } else {
            *byte &= !mask;
        }
    }
}

fn array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut array = [0; N];
    array.copy_from_slice(&bytes[..N]);
    array
}

fn read_f32(bytes: &[u8], index: usize) -> f32 {
    f32::from_le_bytes(array(&bytes[index * 4..]))
}

fn write_f32(bytes: &mut [u8], index: usize, value: f32) {
    bytes[index * 4..index * 4 + 4].copy_from_slice(&value.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_bits() {
        let mut buffer = [0; 2];
        let block = StateBlock::bit(1, 3);
        block.write(&mut buffer, true.into());
        assert_eq!(buffer, [0, 0b1000]);
        assert_eq!(block.read(&buffer), ControlValue::Integer(1));

        StateBlock::bit(1, 4).write(&mut buffer, true.into());
        block.write(&mut buffer, false.into());
        assert_eq!(buffer, [0, 0b1_0000], "neighbour bits should stay intact");
    }

    #[test]
    fn unaligned_bit_fields() {
        let mut buffer = [0xFF; 3];
        let block = StateBlock::bits(0, 6, 5);
        block.write(&mut buffer, 0b10110.into());
        assert_eq!(block.read(&buffer), ControlValue::Integer(0b10110));
        assert_eq!(buffer[0] & 0b0011_1111, 0b0011_1111);
        assert_eq!(buffer[1] & 0b1111_1000, 0b1111_1000);
    }

    #[test]
    fn signed_bits() {
        let mut buffer = [0; 1];
        let block = StateBlock::new(0, 2, 4, StateFormat::SIGNED_BIT);
        block.write(&mut buffer, (-3).into());
        assert_eq!(block.read(&buffer), ControlValue::Integer(-3));
        block.write(&mut buffer, 7.into());
        assert_eq!(block.read(&buffer), ControlValue::Integer(7));
    }

    #[test]
    fn integers() {
        let mut buffer = [0; 16];
        let cases = [
            (StateBlock::new(1, 0, 8, StateFormat::SIGNED_BYTE), -100),
            (StateBlock::byte(2), 200),
            (StateBlock::new(3, 0, 16, StateFormat::SHORT), -30_000),
            (StateBlock::new(3, 0, 16, StateFormat::UNSIGNED_SHORT), 60_000),
            (StateBlock::int(4), -2_000_000),
            (StateBlock::new(4, 0, 32, StateFormat::UNSIGNED_INT), 4_000_000_000),
            (StateBlock::new(8, 0, 64, StateFormat::LONG), i64::MIN + 1),
            (StateBlock::new(8, 0, 64, StateFormat::UNSIGNED_LONG), i64::MAX),
            (StateBlock::new(8, 0, 64, StateFormat::UNSIGNED_LONG), u64::MAX as i64),
        ];
        for (block, value) in cases {
            block.write(&mut buffer, value.into());
            assert_eq!(block.read(&buffer), ControlValue::Integer(value), "{block:?}");
        }
    }

    #[test]
    fn little_endian() {
        let mut buffer = [0; 4];
        StateBlock::int(0).write(&mut buffer, 0x0102_0304.into());
        assert_eq!(buffer, [4, 3, 2, 1]);
    }

    #[test]
    fn floats() {
        let mut buffer = [0; 12];
        StateBlock::float(0).write(&mut buffer, 0.25_f32.into());
        assert_eq!(StateBlock::float(0).read(&buffer), ControlValue::Float(0.25));

        let double = StateBlock::new(4, 0, 64, StateFormat::DOUBLE);
        double.write(&mut buffer, 1.0e-10_f64.into());
        assert_eq!(double.read(&buffer), ControlValue::Float(1.0e-10));

        StateBlock::float(0).write(&mut buffer, 3.into());
        assert_eq!(StateBlock::float(0).read(&buffer), ControlValue::Float(3.0));
    }

    #[test]
    fn composites() {
        let mut buffer = [0; 32];
        let vector2 = StateBlock::vector2(0);
        vector2.write(&mut buffer, Vec2::new(0.5, -1.0).into());
        assert_eq!(vector2.read(&buffer), ControlValue::Vec2(Vec2::new(0.5, -1.0)));

        let vector3 = StateBlock::vector3(8);
        vector3.write(&mut buffer, Vec3::new(1.0, 2.0, 3.0).into());
        assert_eq!(vector3.read(&buffer), ControlValue::Vec3(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(
            StateBlock::float(12).read(&buffer),
            ControlValue::Float(2.0),
            "components should be laid out consecutively"
        );

        let rotation = Quat::from_xyzw(0.0, 0.6, 0.0, 0.8);
        let quaternion = StateBlock::quaternion(16);
        quaternion.write(&mut buffer, rotation.into());
        assert_eq!(quaternion.read(&buffer), ControlValue::Quat(rotation));
    }

    #[test]
    fn overlap() {
        let block = StateBlock::bit(1, 2);
        assert!(block.overlaps(&(8..16)));
        assert!(block.overlaps(&(10..11)));
        assert!(!block.overlaps(&(11..16)));
        assert!(!block.overlaps(&(0..8)));
        assert!(block.is_inside(&(8..16)));
        assert_eq!(StateBlock::bits(0, 7, 2).byte_len(), 2);
    }
}
