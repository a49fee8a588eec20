//! Error types.
//!
//! Layout and path errors are configuration errors: they mean a device layout or a
//! control path was authored incorrectly and are reported when the layout is built or
//! the path is parsed. Runtime anomalies, like an event for a removed device, are
//! logged and never surface as errors.

use alloc::string::String;

use thiserror::Error;

use crate::prelude::*;

/// A device layout could not be built.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    #[error("control `{control}` uses unknown state format `{format}`")]
    UnknownFormat { control: String, format: FourCc },
    #[error("control `{control}` has bit offset {bit_offset}, but it must be in 0..8")]
    InvalidBitOffset { control: String, bit_offset: u32 },
    #[error("control `{control}` uses `{format}` with {size_in_bits} bits")]
    InvalidSize {
        control: String,
        format: FourCc,
        size_in_bits: u32,
    },
    #[error("control `{control}` uses byte format `{format}` with a non-zero bit offset")]
    UnalignedFormat { control: String, format: FourCc },
    #[error("control `{control}` of kind `{kind:?}` can't use state format `{format}`")]
    IncompatibleKind {
        control: String,
        kind: ControlKind,
        format: FourCc,
    },
    #[error("control `{control}` ends at bit {end_bit}, past the {state_size} byte state")]
    OutOfBounds {
        control: String,
        end_bit: u64,
        state_size: u32,
    },
    #[error("control `{control}` lies outside of its parent `{parent}`")]
    OutsideParent { control: String, parent: String },
    #[error("control `{0}` is declared more than once")]
    DuplicateControl(String),
    #[error("parent control `{0}` doesn't exist")]
    UnknownParent(String),
    #[error("layout `{0}` has no controls")]
    Empty(String),
}

/// A control path could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("control path is empty")]
    Empty,
    #[error("control path `{0}` has an unterminated `<`")]
    UnterminatedLayout(String),
    #[error("control path `{0}` doesn't name a control")]
    MissingControl(String),
}

/// An operation on [`InputDevices`] failed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeviceError {
    #[error("device {0} is not registered")]
    NotRegistered(DeviceId),
    #[error("device {0} is not a shared device")]
    NotShared(DeviceId),
    #[error("layout `{0}` is not registered")]
    UnknownLayout(String),
    #[error("no device matches `{0}`")]
    NoDevice(String),
    #[error("no control matches `{0}`")]
    NoControl(String),
    #[error("shared devices can only be requested by layout, got `{0}`")]
    NotALayoutPath(String),
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Path(#[from] PathError),
}
