/*!
Controls are typed nodes that interpret parts of a device state.

Every device layout stores its controls in a flat arena. A control references its parent
and children by [`ControlIndex`], so the tree has no ownership cycles: the layout owns
all nodes and devices share the layout.

Values are never cached. [`ControlView::value`] decodes the control's [`StateBlock`] from
the device's current buffer and [`ControlView::previous_value`] from the previous one.

# Kinds

[`ControlKind`] decides how a value is meant to be consumed, while the block format decides
how bits are decoded. Any control can be read as a float with [`ControlView::read_as_f32`]
and as a bool with [`ControlView::read_as_bool`], so code written against axes also works
with buttons.

Buttons are not a separate value type. [`ControlView::as_button`] wraps any scalar control
into a [`ButtonView`] that adds press point logic on top of the float value.

Composite kinds ([`ControlKind::Vector2`], [`ControlKind::Vector3`] and
[`ControlKind::Quaternion`]) get `x`, `y`, `z` and `w` axis children whose blocks are
slices of the parent block.
*/

pub mod button;
pub mod path;

use alloc::string::String;
use core::fmt::{self, Display, Formatter};

use bitflags::bitflags;
use smallvec::SmallVec;

use crate::prelude::*;

/// Index of a control inside its device layout.
#[derive(Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub struct ControlIndex(pub(crate) u32);

impl ControlIndex {
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identifies a control on a specific device.
///
/// Doesn't keep the device alive. Lookups with a removed device return `None`.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct ControlId {
    pub device: DeviceId,
    pub control: ControlIndex,
}

/// How the value of a control is meant to be consumed.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum ControlKind {
    /// A single analog or digital value.
    Axis,
    /// An axis with a threshold at which it's considered pressed.
    Button {
        /// Threshold at or above which the button is pressed.
        ///
        /// Values `<= 0` use [`InputSettings::default_press_point`].
        press_point: f32,
    },
    /// Whole number value, like an enum or a counter.
    Integer,
    /// `x` and `y` axes.
    Vector2,
    /// `x`, `y` and `z` axes.
    Vector3,
    /// `x`, `y`, `z` and `w` axes.
    Quaternion,
}

impl ControlKind {
    /// Button that uses the default press point.
    #[must_use]
    pub const fn button() -> Self {
        Self::Button { press_point: 0.0 }
    }

    /// Returns `true` if a block in the given format can back this kind.
    #[must_use]
    pub fn accepts(self, format: StateFormat) -> bool {
        match self {
            Self::Axis | Self::Button { .. } => format.is_scalar(),
            Self::Integer => format.is_integer(),
            Self::Vector2 => format == StateFormat::Vector2,
            Self::Vector3 => format == StateFormat::Vector3,
            Self::Quaternion => format == StateFormat::Quaternion,
        }
    }

    /// Names of the axis children created for composite kinds.
    #[must_use]
    pub fn component_names(self) -> &'static [&'static str] {
        match self {
            Self::Vector2 => &["x", "y"],
            Self::Vector3 => &["x", "y", "z"],
            Self::Quaternion => &["x", "y", "z", "w"],
            _ => &[],
        }
    }
}

/// Additional metadata for a control.
#[derive(Default, Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct ControlFlags(u8);

bitflags! {
    impl ControlFlags: u8 {
        /// The value changes constantly without user interaction, like sensor readings.
        ///
        /// Consumers that look for "any input" should ignore such controls.
        const NOISY = 0b00000001;
        /// The value is computed from other controls rather than read from hardware.
        const SYNTHETIC = 0b00000010;
    }
}

/// A node in a device layout.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlLayout {
    pub(crate) name: String,
    pub(crate) kind: ControlKind,
    pub(crate) block: StateBlock,
    pub(crate) flags: ControlFlags,
    pub(crate) parent: Option<ControlIndex>,
    pub(crate) children: SmallVec<[ControlIndex; 4]>,
}

impl ControlLayout {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> ControlKind {
        self.kind
    }

    #[must_use]
    pub fn block(&self) -> StateBlock {
        self.block
    }

    #[must_use]
    pub fn flags(&self) -> ControlFlags {
        self.flags
    }

    #[must_use]
    pub fn parent(&self) -> Option<ControlIndex> {
        self.parent
    }

    #[must_use]
    pub fn children(&self) -> &[ControlIndex] {
        &self.children
    }
}

/// Read access to a control of a device.
#[derive(Clone, Copy)]
pub struct ControlView<'a> {
    device: &'a Device,
    index: ControlIndex,
}

impl<'a> ControlView<'a> {
    pub(crate) fn new(device: &'a Device, index: ControlIndex) -> Self {
        Self { device, index }
    }

    #[must_use]
    pub fn device(&self) -> &'a Device {
        self.device
    }

    #[must_use]
    pub fn index(&self) -> ControlIndex {
        self.index
    }

    #[must_use]
    pub fn id(&self) -> ControlId {
        ControlId {
            device: self.device.id(),
            control: self.index,
        }
    }

    #[must_use]
    pub fn layout(&self) -> &'a ControlLayout {
        self.device.layout().control(self.index)
    }

    #[must_use]
    pub fn name(&self) -> &'a str {
        &self.layout().name
    }

    #[must_use]
    pub fn kind(&self) -> ControlKind {
        self.layout().kind
    }

    #[must_use]
    pub fn block(&self) -> StateBlock {
        self.layout().block
    }

    #[must_use]
    pub fn flags(&self) -> ControlFlags {
        self.layout().flags
    }

    #[must_use]
    pub fn parent(&self) -> Option<ControlView<'a>> {
        self.layout()
            .parent
            .map(|parent| Self::new(self.device, parent))
    }

    pub fn children(&self) -> impl Iterator<Item = ControlView<'a>> + 'a {
        let device = self.device;
        self.layout()
            .children
            .iter()
            .map(move |&child| Self::new(device, child))
    }

    /// Returns a descendant by a `/`-separated path relative to this control.
    #[must_use]
    pub fn child(&self, path: &str) -> Option<ControlView<'a>> {
        self.device
            .layout()
            .find_from(Some(self.index), path)
            .map(|index| Self::new(self.device, index))
    }

    /// Returns the absolute path in `/{device}/{control}` form.
    #[must_use]
    pub fn path(&self) -> String {
        alloc::format!("/{}/{}", self.device.name(), self.device.layout().path_of(self.index))
    }

    /// Decodes the value from the current state.
    #[must_use]
    pub fn value(&self) -> ControlValue {
        self.block().read(self.device.buffers().current())
    }

    /// Decodes the value from the state of the previous update.
    #[must_use]
    pub fn previous_value(&self) -> ControlValue {
        self.block().read(self.device.buffers().previous())
    }

    #[must_use]
    pub fn read_as_f32(&self) -> f32 {
        self.value().as_f32()
    }

    #[must_use]
    pub fn previous_as_f32(&self) -> f32 {
        self.previous_value().as_f32()
    }

    /// Returns the pressed state for buttons and `true` for any non-zero value otherwise.
    #[must_use]
    pub fn read_as_bool(&self) -> bool {
        match self.as_button() {
            Some(button) => button.is_pressed(),
            None => self.value().as_bool(),
        }
    }

    /// Returns `true` if the current value differs from the previous one.
    #[must_use]
    pub fn has_changed(&self) -> bool {
        self.value() != self.previous_value()
    }

    /// Wraps the control into a button if its kind is [`ControlKind::Button`].
    #[must_use]
    pub fn as_button(&self) -> Option<ButtonView<'a>> {
        match self.kind() {
            ControlKind::Button { press_point } => Some(ButtonView::new(*self, press_point)),
            _ => None,
        }
    }

    /// Like [`Self::as_button`], but treats any scalar control as a button with the given
    /// press point.
    #[must_use]
    pub fn as_button_with(&self, press_point: f32) -> Option<ButtonView<'a>> {
        self.block()
            .state_format()
            .is_scalar()
            .then(|| ButtonView::new(*self, press_point))
    }
}

impl Display for ControlView<'_> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}

impl fmt::Debug for ControlView<'_> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("ControlView")
            .field("path", &self.path())
            .field("value", &self.value())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use bevy::prelude::*;

    use super::*;

    #[test]
    fn navigation() {
        let mut devices = InputDevices::default();
        let id = devices.add::<StandardGamepad>().unwrap();
        let gamepad = devices.get(id).unwrap();

        let stick = gamepad.control("leftStick").unwrap();
        assert_eq!(stick.kind(), ControlKind::Vector2);
        let names: Vec<_> = stick.children().map(|child| child.name()).collect();
        assert_eq!(names, ["x", "y"]);

        let x = stick.child("x").unwrap();
        assert_eq!(x.parent().map(|parent| parent.index()), Some(stick.index()));
        assert_eq!(x.path(), "/Gamepad/leftStick/x");
        assert_eq!(
            gamepad.control("LEFTSTICK/X").map(|control| control.index()),
            Some(x.index()),
            "lookup should ignore case"
        );
        assert!(gamepad.control("leftStick/q").is_none());
    }

    #[test]
    fn kinds_accept_formats() {
        assert!(ControlKind::button().accepts(StateFormat::Bit));
        assert!(ControlKind::button().accepts(StateFormat::Float));
        assert!(!ControlKind::button().accepts(StateFormat::Vector2));
        assert!(ControlKind::Integer.accepts(StateFormat::Int));
        assert!(!ControlKind::Integer.accepts(StateFormat::Float));
        assert!(ControlKind::Quaternion.accepts(StateFormat::Quaternion));
        assert!(!ControlKind::Vector3.accepts(StateFormat::Vector2));
    }

    #[test]
    fn values_follow_buffers() {
        let mut devices = InputDevices::default();
        let id = devices.add::<StandardGamepad>().unwrap();
        let stick = devices.get(id).unwrap().control("leftStick").unwrap().id();

        devices.queue_event(StateEvent::for_control(
            devices.view(stick).unwrap(),
            Vec2::new(0.5, 0.0),
            1.0,
        ));
        devices.update();

        let stick = devices.view(stick).unwrap();
        assert_eq!(stick.value(), ControlValue::Vec2(Vec2::new(0.5, 0.0)));
        assert_eq!(stick.previous_value(), ControlValue::Vec2(Vec2::ZERO));
        assert_eq!(stick.read_as_f32(), 0.5);
        assert!(stick.read_as_bool());
        assert!(stick.has_changed());
        assert_eq!(stick.child("x").unwrap().read_as_f32(), 0.5);
        assert!(stick.as_button().is_none());
        assert!(stick.as_button_with(0.1).is_none(), "composites can't be buttons");
    }
}
