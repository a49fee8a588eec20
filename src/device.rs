/*!
Devices and their registry.

A [`Device`] owns double-buffered raw state sized by its [`DeviceLayout`] and exposes
the layout's controls as [`ControlView`]s. Devices are created and owned by
[`InputDevices`], which is the only place where their state can be modified.

# Lifecycle

```text
Added -> Enabled <-> Disabled -> Removed
```

A device goes to [`DeviceLifecycle::Enabled`] right after it's added, unless its
[`DeviceCommand::EnableDevice`] handler fails. Events for disabled devices are
dropped. Removal is terminal: further lookups by [`DeviceId`] return `None`.

# Device types

Types implementing [`InputDevice`] describe a layout and its command handlers.
See [`crate::layouts`] for the built-in ones.
*/

pub mod command;
pub mod layout;
pub mod registry;

use alloc::string::String;
use core::{
    any::TypeId,
    fmt::{self, Display, Formatter},
};

use bevy::platform::sync::Arc;
use bitflags::bitflags;

use crate::prelude::*;

/// Unique identifier of a device, never reused within a registry.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub struct DeviceId(pub(crate) u32);

impl DeviceId {
    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }
}

impl Display for DeviceId {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Additional metadata for a device.
#[derive(Default, Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct DeviceFlags(u8);

bitflags! {
    impl DeviceFlags: u8 {
        /// Created by software rather than backed by hardware.
        const VIRTUAL = 0b00000001;
    }
}

/// Lifecycle state of a device.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum DeviceLifecycle {
    Added,
    Enabled,
    Disabled,
    Removed,
}

/// Change reported to [`InputDevices::on_device_change`] listeners.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum DeviceChange {
    Added,
    Removed,
    Enabled,
    Disabled,
    /// State was requested to return to defaults with [`InputDevices::reset_device`].
    Reset,
}

/// Device type with a static layout.
///
/// # Examples
///
/// ```
/// use bevy_input_state::prelude::*;
///
/// struct Pedal;
///
/// impl InputDevice for Pedal {
///     const LAYOUT: &'static str = "Pedal";
///
///     fn layout() -> Result<DeviceLayout, LayoutError> {
///         DeviceLayout::builder(Self::LAYOUT, "PDAL".parse().unwrap())
///             .button("press", StateBlock::float(0))
///             .build()
///     }
/// }
///
/// let mut devices = InputDevices::default();
/// let id = devices.add::<Pedal>().unwrap();
/// assert_eq!(devices.find_by_type::<Pedal>().map(Device::id), Some(id));
/// ```
pub trait InputDevice: 'static {
    /// Layout name, used in `<Layout>` paths.
    const LAYOUT: &'static str;

    /// Builds the layout.
    ///
    /// Called once per registry.
    fn layout() -> Result<DeviceLayout, LayoutError>;

    /// Creates command handlers for a new device.
    fn commands() -> CommandTable {
        CommandTable::default()
    }
}

/// Everything needed to create a device.
#[derive(Debug)]
pub struct DeviceDescriptor {
    pub(crate) layout: Arc<DeviceLayout>,
    pub(crate) type_id: Option<TypeId>,
    pub(crate) name: Option<String>,
    pub(crate) persistent_id: Option<String>,
    pub(crate) flags: DeviceFlags,
    pub(crate) commands: CommandTable,
}

impl DeviceDescriptor {
    #[must_use]
    pub fn new(layout: impl Into<Arc<DeviceLayout>>) -> Self {
        Self {
            layout: layout.into(),
            type_id: None,
            name: None,
            persistent_id: None,
            flags: DeviceFlags::empty(),
            commands: Default::default(),
        }
    }

    /// Associates the device with a type for [`InputDevices::find_by_type`].
    #[must_use]
    pub fn with_type<T: InputDevice>(mut self) -> Self {
        self.type_id = Some(TypeId::of::<T>());
        self
    }

    /// Overrides the name, which defaults to the layout name.
    ///
    /// A numeric suffix is still added on clashes.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets an identifier that survives reconnects, like a serial number.
    #[must_use]
    pub fn with_persistent_id(mut self, persistent_id: impl Into<String>) -> Self {
        self.persistent_id = Some(persistent_id.into());
        self
    }

    #[must_use]
    pub fn with_flags(mut self, flags: DeviceFlags) -> Self {
        self.flags |= flags;
        self
    }

    #[must_use]
    pub fn with_commands(mut self, commands: CommandTable) -> Self {
        self.commands = commands;
        self
    }
}

/// An input device registered in [`InputDevices`].
#[derive(Debug)]
pub struct Device {
    id: DeviceId,
    name: String,
    layout: Arc<DeviceLayout>,
    type_id: Option<TypeId>,
    persistent_id: Option<String>,
    flags: DeviceFlags,
    pub(crate) lifecycle: DeviceLifecycle,
    pub(crate) buffers: StateBuffers,
    pub(crate) commands: CommandTable,
    pub(crate) default_press_point: f32,
}

impl Device {
    pub(crate) fn new(
        id: DeviceId,
        name: String,
        descriptor: DeviceDescriptor,
        default_press_point: f32,
    ) -> Self {
        let buffers = StateBuffers::new(descriptor.layout.state_size() as usize);
        Self {
            id,
            name,
            layout: descriptor.layout,
            type_id: descriptor.type_id,
            persistent_id: descriptor.persistent_id,
            flags: descriptor.flags,
            lifecycle: DeviceLifecycle::Added,
            buffers,
            commands: descriptor.commands,
            default_press_point,
        }
    }

    #[must_use]
    pub fn id(&self) -> DeviceId {
        self.id
    }

    /// Unique name among registered devices.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn layout(&self) -> &DeviceLayout {
        &self.layout
    }

    /// Returns `true` if the device was created for type `T`.
    #[must_use]
    pub fn is<T: InputDevice>(&self) -> bool {
        self.type_id == Some(TypeId::of::<T>())
    }

    #[must_use]
    pub fn type_id(&self) -> Option<TypeId> {
        self.type_id
    }

    #[must_use]
    pub fn persistent_id(&self) -> Option<&str> {
        self.persistent_id.as_deref()
    }

    #[must_use]
    pub fn flags(&self) -> DeviceFlags {
        self.flags
    }

    #[must_use]
    pub fn is_virtual(&self) -> bool {
        self.flags.contains(DeviceFlags::VIRTUAL)
    }

    #[must_use]
    pub fn lifecycle(&self) -> DeviceLifecycle {
        self.lifecycle
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.lifecycle == DeviceLifecycle::Enabled
    }

    #[must_use]
    pub fn buffers(&self) -> &StateBuffers {
        &self.buffers
    }

    /// Press point used by buttons without their own.
    ///
    /// Mirrors [`InputSettings::default_press_point`].
    #[must_use]
    pub fn default_press_point(&self) -> f32 {
        self.default_press_point
    }

    /// Returns a control by a `/`-separated path, like `leftStick/x`.
    #[must_use]
    pub fn control(&self, path: &str) -> Option<ControlView<'_>> {
        self.layout
            .find(path)
            .map(|index| ControlView::new(self, index))
    }

    /// Returns a control by index.
    ///
    /// Returns `None` if the index is out of bounds of the layout.
    #[must_use]
    pub fn control_at(&self, index: ControlIndex) -> Option<ControlView<'_>> {
        self.layout
            .get(index)
            .map(|_| ControlView::new(self, index))
    }

    /// Iterates over all controls in declaration order.
    pub fn controls(&self) -> impl Iterator<Item = ControlView<'_>> {
        self.layout
            .iter()
            .map(move |(index, _)| ControlView::new(self, index))
    }
}

impl Display for Device {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "`{}` ({})", self.name, self.id)
    }
}
