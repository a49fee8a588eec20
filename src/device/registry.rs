use alloc::{
    boxed::Box,
    format,
    string::{String, ToString},
    vec::Vec,
};
use core::any::{self, TypeId};

use bevy::{
    platform::{collections::HashMap, sync::Arc},
    prelude::*,
};
use log::{debug, warn};

use crate::{event::monitor::ChangeMonitors, prelude::*};

/// All registered devices with their layouts, monitors and listeners.
///
/// Inserted by [`InputStatePlugin`], but can also be used on its own.
/// Removing or resetting the resource tears everything down.
#[derive(Resource, Debug)]
pub struct InputDevices {
    /// Sorted by ID since IDs only grow.
    pub(crate) devices: Vec<Device>,
    next_id: u32,
    layouts: HashMap<String, RegisteredLayout>,
    /// Share counts of devices created by [`Self::acquire_shared`].
    shared: HashMap<DeviceId, u32>,
    pub(crate) monitors: ChangeMonitors,
    pub(crate) sender: StateEventSender,
    pub(crate) settings: InputSettings,
    pub(crate) on_before_update: CallbackList<Callback>,
    pub(crate) on_after_update: CallbackList<Callback>,
    on_settings_change: CallbackList<Callback1<InputSettings>>,
    on_device_change: CallbackList<Callback2<Device, DeviceChange>>,
    pub(crate) on_event: CallbackList<Predicate2<StateEvent, Device>>,
}

const LISTENER_CONTEXT: &str = "InputDevices";

impl Default for InputDevices {
    fn default() -> Self {
        Self {
            devices: Default::default(),
            next_id: 0,
            layouts: Default::default(),
            shared: Default::default(),
            monitors: Default::default(),
            sender: Default::default(),
            settings: Default::default(),
            on_before_update: CallbackList::new("on_before_update")
                .with_context(LISTENER_CONTEXT),
            on_after_update: CallbackList::new("on_after_update")
                .with_context(LISTENER_CONTEXT),
            on_settings_change: CallbackList::new("on_settings_change")
                .with_context(LISTENER_CONTEXT),
            on_device_change: CallbackList::new("on_device_change")
                .with_context(LISTENER_CONTEXT),
            on_event: CallbackList::new("on_event")
                .with_context(LISTENER_CONTEXT),
        }
    }
}

impl InputDevices {
    /// Builds and stores the layout of `T`.
    ///
    /// Does nothing if the layout is already registered.
    pub fn register_layout<T: InputDevice>(&mut self) -> Result<(), LayoutError> {
        if self.layouts.contains_key(T::LAYOUT) {
            return Ok(());
        }

        let layout = T::layout()?;
        debug!(
            "registering layout `{}` for `{}`",
            T::LAYOUT,
            any::type_name::<T>()
        );
        self.layouts.insert(
            T::LAYOUT.to_string(),
            RegisteredLayout {
                layout: Arc::new(layout),
                type_id: TypeId::of::<T>(),
                commands: T::commands,
            },
        );

        Ok(())
    }

    /// Returns a registered layout by name, ignoring ASCII case.
    #[must_use]
    pub fn layout(&self, name: &str) -> Option<&DeviceLayout> {
        self.find_layout(name).map(|registered| &*registered.layout)
    }

    /// Adds a device of type `T`, registering its layout if needed.
    pub fn add<T: InputDevice>(&mut self) -> Result<DeviceId, DeviceError> {
        self.add_with::<T>(T::commands())
    }

    /// Like [`Self::add`], but uses custom command handlers instead of [`InputDevice::commands`].
    pub fn add_with<T: InputDevice>(
        &mut self,
        commands: CommandTable,
    ) -> Result<DeviceId, DeviceError> {
        self.register_layout::<T>()?;
        let registered = &self.layouts[T::LAYOUT];
        let descriptor = DeviceDescriptor::new(registered.layout.clone())
            .with_type::<T>()
            .with_commands(commands);
        self.add_descriptor(descriptor)
    }

    /// Adds a device from a descriptor.
    ///
    /// The device gets a unique name, zeroed state and is enabled right away.
    pub fn add_descriptor(&mut self, descriptor: DeviceDescriptor) -> Result<DeviceId, DeviceError> {
        let id = DeviceId(self.next_id);
        self.next_id += 1;

        let base_name = descriptor
            .name
            .as_deref()
            .unwrap_or(descriptor.layout.name())
            .to_string();
        let name = self.unique_name(base_name);
        debug!("adding device `{name}` ({id})");

        self.devices.push(Device::new(
            id,
            name,
            descriptor,
            self.settings.default_press_point,
        ));
        self.notify(id, DeviceChange::Added);
        self.enable(id)?;

        Ok(id)
    }

    /// Removes a device together with its monitors.
    pub fn remove(&mut self, id: DeviceId) -> Result<(), DeviceError> {
        let index = self.index_of(id).ok_or(DeviceError::NotRegistered(id))?;
        let mut device = self.devices.remove(index);
        debug!("removing device {device}");

        device.lifecycle = DeviceLifecycle::Removed;
        self.shared.remove(&id);
        self.monitors.remove_device(id);
        self.on_device_change.invoke2(&device, &DeviceChange::Removed);

        Ok(())
    }

    /// Sends [`DeviceCommand::EnableDevice`] and starts accepting events.
    ///
    /// If the command fails, the device stays disabled.
    pub fn enable(&mut self, id: DeviceId) -> Result<(), DeviceError> {
        let result = self.send_command(id, &mut DeviceCommand::EnableDevice)?;
        if result == CommandResult::Failure {
            warn!("unable to enable device {id}, keeping it disabled");
            self.set_lifecycle(id, DeviceLifecycle::Disabled);
            return Ok(());
        }

        if self.set_lifecycle(id, DeviceLifecycle::Enabled) {
            self.notify(id, DeviceChange::Enabled);
        }
        Ok(())
    }

    /// Sends [`DeviceCommand::DisableDevice`] and stops accepting events.
    pub fn disable(&mut self, id: DeviceId) -> Result<(), DeviceError> {
        self.send_command(id, &mut DeviceCommand::DisableDevice)?;
        if self.set_lifecycle(id, DeviceLifecycle::Disabled) {
            self.notify(id, DeviceChange::Disabled);
        }
        Ok(())
    }

    /// Returns the device state to defaults.
    ///
    /// Sends [`DeviceCommand::RequestReset`] and zeroes the state.
    ///
    /// For enabled devices a zeroed state is queued, so change monitors observe the
    /// reset on the next update. Disabled devices don't accept events, so their buffers
    /// are cleared right away and change monitors fire immediately.
    pub fn reset_device(&mut self, id: DeviceId) -> Result<(), DeviceError> {
        self.send_command(id, &mut DeviceCommand::RequestReset)?;
        let index = self.index_of(id).ok_or(DeviceError::NotRegistered(id))?;
        let device = &mut self.devices[index];
        let layout = device.layout();
        let payload = alloc::vec![0; layout.state_size() as usize];
        let event = StateEvent::state(id, layout.format(), payload, 0.0);
        if device.is_enabled() {
            self.sender.send(event);
        } else {
            debug!("clearing state of disabled device {device}");
            device.buffers.clear();
            let written = event.written_bits();
            self.monitors.fire(&self.devices[index], &event, &written);
        }
        self.notify(id, DeviceChange::Reset);
        Ok(())
    }

    /// Runs a command handler of the device.
    ///
    /// Unknown command tags produce [`CommandResult::NotHandled`].
    pub fn execute_command(
        &mut self,
        id: DeviceId,
        command: &mut DeviceCommand,
    ) -> Result<CommandResult, DeviceError> {
        let result = self.send_command(id, command)?;
        if result == CommandResult::NotHandled {
            warn!("device {id} doesn't handle command `{}`", command.tag());
        }
        Ok(result)
    }

    fn send_command(
        &mut self,
        id: DeviceId,
        command: &mut DeviceCommand,
    ) -> Result<CommandResult, DeviceError> {
        let index = self.index_of(id).ok_or(DeviceError::NotRegistered(id))?;
        let context = CommandContext {
            device: id,
            sender: &self.sender,
        };
        let result = self.devices[index].commands.execute(&context, command);
        debug!("device {id} answered `{}` with `{result:?}`", command.tag());
        Ok(result)
    }

    /// Returns a device created by [`Self::acquire_shared`] for the layout
    /// or creates a new one.
    ///
    /// Devices added in other ways are never reused. Each call must be paired
    /// with [`Self::release_shared`].
    pub fn acquire_shared(&mut self, layout: &str) -> Result<DeviceId, DeviceError> {
        let existing = self.devices.iter().find(|device| {
            self.shared.contains_key(&device.id())
                && device.layout().name().eq_ignore_ascii_case(layout)
        });
        if let Some(device) = existing {
            let id = device.id();
            let count = self.shared.entry(id).or_default();
            *count += 1;
            debug!("sharing device {id}, now used {count} times");
            return Ok(id);
        }

        let registered = self
            .find_layout(layout)
            .ok_or_else(|| DeviceError::UnknownLayout(layout.to_string()))?;
        let mut descriptor = DeviceDescriptor::new(registered.layout.clone())
            .with_commands((registered.commands)())
            .with_flags(DeviceFlags::VIRTUAL);
        descriptor.type_id = Some(registered.type_id);

        let id = self.add_descriptor(descriptor)?;
        self.shared.insert(id, 1);
        Ok(id)
    }

    /// Releases a device obtained from [`Self::acquire_shared`].
    ///
    /// The device is removed when the last user releases it.
    pub fn release_shared(&mut self, id: DeviceId) -> Result<(), DeviceError> {
        let count = self.shared.get_mut(&id).ok_or(DeviceError::NotShared(id))?;
        *count -= 1;
        if *count > 0 {
            debug!("releasing device {id}, still used {count} times");
            return Ok(());
        }

        self.remove(id)
    }

    /// Returns the number of users of a shared device.
    #[must_use]
    pub fn share_count(&self, id: DeviceId) -> Option<u32> {
        self.shared.get(&id).copied()
    }

    #[must_use]
    pub fn get(&self, id: DeviceId) -> Option<&Device> {
        self.index_of(id).map(|index| &self.devices[index])
    }

    /// Iterates over devices in the order they were added.
    pub fn iter(&self) -> impl Iterator<Item = &Device> {
        self.devices.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Returns the most recently added device of type `T`.
    #[must_use]
    pub fn find_by_type<T: InputDevice>(&self) -> Option<&Device> {
        self.iter_by_type::<T>().last()
    }

    pub fn iter_by_type<T: InputDevice>(&self) -> impl Iterator<Item = &Device> {
        self.devices.iter().filter(|device| device.is::<T>())
    }

    /// Returns the first device matching a path like `<Gamepad>` or `/Gamepad1`.
    pub fn find_device(&self, path: &str) -> Result<&Device, DeviceError> {
        let matcher: DeviceMatcher = path.parse()?;
        self.devices
            .iter()
            .find(|device| matcher.matches(device))
            .ok_or_else(|| DeviceError::NoDevice(path.to_string()))
    }

    /// Resolves a path like `/<Keyboard>/a` to a control of the first matching device.
    pub fn find_control(&self, path: &str) -> Result<ControlId, DeviceError> {
        let parsed = ControlPath::parse(path)?;
        self.devices
            .iter()
            .filter(|device| parsed.device.matches(device))
            .find_map(|device| device.control(&parsed.control))
            .map(|control| control.id())
            .ok_or_else(|| DeviceError::NoControl(path.to_string()))
    }

    /// Returns a view for a control, or `None` if its device was removed.
    #[must_use]
    pub fn view(&self, id: ControlId) -> Option<ControlView<'_>> {
        self.get(id.device)
            .and_then(|device| device.control_at(id.control))
    }

    /// Queues an event for the next [`Self::update`].
    pub fn queue_event(&self, event: StateEvent) {
        self.sender.send(event);
    }

    /// Returns a queue handle that can be moved to other threads.
    #[must_use]
    pub fn sender(&self) -> StateEventSender {
        self.sender.clone()
    }

    #[must_use]
    pub fn settings(&self) -> &InputSettings {
        &self.settings
    }

    /// Pushes new settings into all devices.
    ///
    /// Listeners are notified only if the settings actually changed.
    pub fn apply_settings(&mut self, settings: InputSettings) {
        if self.settings == settings {
            return;
        }

        debug!("applying `{settings:?}`");
        self.settings = settings;
        for device in &mut self.devices {
            device.default_press_point = settings.default_press_point;
        }
        self.on_settings_change.invoke1(&self.settings);
    }

    /// Calls the callback each time an event writes into the control.
    ///
    /// The monitor is removed together with the device.
    pub fn add_change_monitor(
        &mut self,
        control: ControlId,
        callback: impl FnMut(&ChangeMonitorContext) -> Result<()> + Send + Sync + 'static,
    ) -> Result<MonitorToken, DeviceError> {
        self.add_change_monitor_indexed(control, -1, callback)
    }

    /// Like [`Self::add_change_monitor`], but passes the index to the callback.
    ///
    /// Useful to distinguish controls when a single callback monitors several of them.
    pub fn add_change_monitor_indexed(
        &mut self,
        control: ControlId,
        monitor_index: i64,
        callback: impl FnMut(&ChangeMonitorContext) -> Result<()> + Send + Sync + 'static,
    ) -> Result<MonitorToken, DeviceError> {
        if self.view(control).is_none() {
            return Err(DeviceError::NoControl(format!("{control:?}")));
        }

        Ok(self
            .monitors
            .add(control, monitor_index, Box::new(callback)))
    }

    /// Returns `false` if the monitor was already removed.
    pub fn remove_change_monitor(&mut self, token: MonitorToken) -> bool {
        self.monitors.remove(token)
    }

    #[must_use]
    pub fn monitor_count(&self) -> usize {
        self.monitors.len()
    }

    /// Listeners invoked at the start of each [`Self::update`].
    #[must_use]
    pub fn on_before_update(&self) -> &CallbackList<Callback> {
        &self.on_before_update
    }

    /// Listeners invoked at the end of each [`Self::update`].
    #[must_use]
    pub fn on_after_update(&self) -> &CallbackList<Callback> {
        &self.on_after_update
    }

    /// Listeners invoked when [`Self::apply_settings`] changes the settings.
    #[must_use]
    pub fn on_settings_change(&self) -> &CallbackList<Callback1<InputSettings>> {
        &self.on_settings_change
    }

    /// Listeners invoked when a device changes its lifecycle.
    #[must_use]
    pub fn on_device_change(&self) -> &CallbackList<Callback2<Device, DeviceChange>> {
        &self.on_device_change
    }

    /// Listeners that can intercept events before they're written.
    ///
    /// An event is skipped if any listener returns `true`.
    #[must_use]
    pub fn on_event(&self) -> &CallbackList<Predicate2<StateEvent, Device>> {
        &self.on_event
    }

    /// Removes all devices, monitors and queued events.
    ///
    /// Layouts, listeners and settings are kept.
    pub fn reset(&mut self) {
        debug!("resetting {} devices", self.devices.len());
        let ids: Vec<_> = self.devices.iter().map(Device::id).collect();
        for id in ids {
            if let Err(e) = self.remove(id) {
                warn!("unable to remove device {id}: {e}");
            }
        }
        self.shared.clear();
        self.monitors.clear();
        self.sender.clear();
    }

    pub(crate) fn index_of(&self, id: DeviceId) -> Option<usize> {
        self.devices
            .binary_search_by_key(&id, |device| device.id())
            .ok()
    }

    fn find_layout(&self, name: &str) -> Option<&RegisteredLayout> {
        self.layouts.get(name).or_else(|| {
            self.layouts
                .iter()
                .find(|(other, _)| other.eq_ignore_ascii_case(name))
                .map(|(_, registered)| registered)
        })
    }

    fn unique_name(&self, base: String) -> String {
        let taken = |name: &str| {
            self.devices
                .iter()
                .any(|device| device.name().eq_ignore_ascii_case(name))
        };
        if !taken(&base) {
            return base;
        }

        let mut suffix = 1;
        loop {
            let name = format!("{base}{suffix}");
            if !taken(&name) {
                return name;
            }
            suffix += 1;
        }
    }

    /// Returns `true` if the lifecycle changed.
    fn set_lifecycle(&mut self, id: DeviceId, lifecycle: DeviceLifecycle) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        let device = &mut self.devices[index];
        if device.lifecycle == lifecycle {
            return false;
        }
        debug!("changing {device} from `{:?}` to `{lifecycle:?}`", device.lifecycle);
        device.lifecycle = lifecycle;
        true
    }

    fn notify(&self, id: DeviceId, change: DeviceChange) {
        if let Some(device) = self.get(id) {
            self.on_device_change.invoke2(device, &change);
        }
    }
}

/// Layout built from an [`InputDevice`] type.
struct RegisteredLayout {
    layout: Arc<DeviceLayout>,
    type_id: TypeId,
    commands: fn() -> CommandTable,
}

impl core::fmt::Debug for RegisteredLayout {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("RegisteredLayout")
            .field("layout", &self.layout.name())
            .finish_non_exhaustive()
    }
}
