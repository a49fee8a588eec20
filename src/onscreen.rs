//! Virtual controls driven by game logic or UI instead of hardware.
//!
//! Inserting [`OnScreenControl`] on an entity binds it to a control of a shared virtual
//! device. All on-screen controls that request the same layout share a single device,
//! which is created by the first of them and removed with the last one. Devices that
//! were added in other ways are never used, so a virtual `<Keyboard>` never writes into
//! a physical keyboard.
//!
//! Removing the component or despawning the entity resets the bound control, so a
//! button disabled while held doesn't stay pressed.
//!
//! Values are sent with [`OnScreenEntityCommandsExt::send_value`] or
//! [`OnScreenEntityWorldMutExt::send_value`] and applied on the next update.

use alloc::{
    format,
    string::{String, ToString},
};

use bevy::{ecs::error::warn, prelude::*};
use log::{debug, error};
#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// Binds an entity to a control of a shared virtual device.
///
/// The path must select the device by layout, like `/<Keyboard>/a` or `<Gamepad>/leftStick`.
///
/// # Examples
///
/// ```
/// use bevy::prelude::*;
/// use bevy_input_state::prelude::*;
///
/// let mut app = App::new();
/// app.add_plugins((MinimalPlugins, InputStatePlugin)).finish();
///
/// let jump = app
///     .world_mut()
///     .spawn(OnScreenControl::new("/<Gamepad>/buttonSouth"))
///     .id();
/// app.world_mut().entity_mut(jump).send_value(true).unwrap();
/// app.update();
///
/// let devices = app.world().resource::<InputDevices>();
/// let control = app.world().get::<OnScreenControl>(jump).unwrap().control().unwrap();
/// assert!(devices.view(control).unwrap().read_as_bool());
/// ```
#[derive(Component, Reflect, Debug, Clone)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize", reflect(Serialize, Deserialize))]
pub struct OnScreenControl {
    control_path: String,
    #[reflect(ignore)]
    #[cfg_attr(feature = "serialize", serde(skip))]
    control: Option<ControlId>,
}

impl OnScreenControl {
    #[must_use]
    pub fn new(control_path: impl Into<String>) -> Self {
        Self {
            control_path: control_path.into(),
            control: None,
        }
    }

    #[must_use]
    pub fn control_path(&self) -> &str {
        &self.control_path
    }

    /// Returns the bound control.
    ///
    /// `None` if the path couldn't be resolved.
    #[must_use]
    pub fn control(&self) -> Option<ControlId> {
        self.control
    }
}

pub(crate) fn bind(
    insert: On<Insert, OnScreenControl>,
    mut devices: ResMut<InputDevices>,
    mut controls: Query<&mut OnScreenControl>,
) {
    let mut on_screen = controls.get_mut(insert.entity).unwrap();
    match acquire(&mut devices, &on_screen.control_path) {
        Ok(control) => {
            debug!(
                "binding `{}` to `{}`",
                insert.entity, on_screen.control_path
            );
            on_screen.control = Some(control);
        }
        Err(e) => error!("unable to bind `{}`: {e}", insert.entity),
    }
}

pub(crate) fn unbind(
    replace: On<Replace, OnScreenControl>,
    mut devices: ResMut<InputDevices>,
    time: Option<Res<Time>>,
    controls: Query<&OnScreenControl>,
) {
    let on_screen = controls.get(replace.entity).unwrap();
    let Some(control) = on_screen.control else {
        return;
    };
    debug!(
        "unbinding `{}` from `{}`",
        replace.entity, on_screen.control_path
    );

    // The device stays alive only if other controls still use it.
    if devices.share_count(control.device) > Some(1) {
        if let Some(view) = devices.view(control) {
            let time = time.map(|time| time.elapsed_secs_f64()).unwrap_or_default();
            let event = StateEvent::reset_control(view, time);
            devices.queue_event(event);
        }
    }

    if let Err(e) = devices.release_shared(control.device) {
        error!("unable to release device for `{}`: {e}", replace.entity);
    }
}

fn acquire(devices: &mut InputDevices, path: &str) -> Result<ControlId, DeviceError> {
    let parsed = ControlPath::parse(path)?;
    let layout = parsed
        .layout()
        .ok_or_else(|| DeviceError::NotALayoutPath(path.to_string()))?;

    let device = devices.acquire_shared(layout)?;
    let control = devices
        .get(device)
        .and_then(|device| device.control(&parsed.control))
        .map(|control| control.id());
    match control {
        Some(control) => Ok(control),
        None => {
            devices.release_shared(device)?;
            Err(DeviceError::NoControl(path.to_string()))
        }
    }
}

/// Extension trait for [`EntityWorldMut`] that provides methods for on-screen controls.
pub trait OnScreenEntityWorldMutExt {
    /// Sends a value to the control bound by [`OnScreenControl`].
    ///
    /// See [`OnScreenEntityCommandsExt::send_value`] for more details.
    fn send_value(self, value: impl Into<ControlValue>) -> Result<()>;
}

impl OnScreenEntityWorldMutExt for EntityWorldMut<'_> {
    fn send_value(self, value: impl Into<ControlValue>) -> Result<()> {
        send_value(value).apply(self)
    }
}

/// Extension trait for [`EntityCommands`] that provides methods for on-screen controls.
pub trait OnScreenEntityCommandsExt {
    /// Queues a value for the control bound by [`OnScreenControl`].
    ///
    /// The value is applied on the next update. This will emit a warning if the entity
    /// doesn't exist, has no [`OnScreenControl`] or its control is not bound.
    ///
    /// See also [`OnScreenEntityWorldMutExt::send_value`].
    ///
    /// # Examples
    ///
    /// ```
    /// # use bevy::prelude::*;
    /// # use bevy_input_state::prelude::*;
    /// fn press_jump(mut commands: Commands, jump: Single<Entity, With<JumpButton>>) {
    ///     commands.entity(*jump).send_value(true);
    /// }
    /// # #[derive(Component)]
    /// # struct JumpButton;
    /// ```
    fn send_value(&mut self, value: impl Into<ControlValue>) -> &mut Self;

    /// Like [`Self::send_value`], but will not emit a warning in case of failure.
    fn try_send_value(&mut self, value: impl Into<ControlValue>) -> &mut Self;
}

impl OnScreenEntityCommandsExt for EntityCommands<'_> {
    fn send_value(&mut self, value: impl Into<ControlValue>) -> &mut Self {
        self.queue_handled(send_value(value), warn)
    }

    fn try_send_value(&mut self, value: impl Into<ControlValue>) -> &mut Self {
        self.queue_silenced(send_value(value))
    }
}

/// Queues a value for the control bound by [`OnScreenControl`] on the entity.
///
/// Uses [`Time`] for the event timestamp if it's available.
pub fn send_value(value: impl Into<ControlValue>) -> impl EntityCommand<Result<()>> {
    let value = value.into();
    move |entity: EntityWorldMut| -> Result<()> {
        let on_screen = entity.get::<OnScreenControl>().ok_or_else(|| {
            format!(
                "entity {} has no `{}`",
                entity.id(),
                ShortName::of::<OnScreenControl>()
            )
        })?;
        let control = on_screen.control.ok_or_else(|| {
            format!(
                "`{}` of entity {} is not bound to a device",
                on_screen.control_path,
                entity.id()
            )
        })?;

        let world = entity.world();
        let devices = world.get_resource::<InputDevices>().ok_or_else(|| {
            format!(
                "`{}` is missing, is the plugin added?",
                ShortName::of::<InputDevices>()
            )
        })?;
        let view = devices
            .view(control)
            .ok_or_else(|| format!("device {} was removed", control.device))?;

        let time = world
            .get_resource::<Time>()
            .map(|time| time.elapsed_secs_f64())
            .unwrap_or_default();
        devices.queue_event(StateEvent::for_control(view, value, time));

        Ok(())
    }
}
