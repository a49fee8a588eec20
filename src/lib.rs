/*!
Low-level input state system for Bevy.

Every input device is represented by a block of raw bytes described by a
[`DeviceLayout`]. Layouts map named controls, like `buttonSouth` or `leftStick/x`,
to bit ranges of that block with a storage format. Hardware backends and game logic
don't write into devices directly: they queue [`StateEvent`]s that are applied in a
single place during the update, which makes it possible to answer "was this button
pressed during this frame" for any control.

# Quick start

Add [`InputStatePlugin`] to your app:

```
use bevy::prelude::*;
use bevy_input_state::prelude::*;

let mut app = App::new();
app.add_plugins((MinimalPlugins, InputStatePlugin));
```

The plugin inserts the [`InputDevices`] resource with all [built-in layouts](crate::layouts)
registered and updates it in [`PreUpdate`].

Devices can be added by type and fed with events from any thread:

```
use bevy_input_state::prelude::*;

let mut devices = InputDevices::default();
bevy_input_state::layouts::register_all(&mut devices).unwrap();

let gamepad = devices.add::<StandardGamepad>().unwrap();
let south = devices.find_control("/Gamepad/buttonSouth").unwrap();

let sender = devices.sender();
let view = devices.view(south).unwrap();
sender.send(StateEvent::for_control(view, true, 0.0));

devices.update();

let button = devices.view(south).and_then(|control| control.as_button()).unwrap();
assert!(button.is_pressed());
assert!(button.was_pressed_this_frame());
assert_eq!(devices.get(gamepad).unwrap().name(), "Gamepad");
```

# Controls and paths

Controls are addressed by paths relative to a device, like `leftStick/x`, or by
absolute paths that select a device by name (`/Gamepad1/start`) or by layout
(`/<Keyboard>/space`). Matching ignores ASCII case. See [`ControlPath`].

Values are read through [`ControlView`]. Controls with [`ControlKind::Button`] can
be viewed as [`ButtonView`] to compare against a press point and the previous frame.

# Listening for changes

[`InputDevices`] provides several lists of callbacks:

- [`InputDevices::on_before_update`] and [`InputDevices::on_after_update`] around every update.
- [`InputDevices::on_event`] for every event, which can also consume the event.
- [`InputDevices::on_device_change`] for lifecycle changes.
- [`InputDevices::on_settings_change`] when [`InputSettings`] are applied.

Callbacks are invoked from a snapshot in reverse order of addition and may add or
remove callbacks while running. A failing callback is logged and doesn't prevent
other callbacks from running. See [`CallbackList`].

For individual controls use [`InputDevices::add_change_monitor`].

# On-screen controls

[`OnScreenControl`] binds an entity to a control of a shared virtual device, so UI
elements can act like real hardware. See the [`onscreen`] module for details.

# Troubleshooting

If you face any issue, try to enable logging to see what is going on.
To enable logging, you can temporarily set `RUST_LOG` environment variable to `bevy_input_state=debug`
(or `bevy_input_state=trace` for more noisy output) like this:

```bash
RUST_LOG=bevy_input_state=debug cargo run
```

The exact method depends on the OS shell.

Alternatively you can configure `LogPlugin` to make it permanent.
*/

#![no_std]

extern crate alloc;

pub mod control;
pub mod device;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod layouts;
pub mod onscreen;
pub mod settings;
pub mod state;

pub mod prelude {
    pub use super::{
        InputStatePlugin, InputStateSystems,
        control::{
            ControlFlags, ControlId, ControlIndex, ControlKind, ControlLayout, ControlView,
            button::ButtonView,
            path::{ControlPath, DeviceMatcher},
        },
        device::{
            Device, DeviceChange, DeviceDescriptor, DeviceFlags, DeviceId, DeviceLifecycle,
            InputDevice,
            command::{CommandContext, CommandHandler, CommandResult, CommandTable, DeviceCommand},
            layout::{DeviceLayout, DeviceLayoutBuilder},
            registry::InputDevices,
        },
        dispatch::{Callback, Callback1, Callback2, CallbackId, CallbackList, Predicate2},
        error::{DeviceError, LayoutError, PathError},
        event::{
            StateEvent, StateEventSender,
            monitor::{ChangeMonitorContext, MonitorCallback, MonitorToken},
        },
        layouts::{
            gamepad::StandardGamepad,
            keyboard::Keyboard,
            step_counter::{StepCounter, StepCounterSensor, StepSink},
            tracked::TrackedDevice,
        },
        onscreen::{OnScreenControl, OnScreenEntityCommandsExt, OnScreenEntityWorldMutExt},
        settings::{DEFAULT_PRESS_POINT, InputSettings},
        state::{
            StateBlock,
            buffers::StateBuffers,
            format::{FourCc, StateFormat},
            value::ControlValue,
        },
    };
}

use bevy::{input::InputSystems, prelude::*};

use prelude::*;

/// Registers built-in layouts and updates devices every frame.
///
/// See also [`InputStateSystems`].
pub struct InputStatePlugin;

impl Plugin for InputStatePlugin {
    fn build(&self, app: &mut App) {
        let mut devices = InputDevices::default();
        if let Err(e) = layouts::register_all(&mut devices) {
            panic!("built-in layouts should be valid: {e}");
        }

        app.init_resource::<InputSettings>()
            .insert_resource(devices)
            .add_observer(onscreen::bind)
            .add_observer(onscreen::unbind)
            .configure_sets(PreUpdate, InputStateSystems::Update.after(InputSystems))
            .add_systems(
                PreUpdate,
                update_devices.in_set(InputStateSystems::Update),
            );
    }
}

/// Label for the system that applies queued events to devices.
#[derive(Debug, PartialEq, Eq, Clone, Hash, SystemSet)]
pub enum InputStateSystems {
    /// Pushes changed [`InputSettings`] and runs [`InputDevices::update`].
    ///
    /// Runs in [`PreUpdate`].
    Update,
}

fn update_devices(mut devices: ResMut<InputDevices>, settings: Res<InputSettings>) {
    if settings.is_changed() {
        devices.apply_settings(*settings);
    }
    devices.update();
}
