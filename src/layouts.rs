/*!
Built-in device types.

[`InputStatePlugin`] registers all of them, so they can be used in `<Layout>` paths
and with [`InputDevices::acquire_shared`] right away.

| Type | Layout | Format |
|------|--------|--------|
| [`Keyboard`] | `Keyboard` | `KEYS` |
| [`StandardGamepad`] | `Gamepad` | `GPAD` |
| [`TrackedDevice`] | `TrackedDevice` | `TRKD` |
| [`StepCounter`] | `StepCounter` | `ISCS` |
*/

pub mod gamepad;
pub mod keyboard;
pub mod step_counter;
pub mod tracked;

use crate::prelude::*;

/// Registers layouts of all built-in devices.
pub fn register_all(devices: &mut InputDevices) -> Result<(), LayoutError> {
    devices.register_layout::<Keyboard>()?;
    devices.register_layout::<StandardGamepad>()?;
    devices.register_layout::<TrackedDevice>()?;
    devices.register_layout::<StepCounter>()?;
    Ok(())
}
