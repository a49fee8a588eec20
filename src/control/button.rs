use core::fmt::{self, Debug, Formatter};

use crate::prelude::*;

/// Press point logic on top of a scalar control.
///
/// Created by [`ControlView::as_button`]. The underlying value can be stored in
/// any scalar format: a single bit yields only 0 and 1, while a float trigger is
/// considered pressed once it reaches [`Self::press_point`].
#[derive(Clone, Copy)]
pub struct ButtonView<'a> {
    control: ControlView<'a>,
    press_point: f32,
}

impl<'a> ButtonView<'a> {
    pub(crate) fn new(control: ControlView<'a>, press_point: f32) -> Self {
        Self {
            control,
            press_point,
        }
    }

    #[must_use]
    pub fn control(&self) -> ControlView<'a> {
        self.control
    }

    /// Returns the effective threshold.
    ///
    /// Uses the button's own press point if it's positive and
    /// [`InputSettings::default_press_point`] otherwise.
    #[must_use]
    pub fn press_point(&self) -> f32 {
        if self.press_point > 0.0 {
            self.press_point
        } else {
            self.control.device().default_press_point()
        }
    }

    /// Returns `true` if the value is considered pressed.
    #[must_use]
    pub fn is_value_pressed(&self, value: f32) -> bool {
        value >= self.press_point()
    }

    #[must_use]
    pub fn value(&self) -> f32 {
        self.control.read_as_f32()
    }

    #[must_use]
    pub fn is_pressed(&self) -> bool {
        self.is_value_pressed(self.value())
    }

    /// Returns `true` if the button was pressed during the last update,
    /// but wasn't pressed before it.
    #[must_use]
    pub fn was_pressed_this_frame(&self) -> bool {
        self.is_pressed() && !self.is_value_pressed(self.control.previous_as_f32())
    }

    /// Returns `true` if the button was released during the last update,
    /// but was pressed before it.
    #[must_use]
    pub fn was_released_this_frame(&self) -> bool {
        !self.is_pressed() && self.is_value_pressed(self.control.previous_as_f32())
    }
}

impl Debug for ButtonView<'_> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("ButtonView")
            .field("path", &self.control.path())
            .field("value", &self.value())
            .field("press_point", &self.press_point())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn digital() {
        let (mut devices, id) = init_devices();
        let key = button(&devices, id, "a");
        assert!(!key.is_pressed());
        assert_eq!(key.press_point(), DEFAULT_PRESS_POINT);

        press(&mut devices, id, "a", 1.0);
        let key = button(&devices, id, "a");
        assert!(key.is_pressed());
        assert!(key.was_pressed_this_frame());
        assert!(!key.was_released_this_frame());

        devices.update();
        let key = button(&devices, id, "a");
        assert!(key.is_pressed());
        assert!(!key.was_pressed_this_frame());
        assert!(!key.was_released_this_frame());

        press(&mut devices, id, "a", 0.0);
        let key = button(&devices, id, "a");
        assert!(!key.is_pressed());
        assert!(key.was_released_this_frame());
        assert!(!key.was_pressed_this_frame());
    }

    #[test]
    fn analog_threshold() {
        let (mut devices, id) = init_devices();

        press(&mut devices, id, "trigger", 0.49);
        assert!(
            !button(&devices, id, "trigger").is_pressed(),
            "should use the default press point"
        );

        press(&mut devices, id, "trigger", 0.5);
        let trigger = button(&devices, id, "trigger");
        assert!(trigger.is_pressed(), "press point should be inclusive");
        assert!(trigger.was_pressed_this_frame());

        press(&mut devices, id, "hairTrigger", 0.2);
        let hair = button(&devices, id, "hairTrigger");
        assert_eq!(hair.press_point(), 0.1);
        assert!(hair.is_pressed());
    }

    #[test]
    fn settings_change_default() {
        let (mut devices, id) = init_devices();
        press(&mut devices, id, "trigger", 0.3);

        devices.apply_settings(InputSettings {
            default_press_point: 0.25,
        });
        let trigger = button(&devices, id, "trigger");
        assert_eq!(trigger.press_point(), 0.25);
        assert!(trigger.is_pressed());
    }

    #[test]
    fn axis_as_button() {
        let (mut devices, id) = init_devices();
        press(&mut devices, id, "trigger", 0.3);

        let axis = devices.get(id).unwrap().control("trigger").unwrap();
        assert!(axis.as_button_with(0.2).unwrap().is_pressed());
        assert!(!axis.as_button_with(0.4).unwrap().is_pressed());
    }

    fn button<'a>(devices: &'a InputDevices, id: DeviceId, name: &str) -> ButtonView<'a> {
        devices
            .get(id)
            .and_then(|device| device.control(name))
            .and_then(|control| control.as_button())
            .unwrap()
    }

    fn press(devices: &mut InputDevices, id: DeviceId, name: &str, value: f32) {
        let control = devices.get(id).unwrap().control(name).unwrap();
        devices.queue_event(StateEvent::for_control(control, value, 0.0));
        devices.update();
    }

    fn init_devices() -> (InputDevices, DeviceId) {
        let layout = DeviceLayout::builder("Test", FourCc::new(b'T', b'E', b'S', b'T'))
            .button("a", StateBlock::bit(0, 0))
            .button("trigger", StateBlock::float(4))
            .control(
                "hairTrigger",
                ControlKind::Button { press_point: 0.1 },
                StateBlock::float(8),
            )
            .build()
            .unwrap();

        let mut devices = InputDevices::default();
        let id = devices.add_descriptor(DeviceDescriptor::new(layout)).unwrap();
        (devices, id)
    }
}
