use crate::prelude::*;

/// Gamepad with an Xbox-like set of controls.
///
/// | Control | Block |
/// |---------|-------|
/// | `dpad` with `up`, `down`, `left`, `right` | bits 0..4 |
/// | `buttonNorth`, `buttonEast`, `buttonSouth`, `buttonWest` | bits 4..8 |
/// | `leftStickPress`, `rightStickPress` | bits 8..10 |
/// | `leftShoulder`, `rightShoulder` | bits 10..12 |
/// | `start`, `select` | bits 12..14 |
/// | `leftStick` | `VEC2` at byte 4 |
/// | `rightStick` | `VEC2` at byte 12 |
/// | `leftTrigger` | `FLT ` at byte 20 |
/// | `rightTrigger` | `FLT ` at byte 24 |
pub struct StandardGamepad;

impl StandardGamepad {
    pub const FORMAT: FourCc = FourCc::new(b'G', b'P', b'A', b'D');
}

impl InputDevice for StandardGamepad {
    const LAYOUT: &'static str = "Gamepad";

    fn layout() -> Result<DeviceLayout, LayoutError> {
        DeviceLayout::builder(Self::LAYOUT, Self::FORMAT)
            .integer("dpad", StateBlock::bits(0, 0, 4))
            .child("dpad", "up", ControlKind::button(), StateBlock::bit(0, 0))
            .child("dpad", "down", ControlKind::button(), StateBlock::bit(0, 1))
            .child("dpad", "left", ControlKind::button(), StateBlock::bit(0, 2))
            .child("dpad", "right", ControlKind::button(), StateBlock::bit(0, 3))
            .button("buttonNorth", StateBlock::bit(0, 4))
            .button("buttonEast", StateBlock::bit(0, 5))
            .button("buttonSouth", StateBlock::bit(0, 6))
            .button("buttonWest", StateBlock::bit(0, 7))
            .button("leftStickPress", StateBlock::bit(1, 0))
            .button("rightStickPress", StateBlock::bit(1, 1))
            .button("leftShoulder", StateBlock::bit(1, 2))
            .button("rightShoulder", StateBlock::bit(1, 3))
            .button("start", StateBlock::bit(1, 4))
            .button("select", StateBlock::bit(1, 5))
            .vector2("leftStick", 4)
            .vector2("rightStick", 12)
            .button("leftTrigger", StateBlock::float(20))
            .button("rightTrigger", StateBlock::float(24))
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout() {
        let layout = StandardGamepad::layout().unwrap();
        assert_eq!(layout.state_size(), 28);

        let dpad = layout.find("dpad").unwrap();
        assert_eq!(layout.control(dpad).children().len(), 4);
        assert_eq!(
            layout.control(layout.find("dpad/right").unwrap()).block(),
            StateBlock::bit(0, 3)
        );
        assert_eq!(
            layout.control(layout.find("rightStick/y").unwrap()).block(),
            StateBlock::float(16)
        );
    }
}
