use crate::prelude::*;

/// Keyboard with one bit per key.
///
/// Keys are named in camel case, like `a`, `digit1`, `leftShift` or `numpadEnter`.
pub struct Keyboard;

impl Keyboard {
    pub const FORMAT: FourCc = FourCc::new(b'K', b'E', b'Y', b'S');

    /// Key names in the order of their bits.
    pub const KEYS: &'static [&'static str] = &[
        "space",
        "enter",
        "tab",
        "backquote",
        "quote",
        "semicolon",
        "comma",
        "period",
        "slash",
        "backslash",
        "leftBracket",
        "rightBracket",
        "minus",
        "equals",
        "a",
        "b",
        "c",
        "d",
        "e",
        "f",
        "g",
        "h",
        "i",
        "j",
        "k",
        "l",
        "m",
        "n",
        "o",
        "p",
        "q",
        "r",
        "s",
        "t",
        "u",
        "v",
        "w",
        "x",
        "y",
        "z",
        "digit1",
        "digit2",
        "digit3",
        "digit4",
        "digit5",
        "digit6",
        "digit7",
        "digit8",
        "digit9",
        "digit0",
        "leftShift",
        "rightShift",
        "leftAlt",
        "rightAlt",
        "leftCtrl",
        "rightCtrl",
        "leftMeta",
        "rightMeta",
        "contextMenu",
        "escape",
        "leftArrow",
        "rightArrow",
        "upArrow",
        "downArrow",
        "backspace",
        "pageDown",
        "pageUp",
        "home",
        "end",
        "insert",
        "delete",
        "capsLock",
        "numLock",
        "printScreen",
        "scrollLock",
        "pause",
        "numpadEnter",
        "numpadDivide",
        "numpadMultiply",
        "numpadPlus",
        "numpadMinus",
        "numpadPeriod",
        "numpadEquals",
        "numpad0",
        "numpad1",
        "numpad2",
        "numpad3",
        "numpad4",
        "numpad5",
        "numpad6",
        "numpad7",
        "numpad8",
        "numpad9",
        "f1",
        "f2",
        "f3",
        "f4",
        "f5",
        "f6",
        "f7",
        "f8",
        "f9",
        "f10",
        "f11",
        "f12",
    ];

    /// Returns the bit index of a key, ignoring ASCII case.
    #[must_use]
    pub fn key_bit(name: &str) -> Option<u32> {
        Self::KEYS
            .iter()
            .position(|key| key.eq_ignore_ascii_case(name))
            .map(|index| index as u32)
    }
}

impl InputDevice for Keyboard {
    const LAYOUT: &'static str = "Keyboard";

    fn layout() -> Result<DeviceLayout, LayoutError> {
        let builder = DeviceLayout::builder(Self::LAYOUT, Self::FORMAT);
        Self::KEYS
            .iter()
            .enumerate()
            .fold(builder, |builder, (bit, &key)| {
                let bit = bit as u32;
                builder.button(key, StateBlock::bit(bit / 8, bit % 8))
            })
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys() {
        let layout = Keyboard::layout().unwrap();
        assert_eq!(layout.state_size(), 14);
        assert_eq!(layout.controls().len(), Keyboard::KEYS.len());

        let bit = Keyboard::key_bit("A").unwrap();
        let a = layout.find("a").unwrap();
        assert_eq!(layout.control(a).block(), StateBlock::bit(bit / 8, bit % 8));
        assert!(matches!(
            layout.control(a).kind(),
            ControlKind::Button { .. }
        ));
        assert!(Keyboard::key_bit("hyper").is_none());
    }
}
