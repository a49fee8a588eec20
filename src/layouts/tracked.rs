use crate::prelude::*;

/// Device with tracked position and orientation in space, like an XR controller.
///
/// All controls are [`ControlFlags::NOISY`] since tracking data changes without
/// user interaction.
pub struct TrackedDevice;

impl TrackedDevice {
    pub const FORMAT: FourCc = FourCc::new(b'T', b'R', b'K', b'D');
}

impl InputDevice for TrackedDevice {
    const LAYOUT: &'static str = "TrackedDevice";

    fn layout() -> Result<DeviceLayout, LayoutError> {
        DeviceLayout::builder(Self::LAYOUT, Self::FORMAT)
            .integer("trackingState", StateBlock::int(0))
            .flags(ControlFlags::NOISY)
            .button("isTracked", StateBlock::bit(4, 0))
            .flags(ControlFlags::NOISY)
            .vector3("devicePosition", 8)
            .flags(ControlFlags::NOISY)
            .quaternion("deviceRotation", 20)
            .flags(ControlFlags::NOISY)
            .build()
    }
}
