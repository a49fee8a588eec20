use log::{debug, trace, warn};

use crate::prelude::*;

impl InputDevices {
    /// Runs a single update pass.
    ///
    /// See the [module-level documentation](crate::event) for the steps.
    pub fn update(&mut self) {
        self.on_before_update.invoke();

        for device in &mut self.devices {
            device.buffers.snapshot();
        }

        let events = self.sender.drain();
        if !events.is_empty() {
            trace!("applying {} events", events.len());
        }
        for event in &events {
            self.apply_event(event);
        }

        self.on_after_update.invoke();
    }

    fn apply_event(&mut self, event: &StateEvent) {
        let Some(index) = self.index_of(event.device) else {
            warn!("ignoring event for unknown device {}", event.device);
            return;
        };

        let device = &self.devices[index];
        if !device.is_enabled() {
            debug!("ignoring event for disabled device {device}");
            return;
        }
        let format = device.layout().format();
        if event.format != format {
            warn!(
                "ignoring event with format `{}` for device {device} that expects `{format}`",
                event.format
            );
            return;
        }
        if !event.fits(device.buffers.len()) {
            warn!(
                "ignoring event at offset {} with {} bytes for device {device} with {} bytes of state",
                event.offset,
                event.payload.len(),
                device.buffers.len()
            );
            return;
        }
        if self.on_event.invoke_any(event, device) {
            trace!("event for device {device} was handled by a listener");
            return;
        }

        let device = &mut self.devices[index];
        event.apply(device.buffers.current_mut());

        let written = event.written_bits();
        self.monitors.fire(&self.devices[index], event, &written);
    }
}
