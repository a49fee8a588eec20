/*!
State events and their application to devices.

A [`StateEvent`] carries raw bytes for a region of a device's state. Events are queued
through [`InputDevices::queue_event`] or a [`StateEventSender`], which can be moved to
other threads, and applied in order during [`InputDevices::update`].

# Update pass

1. [`InputDevices::on_before_update`] listeners are invoked.
2. The current state of every device is copied into its previous state. This happens
   once per pass, so per-frame edge detection sees all events of the pass combined.
3. Every queued event is validated and written into the current state of its device.
   Events for unknown devices, events with a foreign format and events that don't fit
   into the state are dropped with a warning. Events for disabled devices are dropped
   silently. [`InputDevices::on_event`] listeners can mark an event as handled to skip it.
4. Change monitors of controls overlapping the written bits are invoked.
5. [`InputDevices::on_after_update`] listeners are invoked.
*/

pub mod monitor;
mod pipeline;

use alloc::{vec, vec::Vec};
use core::{mem, ops::Range};

use bevy::platform::sync::{Arc, Mutex, PoisonError};
use log::trace;

use crate::{prelude::*, state};

/// Raw state update for a single device.
#[derive(Debug, Clone, PartialEq)]
pub struct StateEvent {
    pub device: DeviceId,
    /// Timestamp in seconds, passed to change monitors.
    pub time: f64,
    /// Must match [`DeviceLayout::format`] of the target device.
    pub format: FourCc,
    /// Byte offset of the payload inside the device state.
    pub offset: u32,
    pub payload: Vec<u8>,
    /// Bits of the payload to apply, relative to its first byte.
    ///
    /// If `None`, the whole payload is applied.
    pub bits: Option<Range<u64>>,
}

impl StateEvent {
    /// Replaces the whole state of a device.
    #[must_use]
    pub fn state(device: DeviceId, format: FourCc, payload: impl Into<Vec<u8>>, time: f64) -> Self {
        Self::delta(device, format, 0, payload, time)
    }

    /// Replaces a region of a device state starting at `offset`.
    #[must_use]
    pub fn delta(
        device: DeviceId,
        format: FourCc,
        offset: u32,
        payload: impl Into<Vec<u8>>,
        time: f64,
    ) -> Self {
        Self {
            device,
            time,
            format,
            offset,
            payload: payload.into(),
            bits: None,
        }
    }

    /// Writes a value into a single control, leaving the rest of the state untouched.
    #[must_use]
    pub fn for_control(control: ControlView, value: impl Into<ControlValue>, time: f64) -> Self {
        let block = control.block();
        let local = StateBlock {
            byte_offset: 0,
            ..block
        };
        let mut payload = vec![0; block.byte_len() as usize];
        local.write(&mut payload, value.into());

        Self {
            device: control.device().id(),
            time,
            format: control.device().layout().format(),
            offset: block.byte_offset,
            payload,
            bits: Some(local.bit_range()),
        }
    }

    /// Like [`Self::for_control`], but writes the default (zero) value.
    #[must_use]
    pub fn reset_control(control: ControlView, time: f64) -> Self {
        Self::for_control(control, ControlValue::default(), time)
    }

    /// Absolute bit range of the device state modified by this event.
    #[must_use]
    pub fn written_bits(&self) -> Range<u64> {
        let base = self.offset as u64 * 8;
        match &self.bits {
            Some(bits) => base + bits.start..base + bits.end,
            None => base..base + self.payload.len() as u64 * 8,
        }
    }

    /// Returns `true` if the event fits into a state of the given size.
    pub(crate) fn fits(&self, state_size: usize) -> bool {
        let payload_bits = self.payload.len() as u64 * 8;
        let bits_valid = self
            .bits
            .as_ref()
            .is_none_or(|bits| bits.start <= bits.end && bits.end <= payload_bits);
        let end = self.offset as usize + self.payload.len();
        bits_valid && end <= state_size
    }

    /// Writes the event into the buffer, which must fit it.
    pub(crate) fn apply(&self, buffer: &mut [u8]) {
        match &self.bits {
            Some(bits) => {
                let payload = &self.payload;
                let source = bits.start;
                state::copy_bits(buffer, self.written_bits(), |index| {
                    let bit = source + index;
                    payload[(bit / 8) as usize] & (1 << (bit % 8)) != 0
                });
            }
            None => {
                let start = self.offset as usize;
                buffer[start..start + self.payload.len()].copy_from_slice(&self.payload);
            }
        }
    }
}

/// Thread-safe handle to the event queue of [`InputDevices`].
///
/// Producers on other threads, like sensor callbacks, can only enqueue events.
/// The queue is drained on the next [`InputDevices::update`].
#[derive(Default, Debug, Clone)]
pub struct StateEventSender(Arc<Mutex<Vec<StateEvent>>>);

impl StateEventSender {
    pub fn send(&self, event: StateEvent) {
        trace!("queueing event for device {}", event.device);
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    /// Number of events waiting for the next update.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn drain(&self) -> Vec<StateEvent> {
        mem::take(&mut *self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub(crate) fn clear(&self) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}
