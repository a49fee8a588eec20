use alloc::{boxed::Box, vec::Vec};
use core::{
    fmt::{self, Debug, Formatter},
    ops::Range,
};

use bevy::prelude::*;
use log::{error, trace};

use crate::prelude::*;

/// Identifies a change monitor for [`InputDevices::remove_change_monitor`].
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct MonitorToken(u64);

/// Arguments passed to a change monitor.
pub struct ChangeMonitorContext<'a> {
    /// Monitored control, already updated with the event.
    pub control: ControlView<'a>,
    /// Timestamp of the event.
    pub time: f64,
    pub event: &'a StateEvent,
    /// Index passed to [`InputDevices::add_change_monitor_indexed`], `-1` by default.
    pub monitor_index: i64,
}

/// Callback invoked when an event writes into the monitored control.
///
/// The pipeline doesn't compare values, use [`ControlView::has_changed`] or track the
/// previous value inside the callback if needed.
pub type MonitorCallback = dyn FnMut(&ChangeMonitorContext) -> Result<()> + Send + Sync;

struct ChangeMonitor {
    token: MonitorToken,
    control: ControlId,
    monitor_index: i64,
    callback: Box<MonitorCallback>,
}

/// Monitors of all devices in registration order.
#[derive(Default)]
pub(crate) struct ChangeMonitors {
    next_token: u64,
    monitors: Vec<ChangeMonitor>,
}

impl ChangeMonitors {
    pub(crate) fn add(
        &mut self,
        control: ControlId,
        monitor_index: i64,
        callback: Box<MonitorCallback>,
    ) -> MonitorToken {
        let token = MonitorToken(self.next_token);
        self.next_token += 1;
        trace!("adding monitor {token:?} for {control:?}");
        self.monitors.push(ChangeMonitor {
            token,
            control,
            monitor_index,
            callback,
        });
        token
    }

    pub(crate) fn remove(&mut self, token: MonitorToken) -> bool {
        let Some(index) = self
            .monitors
            .iter()
            .position(|monitor| monitor.token == token)
        else {
            return false;
        };
        self.monitors.remove(index);
        true
    }

    pub(crate) fn remove_device(&mut self, device: DeviceId) {
        self.monitors
            .retain(|monitor| monitor.control.device != device);
    }

    pub(crate) fn clear(&mut self) {
        self.monitors.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.monitors.len()
    }

    /// Invokes monitors of the device whose controls overlap the written bits.
    pub(crate) fn fire(&mut self, device: &Device, event: &StateEvent, written: &Range<u64>) {
        for monitor in &mut self.monitors {
            if monitor.control.device != device.id() {
                continue;
            }
            let Some(control) = device.control_at(monitor.control.control) else {
                continue;
            };
            if !control.block().overlaps(written) {
                continue;
            }

            let context = ChangeMonitorContext {
                control,
                time: event.time,
                event,
                monitor_index: monitor.monitor_index,
            };
            if let Err(e) = (monitor.callback)(&context) {
                error!("{e} while executing change monitor of '{control}'");
            }
        }
    }
}

impl Debug for ChangeMonitors {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_list()
            .entries(self.monitors.iter().map(|monitor| monitor.control))
            .finish()
    }
}
