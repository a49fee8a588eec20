use bevy::platform::sync::Arc;
use log::debug;

use crate::prelude::*;

/// Pedometer that reports the number of steps taken.
///
/// Without a sensor the device only accepts events queued manually.
/// Use [`StepCounter::commands_for`] with [`InputDevices::add_with`] to connect a
/// platform sensor:
///
/// ```
/// use bevy::platform::sync::{Arc, Mutex};
/// use bevy_input_state::prelude::*;
///
/// #[derive(Default)]
/// struct FakeSensor(Mutex<Option<StepSink>>);
///
/// impl StepCounterSensor for FakeSensor {
///     fn enable(&self, sink: StepSink) -> bool {
///         *self.0.lock().unwrap() = Some(sink);
///         true
///     }
///
///     fn disable(&self) -> bool {
///         self.0.lock().unwrap().take().is_some()
///     }
///
///     fn is_enabled(&self) -> bool {
///         self.0.lock().unwrap().is_some()
///     }
/// }
///
/// let sensor = Arc::new(FakeSensor::default());
/// let mut devices = InputDevices::default();
/// let id = devices
///     .add_with::<StepCounter>(StepCounter::commands_for(sensor.clone()))
///     .unwrap();
///
/// sensor.0.lock().unwrap().as_ref().unwrap().send(12, 0.0);
/// devices.update();
///
/// let steps = devices.get(id).unwrap().control("stepCounter").unwrap();
/// assert_eq!(steps.value(), ControlValue::Integer(12));
/// ```
pub struct StepCounter;

impl StepCounter {
    pub const FORMAT: FourCc = FourCc::new(b'I', b'S', b'C', b'S');

    /// Creates command handlers that drive the sensor.
    ///
    /// Enabling the device passes a [`StepSink`] to the sensor, disabling stops it.
    /// The sensor can't run in background and doesn't support resets.
    #[must_use]
    pub fn commands_for(sensor: Arc<dyn StepCounterSensor>) -> CommandTable {
        let enable_sensor = sensor.clone();
        let disable_sensor = sensor.clone();
        Self::commands()
            .with(DeviceCommand::QUERY_ENABLED_STATE, move |_, command| {
                if let DeviceCommand::QueryEnabledState { is_enabled } = command {
                    *is_enabled = sensor.is_enabled();
                }
                CommandResult::Success
            })
            .with(DeviceCommand::ENABLE_DEVICE, move |context, _| {
                let sink = StepSink {
                    device: context.device,
                    sender: context.sender.clone(),
                };
                debug!("enabling step counter sensor for device {}", context.device);
                result(enable_sensor.enable(sink))
            })
            .with(DeviceCommand::DISABLE_DEVICE, move |context, _| {
                debug!("disabling step counter sensor for device {}", context.device);
                result(disable_sensor.disable())
            })
    }
}

impl InputDevice for StepCounter {
    const LAYOUT: &'static str = "StepCounter";

    fn layout() -> Result<DeviceLayout, LayoutError> {
        DeviceLayout::builder(Self::LAYOUT, Self::FORMAT)
            .integer("stepCounter", StateBlock::int(0))
            .build()
    }

    fn commands() -> CommandTable {
        CommandTable::default()
            .with(DeviceCommand::QUERY_CAN_RUN_IN_BACKGROUND, |_, command| {
                if let DeviceCommand::QueryCanRunInBackground {
                    can_run_in_background,
                } = command
                {
                    *can_run_in_background = false;
                }
                CommandResult::Success
            })
            .with(DeviceCommand::REQUEST_RESET, |_, _| CommandResult::Failure)
    }
}

/// Platform step counter driven by [`StepCounter::commands_for`].
///
/// Methods may be called from the update thread only, but the sink
/// can be used from any thread.
pub trait StepCounterSensor: Send + Sync + 'static {
    /// Starts delivering data into the sink.
    ///
    /// Returns `false` if the sensor is unavailable.
    fn enable(&self, sink: StepSink) -> bool;

    /// Stops delivering data.
    fn disable(&self) -> bool;

    fn is_enabled(&self) -> bool;
}

/// Queues step counts for a [`StepCounter`] device.
#[derive(Debug, Clone)]
pub struct StepSink {
    device: DeviceId,
    sender: StateEventSender,
}

impl StepSink {
    #[must_use]
    pub fn device(&self) -> DeviceId {
        self.device
    }

    /// Queues the total number of steps, applied on the next update.
    pub fn send(&self, steps: i32, time: f64) {
        self.sender.send(StateEvent::state(
            self.device,
            StepCounter::FORMAT,
            steps.to_le_bytes(),
            time,
        ));
    }
}

fn result(success: bool) -> CommandResult {
    if success {
        CommandResult::Success
    } else {
        CommandResult::Failure
    }
}
