use std::thread;

use bevy::{
    platform::sync::{Arc, Mutex},
    prelude::*,
};
use bevy_input_state::prelude::*;
use test_log::test;

#[test]
fn sensor_thread() {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, InputStatePlugin)).finish();

    let sensor = Arc::new(TestSensor::default());
    let id = app
        .world_mut()
        .resource_mut::<InputDevices>()
        .add_with::<StepCounter>(StepCounter::commands_for(sensor.clone()))
        .unwrap();
    assert!(sensor.is_enabled(), "adding the device should enable the sensor");

    let sink = sensor.sink.lock().unwrap().clone().unwrap();
    assert_eq!(sink.device(), id);
    thread::spawn(move || {
        for steps in 1..=3 {
            sink.send(steps, steps as f64);
        }
    })
    .join()
    .unwrap();

    app.update();

    let devices = app.world().resource::<InputDevices>();
    let steps = devices.get(id).unwrap().control("stepCounter").unwrap();
    assert_eq!(steps.value(), ControlValue::Integer(3));
    assert_eq!(steps.previous_value(), ControlValue::Integer(0));
}

#[test]
fn disable_sensor() {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, InputStatePlugin)).finish();

    let sensor = Arc::new(TestSensor::default());
    let mut devices = app.world_mut().resource_mut::<InputDevices>();
    let id = devices
        .add_with::<StepCounter>(StepCounter::commands_for(sensor.clone()))
        .unwrap();
    let sink = sensor.sink.lock().unwrap().clone().unwrap();

    let mut query = DeviceCommand::QueryEnabledState { is_enabled: false };
    assert_eq!(
        devices.execute_command(id, &mut query).unwrap(),
        CommandResult::Success
    );
    assert_eq!(query, DeviceCommand::QueryEnabledState { is_enabled: true });

    devices.disable(id).unwrap();
    assert!(!sensor.is_enabled());
    assert_eq!(
        devices.get(id).unwrap().lifecycle(),
        DeviceLifecycle::Disabled
    );

    sink.send(10, 0.0);
    app.update();

    let devices = app.world().resource::<InputDevices>();
    let steps = devices.get(id).unwrap().control("stepCounter").unwrap();
    assert_eq!(
        steps.value(),
        ControlValue::Integer(0),
        "events for disabled devices should be dropped"
    );
}

#[test]
fn unavailable_sensor() {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, InputStatePlugin)).finish();

    let sensor = Arc::new(TestSensor {
        unavailable: true,
        ..Default::default()
    });
    let mut devices = app.world_mut().resource_mut::<InputDevices>();
    let id = devices
        .add_with::<StepCounter>(StepCounter::commands_for(sensor))
        .unwrap();

    let device = devices.get(id).unwrap();
    assert!(!device.is_enabled());

    let mut background = DeviceCommand::QueryCanRunInBackground {
        can_run_in_background: true,
    };
    assert_eq!(
        devices.execute_command(id, &mut background).unwrap(),
        CommandResult::Success
    );
    assert_eq!(
        background,
        DeviceCommand::QueryCanRunInBackground {
            can_run_in_background: false
        }
    );

    let mut reset = DeviceCommand::RequestReset;
    assert_eq!(
        devices.execute_command(id, &mut reset).unwrap(),
        CommandResult::Failure
    );
}

#[derive(Default)]
struct TestSensor {
    sink: Mutex<Option<StepSink>>,
    unavailable: bool,
}

impl StepCounterSensor for TestSensor {
    fn enable(&self, sink: StepSink) -> bool {
        if self.unavailable {
            return false;
        }
        *self.sink.lock().unwrap() = Some(sink);
        true
    }

    fn disable(&self) -> bool {
        self.sink.lock().unwrap().take().is_some()
    }

    fn is_enabled(&self) -> bool {
        self.sink.lock().unwrap().is_some()
    }
}
