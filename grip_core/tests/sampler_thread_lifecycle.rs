//! Sampler threads stop and join when the `Sampler` is dropped.

use grip_core::GripError;
use grip_core::sampler::Sampler;
use grip_hardware::SimulatedSensor;
use grip_traits::clock::MonotonicClock;
use grip_traits::{AnalogInput, HwResult};
use std::time::Duration;

#[test]
fn sampler_forwards_readings() {
    let sampler = Sampler::spawn(
        Box::new(SimulatedSensor::constant(0.25)),
        Duration::from_millis(5),
        MonotonicClock::new(),
    );
    let got = sampler.recv_timeout(Duration::from_millis(500));
    assert_eq!(got, Some(Ok(0.25)));
}

#[test]
fn sampler_thread_exits_on_drop() {
    let sampler = Sampler::spawn(
        Box::new(SimulatedSensor::constant(0.5)),
        Duration::from_millis(10),
        MonotonicClock::new(),
    );
    std::thread::sleep(Duration::from_millis(30));
    // Drop joins; hanging here would fail the test by timeout.
    drop(sampler);
}

#[test]
fn unread_samples_do_not_block_the_producer() {
    let sampler = Sampler::spawn(
        Box::new(SimulatedSensor::scripted(vec![0.1, 0.2, 0.3, 0.4])),
        Duration::from_millis(1),
        MonotonicClock::new(),
    );
    std::thread::sleep(Duration::from_millis(50));
    // Only the newest reading is buffered.
    assert_eq!(sampler.latest(), Some(Ok(0.4)));
    drop(sampler);
}

#[test]
fn multiple_samplers_dont_leak_threads() {
    for _ in 0..10 {
        let sampler = Sampler::spawn(
            Box::new(SimulatedSensor::constant(0.5)),
            Duration::from_millis(5),
            MonotonicClock::new(),
        );
        std::thread::sleep(Duration::from_millis(10));
        let _ = sampler.latest();
        drop(sampler);
    }
}

struct Broken;

impl AnalogInput for Broken {
    fn read(&mut self) -> HwResult<f32> {
        Err("i2c nack".into())
    }
}

#[test]
fn read_errors_are_forwarded_as_sensor_errors() {
    let sampler = Sampler::spawn(
        Box::new(Broken),
        Duration::from_millis(5),
        MonotonicClock::new(),
    );
    match sampler.recv_timeout(Duration::from_millis(500)) {
        Some(Err(GripError::Sensor(msg))) => assert!(msg.contains("i2c nack")),
        other => panic!("expected sensor error, got {other:?}"),
    }
}
