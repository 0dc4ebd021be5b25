//! Shared device state
//!
//! The most recently observed sensor readings. The telemetry task is the
//! only writer for each field; the block server reads concurrently. Fields
//! are plain atomics with relaxed ordering: readers may observe a reading
//! mid-update across axes, which the block semantics tolerate.

use std::sync::atomic::{AtomicBool, AtomicI16, AtomicI8, AtomicU16, AtomicU8, Ordering};

/// Last-seen sensor values for one device connection.
///
/// Everything starts at zero until the first notification arrives; values
/// are never rolled back, not even on disconnect.
#[derive(Debug, Default)]
pub struct DeviceState {
    acc_x: AtomicI16,
    acc_y: AtomicI16,
    acc_z: AtomicI16,
    mag_x: AtomicI16,
    mag_y: AtomicI16,
    mag_z: AtomicI16,
    mag_bearing: AtomicU16,
    button_a: AtomicU8,
    button_b: AtomicU8,
    temperature: AtomicI8,
    connected: AtomicBool,
}

impl DeviceState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_accelerometer(&self, x: i16, y: i16, z: i16) {
        self.acc_x.store(x, Ordering::Relaxed);
        self.acc_y.store(y, Ordering::Relaxed);
        self.acc_z.store(z, Ordering::Relaxed);
    }

    pub fn accelerometer(&self) -> (i16, i16, i16) {
        (
            self.acc_x.load(Ordering::Relaxed),
            self.acc_y.load(Ordering::Relaxed),
            self.acc_z.load(Ordering::Relaxed),
        )
    }

    pub fn set_magnetometer(&self, x: i16, y: i16, z: i16) {
        self.mag_x.store(x, Ordering::Relaxed);
        self.mag_y.store(y, Ordering::Relaxed);
        self.mag_z.store(z, Ordering::Relaxed);
    }

    pub fn magnetometer(&self) -> (i16, i16, i16) {
        (
            self.mag_x.load(Ordering::Relaxed),
            self.mag_y.load(Ordering::Relaxed),
            self.mag_z.load(Ordering::Relaxed),
        )
    }

    pub fn set_bearing(&self, degrees: u16) {
        self.mag_bearing.store(degrees, Ordering::Relaxed);
    }

    pub fn bearing(&self) -> u16 {
        self.mag_bearing.load(Ordering::Relaxed)
    }

    /// 0 = released, 1 = pressed, 2 = long press
    pub fn set_button_a(&self, value: u8) {
        self.button_a.store(value, Ordering::Relaxed);
    }

    pub fn button_a(&self) -> u8 {
        self.button_a.load(Ordering::Relaxed)
    }

    pub fn set_button_b(&self, value: u8) {
        self.button_b.store(value, Ordering::Relaxed);
    }

    pub fn button_b(&self) -> u8 {
        self.button_b.load(Ordering::Relaxed)
    }

    pub fn set_temperature(&self, celsius: i8) {
        self.temperature.store(celsius, Ordering::Relaxed);
    }

    pub fn temperature(&self) -> i8 {
        self.temperature.load(Ordering::Relaxed)
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Relaxed);
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }
}
