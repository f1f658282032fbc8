//! # Motion Sensor Collaborator Interface
//!
//! Contract for the accelerometer driver a node reads from. The driver owns
//! register access and the hardware motion interrupt; this crate only polls
//! the exposed state. Edge detection is the node's job: it compares
//! `time_of_last_motion` against the value it saw last cycle, so the only
//! requirement on the driver is that the timestamp is updated monotonically
//! when a motion/knock event fires.

use crate::packet::MotionFlags;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Contract for an accelerometer with hardware motion detection.
#[async_trait]
pub trait MotionSensor: Send {
    /// Power-on self test; `false` is fatal for the node.
    async fn self_test(&mut self) -> bool;

    /// Current raw acceleration reading (x, y, z).
    async fn acceleration(&mut self) -> (i16, i16, i16);

    /// Node-local milliseconds of the most recent motion/knock event.
    async fn time_of_last_motion(&mut self) -> u32;

    /// Axis/direction bitfield latched by the most recent event.
    async fn motion_status(&mut self) -> MotionFlags;

    /// Programs the motion detection threshold.
    async fn set_motion_threshold(&mut self, threshold: u8);

    /// Programs the motion minimum duration in milliseconds.
    async fn set_motion_duration(&mut self, duration: u8);
}

#[derive(Debug, Default)]
struct MockSensorState {
    self_test_ok: bool,
    acceleration: (i16, i16, i16),
    time_of_last_motion: u32,
    motion_status: MotionFlags,
    threshold: Option<u8>,
    duration: Option<u8>,
}

/// Scriptable in-memory sensor for tests and demos.
///
/// Clones share state, so a test can move one handle into a node and script
/// motion events through the other.
#[derive(Debug, Clone)]
pub struct MockMotionSensor {
    state: Arc<Mutex<MockSensorState>>,
}

impl Default for MockMotionSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMotionSensor {
    pub fn new() -> Self {
        MockMotionSensor {
            state: Arc::new(Mutex::new(MockSensorState {
                self_test_ok: true,
                ..MockSensorState::default()
            })),
        }
    }

    /// Scripts the self-test outcome.
    pub fn set_self_test_ok(&self, ok: bool) {
        self.state.lock().unwrap().self_test_ok = ok;
    }

    /// Sets the current acceleration reading.
    pub fn set_acceleration(&self, x: i16, y: i16, z: i16) {
        self.state.lock().unwrap().acceleration = (x, y, z);
    }

    /// Simulates a motion event at the given node-local time.
    pub fn trigger_motion(&self, at_ms: u32, status: MotionFlags) {
        let mut state = self.state.lock().unwrap();
        state.time_of_last_motion = at_ms;
        state.motion_status = status;
    }

    /// Threshold last programmed through the trait, if any.
    pub fn threshold(&self) -> Option<u8> {
        self.state.lock().unwrap().threshold
    }

    /// Duration last programmed through the trait, if any.
    pub fn duration(&self) -> Option<u8> {
        self.state.lock().unwrap().duration
    }
}

#[async_trait]
impl MotionSensor for MockMotionSensor {
    async fn self_test(&mut self) -> bool {
        self.state.lock().unwrap().self_test_ok
    }

    async fn acceleration(&mut self) -> (i16, i16, i16) {
        self.state.lock().unwrap().acceleration
    }

    async fn time_of_last_motion(&mut self) -> u32 {
        self.state.lock().unwrap().time_of_last_motion
    }

    async fn motion_status(&mut self) -> MotionFlags {
        self.state.lock().unwrap().motion_status
    }

    async fn set_motion_threshold(&mut self, threshold: u8) {
        self.state.lock().unwrap().threshold = Some(threshold);
    }

    async fn set_motion_duration(&mut self, duration: u8) {
        self.state.lock().unwrap().duration = Some(duration);
    }
}
