//! Odometry-integrating localizer for simulated runs

use std::sync::Mutex;
use std::time::Duration;

use crate::common::types::{normalize_angle, Pose2D};
use crate::control::Twist;
use crate::interfaces::{PoseProvider, VelocityPublisher};

#[derive(Debug)]
struct BaseState {
    pose: Pose2D,
    cmd: Twist,
    localized: bool,
    history: Vec<Twist>,
}

/// A simulated robot base.
///
/// Velocity commands are latched and integrated in the robot frame on every
/// `step`; the integrated pose is served as the localization estimate.
#[derive(Debug)]
pub struct SimulatedBase {
    state: Mutex<BaseState>,
}

impl SimulatedBase {
    pub fn new(pose: Pose2D) -> Self {
        SimulatedBase {
            state: Mutex::new(BaseState {
                pose,
                cmd: Twist::zero(),
                localized: true,
                history: Vec::new(),
            }),
        }
    }

    /// Integrate the latched command over `dt`
    pub fn step(&self, dt: Duration) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        let dt = dt.as_secs_f64();
        let (sin, cos) = state.pose.theta.sin_cos();
        let cmd = state.cmd;
        state.pose.x += (cmd.linear.x * cos - cmd.linear.y * sin) * dt;
        state.pose.y += (cmd.linear.x * sin + cmd.linear.y * cos) * dt;
        state.pose.theta = normalize_angle(state.pose.theta + cmd.angular * dt);
    }

    /// Get the true pose, regardless of localization
    pub fn get_pose(&self) -> Pose2D {
        self.state.lock().map(|s| s.pose).unwrap_or_default()
    }

    /// Simulate losing or regaining localization
    pub fn set_localized(&self, localized: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.localized = localized;
        }
    }

    /// Every command received, oldest first
    pub fn commands(&self) -> Vec<Twist> {
        self.state
            .lock()
            .map(|s| s.history.clone())
            .unwrap_or_default()
    }

    /// The command currently being executed
    pub fn current_command(&self) -> Twist {
        self.state.lock().map(|s| s.cmd).unwrap_or_default()
    }
}

impl PoseProvider for SimulatedBase {
    fn current_pose(&self, _global_frame: &str, _tolerance: Duration) -> Option<Pose2D> {
        let state = self.state.lock().ok()?;
        state.localized.then_some(state.pose)
    }
}

impl VelocityPublisher for SimulatedBase {
    fn publish(&self, cmd: &Twist) {
        if let Ok(mut state) = self.state.lock() {
            state.cmd = *cmd;
            state.history.push(*cmd);
        }
    }
}
