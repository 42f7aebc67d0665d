//! Simulator seam
//!
//! The physics, rendering and task logic belong to a simulator behind the
//! [`Simulator`] and [`SimulatorSession`] traits. This crate ships one
//! in-process implementation, the [`tabletop`] simulator.

pub mod tabletop;

#[cfg(test)]
pub mod test_utils;

pub use self::tabletop::TabletopSimulator;

use crate::{
    config::{CameraCapabilities, ObservationConfig},
    error::Result,
    types::{Observation, StepOutcome},
};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Handle to a task class exported by a simulator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskClass {
    /// Canonical class name, e.g. `PickAndLift`
    pub name: &'static str,
    /// Number of variations the task defines
    pub variation_count: u32,
}

/// Arm half of the action mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArmActionMode {
    /// Action values are joint velocities (rad/s)
    JointVelocity,
    /// Action values are absolute joint targets (rad)
    JointPosition,
}

/// Gripper half of the action mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum GripperActionMode {
    /// Single value: above 0.5 opens, otherwise closes
    Discrete,
}

/// Move the arm, then actuate the gripper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionMode {
    pub arm: ArmActionMode,
    pub gripper: GripperActionMode,
}

impl ActionMode {
    /// Action vector length for an arm with `arm_dof` joints
    #[must_use]
    pub fn action_size(&self, arm_dof: usize) -> usize {
        match self.gripper {
            GripperActionMode::Discrete => arm_dof + 1,
        }
    }
}

impl Default for ActionMode {
    fn default() -> Self {
        Self {
            arm: ArmActionMode::JointVelocity,
            gripper: GripperActionMode::Discrete,
        }
    }
}

/// Settings used to launch a simulator session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSettings {
    pub headless: bool,
    pub action_mode: ActionMode,
    pub obs_config: ObservationConfig,
}

/// A simulator able to launch sessions
pub trait Simulator {
    /// Human readable simulator name
    fn name(&self) -> &str;

    /// Every task class the simulator exports
    fn exported_tasks(&self) -> Vec<TaskClass>;

    /// Camera configuration schema this simulator understands
    fn camera_capabilities(&self) -> CameraCapabilities;

    /// Start a session
    ///
    /// # Errors
    /// - Engine start-up failures
    /// - Observation configurations the engine cannot honour
    fn launch(&self, settings: LaunchSettings) -> Result<Box<dyn SimulatorSession>>;
}

/// A running simulator, exclusively owned by its caller
pub trait SimulatorSession {
    /// Length of the action vector accepted by [`SimulatorSession::step`]
    fn action_shape(&self) -> usize;

    /// Load a task into the scene
    ///
    /// # Errors
    /// - Task not exported by this simulator
    fn load_task(&mut self, task: &TaskClass) -> Result<()>;

    /// Select a variation for the next reset
    ///
    /// # Errors
    /// - No task loaded
    /// - Index outside `0..variation_count`
    fn sample_variation(&mut self, index: u32) -> Result<()>;

    /// Reset the loaded task, returning its descriptions and the first observation
    ///
    /// # Errors
    /// - No task loaded
    fn reset(&mut self) -> Result<(Vec<String>, Observation)>;

    /// Apply one action
    ///
    /// # Errors
    /// - Called before `reset`
    /// - Action length differs from `action_shape`
    fn step(&mut self, action: &[f64]) -> Result<StepOutcome>;

    /// Release every simulator resource
    ///
    /// # Errors
    /// - Engine teardown failures
    fn shutdown(&mut self) -> Result<()>;
}

/// Owns a session and shuts it down when dropped
///
/// The success path calls [`SessionGuard::shutdown`] to observe teardown
/// errors; any other exit still releases the simulator.
pub struct SessionGuard {
    session: Box<dyn SimulatorSession>,
    active: bool,
}

impl SessionGuard {
    #[must_use]
    pub fn new(session: Box<dyn SimulatorSession>) -> Self {
        Self {
            session,
            active: true,
        }
    }

    pub fn session(&mut self) -> &mut dyn SimulatorSession {
        self.session.as_mut()
    }

    /// Shut the session down and report teardown errors
    pub fn shutdown(mut self) -> Result<()> {
        self.active = false;
        self.session.shutdown()
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if self.active {
            self.active = false;
            if let Err(e) = self.session.shutdown() {
                warn!(error = %e, "Simulator shutdown failed");
            }
        }
    }
}
