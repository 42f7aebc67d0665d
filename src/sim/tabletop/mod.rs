//! In-process tabletop simulator
//!
//! A deterministic kinematic stand-in for a full physics engine: a 7-joint
//! arm with a two-finger gripper over a table holding task objects. Grasping
//! is geometric (close the gripper near the target and it follows the
//! hand). Frames come from the procedural renderer in [`render`].

mod render;
mod scene;

use self::scene::{find_task, scene_seed, Scene, SuccessCondition, TaskEntry, TASKS};
use super::{ArmActionMode, LaunchSettings, Simulator, SimulatorSession, TaskClass};
use crate::{
    config::{CameraCapabilities, ObservationConfig},
    error::{Result, SnapError},
    types::{Observation, StepOutcome, Viewpoint},
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

/// Arm joints, excluding the gripper
pub const ARM_DOF: usize = 7;

/// Control period in seconds
const DT: f64 = 0.05;
const JOINT_LIMIT: f64 = 2.9;
const HOME_JOINTS: [f64; ARM_DOF] = [0.0, 0.5, 0.0, 1.2, 0.0, 1.2, 0.0];
const SHOULDER_HEIGHT: f64 = 0.333;
const LINK_LENGTHS: [f64; 3] = [0.316, 0.384, 0.2];
const GRASP_RADIUS: f64 = 0.06;
const REACH_RADIUS: f64 = 0.05;
const LIFT_HEIGHT: f64 = 0.1;
/// Camera resolution when the schema carries no image size
const DEFAULT_IMAGE_SIZE: (u32, u32) = (128, 128);
/// Largest frame the renderer allocates, in pixels (8192 x 8192)
pub const MAX_FRAME_PIXELS: u64 = 8192 * 8192;

/// Base, shoulder, elbow, wrist and gripper positions for a joint vector
///
/// Joint 0 yaws the whole arm; joints 1, 3 and 5 pitch the three links. The
/// remaining joints roll about the link axes and leave positions unchanged.
pub(crate) fn arm_points(joints: &[f64; ARM_DOF]) -> [[f64; 3]; 5] {
    let [yaw, shoulder, _, elbow, _, wrist, _] = *joints;
    let pitches = [shoulder, shoulder + elbow, shoulder + elbow + wrist];
    let mut points = [[0.0, 0.0, 0.0], [0.0, 0.0, SHOULDER_HEIGHT], [0.0; 3], [0.0; 3], [0.0; 3]];
    let (mut reach, mut height) = (0.0, SHOULDER_HEIGHT);
    for (point, (length, pitch)) in points.iter_mut().skip(2).zip(LINK_LENGTHS.iter().zip(pitches)) {
        reach += length * pitch.sin();
        height += length * pitch.cos();
        *point = [reach * yaw.cos(), reach * yaw.sin(), height];
    }
    points
}

fn distance(a: [f64; 3], b: [f64; 3]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Tabletop simulator exporting grasp, reach and button tasks
#[derive(Debug, Clone, Default)]
pub struct TabletopSimulator {
    seed: Option<u64>,
}

impl TabletopSimulator {
    /// Simulator whose random variations come from OS entropy
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulator whose random variation choices are reproducible
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }
}

impl Simulator for TabletopSimulator {
    fn name(&self) -> &str {
        "tabletop"
    }

    fn exported_tasks(&self) -> Vec<TaskClass> {
        TASKS.iter().map(|entry| entry.class).collect()
    }

    fn camera_capabilities(&self) -> CameraCapabilities {
        CameraCapabilities::with_segmentation()
    }

    fn launch(&self, settings: LaunchSettings) -> Result<Box<dyn SimulatorSession>> {
        for viewpoint in settings.obs_config.enabled_viewpoints() {
            if let Some((width, height)) = settings.obs_config.camera(viewpoint).image_size {
                if width == 0 || height == 0 {
                    return Err(SnapError::invalid_config(format!(
                        "{viewpoint} camera resolution {width}x{height} is empty"
                    )));
                }
                let pixels = u64::from(width).checked_mul(u64::from(height));
                if pixels.map_or(true, |pixels| pixels > MAX_FRAME_PIXELS) {
                    return Err(SnapError::invalid_config(format!(
                        "{viewpoint} camera resolution {width}x{height} exceeds \
                         {MAX_FRAME_PIXELS} pixels"
                    )));
                }
            }
        }
        let rng = self.seed.map_or_else(ChaCha8Rng::from_entropy, ChaCha8Rng::seed_from_u64);
        info!(
            headless = settings.headless,
            arm_mode = ?settings.action_mode.arm,
            "Tabletop simulator launched"
        );
        Ok(Box::new(TabletopSession {
            settings,
            rng,
            task: None,
            selected_variation: None,
            scene: None,
            joints: HOME_JOINTS,
            gripper_open: true,
            grasped: false,
            running: true,
        }))
    }
}

struct TabletopSession {
    settings: LaunchSettings,
    rng: ChaCha8Rng,
    task: Option<&'static TaskEntry>,
    selected_variation: Option<u32>,
    scene: Option<Scene>,
    joints: [f64; ARM_DOF],
    gripper_open: bool,
    grasped: bool,
    running: bool,
}

impl TabletopSession {
    fn ensure_running(&self) -> Result<()> {
        if self.running {
            Ok(())
        } else {
            Err(SnapError::simulator("session has been shut down"))
        }
    }

    fn loaded_task(&self) -> Result<&'static TaskEntry> {
        self.task
            .ok_or_else(|| SnapError::simulator("no task loaded; call load_task first"))
    }

    fn observe(&self, scene: &Scene) -> Observation {
        let config: &ObservationConfig = &self.settings.obs_config;
        let arm = arm_points(&self.joints);
        let mut observation = Observation {
            joint_positions: config.joint_positions.then(|| self.joints.to_vec()),
            gripper_open: config
                .gripper_open
                .then_some(if self.gripper_open { 1.0 } else { 0.0 }),
            ..Observation::default()
        };
        for viewpoint in Viewpoint::ALL {
            let camera = config.camera(viewpoint);
            if !camera.rgb_enabled() {
                continue;
            }
            let size = camera.image_size.unwrap_or(DEFAULT_IMAGE_SIZE);
            let frame = render::render(viewpoint, size, scene, &arm, self.gripper_open);
            observation.set_rgb(viewpoint, Some(frame));
        }
        observation
    }

    fn move_arm(&mut self, targets: &[f64]) {
        for (joint, value) in self.joints.iter_mut().zip(targets) {
            let next = match self.settings.action_mode.arm {
                ArmActionMode::JointVelocity => *joint + value * DT,
                ArmActionMode::JointPosition => *value,
            };
            *joint = next.clamp(-JOINT_LIMIT, JOINT_LIMIT);
        }
    }
}

impl SimulatorSession for TabletopSession {
    fn action_shape(&self) -> usize {
        self.settings.action_mode.action_size(ARM_DOF)
    }

    fn load_task(&mut self, task: &TaskClass) -> Result<()> {
        self.ensure_running()?;
        let entry = find_task(task.name).ok_or_else(|| SnapError::UnknownTask(task.name.to_string()))?;
        debug!(task = entry.class.name, "Task loaded");
        self.task = Some(entry);
        self.selected_variation = None;
        self.scene = None;
        Ok(())
    }

    fn sample_variation(&mut self, index: u32) -> Result<()> {
        self.ensure_running()?;
        let entry = self.loaded_task()?;
        if index >= entry.class.variation_count {
            return Err(SnapError::simulator(format!(
                "variation {} out of range for {} ({} variations)",
                index, entry.class.name, entry.class.variation_count
            )));
        }
        self.selected_variation = Some(index);
        Ok(())
    }

    fn reset(&mut self) -> Result<(Vec<String>, Observation)> {
        self.ensure_running()?;
        let entry = self.loaded_task()?;
        let variation = match self.selected_variation {
            Some(index) => index,
            None => self.rng.gen_range(0..entry.class.variation_count),
        };
        let mut scene_rng = ChaCha8Rng::seed_from_u64(scene_seed(entry.class.name, variation));
        let scene = (entry.build)(variation, &mut scene_rng);

        self.joints = HOME_JOINTS;
        self.gripper_open = true;
        self.grasped = false;
        debug!(task = entry.class.name, variation, "Task reset");

        let observation = self.observe(&scene);
        let descriptions = scene.descriptions.clone();
        self.scene = Some(scene);
        Ok((descriptions, observation))
    }

    fn step(&mut self, action: &[f64]) -> Result<StepOutcome> {
        self.ensure_running()?;
        let expected = self.action_shape();
        if action.len() != expected {
            return Err(SnapError::invalid_action(format!(
                "expected {} values, got {}",
                expected,
                action.len()
            )));
        }
        if action.iter().any(|value| !value.is_finite()) {
            return Err(SnapError::invalid_action("action contains non-finite values"));
        }
        if self.scene.is_none() {
            return Err(SnapError::simulator("step called before reset"));
        }

        let (arm, gripper) = action.split_at(ARM_DOF);
        self.move_arm(arm);
        let hand = arm_points(&self.joints)[4];
        let open = gripper.first().copied().unwrap_or(1.0) > 0.5;

        let mut scene = self
            .scene
            .take()
            .ok_or_else(|| SnapError::simulator("step called before reset"))?;
        if let Some(target) = scene.target_mut() {
            match (self.gripper_open, open) {
                (true, false) => {
                    self.grasped = target.shape.graspable()
                        && distance(hand, target.position) <= GRASP_RADIUS;
                },
                (false, true) if self.grasped => {
                    // Released objects drop back onto the table
                    target.position[2] = target.half_extent;
                    self.grasped = false;
                },
                _ => {},
            }
            if self.grasped {
                target.position = [hand[0], hand[1], (hand[2] - target.half_extent).max(target.half_extent)];
            }
        }
        self.gripper_open = open;

        let success = match (scene.success, scene.target()) {
            (SuccessCondition::Lifted, Some(target)) => {
                self.grasped && target.position[2] - target.half_extent >= LIFT_HEIGHT
            },
            (SuccessCondition::Reached, Some(target)) => {
                distance(hand, target.position) <= REACH_RADIUS
            },
            (_, None) => false,
        };
        let reward = if success { 1.0 } else { 0.0 };

        let observation = self.observe(&scene);
        self.scene = Some(scene);
        Ok(StepOutcome {
            observation,
            reward,
            done: success,
        })
    }

    fn shutdown(&mut self) -> Result<()> {
        if self.running {
            self.running = false;
            self.scene = None;
            self.task = None;
            info!("Tabletop simulator shut down");
        }
        Ok(())
    }
}
