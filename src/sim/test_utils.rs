//! Test utilities and a recording mock simulator
//!
//! The mock renders flat frames, records every call it receives and can be
//! told to drop viewpoints, emit malformed buffers or fail on launch/step.

use super::{LaunchSettings, Simulator, SimulatorSession, TaskClass};
use crate::{
    config::{CameraCapabilities, ObservationConfig},
    error::{Result, SnapError},
    types::{Observation, RgbFrame, StepOutcome, Viewpoint},
};
use std::sync::{Arc, Mutex};

const MOCK_ACTION_SHAPE: usize = 8;

/// Mock simulator for runner and CLI tests
#[derive(Debug, Clone)]
pub struct MockSimulator {
    tasks: Vec<TaskClass>,
    capabilities: CameraCapabilities,
    missing_viewpoints: Vec<Viewpoint>,
    malformed_viewpoints: Vec<Viewpoint>,
    fail_launch: bool,
    fail_step_at: Option<u32>,
    call_history: Arc<Mutex<Vec<String>>>,
    actions: Arc<Mutex<Vec<Vec<f64>>>>,
}

impl MockSimulator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tasks: vec![
                Self::pick_and_lift(),
                Self::pick_up_cup(),
                Self::lift_numbered_block(),
                TaskClass {
                    name: "ReachTarget",
                    variation_count: 20,
                },
            ],
            capabilities: CameraCapabilities::default(),
            missing_viewpoints: Vec::new(),
            malformed_viewpoints: Vec::new(),
            fail_launch: false,
            fail_step_at: None,
            call_history: Arc::new(Mutex::new(Vec::new())),
            actions: Arc::new(Mutex::new(Vec::new())),
        }
    }

    #[must_use]
    pub fn pick_and_lift() -> TaskClass {
        TaskClass {
            name: "PickAndLift",
            variation_count: 20,
        }
    }

    #[must_use]
    pub fn pick_up_cup() -> TaskClass {
        TaskClass {
            name: "PickUpCup",
            variation_count: 20,
        }
    }

    #[must_use]
    pub fn lift_numbered_block() -> TaskClass {
        TaskClass {
            name: "LiftNumberedBlock",
            variation_count: 3,
        }
    }

    /// Simulator exporting only the given tasks
    #[must_use]
    pub fn with_tasks(mut self, tasks: Vec<TaskClass>) -> Self {
        self.tasks = tasks;
        self
    }

    #[must_use]
    pub fn with_capabilities(mut self, capabilities: CameraCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Never produce a frame for `viewpoint`
    #[must_use]
    pub fn without_viewpoint(mut self, viewpoint: Viewpoint) -> Self {
        self.missing_viewpoints.push(viewpoint);
        self
    }

    /// Produce two-channel frames for `viewpoint`
    #[must_use]
    pub fn with_malformed_viewpoint(mut self, viewpoint: Viewpoint) -> Self {
        self.malformed_viewpoints.push(viewpoint);
        self
    }

    #[must_use]
    pub fn failing_launch(mut self) -> Self {
        self.fail_launch = true;
        self
    }

    /// Fail the `step`-th call to step (1-based)
    #[must_use]
    pub fn failing_step(mut self, step: u32) -> Self {
        self.fail_step_at = Some(step);
        self
    }

    pub fn get_call_history(&self) -> Vec<String> {
        self.call_history.lock().unwrap().clone()
    }

    /// Number of recorded calls whose name starts with `prefix`
    pub fn count_calls(&self, prefix: &str) -> usize {
        self.get_call_history()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    /// Actions received by every session, in order
    pub fn get_actions(&self) -> Vec<Vec<f64>> {
        self.actions.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.call_history.lock().unwrap().push(call);
    }
}

impl Default for MockSimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulator for MockSimulator {
    fn name(&self) -> &str {
        "mock"
    }

    fn exported_tasks(&self) -> Vec<TaskClass> {
        self.tasks.clone()
    }

    fn camera_capabilities(&self) -> CameraCapabilities {
        self.capabilities
    }

    fn launch(&self, settings: LaunchSettings) -> Result<Box<dyn SimulatorSession>> {
        self.record(format!("launch headless={}", settings.headless));
        if self.fail_launch {
            return Err(SnapError::simulator("mock launch failure"));
        }
        Ok(Box::new(MockSession {
            simulator: self.clone(),
            obs_config: settings.obs_config,
            task: None,
            steps: 0,
        }))
    }
}

struct MockSession {
    simulator: MockSimulator,
    obs_config: ObservationConfig,
    task: Option<TaskClass>,
    steps: u32,
}

impl MockSession {
    fn observation(&self, fill: u8) -> Observation {
        let mut observation = Observation::default();
        for viewpoint in self.obs_config.enabled_viewpoints() {
            if self.simulator.missing_viewpoints.contains(&viewpoint) {
                continue;
            }
            let (width, height) = self
                .obs_config
                .camera(viewpoint)
                .image_size
                .unwrap_or((16, 16));
            let channels = if self.simulator.malformed_viewpoints.contains(&viewpoint) {
                2
            } else {
                3
            };
            let frame = RgbFrame::from_elem((height as usize, width as usize, channels), fill);
            observation.set_rgb(viewpoint, Some(frame));
        }
        observation
    }
}

impl SimulatorSession for MockSession {
    fn action_shape(&self) -> usize {
        MOCK_ACTION_SHAPE
    }

    fn load_task(&mut self, task: &TaskClass) -> Result<()> {
        self.simulator.record(format!("load_task {}", task.name));
        self.task = Some(*task);
        Ok(())
    }

    fn sample_variation(&mut self, index: u32) -> Result<()> {
        self.simulator.record(format!("sample_variation {index}"));
        match self.task {
            Some(task) if index < task.variation_count => Ok(()),
            Some(task) => Err(SnapError::simulator(format!(
                "variation {index} out of range for {}",
                task.name
            ))),
            None => Err(SnapError::simulator("no task loaded")),
        }
    }

    fn reset(&mut self) -> Result<(Vec<String>, Observation)> {
        self.simulator.record("reset".to_string());
        self.steps = 0;
        Ok((vec!["mock task".to_string()], self.observation(0)))
    }

    fn step(&mut self, action: &[f64]) -> Result<StepOutcome> {
        self.steps += 1;
        self.simulator.record(format!("step {}", self.steps));
        if action.len() != MOCK_ACTION_SHAPE {
            return Err(SnapError::invalid_action(format!(
                "expected {MOCK_ACTION_SHAPE} values, got {}",
                action.len()
            )));
        }
        if self.simulator.fail_step_at == Some(self.steps) {
            return Err(SnapError::simulator("mock step failure"));
        }
        self.simulator.actions.lock().unwrap().push(action.to_vec());
        Ok(StepOutcome {
            observation: self.observation(self.steps.min(255) as u8),
            reward: 0.0,
            done: false,
        })
    }

    fn shutdown(&mut self) -> Result<()> {
        self.simulator.record("shutdown".to_string());
        Ok(())
    }
}

/// Log sink shared between a test and its scoped subscriber
#[derive(Debug, Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Run `f` under a plain-text subscriber and return its log output
pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();

    let value = tracing::subscriber::with_default(subscriber, f);
    let logs = String::from_utf8_lossy(&buffer.0.lock().unwrap()).into_owned();
    (value, logs)
}
