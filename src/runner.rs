//! Snapshot session runner
//!
//! One run: launch the simulator headlessly, load and reset the task,
//! save the "before" frame set, apply random actions, save the "after"
//! frame set from the final step, shut down.

use crate::{
    config::{ObservationConfig, SnapConfig},
    error::{Result, SnapError},
    services::{FrameOutcome, FrameWriter},
    sim::{ActionMode, LaunchSettings, SessionGuard, Simulator, TaskClass},
    types::{CapturePhase, Observation, SnapshotTag, Viewpoint},
};
use chrono::Utc;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, info_span};

/// Source of millisecond timestamps for output file names
pub trait Clock {
    fn epoch_millis(&self) -> i64;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn epoch_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Samples actions with independent standard normal components
#[derive(Debug, Clone, Copy)]
pub struct ActionSampler {
    dimensions: usize,
}

impl ActionSampler {
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<f64> {
        (0..self.dimensions)
            .map(|_| Distribution::<f64>::sample(&StandardNormal, rng))
            .collect()
    }
}

/// Frames saved for one capture phase
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CaptureReport {
    pub written: Vec<PathBuf>,
    pub skipped: Vec<Viewpoint>,
    pub failed: Vec<PathBuf>,
}

/// Outcome of a snapshot run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub task: String,
    pub tag: String,
    pub output_dir: PathBuf,
    pub descriptions: Vec<String>,
    pub steps: u32,
    pub last_reward: f64,
    pub done: bool,
    pub before: CaptureReport,
    pub after: CaptureReport,
}

impl RunSummary {
    /// Every file written across both phases
    #[must_use]
    pub fn written_files(&self) -> Vec<&Path> {
        self.before
            .written
            .iter()
            .chain(&self.after.written)
            .map(PathBuf::as_path)
            .collect()
    }
}

/// Drives one snapshot session against a simulator
pub struct SnapshotRunner<'a> {
    simulator: &'a dyn Simulator,
    clock: Box<dyn Clock + 'a>,
}

impl<'a> SnapshotRunner<'a> {
    #[must_use]
    pub fn new(simulator: &'a dyn Simulator) -> Self {
        Self {
            simulator,
            clock: Box::new(SystemClock),
        }
    }

    /// Replace the wall clock, e.g. for predictable file names
    #[must_use]
    pub fn with_clock<C: Clock + 'a>(mut self, clock: C) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Run one capture session
    ///
    /// `task_name` is the identifier the user asked for and becomes part of
    /// the snapshot tag. Frame write failures are logged and counted, never
    /// returned; every other failure aborts the run after the simulator has
    /// been shut down.
    pub fn run<R: Rng + ?Sized>(
        &self,
        task_name: &str,
        task: &TaskClass,
        config: &SnapConfig,
        rng: &mut R,
    ) -> Result<RunSummary> {
        config.validate()?;
        let span = info_span!("snapshot", task = %task_name, simulator = self.simulator.name());
        let _enter = span.enter();

        std::fs::create_dir_all(&config.output_dir).map_err(|e| {
            SnapError::file_io_error("create output directory", &config.output_dir, &e)
        })?;

        let capabilities = self.simulator.camera_capabilities();
        let settings = LaunchSettings {
            headless: config.headless,
            action_mode: ActionMode::default(),
            obs_config: ObservationConfig::rgb_only(config.width, config.height, &capabilities),
        };
        let mut guard = SessionGuard::new(self.simulator.launch(settings)?);
        let session = guard.session();

        session.load_task(task)?;
        if let Some(variation) = config.variation {
            session.sample_variation(variation)?;
        }
        let (descriptions, observation) = session.reset()?;
        if let Some(description) = descriptions.first() {
            info!(description = %description, "Task reset");
        }

        let tag = SnapshotTag::new(task_name, config.variation);
        let before = self.capture(&observation, &tag, CapturePhase::Initial, &config.output_dir);

        let sampler = ActionSampler::new(session.action_shape());
        let mut last = None;
        for step in 1..=config.steps {
            let action = sampler.sample(rng);
            let outcome = session.step(&action)?;
            debug!(step, reward = outcome.reward, done = outcome.done, "Step applied");
            last = Some(outcome);
        }
        let Some(last) = last else {
            return Err(SnapError::config_value_error("steps", config.steps, "1 or more"));
        };

        let after = self.capture(&last.observation, &tag, CapturePhase::Step, &config.output_dir);
        guard.shutdown()?;

        Ok(RunSummary {
            task: task.name.to_string(),
            tag: tag.to_string(),
            output_dir: config.output_dir.clone(),
            descriptions,
            steps: config.steps,
            last_reward: last.reward,
            done: last.done,
            before,
            after,
        })
    }

    /// Save every viewpoint of one observation
    fn capture(
        &self,
        observation: &Observation,
        tag: &SnapshotTag,
        phase: CapturePhase,
        output_dir: &Path,
    ) -> CaptureReport {
        let epoch_ms = self.clock.epoch_millis();
        let mut report = CaptureReport::default();
        for viewpoint in Viewpoint::ALL {
            let path = output_dir.join(tag.frame_file_name(epoch_ms, viewpoint, phase));
            match FrameWriter::save_best_effort(observation.rgb(viewpoint), &path) {
                FrameOutcome::Written(path) => report.written.push(path),
                FrameOutcome::Skipped => report.skipped.push(viewpoint),
                FrameOutcome::Failed(path) => report.failed.push(path),
            }
        }
        info!(
            phase = ?phase,
            written = report.written.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Frames captured"
        );
        report
    }
}
