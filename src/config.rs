//! Configuration types for snapshot capture
//!
//! Two layers live here: the observation configuration handed to the
//! simulator at launch (which cameras render, at what size) and the run
//! configuration that drives one snapshot session.

use crate::error::{Result, SnapError};
use crate::types::Viewpoint;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default frame width in pixels
pub const DEFAULT_WIDTH: u32 = 640;
/// Default frame height in pixels
pub const DEFAULT_HEIGHT: u32 = 480;
/// Default number of random actions applied before the final capture
pub const DEFAULT_STEPS: u32 = 1;

/// Camera configuration schema declared by a simulator
///
/// Simulator releases differ in which camera toggles exist: older schemas
/// expose `masks`, newer ones `segmentation`. The schema is read once from
/// the simulator and the builder only sets fields it declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct CameraCapabilities {
    pub rgb: bool,
    pub depth: bool,
    pub segmentation: bool,
    pub masks: bool,
    pub image_size: bool,
}

impl CameraCapabilities {
    /// Schema with a `segmentation` toggle
    #[must_use]
    pub const fn with_segmentation() -> Self {
        Self {
            rgb: true,
            depth: true,
            segmentation: true,
            masks: false,
            image_size: true,
        }
    }

    /// Schema with a `masks` toggle
    #[must_use]
    pub const fn with_masks() -> Self {
        Self {
            rgb: true,
            depth: true,
            segmentation: false,
            masks: true,
            image_size: true,
        }
    }
}

impl Default for CameraCapabilities {
    fn default() -> Self {
        Self::with_segmentation()
    }
}

/// Per-camera toggles; `None` means the field does not exist in the schema
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CameraConfig {
    pub rgb: Option<bool>,
    pub depth: Option<bool>,
    pub segmentation: Option<bool>,
    pub masks: Option<bool>,
    pub image_size: Option<(u32, u32)>,
}

impl CameraConfig {
    /// Camera with every declared channel switched off
    #[must_use]
    pub fn disabled(caps: &CameraCapabilities) -> Self {
        Self {
            rgb: caps.rgb.then_some(false),
            depth: caps.depth.then_some(false),
            segmentation: caps.segmentation.then_some(false),
            masks: caps.masks.then_some(false),
            image_size: None,
        }
    }

    /// Camera capturing RGB only at `width` x `height`
    #[must_use]
    pub fn rgb_only(width: u32, height: u32, caps: &CameraCapabilities) -> Self {
        Self {
            rgb: caps.rgb.then_some(true),
            image_size: caps.image_size.then_some((width, height)),
            ..Self::disabled(caps)
        }
    }

    #[must_use]
    pub fn rgb_enabled(&self) -> bool {
        self.rgb.unwrap_or(false)
    }

    #[must_use]
    pub fn depth_enabled(&self) -> bool {
        self.depth.unwrap_or(false)
    }

    /// Whether either segmentation toggle is on
    #[must_use]
    pub fn segmentation_enabled(&self) -> bool {
        self.segmentation.unwrap_or(false) || self.masks.unwrap_or(false)
    }
}

/// Observation configuration passed to the simulator at launch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationConfig {
    pub front_camera: CameraConfig,
    pub wrist_camera: CameraConfig,
    pub left_shoulder_camera: CameraConfig,
    pub joint_positions: bool,
    pub gripper_open: bool,
}

impl ObservationConfig {
    /// Every channel off
    #[must_use]
    pub fn all_disabled(caps: &CameraCapabilities) -> Self {
        let camera = CameraConfig::disabled(caps);
        Self {
            front_camera: camera.clone(),
            wrist_camera: camera.clone(),
            left_shoulder_camera: camera,
            joint_positions: false,
            gripper_open: false,
        }
    }

    /// RGB-only capture on the front, wrist and left-shoulder cameras
    ///
    /// The same camera configuration is used for all three viewpoints, so
    /// the resolution applies uniformly.
    #[must_use]
    pub fn rgb_only(width: u32, height: u32, caps: &CameraCapabilities) -> Self {
        let camera = CameraConfig::rgb_only(width, height, caps);
        Self {
            front_camera: camera.clone(),
            wrist_camera: camera.clone(),
            left_shoulder_camera: camera,
            ..Self::all_disabled(caps)
        }
    }

    #[must_use]
    pub fn camera(&self, viewpoint: Viewpoint) -> &CameraConfig {
        match viewpoint {
            Viewpoint::Front => &self.front_camera,
            Viewpoint::Wrist => &self.wrist_camera,
            Viewpoint::LeftShoulder => &self.left_shoulder_camera,
        }
    }

    /// Viewpoints whose RGB channel is on
    #[must_use]
    pub fn enabled_viewpoints(&self) -> Vec<Viewpoint> {
        Viewpoint::ALL
            .into_iter()
            .filter(|viewpoint| self.camera(*viewpoint).rgb_enabled())
            .collect()
    }
}

/// Configuration for one snapshot run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapConfig {
    /// Directory receiving the PNG files (created with parents)
    pub output_dir: PathBuf,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Random actions applied before the final capture
    pub steps: u32,
    /// Task variation to select instead of a random one
    pub variation: Option<u32>,
    /// Seed for the action sampler
    pub seed: Option<u64>,
    /// Run the simulator without a window
    pub headless: bool,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            steps: DEFAULT_STEPS,
            variation: None,
            seed: None,
            headless: true,
        }
    }
}

impl SnapConfig {
    #[must_use]
    pub fn builder() -> SnapConfigBuilder {
        SnapConfigBuilder::new()
    }

    /// Validate dimensions and step count
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 {
            return Err(SnapError::config_value_error("width", self.width, "1 or more"));
        }
        if self.height == 0 {
            return Err(SnapError::config_value_error("height", self.height, "1 or more"));
        }
        if self.steps == 0 {
            return Err(SnapError::config_value_error("steps", self.steps, "1 or more"));
        }
        Ok(())
    }
}

/// Builder for `SnapConfig`
#[derive(Debug, Default)]
pub struct SnapConfigBuilder {
    config: SnapConfig,
}

impl SnapConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn output_dir<P: Into<PathBuf>>(mut self, output_dir: P) -> Self {
        self.config.output_dir = output_dir.into();
        self
    }

    #[must_use]
    pub fn resolution(mut self, width: u32, height: u32) -> Self {
        self.config.width = width;
        self.config.height = height;
        self
    }

    #[must_use]
    pub fn steps(mut self, steps: u32) -> Self {
        self.config.steps = steps;
        self
    }

    #[must_use]
    pub fn variation(mut self, variation: Option<u32>) -> Self {
        self.config.variation = variation;
        self
    }

    #[must_use]
    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.config.seed = seed;
        self
    }

    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.config.headless = headless;
        self
    }

    pub fn build(self) -> Result<SnapConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_only_applies_to_all_viewpoints() {
        let config = ObservationConfig::rgb_only(320, 240, &CameraCapabilities::with_segmentation());

        for viewpoint in Viewpoint::ALL {
            let camera = config.camera(viewpoint);
            assert!(camera.rgb_enabled(), "{viewpoint} rgb");
            assert!(!camera.depth_enabled(), "{viewpoint} depth");
            assert!(!camera.segmentation_enabled(), "{viewpoint} segmentation");
            assert_eq!(camera.image_size, Some((320, 240)));
        }
        assert_eq!(config.enabled_viewpoints(), Viewpoint::ALL.to_vec());
        assert!(!config.joint_positions);
        assert!(!config.gripper_open);
    }

    #[test]
    fn test_masks_schema_skips_segmentation_field() {
        let camera = CameraConfig::rgb_only(64, 48, &CameraCapabilities::with_masks());
        assert_eq!(camera.segmentation, None);
        assert_eq!(camera.masks, Some(false));
        assert!(!camera.segmentation_enabled());

        let camera = CameraConfig::rgb_only(64, 48, &CameraCapabilities::with_segmentation());
        assert_eq!(camera.segmentation, Some(false));
        assert_eq!(camera.masks, None);
    }

    #[test]
    fn test_schema_without_image_size() {
        let caps = CameraCapabilities {
            image_size: false,
            ..CameraCapabilities::default()
        };
        let camera = CameraConfig::rgb_only(64, 48, &caps);
        assert_eq!(camera.image_size, None);
        assert!(camera.rgb_enabled());
    }

    #[test]
    fn test_all_disabled() {
        let config = ObservationConfig::all_disabled(&CameraCapabilities::default());
        assert!(config.enabled_viewpoints().is_empty());
    }

    #[test]
    fn test_snap_config_defaults() {
        let config = SnapConfig::builder().output_dir("/tmp/x").build().unwrap();
        assert_eq!(config.width, 640);
        assert_eq!(config.height, 480);
        assert_eq!(config.steps, 1);
        assert_eq!(config.variation, None);
        assert!(config.headless);
    }

    #[test]
    fn test_snap_config_validation() {
        let err = SnapConfig::builder().steps(0).build().unwrap_err();
        assert!(err.to_string().contains("steps"));

        let err = SnapConfig::builder().resolution(0, 10).build().unwrap_err();
        assert!(err.to_string().contains("width"));

        let err = SnapConfig::builder().resolution(10, 0).build().unwrap_err();
        assert!(err.to_string().contains("height"));

        assert!(SnapConfig::builder().resolution(1, 1).steps(1).build().is_ok());
    }
}
