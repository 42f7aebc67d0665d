//! Frame output service
//!
//! Converts simulator frame buffers to images and writes them as PNG. The
//! best-effort entry point turns every failure into a warning so that one
//! bad frame never stops a capture run.

use crate::{
    error::{Result, SnapError},
    types::RgbFrame,
};
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage, RgbaImage};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// What happened to one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Frame written to this path
    Written(PathBuf),
    /// Viewpoint produced no frame
    Skipped,
    /// Write attempted and failed; the warning has been logged
    Failed(PathBuf),
}

/// Service for writing captured frames to disk
pub struct FrameWriter;

impl FrameWriter {
    /// Convert a `(height, width, channels)` buffer into an image
    ///
    /// One, three and four channels map to grayscale, RGB and RGBA.
    ///
    /// # Errors
    /// - `SnapError::UnsupportedBuffer` for empty frames or other channel counts
    pub fn frame_to_image(frame: &RgbFrame) -> Result<DynamicImage> {
        let (height, width, channels) = frame.dim();
        if height == 0 || width == 0 {
            return Err(SnapError::unsupported_buffer(format!(
                "empty frame of shape ({height}, {width}, {channels})"
            )));
        }
        let (w, h) = match (u32::try_from(width), u32::try_from(height)) {
            (Ok(w), Ok(h)) => (w, h),
            _ => {
                return Err(SnapError::unsupported_buffer(format!(
                    "frame of shape ({height}, {width}, {channels}) is too large"
                )))
            },
        };

        // Logical iteration order is row-major regardless of memory layout
        let data: Vec<u8> = frame.iter().copied().collect();
        let image = match channels {
            1 => GrayImage::from_raw(w, h, data).map(DynamicImage::ImageLuma8),
            3 => RgbImage::from_raw(w, h, data).map(DynamicImage::ImageRgb8),
            4 => RgbaImage::from_raw(w, h, data).map(DynamicImage::ImageRgba8),
            _ => None,
        };

        image.ok_or_else(|| {
            SnapError::unsupported_buffer(format!(
                "cannot encode frame of shape ({height}, {width}, {channels}); expected 1, 3 or 4 channels"
            ))
        })
    }

    /// Encode a frame as PNG at `path`
    ///
    /// The frame is encoded to a `.part` sibling and renamed into place, so a
    /// failed write never leaves a truncated PNG at `path`. The parent
    /// directory must already exist.
    ///
    /// # Errors
    /// - Unsupported buffer shape
    /// - Encoding or filesystem failures
    pub fn save<P: AsRef<Path>>(frame: &RgbFrame, path: P) -> Result<()> {
        let path_ref = path.as_ref();
        let image = Self::frame_to_image(frame)?;

        let partial = Self::partial_path(path_ref);
        let written = image
            .save_with_format(&partial, ImageFormat::Png)
            .map_err(SnapError::from)
            .and_then(|()| {
                fs::rename(&partial, path_ref)
                    .map_err(|e| SnapError::file_io_error("move frame into place", path_ref, &e))
            });

        if let Err(e) = written {
            if partial.is_file() {
                if let Err(cleanup_err) = fs::remove_file(&partial) {
                    warn!("Failed to remove partial frame {}: {}", partial.display(), cleanup_err);
                }
            }
            return Err(e);
        }

        debug!(path = %path_ref.display(), "Frame written");
        Ok(())
    }

    fn partial_path(path: &Path) -> PathBuf {
        let mut name = path.file_name().map(OsString::from).unwrap_or_default();
        name.push(".part");
        path.with_file_name(name)
    }

    /// Save a frame if present, logging failures instead of returning them
    pub fn save_best_effort<P: AsRef<Path>>(frame: Option<&RgbFrame>, path: P) -> FrameOutcome {
        let path_ref = path.as_ref();
        let Some(frame) = frame else {
            return FrameOutcome::Skipped;
        };
        match Self::save(frame, path_ref) {
            Ok(()) => FrameOutcome::Written(path_ref.to_path_buf()),
            Err(e) => {
                warn!("couldn't save {}: {}", path_ref.display(), e);
                FrameOutcome::Failed(path_ref.to_path_buf())
            },
        }
    }
}
