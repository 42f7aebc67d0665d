//! Services separating file output from the capture workflow

pub mod io;

pub use io::{FrameOutcome, FrameWriter};
