//! Destination side of the compiler: the XGM command codec, sample table,
//! compiled document with its query layer, the frame reclassifier, and the
//! container parser.
pub mod command;
mod document;
mod parser;
pub mod sample;
mod transcoder;

pub use command::{XgmCommand, XgmCommandKind};
pub use document::{Region, XgmDocument};
pub use sample::{MAX_SAMPLES, SampleTableError, XgmSample, build_sample_table};
pub use transcoder::{Diagnostic, TranscodeOutput, transcode};
