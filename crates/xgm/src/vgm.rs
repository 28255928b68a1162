//! Source side of the compiler: the VGM event model, parser, and
//! sample-bank extractor.
pub mod bank;
pub mod command;
mod document;
mod parser;

pub use bank::{RawSample, SampleBank, collect_sample_banks};
pub use command::VgmCommand;
pub use document::VgmDocument;
