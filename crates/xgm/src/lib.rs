#![doc = include_str!("../README.md")]
//!
//! # Overview
//!
//! The pipeline is batch-oriented and single-threaded: parse the source log,
//! extract the PCM sample banks, reclassify the events frame by frame, then
//! query or serialize the resulting document. The reverse path parses a
//! container straight into the same model, bypassing reclassification.
//!
//! Example: transcode a small hand-built log and serialize it.
//!
//! ```rust
//! use xgm::{VgmCommand, VgmDocument, transcode};
//!
//! let vgm = VgmDocument {
//!     version: 0x161,
//!     rate: 60,
//!     commands: vec![
//!         VgmCommand::YmWrite { port: 0, register: 0xB0, value: 0x32 },
//!         VgmCommand::WaitNtsc,
//!         VgmCommand::End,
//!     ],
//! };
//!
//! let out = transcode(&vgm).unwrap();
//! // One frame for the register write, one (empty) frame closing the
//! // stream with the end marker.
//! assert_eq!(out.document.frame_count(), 2);
//! assert!(out.diagnostics.is_empty());
//!
//! let bytes: Vec<u8> = (&out.document).into();
//! assert_eq!(&bytes[0..4], b"XGM ");
//! ```
//!
//! Example: parse a container back.
//!
//! ```rust
//! use xgm::{VgmCommand, VgmDocument, XgmDocument, transcode};
//!
//! let vgm = VgmDocument {
//!     version: 0x161,
//!     rate: 50,
//!     commands: vec![VgmCommand::PsgWrite { value: 0x9F }, VgmCommand::End],
//! };
//! let document = transcode(&vgm).unwrap().document;
//!
//! let bytes = document.to_bytes();
//! let parsed = XgmDocument::try_from(bytes.as_slice()).unwrap();
//! assert_eq!(parsed.commands, document.commands);
//! ```
mod binutil;
pub mod vgm;
pub mod xgm;

pub use binutil::ParseError;
pub use vgm::{VgmCommand, VgmDocument};
pub use xgm::{
    Diagnostic, Region, SampleTableError, TranscodeOutput, XgmCommand, XgmCommandKind,
    XgmDocument, XgmSample, transcode,
};
