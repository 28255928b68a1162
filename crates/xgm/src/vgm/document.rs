//! Decoded source log handed to the transcoder.
use crate::vgm::command::VgmCommand;
use crate::vgm::parser;
use std::convert::TryFrom;

/// A decoded VGM log: the header fields the compiler cares about plus the
/// ordered command stream (with the synthetic loop-point event already
/// inserted by the parser).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VgmDocument {
    /// VGM format version (BCD, e.g. 0x161).
    pub version: u32,
    /// Recording rate in Hz (60 NTSC, 50 PAL, 0 unknown).
    pub rate: u32,
    /// Ordered command stream.
    pub commands: Vec<VgmCommand>,
}

impl VgmDocument {
    /// Iterate the command stream.
    pub fn iter(&self) -> std::slice::Iter<'_, VgmCommand> {
        self.commands.iter()
    }
}

/// Parse a raw VGM byte slice. Fails with a `ParseError` on malformed input.
impl TryFrom<&[u8]> for VgmDocument {
    type Error = crate::binutil::ParseError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        parser::parse_vgm(bytes)
    }
}

impl<'a> IntoIterator for &'a VgmDocument {
    type Item = &'a VgmCommand;
    type IntoIter = std::slice::Iter<'a, VgmCommand>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}
