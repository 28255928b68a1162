//! XGM document: the compiled music project and its query layer.
//!
//! An [`XgmDocument`] owns the ordered sample table and the ordered command
//! stream, plus the tri-state region flag. All offset/time queries are plain
//! forward scans over the command sequence: the document is only queried
//! after it is finalized and infrequently, so nothing is cached.
use crate::binutil::{write_slice, write_u16};
use crate::xgm::command::XgmCommand;
use crate::xgm::parser;
use crate::xgm::sample::XgmSample;
use std::convert::TryFrom;

/// Size of the fixed container header: magic + 63 directory entries +
/// sample-block size + version + flags.
pub(crate) const XGM_HEADER_SIZE: usize = 0x104;

/// Container magic tag.
pub(crate) const XGM_IDENT: &[u8; 4] = b"XGM ";

/// Video timing region. Determines frames-per-second and therefore every
/// frame/second conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Region {
    /// Not yet resolved. Serializes as NTSC.
    #[default]
    Unknown,
    Ntsc,
    Pal,
}

impl Region {
    /// Hardware frames per second; `Unknown` defaults to NTSC timing.
    pub fn frames_per_second(self) -> u32 {
        match self {
            Region::Pal => 50,
            Region::Ntsc | Region::Unknown => 60,
        }
    }

    /// Container flags byte, bit 0 (0 NTSC, 1 PAL).
    pub(crate) fn flag_bit(self) -> u8 {
        match self {
            Region::Pal => 1,
            Region::Ntsc | Region::Unknown => 0,
        }
    }
}

/// A compiled music project: sample table, command stream, region flag.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XgmDocument {
    /// Ordered sample table (directory indices are 1-based).
    pub samples: Vec<XgmSample>,
    /// Ordered driver command stream.
    pub commands: Vec<XgmCommand>,
    /// Region flag; once resolved to NTSC/PAL it is never reset.
    pub region: Region,
}

impl XgmDocument {
    /// Cumulative byte offset of the command at `index` (sum of the sizes of
    /// all its predecessors). `None` when out of range.
    pub fn offset_of(&self, index: usize) -> Option<usize> {
        if index > self.commands.len() {
            return None;
        }
        Some(self.commands[..index].iter().map(XgmCommand::size).sum())
    }

    /// The command starting exactly at byte `offset`, with its index.
    pub fn command_at_offset(&self, offset: usize) -> Option<(usize, &XgmCommand)> {
        let mut current = 0usize;
        for (index, command) in self.commands.iter().enumerate() {
            if current == offset {
                return Some((index, command));
            }
            current += command.size();
        }
        None
    }

    /// The loop marker, if the stream has one.
    pub fn loop_command(&self) -> Option<&XgmCommand> {
        self.commands.iter().find(|c| c.is_loop())
    }

    /// The command the loop marker resumes at.
    pub fn loop_target(&self) -> Option<&XgmCommand> {
        let offset = self.loop_command()?.loop_offset()?;
        self.command_at_offset(offset as usize).map(|(_, c)| c)
    }

    /// Number of hardware frames (count of frame markers).
    pub fn frame_count(&self) -> usize {
        self.commands.iter().filter(|c| c.is_frame()).count()
    }

    /// Duration in whole seconds: frames divided by the region's frame rate.
    pub fn duration_seconds(&self) -> u32 {
        self.frame_count() as u32 / self.region.frames_per_second()
    }

    /// Frame index of the command at `index`: the number of frame markers
    /// strictly before it.
    pub fn frame_of(&self, index: usize) -> Option<usize> {
        if index >= self.commands.len() {
            return None;
        }
        Some(self.commands[..index].iter().filter(|c| c.is_frame()).count())
    }

    /// Elapsed time of the command at `index` in the 44100 Hz sample-time
    /// base: `frame * 44100 / fps`.
    pub fn time_of(&self, index: usize) -> Option<u32> {
        let frame = self.frame_of(index)? as u32;
        Some(frame * 44100 / self.region.frames_per_second())
    }

    /// The command active at elapsed `time` (44100 Hz base), converted to a
    /// frame index via `time * fps / 44100` with integer truncation.
    ///
    /// The truncating conversion is not exactly invertible with
    /// [`XgmDocument::time_of`]; this is inherent rounding, not a defect.
    pub fn command_at_time(&self, time: u32) -> Option<&XgmCommand> {
        let frame = (time as u64 * self.region.frames_per_second() as u64 / 44100) as usize;
        let mut seen = 0usize;
        for command in &self.commands {
            if seen >= frame {
                return Some(command);
            }
            if command.is_frame() {
                seen += 1;
            }
        }
        None
    }

    /// Look up a sample by its 1-based directory index.
    pub fn sample_by_index(&self, index: u8) -> Option<&XgmSample> {
        if index == 0 {
            return None;
        }
        self.samples.iter().find(|s| s.index == index)
    }

    /// Look up a sample by its origin address in source PCM space.
    pub fn sample_by_origin(&self, origin_addr: u32) -> Option<&XgmSample> {
        self.samples.iter().find(|s| s.origin_addr == origin_addr)
    }

    /// Total stored sample payload bytes.
    pub fn sample_data_size(&self) -> usize {
        self.samples.iter().map(XgmSample::data_len).sum()
    }

    /// Total command stream bytes.
    pub fn music_data_size(&self) -> usize {
        self.commands.iter().map(XgmCommand::size).sum()
    }

    /// Serialize the full container.
    ///
    /// Layout: magic, 63 fixed directory entries (offset÷256, length÷256 as
    /// u16 LE each; unused slots hold the 0xFFFF/0x0000 sentinel), sample
    /// block total size ÷256 (u16 LE), version byte 0, flags byte (bit 0 =
    /// region, NTSC when still unresolved), concatenated sample payloads in
    /// table order, command stream length (u32 LE), raw command bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut header = [0u8; XGM_HEADER_SIZE];
        write_slice(&mut header, 0x000, XGM_IDENT);

        let mut offset = 0usize;
        let mut slot = 0usize;
        for sample in &self.samples {
            let entry = 0x004 + slot * 4;
            write_u16(&mut header, entry, (offset >> 8) as u16);
            write_u16(&mut header, entry + 2, (sample.data_len() >> 8) as u16);
            offset += sample.data_len();
            slot += 1;
        }
        for slot in slot..63 {
            let entry = 0x004 + slot * 4;
            write_u16(&mut header, entry, 0xFFFF);
            write_u16(&mut header, entry + 2, 0x0000);
        }

        write_u16(&mut header, 0x100, (offset >> 8) as u16);
        header[0x102] = 0x00;
        header[0x103] = self.region.flag_bit();

        let music_size = self.music_data_size();
        let mut bytes = Vec::with_capacity(XGM_HEADER_SIZE + offset + 4 + music_size);
        bytes.extend_from_slice(&header);
        for sample in &self.samples {
            bytes.extend_from_slice(sample.data());
        }
        bytes.extend_from_slice(&(music_size as u32).to_le_bytes());
        for command in &self.commands {
            bytes.extend_from_slice(command.data());
        }
        bytes
    }
}

/// Parse a raw XGM container. Fails with a `ParseError` on bad magic,
/// truncation, or an unrecognized command opcode.
impl TryFrom<&[u8]> for XgmDocument {
    type Error = crate::binutil::ParseError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        parser::parse_xgm(bytes)
    }
}

impl From<&XgmDocument> for Vec<u8> {
    fn from(document: &XgmDocument) -> Vec<u8> {
        document.to_bytes()
    }
}

impl From<XgmDocument> for Vec<u8> {
    fn from(document: XgmDocument) -> Vec<u8> {
        document.to_bytes()
    }
}
