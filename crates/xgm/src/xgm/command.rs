//! XGM command model and opcode codec.
//!
//! Each [`XgmCommand`] owns its exact encoded bytes; the byte length is what
//! the offset arithmetic of the query layer sums over. The XGM v1 opcode map:
//!
//! | Opcode | Command        | Payload                                   |
//! |--------|----------------|-------------------------------------------|
//! | 0x00   | frame marker   | none                                      |
//! | 0x1n   | PSG batch      | n+1 value bytes                           |
//! | 0x2n   | YM port 0      | n+1 (register, value) pairs               |
//! | 0x3n   | YM port 1      | n+1 (register, value) pairs               |
//! | 0x4n   | YM key batch   | n+1 key-register value bytes              |
//! | 0x5c   | PCM play       | sample index byte; c = channel            |
//! | 0x7E   | loop marker    | 24-bit little-endian resume offset        |
//! | 0x7F   | end marker     | none                                      |
use crate::binutil::{ParseError, read_slice, read_u8_at, read_u24_le_at};

/// Raw XGM opcodes (high nibble for batched commands).
pub mod opcode {
    pub const FRAME: u8 = 0x00;
    pub const PSG: u8 = 0x10;
    pub const YM_PORT0: u8 = 0x20;
    pub const YM_PORT1: u8 = 0x30;
    pub const YM_KEY: u8 = 0x40;
    pub const PCM: u8 = 0x50;
    pub const LOOP: u8 = 0x7E;
    pub const END: u8 = 0x7F;
}

/// Maximum number of entries one batched command can carry (the count is
/// encoded as the opcode's low nibble, value minus one).
const BATCH_MAX: usize = 16;

/// Destination subsystem of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XgmCommandKind {
    Frame,
    Psg,
    YmPort0,
    YmPort1,
    YmKey,
    PcmPlay,
    Loop,
    End,
}

/// One encoded entry of the driver command stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XgmCommand {
    kind: XgmCommandKind,
    data: Vec<u8>,
}

impl XgmCommand {
    pub fn kind(&self) -> XgmCommandKind {
        self.kind
    }

    /// The exact encoded bytes of this command.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Encoded byte length; the unit of all offset arithmetic.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn is_frame(&self) -> bool {
        self.kind == XgmCommandKind::Frame
    }

    pub fn is_loop(&self) -> bool {
        self.kind == XgmCommandKind::Loop
    }

    pub fn is_end(&self) -> bool {
        self.kind == XgmCommandKind::End
    }

    /// Resume offset carried by a loop marker.
    pub fn loop_offset(&self) -> Option<u32> {
        if self.is_loop() {
            read_u24_le_at(&self.data, 1).ok()
        } else {
            None
        }
    }

    /// The frame marker: the driver's "advance to next hardware frame" signal.
    pub fn frame() -> Self {
        XgmCommand {
            kind: XgmCommandKind::Frame,
            data: vec![opcode::FRAME],
        }
    }

    pub fn end() -> Self {
        XgmCommand {
            kind: XgmCommandKind::End,
            data: vec![opcode::END],
        }
    }

    /// A loop marker pointing at `offset` bytes into the command stream.
    /// Only the low 24 bits are representable.
    pub fn loop_marker(offset: u32) -> Self {
        XgmCommand {
            kind: XgmCommandKind::Loop,
            data: vec![
                opcode::LOOP,
                offset as u8,
                (offset >> 8) as u8,
                (offset >> 16) as u8,
            ],
        }
    }

    /// A PCM play command for `sample_index` on `channel` (0-3).
    pub fn pcm_play(channel: u8, sample_index: u8) -> Self {
        XgmCommand {
            kind: XgmCommandKind::PcmPlay,
            data: vec![opcode::PCM | (channel & 0x03), sample_index],
        }
    }

    /// Encode PSG values into batch commands, 16 values per command.
    pub fn psg_batches(values: &[u8]) -> Vec<Self> {
        values
            .chunks(BATCH_MAX)
            .map(|chunk| {
                let mut data = vec![opcode::PSG | (chunk.len() as u8 - 1)];
                data.extend_from_slice(chunk);
                XgmCommand {
                    kind: XgmCommandKind::Psg,
                    data,
                }
            })
            .collect()
    }

    /// Encode YM port-0 register writes into batch commands.
    pub fn ym_port0_batches(writes: &[(u8, u8)]) -> Vec<Self> {
        Self::ym_port_batches(writes, opcode::YM_PORT0, XgmCommandKind::YmPort0)
    }

    /// Encode YM port-1 register writes into batch commands.
    pub fn ym_port1_batches(writes: &[(u8, u8)]) -> Vec<Self> {
        Self::ym_port_batches(writes, opcode::YM_PORT1, XgmCommandKind::YmPort1)
    }

    fn ym_port_batches(writes: &[(u8, u8)], base: u8, kind: XgmCommandKind) -> Vec<Self> {
        writes
            .chunks(BATCH_MAX)
            .map(|chunk| {
                let mut data = vec![base | (chunk.len() as u8 - 1)];
                for (register, value) in chunk {
                    data.push(*register);
                    data.push(*value);
                }
                XgmCommand { kind, data }
            })
            .collect()
    }

    /// Encode key-register values (writes to YM register 0x28) into batch
    /// commands. Used for both key-off and key-on/other flushes; the two are
    /// indistinguishable on the wire.
    pub fn ym_key_batches(values: &[u8]) -> Vec<Self> {
        values
            .chunks(BATCH_MAX)
            .map(|chunk| {
                let mut data = vec![opcode::YM_KEY | (chunk.len() as u8 - 1)];
                data.extend_from_slice(chunk);
                XgmCommand {
                    kind: XgmCommandKind::YmKey,
                    data,
                }
            })
            .collect()
    }

    /// Decode one command at `off`, returning the command and the number of
    /// bytes consumed. Strict: an unrecognized opcode is a
    /// [`ParseError::UnknownOpcode`].
    pub fn decode(bytes: &[u8], off: usize) -> Result<(Self, usize), ParseError> {
        let op = read_u8_at(bytes, off)?;
        let count = (op & 0x0F) as usize + 1;

        let (kind, size) = match op {
            opcode::FRAME => (XgmCommandKind::Frame, 1),
            0x10..=0x1F => (XgmCommandKind::Psg, 1 + count),
            0x20..=0x2F => (XgmCommandKind::YmPort0, 1 + count * 2),
            0x30..=0x3F => (XgmCommandKind::YmPort1, 1 + count * 2),
            0x40..=0x4F => (XgmCommandKind::YmKey, 1 + count),
            0x50..=0x5F => (XgmCommandKind::PcmPlay, 2),
            opcode::LOOP => (XgmCommandKind::Loop, 4),
            opcode::END => (XgmCommandKind::End, 1),
            _ => return Err(ParseError::UnknownOpcode { opcode: op, offset: off }),
        };

        let data = read_slice(bytes, off, size, "xgm_command")?.to_vec();
        Ok((XgmCommand { kind, data }, size))
    }
}
