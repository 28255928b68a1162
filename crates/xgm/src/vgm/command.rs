//! Source event model: decoded VGM commands with classification predicates.
//!
//! This module defines the typed events that the VGM parser produces and the
//! predicate set the transcoder routes on. Only the Mega Drive subset is
//! modeled (YM2612 + SN76489 + DAC streams); everything the transcoder does
//! not understand is carried as [`VgmCommand::Reserved`] so it can be skipped
//! with a diagnostic instead of aborting the conversion.

/// YM2612 key on/off register.
pub const YM_KEY_REGISTER: u8 = 0x28;

/// One decoded entry of the source chip-log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VgmCommand {
    /// SN76489 write (opcode 0x50).
    PsgWrite { value: u8 },

    /// YM2612 register write (opcodes 0x52 / 0x53 for port 0 / 1).
    YmWrite { port: u8, register: u8, value: u8 },

    /// Wait an arbitrary number of samples (opcode 0x61).
    Wait { samples: u16 },

    /// Wait 735 samples, one 60 Hz frame (opcode 0x62).
    WaitNtsc,

    /// Wait 882 samples, one 50 Hz frame (opcode 0x63).
    WaitPal,

    /// Wait 1..=16 samples (opcodes 0x70-0x7F).
    WaitShort { samples: u8 },

    /// YM2612 DAC write from the current bank plus a short wait
    /// (opcodes 0x80-0x8F). Not representable in XGM v1; skipped by the
    /// transcoder with a diagnostic.
    YmPcmWriteWait { samples: u8 },

    /// Data block (opcode 0x67). Type 0x00 blocks carry YM2612 PCM banks.
    DataBlock { data_type: u8, data: Vec<u8> },

    /// DAC stream setup (opcode 0x90).
    SetupStream {
        stream_id: u8,
        chip_type: u8,
        port: u8,
        register: u8,
    },

    /// DAC stream data-bank assignment (opcode 0x91).
    SetStreamData {
        stream_id: u8,
        data_bank_id: u8,
        step_size: u8,
        step_base: u8,
    },

    /// DAC stream frequency (opcode 0x92).
    SetStreamFrequency { stream_id: u8, frequency: u32 },

    /// DAC stream stop (opcode 0x94).
    StopStream { stream_id: u8 },

    /// A resolved DAC stream play trigger (opcodes 0x93 / 0x95).
    ///
    /// The parser resolves both trigger forms against the running data-block
    /// origin map, so the event carries the sample's position in PCM space
    /// rather than a stream/block id. `channel` is the driver PCM channel
    /// (low two bits of the stream id).
    PlaySample {
        origin_addr: u32,
        origin_len: u32,
        channel: u8,
    },

    /// Synthetic loop-point marker inserted by the parser at the command the
    /// VGM header's loop offset points to.
    LoopPoint,

    /// End of sound data (opcode 0x66).
    End,

    /// A reserved or unsupported opcode with a known operand size.
    Reserved { opcode: u8 },
}

impl VgmCommand {
    /// True for any timing boundary (frame delimiter).
    pub fn is_wait(&self) -> bool {
        self.wait_samples().is_some()
    }

    /// Number of 44100 Hz samples this wait spans, if it is a wait.
    pub fn wait_samples(&self) -> Option<u32> {
        match self {
            VgmCommand::Wait { samples } => Some(*samples as u32),
            VgmCommand::WaitNtsc => Some(735),
            VgmCommand::WaitPal => Some(882),
            VgmCommand::WaitShort { samples } => Some(*samples as u32),
            _ => None,
        }
    }

    /// True when the wait unambiguously signals NTSC timing (735 samples).
    pub fn is_wait_ntsc(&self) -> bool {
        self.wait_samples() == Some(735)
    }

    /// True when the wait unambiguously signals PAL timing (882 samples).
    pub fn is_wait_pal(&self) -> bool {
        self.wait_samples() == Some(882)
    }

    pub fn is_loop(&self) -> bool {
        matches!(self, VgmCommand::LoopPoint)
    }

    pub fn is_data_block(&self) -> bool {
        matches!(self, VgmCommand::DataBlock { .. })
    }

    pub fn is_end(&self) -> bool {
        matches!(self, VgmCommand::End)
    }

    /// True for a resolved DAC stream play trigger.
    pub fn is_play_sample(&self) -> bool {
        matches!(self, VgmCommand::PlaySample { .. })
    }

    pub fn is_psg_write(&self) -> bool {
        matches!(self, VgmCommand::PsgWrite { .. })
    }

    /// True for any YM2612 register write.
    pub fn is_ym_write(&self) -> bool {
        matches!(self, VgmCommand::YmWrite { .. })
    }

    /// True for a write to the key on/off register (0x28, port 0 only).
    pub fn is_ym_key_write(&self) -> bool {
        matches!(
            self,
            VgmCommand::YmWrite {
                port: 0,
                register: YM_KEY_REGISTER,
                ..
            }
        )
    }

    /// True for a key write whose operator mask nibble is zero (key off).
    pub fn is_ym_key_off(&self) -> bool {
        match self {
            VgmCommand::YmWrite {
                port: 0,
                register: YM_KEY_REGISTER,
                value,
            } => value & 0xF0 == 0,
            _ => false,
        }
    }

    /// Channel selector of a key write (bits 0-2 of the value).
    ///
    /// Values 3 and 7 do not address a channel on the YM2612, but they are
    /// still distinct selectors for last-write-wins grouping purposes.
    pub fn ym_key_channel(&self) -> Option<u8> {
        match self {
            VgmCommand::YmWrite {
                port: 0,
                register: YM_KEY_REGISTER,
                value,
            } => Some(value & 0x07),
            _ => None,
        }
    }

    /// True for a YM2612 write addressed to port 0.
    pub fn is_ym_port0_write(&self) -> bool {
        matches!(self, VgmCommand::YmWrite { port: 0, .. })
    }
}
