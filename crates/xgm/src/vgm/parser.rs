//! VGM parser for the Mega Drive subset consumed by the transcoder.
//!
//! The parser is strict: it validates the `"Vgm "` ident, honors the
//! versioned `data_offset` fallback, and rejects opcodes it cannot size with
//! [`ParseError::UnknownOpcode`]. Reserved opcode ranges with a defined
//! operand count are carried through as [`VgmCommand::Reserved`] so the
//! transcoder can skip them with a diagnostic.
//!
//! Two pieces of stream state are resolved during parsing:
//! - the header loop offset (stored at 0x1C, relative to 0x1C) is turned
//!   into a synthetic [`VgmCommand::LoopPoint`] event at the matching
//!   command boundary;
//! - DAC stream play triggers (0x93 and 0x95) are resolved against the
//!   running type-0x00 data-block map into [`VgmCommand::PlaySample`]
//!   events carrying absolute PCM-space origins.
use crate::binutil::{ParseError, read_slice, read_u8_at, read_u16_le_at, read_u32_le_at};
use crate::vgm::command::VgmCommand;
use crate::vgm::document::VgmDocument;

/// Minimum VGM header size accepted; files older than v1.50 start their
/// command data at this fixed offset.
const VGM_LEGACY_DATA_START: usize = 0x40;

/// Parse a complete VGM byte stream into a [`VgmDocument`].
///
/// Commands are decoded starting at the header's data offset until an
/// end-of-sound-data command (0x66) or the end of the buffer. GD3 metadata
/// and extra headers are not needed by the compiler and are never reached
/// (the end command precedes them).
pub(crate) fn parse_vgm(bytes: &[u8]) -> Result<VgmDocument, ParseError> {
    if bytes.len() < VGM_LEGACY_DATA_START {
        return Err(ParseError::HeaderTooShort("vgm: base header (0x40)".into()));
    }

    let ident = read_slice(bytes, 0x00, 4, "vgm_ident")?;
    if ident != b"Vgm " {
        let mut id: [u8; 4] = [0; 4];
        id.copy_from_slice(ident);
        return Err(ParseError::InvalidIdent(id));
    }

    let version = read_u32_le_at(bytes, 0x08)?;
    let rate = read_u32_le_at(bytes, 0x24)?;

    // Loop offset is stored relative to its own header field at 0x1C.
    let loop_offset = read_u32_le_at(bytes, 0x1C)?;
    let loop_start = (loop_offset != 0).then(|| 0x1Cusize.wrapping_add(loop_offset as usize));

    // data_offset (0x34, relative to 0x34) exists from v1.50 on; zero or
    // pre-1.50 means the legacy fixed data start.
    let data_offset = if version >= 0x0000_0150 {
        read_u32_le_at(bytes, 0x34)?
    } else {
        0
    };
    let data_start = if data_offset == 0 {
        VGM_LEGACY_DATA_START
    } else {
        0x34usize.wrapping_add(data_offset as usize)
    };

    let mut commands: Vec<VgmCommand> = Vec::new();

    // Running map of type-0x00 data blocks in PCM space, used to resolve
    // stream play triggers: (base, length) per block plus the running total.
    let mut pcm_blocks: Vec<(u32, u32)> = Vec::new();
    let mut pcm_total: u32 = 0;

    let mut off = data_start;
    while off < bytes.len() {
        if loop_start == Some(off) {
            commands.push(VgmCommand::LoopPoint);
        }

        let (command, consumed) = parse_vgm_command(bytes, off, &pcm_blocks, pcm_total)?;
        off = off.wrapping_add(consumed);

        if let VgmCommand::DataBlock { data_type: 0x00, data } = &command {
            let len = data.len() as u32;
            pcm_blocks.push((pcm_total, len));
            pcm_total = pcm_total.wrapping_add(len);
        }

        let is_end = command.is_end();
        commands.push(command);
        if is_end {
            break;
        }
    }

    Ok(VgmDocument {
        version,
        rate,
        commands,
    })
}

/// Decode one VGM command at `off`, returning the command and the number of
/// bytes consumed (opcode plus payload).
fn parse_vgm_command(
    bytes: &[u8],
    off: usize,
    pcm_blocks: &[(u32, u32)],
    pcm_total: u32,
) -> Result<(VgmCommand, usize), ParseError> {
    let opcode = read_u8_at(bytes, off)?;

    match opcode {
        0x50 => {
            let value = read_u8_at(bytes, off + 1)?;
            Ok((VgmCommand::PsgWrite { value }, 2))
        }
        0x52 | 0x53 => {
            let register = read_u8_at(bytes, off + 1)?;
            let value = read_u8_at(bytes, off + 2)?;
            Ok((
                VgmCommand::YmWrite {
                    port: opcode & 0x01,
                    register,
                    value,
                },
                3,
            ))
        }
        0x61 => {
            let samples = read_u16_le_at(bytes, off + 1)?;
            Ok((VgmCommand::Wait { samples }, 3))
        }
        0x62 => Ok((VgmCommand::WaitNtsc, 1)),
        0x63 => Ok((VgmCommand::WaitPal, 1)),
        0x66 => Ok((VgmCommand::End, 1)),
        0x67 => {
            // 0x67 0x66 tt ss ss ss ss, then ss bytes of block data.
            let data_type = read_u8_at(bytes, off + 2)?;
            let size = (read_u32_le_at(bytes, off + 3)? & 0x7FFF_FFFF) as usize;
            let data = read_slice(bytes, off + 7, size, "data_block")?.to_vec();
            Ok((VgmCommand::DataBlock { data_type, data }, 7 + size))
        }
        0x70..=0x7F => Ok((
            VgmCommand::WaitShort {
                samples: (opcode & 0x0F) + 1,
            },
            1,
        )),
        0x80..=0x8F => Ok((
            VgmCommand::YmPcmWriteWait {
                samples: opcode & 0x0F,
            },
            1,
        )),
        0x90 => Ok((
            VgmCommand::SetupStream {
                stream_id: read_u8_at(bytes, off + 1)?,
                chip_type: read_u8_at(bytes, off + 2)?,
                port: read_u8_at(bytes, off + 3)?,
                register: read_u8_at(bytes, off + 4)?,
            },
            5,
        )),
        0x91 => Ok((
            VgmCommand::SetStreamData {
                stream_id: read_u8_at(bytes, off + 1)?,
                data_bank_id: read_u8_at(bytes, off + 2)?,
                step_size: read_u8_at(bytes, off + 3)?,
                step_base: read_u8_at(bytes, off + 4)?,
            },
            5,
        )),
        0x92 => Ok((
            VgmCommand::SetStreamFrequency {
                stream_id: read_u8_at(bytes, off + 1)?,
                frequency: read_u32_le_at(bytes, off + 2)?,
            },
            6,
        )),
        0x93 => {
            let stream_id = read_u8_at(bytes, off + 1)?;
            let origin_addr = read_u32_le_at(bytes, off + 2)?;
            let length_mode = read_u8_at(bytes, off + 6)?;
            let data_length = read_u32_le_at(bytes, off + 7)?;
            // Length mode 3 plays until the end of the containing block;
            // for YM2612 DAC streams the other modes count bytes.
            let origin_len = if length_mode & 0x03 == 0x03 {
                pcm_total.saturating_sub(origin_addr)
            } else {
                data_length
            };
            Ok((
                VgmCommand::PlaySample {
                    origin_addr,
                    origin_len,
                    channel: stream_id & 0x03,
                },
                11,
            ))
        }
        0x94 => Ok((
            VgmCommand::StopStream {
                stream_id: read_u8_at(bytes, off + 1)?,
            },
            2,
        )),
        0x95 => {
            let stream_id = read_u8_at(bytes, off + 1)?;
            let block_id = read_u16_le_at(bytes, off + 2)? as usize;
            let _flags = read_u8_at(bytes, off + 4)?;
            let (origin_addr, origin_len) =
                *pcm_blocks.get(block_id).ok_or_else(|| {
                    ParseError::Other(format!(
                        "fast-call references unknown data block {} at offset 0x{:X}",
                        block_id, off
                    ))
                })?;
            Ok((
                VgmCommand::PlaySample {
                    origin_addr,
                    origin_len,
                    channel: stream_id & 0x03,
                },
                5,
            ))
        }
        // Reserved opcode ranges with a defined operand count: carried
        // through so the transcoder can skip them with a diagnostic.
        0x30..=0x3F | 0x4F => reserved(bytes, off, opcode, 2),
        0x40..=0x4E | 0x51 | 0x54..=0x5F | 0xA0..=0xBF => reserved(bytes, off, opcode, 3),
        0xC0..=0xDF => reserved(bytes, off, opcode, 4),
        0xE0..=0xFF => reserved(bytes, off, opcode, 5),
        // PCM RAM write (0x68 0x66 cc oo oo oo dd dd dd ss ss ss).
        0x68 => reserved(bytes, off, opcode, 12),
        _ => Err(ParseError::UnknownOpcode { opcode, offset: off }),
    }
}

/// Consume a reserved opcode of `size` total bytes after bounds-checking.
fn reserved(
    bytes: &[u8],
    off: usize,
    opcode: u8,
    size: usize,
) -> Result<(VgmCommand, usize), ParseError> {
    read_slice(bytes, off, size, "reserved_command")?;
    Ok((VgmCommand::Reserved { opcode }, size))
}
