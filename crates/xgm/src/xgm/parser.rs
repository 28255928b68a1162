//! XGM container parser.
//!
//! Decodes a serialized container back into an [`XgmDocument`]: magic check,
//! 63-entry sample directory with sentinel skipping, payload recovery,
//! version/flags, then the command stream.
use crate::binutil::{ParseError, read_slice, read_u8_at, read_u16_le_at, read_u32_le_at};
use crate::xgm::command::{XgmCommand, opcode};
use crate::xgm::document::{Region, XGM_HEADER_SIZE, XGM_IDENT, XgmDocument};
use crate::xgm::sample::{XgmSample, from_stored};

/// Parse a complete XGM container from a byte slice.
pub(crate) fn parse_xgm(bytes: &[u8]) -> Result<XgmDocument, ParseError> {
    if bytes.len() < XGM_HEADER_SIZE {
        return Err(ParseError::HeaderTooShort("xgm: header (0x104)".into()));
    }

    let ident = read_slice(bytes, 0x000, 4, "xgm_ident")?;
    if ident != XGM_IDENT {
        let mut id: [u8; 4] = [0; 4];
        id.copy_from_slice(ident);
        return Err(ParseError::InvalidIdent(id));
    }

    // Sample directory: 63 slots of (offset/256, length/256). A slot whose
    // offset field is the 0xFFFF sentinel is unused. The recovered origin
    // key is the sample's position in the stored sample block.
    let mut samples: Vec<XgmSample> = Vec::new();
    for slot in 0..63usize {
        let entry = 0x004 + slot * 4;
        let offset = read_u16_le_at(bytes, entry)?;
        let length = read_u16_le_at(bytes, entry + 2)?;
        if offset == 0xFFFF {
            continue;
        }

        let start = XGM_HEADER_SIZE + ((offset as usize) << 8);
        let len = (length as usize) << 8;
        let data = read_slice(bytes, start, len, "sample_data")?.to_vec();
        samples.push(from_stored(slot as u8 + 1, (offset as u32) << 8, data));
    }

    let sample_block_size = (read_u16_le_at(bytes, 0x100)? as usize) << 8;
    let _version = read_u8_at(bytes, 0x102)?;
    let flags = read_u8_at(bytes, 0x103)?;
    let region = if flags & 0x01 != 0 {
        Region::Pal
    } else {
        Region::Ntsc
    };

    let music_offset = XGM_HEADER_SIZE + sample_block_size;
    let music_len = read_u32_le_at(bytes, music_offset)? as usize;
    let music = read_slice(bytes, music_offset + 4, music_len, "music_data")?;

    let commands = parse_music(music)?;

    Ok(XgmDocument {
        samples,
        commands,
        region,
    })
}

/// Decode the command stream.
///
/// Decoding stops when the declared length is exhausted or at the first end
/// marker; since the end marker always sits immediately before the closing
/// frame marker, that frame marker is consumed too so a serialize/parse
/// round trip preserves the stream byte for byte. Loop markers never stop
/// decoding (the final frame follows them naturally).
fn parse_music(music: &[u8]) -> Result<Vec<XgmCommand>, ParseError> {
    let mut commands: Vec<XgmCommand> = Vec::new();
    let mut off = 0usize;

    while off < music.len() {
        let (command, consumed) = XgmCommand::decode(music, off)?;
        off += consumed;

        let stop = command.is_end();
        commands.push(command);
        if stop {
            if off < music.len() && music[off] == opcode::FRAME {
                commands.push(XgmCommand::frame());
            }
            break;
        }
    }

    Ok(commands)
}
