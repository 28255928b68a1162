use xgm::vgm::{RawSample, SampleBank};
use xgm::xgm::build_sample_table;
use xgm::{ParseError, Region, XgmCommand, XgmCommandKind, XgmDocument};

/// A document with two samples (512 and 256 bytes) and a one-frame stream.
fn two_sample_document() -> XgmDocument {
    let bank = SampleBank {
        base: 0,
        data: (0..768).map(|i| i as u8).collect(),
        samples: vec![
            RawSample {
                origin_addr: 0,
                origin_len: 512,
                data: (0..512).map(|i| i as u8).collect(),
            },
            RawSample {
                origin_addr: 512,
                origin_len: 256,
                data: (512..768).map(|i| i as u8).collect(),
            },
        ],
    };
    let samples = build_sample_table(&[bank]).expect("failed to build sample table");

    let mut commands = XgmCommand::psg_batches(&[0x9F]);
    commands.push(XgmCommand::frame());
    commands.push(XgmCommand::end());
    commands.push(XgmCommand::frame());

    XgmDocument {
        samples,
        commands,
        region: Region::Ntsc,
    }
}

fn u16_at(bytes: &[u8], off: usize) -> u16 {
    u16::from_le_bytes([bytes[off], bytes[off + 1]])
}

#[test]
fn serialized_layout_directory_and_totals() {
    let doc = two_sample_document();
    let bytes = doc.to_bytes();

    assert_eq!(&bytes[0x00..0x04], b"XGM ");

    // Directory entries hold offset/256 and length/256.
    assert_eq!(u16_at(&bytes, 0x004), 0);
    assert_eq!(u16_at(&bytes, 0x006), 2);
    assert_eq!(u16_at(&bytes, 0x008), 2);
    assert_eq!(u16_at(&bytes, 0x00A), 1);
    // First unused slot carries the sentinel; so does the last.
    assert_eq!(u16_at(&bytes, 0x00C), 0xFFFF);
    assert_eq!(u16_at(&bytes, 0x00E), 0x0000);
    assert_eq!(u16_at(&bytes, 0x004 + 62 * 4), 0xFFFF);

    // Sample block total, version, flags.
    assert_eq!(u16_at(&bytes, 0x100), 3);
    assert_eq!(bytes[0x102], 0x00);
    assert_eq!(bytes[0x103], 0x00);

    // Payloads sit back to back after the header.
    assert_eq!(bytes[0x104], 0);
    assert_eq!(bytes[0x104 + 512], 0); // 512 mod 256
    assert_eq!(bytes[0x104 + 767], 0xFF);

    // Music length then the raw command stream.
    let music_offset = 0x104 + 768;
    let music_len = u32::from_le_bytes([
        bytes[music_offset],
        bytes[music_offset + 1],
        bytes[music_offset + 2],
        bytes[music_offset + 3],
    ]);
    assert_eq!(music_len as usize, doc.music_data_size());
    assert_eq!(
        &bytes[music_offset + 4..],
        &[0x10, 0x9F, 0x00, 0x7F, 0x00]
    );
}

#[test]
fn parse_round_trip_is_byte_identical() {
    let doc = two_sample_document();
    let bytes = doc.to_bytes();

    let parsed = XgmDocument::try_from(bytes.as_slice()).expect("failed to parse container");
    assert_eq!(parsed.region, Region::Ntsc);
    assert_eq!(parsed.commands, doc.commands);
    assert_eq!(parsed.samples.len(), 2);
    assert_eq!(parsed.samples[0].index, 1);
    assert_eq!(parsed.samples[0].origin_addr, 0);
    assert_eq!(parsed.samples[0].data(), doc.samples[0].data());
    assert_eq!(parsed.samples[1].index, 2);
    assert_eq!(parsed.samples[1].origin_addr, 512);

    assert_eq!(parsed.to_bytes(), bytes);
}

#[test]
fn end_marker_consumes_its_closing_frame() {
    let doc = two_sample_document();
    let parsed =
        XgmDocument::try_from(doc.to_bytes().as_slice()).expect("failed to parse container");

    // The stream ends with the end marker plus its closing frame marker;
    // both survive the parse so the round trip stays byte-exact.
    let tail: Vec<XgmCommandKind> = parsed.commands.iter().map(|c| c.kind()).collect();
    assert_eq!(
        tail,
        vec![
            XgmCommandKind::Psg,
            XgmCommandKind::Frame,
            XgmCommandKind::End,
            XgmCommandKind::Frame,
        ]
    );
}

#[test]
fn empty_directory_parses_to_no_samples() {
    let doc = XgmDocument {
        samples: Vec::new(),
        commands: vec![XgmCommand::end(), XgmCommand::frame()],
        region: Region::Pal,
    };
    let bytes = doc.to_bytes();
    assert_eq!(u16_at(&bytes, 0x100), 0);

    let parsed = XgmDocument::try_from(bytes.as_slice()).expect("failed to parse container");
    assert!(parsed.samples.is_empty());
    assert_eq!(parsed.commands.len(), 2);
}

#[test]
fn region_flag_round_trip() {
    let mut doc = two_sample_document();
    doc.region = Region::Pal;
    let bytes = doc.to_bytes();
    assert_eq!(bytes[0x103], 0x01);
    let parsed = XgmDocument::try_from(bytes.as_slice()).expect("failed to parse container");
    assert_eq!(parsed.region, Region::Pal);

    // An unresolved region serializes as NTSC and parses back as such.
    doc.region = Region::Unknown;
    let bytes = doc.to_bytes();
    assert_eq!(bytes[0x103], 0x00);
    let parsed = XgmDocument::try_from(bytes.as_slice()).expect("failed to parse container");
    assert_eq!(parsed.region, Region::Ntsc);
}

#[test]
fn bad_magic_and_truncated_container() {
    let mut bytes = two_sample_document().to_bytes();
    bytes[0x00] = b'Y';
    match XgmDocument::try_from(bytes.as_slice()) {
        Err(ParseError::InvalidIdent(_)) => {}
        other => panic!("expected invalid ident, got {:?}", other),
    }

    match XgmDocument::try_from(&[0u8; 0x50][..]) {
        Err(ParseError::HeaderTooShort(_)) => {}
        other => panic!("expected short header error, got {:?}", other),
    }
}

#[test]
fn command_codec_round_trips_each_kind() {
    let mut stream: Vec<XgmCommand> = Vec::new();
    stream.extend(XgmCommand::psg_batches(&[0x9F, 0x80]));
    stream.extend(XgmCommand::ym_port0_batches(&[(0x30, 0x71), (0x34, 0x0D)]));
    stream.extend(XgmCommand::ym_port1_batches(&[(0xB4, 0xC0)]));
    stream.extend(XgmCommand::ym_key_batches(&[0xF0, 0x01]));
    stream.push(XgmCommand::pcm_play(2, 5));
    stream.push(XgmCommand::loop_marker(0x123456));
    stream.push(XgmCommand::frame());

    let mut bytes: Vec<u8> = Vec::new();
    for command in &stream {
        bytes.extend_from_slice(command.data());
    }

    let mut decoded: Vec<XgmCommand> = Vec::new();
    let mut off = 0;
    while off < bytes.len() {
        let (command, consumed) = XgmCommand::decode(&bytes, off).expect("decode failed");
        decoded.push(command);
        off += consumed;
    }
    assert_eq!(decoded, stream);
    assert_eq!(decoded[5].loop_offset(), Some(0x123456));
}

#[test]
fn command_decode_rejects_bad_input() {
    // 0x60-0x7D is unassigned in the opcode map.
    match XgmCommand::decode(&[0x60], 0) {
        Err(ParseError::UnknownOpcode { opcode: 0x60, offset: 0 }) => {}
        other => panic!("expected unknown opcode, got {:?}", other),
    }

    // A batch header whose payload is truncated.
    match XgmCommand::decode(&[0x21, 0x30], 0) {
        Err(ParseError::OffsetOutOfRange { .. }) => {}
        other => panic!("expected out of range error, got {:?}", other),
    }
}
