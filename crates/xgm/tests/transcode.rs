use xgm::{Diagnostic, Region, SampleTableError, VgmCommand, VgmDocument, transcode};

fn doc(rate: u32, commands: Vec<VgmCommand>) -> VgmDocument {
    VgmDocument {
        version: 0x161,
        rate,
        commands,
    }
}

fn key(value: u8) -> VgmCommand {
    VgmCommand::YmWrite {
        port: 0,
        register: 0x28,
        value,
    }
}

fn encoded(vgm: &VgmDocument) -> Vec<Vec<u8>> {
    let out = transcode(vgm).expect("transcode failed");
    assert!(out.diagnostics.is_empty(), "unexpected {:?}", out.diagnostics);
    out.document
        .commands
        .iter()
        .map(|c| c.data().to_vec())
        .collect()
}

#[test]
fn every_frame_is_closed_by_a_frame_marker() {
    let vgm = doc(
        60,
        vec![
            VgmCommand::YmWrite {
                port: 0,
                register: 0xB0,
                value: 0x32,
            },
            VgmCommand::WaitNtsc,
            VgmCommand::PsgWrite { value: 0x9F },
            VgmCommand::End,
        ],
    );

    let out = transcode(&vgm).expect("transcode failed");
    assert_eq!(out.document.region, Region::Ntsc);
    assert_eq!(out.document.frame_count(), 2);
    assert_eq!(
        out.document
            .commands
            .iter()
            .map(|c| c.data().to_vec())
            .collect::<Vec<_>>(),
        vec![
            vec![0x20, 0xB0, 0x32],
            vec![0x00],
            vec![0x10, 0x9F],
            vec![0x7F],
            vec![0x00],
        ]
    );
}

#[test]
fn key_off_writes_are_deduplicated() {
    let vgm = doc(60, vec![key(0x00), key(0x01), key(0x00), VgmCommand::End]);
    assert_eq!(
        encoded(&vgm),
        vec![vec![0x41, 0x00, 0x01], vec![0x7F], vec![0x00]]
    );
}

#[test]
fn key_on_last_write_wins_per_channel() {
    // Channel 0 is written twice; the slot keeps its position but takes the
    // later value. Channel 1 follows in first-write order.
    let vgm = doc(60, vec![key(0xF0), key(0xF1), key(0x10), VgmCommand::End]);
    assert_eq!(
        encoded(&vgm),
        vec![vec![0x41, 0x10, 0xF1], vec![0x7F], vec![0x00]]
    );
}

#[test]
fn flush_order_is_fixed_not_arrival_order() {
    let vgm = doc(
        60,
        vec![
            VgmCommand::DataBlock {
                data_type: 0x00,
                data: vec![0u8; 256],
            },
            VgmCommand::PlaySample {
                origin_addr: 0,
                origin_len: 256,
                channel: 3,
            },
            VgmCommand::PsgWrite { value: 0xAA },
            VgmCommand::YmWrite {
                port: 1,
                register: 0xB4,
                value: 0xC0,
            },
            VgmCommand::YmWrite {
                port: 0,
                register: 0x22,
                value: 0x08,
            },
            key(0x02),
            key(0xF5),
            VgmCommand::End,
        ],
    );

    assert_eq!(
        encoded(&vgm),
        vec![
            vec![0x20, 0x22, 0x08], // YM port 0
            vec![0x30, 0xB4, 0xC0], // YM port 1
            vec![0x40, 0x02],       // key off
            vec![0x40, 0xF5],       // key on
            vec![0x10, 0xAA],       // PSG
            vec![0x53, 0x01],       // PCM channel 3, sample 1
            vec![0x7F],
            vec![0x00],
        ]
    );
}

#[test]
fn register_write_after_key_flushes_pending_buckets() {
    let vgm = doc(
        60,
        vec![
            key(0xF0),
            VgmCommand::YmWrite {
                port: 0,
                register: 0xB0,
                value: 0x11,
            },
            VgmCommand::WaitNtsc,
            VgmCommand::End,
        ],
    );

    // The key batch is emitted before the register write joins its bucket,
    // so the driver latches the strobe first.
    assert_eq!(
        encoded(&vgm),
        vec![
            vec![0x40, 0xF0],
            vec![0x20, 0xB0, 0x11],
            vec![0x00],
            vec![0x7F],
            vec![0x00],
        ]
    );
}

#[test]
fn loop_offset_counts_commands_finalized_before_its_frame() {
    let vgm = doc(
        60,
        vec![
            VgmCommand::PsgWrite { value: 0x9F },
            VgmCommand::WaitNtsc,
            VgmCommand::LoopPoint,
            VgmCommand::PsgWrite { value: 0x88 },
            VgmCommand::WaitNtsc,
            VgmCommand::End,
        ],
    );

    let out = transcode(&vgm).expect("transcode failed");
    assert_eq!(
        out.document
            .commands
            .iter()
            .map(|c| c.data().to_vec())
            .collect::<Vec<_>>(),
        vec![
            vec![0x10, 0x9F],
            vec![0x00],
            vec![0x10, 0x88],
            vec![0x00],
            vec![0x7E, 0x03, 0x00, 0x00],
            vec![0x00],
        ]
    );

    let marker = out.document.loop_command().expect("no loop marker");
    assert_eq!(marker.loop_offset(), Some(3));
    let target = out.document.loop_target().expect("no loop target");
    assert_eq!(target.data(), &[0x10, 0x88]);
}

#[test]
fn region_resolves_from_rate_then_first_tagged_wait() {
    // The header rate wins when it is conclusive.
    let out = transcode(&doc(50, vec![VgmCommand::WaitNtsc, VgmCommand::End]))
        .expect("transcode failed");
    assert_eq!(out.document.region, Region::Pal);

    // Otherwise the first NTSC/PAL-length wait decides.
    let out = transcode(&doc(0, vec![VgmCommand::WaitPal, VgmCommand::End]))
        .expect("transcode failed");
    assert_eq!(out.document.region, Region::Pal);

    let out = transcode(&doc(
        0,
        vec![
            VgmCommand::Wait { samples: 100 },
            VgmCommand::WaitNtsc,
            VgmCommand::End,
        ],
    ))
    .expect("transcode failed");
    assert_eq!(out.document.region, Region::Ntsc);

    // No conclusive signal at all: the region stays unresolved.
    let out = transcode(&doc(
        0,
        vec![VgmCommand::Wait { samples: 100 }, VgmCommand::End],
    ))
    .expect("transcode failed");
    assert_eq!(out.document.region, Region::Unknown);
    assert_eq!(out.document.region.frames_per_second(), 60);
}

#[test]
fn missing_sample_becomes_a_diagnostic() {
    let vgm = doc(
        60,
        vec![
            VgmCommand::DataBlock {
                data_type: 0x00,
                data: vec![0u8; 256],
            },
            VgmCommand::PlaySample {
                origin_addr: 0,
                origin_len: 256,
                channel: 2,
            },
            VgmCommand::WaitNtsc,
            VgmCommand::PlaySample {
                origin_addr: 0x1000,
                origin_len: 256,
                channel: 0,
            },
            VgmCommand::End,
        ],
    );

    let out = transcode(&vgm).expect("transcode failed");
    assert_eq!(out.document.samples.len(), 1);
    assert_eq!(
        out.diagnostics,
        vec![Diagnostic::MissingSample { origin_addr: 0x1000 }]
    );
    assert_eq!(
        out.document
            .commands
            .iter()
            .map(|c| c.data().to_vec())
            .collect::<Vec<_>>(),
        vec![vec![0x52, 0x01], vec![0x00], vec![0x7F], vec![0x00]]
    );
}

#[test]
fn unroutable_events_become_diagnostics_not_errors() {
    let vgm = doc(
        60,
        vec![
            VgmCommand::Reserved { opcode: 0x31 },
            VgmCommand::YmPcmWriteWait { samples: 5 },
            VgmCommand::SetupStream {
                stream_id: 0,
                chip_type: 0x02,
                port: 0,
                register: 0x2A,
            },
            VgmCommand::End,
        ],
    );

    let out = transcode(&vgm).expect("transcode failed");
    assert_eq!(out.diagnostics.len(), 3);
    assert!(
        out.diagnostics
            .iter()
            .all(|d| matches!(d, Diagnostic::UnsupportedEvent { .. }))
    );
    assert_eq!(
        out.document
            .commands
            .iter()
            .map(|c| c.data().to_vec())
            .collect::<Vec<_>>(),
        vec![vec![0x7F], vec![0x00]]
    );
}

#[test]
fn empty_log_still_yields_a_terminated_stream() {
    let out = transcode(&doc(60, Vec::new())).expect("transcode failed");
    assert_eq!(
        out.document
            .commands
            .iter()
            .map(|c| c.data().to_vec())
            .collect::<Vec<_>>(),
        vec![vec![0x7F], vec![0x00]]
    );
}

#[test]
fn batches_split_at_sixteen_entries() {
    let mut commands: Vec<VgmCommand> = (0..17u8)
        .map(|value| VgmCommand::PsgWrite { value })
        .collect();
    commands.push(VgmCommand::End);

    let out = transcode(&doc(60, commands)).expect("transcode failed");
    let first = out.document.commands[0].data();
    let second = out.document.commands[1].data();
    assert_eq!(first[0], 0x1F);
    assert_eq!(first.len(), 17);
    assert_eq!(second, &[0x10, 16]);
}

#[test]
fn sample_table_overflow_aborts_the_transcode() {
    let mut commands = vec![VgmCommand::DataBlock {
        data_type: 0x00,
        data: vec![0u8; 64 * 256],
    }];
    for i in 0..64u32 {
        commands.push(VgmCommand::PlaySample {
            origin_addr: i * 256,
            origin_len: 256,
            channel: 0,
        });
    }
    commands.push(VgmCommand::End);

    match transcode(&doc(60, commands)) {
        Err(SampleTableError::Capacity { demanded: 64 }) => {}
        other => panic!("expected capacity error, got {:?}", other),
    }
}
