//! Frame reclassifier: VGM event stream to XGM command stream.
//!
//! The source log is processed as a series of frames, each delimited by a
//! wait (or the end of data). Within a frame, events are filed into six
//! pending buckets by destination subsystem and flushed into encoded
//! commands in a fixed order: YM port 0, YM port 1, key-off, key-on/other,
//! PSG, PCM. A flush also happens mid-frame whenever a generic YM register
//! write directly follows a key write, so a key strobe is never reordered
//! past a later register write once events are regrouped by destination.
//!
//! The first loop-point event records the resume offset: the byte length of
//! everything already flushed from previous frames (the in-progress frame is
//! not yet counted). After the last frame's flush, exactly one terminal
//! marker is appended (the loop marker if an offset was recorded, the end
//! marker otherwise), and every frame, terminal included, is closed by one
//! frame marker.
use crate::vgm::bank::collect_sample_banks;
use crate::vgm::command::VgmCommand;
use crate::vgm::VgmDocument;
use crate::xgm::command::XgmCommand;
use crate::xgm::document::{Region, XgmDocument};
use crate::xgm::sample::{SampleTableError, XgmSample, build_sample_table};
use std::fmt;

/// Non-fatal condition encountered during transcoding. The event in question
/// is skipped and processing continues; the caller decides whether and how
/// to report these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// An event the source model recognizes but the reclassifier cannot
    /// route (reserved writes, stream control, DAC write-and-wait).
    UnsupportedEvent { event: String },

    /// A PCM play trigger whose origin has no sample-table entry.
    MissingSample { origin_addr: u32 },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnsupportedEvent { event } => write!(f, "event ignored: {}", event),
            Diagnostic::MissingSample { origin_addr } => {
                write!(f, "no sample for PCM trigger at origin 0x{:X}", origin_addr)
            }
        }
    }
}

/// Result of a transcode: the compiled document plus the diagnostics
/// collected along the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeOutput {
    pub document: XgmDocument,
    pub diagnostics: Vec<Diagnostic>,
}

/// Per-frame pending buckets, one per destination subsystem.
#[derive(Default)]
struct Buckets {
    ym_port0: Vec<(u8, u8)>,
    ym_port1: Vec<(u8, u8)>,
    /// Key-off values, deduplicated on append.
    ym_key_off: Vec<u8>,
    /// Key-on/other values keyed by channel selector, insertion-ordered;
    /// a later write to the same channel overwrites the stored value.
    ym_key_on: Vec<(u8, u8)>,
    psg: Vec<u8>,
    /// Pending PCM triggers: (origin address, channel).
    pcm: Vec<(u32, u8)>,
}

impl Buckets {
    /// Flush all non-empty buckets into `out` in the fixed order, then clear.
    fn flush(
        &mut self,
        out: &mut Vec<XgmCommand>,
        samples: &[XgmSample],
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        if !self.ym_port0.is_empty() {
            out.extend(XgmCommand::ym_port0_batches(&self.ym_port0));
            self.ym_port0.clear();
        }
        if !self.ym_port1.is_empty() {
            out.extend(XgmCommand::ym_port1_batches(&self.ym_port1));
            self.ym_port1.clear();
        }
        if !self.ym_key_off.is_empty() {
            out.extend(XgmCommand::ym_key_batches(&self.ym_key_off));
            self.ym_key_off.clear();
        }
        if !self.ym_key_on.is_empty() {
            let values: Vec<u8> = self.ym_key_on.iter().map(|(_, v)| *v).collect();
            out.extend(XgmCommand::ym_key_batches(&values));
            self.ym_key_on.clear();
        }
        if !self.psg.is_empty() {
            out.extend(XgmCommand::psg_batches(&self.psg));
            self.psg.clear();
        }
        for (origin_addr, channel) in self.pcm.drain(..) {
            match samples.iter().find(|s| s.origin_addr == origin_addr) {
                Some(sample) => out.push(XgmCommand::pcm_play(channel, sample.index)),
                None => diagnostics.push(Diagnostic::MissingSample { origin_addr }),
            }
        }
    }
}

/// Transcode a decoded VGM log into a compiled XGM document.
///
/// Fails only on sample-table construction (capacity exhaustion or a
/// granularity violation); unroutable events become diagnostics instead.
pub fn transcode(vgm: &VgmDocument) -> Result<TranscodeOutput, SampleTableError> {
    let mut region = match vgm.rate {
        60 => Region::Ntsc,
        50 => Region::Pal,
        _ => Region::Unknown,
    };

    let banks = collect_sample_banks(&vgm.commands);
    let samples = build_sample_table(&banks)?;

    let mut commands: Vec<XgmCommand> = Vec::new();
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    let mut loop_offset: Option<u32> = None;

    let source = &vgm.commands;
    let mut cursor = 0usize;

    while cursor < source.len() {
        // Collect this frame's working set: everything up to the next wait
        // or end event. Loop points record the resume offset over the
        // commands finalized so far; data blocks were consumed by the
        // sample extraction pass.
        let mut frame: Vec<&VgmCommand> = Vec::new();
        while cursor < source.len() {
            let event = &source[cursor];
            cursor += 1;

            if event.is_loop() {
                if loop_offset.is_none() {
                    let finalized: usize = commands.iter().map(XgmCommand::size).sum();
                    loop_offset = Some(finalized as u32);
                }
                continue;
            }
            if event.is_data_block() {
                continue;
            }
            if event.is_wait() {
                if region == Region::Unknown {
                    if event.is_wait_pal() {
                        region = Region::Pal;
                    } else if event.is_wait_ntsc() {
                        region = Region::Ntsc;
                    }
                }
                break;
            }
            if event.is_end() {
                break;
            }

            frame.push(event);
        }

        let mut buckets = Buckets::default();
        let mut last_was_key = false;

        for event in frame {
            match event {
                VgmCommand::PlaySample {
                    origin_addr,
                    channel,
                    ..
                } => buckets.pcm.push((*origin_addr, *channel)),
                VgmCommand::PsgWrite { value } => buckets.psg.push(*value),
                VgmCommand::YmWrite { value, .. } if event.is_ym_key_write() => {
                    if event.is_ym_key_off() {
                        if !buckets.ym_key_off.contains(value) {
                            buckets.ym_key_off.push(*value);
                        }
                    } else {
                        // Last write wins per channel, in first-write order.
                        let channel = event.ym_key_channel().unwrap_or(0);
                        match buckets.ym_key_on.iter_mut().find(|(c, _)| *c == channel) {
                            Some(slot) => slot.1 = *value,
                            None => buckets.ym_key_on.push((channel, *value)),
                        }
                    }
                    last_was_key = true;
                }
                VgmCommand::YmWrite {
                    port,
                    register,
                    value,
                } => {
                    // The driver must latch a key strobe before any later
                    // register write: flush everything pending before this
                    // write joins its bucket.
                    if last_was_key {
                        buckets.flush(&mut commands, &samples, &mut diagnostics);
                        last_was_key = false;
                    }
                    if *port == 0 {
                        buckets.ym_port0.push((*register, *value));
                    } else {
                        buckets.ym_port1.push((*register, *value));
                    }
                }
                other => diagnostics.push(Diagnostic::UnsupportedEvent {
                    event: format!("{:?}", other),
                }),
            }
        }

        buckets.flush(&mut commands, &samples, &mut diagnostics);

        // Last frame: append the terminal marker before closing the frame.
        if cursor >= source.len() {
            commands.push(match loop_offset {
                Some(offset) => XgmCommand::loop_marker(offset),
                None => XgmCommand::end(),
            });
        }

        commands.push(XgmCommand::frame());
    }

    // An empty source log still yields a well-formed stream.
    if commands.is_empty() {
        commands.push(XgmCommand::end());
        commands.push(XgmCommand::frame());
    }

    Ok(TranscodeOutput {
        document: XgmDocument {
            samples,
            commands,
            region,
        },
        diagnostics,
    })
}
