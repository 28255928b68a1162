//! Sample-bank extraction from a decoded VGM command stream.
//!
//! Type 0x00 data blocks carry YM2612 PCM banks; play triggers reference
//! positions inside that PCM space. This module rebuilds the banks in source
//! order and delimits the raw samples the triggers actually reference, so
//! the sample-table builder can import them.

use crate::vgm::command::VgmCommand;

/// Sample payload storage granularity. Raw sample payloads are zero-padded
/// up to a multiple of this before they reach the sample-table builder.
pub const SAMPLE_ALIGN: usize = 256;

/// One raw PCM sample delimited inside a bank.
///
/// `origin_addr`/`origin_len` form the origin key used for deduplication
/// downstream; `data` is the payload sliced from the bank and zero-padded to
/// the 256-byte storage granularity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSample {
    pub origin_addr: u32,
    pub origin_len: u32,
    pub data: Vec<u8>,
}

/// One PCM bank rebuilt from a type-0x00 data block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleBank {
    /// Base address of this bank in the concatenated PCM space.
    pub base: u32,
    /// Raw bank bytes as logged.
    pub data: Vec<u8>,
    /// Samples delimited inside this bank, in first-reference order.
    pub samples: Vec<RawSample>,
}

impl SampleBank {
    /// True when `addr` falls inside this bank's PCM-space range.
    fn contains(&self, addr: u32) -> bool {
        addr >= self.base && (addr - self.base) < self.data.len() as u32
    }

    /// Slice `len` bytes starting at PCM-space address `addr`, clamped to the
    /// bank end and zero-padded up to the storage granularity.
    fn slice_padded(&self, addr: u32, len: u32) -> Vec<u8> {
        let start = (addr - self.base) as usize;
        let end = (start + len as usize).min(self.data.len());
        let mut data = self.data[start..end].to_vec();
        let rem = data.len() % SAMPLE_ALIGN;
        if rem != 0 || data.is_empty() {
            data.resize(data.len() + (SAMPLE_ALIGN - rem), 0);
        }
        data
    }
}

/// Rebuild the ordered PCM banks from `commands` and delimit the raw samples
/// referenced by play triggers.
///
/// Banks are visited in source order; samples within a bank appear in the
/// order of their first referencing trigger. Repeated triggers for the same
/// origin address do not duplicate the sample inside the bank (table-level
/// deduplication across banks is the import step's concern).
pub fn collect_sample_banks(commands: &[VgmCommand]) -> Vec<SampleBank> {
    let mut banks: Vec<SampleBank> = Vec::new();
    let mut total: u32 = 0;

    for command in commands {
        if let VgmCommand::DataBlock { data_type: 0x00, data } = command {
            let len = data.len() as u32;
            banks.push(SampleBank {
                base: total,
                data: data.clone(),
                samples: Vec::new(),
            });
            total = total.wrapping_add(len);
        }
    }

    for command in commands {
        if let VgmCommand::PlaySample {
            origin_addr,
            origin_len,
            ..
        } = command
        {
            if let Some(bank) = banks.iter_mut().find(|b| b.contains(*origin_addr))
                && !bank.samples.iter().any(|s| s.origin_addr == *origin_addr)
            {
                let data = bank.slice_padded(*origin_addr, *origin_len);
                bank.samples.push(RawSample {
                    origin_addr: *origin_addr,
                    origin_len: *origin_len,
                    data,
                });
            }
        }
    }

    banks
}
