//! Sample table construction with index assignment.
//!
//! The builder walks the extracted banks in source order and imports their
//! raw samples. Import may refuse a sample (duplicate origin key, empty
//! payload); admitted samples receive the next sequential 1-based index.
//! Slot 0 is reserved by the driver, so at most 63 samples fit; demanding a
//! 64th is an explicit error, never a silent truncation.
use crate::vgm::bank::{RawSample, SAMPLE_ALIGN, SampleBank};
use std::fmt;

/// Maximum number of samples the container directory can hold.
pub const MAX_SAMPLES: usize = 63;

/// One entry of the sample table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XgmSample {
    /// 1-based directory index (1..=63), unique, assigned in insertion order.
    pub index: u8,
    /// Origin address in the source PCM space; dedup key together with
    /// `origin_len`.
    pub origin_addr: u32,
    /// Origin length in the source PCM space (pre-padding).
    pub origin_len: u32,
    data: Vec<u8>,
}

impl XgmSample {
    /// The stored payload. Always a multiple of 256 bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Stored payload length in bytes.
    pub fn data_len(&self) -> usize {
        self.data.len()
    }
}

/// Errors surfaced by the sample-table builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleTableError {
    /// More than [`MAX_SAMPLES`] distinct samples were demanded.
    Capacity { demanded: usize },

    /// A payload length was not a multiple of the 256-byte storage
    /// granularity. The extraction step owns the padding obligation; a
    /// violation here means the input was constructed by hand.
    UnalignedPayload { origin_addr: u32, len: usize },
}

impl fmt::Display for SampleTableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleTableError::Capacity { demanded } => {
                write!(
                    f,
                    "sample table full: {} samples demanded, at most {} fit",
                    demanded, MAX_SAMPLES
                )
            }
            SampleTableError::UnalignedPayload { origin_addr, len } => {
                write!(
                    f,
                    "sample at origin 0x{:X} has payload length {} (must be a multiple of {})",
                    origin_addr, len, SAMPLE_ALIGN
                )
            }
        }
    }
}

impl std::error::Error for SampleTableError {}

/// Build the ordered sample table from the extracted banks.
///
/// Banks are visited in source order, samples within a bank in source order.
/// A sample whose origin address is already in the table is refused by the
/// import step; admitted samples get index `table len + 1`.
pub fn build_sample_table(banks: &[SampleBank]) -> Result<Vec<XgmSample>, SampleTableError> {
    let mut table: Vec<XgmSample> = Vec::new();

    for bank in banks {
        for raw in &bank.samples {
            let Some(sample) = import_sample(raw, &table)? else {
                continue;
            };
            table.push(sample);
        }
    }

    Ok(table)
}

/// Decide admission of one raw sample and assign its index.
///
/// Returns `Ok(None)` when the sample is refused (duplicate origin or empty
/// payload), `Err` on capacity exhaustion or a granularity violation.
fn import_sample(
    raw: &RawSample,
    table: &[XgmSample],
) -> Result<Option<XgmSample>, SampleTableError> {
    if raw.data.is_empty() {
        return Ok(None);
    }
    if table.iter().any(|s| s.origin_addr == raw.origin_addr) {
        return Ok(None);
    }
    if raw.data.len() % SAMPLE_ALIGN != 0 {
        return Err(SampleTableError::UnalignedPayload {
            origin_addr: raw.origin_addr,
            len: raw.data.len(),
        });
    }
    if table.len() >= MAX_SAMPLES {
        return Err(SampleTableError::Capacity {
            demanded: table.len() + 1,
        });
    }

    Ok(Some(XgmSample {
        index: table.len() as u8 + 1,
        origin_addr: raw.origin_addr,
        origin_len: raw.origin_len,
        data: raw.data.clone(),
    }))
}

/// Construct a sample directly; used by the container parser, where the
/// origin key is the sample's position in the stored sample block.
pub(crate) fn from_stored(index: u8, origin_addr: u32, data: Vec<u8>) -> XgmSample {
    let origin_len = data.len() as u32;
    XgmSample {
        index,
        origin_addr,
        origin_len,
        data,
    }
}
