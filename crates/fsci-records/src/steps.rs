//! Channel-sounding step lists.
//!
//! A step is `mode(1) channel(1) len(1) data(len)`. The total size of a list
//! is only known after walking every step header, so decoding measures the
//! list first and then copies it into a buffer of exactly that size.

use fsci_frame::{WireError, WireReader, WireResult, WireWriter};
use serde::Serialize;

use crate::marshal::Marshal;

/// Bytes preceding each step's data.
pub const STEP_HEADER_SIZE: usize = 3;

/// Most steps one event can carry; the count goes on the wire as a `u8`.
pub const MAX_STEPS_PER_EVENT: usize = u8::MAX as usize;

/// Walk `count` step headers at the front of `buf` and return the byte
/// length of the whole list. No step data is copied.
pub fn measure_steps(buf: &[u8], count: usize) -> WireResult<usize> {
    let mut offset = 0usize;
    for _ in 0..count {
        let header_end = offset + STEP_HEADER_SIZE;
        if buf.len() < header_end {
            return Err(WireError::Truncated {
                field: "step_header",
                needed: header_end - offset,
                remaining: buf.len() - offset,
            });
        }
        let data_len = usize::from(buf[offset + 2]);
        let step_end = header_end + data_len;
        if buf.len() < step_end {
            return Err(WireError::Truncated {
                field: "step_data",
                needed: data_len,
                remaining: buf.len() - header_end,
            });
        }
        offset = step_end;
    }
    Ok(offset)
}

/// One step borrowed from a [`StepList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepRef<'a> {
    pub mode: u8,
    pub channel: u8,
    pub data: &'a [u8],
}

/// A run of steps stored back to back in their wire form.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct StepList {
    count: usize,
    #[serde(with = "hex_bytes")]
    data: Vec<u8>,
}

impl StepList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The whole list in wire form, headers included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn push(&mut self, mode: u8, channel: u8, data: &[u8]) -> WireResult<()> {
        let len = u8::try_from(data.len()).map_err(|_| WireError::LengthOverflow {
            field: "step_data",
            len: data.len(),
        })?;
        self.data.reserve(STEP_HEADER_SIZE + data.len());
        self.data.extend_from_slice(&[mode, channel, len]);
        self.data.extend_from_slice(data);
        self.count += 1;
        Ok(())
    }

    /// Move every step of `other` onto the end of this list, provided the
    /// joined list stays within `max_bytes`. On failure both lists are left
    /// as they were.
    pub fn try_append(&mut self, other: &mut StepList, max_bytes: usize) -> WireResult<()> {
        let requested = self.data.len() + other.data.len();
        let out_of_memory = WireError::OutOfMemory {
            field: "steps",
            requested,
        };
        if requested > max_bytes {
            return Err(out_of_memory);
        }
        self.data
            .try_reserve(other.data.len())
            .map_err(|_| out_of_memory)?;
        self.data.append(&mut other.data);
        self.count += other.count;
        other.count = 0;
        Ok(())
    }

    /// Split off every step after the longest prefix that fits in
    /// `max_bytes` and holds no more than [`MAX_STEPS_PER_EVENT`] steps,
    /// and return them. At least one step is kept when the list is not
    /// empty, whatever its size.
    pub fn split_off_after(&mut self, max_bytes: usize) -> StepList {
        let mut kept = 0usize;
        let mut offset = 0usize;
        for step in self.iter() {
            let step_len = STEP_HEADER_SIZE + step.data.len();
            if kept == MAX_STEPS_PER_EVENT || (kept > 0 && offset + step_len > max_bytes) {
                break;
            }
            offset += step_len;
            kept += 1;
        }
        let rest = StepList {
            count: self.count - kept,
            data: self.data.split_off(offset),
        };
        self.count = kept;
        rest
    }

    pub fn iter(&self) -> Steps<'_> {
        Steps {
            rest: &self.data,
        }
    }

    /// Read `count` steps: measure the list, allocate exactly that many
    /// bytes, then copy the list in one go.
    pub fn decode_steps(r: &mut WireReader<'_>, count: usize) -> WireResult<Self> {
        let total = measure_steps(r.peek(), count)?;
        let mut data = r.alloc("steps", total)?;
        data.extend_from_slice(r.slice("steps", total)?);
        Ok(Self { count, data })
    }
}

impl<'a> IntoIterator for &'a StepList {
    type Item = StepRef<'a>;
    type IntoIter = Steps<'a>;

    fn into_iter(self) -> Steps<'a> {
        self.iter()
    }
}

/// Iterator over the steps of a [`StepList`].
#[derive(Debug, Clone)]
pub struct Steps<'a> {
    rest: &'a [u8],
}

impl<'a> Iterator for Steps<'a> {
    type Item = StepRef<'a>;

    fn next(&mut self) -> Option<StepRef<'a>> {
        let (&[mode, channel, len], tail) = self.rest.split_first_chunk::<STEP_HEADER_SIZE>()?;
        let len = usize::from(len).min(tail.len());
        let (data, rest) = tail.split_at(len);
        self.rest = rest;
        Some(StepRef {
            mode,
            channel,
            data,
        })
    }
}

/// Wire form: `num_steps(1)` then the steps.
impl Marshal for StepList {
    fn wire_size(&self) -> usize {
        1 + self.data.len()
    }

    fn encode(&self, w: &mut WireWriter) -> WireResult<()> {
        w.put_len_u8("num_steps_reported", self.count)?;
        w.put_slice(&self.data)
    }

    fn decode(r: &mut WireReader<'_>) -> WireResult<Self> {
        let count = r.u8("num_steps_reported")?;
        Self::decode_steps(r, usize::from(count))
    }
}

mod hex_bytes {
    use serde::Serializer;

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        let mut out = String::with_capacity(bytes.len() * 2);
        for byte in bytes {
            out.push_str(&format!("{byte:02x}"));
        }
        serializer.serialize_str(&out)
    }
}
