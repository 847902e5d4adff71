//! Forward-only payload cursors.
//!
//! All multi-byte integers are little-endian. Booleans and enums occupy one
//! byte. Every read checks the remaining length first and reports the field
//! that ran short.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{WireError, WireResult};

/// Default budget for variable-length buffers allocated while decoding one
/// record: 64 KiB.
pub const DEFAULT_MAX_RECORD_ALLOCATION: usize = 64 * 1024;

/// Limits applied by a [`WireReader`] to allocate-then-fill buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    /// Total bytes that may be allocated for sub-blocks of a single decode.
    pub max_record_allocation: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_record_allocation: DEFAULT_MAX_RECORD_ALLOCATION,
        }
    }
}

/// Bounds-checked reader over a payload slice.
#[derive(Debug)]
pub struct WireReader<'a> {
    buf: &'a [u8],
    consumed: usize,
    limits: DecodeLimits,
    allocated: usize,
}

impl<'a> WireReader<'a> {
    /// Create a reader with default limits.
    pub fn new(buf: &'a [u8]) -> Self {
        Self::with_limits(buf, DecodeLimits::default())
    }

    /// Create a reader with explicit allocation limits.
    pub fn with_limits(buf: &'a [u8], limits: DecodeLimits) -> Self {
        Self {
            buf,
            consumed: 0,
            limits,
            allocated: 0,
        }
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    /// Bytes consumed so far.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Bytes allocated for sub-blocks so far.
    pub fn allocated(&self) -> usize {
        self.allocated
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The unread bytes, without consuming them.
    pub fn peek(&self) -> &'a [u8] {
        self.buf
    }

    fn ensure(&self, field: &'static str, needed: usize) -> WireResult<()> {
        if self.buf.len() < needed {
            return Err(WireError::Truncated {
                field,
                needed,
                remaining: self.buf.len(),
            });
        }
        Ok(())
    }

    pub fn u8(&mut self, field: &'static str) -> WireResult<u8> {
        self.ensure(field, 1)?;
        self.consumed += 1;
        Ok(self.buf.get_u8())
    }

    pub fn i8(&mut self, field: &'static str) -> WireResult<i8> {
        self.ensure(field, 1)?;
        self.consumed += 1;
        Ok(self.buf.get_i8())
    }

    /// A boolean byte; any non-zero value reads as `true`.
    pub fn bool(&mut self, field: &'static str) -> WireResult<bool> {
        Ok(self.u8(field)? != 0)
    }

    pub fn u16(&mut self, field: &'static str) -> WireResult<u16> {
        self.ensure(field, 2)?;
        self.consumed += 2;
        Ok(self.buf.get_u16_le())
    }

    pub fn i16(&mut self, field: &'static str) -> WireResult<i16> {
        self.ensure(field, 2)?;
        self.consumed += 2;
        Ok(self.buf.get_i16_le())
    }

    /// A 3-byte little-endian integer.
    pub fn u24(&mut self, field: &'static str) -> WireResult<u32> {
        self.ensure(field, 3)?;
        self.consumed += 3;
        Ok(self.buf.get_uint_le(3) as u32)
    }

    pub fn u32(&mut self, field: &'static str) -> WireResult<u32> {
        self.ensure(field, 4)?;
        self.consumed += 4;
        Ok(self.buf.get_u32_le())
    }

    /// A fixed-length array whose size is known at compile time.
    pub fn array<const N: usize>(&mut self, field: &'static str) -> WireResult<[u8; N]> {
        self.ensure(field, N)?;
        let mut out = [0u8; N];
        self.buf.copy_to_slice(&mut out);
        self.consumed += N;
        Ok(out)
    }

    /// A one-byte enum, converted through its `TryFrom<u8>` impl.
    pub fn enum_u8<T: TryFrom<u8>>(&mut self, field: &'static str) -> WireResult<T> {
        let raw = self.u8(field)?;
        T::try_from(raw).map_err(|_| WireError::InvalidValue {
            field,
            value: u32::from(raw),
        })
    }

    /// Borrow `len` bytes without copying.
    pub fn slice(&mut self, field: &'static str, len: usize) -> WireResult<&'a [u8]> {
        self.ensure(field, len)?;
        let (head, tail) = self.buf.split_at(len);
        self.buf = tail;
        self.consumed += len;
        Ok(head)
    }

    pub fn skip(&mut self, field: &'static str, len: usize) -> WireResult<()> {
        self.slice(field, len).map(|_| ())
    }

    /// Allocate an empty vector with room for exactly `count` elements,
    /// charged against this reader's allocation budget.
    pub fn alloc_vec<T>(&mut self, field: &'static str, count: usize) -> WireResult<Vec<T>> {
        let requested = count.saturating_mul(std::mem::size_of::<T>());
        let total = self.allocated.saturating_add(requested);
        if total > self.limits.max_record_allocation {
            return Err(WireError::OutOfMemory { field, requested });
        }
        let mut out = Vec::new();
        out.try_reserve_exact(count)
            .map_err(|_| WireError::OutOfMemory { field, requested })?;
        self.allocated = total;
        Ok(out)
    }

    /// Allocate an empty byte buffer with exactly `len` bytes of capacity.
    pub fn alloc(&mut self, field: &'static str, len: usize) -> WireResult<Vec<u8>> {
        self.alloc_vec(field, len)
    }

    /// Fail unless every byte has been consumed.
    pub fn finish(&self) -> WireResult<()> {
        if !self.buf.is_empty() {
            return Err(WireError::TrailingBytes {
                count: self.buf.len(),
            });
        }
        Ok(())
    }

    /// Allocate `len` bytes, then fill them from the payload.
    pub fn bytes(&mut self, field: &'static str, len: usize) -> WireResult<Vec<u8>> {
        let mut out = self.alloc(field, len)?;
        out.extend_from_slice(self.slice(field, len)?);
        Ok(out)
    }

    /// A byte string prefixed by a one-byte length.
    pub fn bytes_u8(&mut self, field: &'static str) -> WireResult<Vec<u8>> {
        let len = self.u8(field)?;
        self.bytes(field, usize::from(len))
    }

    /// A byte string prefixed by a two-byte length.
    pub fn bytes_u16(&mut self, field: &'static str) -> WireResult<Vec<u8>> {
        let len = self.u16(field)?;
        self.bytes(field, usize::from(len))
    }
}

/// Bounds-checked writer into a buffer sized up front.
#[derive(Debug)]
pub struct WireWriter {
    buf: BytesMut,
    limit: usize,
}

impl WireWriter {
    /// Create a writer that accepts exactly `size` bytes.
    pub fn with_capacity(size: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(size),
            limit: size,
        }
    }

    /// Create a writer with no size limit.
    pub fn unbounded() -> Self {
        Self {
            buf: BytesMut::new(),
            limit: usize::MAX,
        }
    }

    pub fn written(&self) -> usize {
        self.buf.len()
    }

    pub fn remaining(&self) -> usize {
        self.limit - self.buf.len()
    }

    fn ensure(&self, needed: usize) -> WireResult<()> {
        if self.remaining() < needed {
            return Err(WireError::Overflow {
                needed,
                remaining: self.remaining(),
            });
        }
        Ok(())
    }

    pub fn put_u8(&mut self, value: u8) -> WireResult<()> {
        self.ensure(1)?;
        self.buf.put_u8(value);
        Ok(())
    }

    pub fn put_i8(&mut self, value: i8) -> WireResult<()> {
        self.ensure(1)?;
        self.buf.put_i8(value);
        Ok(())
    }

    pub fn put_bool(&mut self, value: bool) -> WireResult<()> {
        self.put_u8(u8::from(value))
    }

    pub fn put_u16(&mut self, value: u16) -> WireResult<()> {
        self.ensure(2)?;
        self.buf.put_u16_le(value);
        Ok(())
    }

    pub fn put_i16(&mut self, value: i16) -> WireResult<()> {
        self.ensure(2)?;
        self.buf.put_i16_le(value);
        Ok(())
    }

    /// Write the low three bytes of `value`.
    pub fn put_u24(&mut self, field: &'static str, value: u32) -> WireResult<()> {
        if value > 0x00FF_FFFF {
            return Err(WireError::InvalidValue { field, value });
        }
        self.ensure(3)?;
        self.buf.put_uint_le(u64::from(value), 3);
        Ok(())
    }

    pub fn put_u32(&mut self, value: u32) -> WireResult<()> {
        self.ensure(4)?;
        self.buf.put_u32_le(value);
        Ok(())
    }

    pub fn put_slice(&mut self, value: &[u8]) -> WireResult<()> {
        self.ensure(value.len())?;
        self.buf.put_slice(value);
        Ok(())
    }

    /// Write a one-byte length prefix.
    pub fn put_len_u8(&mut self, field: &'static str, len: usize) -> WireResult<()> {
        let len = u8::try_from(len).map_err(|_| WireError::LengthOverflow { field, len })?;
        self.put_u8(len)
    }

    /// Write a two-byte length prefix.
    pub fn put_len_u16(&mut self, field: &'static str, len: usize) -> WireResult<()> {
        let len = u16::try_from(len).map_err(|_| WireError::LengthOverflow { field, len })?;
        self.put_u16(len)
    }

    /// Write a byte string with a one-byte length prefix.
    pub fn put_bytes_u8(&mut self, field: &'static str, value: &[u8]) -> WireResult<()> {
        self.put_len_u8(field, value.len())?;
        self.put_slice(value)
    }

    /// Write a byte string with a two-byte length prefix.
    pub fn put_bytes_u16(&mut self, field: &'static str, value: &[u8]) -> WireResult<()> {
        self.put_len_u16(field, value.len())?;
        self.put_slice(value)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian_integers() {
        let data = [0x01, 0x34, 0x12, 0x78, 0x56, 0x34, 0x12, 0xAA, 0xBB, 0xCC, 0xFF];
        let mut r = WireReader::new(&data);

        assert_eq!(r.u8("a").unwrap(), 0x01);
        assert_eq!(r.u16("b").unwrap(), 0x1234);
        assert_eq!(r.u32("c").unwrap(), 0x1234_5678);
        assert_eq!(r.u24("d").unwrap(), 0x00CC_BBAA);
        assert_eq!(r.i8("e").unwrap(), -1);
        assert!(r.is_empty());
        assert_eq!(r.consumed(), data.len());
    }

    #[test]
    fn underrun_names_the_field() {
        let data = [0x01];
        let mut r = WireReader::new(&data);
        let err = r.u16("conn_interval").unwrap_err();
        assert_eq!(
            err,
            WireError::Truncated {
                field: "conn_interval",
                needed: 2,
                remaining: 1
            }
        );
        // A failed read does not advance the cursor.
        assert_eq!(r.remaining(), 1);
    }

    #[test]
    fn bool_is_lenient() {
        let data = [0x00, 0x01, 0x7F];
        let mut r = WireReader::new(&data);
        assert!(!r.bool("x").unwrap());
        assert!(r.bool("y").unwrap());
        assert!(r.bool("z").unwrap());
    }

    #[test]
    fn array_and_slice() {
        let data = [1, 2, 3, 4, 5, 6, 7, 8];
        let mut r = WireReader::new(&data);
        let addr: [u8; 6] = r.array("address").unwrap();
        assert_eq!(addr, [1, 2, 3, 4, 5, 6]);
        assert_eq!(r.slice("tail", 2).unwrap(), &[7, 8]);
        assert!(r.array::<1>("more").is_err());
    }

    #[test]
    fn enum_rejects_unknown_values() {
        #[derive(Debug, PartialEq)]
        struct Small(u8);
        impl TryFrom<u8> for Small {
            type Error = ();
            fn try_from(value: u8) -> Result<Self, ()> {
                if value < 3 {
                    Ok(Small(value))
                } else {
                    Err(())
                }
            }
        }

        let data = [0x02, 0x09];
        let mut r = WireReader::new(&data);
        assert_eq!(r.enum_u8::<Small>("kind").unwrap(), Small(2));
        assert_eq!(
            r.enum_u8::<Small>("kind").unwrap_err(),
            WireError::InvalidValue {
                field: "kind",
                value: 9
            }
        );
    }

    #[test]
    fn allocation_budget_is_shared_across_fields() {
        let data = [3, 1, 2, 3, 3, 4, 5, 6];
        let limits = DecodeLimits {
            max_record_allocation: 5,
        };
        let mut r = WireReader::with_limits(&data, limits);

        assert_eq!(r.bytes_u8("first").unwrap(), vec![1, 2, 3]);
        assert_eq!(r.allocated(), 3);
        let err = r.bytes_u8("second").unwrap_err();
        assert_eq!(
            err,
            WireError::OutOfMemory {
                field: "second",
                requested: 3
            }
        );
    }

    #[test]
    fn writer_rejects_overflow() {
        let mut w = WireWriter::with_capacity(3);
        w.put_u16(0xBEEF).unwrap();
        let err = w.put_u16(0x0001).unwrap_err();
        assert_eq!(
            err,
            WireError::Overflow {
                needed: 2,
                remaining: 1
            }
        );
        w.put_u8(0x7).unwrap();
        assert_eq!(w.remaining(), 0);
        assert_eq!(w.as_slice(), &[0xEF, 0xBE, 0x07]);
    }

    #[test]
    fn writer_length_prefixes() {
        let mut w = WireWriter::unbounded();
        w.put_bytes_u8("name", b"abc").unwrap();
        w.put_bytes_u16("info", b"xy").unwrap();
        assert_eq!(w.as_slice(), &[3, b'a', b'b', b'c', 2, 0, b'x', b'y']);

        let long = vec![0u8; 256];
        assert!(matches!(
            w.put_bytes_u8("name", &long),
            Err(WireError::LengthOverflow { len: 256, .. })
        ));
    }

    #[test]
    fn u24_roundtrip_and_range() {
        let mut w = WireWriter::unbounded();
        w.put_u24("subevent_len", 0x0012_3456).unwrap();
        assert!(w.put_u24("subevent_len", 0x0100_0000).is_err());

        let bytes = w.into_bytes();
        let mut r = WireReader::new(&bytes);
        assert_eq!(r.u24("subevent_len").unwrap(), 0x0012_3456);
    }
}
