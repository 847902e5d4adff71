use bytes::Bytes;
use fsci_frame::{WireError, WireReader, WireResult, WireWriter};

/// A record with a fixed wire layout.
///
/// `wire_size` must return exactly the number of bytes `encode` writes, and
/// `decode` must consume exactly that many bytes of an encoded record.
pub trait Marshal: Sized {
    /// Bytes `encode` will write for this value.
    fn wire_size(&self) -> usize;

    fn encode(&self, w: &mut WireWriter) -> WireResult<()>;

    fn decode(r: &mut WireReader<'_>) -> WireResult<Self>;

    /// Decode as the named field of an enclosing record.
    ///
    /// Scalars report `field` when they run short; nested records report
    /// their own innermost field instead.
    fn decode_field(r: &mut WireReader<'_>, field: &'static str) -> WireResult<Self> {
        let _ = field;
        Self::decode(r)
    }
}

/// Size a buffer with `wire_size`, encode into it and check that the
/// encoder filled it exactly.
pub fn encode_exact<T: Marshal>(value: &T) -> WireResult<Bytes> {
    let expected = value.wire_size();
    let mut w = WireWriter::with_capacity(expected);
    value.encode(&mut w)?;
    if w.written() != expected {
        return Err(WireError::SizeMismatch {
            expected,
            written: w.written(),
        });
    }
    Ok(w.into_bytes())
}

/// Decode a record that must span the whole payload.
pub fn decode_exact<T: Marshal>(r: &mut WireReader<'_>) -> WireResult<T> {
    let value = T::decode(r)?;
    r.finish()?;
    Ok(value)
}

macro_rules! scalar {
    ($ty:ty, $size:expr, $read:ident, $write:ident) => {
        impl Marshal for $ty {
            fn wire_size(&self) -> usize {
                $size
            }

            fn encode(&self, w: &mut WireWriter) -> WireResult<()> {
                w.$write(*self)
            }

            fn decode(r: &mut WireReader<'_>) -> WireResult<Self> {
                r.$read(stringify!($ty))
            }

            fn decode_field(r: &mut WireReader<'_>, field: &'static str) -> WireResult<Self> {
                r.$read(field)
            }
        }
    };
}

scalar!(u8, 1, u8, put_u8);
scalar!(i8, 1, i8, put_i8);
scalar!(bool, 1, bool, put_bool);
scalar!(u16, 2, u16, put_u16);
scalar!(i16, 2, i16, put_i16);
scalar!(u32, 4, u32, put_u32);

impl<const N: usize> Marshal for [u8; N] {
    fn wire_size(&self) -> usize {
        N
    }

    fn encode(&self, w: &mut WireWriter) -> WireResult<()> {
        w.put_slice(self)
    }

    fn decode(r: &mut WireReader<'_>) -> WireResult<Self> {
        r.array("array")
    }

    fn decode_field(r: &mut WireReader<'_>, field: &'static str) -> WireResult<Self> {
        r.array(field)
    }
}

/// An optional sub-block: a presence byte, then the block only if present.
impl<T: Marshal> Marshal for Option<T> {
    fn wire_size(&self) -> usize {
        1 + self.as_ref().map_or(0, Marshal::wire_size)
    }

    fn encode(&self, w: &mut WireWriter) -> WireResult<()> {
        w.put_bool(self.is_some())?;
        if let Some(inner) = self {
            inner.encode(w)?;
        }
        Ok(())
    }

    fn decode(r: &mut WireReader<'_>) -> WireResult<Self> {
        Self::decode_field(r, "included")
    }

    fn decode_field(r: &mut WireReader<'_>, field: &'static str) -> WireResult<Self> {
        if r.bool(field)? {
            Ok(Some(T::decode_field(r, field)?))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_exact_produces_sized_buffer() {
        let value = [1u8, 2, 3];
        let bytes = encode_exact(&value).unwrap();
        assert_eq!(bytes.as_ref(), &[1, 2, 3]);
    }

    #[test]
    fn encode_exact_detects_short_encoder() {
        struct Liar;
        impl Marshal for Liar {
            fn wire_size(&self) -> usize {
                4
            }
            fn encode(&self, w: &mut WireWriter) -> WireResult<()> {
                w.put_u16(7)
            }
            fn decode(_r: &mut WireReader<'_>) -> WireResult<Self> {
                Ok(Liar)
            }
        }

        assert_eq!(
            encode_exact(&Liar).unwrap_err(),
            WireError::SizeMismatch {
                expected: 4,
                written: 2
            }
        );
    }

    #[test]
    fn option_writes_presence_byte_first() {
        let present = Some([9u8; 2]);
        let absent: Option<[u8; 2]> = None;
        assert_eq!(present.wire_size(), 3);
        assert_eq!(absent.wire_size(), 1);

        let mut w = WireWriter::unbounded();
        present.encode(&mut w).unwrap();
        absent.encode(&mut w).unwrap();
        assert_eq!(w.as_slice(), &[1, 9, 9, 0]);

        let bytes = w.into_bytes();
        let mut r = WireReader::new(&bytes);
        assert_eq!(Option::<[u8; 2]>::decode(&mut r).unwrap(), present);
        assert_eq!(Option::<[u8; 2]>::decode(&mut r).unwrap(), absent);
        assert!(r.is_empty());
    }

    #[test]
    fn scalar_underrun_names_field() {
        let data = [0x01];
        let mut r = WireReader::new(&data);
        assert_eq!(
            u16::decode_field(&mut r, "handle").unwrap_err(),
            WireError::Truncated {
                field: "handle",
                needed: 2,
                remaining: 1
            }
        );
    }

    #[test]
    fn decode_exact_rejects_trailing_bytes() {
        let data = [1u8, 2, 3];
        let mut r = WireReader::new(&data);
        assert_eq!(
            decode_exact::<[u8; 2]>(&mut r).unwrap_err(),
            WireError::TrailingBytes { count: 1 }
        );
    }
}
