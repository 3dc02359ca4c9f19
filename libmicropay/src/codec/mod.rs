//! Canonical length-prefixed encoding for stored records and operation inputs.
//!
//! * `bytes(b)` is a compact length prefix followed by the raw bytes. The prefix is one byte below `0xFD`,
//!   otherwise a `0xFD`/`0xFE`/`0xFF` marker followed by a little-endian `u16`/`u32`/`u64`. The shortest
//!   form is mandatory.
//! * `var_uint(v)` is `bytes` wrapped around the minimal big-endian two's-complement form of `v`. Zero is
//!   the empty string.
//! * `address(a)` is `bytes(a)` with exactly 20 bytes, `bool(b)` is `bytes([0x01])` or `bytes([0x00])`.
//!
//! Two surfaces produce the same bytes: [`ZeroCopySink`]/[`ZeroCopySource`] work on in-memory buffers and
//! [`StreamSink`]/[`StreamSource`] on `std::io` streams.

mod stream;
mod zero_copy;

pub use stream::{StreamSink, StreamSource};
pub use zero_copy::{ZeroCopySink, ZeroCopySource};

use crate::address::Address;
use thiserror::Error;

pub const HASH_LEN: usize = 32;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("Unexpected end of input")]
    UnexpectedEof,
    #[error("Irregular encoding: {0}")]
    IrregularData(&'static str),
    #[error("Negative integers are not allowed")]
    NegativeInteger,
    #[error("Integer does not fit in 64 bits")]
    IntegerOverflow,
    #[error("Length prefix {0} is too large")]
    LengthOverflow(u64),
    #[error("An address must be 20 bytes, got {0}")]
    InvalidAddressLength(usize),
    #[error("A hash must be empty or 32 bytes, got {0}")]
    InvalidHashLength(usize),
    #[error("Invalid boolean encoding")]
    InvalidBool,
    #[error("{0} unexpected trailing bytes")]
    TrailingBytes(usize),
    #[error("I/O error: {0}")]
    Io(String),
}

/// Minimal big-endian two's-complement bytes of `value`, without a length prefix.
pub fn var_uint_content(value: u64) -> Vec<u8> {
    let be = value.to_be_bytes();
    let Some(first) = be.iter().position(|b| *b != 0) else {
        return Vec::new();
    };
    let mut out = Vec::with_capacity(9);
    if be[first] & 0x80 != 0 {
        out.push(0);
    }
    out.extend_from_slice(&be[first..]);
    out
}

/// Inverse of [`var_uint_content`]. Rejects negative, non-minimal and over-long representations.
pub fn var_uint_from_content(content: &[u8]) -> Result<u64, CodecError> {
    let Some(&lead) = content.first() else {
        return Ok(0);
    };
    if lead & 0x80 != 0 {
        return Err(CodecError::NegativeInteger);
    }
    let digits = if lead == 0 {
        match content.get(1) {
            Some(next) if next & 0x80 != 0 => &content[1..],
            _ => return Err(CodecError::IrregularData("non-minimal integer")),
        }
    } else {
        content
    };
    if digits.len() > 8 {
        return Err(CodecError::IntegerOverflow);
    }
    let mut buf = [0u8; 8];
    buf[8 - digits.len()..].copy_from_slice(digits);
    Ok(u64::from_be_bytes(buf))
}

/// Destination for encoded bytes.
pub trait ByteSink {
    fn write_raw(&mut self, bytes: &[u8]);

    fn write_u8(&mut self, value: u8) {
        self.write_raw(&[value]);
    }

    fn write_u64_le(&mut self, value: u64) {
        self.write_raw(&value.to_le_bytes());
    }

    fn write_compact_size(&mut self, value: u64) {
        if value < 0xfd {
            self.write_u8(value as u8);
        } else if value <= 0xffff {
            self.write_u8(0xfd);
            self.write_raw(&(value as u16).to_le_bytes());
        } else if value <= 0xffff_ffff {
            self.write_u8(0xfe);
            self.write_raw(&(value as u32).to_le_bytes());
        } else {
            self.write_u8(0xff);
            self.write_raw(&value.to_le_bytes());
        }
    }

    fn write_var_bytes(&mut self, bytes: &[u8]) {
        self.write_compact_size(bytes.len() as u64);
        self.write_raw(bytes);
    }

    fn write_var_uint(&mut self, value: u64) {
        self.write_var_bytes(&var_uint_content(value));
    }

    fn write_address(&mut self, address: &Address) {
        self.write_var_bytes(address.as_bytes());
    }

    fn write_bool(&mut self, value: bool) {
        self.write_var_bytes(&[value as u8]);
    }
}

/// Source of encoded bytes.
pub trait ByteSource {
    /// Reads exactly `len` bytes or fails with [`CodecError::UnexpectedEof`].
    fn read_raw(&mut self, len: usize) -> Result<Vec<u8>, CodecError>;

    fn read_u8(&mut self) -> Result<u8, CodecError> {
        let bytes = self.read_raw(1)?;
        bytes.first().copied().ok_or(CodecError::UnexpectedEof)
    }

    fn read_u64_le(&mut self) -> Result<u64, CodecError> {
        let bytes: [u8; 8] = self.read_raw(8)?.try_into().map_err(|_| CodecError::UnexpectedEof)?;
        Ok(u64::from_le_bytes(bytes))
    }

    fn read_compact_size(&mut self) -> Result<u64, CodecError> {
        let value = match self.read_u8()? {
            0xfd => {
                let bytes: [u8; 2] = self.read_raw(2)?.try_into().map_err(|_| CodecError::UnexpectedEof)?;
                let v = u16::from_le_bytes(bytes) as u64;
                if v < 0xfd {
                    return Err(CodecError::IrregularData("length prefix should use the one-byte form"));
                }
                v
            }
            0xfe => {
                let bytes: [u8; 4] = self.read_raw(4)?.try_into().map_err(|_| CodecError::UnexpectedEof)?;
                let v = u32::from_le_bytes(bytes) as u64;
                if v <= 0xffff {
                    return Err(CodecError::IrregularData("length prefix should use the 16-bit form"));
                }
                v
            }
            0xff => {
                let v = self.read_u64_le()?;
                if v <= 0xffff_ffff {
                    return Err(CodecError::IrregularData("length prefix should use the 32-bit form"));
                }
                v
            }
            n => n as u64,
        };
        Ok(value)
    }

    fn read_var_bytes(&mut self) -> Result<Vec<u8>, CodecError> {
        let len = self.read_compact_size()?;
        let len = usize::try_from(len).map_err(|_| CodecError::LengthOverflow(len))?;
        self.read_raw(len)
    }

    fn read_var_uint(&mut self) -> Result<u64, CodecError> {
        var_uint_from_content(&self.read_var_bytes()?)
    }

    fn read_address(&mut self) -> Result<Address, CodecError> {
        Address::from_slice(&self.read_var_bytes()?)
    }

    fn read_bool(&mut self) -> Result<bool, CodecError> {
        match self.read_var_bytes()?.as_slice() {
            [0] => Ok(false),
            [1] => Ok(true),
            _ => Err(CodecError::InvalidBool),
        }
    }

    /// A `bytes` field that must be empty or exactly [`HASH_LEN`] long.
    fn read_hash(&mut self) -> Result<Vec<u8>, CodecError> {
        let bytes = self.read_var_bytes()?;
        match bytes.len() {
            0 | HASH_LEN => Ok(bytes),
            n => Err(CodecError::InvalidHashLength(n)),
        }
    }
}

pub trait Encodable {
    fn encode<W: ByteSink + ?Sized>(&self, sink: &mut W);
}

pub trait Decodable: Sized {
    fn decode<S: ByteSource + ?Sized>(source: &mut S) -> Result<Self, CodecError>;
}

impl Encodable for u64 {
    fn encode<W: ByteSink + ?Sized>(&self, sink: &mut W) {
        sink.write_var_uint(*self);
    }
}

impl Decodable for u64 {
    fn decode<S: ByteSource + ?Sized>(source: &mut S) -> Result<Self, CodecError> {
        source.read_var_uint()
    }
}

impl Encodable for bool {
    fn encode<W: ByteSink + ?Sized>(&self, sink: &mut W) {
        sink.write_bool(*self);
    }
}

impl Decodable for bool {
    fn decode<S: ByteSource + ?Sized>(source: &mut S) -> Result<Self, CodecError> {
        source.read_bool()
    }
}

impl Encodable for Vec<u8> {
    fn encode<W: ByteSink + ?Sized>(&self, sink: &mut W) {
        sink.write_var_bytes(self);
    }
}

impl Decodable for Vec<u8> {
    fn decode<S: ByteSource + ?Sized>(source: &mut S) -> Result<Self, CodecError> {
        source.read_var_bytes()
    }
}

/// Encodes `value` into a fresh buffer.
pub fn to_bytes<T: Encodable + ?Sized>(value: &T) -> Vec<u8> {
    let mut sink = ZeroCopySink::new();
    value.encode(&mut sink);
    sink.into_bytes()
}

/// Decodes a `T` that must span the whole of `bytes`.
pub fn from_bytes<T: Decodable>(bytes: &[u8]) -> Result<T, CodecError> {
    let mut source = ZeroCopySource::new(bytes);
    let value = T::decode(&mut source)?;
    match source.remaining() {
        0 => Ok(value),
        n => Err(CodecError::TrailingBytes(n)),
    }
}

/// Implements [`Encodable`] and [`Decodable`] for a struct by encoding each listed field in order.
#[macro_export]
macro_rules! impl_codec {
    ($name:ident { $($field:ident),* $(,)? }) => {
        impl $crate::codec::Encodable for $name {
            #[allow(unused_variables)]
            fn encode<W: $crate::codec::ByteSink + ?Sized>(&self, sink: &mut W) {
                $( $crate::codec::Encodable::encode(&self.$field, sink); )*
            }
        }

        impl $crate::codec::Decodable for $name {
            #[allow(unused_variables)]
            fn decode<S: $crate::codec::ByteSource + ?Sized>(
                source: &mut S,
            ) -> Result<Self, $crate::codec::CodecError> {
                Ok($name { $( $field: $crate::codec::Decodable::decode(source)?, )* })
            }
        }
    };
}
