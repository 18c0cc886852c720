//! Minimal protobuf wire codec.
//!
//! Just enough of the protobuf encoding to produce and parse the Hedera
//! transaction envelope: varints, zigzag `sint64`, and length-delimited
//! sub-messages. Field order is whatever the caller writes, which keeps
//! the output byte-for-byte reproducible against reference vectors.
//!
//! As in proto3, scalar fields equal to zero are omitted on write and read
//! back as zero when absent.

use thiserror::Error;

/// Wire type of a varint field.
pub(crate) const WIRE_VARINT: u8 = 0;
/// Wire type of a fixed 64-bit field.
pub(crate) const WIRE_FIXED64: u8 = 1;
/// Wire type of a length-delimited field (bytes, strings, sub-messages).
pub(crate) const WIRE_LEN: u8 = 2;
/// Wire type of a fixed 32-bit field.
pub(crate) const WIRE_FIXED32: u8 = 5;

/// Longest valid varint encoding of a `u64`.
const MAX_VARINT_LENGTH: usize = 10;

/// Low-level decoding failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtoError {
    #[error("input ended inside a field")]
    Truncated,

    /// Longer than [`MAX_VARINT_LENGTH`] bytes, or the last byte carries
    /// bits past the 64th.
    #[error("varint does not fit in 64 bits")]
    VarintTooLong,

    #[error("unsupported wire type {0}")]
    UnsupportedWireType(u8),

    #[error("field {field} has wire type {found}, expected {expected}")]
    WrongWireType { field: u32, expected: u8, found: u8 },

    #[error("field number 0 is reserved")]
    ZeroField,

    #[error("value of field {field} does not fit its type")]
    OutOfRange { field: u32 },
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

/// Appends protobuf fields to a byte buffer.
#[derive(Debug, Default)]
pub(crate) struct ProtoWriter {
    buf: Vec<u8>,
}

impl ProtoWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Unsigned varint field, omitted when zero.
    pub(crate) fn uint64(&mut self, field: u32, value: u64) -> &mut Self {
        if value != 0 {
            self.key(field, WIRE_VARINT);
            put_varint(&mut self.buf, value);
        }
        self
    }

    /// Signed varint field (`int64`/`int32`), omitted when zero. Negative
    /// values take the full ten bytes, as protobuf specifies.
    pub(crate) fn int64(&mut self, field: u32, value: i64) -> &mut Self {
        self.uint64(field, value as u64)
    }

    /// Zigzag-encoded `sint64` field, omitted when zero.
    pub(crate) fn sint64(&mut self, field: u32, value: i64) -> &mut Self {
        self.uint64(field, zigzag_encode(value))
    }

    /// Length-delimited bytes. Written even when empty, since an empty
    /// sub-message still marks the field as present.
    pub(crate) fn bytes(&mut self, field: u32, value: &[u8]) -> &mut Self {
        self.key(field, WIRE_LEN);
        put_varint(&mut self.buf, value.len() as u64);
        self.buf.extend_from_slice(value);
        self
    }

    /// Length-delimited sub-message built by `build`.
    pub(crate) fn message(
        &mut self,
        field: u32,
        build: impl FnOnce(&mut ProtoWriter),
    ) -> &mut Self {
        let mut inner = ProtoWriter::new();
        build(&mut inner);
        self.bytes(field, &inner.buf)
    }

    pub(crate) fn finish(self) -> Vec<u8> {
        self.buf
    }

    fn key(&mut self, field: u32, wire_type: u8) {
        put_varint(&mut self.buf, (u64::from(field) << 3) | u64::from(wire_type));
    }
}

fn put_varint(buf: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        buf.push((value as u8) | 0x80);
        value >>= 7;
    }
    buf.push(value as u8);
}

pub(crate) fn zigzag_encode(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

pub(crate) fn zigzag_decode(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// A decoded field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldValue<'a> {
    Varint(u64),
    Fixed64(u64),
    Fixed32(u32),
    Bytes(&'a [u8]),
}

impl<'a> FieldValue<'a> {
    fn wire_type(&self) -> u8 {
        match self {
            Self::Varint(_) => WIRE_VARINT,
            Self::Fixed64(_) => WIRE_FIXED64,
            Self::Fixed32(_) => WIRE_FIXED32,
            Self::Bytes(_) => WIRE_LEN,
        }
    }

    /// The value as a varint, or a wire-type error naming `field`.
    pub(crate) fn varint(&self, field: u32) -> Result<u64, ProtoError> {
        match self {
            Self::Varint(value) => Ok(*value),
            other => Err(ProtoError::WrongWireType {
                field,
                expected: WIRE_VARINT,
                found: other.wire_type(),
            }),
        }
    }

    /// The value as length-delimited bytes, or a wire-type error.
    pub(crate) fn bytes(&self, field: u32) -> Result<&'a [u8], ProtoError> {
        match self {
            Self::Bytes(bytes) => Ok(bytes),
            other => Err(ProtoError::WrongWireType {
                field,
                expected: WIRE_LEN,
                found: other.wire_type(),
            }),
        }
    }
}

/// Iterates the fields of one message. Unknown fields are returned like
/// any other; callers skip the ones they do not need.
#[derive(Debug)]
pub(crate) struct ProtoReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ProtoReader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// The next `(field number, value)`, or `None` at the end of input.
    pub(crate) fn next_field(&mut self) -> Result<Option<(u32, FieldValue<'a>)>, ProtoError> {
        if self.pos == self.buf.len() {
            return Ok(None);
        }
        let key = self.varint()?;
        let field = u32::try_from(key >> 3).map_err(|_| ProtoError::OutOfRange { field: 0 })?;
        if field == 0 {
            return Err(ProtoError::ZeroField);
        }
        let value = match (key & 0x7) as u8 {
            WIRE_VARINT => FieldValue::Varint(self.varint()?),
            WIRE_FIXED64 => {
                let raw = self.take(8)?;
                let mut word = [0u8; 8];
                word.copy_from_slice(raw);
                FieldValue::Fixed64(u64::from_le_bytes(word))
            }
            WIRE_LEN => {
                let len = usize::try_from(self.varint()?).map_err(|_| ProtoError::Truncated)?;
                FieldValue::Bytes(self.take(len)?)
            }
            WIRE_FIXED32 => {
                let raw = self.take(4)?;
                let mut word = [0u8; 4];
                word.copy_from_slice(raw);
                FieldValue::Fixed32(u32::from_le_bytes(word))
            }
            other => return Err(ProtoError::UnsupportedWireType(other)),
        };
        Ok(Some((field, value)))
    }

    fn varint(&mut self) -> Result<u64, ProtoError> {
        let mut value = 0u64;
        for i in 0..MAX_VARINT_LENGTH {
            let byte = *self.buf.get(self.pos).ok_or(ProtoError::Truncated)?;
            self.pos += 1;
            // The tenth byte holds only bit 63.
            if i == MAX_VARINT_LENGTH - 1 && byte > 1 {
                return Err(ProtoError::VarintTooLong);
            }
            value |= u64::from(byte & 0x7f) << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(ProtoError::VarintTooLong)
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], ProtoError> {
        let end = self.pos.checked_add(len).ok_or(ProtoError::Truncated)?;
        let slice = self.buf.get(self.pos..end).ok_or(ProtoError::Truncated)?;
        self.pos = end;
        Ok(slice)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
