//! Schema-driven binary codec for the inspector protocol.
//!
//! Records are encoded in protobuf wire format using the primitives from
//! `prost::encoding`. Which fields exist, their types, length caps and
//! presence rules come from a static [`Schema`] table; one generic
//! [`encode`]/[`decode`] pair serves every [`WireRecord`].

use std::collections::HashMap;

use bytes::Buf;
use prost::encoding::{
    DecodeContext, decode_key, decode_varint, encode_key, encode_varint, encoded_len_varint,
    key_len, skip_field,
};

pub use prost::encoding::WireType;

use crate::utils::error::CodecError;

/// Capacity of the request and response buffers.
pub const MAX_MESSAGE_SIZE: usize = 2048;

/// Cap for decoded text fields and for the identity fields of a request.
pub const MAX_FIELD_LEN: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Length-delimited bytes. Encoding rejects values over `max_len`,
    /// decoding truncates them.
    Bytes { max_len: usize },
    Int64,
    Bool,
}

impl FieldKind {
    pub fn wire_type(self) -> WireType {
        match self {
            FieldKind::Bytes { .. } => WireType::LengthDelimited,
            FieldKind::Int64 | FieldKind::Bool => WireType::Varint,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Always written, even when empty or zero; must be present on decode.
    Required,
    /// Written only when the record has a value; defaults when absent.
    Optional,
}

#[derive(Debug)]
pub struct FieldSpec {
    pub number: u32,
    pub name: &'static str,
    pub kind: FieldKind,
    pub presence: Presence,
}

#[derive(Debug)]
pub struct Schema {
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
}

impl Schema {
    pub fn field(&self, number: u32) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.number == number)
    }
}

/// A field value borrowed from a record for encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Bytes(&'a [u8]),
    Int64(i64),
    Bool(bool),
}

/// A field value owned by the decoder's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedValue {
    Bytes(Vec<u8>),
    Int64(i64),
    Bool(bool),
}

/// Decoded values keyed by field number, handed to [`WireRecord::from_fields`].
#[derive(Debug, Default)]
pub struct DecodedFields {
    values: HashMap<u32, DecodedValue>,
}

impl DecodedFields {
    fn insert(&mut self, number: u32, value: DecodedValue) {
        // repeated scalar fields: last one wins
        self.values.insert(number, value);
    }

    fn contains(&self, number: u32) -> bool {
        self.values.contains_key(&number)
    }

    pub fn take_bytes(&mut self, number: u32) -> Option<Vec<u8>> {
        match self.values.remove(&number) {
            Some(DecodedValue::Bytes(b)) => Some(b),
            _ => None,
        }
    }

    pub fn take_i64(&mut self, number: u32) -> Option<i64> {
        match self.values.remove(&number) {
            Some(DecodedValue::Int64(v)) => Some(v),
            _ => None,
        }
    }

    pub fn take_bool(&mut self, number: u32) -> Option<bool> {
        match self.values.remove(&number) {
            Some(DecodedValue::Bool(v)) => Some(v),
            _ => None,
        }
    }
}

/// A record that can be carried by the codec.
pub trait WireRecord: Sized {
    const SCHEMA: &'static Schema;

    /// Value of field `number`, or `None` when an optional field is unset.
    fn field(&self, number: u32) -> Option<FieldValue<'_>>;

    /// Builds the record once every required field has been seen.
    fn from_fields(fields: DecodedFields) -> Self;
}

/// Encodes `record` into a fresh buffer.
///
/// The full size is computed before anything is written, so an oversized
/// record fails without producing partial output.
pub fn encode<R: WireRecord>(record: &R) -> Result<Vec<u8>, CodecError> {
    let schema = R::SCHEMA;
    let mut present = Vec::with_capacity(schema.fields.len());
    let mut size = 0usize;

    for spec in schema.fields {
        let Some(value) = record.field(spec.number) else {
            if spec.presence == Presence::Required {
                return Err(CodecError::MissingField(spec.name));
            }
            continue;
        };
        check_value(spec, &value)?;
        size += field_len(spec.number, &value);
        present.push((spec, value));
    }

    if size > MAX_MESSAGE_SIZE {
        return Err(CodecError::TooLarge {
            record: schema.name,
            size,
            capacity: MAX_MESSAGE_SIZE,
        });
    }

    let mut out = Vec::with_capacity(size);
    for (spec, value) in present {
        encode_key(spec.number, spec.kind.wire_type(), &mut out);
        match value {
            FieldValue::Bytes(b) => {
                encode_varint(b.len() as u64, &mut out);
                out.extend_from_slice(b);
            }
            FieldValue::Int64(v) => encode_varint(v as u64, &mut out),
            FieldValue::Bool(v) => encode_varint(u64::from(v), &mut out),
        }
    }
    debug_assert_eq!(out.len(), size);
    Ok(out)
}

/// Decodes one record from `input`.
///
/// Fields may arrive in any order; unknown fields with a valid wire type are
/// skipped. Every decoded byte string is copied into storage owned by the
/// returned record.
pub fn decode<R: WireRecord>(input: &[u8]) -> Result<R, CodecError> {
    let schema = R::SCHEMA;
    let mut buf = input;
    let mut fields = DecodedFields::default();

    while buf.has_remaining() {
        let (number, wire) = decode_key(&mut buf)?;

        let Some(spec) = schema.field(number) else {
            skip_field(wire, number, &mut buf, DecodeContext::default())?;
            continue;
        };

        let expected = spec.kind.wire_type();
        if wire != expected {
            return Err(CodecError::WireTypeMismatch {
                field: spec.name,
                expected: expected as u8,
                found: wire as u8,
            });
        }

        let value = match spec.kind {
            FieldKind::Bytes { max_len } => {
                let offset = input.len() - buf.len();
                let raw = length_delimited(&mut buf, offset, input.len())?;
                DecodedValue::Bytes(raw[..raw.len().min(max_len)].to_vec())
            }
            FieldKind::Int64 => DecodedValue::Int64(decode_varint(&mut buf)? as i64),
            FieldKind::Bool => DecodedValue::Bool(decode_varint(&mut buf)? != 0),
        };
        fields.insert(number, value);
    }

    if let Some(missing) = schema
        .fields
        .iter()
        .find(|f| f.presence == Presence::Required && !fields.contains(f.number))
    {
        return Err(CodecError::MissingField(missing.name));
    }

    Ok(R::from_fields(fields))
}

/// Converts decoded bytes to text of at most `max` bytes, cutting on a
/// character boundary.
pub fn bounded_text(bytes: &[u8], max: usize) -> String {
    let mut text = String::from_utf8_lossy(bytes).into_owned();
    if text.len() > max {
        let mut end = max;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text.truncate(end);
    }
    text
}

fn check_value(spec: &FieldSpec, value: &FieldValue<'_>) -> Result<(), CodecError> {
    match (spec.kind, value) {
        (FieldKind::Bytes { max_len }, FieldValue::Bytes(b)) => {
            if b.len() > max_len {
                return Err(CodecError::FieldTooLong {
                    field: spec.name,
                    len: b.len(),
                    max: max_len,
                });
            }
            Ok(())
        }
        (FieldKind::Int64, FieldValue::Int64(_)) | (FieldKind::Bool, FieldValue::Bool(_)) => Ok(()),
        (kind, value) => Err(CodecError::WireTypeMismatch {
            field: spec.name,
            expected: kind.wire_type() as u8,
            found: value_wire_type(value) as u8,
        }),
    }
}

fn value_wire_type(value: &FieldValue<'_>) -> WireType {
    match value {
        FieldValue::Bytes(_) => WireType::LengthDelimited,
        FieldValue::Int64(_) | FieldValue::Bool(_) => WireType::Varint,
    }
}

fn field_len(number: u32, value: &FieldValue<'_>) -> usize {
    key_len(number)
        + match value {
            FieldValue::Bytes(b) => encoded_len_varint(b.len() as u64) + b.len(),
            FieldValue::Int64(v) => encoded_len_varint(*v as u64),
            FieldValue::Bool(_) => 1,
        }
}

/// Splits one length-prefixed value off the front of `buf`.
fn length_delimited<'a>(
    buf: &mut &'a [u8],
    offset: usize,
    available: usize,
) -> Result<&'a [u8], CodecError> {
    let len = decode_varint(buf)?;
    let remaining: &'a [u8] = *buf;
    let n = match usize::try_from(len) {
        Ok(n) if n <= remaining.len() => n,
        _ => {
            return Err(CodecError::LengthOutOfBounds {
                offset,
                len,
                available,
            });
        }
    };
    let (value, rest) = remaining.split_at(n);
    *buf = rest;
    Ok(value)
}
