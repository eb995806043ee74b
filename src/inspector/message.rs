use super::codec::{
    self, DecodedFields, FieldKind, FieldSpec, FieldValue, MAX_FIELD_LEN, MAX_MESSAGE_SIZE,
    Presence, Schema, WireRecord,
};
use crate::utils::error::CodecError;

/// Metadata of one intercepted publish, as sent to the inspector.
///
/// Matches the inspector's `PacketRequest` message: topic = 1, payload = 2,
/// username = 3, client_id = 4, ip_address = 5, timestamp = 6.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InspectionRequest {
    pub topic: String,
    pub payload: Vec<u8>,
    /// Empty when the client is anonymous.
    pub username: String,
    pub client_id: String,
    /// Textual IPv4/IPv6 address, empty when unknown.
    pub ip_address: String,
    /// Seconds since the epoch at request-build time.
    pub timestamp: i64,
}

pub const REQUEST_SCHEMA: Schema = Schema {
    name: "PacketRequest",
    fields: &[
        FieldSpec {
            number: 1,
            name: "topic",
            kind: FieldKind::Bytes {
                max_len: MAX_FIELD_LEN,
            },
            presence: Presence::Required,
        },
        FieldSpec {
            number: 2,
            name: "payload",
            kind: FieldKind::Bytes {
                max_len: MAX_MESSAGE_SIZE,
            },
            presence: Presence::Required,
        },
        FieldSpec {
            number: 3,
            name: "username",
            kind: FieldKind::Bytes {
                max_len: MAX_FIELD_LEN,
            },
            presence: Presence::Required,
        },
        FieldSpec {
            number: 4,
            name: "client_id",
            kind: FieldKind::Bytes {
                max_len: MAX_FIELD_LEN,
            },
            presence: Presence::Required,
        },
        FieldSpec {
            number: 5,
            name: "ip_address",
            kind: FieldKind::Bytes {
                max_len: MAX_FIELD_LEN,
            },
            presence: Presence::Required,
        },
        FieldSpec {
            number: 6,
            name: "timestamp",
            kind: FieldKind::Int64,
            presence: Presence::Required,
        },
    ],
};

impl WireRecord for InspectionRequest {
    const SCHEMA: &'static Schema = &REQUEST_SCHEMA;

    fn field(&self, number: u32) -> Option<FieldValue<'_>> {
        match number {
            1 => Some(FieldValue::Bytes(self.topic.as_bytes())),
            2 => Some(FieldValue::Bytes(&self.payload)),
            3 => Some(FieldValue::Bytes(self.username.as_bytes())),
            4 => Some(FieldValue::Bytes(self.client_id.as_bytes())),
            5 => Some(FieldValue::Bytes(self.ip_address.as_bytes())),
            6 => Some(FieldValue::Int64(self.timestamp)),
            _ => None,
        }
    }

    fn from_fields(mut fields: DecodedFields) -> Self {
        let mut text = |n| {
            let bytes = fields.take_bytes(n).unwrap_or_default();
            codec::bounded_text(&bytes, MAX_FIELD_LEN)
        };
        let topic = text(1);
        let username = text(3);
        let client_id = text(4);
        let ip_address = text(5);
        Self {
            topic,
            username,
            client_id,
            ip_address,
            payload: fields.take_bytes(2).unwrap_or_default(),
            timestamp: fields.take_i64(6).unwrap_or_default(),
        }
    }
}

/// The inspector's verdict on one request.
///
/// Matches `PacketResponse`: should_block = 1, block_reason = 2, payload = 3.
/// Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InspectionResponse {
    pub should_block: bool,
    /// At most [`MAX_FIELD_LEN`] bytes; empty when the inspector sent none.
    pub block_reason: String,
    /// Replacement payload; `None` keeps the original.
    pub payload: Option<Vec<u8>>,
}

pub const RESPONSE_SCHEMA: Schema = Schema {
    name: "PacketResponse",
    fields: &[
        FieldSpec {
            number: 1,
            name: "should_block",
            kind: FieldKind::Bool,
            presence: Presence::Optional,
        },
        FieldSpec {
            number: 2,
            name: "block_reason",
            kind: FieldKind::Bytes {
                max_len: MAX_FIELD_LEN,
            },
            presence: Presence::Optional,
        },
        FieldSpec {
            number: 3,
            name: "payload",
            kind: FieldKind::Bytes {
                max_len: MAX_MESSAGE_SIZE,
            },
            presence: Presence::Optional,
        },
    ],
};

impl WireRecord for InspectionResponse {
    const SCHEMA: &'static Schema = &RESPONSE_SCHEMA;

    fn field(&self, number: u32) -> Option<FieldValue<'_>> {
        match number {
            1 => self.should_block.then_some(FieldValue::Bool(true)),
            2 => (!self.block_reason.is_empty())
                .then(|| FieldValue::Bytes(self.block_reason.as_bytes())),
            3 => self.payload.as_deref().map(FieldValue::Bytes),
            _ => None,
        }
    }

    fn from_fields(mut fields: DecodedFields) -> Self {
        Self {
            should_block: fields.take_bool(1).unwrap_or(false),
            block_reason: fields
                .take_bytes(2)
                .map(|b| codec::bounded_text(&b, MAX_FIELD_LEN))
                .unwrap_or_default(),
            payload: fields.take_bytes(3),
        }
    }
}

pub fn encode_request(request: &InspectionRequest) -> Result<Vec<u8>, CodecError> {
    codec::encode(request)
}

pub fn decode_request(buf: &[u8]) -> Result<InspectionRequest, CodecError> {
    codec::decode(buf)
}

pub fn encode_response(response: &InspectionResponse) -> Result<Vec<u8>, CodecError> {
    codec::encode(response)
}

pub fn decode_response(buf: &[u8]) -> Result<InspectionResponse, CodecError> {
    codec::decode(buf)
}
