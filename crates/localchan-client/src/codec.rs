//! Payload encodings.
//!
//! The framing layer moves opaque bytes; a [`PayloadCodec`] turns request and
//! response values into those bytes and back. JSON is the reference
//! encoding and the default for [`Client`](crate::Client).

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Errors produced while encoding or decoding a payload.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "bincode")]
    #[error("bincode: {0}")]
    Bincode(#[from] bincode::Error),

    #[cfg(feature = "msgpack")]
    #[error("msgpack encode: {0}")]
    MessagePackEncode(#[from] rmp_serde::encode::Error),

    #[cfg(feature = "msgpack")]
    #[error("msgpack decode: {0}")]
    MessagePackDecode(#[from] rmp_serde::decode::Error),

    #[cfg(feature = "cbor")]
    #[error("cbor encode: {0}")]
    CborEncode(#[from] ciborium::ser::Error<std::io::Error>),

    #[cfg(feature = "cbor")]
    #[error("cbor decode: {0}")]
    CborDecode(#[from] ciborium::de::Error<std::io::Error>),
}

/// Encode/decode pair for payload values.
pub trait PayloadCodec {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Encode a value into payload bytes.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, CodecError>;

    /// Decode payload bytes into a value.
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError>;
}

/// JSON payloads via `serde_json`, field names preserved.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl PayloadCodec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(value)?)
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Compact binary payloads via `bincode`.
#[cfg(feature = "bincode")]
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

#[cfg(feature = "bincode")]
impl PayloadCodec for BincodeCodec {
    fn name(&self) -> &'static str {
        "bincode"
    }

    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        Ok(bincode::serialize(value)?)
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        Ok(bincode::deserialize(bytes)?)
    }
}

/// MessagePack payloads via `rmp-serde`.
///
/// Structs are written as maps keyed by field name, so peers in other
/// languages see the same shape as the JSON encoding.
#[cfg(feature = "msgpack")]
#[derive(Debug, Clone, Copy, Default)]
pub struct MessagePackCodec;

#[cfg(feature = "msgpack")]
impl PayloadCodec for MessagePackCodec {
    fn name(&self) -> &'static str {
        "msgpack"
    }

    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        Ok(rmp_serde::to_vec_named(value)?)
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}

/// CBOR payloads via `ciborium`.
#[cfg(feature = "cbor")]
#[derive(Debug, Clone, Copy, Default)]
pub struct CborCodec;

#[cfg(feature = "cbor")]
impl PayloadCodec for CborCodec {
    fn name(&self) -> &'static str {
        "cbor"
    }

    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        let mut bytes = Vec::new();
        ciborium::into_writer(value, &mut bytes)?;
        Ok(bytes)
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        Ok(ciborium::from_reader(bytes)?)
    }
}
