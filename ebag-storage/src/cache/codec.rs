//! Decode strategies for cached payloads.
//!
//! The cache stores bytes only, so the caller names the expected shape at
//! every access by passing a [`Codec`]. A payload that does not decode into
//! that shape is reported as a [`CodecError`] and the accessor treats it as
//! a miss, never as a value of the wrong type.
//!
//! ```ignore
//! let demo = cache.get(&key, &JsonCodec::<Demo>::new(), supplier).await?;
//! let demos = cache.get(&key, &JsonCodec::<Vec<Demo>>::new(), supplier).await?;
//! ```

use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encode or decode failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct CodecError(pub String);

impl CodecError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Converts between a value of shape `T` and cached bytes.
pub trait Codec<T>: Send + Sync {
    fn encode(&self, value: &T) -> Result<Vec<u8>, CodecError>;

    fn decode(&self, bytes: &[u8]) -> Result<T, CodecError>;
}

/// JSON codec for any serde type: scalars, structs and sequences alike.
pub struct JsonCodec<T> {
    _shape: PhantomData<fn() -> T>,
}

impl<T> JsonCodec<T> {
    pub fn new() -> Self {
        Self {
            _shape: PhantomData,
        }
    }
}

impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonCodec<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for JsonCodec<T> {}

impl<T> fmt::Debug for JsonCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JsonCodec<{}>", std::any::type_name::<T>())
    }
}

impl<T> Codec<T> for JsonCodec<T>
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(value).map_err(|e| CodecError(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<T, CodecError> {
        serde_json::from_slice(bytes).map_err(|e| CodecError(e.to_string()))
    }
}

/// Codec built from a pair of call-site functions.
pub struct FnCodec<Enc, Dec> {
    encode: Enc,
    decode: Dec,
}

impl<Enc, Dec> FnCodec<Enc, Dec> {
    pub fn new<T>(encode: Enc, decode: Dec) -> Self
    where
        Enc: Fn(&T) -> Result<Vec<u8>, CodecError> + Send + Sync,
        Dec: Fn(&[u8]) -> Result<T, CodecError> + Send + Sync,
    {
        Self { encode, decode }
    }
}

impl<T, Enc, Dec> Codec<T> for FnCodec<Enc, Dec>
where
    Enc: Fn(&T) -> Result<Vec<u8>, CodecError> + Send + Sync,
    Dec: Fn(&[u8]) -> Result<T, CodecError> + Send + Sync,
{
    fn encode(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        (self.encode)(value)
    }

    fn decode(&self, bytes: &[u8]) -> Result<T, CodecError> {
        (self.decode)(bytes)
    }
}
