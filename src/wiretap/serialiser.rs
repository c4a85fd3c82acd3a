//! Wiretap payload serialisers

use serde::Serialize;

use super::errors::{WiretapError, WiretapResult};

/// Turns a tapped payload into the bytes stored on the record
pub trait WiretapSerialiser<T: ?Sized>: Send + Sync {
    fn serialise(&self, payload: &T) -> WiretapResult<Vec<u8>>;
}

/// Stores the payload as JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerialiser;

impl<T: Serialize + ?Sized> WiretapSerialiser<T> for JsonSerialiser {
    fn serialise(&self, payload: &T) -> WiretapResult<Vec<u8>> {
        serde_json::to_vec(payload).map_err(|e| WiretapError::Serialisation(e.to_string()))
    }
}

/// Stores the payload bytes unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct RawSerialiser;

impl<T: AsRef<[u8]> + ?Sized> WiretapSerialiser<T> for RawSerialiser {
    fn serialise(&self, payload: &T) -> WiretapResult<Vec<u8>> {
        Ok(payload.as_ref().to_vec())
    }
}
