//! Mergeable summaries and their byte framing.
//!
//! Every serialized summary is a 4-byte little-endian payload length followed
//! by a JSON payload. Framing lets a caller hand over a buffer holding several
//! summaries back to back and learn how many bytes each one consumed.

use crate::velocore::sql::error::{SqlError, SqlResult};
use serde::Serialize;
use serde::de::DeserializeOwned;

pub const FRAME_HEADER_LEN: usize = 4;

/// Prefix `payload` with its length.
pub fn frame(payload: &[u8]) -> SqlResult<Vec<u8>> {
    let len = u32::try_from(payload.len()).map_err(|_| {
        SqlError::sketch_error(format!("Summary payload of {} bytes is too large", payload.len()))
    })?;
    let mut out = Vec::with_capacity(FRAME_HEADER_LEN + payload.len());
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(payload);
    Ok(out)
}

/// Split the first framed payload off `bytes`, returning it together with the
/// total number of bytes it occupied.
pub fn unframe(bytes: &[u8]) -> SqlResult<(&[u8], usize)> {
    let header: [u8; FRAME_HEADER_LEN] = bytes
        .get(..FRAME_HEADER_LEN)
        .and_then(|h| h.try_into().ok())
        .ok_or_else(|| SqlError::sketch_error("Truncated summary header"))?;
    let end = FRAME_HEADER_LEN + u32::from_le_bytes(header) as usize;
    let payload = bytes.get(FRAME_HEADER_LEN..end).ok_or_else(|| {
        SqlError::sketch_error(format!(
            "Truncated summary payload: need {} bytes, have {}",
            end,
            bytes.len()
        ))
    })?;
    Ok((payload, end))
}

/// Values stored per retained hash that know how to fold in a duplicate.
pub trait Combine {
    fn combine(&mut self, other: &Self) -> SqlResult<()>;
}

impl Combine for () {
    fn combine(&mut self, _other: &()) -> SqlResult<()> {
        Ok(())
    }
}

/// A summary that can be reset, merged with another instance of itself and
/// moved between processes as bytes.
pub trait MergeableSummary: Serialize + DeserializeOwned + Sized {
    /// Return to the empty state.
    fn reset(&mut self);

    /// Fold `other` into `self`.
    fn merge(&mut self, other: &Self) -> SqlResult<()>;

    fn to_bytes(&self) -> SqlResult<Vec<u8>> {
        let payload = serde_json::to_vec(self)
            .map_err(|e| SqlError::sketch_error(format!("Failed to serialize summary: {}", e)))?;
        frame(&payload)
    }

    /// Decode one summary from the front of `bytes`, returning it and the
    /// number of bytes consumed.
    fn from_bytes(bytes: &[u8]) -> SqlResult<(Self, usize)> {
        let (payload, consumed) = unframe(bytes)?;
        let summary = serde_json::from_slice(payload)
            .map_err(|e| SqlError::sketch_error(format!("Failed to decode summary: {}", e)))?;
        Ok((summary, consumed))
    }

    /// Decode a serialized summary and merge it in.
    fn union_bytes(&mut self, bytes: &[u8]) -> SqlResult<usize> {
        let (other, consumed) = Self::from_bytes(bytes)?;
        self.merge(&other)?;
        Ok(consumed)
    }
}
