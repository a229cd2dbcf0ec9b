//! JSON encoding of persisted candidate records.

use crate::domain::CandidateRecord;
use crate::error::Result;

/// Encode a record as pretty-printed JSON.
pub fn encode(record: &CandidateRecord) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(record)?)
}

/// Decode a record. Derived fields are taken as stored, never recomputed.
pub fn decode(bytes: &[u8]) -> Result<CandidateRecord> {
    Ok(serde_json::from_slice(bytes)?)
}
