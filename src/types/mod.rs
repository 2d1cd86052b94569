//! Core data model for massif storage: log identity, object kinds, the
//! massif start header, checkpoints, and the append working context.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{
    LOG_ENTRY_BYTES, MMR_STATE_VERSION, START_HEADER_SIZE, START_HEADER_VERSION,
};
use crate::mmr;

/// Opaque identifier naming one log. Conventionally a UUID; its
/// canonical text form appears in storage paths and its byte value is
/// the cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogId(pub Uuid);

impl LogId {
    #[must_use]
    pub fn new(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// A fresh random log identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl fmt::Display for LogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // canonical hyphenated uuid text, the path form
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for LogId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// The kinds of stored object the engine addresses.
///
/// `MassifStart` and `MassifData` name the same underlying file;
/// `MassifStart` means "read only the fixed-size header".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    MassifStart,
    MassifData,
    Checkpoint,
    /// The massifs directory prefix for a log.
    MassifsPrefix,
    /// The checkpoints directory prefix for a log.
    CheckpointsPrefix,
}

/// Decoded fixed-size header from the first bytes of a massif file.
///
/// Layout (big-endian, 32 bytes):
///
/// ```text
/// [0]      version
/// [1..4]   reserved
/// [4..8]   commitment epoch
/// [8]      massif height
/// [9..12]  reserved
/// [12..16] massif index
/// [16..24] first index (mmr position of this massif's first entry)
/// [24..32] peak stack length
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MassifStart {
    pub version: u8,
    pub commitment_epoch: u32,
    pub massif_height: u8,
    pub massif_index: u32,
    pub first_index: u64,
    pub peak_stack_len: u64,
}

impl MassifStart {
    #[must_use]
    pub fn new(
        commitment_epoch: u32,
        massif_height: u8,
        massif_index: u32,
        first_index: u64,
    ) -> Self {
        Self {
            version: START_HEADER_VERSION,
            commitment_epoch,
            massif_height,
            massif_index,
            first_index,
            peak_stack_len: 0,
        }
    }
}

/// The unsigned state of the MMR a checkpoint attests to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MmrState {
    pub version: u16,
    /// Number of nodes in the MMR at the attested state.
    pub mmr_size: u64,
    /// The peak hashes, highest first.
    pub peaks: Vec<[u8; 32]>,
    pub timestamp_ms: i64,
}

impl MmrState {
    #[must_use]
    pub fn new(mmr_size: u64, peaks: Vec<[u8; 32]>, timestamp_ms: i64) -> Self {
        Self {
            version: MMR_STATE_VERSION,
            mmr_size,
            peaks,
            timestamp_ms,
        }
    }
}

/// Opaque signature envelope around an encoded [`MmrState`].
///
/// Signing and verification belong to the caller's crypto layer; this
/// crate only persists and round-trips the envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedMessage {
    /// The encoded `MmrState` the signature covers.
    pub payload: Vec<u8>,
    pub signature: Vec<u8>,
    /// Identifies the signing key to the verifier.
    pub key_id: Vec<u8>,
}

/// A decoded signed attestation of log state.
///
/// The owning massif index is derived from `mmr_state.mmr_size`, never
/// stored explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    pub mmr_state: MmrState,
    pub signed_message: SignedMessage,
}

impl Checkpoint {
    /// The massif index this checkpoint seals, for a log of the given
    /// height.
    #[must_use]
    pub fn massif_index(&self, massif_height: u8) -> u32 {
        mmr::massif_index_from_mmr_index(massif_height, self.mmr_state.mmr_size - 1)
    }
}

/// Working state for appending to one massif: the decoded start header,
/// the full byte image, and whether committing it creates a new file.
#[derive(Debug, Clone)]
pub struct MassifContext {
    pub start: MassifStart,
    /// The full massif byte image: start header, index region, entries.
    pub data: Vec<u8>,
    /// True when the commit must create the file rather than extend it.
    pub creating: bool,
}

impl MassifContext {
    /// Byte offset where log entries begin: the fixed header plus the
    /// per-massif index region.
    #[must_use]
    pub fn log_start(&self) -> u64 {
        log_start(self.start.massif_height)
    }

    /// Number of log entries (MMR nodes) currently in the byte image.
    #[must_use]
    pub fn count(&self) -> u64 {
        let start = self.log_start();
        (self.data.len() as u64).saturating_sub(start) / LOG_ENTRY_BYTES as u64
    }

    /// Occupied entry bytes, the quantity the capacity check compares
    /// against [`mmr::tree_size`].
    #[must_use]
    pub fn occupied(&self) -> u64 {
        (self.data.len() as u64).saturating_sub(self.log_start())
    }

    /// Reinitialize this context for the next massif index: increment
    /// the index, carry the first-entry offset forward from this
    /// massif's end, and reset the byte image to a fresh header and
    /// zeroed index region.
    pub fn start_next_massif(&mut self) {
        let next = MassifStart::new(
            self.start.commitment_epoch,
            self.start.massif_height,
            self.start.massif_index + 1,
            self.start.first_index + self.count(),
        );
        self.start = next;
        self.data = initial_massif_data(&self.start);
    }
}

/// Zero-filled per-massif index region for the given height.
#[must_use]
pub fn init_index_data(massif_height: u8) -> Vec<u8> {
    vec![0u8; (mmr::leaf_count(massif_height) as usize) * LOG_ENTRY_BYTES]
}

/// Offset of the first log entry for a massif of the given height.
#[must_use]
pub fn log_start(massif_height: u8) -> u64 {
    START_HEADER_SIZE as u64 + mmr::leaf_count(massif_height) * LOG_ENTRY_BYTES as u64
}

/// A fresh massif byte image: encoded start header followed by the
/// zeroed index region.
#[must_use]
pub fn initial_massif_data(start: &MassifStart) -> Vec<u8> {
    let mut data = crate::io::start::encode(start).to_vec();
    data.extend_from_slice(&init_index_data(start.massif_height));
    data
}

/// A massif together with the checkpoint attesting its state, already
/// verified by the caller's merkle library. Input to the two-file
/// replace protocol.
#[derive(Debug, Clone)]
pub struct VerifiedContext {
    pub start: MassifStart,
    pub data: Vec<u8>,
    pub mmr_state: MmrState,
    pub signed_message: SignedMessage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_id_text_roundtrip() {
        let id = LogId::random();
        let parsed: LogId = id.to_string().parse().expect("parse");
        assert_eq!(parsed, id);
    }

    #[test]
    fn fresh_context_counts_zero_entries() {
        let start = MassifStart::new(0, 3, 0, 0);
        let mc = MassifContext {
            start,
            data: initial_massif_data(&start),
            creating: true,
        };
        assert_eq!(mc.count(), 0);
        assert_eq!(mc.occupied(), 0);
        assert_eq!(mc.log_start(), 32 + 4 * 32);
    }

    #[test]
    fn start_next_massif_carries_first_index() {
        let start = MassifStart::new(0, 2, 0, 0);
        let mut mc = MassifContext {
            start,
            data: initial_massif_data(&start),
            creating: false,
        };
        // fill with three entries, the full height-2 tree
        mc.data.extend_from_slice(&[0u8; 3 * 32]);
        assert_eq!(mc.count(), 3);

        mc.start_next_massif();
        assert_eq!(mc.start.massif_index, 1);
        assert_eq!(mc.start.first_index, 3);
        assert_eq!(mc.count(), 0);
    }
}
