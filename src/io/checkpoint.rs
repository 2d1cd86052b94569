//! Signed checkpoint envelope codec.
//!
//! A checkpoint file holds a bincode-encoded [`SignedMessage`] whose
//! payload is itself the bincode encoding of the [`MmrState`] the
//! signature covers. Signature production and verification are the
//! caller's concern; decoding here only recovers the envelope and the
//! unverified state.

use bincode::config::{self, Config};

use crate::error::{Result, StorageError};
use crate::types::{Checkpoint, MmrState, SignedMessage};

fn seal_config() -> impl Config {
    config::standard()
        .with_fixed_int_encoding()
        .with_little_endian()
}

/// Encode the MMR state into the payload form carried inside the
/// signature envelope.
pub fn encode_state(state: &MmrState) -> Result<Vec<u8>> {
    bincode::serde::encode_to_vec(state, seal_config()).map_err(|err| StorageError::Decode {
        what: "mmr state",
        reason: err.to_string(),
    })
}

/// Encode a signed checkpoint envelope to its on-disk byte form.
pub fn encode_signed(message: &SignedMessage) -> Result<Vec<u8>> {
    bincode::serde::encode_to_vec(message, seal_config()).map_err(|err| StorageError::Decode {
        what: "signed checkpoint",
        reason: err.to_string(),
    })
}

/// Decode a signed checkpoint file: the envelope, and the unverified
/// MMR state recovered from its payload.
pub fn decode_signed(data: &[u8]) -> Result<(SignedMessage, MmrState)> {
    let (message, _): (SignedMessage, usize) =
        bincode::serde::decode_from_slice(data, seal_config()).map_err(|err| {
            StorageError::Decode {
                what: "signed checkpoint",
                reason: err.to_string(),
            }
        })?;
    let (state, _): (MmrState, usize) =
        bincode::serde::decode_from_slice(&message.payload, seal_config()).map_err(|err| {
            StorageError::Decode {
                what: "checkpoint mmr state",
                reason: err.to_string(),
            }
        })?;
    // a seal always attests at least one node; size zero would also
    // underflow the massif-owner derivation
    if state.mmr_size == 0 {
        return Err(StorageError::Decode {
            what: "checkpoint mmr state",
            reason: "mmr size is zero".to_string(),
        });
    }
    Ok((message, state))
}

/// Decode a checkpoint file into the combined [`Checkpoint`] form the
/// cache stores.
pub fn decode(data: &[u8]) -> Result<Checkpoint> {
    let (signed_message, mmr_state) = decode_signed(data)?;
    Ok(Checkpoint {
        mmr_state,
        signed_message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state(mmr_size: u64) -> MmrState {
        MmrState::new(mmr_size, vec![[0x5A; 32], [0xA5; 32]], 1_700_000_000_000)
    }

    fn sample_envelope(mmr_size: u64) -> SignedMessage {
        SignedMessage {
            payload: encode_state(&sample_state(mmr_size)).expect("encode state"),
            signature: vec![0xEE; 64],
            key_id: b"seal-key-1".to_vec(),
        }
    }

    #[test]
    fn envelope_roundtrip_recovers_state() {
        let bytes = encode_signed(&sample_envelope(7)).expect("encode");
        let (message, state) = decode_signed(&bytes).expect("decode");
        assert_eq!(state, sample_state(7));
        assert_eq!(message.signature, vec![0xEE; 64]);
        assert_eq!(message.key_id, b"seal-key-1");
    }

    #[test]
    fn truncated_envelope_rejected() {
        let bytes = encode_signed(&sample_envelope(3)).expect("encode");
        let err = decode(&bytes[..bytes.len() / 2]).expect_err("truncated");
        assert!(matches!(
            err,
            StorageError::Decode {
                what: "signed checkpoint",
                ..
            }
        ));
    }

    #[test]
    fn zero_mmr_size_rejected() {
        let bytes = encode_signed(&sample_envelope(0)).expect("encode");
        let err = decode(&bytes).expect_err("zero size");
        assert!(matches!(
            err,
            StorageError::Decode {
                what: "checkpoint mmr state",
                ..
            }
        ));
    }

    #[test]
    fn garbage_payload_rejected() {
        let mut envelope = sample_envelope(3);
        envelope.payload = vec![0xFF; 3];
        let bytes = encode_signed(&envelope).expect("encode");
        let err = decode(&bytes).expect_err("bad payload");
        assert!(matches!(
            err,
            StorageError::Decode {
                what: "checkpoint mmr state",
                ..
            }
        ));
    }
}
