//! Fixed 32-byte massif start header codec.
//!
//! The header is hand-packed big-endian; see [`MassifStart`] for the
//! byte layout. It must stay fixed-size so discovery can index a massif
//! by reading only the leading bytes of the file.

use crate::constants::{MAX_MASSIF_HEIGHT, START_HEADER_SIZE, START_HEADER_VERSION};
use crate::error::{Result, StorageError};
use crate::types::MassifStart;

/// Encode the start header into its fixed 32-byte form.
#[must_use]
pub fn encode(start: &MassifStart) -> [u8; START_HEADER_SIZE] {
    let mut buf = [0u8; START_HEADER_SIZE];
    buf[0] = start.version;
    buf[4..8].copy_from_slice(&start.commitment_epoch.to_be_bytes());
    buf[8] = start.massif_height;
    buf[12..16].copy_from_slice(&start.massif_index.to_be_bytes());
    buf[16..24].copy_from_slice(&start.first_index.to_be_bytes());
    buf[24..32].copy_from_slice(&start.peak_stack_len.to_be_bytes());
    buf
}

/// Decode a start header from the leading bytes of a massif image.
///
/// Accepts any slice of at least [`START_HEADER_SIZE`] bytes; trailing
/// content is ignored.
pub fn decode(data: &[u8]) -> Result<MassifStart> {
    if data.len() < START_HEADER_SIZE {
        return Err(StorageError::Decode {
            what: "massif start",
            reason: format!(
                "need at least {START_HEADER_SIZE} bytes, got {}",
                data.len()
            ),
        });
    }
    let version = data[0];
    if version == 0 || version > START_HEADER_VERSION {
        return Err(StorageError::Decode {
            what: "massif start",
            reason: format!("unsupported header version {version}"),
        });
    }
    let massif_height = data[8];
    if massif_height == 0 || massif_height > MAX_MASSIF_HEIGHT {
        return Err(StorageError::Decode {
            what: "massif start",
            reason: format!("massif height {massif_height} outside 1..={MAX_MASSIF_HEIGHT}"),
        });
    }

    // slice bounds are checked above, the conversions cannot fail
    let be32 = |b: &[u8]| -> [u8; 4] { b.try_into().unwrap_or([0u8; 4]) };
    let be64 = |b: &[u8]| -> [u8; 8] { b.try_into().unwrap_or([0u8; 8]) };

    Ok(MassifStart {
        version,
        commitment_epoch: u32::from_be_bytes(be32(&data[4..8])),
        massif_height,
        massif_index: u32::from_be_bytes(be32(&data[12..16])),
        first_index: u64::from_be_bytes(be64(&data[16..24])),
        peak_stack_len: u64::from_be_bytes(be64(&data[24..32])),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_roundtrip() {
        let start = MassifStart {
            version: START_HEADER_VERSION,
            commitment_epoch: 7,
            massif_height: 14,
            massif_index: 42,
            first_index: 123_456,
            peak_stack_len: 3,
        };
        let decoded = decode(&encode(&start)).expect("decode");
        assert_eq!(decoded, start);
    }

    #[test]
    fn encoded_layout_matches_fixture() {
        let start = MassifStart {
            version: 1,
            commitment_epoch: 1,
            massif_height: 14,
            massif_index: 2,
            first_index: 16_384,
            peak_stack_len: 0,
        };
        assert_eq!(
            hex::encode(encode(&start)),
            "01000000000000010e0000000000000200000000000040000000000000000000"
        );
    }

    #[test]
    fn short_header_rejected() {
        let err = decode(&[0u8; 16]).expect_err("too short");
        assert!(matches!(err, StorageError::Decode { .. }));
    }

    #[test]
    fn oversized_height_rejected() {
        let start = MassifStart::new(1, 14, 0, 0);
        let mut buf = encode(&start);
        buf[8] = 200;
        let err = decode(&buf).expect_err("height 200");
        assert!(matches!(err, StorageError::Decode { .. }));
    }

    #[test]
    fn zero_version_rejected() {
        let buf = [0u8; START_HEADER_SIZE];
        let err = decode(&buf).expect_err("version zero");
        assert!(matches!(err, StorageError::Decode { .. }));
    }

    #[test]
    fn trailing_content_ignored() {
        let start = MassifStart::new(0, 2, 1, 3);
        let mut buf = encode(&start).to_vec();
        buf.extend_from_slice(&[0xAB; 96]);
        assert_eq!(decode(&buf).expect("decode"), start);
    }
}
