// src/archive/codec.rs
// Gzip + JSON decoding for the event archive, bounded by byte ceilings

use flate2::read::GzDecoder;
use std::io::Read;

use super::types::EventArchive;
use crate::error::ArchiveError;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Check if the payload starts with the gzip magic bytes
pub fn is_gzip(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && bytes[..2] == GZIP_MAGIC
}

/// Inflate a gzip payload, failing once the output would pass `max_decompressed`
pub fn gunzip_limited(compressed: &[u8], max_decompressed: usize) -> Result<Vec<u8>, ArchiveError> {
    let decoder = GzDecoder::new(compressed);
    // One byte of slack tells "exactly at the limit" apart from "over it"
    let mut limited = decoder.take(max_decompressed as u64 + 1);
    let mut out = Vec::new();
    limited
        .read_to_end(&mut out)
        .map_err(|e| ArchiveError::Decompress(e.to_string()))?;

    if out.len() > max_decompressed {
        return Err(ArchiveError::DecompressedTooLarge {
            limit: max_decompressed,
        });
    }
    Ok(out)
}

/// Decode a full archive payload. Plain JSON is accepted too, still under the decompressed ceiling.
pub fn decode_archive(
    bytes: &[u8],
    max_compressed: usize,
    max_decompressed: usize,
) -> Result<EventArchive, ArchiveError> {
    let json = if is_gzip(bytes) {
        if bytes.len() > max_compressed {
            return Err(ArchiveError::CompressedTooLarge {
                limit: max_compressed,
            });
        }
        gunzip_limited(bytes, max_decompressed)?
    } else {
        if bytes.len() > max_decompressed {
            return Err(ArchiveError::DecompressedTooLarge {
                limit: max_decompressed,
            });
        }
        bytes.to_vec()
    };

    let archive: EventArchive = serde_json::from_slice(&json)?;
    log::info!(
        "Decoded staking archive: {} wallets, {} events ({} -> {} bytes)",
        archive.addresses.len(),
        archive.events.len(),
        bytes.len(),
        json.len()
    );
    archive.check_meta();
    Ok(archive)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    const SAMPLE: &str = r#"{
        "addresses": {"W1": {"first_event": 0, "last_event": 0, "current": [1, 0, 0, 0, 0]}},
        "events": [["sig", "2024-01-01T00:00:00Z", 1, 1, "W1", 1.0, 0, 0, 0, null, 0]],
        "meta": {"start": "2024-01-01", "end": "2024-01-31", "total_wallets": 1, "total_events": 1}
    }"#;

    #[test]
    fn test_decode_gzip_archive() {
        let archive = decode_archive(&gzip(SAMPLE.as_bytes()), 1024 * 1024, 1024 * 1024).unwrap();
        assert_eq!(archive.events.len(), 1);
        assert!(archive.addresses.contains_key("W1"));
        assert_eq!(archive.meta.end, "2024-01-31");
    }

    #[test]
    fn test_decode_plain_json() {
        let archive = decode_archive(SAMPLE.as_bytes(), 16, 1024 * 1024).unwrap();
        assert_eq!(archive.meta.total_events, Some(1));
    }

    #[test]
    fn test_compressed_ceiling() {
        let compressed = gzip(SAMPLE.as_bytes());
        let err = decode_archive(&compressed, 8, 1024 * 1024).unwrap_err();
        assert_eq!(err, ArchiveError::CompressedTooLarge { limit: 8 });
    }

    #[test]
    fn test_decompressed_ceiling() {
        // Highly compressible payload that inflates well past the limit
        let big = vec![b' '; 64 * 1024];
        let compressed = gzip(&big);
        let err = gunzip_limited(&compressed, 1024).unwrap_err();
        assert_eq!(err, ArchiveError::DecompressedTooLarge { limit: 1024 });

        let exact = gunzip_limited(&compressed, big.len()).unwrap();
        assert_eq!(exact.len(), big.len());
    }

    #[test]
    fn test_corrupt_payloads() {
        let mut truncated = gzip(SAMPLE.as_bytes());
        truncated.truncate(truncated.len() / 2);
        assert!(matches!(
            decode_archive(&truncated, 1024 * 1024, 1024 * 1024),
            Err(ArchiveError::Decompress(_))
        ));

        assert!(matches!(
            decode_archive(b"{not json", 1024, 1024),
            Err(ArchiveError::Parse(_))
        ));
    }
}
