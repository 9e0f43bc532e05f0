// Codec boundary between a raw pixel region and the opaque payload that travels
// inside a FragmentInfo.

use sha2::{Digest, Sha256};

use super::surface::Region;
use crate::error::{FragmentError, Result};

/// Turns a region into opaque bytes and back.
///
/// Implementations must be shareable between the producer and consumer threads.
/// `decode` reports malformed input as [`FragmentError::DecodeFailure`].
pub trait Codec: Send + Sync {
    fn encode(&self, region: &Region) -> Result<Vec<u8>>;
    fn decode(&self, payload: &[u8]) -> Result<Region>;
}

const MAGIC_NUMBER: u32 = 0x4741_5246; // "FRAG"
const HEADER_LEN: usize = 4 + 4 + 4 + 1;
const DIGEST_LEN: usize = 32;

/// Uncompressed reference codec.
///
/// Payload layout (little-endian):
/// ```text
/// magic:u32 | width:u32 | height:u32 | channels:u8 | pixels | sha256(header+pixels)
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct RawCodec;

impl RawCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Codec for RawCodec {
    fn encode(&self, region: &Region) -> Result<Vec<u8>> {
        let width = u32::try_from(region.width())
            .map_err(|_| FragmentError::InvalidConfig("region width exceeds u32".into()))?;
        let height = u32::try_from(region.height())
            .map_err(|_| FragmentError::InvalidConfig("region height exceeds u32".into()))?;
        let channels = u8::try_from(region.channels())
            .map_err(|_| FragmentError::InvalidConfig("region channels exceed u8".into()))?;

        let mut payload = Vec::with_capacity(HEADER_LEN + region.data().len() + DIGEST_LEN);
        payload.extend_from_slice(&MAGIC_NUMBER.to_le_bytes());
        payload.extend_from_slice(&width.to_le_bytes());
        payload.extend_from_slice(&height.to_le_bytes());
        payload.push(channels);
        payload.extend_from_slice(region.data());

        let digest = Sha256::digest(&payload);
        payload.extend_from_slice(&digest);
        Ok(payload)
    }

    fn decode(&self, payload: &[u8]) -> Result<Region> {
        if payload.len() < HEADER_LEN + DIGEST_LEN {
            return Err(FragmentError::decode(format!(
                "payload too short: {} bytes",
                payload.len()
            )));
        }

        let (body, digest) = payload.split_at(payload.len() - DIGEST_LEN);
        if Sha256::digest(body).as_slice() != digest {
            return Err(FragmentError::decode("checksum mismatch"));
        }

        let read_u32 = |at: usize| u32::from_le_bytes([body[at], body[at + 1], body[at + 2], body[at + 3]]);
        if read_u32(0) != MAGIC_NUMBER {
            return Err(FragmentError::decode("bad magic number"));
        }
        let width = read_u32(4) as usize;
        let height = read_u32(8) as usize;
        let channels = body[12] as usize;

        Region::new(width, height, channels, body[HEADER_LEN..].to_vec())
    }
}
