//! Payload compression, addressed by the single-byte wire code carried in
//! every frame.

use std::io::{Read, Write};
use std::sync::Arc;

use dashmap::DashMap;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;

use crate::{Error, Result};

/// Wire code for uncompressed payloads.
pub const NONE_WIRE_CODE: u8 = 0x00;
/// Wire code for zlib-compressed payloads.
pub const ZLIB_WIRE_CODE: u8 = 0x05;

/// A named compression algorithm with symmetric compress/decompress halves.
pub trait Compression: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>>;
    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>>;
}

/// Identity on both sides.
#[derive(Debug)]
pub struct NoCompression;

impl Compression for NoCompression {
    fn name(&self) -> &str {
        "none"
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(data.to_vec())
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(data.to_vec())
    }
}

/// Standard zlib/deflate stream at the default level.
#[derive(Debug)]
pub struct ZlibCompression;

impl Compression for ZlibCompression {
    fn name(&self) -> &str {
        "zlib"
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = ZlibEncoder::new(
            Vec::with_capacity(data.len()),
            flate2::Compression::default(),
        );
        encoder
            .write_all(data)
            .and_then(|_| encoder.finish())
            .map_err(|e| Error::MalformedData(format!("zlib compression failed: {}", e)))
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut decoded = Vec::with_capacity(data.len() * 2);
        ZlibDecoder::new(data)
            .read_to_end(&mut decoded)
            .map_err(|e| Error::MalformedData(format!("invalid zlib stream: {}", e)))?;
        Ok(decoded)
    }
}

/// Wire code to algorithm table.
///
/// `NONE` and `ZLIB` are always present; additional algorithms can be added
/// with [`CompressionRegistry::register`] as long as their wire code does not
/// collide with a code already on the wire.
pub struct CompressionRegistry {
    algorithms: DashMap<u8, Arc<dyn Compression>>,
}

impl Default for CompressionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CompressionRegistry {
    pub fn new() -> Self {
        let registry = Self {
            algorithms: DashMap::new(),
        };
        registry.register(NONE_WIRE_CODE, Arc::new(NoCompression));
        registry.register(ZLIB_WIRE_CODE, Arc::new(ZlibCompression));
        registry
    }

    pub fn register(&self, wire_code: u8, algorithm: Arc<dyn Compression>) {
        self.algorithms.insert(wire_code, algorithm);
    }

    pub fn for_code(&self, wire_code: u8) -> Result<Arc<dyn Compression>> {
        self.algorithms
            .get(&wire_code)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(Error::UnsupportedCompression(wire_code))
    }
}

/// Producer-side compression selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionKind {
    None,
    Zlib,
}

impl CompressionKind {
    pub fn wire_code(self) -> u8 {
        match self {
            CompressionKind::None => NONE_WIRE_CODE,
            CompressionKind::Zlib => ZLIB_WIRE_CODE,
        }
    }
}

impl Default for CompressionKind {
    fn default() -> Self {
        CompressionKind::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_is_identity() {
        let registry = CompressionRegistry::new();
        let algorithm = registry.for_code(NONE_WIRE_CODE).unwrap();
        assert_eq!(algorithm.compress(b"abc").unwrap(), b"abc");
        assert_eq!(algorithm.decompress(b"abc").unwrap(), b"abc");
    }

    #[test]
    fn zlib_round_trips() {
        let algorithm = CompressionRegistry::new().for_code(ZLIB_WIRE_CODE).unwrap();
        let input = b"a compressible payload, a compressible payload".to_vec();
        let compressed = algorithm.compress(&input).unwrap();
        assert_ne!(compressed, input);
        assert_eq!(algorithm.decompress(&compressed).unwrap(), input);
    }

    #[test]
    fn zlib_rejects_garbage() {
        let algorithm = CompressionRegistry::new().for_code(ZLIB_WIRE_CODE).unwrap();
        let err = algorithm.decompress(b"definitely not zlib").unwrap_err();
        assert!(matches!(err, Error::MalformedData(_)));
    }

    #[test]
    fn unknown_code_is_rejected() {
        let err = CompressionRegistry::new().for_code(0x42).unwrap_err();
        assert!(matches!(err, Error::UnsupportedCompression(0x42)));
    }

    #[test]
    fn user_algorithms_can_be_registered() {
        #[derive(Debug)]
        struct Xor;
        impl Compression for Xor {
            fn name(&self) -> &str {
                "xor"
            }
            fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
                Ok(data.iter().map(|b| b ^ 0xff).collect())
            }
            fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
                self.compress(data)
            }
        }

        let registry = CompressionRegistry::new();
        registry.register(0x42, Arc::new(Xor));
        let algorithm = registry.for_code(0x42).unwrap();
        assert_eq!(algorithm.name(), "xor");
        let masked = algorithm.compress(b"data").unwrap();
        assert_eq!(algorithm.decompress(&masked).unwrap(), b"data");
    }
}
