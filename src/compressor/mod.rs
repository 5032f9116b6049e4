//! The compressor plugin contract.
//!
//! One implementation per backend. The harness drives every backend through
//! the same lifecycle: `init()` once before use, any number of paired
//! compress/decompress calls, `close()` (idempotent) at the end. The encoded
//! size is explicit caller-held state: `compress` returns an [`EncodedStream`]
//! that the caller threads back into `decompress`, so a plugin instance keeps
//! no per-run mutable state and sequential reuse is safe.

pub mod lz4;
pub mod quantize;
pub mod snappy;
pub mod zstd;

use crate::buffer::{Buffer, Dims, TypeTag};
use crate::config::CompressorConfig;
use crate::error::CompressorError;

/// Backend-specific compressed byte representation, opaque to the harness.
/// Carries the exact encoded length; capacity headroom from the backend's
/// upper-bound allocation is trimmed before it gets here.
#[derive(Debug)]
pub struct EncodedStream {
    data: Vec<u8>,
}

impl EncodedStream {
    pub fn new(data: Vec<u8>) -> EncodedStream {
        EncodedStream { data }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Actual encoded byte count.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Uniform contract every compression backend satisfies.
pub trait Compressor {
    /// Name used in config, metrics lines, and result records.
    fn name(&self) -> &str;

    /// Acquires backend resources. Must be called once before any
    /// compress/decompress call.
    fn init(&mut self) -> Result<(), CompressorError>;

    /// Encodes `element_count(dims)` elements of `tag` read from `input`.
    /// The output is sized to the backend's own upper bound and trimmed to
    /// the actual encoded length.
    fn compress(
        &mut self,
        input: &Buffer,
        tag: TypeTag,
        dims: &Dims,
    ) -> Result<EncodedStream, CompressorError>;

    /// Decodes `encoded` back into a buffer of exactly
    /// `element_count(dims) * tag.width()` bytes.
    fn decompress(
        &mut self,
        encoded: &EncodedStream,
        tag: TypeTag,
        dims: &Dims,
    ) -> Result<Buffer, CompressorError>;

    /// Releases backend resources. Safe to call multiple times.
    fn close(&mut self);
}

/// Instantiates a backend by name with its parameters. Unknown names are an
/// explicit failure; the backend set is closed.
pub fn create(
    name: &str,
    config: CompressorConfig,
) -> Result<Box<dyn Compressor>, CompressorError> {
    match name {
        "zstd" => Ok(Box::new(zstd::ZstdCompressor::new(config))),
        "lz4" => Ok(Box::new(lz4::Lz4Compressor::new(config))),
        "snappy" => Ok(Box::new(snappy::SnappyCompressor::new(config))),
        "quantize" => Ok(Box::new(quantize::QuantizeCompressor::new(config))),
        _ => Err(CompressorError::UnknownCompressor(name.to_string())),
    }
}

/// Names accepted by [`create`].
pub const BACKENDS: [&str; 4] = ["zstd", "lz4", "snappy", "quantize"];

/// Validates the input buffer against the dimensions and returns the input
/// byte count the backend must consume.
pub(crate) fn checked_input_len(
    input: &Buffer,
    tag: TypeTag,
    dims: &Dims,
) -> Result<usize, CompressorError> {
    let required = dims.element_count() * tag.width();
    let actual = input.bytes().len();
    if actual < required {
        return Err(CompressorError::SizeMismatch { required, actual });
    }
    Ok(required)
}

pub(crate) fn require_init(initialized: bool) -> Result<(), CompressorError> {
    if initialized {
        Ok(())
    } else {
        Err(CompressorError::NotInitialized)
    }
}

pub(crate) fn backend_error(
    compressor: &str,
    phase: &'static str,
    detail: impl ToString,
) -> CompressorError {
    CompressorError::Backend {
        compressor: compressor.to_string(),
        phase,
        detail: detail.to_string(),
    }
}
