use lz4::block;

use crate::buffer::{Buffer, Dims, TypeTag};
use crate::compressor::{backend_error, checked_input_len, require_init, Compressor, EncodedStream};
use crate::config::CompressorConfig;
use crate::error::CompressorError;

/// Lossless LZ4 block backend. Accepts every supported type tag. A `level`
/// parameter above 0 switches to high-compression mode at that level; the
/// default is the fast path.
pub struct Lz4Compressor {
    config: CompressorConfig,
    initialized: bool,
}

impl Lz4Compressor {
    pub fn new(config: CompressorConfig) -> Self {
        Lz4Compressor {
            config,
            initialized: false,
        }
    }

    fn mode(&self) -> Result<Option<block::CompressionMode>, CompressorError> {
        match self.config.get_or("level", 0i32)? {
            0 => Ok(None),
            level => Ok(Some(block::CompressionMode::HIGHCOMPRESSION(level))),
        }
    }
}

impl Compressor for Lz4Compressor {
    fn name(&self) -> &str {
        "lz4"
    }

    fn init(&mut self) -> Result<(), CompressorError> {
        self.initialized = true;
        Ok(())
    }

    fn compress(
        &mut self,
        input: &Buffer,
        tag: TypeTag,
        dims: &Dims,
    ) -> Result<EncodedStream, CompressorError> {
        require_init(self.initialized)?;
        let input_len = checked_input_len(input, tag, dims)?;
        let src = &input.bytes()[..input_len];
        let mode = self.mode()?;

        // No prepended size; the caller's dims carry the decoded length.
        let encoded = block::compress(src, mode, false)
            .map_err(|e| backend_error(self.name(), "compress", e))?;

        Ok(EncodedStream::new(encoded))
    }

    fn decompress(
        &mut self,
        encoded: &EncodedStream,
        tag: TypeTag,
        dims: &Dims,
    ) -> Result<Buffer, CompressorError> {
        require_init(self.initialized)?;
        let element_count = dims.element_count();
        let output_len = element_count * tag.width();

        let decoded = block::decompress(encoded.bytes(), Some(output_len as i32))
            .map_err(|e| backend_error(self.name(), "decompress", e))?;
        if decoded.len() != output_len {
            return Err(backend_error(
                self.name(),
                "decompress",
                format!("decoded {} bytes, expected {}", decoded.len(), output_len),
            ));
        }

        let mut output = Buffer::alloc(tag, element_count, 0);
        output.bytes_mut().copy_from_slice(&decoded);
        Ok(output)
    }

    fn close(&mut self) {
        self.initialized = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_is_bit_exact() {
        let dims = Dims::from_slice(&[512]).unwrap();
        let mut input = Buffer::alloc(TypeTag::Int64, dims.element_count(), 0);
        for (i, v) in input.as_mut_slice::<i64>().iter_mut().enumerate() {
            *v = (i as i64) * 37 - 9000;
        }

        let mut compressor = Lz4Compressor::new(CompressorConfig::new());
        compressor.init().unwrap();
        let encoded = compressor.compress(&input, TypeTag::Int64, &dims).unwrap();
        let decoded = compressor
            .decompress(&encoded, TypeTag::Int64, &dims)
            .unwrap();

        assert_eq!(input.bytes(), decoded.bytes());
    }

    #[test]
    fn corrupt_stream_is_a_backend_error() {
        let dims = Dims::from_slice(&[512]).unwrap();
        let garbage = EncodedStream::new(vec![0xFF; 16]);

        let mut compressor = Lz4Compressor::new(CompressorConfig::new());
        compressor.init().unwrap();
        let err = compressor.decompress(&garbage, TypeTag::Int64, &dims).err();
        assert!(matches!(err, Some(CompressorError::Backend { .. })));
    }
}
