use snap::raw::{max_compress_len, Decoder, Encoder};

use crate::buffer::{Buffer, Dims, TypeTag};
use crate::compressor::{backend_error, checked_input_len, require_init, Compressor, EncodedStream};
use crate::config::CompressorConfig;
use crate::error::CompressorError;

/// Lossless Snappy backend. Accepts every supported type tag; Snappy has no
/// tunable parameters.
pub struct SnappyCompressor {
    initialized: bool,
}

impl SnappyCompressor {
    pub fn new(_config: CompressorConfig) -> Self {
        SnappyCompressor { initialized: false }
    }
}

impl Compressor for SnappyCompressor {
    fn name(&self) -> &str {
        "snappy"
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

        let mut dst = vec![0u8; max_compress_len(src.len())];
        let written = Encoder::new()
            .compress(src, &mut dst)
            .map_err(|e| backend_error(self.name(), "compress", e))?;
        dst.truncate(written);

        Ok(EncodedStream::new(dst))
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
        let mut output = Buffer::alloc(tag, element_count, 0);

        let written = Decoder::new()
            .decompress(encoded.bytes(), output.bytes_mut())
            .map_err(|e| backend_error(self.name(), "decompress", e))?;
        if written != output_len {
            return Err(backend_error(
                self.name(),
                "decompress",
                format!("decoded {} bytes, expected {}", written, output_len),
            ));
        }

        Ok(output)
    }

    fn close(&mut self) {
        self.initialized = false;
    }
}
