use crate::buffer::{Buffer, Dims, TypeTag};
use crate::compressor::{backend_error, checked_input_len, require_init, Compressor, EncodedStream};
use crate::config::CompressorConfig;
use crate::error::CompressorError;

/// Lossless zstd backend. Reads a `level` parameter (library default level
/// when absent or empty) and accepts every supported type tag.
pub struct ZstdCompressor {
    config: CompressorConfig,
    initialized: bool,
}

impl ZstdCompressor {
    pub fn new(config: CompressorConfig) -> Self {
        ZstdCompressor {
            config,
            initialized: false,
        }
    }

    fn level(&self) -> Result<i32, CompressorError> {
        Ok(self
            .config
            .get_or("level", zstd::DEFAULT_COMPRESSION_LEVEL)?)
    }
}

impl Compressor for ZstdCompressor {
    fn name(&self) -> &str {
        "zstd"
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
        let level = self.level()?;

        // Output sized to the backend's declared upper bound, trimmed after.
        let mut dst = vec![0u8; zstd::zstd_safe::compress_bound(src.len())];
        let written = zstd::bulk::compress_to_buffer(src, &mut dst[..], level)
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
        let mut output = Buffer::alloc(tag, element_count, 0);

        let written = zstd::bulk::decompress_to_buffer(encoded.bytes(), output.bytes_mut())
            .map_err(|e| backend_error(self.name(), "decompress", e))?;
        if written != element_count * tag.width() {
            return Err(backend_error(
                self.name(),
                "decompress",
                format!(
                    "decoded {} bytes, expected {}",
                    written,
                    element_count * tag.width()
                ),
            ));
        }

        Ok(output)
    }

    fn close(&mut self) {
        self.initialized = false;
    }
}
