//! Error-bounded lossy backend for floating-point arrays.
//!
//! Uniform scalar quantization: every value is snapped to the nearest
//! multiple of `2 * abs`, which bounds the reconstruction error by `abs`.
//! The quantized plane of 64-bit integers is then entropy coded with zstd.
//! Integer tags are rejected; an error bound on integers has no meaning here.

use crate::buffer::{Buffer, Dims, TypeTag};
use crate::compressor::{backend_error, checked_input_len, require_init, Compressor, EncodedStream};
use crate::config::CompressorConfig;
use crate::error::{CompressorError, ConfigError};

/// Default absolute error tolerance when the `abs` parameter is absent.
pub const DEFAULT_ABS: f64 = 1e-3;

/// Lossy quantizing backend. Parameters: `abs` (absolute error tolerance,
/// default 1e-3, must be > 0) and `level` (zstd level for the entropy stage).
pub struct QuantizeCompressor {
    config: CompressorConfig,
    initialized: bool,
}

impl QuantizeCompressor {
    pub fn new(config: CompressorConfig) -> Self {
        QuantizeCompressor {
            config,
            initialized: false,
        }
    }

    fn tolerance(&self) -> Result<f64, CompressorError> {
        let abs = self.config.get_or("abs", DEFAULT_ABS)?;
        if abs <= 0.0 || !abs.is_finite() {
            return Err(CompressorError::Config(ConfigError::InvalidValue {
                key: "abs".to_string(),
                value: abs.to_string(),
            }));
        }
        Ok(abs)
    }

    fn level(&self) -> Result<i32, CompressorError> {
        Ok(self
            .config
            .get_or("level", zstd::DEFAULT_COMPRESSION_LEVEL)?)
    }

    fn unsupported(&self, tag: TypeTag) -> CompressorError {
        CompressorError::UnsupportedDataType {
            compressor: self.name().to_string(),
            datatype: tag.name(),
        }
    }

    fn quantize_plane(&self, input: &Buffer, tag: TypeTag, count: usize, step: f64) -> Vec<u8> {
        let mut plane = vec![0u8; count * 8];
        match tag {
            TypeTag::Float32 => {
                let values = &input.as_slice::<f32>()[..count];
                for (chunk, &v) in plane.chunks_exact_mut(8).zip(values) {
                    let q = (v as f64 / step).round() as i64;
                    chunk.copy_from_slice(&q.to_le_bytes());
                }
            }
            TypeTag::Float64 => {
                let values = &input.as_slice::<f64>()[..count];
                for (chunk, &v) in plane.chunks_exact_mut(8).zip(values) {
                    let q = (v / step).round() as i64;
                    chunk.copy_from_slice(&q.to_le_bytes());
                }
            }
            _ => unreachable!("tag validated before quantization"),
        }
        plane
    }

    fn reconstruct(&self, plane: &[u8], tag: TypeTag, step: f64) -> Buffer {
        let count = plane.len() / 8;
        let mut output = Buffer::alloc(tag, count, 0);
        match tag {
            TypeTag::Float32 => {
                for (v, chunk) in output
                    .as_mut_slice::<f32>()
                    .iter_mut()
                    .zip(plane.chunks_exact(8))
                {
                    let q = i64::from_le_bytes(chunk.try_into().unwrap());
                    *v = (q as f64 * step) as f32;
                }
            }
            TypeTag::Float64 => {
                for (v, chunk) in output
                    .as_mut_slice::<f64>()
                    .iter_mut()
                    .zip(plane.chunks_exact(8))
                {
                    let q = i64::from_le_bytes(chunk.try_into().unwrap());
                    *v = q as f64 * step;
                }
            }
            _ => unreachable!("tag validated before reconstruction"),
        }
        output
    }
}

impl Compressor for QuantizeCompressor {
    fn name(&self) -> &str {
        "quantize"
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
        if !matches!(tag, TypeTag::Float32 | TypeTag::Float64) {
            return Err(self.unsupported(tag));
        }
        checked_input_len(input, tag, dims)?;

        let abs = self.tolerance()?;
        let level = self.level()?;
        let count = dims.element_count();
        let plane = self.quantize_plane(input, tag, count, 2.0 * abs);

        let mut dst = vec![0u8; zstd::zstd_safe::compress_bound(plane.len())];
        let written = zstd::bulk::compress_to_buffer(&plane, &mut dst[..], level)
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
        if !matches!(tag, TypeTag::Float32 | TypeTag::Float64) {
            return Err(self.unsupported(tag));
        }

        // Same config-derived parameters as the paired compress call.
        let abs = self.tolerance()?;
        let count = dims.element_count();

        let plane_len = count * 8;
        let mut plane = vec![0u8; plane_len];
        let written = zstd::bulk::decompress_to_buffer(encoded.bytes(), &mut plane[..])
            .map_err(|e| backend_error(self.name(), "decompress", e))?;
        if written != plane_len {
            return Err(backend_error(
                self.name(),
                "decompress",
                format!("decoded {} bytes, expected {}", written, plane_len),
            ));
        }

        Ok(self.reconstruct(&plane, tag, 2.0 * abs))
    }

    fn close(&mut self) {
        self.initialized = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(key: &str, value: &str) -> CompressorConfig {
        let mut config = CompressorConfig::new();
        config.set(key, value);
        config
    }

    #[test]
    fn reconstruction_stays_within_the_tolerance() {
        let abs = 1e-3;
        let dims = Dims::from_slice(&[500]).unwrap();
        let mut input = Buffer::alloc(TypeTag::Float64, dims.element_count(), 0);
        for (i, v) in input.as_mut_slice::<f64>().iter_mut().enumerate() {
            *v = (i as f64 * 0.7).cos();
        }

        let mut compressor = QuantizeCompressor::new(config_with("abs", "1e-3"));
        compressor.init().unwrap();
        let encoded = compressor.compress(&input, TypeTag::Float64, &dims).unwrap();
        let decoded = compressor
            .decompress(&encoded, TypeTag::Float64, &dims)
            .unwrap();

        for (&original, &rebuilt) in input
            .as_slice::<f64>()
            .iter()
            .zip(decoded.as_slice::<f64>())
        {
            assert!((original - rebuilt).abs() <= abs);
        }
    }

    #[test]
    fn integer_tags_are_rejected_loudly() {
        let dims = Dims::from_slice(&[16]).unwrap();
        let input = Buffer::alloc(TypeTag::Int32, dims.element_count(), 0);

        let mut compressor = QuantizeCompressor::new(CompressorConfig::new());
        compressor.init().unwrap();
        let err = compressor.compress(&input, TypeTag::Int32, &dims).err();
        assert_eq!(
            err,
            Some(CompressorError::UnsupportedDataType {
                compressor: "quantize".to_string(),
                datatype: "int32_t",
            })
        );
    }

    #[test]
    fn missing_and_empty_abs_fall_back_to_the_default() {
        for config in [CompressorConfig::new(), config_with("abs", "")] {
            let compressor = QuantizeCompressor::new(config);
            assert_eq!(compressor.tolerance().unwrap(), DEFAULT_ABS);
        }
    }

    #[test]
    fn non_positive_tolerance_is_rejected() {
        for value in ["0", "-0.5", "nan"] {
            let compressor = QuantizeCompressor::new(config_with("abs", value));
            assert!(matches!(
                compressor.tolerance(),
                Err(CompressorError::Config(_))
            ));
        }
    }

    #[test]
    fn float32_inputs_are_supported() {
        let dims = Dims::from_slice(&[128]).unwrap();
        let mut input = Buffer::alloc(TypeTag::Float32, dims.element_count(), 0);
        for (i, v) in input.as_mut_slice::<f32>().iter_mut().enumerate() {
            *v = i as f32 / 128.0;
        }

        let mut compressor = QuantizeCompressor::new(config_with("abs", "0.01"));
        compressor.init().unwrap();
        let encoded = compressor.compress(&input, TypeTag::Float32, &dims).unwrap();
        let decoded = compressor
            .decompress(&encoded, TypeTag::Float32, &dims)
            .unwrap();

        for (&original, &rebuilt) in input
            .as_slice::<f32>()
            .iter()
            .zip(decoded.as_slice::<f32>())
        {
            // Quantization error plus one f32 rounding step.
            assert!((original - rebuilt).abs() <= 0.01 + f32::EPSILON);
        }
    }
}
