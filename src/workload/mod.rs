//! Run descriptions and synthetic input arrays.
//!
//! A run spec is a JSON file naming the input array (type, dimensions,
//! generator seed) and the compressors to measure over it.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::buffer::{Buffer, Dims, TypeTag, MAX_DIMS};
use crate::error::BenchError;

fn default_iterations() -> usize {
    1
}

/// One compressor to benchmark, with its string-valued parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressorSpec {
    pub name: String,
    #[serde(default)]
    pub params: FxHashMap<String, String>,
}

/// A full benchmark run description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSpec {
    /// Dataset label carried into results and log lines.
    pub name: String,
    /// Element type name, e.g. "double" or "int32_t".
    pub data_type: String,
    /// 1 to 5 extents; zeros beyond the first mark unused dimensions.
    pub dims: Vec<usize>,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    pub compressors: Vec<CompressorSpec>,
}

impl RunSpec {
    /// Loads a run spec from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<RunSpec, BenchError> {
        let content = fs::read_to_string(path)?;
        let spec: RunSpec = serde_json::from_str(&content)?;
        spec.validate()?;
        Ok(spec)
    }

    fn validate(&self) -> Result<(), BenchError> {
        if self.dims.is_empty() || self.dims.len() > MAX_DIMS {
            return Err(BenchError::Spec(format!(
                "dims must have 1 to {} extents, got {}",
                MAX_DIMS,
                self.dims.len()
            )));
        }
        if self.iterations == 0 {
            return Err(BenchError::Spec("iterations must be at least 1".to_string()));
        }
        if self.compressors.is_empty() {
            return Err(BenchError::Spec("no compressors listed".to_string()));
        }
        Ok(())
    }

    /// Type tag of the input array; unknown names are an explicit failure.
    pub fn data_tag(&self) -> Result<TypeTag, BenchError> {
        Ok(self.data_type.parse()?)
    }

    pub fn dimensions(&self) -> Result<Dims, BenchError> {
        Dims::from_slice(&self.dims)
            .ok_or_else(|| BenchError::Spec(format!("invalid dims {:?}", self.dims)))
    }
}

/// Fills a fresh buffer with deterministic synthetic data: floats uniform in
/// [0, 1), integers over the full range of their type.
pub fn generate_input(tag: TypeTag, dims: &Dims, seed: u64) -> Buffer {
    let count = dims.element_count();
    let mut buffer = Buffer::alloc(tag, count, 0);
    let mut rng = StdRng::seed_from_u64(seed);

    match tag {
        TypeTag::Float32 => {
            for v in buffer.as_mut_slice::<f32>() {
                *v = rng.gen();
            }
        }
        TypeTag::Float64 => {
            for v in buffer.as_mut_slice::<f64>() {
                *v = rng.gen();
            }
        }
        TypeTag::Int8 => {
            for v in buffer.as_mut_slice::<i8>() {
                *v = rng.gen();
            }
        }
        TypeTag::Int16 => {
            for v in buffer.as_mut_slice::<i16>() {
                *v = rng.gen();
            }
        }
        TypeTag::Int32 => {
            for v in buffer.as_mut_slice::<i32>() {
                *v = rng.gen();
            }
        }
        TypeTag::Int64 => {
            for v in buffer.as_mut_slice::<i64>() {
                *v = rng.gen();
            }
        }
        TypeTag::UInt8 => {
            for v in buffer.as_mut_slice::<u8>() {
                *v = rng.gen();
            }
        }
        TypeTag::UInt16 => {
            for v in buffer.as_mut_slice::<u16>() {
                *v = rng.gen();
            }
        }
        TypeTag::UInt32 => {
            for v in buffer.as_mut_slice::<u32>() {
                *v = rng.gen();
            }
        }
        TypeTag::UInt64 => {
            for v in buffer.as_mut_slice::<u64>() {
                *v = rng.gen();
            }
        }
    }

    buffer
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_spec_parses_from_json() {
        let json = r#"{
            "name": "synthetic-1d",
            "data_type": "double",
            "dims": [1000],
            "seed": 42,
            "iterations": 3,
            "compressors": [
                { "name": "quantize", "params": { "abs": "1e-3" } },
                { "name": "zstd" }
            ]
        }"#;
        let spec: RunSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.data_tag().unwrap(), TypeTag::Float64);
        assert_eq!(spec.dimensions().unwrap().element_count(), 1000);
        assert_eq!(spec.iterations, 3);
        assert_eq!(spec.compressors.len(), 2);
        assert_eq!(spec.compressors[0].params["abs"], "1e-3");
        assert!(spec.compressors[1].params.is_empty());
    }

    #[test]
    fn unknown_data_type_in_spec_fails() {
        let spec = RunSpec {
            name: "bad".to_string(),
            data_type: "float128".to_string(),
            dims: vec![10],
            seed: None,
            iterations: 1,
            compressors: vec![],
        };
        assert!(spec.data_tag().is_err());
    }

    #[test]
    fn oversized_dims_are_rejected() {
        let spec = RunSpec {
            name: "bad".to_string(),
            data_type: "float".to_string(),
            dims: vec![2, 2, 2, 2, 2, 2],
            seed: None,
            iterations: 1,
            compressors: vec![CompressorSpec {
                name: "zstd".to_string(),
                params: FxHashMap::default(),
            }],
        };
        assert!(spec.validate().is_err());
    }

    #[test]
    fn generation_is_deterministic_per_seed() {
        let dims = Dims::from_slice(&[100]).unwrap();
        let a = generate_input(TypeTag::Float64, &dims, 7);
        let b = generate_input(TypeTag::Float64, &dims, 7);
        let c = generate_input(TypeTag::Float64, &dims, 8);
        assert_eq!(a.bytes(), b.bytes());
        assert_ne!(a.bytes(), c.bytes());
    }

    #[test]
    fn float_inputs_stay_in_the_unit_interval() {
        let dims = Dims::from_slice(&[1000]).unwrap();
        let buffer = generate_input(TypeTag::Float64, &dims, 1);
        for &v in buffer.as_slice::<f64>() {
            assert!((0.0..1.0).contains(&v));
        }
    }
}
