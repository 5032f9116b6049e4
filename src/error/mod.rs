use thiserror::Error;

/// Failure at an allocation boundary that accepts type names from outside the core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocError {
    #[error("unknown data type \"{0}\"")]
    UnknownTypeName(String),
}

/// Failure while coercing a string-valued compressor parameter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("parameter \"{key}\" has invalid value \"{value}\"")]
    InvalidValue { key: String, value: String },
}

/// Failures raised by a compressor plugin. Backend failures abort the run;
/// they are never retried by the harness.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompressorError {
    #[error("compressor used before init()")]
    NotInitialized,

    #[error("compressor \"{compressor}\" does not support data type \"{datatype}\"")]
    UnsupportedDataType {
        compressor: String,
        datatype: &'static str,
    },

    #[error("input buffer holds {actual} bytes but dimensions require {required}")]
    SizeMismatch { required: usize, actual: usize },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("\"{compressor}\" backend failed during {phase}: {detail}")]
    Backend {
        compressor: String,
        phase: &'static str,
        detail: String,
    },

    #[error("unknown compressor \"{0}\"")]
    UnknownCompressor(String),
}

/// Top-level error for a benchmark run and the CLI path around it.
#[derive(Debug, Error)]
pub enum BenchError {
    #[error(transparent)]
    Alloc(#[from] AllocError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Compressor(#[from] CompressorError),

    #[error("invalid run spec: {0}")]
    Spec(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
