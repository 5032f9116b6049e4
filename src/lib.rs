pub mod benchmark;
pub mod buffer;
pub mod compressor;
pub mod config;
pub mod error;
pub mod memory;
pub mod timer;
pub mod workload;
