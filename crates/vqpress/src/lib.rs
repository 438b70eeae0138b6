//! Vector Quantization Image Compression
//!
//! Lossy grayscale image compression with codebooks trained by the
//! Linde-Buzo-Gray algorithm.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    VQ Compression                                │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                  │
//! │  Compress:                                                       │
//! │  ┌─────────┐    ┌─────────┐    ┌─────────┐    ┌─────────┐       │
//! │  │ Sample  │ -> │ Block   │ -> │  LBG    │ -> │ Encoder │       │
//! │  │ Grid    │    │Partition│    │ Trainer │    │         │       │
//! │  └─────────┘    └─────────┘    └─────────┘    └────┬────┘       │
//! │                                                    ↓            │
//! │                               {index grid, codebook} -> .bin    │
//! │                                                                  │
//! │  Decompress:                                                     │
//! │  .bin -> {index grid, codebook} -> Decoder -> Sample Grid       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use vqpress::prelude::*;
//!
//! # fn main() -> vqpress::Result<()> {
//! let grid = vqpress::read_luminance("photo.png")?;
//! let compressed = Compressor::new(VqConfig::default())?.compress(&grid)?;
//! compressed.save("photo.bin")?;
//!
//! let file = VqFile::load("photo.bin")?;
//! let restored = vqpress::decompress(
//!     &file.index_grid,
//!     &file.codebook,
//!     file.codebook.block_height(),
//!     file.codebook.block_width(),
//! )?;
//! vqpress::write_luminance(&restored, "restored.png")?;
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - `image` (default): read and write image files as luminance grids
//! - `parallel` (default): rayon nearest-codeword search

mod codebook;
mod config;
mod decoder;
pub mod distance;
mod encoder;
mod error;
mod format;
mod grid;
#[cfg(feature = "image")]
mod image_io;
mod partition;
mod pipeline;
pub mod search;
mod training;

pub use codebook::{format_index, index_bits_for, Codebook};
pub use config::VqConfig;
pub use decoder::{decode, decoded_shape};
pub use encoder::{encode, IndexGrid, MAX_INDEX_BITS};
pub use error::{Result, VqError};
pub use format::{encoded_len, read, write, VqFile};
pub use grid::{Block, SampleGrid};
#[cfg(feature = "image")]
pub use image_io::{image_of, luminance_of, read_luminance, write_luminance};
pub use partition::{partition, Partition};
pub use pipeline::{
    compress, decompress, psnr, CompressedImage, CompressionStats, Compressor, PEAK_SAMPLE,
};
pub use search::{CodewordSearch, LinearSearch};
pub use training::{split, LbgTrainer, TrainedCodebook, TrainingStats};

/// Conventional extension for compressed images
pub const VQ_EXTENSION: &str = "bin";

/// Prelude for common imports
pub mod prelude {
    pub use super::{
        Codebook, CompressedImage, Compressor, IndexGrid, Result, SampleGrid, VqConfig, VqError,
        VqFile,
    };
}
