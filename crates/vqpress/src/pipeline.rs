//! Compression and decompression entry points
//!
//! A [`Compressor`] owns everything one run needs. Nothing is shared between
//! runs, so separate compressors can work on separate images at the same
//! time.

use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::codebook::index_bits_for;
use crate::decoder::decode;
use crate::encoder::encode;
use crate::format::{encoded_len, VqFile};
use crate::partition::partition;
use crate::search::{CodewordSearch, LinearSearch};
use crate::training::LbgTrainer;
use crate::{Codebook, IndexGrid, Result, SampleGrid, VqConfig, VqError};

/// Peak sample value used for PSNR
pub const PEAK_SAMPLE: f64 = 255.0;

/// Statistics from one compression run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompressionStats {
    /// Mean squared error over the covered samples
    pub mse: f64,
    /// Peak signal-to-noise ratio in dB
    pub psnr: f64,
    /// Codewords in the final codebook
    pub codebook_size: usize,
    /// Split rounds performed while growing the codebook
    pub split_rounds: usize,
    /// Lloyd iterations while converging
    pub iterations: usize,
    /// Whether convergence happened before the iteration cap
    pub converged: bool,
    /// Input size at one byte per sample
    pub original_bytes: usize,
    /// Serialized file size
    pub compressed_bytes: usize,
    /// Wall time in microseconds
    pub elapsed_us: u64,
}

impl CompressionStats {
    /// original / compressed
    pub fn compression_ratio(&self) -> f64 {
        if self.compressed_bytes == 0 {
            return 0.0;
        }
        self.original_bytes as f64 / self.compressed_bytes as f64
    }
}

/// PSNR in dB for 8-bit samples
pub fn psnr(mse: f64) -> f64 {
    if mse < 1e-10 {
        return 100.0;
    }
    10.0 * (PEAK_SAMPLE * PEAK_SAMPLE / mse).log10()
}

/// Output of a compression run
#[derive(Debug, Clone)]
pub struct CompressedImage {
    /// One index per block
    pub index_grid: IndexGrid,
    /// Trained codebook
    pub codebook: Codebook,
    /// Run statistics
    pub stats: CompressionStats,
}

impl CompressedImage {
    /// Reconstruct the (cropped) image
    pub fn decompress(&self) -> Result<SampleGrid> {
        decode(&self.index_grid, &self.codebook)
    }

    /// Persist to `path`
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        VqFile::new(self.index_grid.clone(), self.codebook.clone()).save(path)
    }

    /// Drop the statistics and keep the persisted parts
    pub fn into_file(self) -> VqFile {
        VqFile::new(self.index_grid, self.codebook)
    }
}

/// Compression context: configuration plus the trainer built from it
#[derive(Debug, Clone)]
pub struct Compressor<S = LinearSearch> {
    config: VqConfig,
    trainer: LbgTrainer<S>,
}

impl Compressor<LinearSearch> {
    /// Create a compressor after validating `config`
    pub fn new(config: VqConfig) -> Result<Self> {
        config.validate()?;
        let trainer = LbgTrainer::from_config(&config);
        Ok(Self { config, trainer })
    }
}

impl<S: CodewordSearch> Compressor<S> {
    /// Swap the nearest-codeword search used for training
    pub fn with_search<T: CodewordSearch>(self, search: T) -> Compressor<T> {
        Compressor {
            config: self.config,
            trainer: self.trainer.with_search(search),
        }
    }

    /// Active configuration
    pub fn config(&self) -> &VqConfig {
        &self.config
    }

    /// Compress a sample grid
    pub fn compress(&self, grid: &SampleGrid) -> Result<CompressedImage> {
        let start = Instant::now();
        let config = &self.config;

        let blocks = partition(grid, config.block_height, config.block_width)?;
        let trained = self.trainer.train(&blocks.blocks)?;

        let codebook = Codebook::from_codewords(
            config.block_height,
            config.block_width,
            index_bits_for(config.num_codewords),
            trained.codewords,
        )?;
        let index_grid = encode(blocks.rows, blocks.cols, &trained.assignment, &codebook)?;

        let stats = CompressionStats {
            mse: trained.stats.mse,
            psnr: psnr(trained.stats.mse),
            codebook_size: codebook.len(),
            split_rounds: trained.stats.split_rounds,
            iterations: trained.stats.iterations,
            converged: trained.stats.converged,
            original_bytes: grid.height() * grid.width(),
            compressed_bytes: encoded_len(&index_grid, &codebook),
            elapsed_us: start.elapsed().as_micros() as u64,
        };

        info!(
            height = grid.height(),
            width = grid.width(),
            blocks = blocks.len(),
            codewords = stats.codebook_size,
            psnr = stats.psnr,
            ratio = stats.compression_ratio(),
            "compressed image"
        );

        Ok(CompressedImage {
            index_grid,
            codebook,
            stats,
        })
    }
}

/// Compress `grid` with `block_height x block_width` blocks and a codebook of
/// `num_codewords` entries.
pub fn compress(
    grid: &SampleGrid,
    block_height: usize,
    block_width: usize,
    num_codewords: usize,
) -> Result<(IndexGrid, Codebook)> {
    let config = VqConfig {
        block_height,
        block_width,
        num_codewords,
        ..Default::default()
    };
    let compressed = Compressor::new(config)?.compress(grid)?;
    Ok((compressed.index_grid, compressed.codebook))
}

/// Reconstruct a sample grid. The block size must match the codebook's.
pub fn decompress(
    index_grid: &IndexGrid,
    codebook: &Codebook,
    block_height: usize,
    block_width: usize,
) -> Result<SampleGrid> {
    if (block_height, block_width) != (codebook.block_height(), codebook.block_width()) {
        return Err(VqError::dimensions(format!(
            "block size {}x{} does not match codebook blocks {}x{}",
            block_height,
            block_width,
            codebook.block_height(),
            codebook.block_width()
        )));
    }
    decode(index_grid, codebook)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Block;

    #[test]
    fn test_flat_single_block() {
        let grid = SampleGrid::filled(8, 8, 100.0);
        let (index_grid, codebook) = compress(&grid, 8, 8, 1).unwrap();

        assert_eq!(codebook.len(), 1);
        assert_eq!(codebook.lookup("0").unwrap(), &Block::filled(8, 8, 100.0));
        assert_eq!((index_grid.rows(), index_grid.cols()), (1, 1));
        assert_eq!(index_grid.code_string(0, 0).as_deref(), Some("0"));

        let restored = decompress(&index_grid, &codebook, 8, 8).unwrap();
        assert_eq!(restored, grid);
    }

    #[test]
    fn test_two_tone_is_lossless() {
        let grid = SampleGrid::from_fn(8, 8, |r, _| if r < 4 { 20.0 } else { 220.0 });
        let config = VqConfig::new(2, 2, 2).unwrap();
        let compressed = Compressor::new(config).unwrap().compress(&grid).unwrap();

        assert_eq!(compressed.codebook.len(), 2);
        assert_eq!(compressed.stats.mse, 0.0);
        assert_eq!(compressed.stats.psnr, 100.0);
        assert_eq!(compressed.decompress().unwrap(), grid);
    }

    #[test]
    fn test_stats() {
        let grid = SampleGrid::from_fn(32, 32, |r, c| ((r * 7 + c * 3) % 256) as f32);
        let compressed = Compressor::new(VqConfig::fast())
            .unwrap()
            .compress(&grid)
            .unwrap();

        let stats = &compressed.stats;
        assert_eq!(stats.original_bytes, 1024);
        assert_eq!(
            stats.compressed_bytes,
            compressed.clone().into_file().to_bytes().unwrap().len()
        );
        assert!(stats.codebook_size <= 16);
        assert!(stats.psnr > 0.0);
    }

    #[test]
    fn test_decompress_checks_block_size() {
        let grid = SampleGrid::filled(4, 4, 1.0);
        let (index_grid, codebook) = compress(&grid, 2, 2, 1).unwrap();
        assert!(matches!(
            decompress(&index_grid, &codebook, 4, 4),
            Err(VqError::InvalidDimensions(_))
        ));
    }

    #[test]
    fn test_invalid_parameters() {
        let grid = SampleGrid::filled(4, 4, 1.0);
        assert!(matches!(
            compress(&grid, 8, 2, 4),
            Err(VqError::InvalidDimensions(_))
        ));
        assert!(matches!(
            compress(&grid, 2, 2, 0),
            Err(VqError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_psnr() {
        assert_eq!(psnr(0.0), 100.0);
        assert!((psnr(PEAK_SAMPLE * PEAK_SAMPLE) - 0.0).abs() < 1e-9);
        assert!(psnr(1.0) > psnr(10.0));
    }
}
