//! Compression configuration

use crate::{Result, VqError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Parameters for one compression run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VqConfig {
    /// Block height in samples
    pub block_height: usize,
    /// Block width in samples
    pub block_width: usize,
    /// Target number of codewords
    pub num_codewords: usize,
    /// Maximum Lloyd iterations while converging
    pub max_iterations: usize,
    /// Search for nearest codewords on the rayon pool
    pub parallel: bool,
}

impl Default for VqConfig {
    fn default() -> Self {
        Self {
            block_height: 8,
            block_width: 8,
            num_codewords: 64,
            max_iterations: 100,
            parallel: true,
        }
    }
}

impl VqConfig {
    /// Create a config with validation
    pub fn new(block_height: usize, block_width: usize, num_codewords: usize) -> Result<Self> {
        let config = Self {
            block_height,
            block_width,
            num_codewords,
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Small blocks, small codebook
    pub fn fast() -> Self {
        Self {
            block_height: 4,
            block_width: 4,
            num_codewords: 16,
            max_iterations: 25,
            parallel: true,
        }
    }

    /// Small blocks, large codebook
    pub fn quality() -> Self {
        Self {
            block_height: 4,
            block_width: 4,
            num_codewords: 256,
            max_iterations: 200,
            parallel: true,
        }
    }

    /// Check that every parameter is usable
    pub fn validate(&self) -> Result<()> {
        if self.block_height == 0 || self.block_width == 0 {
            return Err(VqError::dimensions(format!(
                "block size must be positive, got {}x{}",
                self.block_height, self.block_width
            )));
        }
        if self.num_codewords == 0 {
            return Err(VqError::InvalidConfig(
                "num_codewords must be at least 1".into(),
            ));
        }
        if self.max_iterations == 0 {
            return Err(VqError::InvalidConfig(
                "max_iterations must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Load and validate a JSON config file. Missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self =
            serde_json::from_str(&text).map_err(|e| VqError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Bits per sample the index grid costs, ignoring the codebook
    pub fn bits_per_sample(&self) -> f32 {
        crate::codebook::index_bits_for(self.num_codewords) as f32
            / (self.block_height * self.block_width) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_front_end() {
        let config = VqConfig::default();
        assert_eq!((config.block_height, config.block_width), (8, 8));
        assert_eq!(config.num_codewords, 64);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        assert!(VqConfig::new(0, 4, 16).is_err());
        assert!(matches!(
            VqConfig::new(4, 4, 0),
            Err(VqError::InvalidConfig(_))
        ));

        let config = VqConfig {
            max_iterations: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_presets() {
        let fast = VqConfig::fast();
        let quality = VqConfig::quality();
        assert!(fast.validate().is_ok());
        assert!(quality.validate().is_ok());

        assert_eq!((quality.block_height, quality.block_width), (4, 4));
        assert_eq!(quality.num_codewords, 256);
        assert!(quality.max_iterations > fast.max_iterations);
        assert!(quality.bits_per_sample() > fast.bits_per_sample());
    }

    #[test]
    fn test_bits_per_sample() {
        let config = VqConfig::default();
        assert!((config.bits_per_sample() - 6.0 / 64.0).abs() < 1e-6);
    }

    #[test]
    fn test_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vq.json");
        std::fs::write(&path, r#"{ "block_height": 4, "num_codewords": 32 }"#).unwrap();

        let config = VqConfig::from_json_file(&path).unwrap();
        assert_eq!(config.block_height, 4);
        assert_eq!(config.block_width, 8);
        assert_eq!(config.num_codewords, 32);

        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            VqConfig::from_json_file(&path),
            Err(VqError::InvalidConfig(_))
        ));
    }
}
