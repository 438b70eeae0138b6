//! Sample grids and the fixed-size blocks cut from them

use crate::{Result, VqError};

/// A row-major matrix of luminance samples.
///
/// Samples are conceptually 0-255 but are never clamped here; clamping only
/// happens when a grid is handed to an image encoder.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleGrid {
    height: usize,
    width: usize,
    samples: Vec<f32>,
}

impl SampleGrid {
    /// Create a zero-filled grid
    pub fn new(height: usize, width: usize) -> Self {
        Self {
            height,
            width,
            samples: vec![0.0; height * width],
        }
    }

    /// Create a grid where every sample has the same value
    pub fn filled(height: usize, width: usize, value: f32) -> Self {
        Self {
            height,
            width,
            samples: vec![value; height * width],
        }
    }

    /// Wrap row-major samples
    pub fn from_samples(height: usize, width: usize, samples: Vec<f32>) -> Result<Self> {
        if samples.len() != height * width {
            return Err(VqError::dimensions(format!(
                "{} samples cannot fill a {}x{} grid",
                samples.len(),
                height,
                width
            )));
        }
        Ok(Self {
            height,
            width,
            samples,
        })
    }

    /// Build from nested rows. Every row must have the same length.
    pub fn from_rows(rows: &[Vec<f32>]) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map(Vec::len).unwrap_or(0);
        let mut samples = Vec::with_capacity(height * width);

        for (r, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(VqError::dimensions(format!(
                    "row {} has {} samples, expected {}",
                    r,
                    row.len(),
                    width
                )));
            }
            samples.extend_from_slice(row);
        }

        Ok(Self {
            height,
            width,
            samples,
        })
    }

    /// Build a grid by evaluating `f(row, col)` for every position
    pub fn from_fn(height: usize, width: usize, mut f: impl FnMut(usize, usize) -> f32) -> Self {
        let mut samples = Vec::with_capacity(height * width);
        for r in 0..height {
            for c in 0..width {
                samples.push(f(r, c));
            }
        }
        Self {
            height,
            width,
            samples,
        }
    }

    /// Number of rows
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.width
    }

    /// True when the grid holds no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample at `(row, col)`
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.height || col >= self.width {
            return None;
        }
        Some(self.samples[row * self.width + col])
    }

    /// Overwrite the sample at `(row, col)`. Out-of-range positions are ignored.
    pub fn set(&mut self, row: usize, col: usize, value: f32) {
        if row < self.height && col < self.width {
            self.samples[row * self.width + col] = value;
        }
    }

    /// One row as a slice
    pub fn row(&self, row: usize) -> &[f32] {
        let start = row * self.width;
        &self.samples[start..start + self.width]
    }

    /// All samples, row-major
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Keep only the top-left `height x width` region
    pub fn cropped(&self, height: usize, width: usize) -> SampleGrid {
        let height = height.min(self.height);
        let width = width.min(self.width);

        if height == self.height && width == self.width {
            return self.clone();
        }

        let mut samples = Vec::with_capacity(height * width);
        for r in 0..height {
            samples.extend_from_slice(&self.row(r)[..width]);
        }

        SampleGrid {
            height,
            width,
            samples,
        }
    }

    /// Copy the `block_height x block_width` region whose top-left corner is `(row, col)`
    pub(crate) fn copy_block(
        &self,
        row: usize,
        col: usize,
        block_height: usize,
        block_width: usize,
    ) -> Block {
        let mut data = Vec::with_capacity(block_height * block_width);
        for r in row..row + block_height {
            data.extend_from_slice(&self.row(r)[col..col + block_width]);
        }
        Block {
            height: block_height,
            width: block_width,
            data,
        }
    }

    /// Write a block into the region whose top-left corner is `(row, col)`
    pub(crate) fn paste_block(&mut self, row: usize, col: usize, block: &Block) {
        for (dr, src) in block.data.chunks_exact(block.width).enumerate() {
            let start = (row + dr) * self.width + col;
            self.samples[start..start + block.width].copy_from_slice(src);
        }
    }
}

/// A `height x width` patch of samples, stored row-major.
///
/// Used both for image blocks and for codewords.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    height: usize,
    width: usize,
    data: Vec<f32>,
}

impl Block {
    /// Create a zero block
    pub fn zeros(height: usize, width: usize) -> Self {
        Self {
            height,
            width,
            data: vec![0.0; height * width],
        }
    }

    /// Create a block with every cell set to `value`
    pub fn filled(height: usize, width: usize, value: f32) -> Self {
        Self {
            height,
            width,
            data: vec![value; height * width],
        }
    }

    /// Wrap row-major cell values
    pub fn from_vec(height: usize, width: usize, data: Vec<f32>) -> Result<Self> {
        if data.len() != height * width {
            return Err(VqError::dimensions(format!(
                "{} values cannot fill a {}x{} block",
                data.len(),
                height,
                width
            )));
        }
        Ok(Self {
            height,
            width,
            data,
        })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// `(height, width)`
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// Cell at `(row, col)`
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.height || col >= self.width {
            return None;
        }
        Some(self.data[row * self.width + col])
    }

    /// Cell values, row-major
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }
}
