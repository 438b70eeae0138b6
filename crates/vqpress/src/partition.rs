//! Block partitioning of sample grids

use crate::{Block, Result, SampleGrid, VqError};
use tracing::debug;

/// Blocks cut from a grid, in row-major block order.
#[derive(Debug, Clone)]
pub struct Partition {
    /// Copied blocks, outer loop over block rows
    pub blocks: Vec<Block>,
    /// Number of block rows
    pub rows: usize,
    /// Number of block columns
    pub cols: usize,
    /// Block height
    pub block_height: usize,
    /// Block width
    pub block_width: usize,
}

impl Partition {
    /// Grid height actually covered by blocks
    pub fn covered_height(&self) -> usize {
        self.rows * self.block_height
    }

    /// Grid width actually covered by blocks
    pub fn covered_width(&self) -> usize {
        self.cols * self.block_width
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Slice `grid` into non-overlapping `block_height x block_width` blocks.
///
/// Rows and columns that do not fill a whole block at the bottom and right
/// edges are dropped.
pub fn partition(grid: &SampleGrid, block_height: usize, block_width: usize) -> Result<Partition> {
    if block_height == 0 || block_width == 0 {
        return Err(VqError::dimensions(format!(
            "block size must be positive, got {}x{}",
            block_height, block_width
        )));
    }

    if block_height > grid.height() || block_width > grid.width() {
        return Err(VqError::dimensions(format!(
            "block {}x{} does not fit in {}x{} grid",
            block_height,
            block_width,
            grid.height(),
            grid.width()
        )));
    }

    let rows = grid.height() / block_height;
    let cols = grid.width() / block_width;

    let dropped_rows = grid.height() % block_height;
    let dropped_cols = grid.width() % block_width;
    if dropped_rows != 0 || dropped_cols != 0 {
        debug!(
            dropped_rows,
            dropped_cols, "cropping grid to a whole number of blocks"
        );
    }

    let mut blocks = Vec::with_capacity(rows * cols);
    for r in 0..rows {
        for c in 0..cols {
            blocks.push(grid.copy_block(
                r * block_height,
                c * block_width,
                block_height,
                block_width,
            ));
        }
    }

    Ok(Partition {
        blocks,
        rows,
        cols,
        block_height,
        block_width,
    })
}
