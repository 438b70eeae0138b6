//! Nearest-codeword search
//!
//! Training and encoding both go through [`CodewordSearch`], so an indexed
//! search structure can replace the linear scan without touching either.

use crate::distance::distance;
use crate::{Block, Result, VqError};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Finds the codeword closest to a block.
pub trait CodewordSearch: Send + Sync {
    /// Index and squared distance of the nearest codeword, `None` when
    /// `codewords` is empty.
    ///
    /// Ties must resolve to the lowest index so results are reproducible.
    fn nearest(&self, codewords: &[Block], block: &Block) -> Option<(usize, f64)>;

    /// Nearest codeword index for every block, in block order.
    fn assign(&self, codewords: &[Block], blocks: &[Block], parallel: bool) -> Result<Vec<usize>> {
        if codewords.is_empty() {
            return Err(VqError::EncodingError(
                "cannot assign blocks to an empty codebook".into(),
            ));
        }

        let pick = |block: &Block| {
            self.nearest(codewords, block)
                .map(|(idx, _)| idx)
                .filter(|&idx| idx < codewords.len())
        };

        map_blocks(blocks, parallel, pick)
            .into_iter()
            .enumerate()
            .map(|(position, idx)| {
                idx.ok_or_else(|| {
                    VqError::EncodingError(format!(
                        "no codeword among {} found for block {}",
                        codewords.len(),
                        position
                    ))
                })
            })
            .collect()
    }
}

#[cfg(feature = "parallel")]
fn map_blocks<F>(blocks: &[Block], parallel: bool, f: F) -> Vec<Option<usize>>
where
    F: Fn(&Block) -> Option<usize> + Send + Sync,
{
    if parallel {
        blocks.par_iter().map(f).collect()
    } else {
        blocks.iter().map(f).collect()
    }
}

#[cfg(not(feature = "parallel"))]
fn map_blocks<F>(blocks: &[Block], _parallel: bool, f: F) -> Vec<Option<usize>>
where
    F: Fn(&Block) -> Option<usize> + Send + Sync,
{
    blocks.iter().map(f).collect()
}

/// Exhaustive scan over the codebook.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearSearch;

impl CodewordSearch for LinearSearch {
    fn nearest(&self, codewords: &[Block], block: &Block) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;

        for (i, codeword) in codewords.iter().enumerate() {
            let dist = distance(codeword, block);
            match best {
                // strict less-than keeps the first minimum
                Some((_, best_dist)) if dist >= best_dist => {}
                _ => best = Some((i, dist)),
            }
        }

        best
    }
}
