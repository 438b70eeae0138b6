//! Distance and centroid primitives over blocks

use crate::{Block, Result, VqError};

/// Squared Euclidean distance between two equally shaped blocks.
///
/// Accumulates in `f64`. No square root is taken; callers only compare.
#[inline]
pub fn distance(a: &Block, b: &Block) -> f64 {
    debug_assert_eq!(a.shape(), b.shape(), "distance between mismatched blocks");
    a.data()
        .iter()
        .zip(b.data().iter())
        .map(|(&x, &y)| {
            let d = x as f64 - y as f64;
            d * d
        })
        .sum()
}

/// Element-wise mean of a set of equally shaped blocks.
pub fn centroid<'a, I>(blocks: I) -> Result<Block>
where
    I: IntoIterator<Item = &'a Block>,
{
    let mut iter = blocks.into_iter();
    let first = iter.next().ok_or(VqError::EmptyCluster)?;

    let (height, width) = first.shape();
    let mut sums: Vec<f64> = first.data().iter().map(|&v| v as f64).collect();
    let mut count = 1usize;

    for block in iter {
        debug_assert_eq!(block.shape(), (height, width), "centroid of mismatched blocks");
        for (s, &v) in sums.iter_mut().zip(block.data().iter()) {
            *s += v as f64;
        }
        count += 1;
    }

    let mut mean = Block::zeros(height, width);
    for (m, s) in mean.data_mut().iter_mut().zip(sums) {
        *m = (s / count as f64) as f32;
    }
    Ok(mean)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(values: &[f32]) -> Block {
        Block::from_vec(1, values.len(), values.to_vec()).unwrap()
    }

    #[test]
    fn test_distance_is_squared() {
        let a = block(&[0.0, 0.0]);
        let b = block(&[3.0, 4.0]);
        assert_eq!(distance(&a, &b), 25.0);
        assert_eq!(distance(&b, &a), 25.0);
        assert_eq!(distance(&a, &a), 0.0);
    }

    #[test]
    fn test_centroid_mean() {
        let blocks = [block(&[1.0, 10.0]), block(&[3.0, 20.0]), block(&[5.0, 30.0])];
        let c = centroid(&blocks).unwrap();
        assert_eq!(c.data(), &[3.0, 20.0]);
    }

    #[test]
    fn test_centroid_single_block() {
        let b = Block::filled(8, 8, 100.0);
        assert_eq!(centroid([&b]).unwrap(), b);
    }

    #[test]
    fn test_centroid_empty() {
        let empty: Vec<Block> = Vec::new();
        assert!(matches!(centroid(&empty), Err(VqError::EmptyCluster)));
    }
}
