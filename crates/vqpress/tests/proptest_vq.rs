//! Property-based tests for VQ compression.
//!
//! These tests verify that compression properties hold across a range of inputs:
//! - Squared distance is symmetric and zero on the diagonal
//! - Compression is deterministic
//! - Partial edge rows/columns do not affect the result
//! - Decompression reproduces the covered grid shape with nearest codewords
//!
//! Run with: cargo test -p vqpress --test proptest_vq

use proptest::prelude::*;

use vqpress::distance::distance;
use vqpress::search::{CodewordSearch, LinearSearch};
use vqpress::{partition, Block, Compressor, SampleGrid, VqConfig};

/// Strategy for block edge lengths.
fn block_dim_strategy() -> impl Strategy<Value = usize> {
    prop_oneof![Just(1usize), Just(2), Just(3), Just(4)]
}

/// Strategy for codebook targets.
fn codewords_strategy() -> impl Strategy<Value = usize> {
    prop_oneof![Just(1usize), Just(2), Just(3), Just(4), Just(7), Just(8)]
}

/// Strategy for a grid of 8-bit-like intensities.
fn grid_strategy(height: usize, width: usize) -> impl Strategy<Value = SampleGrid> {
    prop::collection::vec(0u8..=255, height * width).prop_map(move |values| {
        SampleGrid::from_samples(height, width, values.into_iter().map(f32::from).collect())
            .expect("sizes match")
    })
}

fn config(bh: usize, bw: usize, n: usize) -> VqConfig {
    VqConfig {
        block_height: bh,
        block_width: bw,
        num_codewords: n,
        max_iterations: 200,
        parallel: false,
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 32,
        max_shrink_iters: 100,
        ..ProptestConfig::default()
    })]

    /// Property: distance(a, b) == distance(b, a) and distance(a, a) == 0.
    #[test]
    fn prop_distance_symmetry(
        a in prop::collection::vec(-1000.0f32..1000.0, 16),
        b in prop::collection::vec(-1000.0f32..1000.0, 16),
    ) {
        let a = Block::from_vec(4, 4, a).unwrap();
        let b = Block::from_vec(4, 4, b).unwrap();

        prop_assert_eq!(distance(&a, &b), distance(&b, &a));
        prop_assert_eq!(distance(&a, &a), 0.0);
        prop_assert!(distance(&a, &b) >= 0.0);
    }

    /// Property: two runs on the same input give identical results.
    #[test]
    fn prop_deterministic(
        bh in block_dim_strategy(),
        bw in block_dim_strategy(),
        n in codewords_strategy(),
        grid in grid_strategy(12, 12),
    ) {
        let compressor = Compressor::new(config(bh, bw, n)).unwrap();
        let first = compressor.compress(&grid).unwrap();
        let second = compressor.compress(&grid).unwrap();

        prop_assert_eq!(&first.codebook, &second.codebook);
        prop_assert_eq!(&first.index_grid, &second.index_grid);

        let parallel = Compressor::new(VqConfig { parallel: true, ..config(bh, bw, n) })
            .unwrap()
            .compress(&grid)
            .unwrap();
        prop_assert_eq!(&first.codebook, &parallel.codebook);
        prop_assert_eq!(&first.index_grid, &parallel.index_grid);
    }

    /// Property: extra rows/columns smaller than a block are ignored.
    #[test]
    fn prop_cropping(
        extra_rows in 1usize..4,
        extra_cols in 1usize..4,
        n in codewords_strategy(),
        grid in grid_strategy(11, 11),
    ) {
        // 4x4 blocks over an 8x8 core plus up to 3 extra rows and columns
        let padded = grid.cropped(8 + extra_rows, 8 + extra_cols);
        let core = grid.cropped(8, 8);

        let compressor = Compressor::new(config(4, 4, n)).unwrap();
        let from_padded = compressor.compress(&padded).unwrap();
        let from_core = compressor.compress(&core).unwrap();

        prop_assert_eq!(&from_padded.codebook, &from_core.codebook);
        prop_assert_eq!(&from_padded.index_grid, &from_core.index_grid);
    }

    /// Property: decompression has the covered shape and every block is the
    /// nearest codeword to the original block.
    #[test]
    fn prop_roundtrip_nearest_codeword(
        bh in block_dim_strategy(),
        bw in block_dim_strategy(),
        n in codewords_strategy(),
        grid in grid_strategy(12, 12),
    ) {
        let compressed = Compressor::new(config(bh, bw, n)).unwrap().compress(&grid).unwrap();
        let restored = compressed.decompress().unwrap();

        prop_assert_eq!(restored.height(), grid.height());
        prop_assert_eq!(restored.width(), grid.width());
        prop_assert!(compressed.codebook.len() <= n.next_power_of_two());

        let original = partition(&grid, bh, bw).unwrap();
        let rebuilt = partition(&restored, bh, bw).unwrap();
        let codewords = compressed.codebook.codewords();

        for (block, decoded) in original.blocks.iter().zip(rebuilt.blocks.iter()) {
            let (nearest, best) = LinearSearch.nearest(codewords, block).unwrap();
            prop_assert_eq!(distance(block, decoded), best);
            prop_assert_eq!(decoded, &codewords[nearest]);
        }
    }
}
