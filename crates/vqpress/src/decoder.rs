//! Index grid decoding

use crate::codebook::format_index;
use crate::{Codebook, IndexGrid, Result, SampleGrid, VqError};
use tracing::debug;

/// Height and width of the grid `index_grid` decodes to.
///
/// Fails with [`VqError::InvalidDimensions`] when the sample count does not
/// fit in `usize`.
pub fn decoded_shape(index_grid: &IndexGrid, codebook: &Codebook) -> Result<(usize, usize)> {
    let overflow = || {
        VqError::dimensions(format!(
            "{}x{} blocks of {}x{} overflow the sample grid",
            index_grid.rows(),
            index_grid.cols(),
            codebook.block_height(),
            codebook.block_width()
        ))
    };

    let height = index_grid
        .rows()
        .checked_mul(codebook.block_height())
        .ok_or_else(overflow)?;
    let width = index_grid
        .cols()
        .checked_mul(codebook.block_width())
        .ok_or_else(overflow)?;
    height.checked_mul(width).ok_or_else(overflow)?;

    Ok((height, width))
}

/// Expand an index grid back into samples.
///
/// The output is `rows * block_height` by `cols * block_width`, taken only
/// from the grid and codebook; the size of the image that was originally
/// compressed plays no part. Every code is resolved before the output is
/// allocated.
pub fn decode(index_grid: &IndexGrid, codebook: &Codebook) -> Result<SampleGrid> {
    let block_height = codebook.block_height();
    let block_width = codebook.block_width();

    if !index_grid.codes().is_empty() && (block_height == 0 || block_width == 0) {
        return Err(VqError::dimensions(format!(
            "codebook block size {}x{} cannot be decoded",
            block_height, block_width
        )));
    }

    // indices of a different width never name a codebook entry
    let same_width = index_grid.index_bits() == codebook.index_bits();

    let mut codewords = Vec::with_capacity(index_grid.codes().len());
    for &code in index_grid.codes() {
        let codeword = codebook
            .get(code as usize)
            .filter(|_| same_width)
            .ok_or_else(|| VqError::UnknownIndex {
                index: format_index(code as usize, index_grid.index_bits()),
            })?;
        codewords.push(codeword);
    }

    let (height, width) = decoded_shape(index_grid, codebook)?;
    let mut output = SampleGrid::new(height, width);

    let cols = index_grid.cols();
    for (position, codeword) in codewords.into_iter().enumerate() {
        let (row, col) = (position / cols, position % cols);
        output.paste_block(row * block_height, col * block_width, codeword);
    }

    debug!(
        rows = index_grid.rows(),
        cols,
        height,
        width,
        "decoded index grid"
    );

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Block;

    fn codebook() -> Codebook {
        Codebook::from_codewords(
            2,
            2,
            1,
            vec![Block::filled(2, 2, 10.0), Block::filled(2, 2, 200.0)],
        )
        .unwrap()
    }

    #[test]
    fn test_decode_places_blocks() {
        let grid = IndexGrid::new(1, 2, 1, vec![1, 0]).unwrap();
        let out = decode(&grid, &codebook()).unwrap();

        assert_eq!((out.height(), out.width()), (2, 4));
        assert_eq!(out.row(0), &[200.0, 200.0, 10.0, 10.0]);
        assert_eq!(out.row(1), &[200.0, 200.0, 10.0, 10.0]);
    }

    #[test]
    fn test_unknown_index() {
        let mut small = Codebook::new(2, 2, 2);
        small.push(Block::filled(2, 2, 1.0)).unwrap();

        let grid = IndexGrid::new(1, 1, 2, vec![3]).unwrap();
        match decode(&grid, &small) {
            Err(VqError::UnknownIndex { index }) => assert_eq!(index, "11"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_huge_blocks_without_codewords() {
        let empty = Codebook::new(1 << 30, 1 << 30, 1);
        let grid = IndexGrid::new(1, 1, 1, vec![0]).unwrap();

        assert!(matches!(
            decode(&grid, &empty),
            Err(VqError::UnknownIndex { .. })
        ));
    }

    #[test]
    fn test_decoded_shape_overflow() {
        let grid = IndexGrid::new(2, 2, 1, vec![0; 4]).unwrap();
        assert_eq!(decoded_shape(&grid, &codebook()).unwrap(), (4, 4));

        let wide = Codebook::new(usize::MAX / 2, 3, 1);
        assert!(matches!(
            decoded_shape(&grid, &wide),
            Err(VqError::InvalidDimensions(_))
        ));
    }

    #[test]
    fn test_width_mismatch_is_unknown() {
        let grid = IndexGrid::new(1, 1, 2, vec![0]).unwrap();
        assert!(matches!(
            decode(&grid, &codebook()),
            Err(VqError::UnknownIndex { .. })
        ));
    }
}
