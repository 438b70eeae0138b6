//! Codebook of block-shaped codewords addressed by fixed-width binary indices

use crate::{Block, Result, VqError};

/// Number of index bits for a target codebook size: `ceil(log2(n))`, at least 1.
pub fn index_bits_for(num_codewords: usize) -> u8 {
    if num_codewords <= 2 {
        return 1;
    }
    (usize::BITS - (num_codewords - 1).leading_zeros()) as u8
}

/// Zero-padded binary index string of `bits` digits.
pub fn format_index(index: usize, bits: u8) -> String {
    format!("{:0width$b}", index, width = bits as usize)
}

/// Ordered set of codewords.
///
/// Codeword `i` is addressed by `i` written in binary and left-padded with
/// zeros to [`Codebook::index_bits`] digits. Every index string of a
/// codebook therefore has the same length and the set of indices is exactly
/// `0..len()`.
#[derive(Debug, Clone, PartialEq)]
pub struct Codebook {
    block_height: usize,
    block_width: usize,
    index_bits: u8,
    codewords: Vec<Block>,
}

impl Codebook {
    /// Create an empty codebook for blocks of the given shape
    pub fn new(block_height: usize, block_width: usize, index_bits: u8) -> Self {
        Self {
            block_height,
            block_width,
            index_bits: index_bits.max(1),
            codewords: Vec::new(),
        }
    }

    /// Create from existing codewords
    pub fn from_codewords(
        block_height: usize,
        block_width: usize,
        index_bits: u8,
        codewords: Vec<Block>,
    ) -> Result<Self> {
        let mut codebook = Self::new(block_height, block_width, index_bits);
        for codeword in codewords {
            codebook.push(codeword)?;
        }
        Ok(codebook)
    }

    /// Append a codeword, assigning it the next index
    pub fn push(&mut self, codeword: Block) -> Result<usize> {
        if codeword.shape() != (self.block_height, self.block_width) {
            return Err(VqError::dimensions(format!(
                "codeword is {}x{}, codebook holds {}x{} blocks",
                codeword.height(),
                codeword.width(),
                self.block_height,
                self.block_width
            )));
        }

        let index = self.codewords.len();
        if self.index_bits < 64 && (index as u64) >> self.index_bits != 0 {
            return Err(VqError::dimensions(format!(
                "codeword {} does not fit in a {}-bit index",
                index, self.index_bits
            )));
        }

        self.codewords.push(codeword);
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.codewords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codewords.is_empty()
    }

    pub fn block_height(&self) -> usize {
        self.block_height
    }

    pub fn block_width(&self) -> usize {
        self.block_width
    }

    /// Width of every index string
    pub fn index_bits(&self) -> u8 {
        self.index_bits
    }

    /// All codewords in index order
    pub fn codewords(&self) -> &[Block] {
        &self.codewords
    }

    /// Codeword by integer index
    pub fn get(&self, index: usize) -> Option<&Block> {
        self.codewords.get(index)
    }

    /// Binary index string for codeword `index`
    pub fn index_string(&self, index: usize) -> String {
        format_index(index, self.index_bits)
    }

    /// Parse a binary index string against this codebook.
    ///
    /// Fails with [`VqError::UnknownIndex`] unless the string has exactly
    /// `index_bits` binary digits and names an existing codeword.
    pub fn parse_index(&self, code: &str) -> Result<usize> {
        let unknown = || VqError::UnknownIndex {
            index: code.to_string(),
        };

        if code.len() != self.index_bits as usize || !code.bytes().all(|b| b == b'0' || b == b'1')
        {
            return Err(unknown());
        }

        let index = usize::from_str_radix(code, 2).map_err(|_| unknown())?;
        if index >= self.codewords.len() {
            return Err(unknown());
        }
        Ok(index)
    }

    /// Codeword for a binary index string
    pub fn lookup(&self, code: &str) -> Result<&Block> {
        let index = self.parse_index(code)?;
        Ok(&self.codewords[index])
    }

    /// `(index string, codeword)` pairs in index order
    pub fn entries(&self) -> impl Iterator<Item = (String, &Block)> + '_ {
        self.codewords
            .iter()
            .enumerate()
            .map(|(i, c)| (self.index_string(i), c))
    }

    /// Bytes taken by the codewords as 32-bit floats
    pub fn memory_size(&self) -> usize {
        self.codewords.len() * self.block_height * self.block_width * 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_bits() {
        assert_eq!(index_bits_for(1), 1);
        assert_eq!(index_bits_for(2), 1);
        assert_eq!(index_bits_for(3), 2);
        assert_eq!(index_bits_for(4), 2);
        assert_eq!(index_bits_for(5), 3);
        assert_eq!(index_bits_for(64), 6);
        assert_eq!(index_bits_for(65), 7);
    }

    #[test]
    fn test_index_strings_are_padded() {
        let codebook = Codebook::from_codewords(
            1,
            1,
            3,
            (0..5).map(|i| Block::filled(1, 1, i as f32)).collect(),
        )
        .unwrap();

        let codes: Vec<String> = codebook.entries().map(|(code, _)| code).collect();
        assert_eq!(codes, vec!["000", "001", "010", "011", "100"]);
        assert_eq!(codebook.lookup("011").unwrap().get(0, 0), Some(3.0));
    }

    #[test]
    fn test_unknown_indices() {
        let codebook = Codebook::from_codewords(
            1,
            1,
            2,
            vec![Block::filled(1, 1, 0.0), Block::filled(1, 1, 1.0)],
        )
        .unwrap();

        for code in ["10", "11", "1", "001", "0x", "+1", ""] {
            assert!(
                matches!(codebook.parse_index(code), Err(VqError::UnknownIndex { .. })),
                "{code:?} should be unknown"
            );
        }
        assert_eq!(codebook.parse_index("01").unwrap(), 1);
    }

    #[test]
    fn test_push_checks_shape_and_width() {
        let mut codebook = Codebook::new(2, 2, 1);
        assert!(codebook.push(Block::zeros(2, 3)).is_err());
        codebook.push(Block::zeros(2, 2)).unwrap();
        codebook.push(Block::zeros(2, 2)).unwrap();
        assert!(codebook.push(Block::zeros(2, 2)).is_err());
        assert_eq!(codebook.memory_size(), 2 * 4 * 4);
    }
}
