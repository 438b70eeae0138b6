//! Index grid encoding

use crate::codebook::format_index;
use crate::{Codebook, Result, VqError};

/// Widest index the grid stores
pub const MAX_INDEX_BITS: u8 = 32;

/// One codebook index per block position, row-major in partition order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexGrid {
    rows: usize,
    cols: usize,
    index_bits: u8,
    codes: Vec<u32>,
}

impl IndexGrid {
    /// Wrap row-major codes
    pub fn new(rows: usize, cols: usize, index_bits: u8, codes: Vec<u32>) -> Result<Self> {
        if codes.len() != rows * cols {
            return Err(VqError::dimensions(format!(
                "{} codes cannot fill a {}x{} index grid",
                codes.len(),
                rows,
                cols
            )));
        }
        if index_bits == 0 || index_bits > MAX_INDEX_BITS {
            return Err(VqError::dimensions(format!(
                "index width must be 1..={} bits, got {}",
                MAX_INDEX_BITS, index_bits
            )));
        }
        if let Some(&code) = codes
            .iter()
            .find(|&&c| index_bits < 32 && c >> index_bits != 0)
        {
            return Err(VqError::EncodingError(format!(
                "code {} does not fit in {} bits",
                code, index_bits
            )));
        }

        Ok(Self {
            rows,
            cols,
            index_bits,
            codes,
        })
    }

    /// Parse a grid of binary index strings. All strings must share one width.
    pub fn from_strings(rows: usize, cols: usize, strings: &[String]) -> Result<Self> {
        let index_bits = strings.first().map(String::len).unwrap_or(1);
        if index_bits == 0 || index_bits > MAX_INDEX_BITS as usize {
            return Err(VqError::dimensions(format!(
                "index width must be 1..={} bits, got {}",
                MAX_INDEX_BITS, index_bits
            )));
        }

        let mut codes = Vec::with_capacity(strings.len());
        for s in strings {
            if s.len() != index_bits || !s.bytes().all(|b| b == b'0' || b == b'1') {
                return Err(VqError::UnknownIndex { index: s.clone() });
            }
            let code = u32::from_str_radix(s, 2).map_err(|_| VqError::UnknownIndex {
                index: s.clone(),
            })?;
            codes.push(code);
        }

        Self::new(rows, cols, index_bits as u8, codes)
    }

    /// Number of block rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of block columns
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Width of every index string
    pub fn index_bits(&self) -> u8 {
        self.index_bits
    }

    /// Codes, row-major
    pub fn codes(&self) -> &[u32] {
        &self.codes
    }

    /// Code at `(row, col)`
    pub fn get(&self, row: usize, col: usize) -> Option<u32> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        Some(self.codes[row * self.cols + col])
    }

    /// Binary index string at `(row, col)`
    pub fn code_string(&self, row: usize, col: usize) -> Option<String> {
        self.get(row, col)
            .map(|code| format_index(code as usize, self.index_bits))
    }

    /// Every code as a binary index string, row-major
    pub fn to_strings(&self) -> Vec<String> {
        self.codes
            .iter()
            .map(|&code| format_index(code as usize, self.index_bits))
            .collect()
    }

    /// Bytes the codes take when bit-packed
    pub fn packed_size(&self) -> usize {
        (self.codes.len() * self.index_bits as usize).div_ceil(8)
    }
}

/// Build the index grid from a cluster assignment.
///
/// `assignment[i]` is the codeword of the `i`-th block in partition order.
pub fn encode(
    rows: usize,
    cols: usize,
    assignment: &[usize],
    codebook: &Codebook,
) -> Result<IndexGrid> {
    if assignment.len() != rows * cols {
        return Err(VqError::EncodingError(format!(
            "{} assignments for {} block positions",
            assignment.len(),
            rows * cols
        )));
    }

    let mut codes = Vec::with_capacity(assignment.len());
    for (position, &cluster) in assignment.iter().enumerate() {
        if cluster >= codebook.len() {
            return Err(VqError::EncodingError(format!(
                "block {} ({}, {}) has no cluster in a codebook of {}",
                position,
                position / cols.max(1),
                position % cols.max(1),
                codebook.len()
            )));
        }
        let code = u32::try_from(cluster).map_err(|_| {
            VqError::EncodingError(format!("cluster {} exceeds the index range", cluster))
        })?;
        codes.push(code);
    }

    IndexGrid::new(rows, cols, codebook.index_bits(), codes)
}
