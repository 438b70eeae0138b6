//! Compressed image file format
//!
//! All integers and floats are big-endian. Strings are written as a 16-bit
//! big-endian byte length followed by modified UTF-8 (NUL as `C0 80`,
//! supplementary characters as surrogate pairs).

use crate::decoder::decoded_shape;
use crate::{Codebook, IndexGrid, Result, VqError};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::debug;

/// Compressed image container.
///
/// # Binary Layout
///
/// ```text
/// Field              Type                     Count
/// ─────              ────                     ─────
/// rows               i32                      1
/// cols               i32                      1
/// index grid         string                   rows × cols, row-major
/// block_height       i32                      1
/// block_width        i32                      1
/// codebook entry     string + f32 × bh × bw   until end of stream
/// ```
///
/// Codebook entries are written in index order; their strings are the
/// zero-padded binary indices `0, 1, 2, ...`.
#[derive(Debug, Clone, PartialEq)]
pub struct VqFile {
    /// Per-block codebook indices
    pub index_grid: IndexGrid,
    /// Codewords the indices refer to
    pub codebook: Codebook,
}

impl VqFile {
    /// Create a new container
    pub fn new(index_grid: IndexGrid, codebook: Codebook) -> Self {
        Self {
            index_grid,
            codebook,
        }
    }

    /// Exact size of the serialized form in bytes
    pub fn encoded_len(&self) -> usize {
        encoded_len(&self.index_grid, &self.codebook)
    }

    /// Write to a writer
    ///
    /// The codebook must hold at least one codeword; an empty one could not
    /// carry its index width.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        if self.codebook.is_empty() {
            return Err(VqError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "cannot write an empty codebook",
            )));
        }

        write_dim(writer, self.index_grid.rows(), "rows")?;
        write_dim(writer, self.index_grid.cols(), "cols")?;

        for code in self.index_grid.to_strings() {
            write_utf(writer, &code)?;
        }

        write_dim(writer, self.codebook.block_height(), "block height")?;
        write_dim(writer, self.codebook.block_width(), "block width")?;

        for (code, codeword) in self.codebook.entries() {
            write_utf(writer, &code)?;
            for &value in codeword.data() {
                writer.write_all(&value.to_be_bytes())?;
            }
        }

        writer.flush()?;
        Ok(())
    }

    /// Read from a reader, consuming it to the end
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::from_bytes(&bytes)
    }

    /// Parse a complete serialized file
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut cursor = ByteCursor::new(bytes);

        let rows = cursor.read_dim("rows")?;
        let cols = cursor.read_dim("cols")?;
        let cells = rows
            .checked_mul(cols)
            .ok_or_else(|| VqError::malformed(format!("index grid {}x{} too large", rows, cols)))?;

        // every cell needs at least its two length bytes
        if cells > cursor.remaining() / 2 {
            return Err(VqError::malformed(format!(
                "index grid {}x{} larger than the {} bytes that follow",
                rows,
                cols,
                cursor.remaining()
            )));
        }

        let mut strings = Vec::with_capacity(cells);
        for _ in 0..cells {
            strings.push(cursor.read_utf()?);
        }

        let block_height = cursor.read_dim("block height")?;
        let block_width = cursor.read_dim("block width")?;
        if block_height == 0 || block_width == 0 {
            return Err(VqError::malformed(format!(
                "block size {}x{} is not positive",
                block_height, block_width
            )));
        }
        let block_len = block_height
            .checked_mul(block_width)
            .ok_or_else(|| VqError::malformed("block size overflows"))?;

        let mut keys = Vec::new();
        let mut codewords = Vec::new();
        while cursor.remaining() > 0 {
            let key = cursor.read_utf()?;
            let mut data = Vec::with_capacity(block_len.min(cursor.remaining() / 4));
            for _ in 0..block_len {
                data.push(cursor.read_f32()?);
            }
            keys.push(key);
            codewords.push(crate::Block::from_vec(block_height, block_width, data)?);
        }

        let codebook = build_codebook(block_height, block_width, &keys, codewords)?;

        let index_grid = if strings.is_empty() {
            IndexGrid::new(rows, cols, codebook.index_bits(), Vec::new())?
        } else {
            IndexGrid::from_strings(rows, cols, &strings)
                .map_err(|e| VqError::malformed(format!("bad index grid: {}", e)))?
        };

        debug!(
            rows,
            cols,
            block_height,
            block_width,
            codewords = codebook.len(),
            "read compressed image"
        );

        Ok(Self {
            index_grid,
            codebook,
        })
    }

    /// Serialize to a byte vector
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(self.encoded_len());
        self.write_to(&mut bytes)?;
        Ok(bytes)
    }

    /// Write to file path
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)
    }

    /// Read from file path
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }

    /// Height and width of the image this file decodes to
    pub fn decoded_shape(&self) -> Result<(usize, usize)> {
        decoded_shape(&self.index_grid, &self.codebook)
    }

    /// Uncompressed size of the image this file decodes to, one byte per sample
    pub fn decoded_len(&self) -> Result<usize> {
        let (height, width) = self.decoded_shape()?;
        Ok(height * width)
    }
}

/// Write an index grid and codebook to `path`.
///
/// `block_height` and `block_width` must match the codebook's block shape.
pub fn write(
    path: impl AsRef<Path>,
    index_grid: &IndexGrid,
    codebook: &Codebook,
    block_height: usize,
    block_width: usize,
) -> Result<()> {
    if (block_height, block_width) != (codebook.block_height(), codebook.block_width()) {
        return Err(VqError::dimensions(format!(
            "block size {}x{} does not match codebook blocks {}x{}",
            block_height,
            block_width,
            codebook.block_height(),
            codebook.block_width()
        )));
    }
    VqFile::new(index_grid.clone(), codebook.clone()).save(path)
}

/// Read `(index grid, codebook, block height, block width)` from `path`
pub fn read(path: impl AsRef<Path>) -> Result<(IndexGrid, Codebook, usize, usize)> {
    let file = VqFile::load(path)?;
    let block_height = file.codebook.block_height();
    let block_width = file.codebook.block_width();
    Ok((file.index_grid, file.codebook, block_height, block_width))
}

/// Size in bytes of the file `index_grid` and `codebook` serialize to
pub fn encoded_len(index_grid: &IndexGrid, codebook: &Codebook) -> usize {
    let grid = index_grid.codes().len() * (2 + index_grid.index_bits() as usize);
    let entry = 2
        + codebook.index_bits() as usize
        + 4 * codebook.block_height() * codebook.block_width();
    16 + grid + codebook.len() * entry
}

/// Codebook keys must be the sequential, equal-width binary indices, and
/// there must be at least one.
fn build_codebook(
    block_height: usize,
    block_width: usize,
    keys: &[String],
    codewords: Vec<crate::Block>,
) -> Result<Codebook> {
    let index_bits = keys
        .first()
        .map(String::len)
        .ok_or_else(|| VqError::malformed("codebook has no entries"))?;
    if index_bits == 0 || index_bits > crate::encoder::MAX_INDEX_BITS as usize {
        return Err(VqError::malformed(format!(
            "codebook index width {} out of range",
            index_bits
        )));
    }

    let mut codebook = Codebook::new(block_height, block_width, index_bits as u8);
    for (position, (key, codeword)) in keys.iter().zip(codewords).enumerate() {
        let expected = codebook.index_string(position);
        if *key != expected {
            return Err(VqError::malformed(format!(
                "codebook entry {} has index {:?}, expected {:?}",
                position, key, expected
            )));
        }
        codebook
            .push(codeword)
            .map_err(|e| VqError::malformed(e.to_string()))?;
    }
    Ok(codebook)
}

fn write_dim<W: Write>(writer: &mut W, value: usize, what: &str) -> Result<()> {
    let value = i32::try_from(value).map_err(|_| {
        VqError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{} {} does not fit in a 32-bit field", what, value),
        ))
    })?;
    writer.write_all(&value.to_be_bytes())?;
    Ok(())
}

/// Write a length-prefixed modified UTF-8 string
pub(crate) fn write_utf<W: Write>(writer: &mut W, s: &str) -> Result<()> {
    let mut encoded = Vec::with_capacity(s.len());
    for unit in s.encode_utf16() {
        match unit {
            0x0001..=0x007F => encoded.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                encoded.push(0xC0 | ((unit >> 6) & 0x1F) as u8);
                encoded.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                encoded.push(0xE0 | ((unit >> 12) & 0x0F) as u8);
                encoded.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                encoded.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }

    let len = u16::try_from(encoded.len()).map_err(|_| {
        VqError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("string of {} encoded bytes is too long", encoded.len()),
        ))
    })?;

    writer.write_all(&len.to_be_bytes())?;
    writer.write_all(&encoded)?;
    Ok(())
}

/// Decode modified UTF-8 bytes
pub(crate) fn decode_utf(bytes: &[u8]) -> Result<String> {
    let bad = || VqError::malformed("invalid modified UTF-8 string");
    let continuation = |b: Option<&u8>| match b {
        Some(&b) if b & 0xC0 == 0x80 => Ok((b & 0x3F) as u16),
        _ => Err(bad()),
    };

    let mut units = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b & 0x80 == 0 {
            units.push(b as u16);
            i += 1;
        } else if b & 0xE0 == 0xC0 {
            let low = continuation(bytes.get(i + 1))?;
            units.push(((b & 0x1F) as u16) << 6 | low);
            i += 2;
        } else if b & 0xF0 == 0xE0 {
            let mid = continuation(bytes.get(i + 1))?;
            let low = continuation(bytes.get(i + 2))?;
            units.push(((b & 0x0F) as u16) << 12 | mid << 6 | low);
            i += 3;
        } else {
            return Err(bad());
        }
    }

    String::from_utf16(&units).map_err(|_| bad())
}

/// Bounds-checked big-endian reader over a byte slice
struct ByteCursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(VqError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!(
                    "needed {} bytes at offset {}, only {} left",
                    n,
                    self.pos,
                    self.remaining()
                ),
            )));
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn read_dim(&mut self, what: &str) -> Result<usize> {
        let offset = self.pos;
        let value = i32::from_be_bytes(self.read_array()?);
        usize::try_from(value).map_err(|_| {
            VqError::malformed(format!("negative {} {} at offset {}", what, value, offset))
        })
    }

    fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_be_bytes(self.read_array()?))
    }

    fn read_utf(&mut self) -> Result<String> {
        let len = u16::from_be_bytes(self.read_array()?) as usize;
        decode_utf(self.take(len)?)
    }
}
