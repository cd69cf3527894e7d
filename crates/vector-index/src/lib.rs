//! Flat L2 nearest-neighbor index files.
//!
//! One index per summary record, named identically apart from the
//! extension. Vector `i` is the embedding of summary `i`'s text, so the
//! index and its record must always be rebuilt together; rebuilding either
//! alone silently breaks the positional mapping.
//!
//! File layout (all integers little-endian):
//!
//! ```text
//! magic    4 bytes  "AFVI"
//! version  1 byte
//! dim      u32
//! count    u32
//! data     count * dim f32
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use thiserror::Error;

/// File magic for index files.
pub const MAGIC: [u8; 4] = *b"AFVI";
/// Current format version.
pub const FORMAT_VERSION: u8 = 1;

/// Errors for index construction, search, and the file format.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not an index file (bad magic)")]
    BadMagic,

    #[error("Unsupported index version: {0}")]
    UnsupportedVersion(u8),

    #[error("Dimension mismatch: index has {expected}, vector has {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Index declares zero dimension")]
    ZeroDimension,

    #[error("Truncated index payload: expected {expected} bytes, found {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("Trailing bytes after index payload: {0}")]
    TrailingBytes(usize),
}

/// An in-memory flat index: a dense row-major matrix of vectors searched by
/// brute-force squared L2 distance.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatIndex {
    dim: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    /// Create an empty index for vectors of the given dimension.
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            data: Vec::new(),
        }
    }

    /// Vector dimension.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        if self.dim == 0 {
            0
        } else {
            self.data.len() / self.dim
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a vector. Position equals the number of vectors added before
    /// it, which is what couples the index to its summary record.
    pub fn add(&mut self, vector: &[f32]) -> Result<(), IndexError> {
        if vector.len() != self.dim {
            return Err(IndexError::DimensionMismatch {
                expected: self.dim,
                actual: vector.len(),
            });
        }
        self.data.extend_from_slice(vector);
        Ok(())
    }

    /// Stored vector at a position.
    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        if position >= self.len() {
            return None;
        }
        let start = position * self.dim;
        Some(&self.data[start..start + self.dim])
    }

    /// Brute-force nearest neighbors: `(position, squared L2 distance)`
    /// pairs, ascending by distance, ties broken by insertion position.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>, IndexError> {
        if query.len() != self.dim {
            return Err(IndexError::DimensionMismatch {
                expected: self.dim,
                actual: query.len(),
            });
        }

        let mut hits: Vec<(usize, f32)> = (0..self.len())
            .map(|i| {
                let row = &self.data[i * self.dim..(i + 1) * self.dim];
                let dist = row
                    .iter()
                    .zip(query.iter())
                    .map(|(a, b)| {
                        let d = a - b;
                        d * d
                    })
                    .sum::<f32>();
                (i, dist)
            })
            .collect();

        hits.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        hits.truncate(k);
        Ok(hits)
    }

    /// Write the index to a file, overwriting whole.
    pub fn write_to(&self, path: &Path) -> Result<(), IndexError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writer.write_all(&MAGIC)?;
        writer.write_all(&[FORMAT_VERSION])?;
        writer.write_all(&(self.dim as u32).to_le_bytes())?;
        writer.write_all(&(self.len() as u32).to_le_bytes())?;
        for value in &self.data {
            writer.write_all(&value.to_le_bytes())?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Read and validate an index file.
    pub fn read_from(path: &Path) -> Result<Self, IndexError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if magic != MAGIC {
            return Err(IndexError::BadMagic);
        }

        let mut version = [0u8; 1];
        reader.read_exact(&mut version)?;
        if version[0] != FORMAT_VERSION {
            return Err(IndexError::UnsupportedVersion(version[0]));
        }

        let mut word = [0u8; 4];
        reader.read_exact(&mut word)?;
        let dim = u32::from_le_bytes(word) as usize;
        reader.read_exact(&mut word)?;
        let count = u32::from_le_bytes(word) as usize;

        if dim == 0 && count > 0 {
            return Err(IndexError::ZeroDimension);
        }

        let expected = dim * count * 4;
        let mut payload = Vec::new();
        reader.read_to_end(&mut payload)?;
        if payload.len() < expected {
            return Err(IndexError::Truncated {
                expected,
                actual: payload.len(),
            });
        }
        if payload.len() > expected {
            return Err(IndexError::TrailingBytes(payload.len() - expected));
        }

        let data = payload
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();

        Ok(Self { dim, data })
    }
}
