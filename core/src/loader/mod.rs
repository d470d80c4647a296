//! Matrix loaders and writers for dictionaries, measurements and targets
//!
//! Every matrix on disk is column-concatenated: a `rows x cols` matrix is
//! `cols` vectors of `rows` values stored one after another. `.bin` files
//! hold little-endian f32 values; `.txt` files hold whitespace-separated
//! numbers with arbitrary line breaks.

pub mod matrix;
pub mod stream;
pub mod writer;

pub use matrix::{read_columns, read_matrix};
pub use stream::DictionaryStream;
pub use writer::VectorWriter;

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Loader result
pub type LoadResult<T> = Result<T, LoadError>;

/// Matrix loading and writing errors
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}: unknown file type, expected .bin or .txt")]
    UnknownFormat(PathBuf),

    #[error("{path}: cannot parse value {token:?} at position {position}")]
    Parse {
        path: PathBuf,
        token: String,
        position: usize,
    },

    #[error("{path}: expected {expected} values, found {found}")]
    Truncated {
        path: PathBuf,
        expected: usize,
        found: usize,
    },
}

impl LoadError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        LoadError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// On-disk encoding, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixFormat {
    /// Little-endian f32
    Binary,
    /// Whitespace-separated decimal text
    Text,
}

impl MatrixFormat {
    pub fn from_path(path: &Path) -> LoadResult<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("bin") => Ok(MatrixFormat::Binary),
            Some("txt") => Ok(MatrixFormat::Text),
            _ => Err(LoadError::UnknownFormat(path.to_path_buf())),
        }
    }
}
