//! Whole-file matrix reads

use std::fs;
use std::path::Path;

use super::{LoadError, LoadResult, MatrixFormat};

/// Read a `rows x cols` column-concatenated matrix into a flat buffer.
///
/// Values beyond `rows * cols` are ignored; fewer is a
/// [`LoadError::Truncated`].
pub fn read_matrix<P: AsRef<Path>>(path: P, rows: usize, cols: usize) -> LoadResult<Vec<f64>> {
    let path = path.as_ref();
    let expected = rows * cols;
    let values = match MatrixFormat::from_path(path)? {
        MatrixFormat::Binary => {
            let bytes = fs::read(path).map_err(|e| LoadError::io(path, e))?;
            decode_f32_le(&bytes, expected)
        }
        MatrixFormat::Text => {
            let text = fs::read_to_string(path).map_err(|e| LoadError::io(path, e))?;
            parse_text(path, &text, expected)?
        }
    };

    if values.len() < expected {
        return Err(LoadError::Truncated {
            path: path.to_path_buf(),
            expected,
            found: values.len(),
        });
    }
    Ok(values)
}

/// Read `cols` vectors of `rows` values each
pub fn read_columns<P: AsRef<Path>>(path: P, rows: usize, cols: usize) -> LoadResult<Vec<Vec<f64>>> {
    if rows == 0 {
        return Ok(vec![Vec::new(); cols]);
    }
    let values = read_matrix(path, rows, cols)?;
    Ok(values.chunks_exact(rows).map(<[f64]>::to_vec).collect())
}

/// Up to `limit` little-endian f32 values, widened to f64
pub(crate) fn decode_f32_le(bytes: &[u8], limit: usize) -> Vec<f64> {
    bytes
        .chunks_exact(4)
        .take(limit)
        .map(|b| f64::from(f32::from_le_bytes([b[0], b[1], b[2], b[3]])))
        .collect()
}

/// Up to `limit` whitespace-separated values
fn parse_text(path: &Path, text: &str, limit: usize) -> LoadResult<Vec<f64>> {
    text.split_whitespace()
        .take(limit)
        .enumerate()
        .map(|(position, token)| {
            token.parse::<f64>().map_err(|_| LoadError::Parse {
                path: path.to_path_buf(),
                token: token.to_string(),
                position,
            })
        })
        .collect()
}
