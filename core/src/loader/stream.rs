//! Sequential reader for one dictionary per observation

use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};

use super::matrix::decode_f32_le;
use super::{LoadError, LoadResult, MatrixFormat};

/// Yields consecutive `rows x cols` matrices from a single file
#[derive(Debug)]
pub struct DictionaryStream {
    path: PathBuf,
    format: MatrixFormat,
    reader: BufReader<File>,
    rows: usize,
    cols: usize,
    /// Parsed text values not yet handed out
    pending: Vec<f64>,
    tokens_read: usize,
    matrices_read: usize,
}

impl DictionaryStream {
    pub fn open<P: AsRef<Path>>(path: P, rows: usize, cols: usize) -> LoadResult<Self> {
        let path = path.as_ref();
        let format = MatrixFormat::from_path(path)?;
        let file = File::open(path).map_err(|e| LoadError::io(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            format,
            reader: BufReader::new(file),
            rows,
            cols,
            pending: Vec::new(),
            tokens_read: 0,
            matrices_read: 0,
        })
    }

    /// Length of each column (M)
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Columns per matrix (N)
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Matrices handed out so far
    pub fn matrices_read(&self) -> usize {
        self.matrices_read
    }

    /// Next matrix as column-concatenated values
    pub fn next_matrix(&mut self) -> LoadResult<Vec<f64>> {
        let expected = self.rows * self.cols;
        let values = match self.format {
            MatrixFormat::Binary => self.next_binary(expected)?,
            MatrixFormat::Text => self.next_text(expected)?,
        };
        self.matrices_read += 1;
        Ok(values)
    }

    fn next_binary(&mut self, expected: usize) -> LoadResult<Vec<f64>> {
        let mut bytes = vec![0u8; expected * 4];
        let mut filled = 0;
        while filled < bytes.len() {
            match self.reader.read(&mut bytes[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(LoadError::io(&self.path, e)),
            }
        }
        if filled < bytes.len() {
            return Err(self.truncated(expected, filled / 4));
        }
        Ok(decode_f32_le(&bytes, expected))
    }

    fn next_text(&mut self, expected: usize) -> LoadResult<Vec<f64>> {
        let mut line = String::new();
        while self.pending.len() < expected {
            line.clear();
            let n = self
                .reader
                .read_line(&mut line)
                .map_err(|e| LoadError::io(&self.path, e))?;
            if n == 0 {
                return Err(self.truncated(expected, self.pending.len()));
            }
            for token in line.split_whitespace() {
                let value = token.parse::<f64>().map_err(|_| LoadError::Parse {
                    path: self.path.clone(),
                    token: token.to_string(),
                    position: self.tokens_read,
                })?;
                self.pending.push(value);
                self.tokens_read += 1;
            }
        }
        let rest = self.pending.split_off(expected);
        Ok(std::mem::replace(&mut self.pending, rest))
    }

    fn truncated(&self, expected: usize, found: usize) -> LoadError {
        LoadError::Truncated {
            path: self.path.clone(),
            expected,
            found,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_file(name: &str, contents: &[u8]) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("astar-omp-stream-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_text_stream_splits_across_lines() {
        let path = temp_file("dicts.txt", b"1 0\n0 1 2\n0 0 2\n");
        let mut stream = DictionaryStream::open(&path, 2, 2).unwrap();
        assert_eq!(stream.next_matrix().unwrap(), vec![1.0, 0.0, 0.0, 1.0]);
        assert_eq!(stream.next_matrix().unwrap(), vec![2.0, 0.0, 0.0, 2.0]);
        assert_eq!(stream.matrices_read(), 2);
        assert!(matches!(
            stream.next_matrix(),
            Err(LoadError::Truncated { expected: 4, found: 0, .. })
        ));
    }

    #[test]
    fn test_binary_stream() {
        let bytes: Vec<u8> = (0..6).flat_map(|v| (v as f32).to_le_bytes()).collect();
        let path = temp_file("dicts.bin", &bytes);
        let mut stream = DictionaryStream::open(&path, 1, 2).unwrap();
        assert_eq!(stream.next_matrix().unwrap(), vec![0.0, 1.0]);
        assert_eq!(stream.next_matrix().unwrap(), vec![2.0, 3.0]);
        assert_eq!(stream.next_matrix().unwrap(), vec![4.0, 5.0]);
        assert!(stream.next_matrix().is_err());
    }
}
