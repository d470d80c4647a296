//! Output of reconstructed vectors

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::{LoadError, LoadResult, MatrixFormat};

/// Appends vectors to a file, binary unless the name ends in `.txt`
#[derive(Debug)]
pub struct VectorWriter {
    path: PathBuf,
    format: MatrixFormat,
    out: BufWriter<File>,
    written: usize,
}

impl VectorWriter {
    /// Create (or truncate) `path`
    pub fn create<P: AsRef<Path>>(path: P) -> LoadResult<Self> {
        let path = path.as_ref();
        let format = MatrixFormat::from_path(path).unwrap_or(MatrixFormat::Binary);
        let file = File::create(path).map_err(|e| LoadError::io(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            format,
            out: BufWriter::new(file),
            written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> MatrixFormat {
        self.format
    }

    /// Vectors written so far
    pub fn written(&self) -> usize {
        self.written
    }

    /// Append one vector: raw f32 values, or one text line
    pub fn write_vector(&mut self, values: &[f64]) -> LoadResult<()> {
        let result = match self.format {
            MatrixFormat::Binary => values
                .iter()
                .try_for_each(|&v| self.out.write_all(&(v as f32).to_le_bytes())),
            MatrixFormat::Text => {
                let line = values
                    .iter()
                    .map(|&v| (v as f32).to_string())
                    .collect::<Vec<_>>()
                    .join("  ");
                writeln!(self.out, "{line}")
            }
        };
        result.map_err(|e| LoadError::io(&self.path, e))?;
        self.written += 1;
        Ok(())
    }

    /// Flush buffered output
    pub fn finish(&mut self) -> LoadResult<()> {
        self.out.flush().map_err(|e| LoadError::io(&self.path, e))
    }
}
