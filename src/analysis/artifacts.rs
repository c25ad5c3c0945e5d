use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

use crate::core::range::ResidueRange;

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("Failed to write structure to {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Directory of write-once structure files, one per analyzed fragment
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Location of the structure for `range`, e.g. `fragment_201_600.pdb`
    pub fn path_for(&self, range: &ResidueRange) -> PathBuf {
        self.dir.join(format!("{}.pdb", range.fragment_id()))
    }

    /// Write `text` as the structure for `range`.
    ///
    /// The file is written to a temporary name in the same directory and then
    /// renamed, so readers never observe a partial structure.
    ///
    /// # Errors
    ///
    /// Returns `ArtifactError::Write` if the directory or file cannot be written.
    pub fn persist(&self, range: &ResidueRange, text: &str) -> Result<PathBuf, ArtifactError> {
        let path = self.path_for(range);
        let wrap = |source: std::io::Error| ArtifactError::Write {
            path: path.clone(),
            source,
        };

        std::fs::create_dir_all(&self.dir).map_err(wrap)?;
        let mut temp = NamedTempFile::new_in(&self.dir).map_err(wrap)?;
        temp.write_all(text.as_bytes()).map_err(wrap)?;
        temp.flush().map_err(wrap)?;
        temp.persist(&path).map_err(|e| wrap(e.error))?;

        tracing::debug!("Structure saved to {}", path.display());
        Ok(path)
    }
}
