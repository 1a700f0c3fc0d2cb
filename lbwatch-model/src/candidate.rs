use std::{
    borrow::Cow,
    ffi::OsStr,
    path::{Path, PathBuf},
};

/// A filesystem entry observed during one poll cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    path: PathBuf,
    size: Option<u64>,
}

impl CandidateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            size: None,
        }
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> Option<u64> {
        self.size
    }

    pub fn file_name(&self) -> Option<&OsStr> {
        self.path.file_name()
    }

    /// Lossy UTF-8 rendering of the file name, empty when there is none.
    pub fn name_lossy(&self) -> Cow<'_, str> {
        self.file_name()
            .map(OsStr::to_string_lossy)
            .unwrap_or(Cow::Borrowed(""))
    }

    /// Bytes identifying this file for partitioning.
    ///
    /// Uses the encoded bytes of the final path component so names that are
    /// not valid UTF-8 still hash deterministically. `None` when the path has
    /// no usable final component.
    pub fn partition_key(&self) -> Option<&[u8]> {
        let bytes = self.file_name()?.as_encoded_bytes();
        (!bytes.is_empty()).then_some(bytes)
    }
}

impl From<PathBuf> for CandidateFile {
    fn from(path: PathBuf) -> Self {
        Self::new(path)
    }
}

impl From<&Path> for CandidateFile {
    fn from(path: &Path) -> Self {
        Self::new(path)
    }
}
