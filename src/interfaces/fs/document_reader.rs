use crate::error::{CourierError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// A document read from disk, ready for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub path: PathBuf,
    pub text: String,
}

/// Reads documents from a list of files and directories.
///
/// Files are read as given. Directories contribute their `*.xml` files
/// (not recursively) in file name order.
pub struct DocumentReader {
    inputs: Vec<PathBuf>,
}

impl DocumentReader {
    pub fn new(inputs: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            inputs: inputs.into_iter().collect(),
        }
    }

    /// Returns an iterator that lazily reads each document.
    ///
    /// An unreadable input yields an `Err` item and iteration carries on
    /// with the next one.
    pub fn documents(self) -> impl Iterator<Item = Result<SourceDocument>> {
        self.inputs
            .into_iter()
            .flat_map(expand)
            .map(|path| path.and_then(read))
    }
}

fn expand(input: PathBuf) -> Vec<Result<PathBuf>> {
    if !input.is_dir() {
        return vec![Ok(input)];
    }
    match fs::read_dir(&input) {
        Ok(entries) => {
            let mut files: Vec<PathBuf> = entries
                .filter_map(|entry| entry.ok().map(|entry| entry.path()))
                .filter(|path| path.is_file() && is_xml(path))
                .collect();
            files.sort();
            files.into_iter().map(Ok).collect()
        }
        Err(source) => vec![Err(CourierError::ReadError {
            path: input,
            source,
        })],
    }
}

fn is_xml(path: &Path) -> bool {
    path.extension()
        .is_some_and(|extension| extension.eq_ignore_ascii_case("xml"))
}

fn read(path: PathBuf) -> Result<SourceDocument> {
    match fs::read_to_string(&path) {
        Ok(text) => Ok(SourceDocument { path, text }),
        Err(source) => Err(CourierError::ReadError { path, source }),
    }
}
