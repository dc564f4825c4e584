//! Error type shared by all stages of the family preparation.
//!
//! Parsing and writing errors are bound to one file or one family so that
//! the pipeline can report them and carry on with the rest of the batch.

use std::path::PathBuf;
use thiserror::Error;

use crate::lib::common::Role;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, HeterosisError>;

#[derive(Error, Debug)]
pub enum HeterosisError {
    /// the file name does not follow `<tissue><individual>-<replicate>_<suffix>.count`
    #[error("malformed sample file name {path:?}: {reason}")]
    MalformedFilename {
        path: PathBuf,
        reason: String,
    },

    /// the family part of the individual code is not a number
    #[error("malformed family id {value:?} in sample file name {path:?}")]
    MalformedFamilyId {
        path: PathBuf,
        value: String,
    },

    /// a row of the count file is not `gene_id<whitespace>integer`
    #[error("malformed count file {path:?} (line {line}): {reason}")]
    MalformedCountFile {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// two records slated for merging disagree on their identity or genes
    #[error("refusing to merge {first:?} and {second:?}: {reason}")]
    InconsistentMerge {
        first: String,
        second: String,
        reason: String,
    },

    /// the hybrid family has no parent samples of one side
    #[error("family {family}: no {role} samples with code {code:?} in tissue {tissue}")]
    MissingParent {
        family: String,
        role: Role,
        code: String,
        tissue: char,
    },

    /// the gene column of one sample differs from the family reference
    #[error("family {family}: gene ids of {sample:?} differ from the reference at row {row}")]
    ColumnMismatch {
        family: String,
        sample: String,
        row: usize,
    },

    /// a line of the file of file names holds more than one entry
    #[error("malformed file of file names {path:?} (line {line}): {reason}")]
    MalformedFofn {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("no *.count files found in {path:?}")]
    NoCountFiles {
        path: PathBuf,
    },

    #[error("could not access {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl HeterosisError {
    /// wraps an io error together with the file it happened on
    pub fn io<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        HeterosisError::Io { path: path.into(), source }
    }

    /// Attaches the file being written to csv errors, which carry no path.
    /// Other errors are returned unchanged.
    pub fn at_path<P: Into<PathBuf>>(self, path: P) -> Self {
        match self {
            HeterosisError::Csv(e) => {
                let source = match e.into_kind() {
                    csv::ErrorKind::Io(io_error) => io_error,
                    other => std::io::Error::new(std::io::ErrorKind::Other, format!("{:?}", other)),
                };
                HeterosisError::io(path, source)
            }
            other => other,
        }
    }
}
