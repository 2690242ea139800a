//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent warpper for [`std::io::Error`]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// Transparent warpper for [`binrw::Error`]
    #[error(transparent)]
    BinRWError(#[from] binrw::Error),

    /// file does not start with the vpk signature
    #[error("file is not a vpk index (signature {0:#010x})")]
    InvalidFormat(u32),

    /// index uses a version this library cannot read
    #[error("unsupported vpk version {0}")]
    UnsupportedVersion(u32),

    /// the entry tree could not be decoded
    #[error("corrupt entry: {0}")]
    CorruptEntry(String),

    /// entry stores data both inline and in an archive
    #[error("unable to read {path}: both preload ({preload_bytes} bytes) and archive data ({entry_length} bytes) are present")]
    UnsupportedEntryShape {
        /// Logical path of the entry
        path: String,
        /// Number of preload bytes declared by the entry
        preload_bytes: i16,
        /// Number of archive bytes declared by the entry
        entry_length: u32,
    },

    /// more than one entry shares a logical path
    #[error("{count} entries share the path {path}")]
    AmbiguousPath {
        /// The requested path
        path: String,
        /// How many entries matched
        count: usize,
    },

    /// archive index cannot be turned into a file name
    #[error("invalid archive index {0}")]
    InvalidArchiveIndex(i16),

    /// entry path cannot be written below a target directory
    #[error("refusing to extract unsafe path {0}")]
    InvalidEntryPath(String),

    /// archive was not opened from a path, so numbered archives cannot be located
    #[error("index was not opened from a path, unable to locate data archives")]
    MissingIndexPath,

    /// unable to find requested file
    #[error("unable to find requested file")]
    FileNotFound(#[from] FileNotFoundError),
}

/// Error type to provide further information when a file has not been found
#[derive(Error, Diagnostic, Debug)]
#[error("unable to find requested file")]
pub enum FileNotFoundError {
    /// at index {0}
    #[error("at index {0}")]
    Index(usize),

    /// by name {0}
    #[error("by name {0}")]
    Name(String),
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;

/// Report an end of file inside `section` of the index as [`Error::CorruptEntry`]
pub(crate) fn truncated(section: &str) -> impl Fn(std::io::Error) -> Error + '_ {
    move |err| match err.kind() {
        std::io::ErrorKind::UnexpectedEof => {
            Error::CorruptEntry(format!("{section} ended unexpectedly"))
        }
        _ => Error::IOError(err),
    }
}

/// Same as [`truncated`] for errors of derived binrw readers, which wrap the io error
pub(crate) fn truncated_binrw(section: &str) -> impl Fn(binrw::Error) -> Error + '_ {
    move |err| {
        if err.is_eof() {
            Error::CorruptEntry(format!("{section} ended unexpectedly"))
        } else {
            Error::BinRWError(err)
        }
    }
}
