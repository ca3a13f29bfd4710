use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the simulator.
///
/// Request-file errors carry the 1-based line number of the offending row;
/// where the reader trips over a single character the diagnostic reports its
/// ASCII code, as the column may hold arbitrary garbage.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("no operation is given at line {line}")]
    MissingOperation { line: usize },

    #[error("invalid operation at line {line} found: ASCII: {found:02x}")]
    InvalidOperation { line: usize, found: u32 },

    #[error("no address is found in line {line}")]
    MissingAddress { line: usize },

    #[error("a data (ASCII: {found:02x}) has been found for read operation at line {line}; read operations can't have a data")]
    DataOnRead { line: usize, found: u32 },

    #[error("the write operation at line {line} doesn't have a value")]
    MissingData { line: usize },

    #[error("too many arguments for operation at line {line}")]
    TooManyColumns { line: usize },

    #[error("invalid number at line {line}: {token}")]
    InvalidNumber { line: usize, token: String },

    #[error("no operation is given; nothing to run")]
    EmptyTrace,

    #[error("error opening file {path}: {source}")]
    InputIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("error creating trace file {path}: {source}")]
    TraceIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
