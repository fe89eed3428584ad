use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unsupported {field}: found {found}, this build supports {supported}")]
    UnsupportedHeader {
        field: &'static str,
        found: i32,
        supported: i32,
    },

    #[error("{context}: declared {declared} bytes but consumed {actual} (ending at offset {offset:#x})")]
    SizeMismatch {
        context: &'static str,
        declared: u64,
        actual: u64,
        offset: usize,
    },

    #[error("unknown {category} {name:?} at offset {offset:#x}")]
    UnknownType {
        category: &'static str,
        name: String,
        offset: usize,
    },

    #[error("unexpected end of data at offset {offset:#x} (need {need} bytes, have {have})")]
    UnexpectedEof {
        offset: usize,
        need: usize,
        have: usize,
    },

    #[error("{context}: reserved constant mismatch at offset {offset:#x}: expected {expected:#x}, found {found:#x}")]
    ReservedConstant {
        context: &'static str,
        expected: u64,
        found: u64,
        offset: usize,
    },

    #[error("invalid boolean value {found} at offset {offset:#x}")]
    InvalidBool { offset: usize, found: u32 },

    #[error("string at offset {offset:#x} is not valid {encoding}")]
    InvalidString {
        offset: usize,
        encoding: &'static str,
    },

    #[error("string length prefix {length} at offset {offset:#x} is out of range")]
    InvalidStringLength { offset: usize, length: i32 },

    #[error("chunk at offset {offset:#x}: duplicated {what} lengths disagree ({first} vs {second})")]
    DuplicateLengthMismatch {
        offset: usize,
        what: &'static str,
        first: u64,
        second: u64,
    },

    #[error("chunk at offset {offset:#x}: inflated to {actual} bytes, header declared {declared}")]
    InflatedSizeMismatch {
        offset: usize,
        declared: u64,
        actual: u64,
    },

    #[error("zlib error in chunk at offset {offset:#x}: {source}")]
    Decompress {
        offset: usize,
        source: std::io::Error,
    },

    #[error("{context}: {message}")]
    Parse {
        context: &'static str,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
