use thiserror::Error;

#[derive(Error, Debug)]
pub enum AifcError {
    #[error(transparent)]
    Cursor(#[from] n64io::CursorError),
    #[error("invalid format: {0}")]
    InvalidFormat(&'static str),
    #[error("expected {expected}, found {found}")]
    MagicMismatch {
        expected: &'static str,
        found: String,
    },
    #[error("unknown application chunk subtype {0:?}")]
    UnknownChunkSubtype(String),
    #[error("missing {0} chunk")]
    MissingRequiredChunk(&'static str),
    #[error("form holds {0} chunks, at least 3 are required")]
    TooFewChunks(usize),
    #[error("sample rate cannot be represented: {0}")]
    InvalidSampleRate(&'static str),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AifcError>;
