use thiserror::Error;

#[derive(Error, Debug)]
pub enum CseqError {
    #[error(transparent)]
    Cursor(#[from] n64io::CursorError),
    #[error("corrupt stream at {offset:#x}: {reason}")]
    CorruptStream { offset: usize, reason: &'static str },
    #[error("unsupported: {0}")]
    UnsupportedFeature(String),
    #[error("malformed {kind} event at {offset:#x}")]
    MalformedMeta { offset: usize, kind: &'static str },
    #[error("variable-length quantity at {offset:#x} is longer than 4 bytes")]
    VarintTooLong { offset: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CseqError>;
