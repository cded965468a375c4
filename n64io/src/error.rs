use thiserror::Error;

#[derive(Error, Debug)]
pub enum CursorError {
    #[error("truncated input: needed {needed} bytes at offset {offset:#x}, only {available} available")]
    TruncatedInput {
        offset: usize,
        needed: usize,
        available: usize,
    },
    #[error("input is {len} bytes, larger than the configured maximum of {max}")]
    InputTooLarge { len: u64, max: u64 },
    #[error("seek to {offset:#x} is outside a buffer of {len} bytes")]
    SeekOutOfRange { offset: usize, len: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CursorError>;
