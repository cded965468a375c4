//! Big-endian byte cursors shared by the N64 sound format crates.

mod cursor;
mod error;
mod limits;
mod writer;

pub use cursor::ByteCursor;
pub use error::{CursorError, Result};
pub use limits::{read_input, Limits, DEFAULT_MAX_INPUT_SIZE};
pub use writer::ByteWriter;
