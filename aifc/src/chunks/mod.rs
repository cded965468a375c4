pub mod appl;
pub mod comm;
pub mod ssnd;

pub use appl::{AdpcmLoop, ApplKind, CodebookChunk, LoopChunk, LOOP_STATE_SIZE};
pub use comm::CommonChunk;
pub use ssnd::SoundDataChunk;
