//! N64 sound banks: the `.ctl` bank graph, its `.inst` text form, and
//! export of its samples as AIFC.

mod dedup;
mod error;
pub mod export;
pub mod inst;
mod loader;
pub mod model;

pub use dedup::DedupMap;
pub use error::{CtlError, Result};
pub use export::{export_bank_file, sound_to_aifc};
pub use inst::{parse_inst, InstWriter, OutputMode};
pub use loader::{load_bank_file, LoadOptions};
pub use model::*;
