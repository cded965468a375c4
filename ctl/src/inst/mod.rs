//! `.inst` text: a declarative description of a bank file.
//!
//! ```text
//! envelope Envelope0000
//! {
//!     attackTime = 0;
//!     ...
//! }
//!
//! sound Sound0000
//! {
//!     use ("sound0000.aifc");
//!     envelope = Envelope0000;
//! }
//! ```

pub mod lexer;
mod parser;
mod writer;

pub use parser::parse_inst;
pub use writer::{InstWriter, OutputMode};
