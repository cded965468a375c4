use crate::model::NodeKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CtlError {
    #[error(transparent)]
    Cursor(#[from] n64io::CursorError),
    #[error("bank file revision is {found:#06x}, expected {expected:#06x}")]
    MagicMismatch { expected: u16, found: u16 },
    #[error("bank file holds no banks")]
    EmptyBankFile,
    #[error("{kind} count {count} at offset {offset:#x} is negative")]
    NegativeCount {
        kind: NodeKind,
        offset: usize,
        count: i64,
    },
    #[error("unresolved {kind} reference {name:?}")]
    UnresolvedReference { kind: NodeKind, name: String },
    #[error("{field} value {value} does not fit its field")]
    ValueOutOfRange { field: &'static str, value: i64 },

    #[error("line {line}, column {column}: unexpected {found:?} while {state}")]
    MalformedGrammar {
        line: usize,
        column: usize,
        state: &'static str,
        found: char,
    },
    #[error("line {line}: unknown type {name:?}")]
    UnknownType { line: usize, name: String },
    #[error("line {line}: {kind} has no property {name:?}")]
    UnknownProperty {
        line: usize,
        kind: NodeKind,
        name: String,
    },
    #[error("line {line}: property {name:?} does not take this kind of value")]
    WrongValueKind { line: usize, name: String },
    #[error("line {line}: token longer than {max} characters")]
    TokenTooLong { line: usize, max: usize },
    #[error("line {line}: input ends inside a declaration")]
    UnexpectedEnd { line: usize },
    #[error("line {line}: {kind} {name:?} is declared twice")]
    DuplicateInstance {
        line: usize,
        kind: NodeKind,
        name: String,
    },
    #[error("line {line}: index {index} of {name:?} is assigned twice")]
    DuplicateIndex {
        line: usize,
        name: String,
        index: u32,
    },
    #[error("line {line}: index {index} of {name:?} leaves a gap, expected {expected}")]
    IndexGap {
        line: usize,
        name: String,
        index: u32,
        expected: u32,
    },
    #[error("{kind} {name:?} is declared but never referenced")]
    OrphanedInstance { kind: NodeKind, name: String },

    #[error("unsupported: {0}")]
    UnsupportedFeature(String),
    #[error(transparent)]
    Aifc(#[from] aifc::AifcError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CtlError>;
