//! Assembler error taxonomy (C13): every failure is reported with a 1-based
//! source line number and the offending text, per SPEC_FULL.md §7.

use crate::isa::EncodeError;
use crate::limits::LimitExceeded;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("invalid integer literal '{0}'")]
    BadInteger(String),
    #[error("unknown register name '{0}'")]
    UnknownRegister(String),
    #[error("malformed memory operand '{0}'")]
    BadMemOperand(String),
    #[error("invalid label name '{0}'")]
    BadLabelName(String),
    #[error("unknown directive '{0}'")]
    UnknownDirective(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LabelError {
    #[error("duplicate label '{0}'")]
    Duplicate(String),
    #[error("undefined label '{0}'")]
    Undefined(String),
    #[error("label '{0}' used before any section directive")]
    NoActiveSection(String),
}

#[derive(Error, Debug)]
pub enum AssembleError {
    #[error("line {line}: {source}\n  {text}")]
    Lex { line: usize, text: String, #[source] source: LexError },
    /// Wraps the encoder's `EncodeError` (wrong operand count, unknown
    /// mnemonic, out-of-range immediate).
    #[error("line {line}: {source}\n  {text}")]
    Encode { line: usize, text: String, #[source] source: EncodeError },
    #[error("line {line}: {source}\n  {text}")]
    Label { line: usize, text: String, #[source] source: LabelError },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Raised when the label table grows past [`crate::limits::MAX_LABELS`].
    #[error(transparent)]
    LimitExceeded(#[from] LimitExceeded),
}
