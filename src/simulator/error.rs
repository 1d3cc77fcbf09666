//! Simulator error taxonomy (C13).

use crate::isa::DecodeError;
use crate::limits::LimitExceeded;
use crate::memory::MemoryFault;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("illegal instruction: {0}")]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Memory(#[from] MemoryFault),
    #[error(transparent)]
    LimitExceeded(#[from] LimitExceeded),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
