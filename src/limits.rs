//! `LimitExceeded` (part of C13): shared between the assembler's label
//! table and the simulator's breakpoint set, so both report through the
//! same taxonomy entry.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    Labels,
    Breakpoints,
}

impl std::fmt::Display for Limit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Limit::Labels => write!(f, "labels"),
            Limit::Breakpoints => write!(f, "breakpoints"),
        }
    }
}

/// Five simultaneous breakpoints
/// (`original_source/src/simulator.cpp::setBreakpoint`).
pub const MAX_BREAKPOINTS: usize = 5;

/// Fifty labels, matching `MAX_LABELS` in
/// `original_source/Assembler/include/assembler.h`.
pub const MAX_LABELS: usize = 50;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Maximum number of {which} ({bound}) reached")]
pub struct LimitExceeded {
    pub which: Limit,
    pub bound: usize,
}
