//! Label table and two-pass scan (C4): walks the source once, tracking a
//! text program counter and a data program counter, and returns every
//! label binding plus the raw instruction and data lines ready for the
//! assembler's Pass 2 (encode) or the simulator's loader (C8/C11).
//!
//! Grounded on `original_source/src/simulator.cpp::scanLabels`, widened to
//! case-insensitive label names per SPEC_FULL.md §3.

use super::error::{AssembleError, LabelError, LexError};
use super::parser::{self, LineContent, RawOperand, Section};
use crate::limits::{Limit, LimitExceeded, MAX_LABELS};
use crate::memory::DATA_BASE;
use std::collections::HashMap;

/// Case-insensitive label → byte address map.
#[derive(Debug, Default, Clone)]
pub struct LabelTable(HashMap<String, u64>);

impl LabelTable {
    pub fn get(&self, name: &str) -> Option<u64> {
        self.0.get(&name.to_lowercase()).copied()
    }

    /// Reverse lookup used by the call-stack tracker to name a jump target;
    /// the label table is small enough that a linear scan is fine.
    pub fn name_for(&self, addr: u64) -> Option<&str> {
        self.0.iter().find(|(_, a)| **a == addr).map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn insert(&mut self, name: &str, addr: u64) -> Result<(), LabelError> {
        let key = name.to_lowercase();
        if self.0.contains_key(&key) {
            return Err(LabelError::Duplicate(name.to_string()));
        }
        self.0.insert(key, addr);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedInstruction {
    pub address: u64,
    pub source_line: usize,
    pub mnemonic: String,
    pub operands: Vec<RawOperand>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataItem {
    pub address: u64,
    pub width: u8,
    pub value: i64,
}

#[derive(Debug, Default)]
pub struct ScanResult {
    pub labels: LabelTable,
    pub instructions: Vec<ScannedInstruction>,
    pub data_items: Vec<DataItem>,
    /// `source_line` of the instruction at each text address, for the
    /// simulator's breakpoint and call-stack line lookups (C11).
    pub source_lines: HashMap<u64, usize>,
}

fn locate(line: usize, text: &str, err: LexError) -> AssembleError {
    AssembleError::Lex { line, text: text.to_string(), source: err }
}

pub fn scan(source: &str) -> Result<ScanResult, AssembleError> {
    let mut result = ScanResult::default();
    let mut section: Option<Section> = None;
    let mut text_pc: u64 = 0;
    let mut data_pc: u64 = DATA_BASE;

    for (idx, raw_line) in source.lines().enumerate() {
        let line_no = idx + 1;
        let parsed = parser::parse_line(raw_line).map_err(|e| locate(line_no, raw_line, e))?;

        if let Some(name) = &parsed.label {
            let addr = match section {
                Some(Section::Text) | None => text_pc,
                Some(Section::Data) => data_pc,
            };
            if section.is_none() {
                return Err(AssembleError::Label {
                    line: line_no,
                    text: raw_line.to_string(),
                    source: LabelError::NoActiveSection(name.clone()),
                });
            }
            if result.labels.len() >= MAX_LABELS {
                return Err(LimitExceeded { which: Limit::Labels, bound: MAX_LABELS }.into());
            }
            result.labels.insert(name, addr).map_err(|e| AssembleError::Label {
                line: line_no,
                text: raw_line.to_string(),
                source: e,
            })?;
        }

        match parsed.content {
            LineContent::Empty => {}
            LineContent::Section(s) => section = Some(s),
            LineContent::Data { width, values } => {
                if section != Some(Section::Data) {
                    return Err(locate(
                        line_no,
                        raw_line,
                        LexError::UnknownDirective("data directive outside .data section".to_string()),
                    ));
                }
                for value in values {
                    result.data_items.push(DataItem { address: data_pc, width, value });
                    data_pc += width as u64;
                }
            }
            LineContent::Instruction { mnemonic, operands } => {
                if section != Some(Section::Text) {
                    return Err(locate(
                        line_no,
                        raw_line,
                        LexError::UnknownDirective("instruction outside .text section".to_string()),
                    ));
                }
                result.source_lines.insert(text_pc, line_no);
                result.instructions.push(ScannedInstruction {
                    address: text_pc,
                    source_line: line_no,
                    mnemonic,
                    operands,
                });
                text_pc += 4;
            }
        }
    }

    Ok(result)
}
