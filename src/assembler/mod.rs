//! The assembler: two-pass label collection (C4) into per-instruction
//! encoding (C5) and `.data` loading (C8).

pub mod data;
pub mod error;
pub mod labels;
pub mod parser;

pub use error::{AssembleError, LabelError, LexError};
pub use labels::{DataItem, LabelTable, ScanResult};

use crate::isa::encode::{self, Operand};
use labels::ScannedInstruction;
use parser::RawOperand;

/// Mnemonics whose sole label-bearing operand is a branch/jump target and
/// therefore resolves to `label_address - pc`, not an absolute address.
fn is_relative_branch_or_jump(mnemonic: &str) -> bool {
    matches!(
        mnemonic.to_lowercase().as_str(),
        "beq" | "bne" | "blt" | "bge" | "bltu" | "bgeu" | "jal" | "j" | "beqz" | "bnez" | "blez" | "bgez" | "bltz" | "bgtz"
    )
}

fn resolve_operands(
    instr: &ScannedInstruction,
    labels: &LabelTable,
) -> Result<Vec<Operand>, LabelError> {
    let relative = is_relative_branch_or_jump(&instr.mnemonic);
    instr
        .operands
        .iter()
        .map(|op| match op {
            RawOperand::Reg(r) => Ok(Operand::Reg(*r)),
            RawOperand::Imm(v) => Ok(Operand::Imm(*v)),
            RawOperand::Mem { offset, base } => Ok(Operand::Mem { offset: *offset, base: *base }),
            RawOperand::Label(name) => {
                let addr = labels.get(name).ok_or_else(|| LabelError::Undefined(name.clone()))?;
                let value = if relative {
                    addr as i64 - instr.address as i64
                } else {
                    addr as i64
                };
                Ok(Operand::Imm(value))
            }
        })
        .collect()
}

/// Run the full two-pass pipeline over `source` and return the assembled
/// instruction words, one per `.text` instruction, in program order.
pub fn assemble(source: &str) -> Result<Vec<u32>, AssembleError> {
    let scan = labels::scan(source)?;
    scan_to_words(&scan, source)
}

fn scan_to_words(scan: &ScanResult, source: &str) -> Result<Vec<u32>, AssembleError> {
    let source_lines: Vec<&str> = source.lines().collect();
    let mut words = Vec::with_capacity(scan.instructions.len());
    for instr in &scan.instructions {
        let line_text = source_lines.get(instr.source_line - 1).copied().unwrap_or("");
        let operands = resolve_operands(instr, &scan.labels).map_err(|e| AssembleError::Label {
            line: instr.source_line,
            text: line_text.to_string(),
            source: e,
        })?;
        let op = encode::assemble(&instr.mnemonic, &operands).map_err(|e| AssembleError::Encode {
            line: instr.source_line,
            text: line_text.to_string(),
            source: e,
        })?;
        words.push(encode::encode_op(&op));
    }
    Ok(words)
}
