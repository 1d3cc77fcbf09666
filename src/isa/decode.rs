//! Decoder (C6): 32-bit instruction word -> [`Op`].
//!
//! Dispatch is opcode first, then funct3, then funct7 where the opcode
//! alone does not disambiguate. Every field is masked out with the helpers
//! in [`crate::isa::fields`] and immediates are reconstructed already
//! sign-extended, so nothing downstream re-interprets a raw field again.

use super::fields::*;
use super::op::*;
use thiserror::Error;

#[derive(Error, PartialEq, Eq, Debug, Clone, Copy)]
#[error("illegal instruction: word 0x{word:08x} does not decode to any known RV64I operation")]
pub struct DecodeError {
    pub word: u32,
}

const OPCODE_OP: u32 = 0x33;
const OPCODE_OP_32: u32 = 0x3B;
const OPCODE_OP_IMM: u32 = 0x13;
const OPCODE_OP_IMM_32: u32 = 0x1B;
const OPCODE_LOAD: u32 = 0x03;
const OPCODE_STORE: u32 = 0x23;
const OPCODE_BRANCH: u32 = 0x63;
const OPCODE_LUI: u32 = 0x37;
const OPCODE_AUIPC: u32 = 0x17;
const OPCODE_JAL: u32 = 0x6F;
const OPCODE_JALR: u32 = 0x67;

pub fn decode(word: u32) -> Result<Op, DecodeError> {
    let op = opcode(word);
    let f3 = funct3(word);
    let f7 = funct7(word);
    let rd_ = rd(word) as u8;
    let rs1_ = rs1(word) as u8;
    let rs2_ = rs2(word) as u8;
    let fault = || DecodeError { word };

    match op {
        OPCODE_OP => {
            let kind = match (f3, f7) {
                (0x0, 0x00) => RegRegOp::Add,
                (0x0, 0x20) => RegRegOp::Sub,
                (0x1, 0x00) => RegRegOp::Sll,
                (0x2, 0x00) => RegRegOp::Slt,
                (0x3, 0x00) => RegRegOp::Sltu,
                (0x4, 0x00) => RegRegOp::Xor,
                (0x5, 0x00) => RegRegOp::Srl,
                (0x5, 0x20) => RegRegOp::Sra,
                (0x6, 0x00) => RegRegOp::Or,
                (0x7, 0x00) => RegRegOp::And,
                _ => return Err(fault()),
            };
            Ok(Op::RegReg { kind, rd: rd_, rs1: rs1_, rs2: rs2_ })
        }
        OPCODE_OP_32 => {
            let kind = match (f3, f7) {
                (0x0, 0x00) => RegRegOp::Addw,
                (0x0, 0x20) => RegRegOp::Subw,
                (0x1, 0x00) => RegRegOp::Sllw,
                (0x5, 0x00) => RegRegOp::Srlw,
                (0x5, 0x20) => RegRegOp::Sraw,
                _ => return Err(fault()),
            };
            Ok(Op::RegReg { kind, rd: rd_, rs1: rs1_, rs2: rs2_ })
        }
        OPCODE_OP_IMM => {
            match f3 {
                0x1 | 0x5 => {
                    // shift-immediate: 6-bit shamt, bits[25:20]; the top 6
                    // bits [31:26] distinguish logical (0x00) from
                    // arithmetic (0x10, i.e. bit 30 set).
                    let funct6 = bits32(word, 26, 6);
                    let shamt = bits32(word, 20, 6);
                    let kind = match (f3, funct6) {
                        (0x1, 0x00) => ShiftOp::Slli,
                        (0x5, 0x00) => ShiftOp::Srli,
                        (0x5, 0x10) => ShiftOp::Srai,
                        _ => return Err(fault()),
                    };
                    Ok(Op::Shift { kind, rd: rd_, rs1: rs1_, shamt })
                }
                _ => {
                    let kind = match f3 {
                        0x0 => RegImmOp::Addi,
                        0x2 => RegImmOp::Slti,
                        0x3 => RegImmOp::Sltiu,
                        0x4 => RegImmOp::Xori,
                        0x6 => RegImmOp::Ori,
                        0x7 => RegImmOp::Andi,
                        _ => return Err(fault()),
                    };
                    Ok(Op::RegImm { kind, rd: rd_, rs1: rs1_, imm: imm_itype(word) })
                }
            }
        }
        OPCODE_OP_IMM_32 => match f3 {
            0x0 => Ok(Op::RegImm { kind: RegImmOp::Addiw, rd: rd_, rs1: rs1_, imm: imm_itype(word) }),
            0x1 | 0x5 => {
                // W-variant shift-immediate: real 7-bit funct7, 5-bit shamt.
                let shamt = bits32(word, 20, 5);
                let kind = match (f3, f7) {
                    (0x1, 0x00) => ShiftOp::Slliw,
                    (0x5, 0x00) => ShiftOp::Srliw,
                    (0x5, 0x20) => ShiftOp::Sraiw,
                    _ => return Err(fault()),
                };
                Ok(Op::Shift { kind, rd: rd_, rs1: rs1_, shamt })
            }
            _ => Err(fault()),
        },
        OPCODE_LOAD => {
            let kind = match f3 {
                0x0 => LoadOp::Lb,
                0x1 => LoadOp::Lh,
                0x2 => LoadOp::Lw,
                0x3 => LoadOp::Ld,
                0x4 => LoadOp::Lbu,
                0x5 => LoadOp::Lhu,
                0x6 => LoadOp::Lwu,
                _ => return Err(fault()),
            };
            Ok(Op::Load { kind, rd: rd_, rs1: rs1_, imm: imm_itype(word) })
        }
        OPCODE_STORE => {
            let kind = match f3 {
                0x0 => StoreOp::Sb,
                0x1 => StoreOp::Sh,
                0x2 => StoreOp::Sw,
                0x3 => StoreOp::Sd,
                _ => return Err(fault()),
            };
            Ok(Op::Store { kind, rs1: rs1_, rs2: rs2_, imm: imm_stype(word) })
        }
        OPCODE_BRANCH => {
            let kind = match f3 {
                0x0 => BranchOp::Beq,
                0x1 => BranchOp::Bne,
                0x4 => BranchOp::Blt,
                0x5 => BranchOp::Bge,
                0x6 => BranchOp::Bltu,
                0x7 => BranchOp::Bgeu,
                _ => return Err(fault()),
            };
            Ok(Op::Branch { kind, rs1: rs1_, rs2: rs2_, imm: imm_btype(word) })
        }
        OPCODE_LUI => Ok(Op::Lui { rd: rd_, imm: imm_utype(word) }),
        OPCODE_AUIPC => Ok(Op::Auipc { rd: rd_, imm: imm_utype(word) }),
        OPCODE_JAL => Ok(Op::Jal { rd: rd_, imm: imm_jtype(word) }),
        OPCODE_JALR => {
            if f3 != 0 {
                return Err(fault());
            }
            Ok(Op::Jalr { rd: rd_, rs1: rs1_, imm: imm_itype(word) })
        }
        _ => Err(fault()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_addi() {
        let op = decode(0x00A10093).unwrap();
        assert_eq!(op, Op::RegImm { kind: RegImmOp::Addi, rd: 1, rs1: 2, imm: 10 });
    }

    #[test]
    fn decode_add() {
        let op = decode(0x003100B3).unwrap();
        assert_eq!(op, Op::RegReg { kind: RegRegOp::Add, rd: 1, rs1: 2, rs2: 3 });
    }

    #[test]
    fn decode_sw_and_negative_sb() {
        let op = decode(0x00112423).unwrap();
        assert_eq!(op, Op::Store { kind: StoreOp::Sw, rs1: 2, rs2: 1, imm: 8 });
        let op = decode(0xFE320FA3u32).unwrap();
        assert_eq!(op, Op::Store { kind: StoreOp::Sb, rs1: 4, rs2: 3, imm: -4 });
    }

    #[test]
    fn decode_unknown_opcode_fails() {
        assert!(decode(0x0000007F).is_err());
    }

    #[test]
    fn decode_reserved_funct3_fails() {
        // opcode=BRANCH, funct3=2 and 3 are reserved
        let word = (2u32 << 12) | OPCODE_BRANCH;
        assert!(decode(word).is_err());
    }
}
