//! Execute engine (C7): apply one decoded [`Op`] to the register file and
//! memory, then advance the program counter.
//!
//! Every instruction's three duties happen in the same fixed order: read
//! source operands, compute the result, write destination register, write
//! memory, update PC. Register writes and memory writes both land before
//! the PC update, matching the ordering guarantee in SPEC_FULL.md §5.

use super::op::*;
use crate::memory::{Memory, MemoryFault};
use crate::registers::RegisterFile;
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionError {
    #[error(transparent)]
    Memory(#[from] MemoryFault),
}

fn sign_extend_32(value: i32) -> u64 {
    value as i64 as u64
}

/// Execute `op` against `regs`/`mem`, whose `pc` field is already the
/// address `op` was fetched from. On return, `regs.get_pc()` is the address
/// of the next instruction to fetch.
pub fn execute(op: &Op, regs: &mut RegisterFile, mem: &mut Memory) -> Result<(), ExecutionError> {
    let pc = regs.get_pc();
    let mut next_pc = pc.wrapping_add(4);

    match *op {
        Op::RegReg { kind, rd, rs1, rs2 } => {
            let a = regs.read(rs1);
            let b = regs.read(rs2);
            let result = if kind.is_word() {
                let (a32, b32) = (a as i32, b as i32);
                let r: i32 = match kind {
                    RegRegOp::Addw => a32.wrapping_add(b32),
                    RegRegOp::Subw => a32.wrapping_sub(b32),
                    RegRegOp::Sllw => a32.wrapping_shl(b32 as u32 & 31),
                    RegRegOp::Srlw => ((a32 as u32).wrapping_shr(b32 as u32 & 31)) as i32,
                    RegRegOp::Sraw => a32.wrapping_shr(b32 as u32 & 31),
                    _ => unreachable!("non-word RegRegOp under is_word() branch"),
                };
                sign_extend_32(r)
            } else {
                match kind {
                    RegRegOp::Add => a.wrapping_add(b),
                    RegRegOp::Sub => a.wrapping_sub(b),
                    RegRegOp::Sll => a.wrapping_shl(b as u32 & 63),
                    RegRegOp::Slt => ((a as i64) < (b as i64)) as u64,
                    RegRegOp::Sltu => (a < b) as u64,
                    RegRegOp::Xor => a ^ b,
                    RegRegOp::Srl => a.wrapping_shr(b as u32 & 63),
                    RegRegOp::Sra => ((a as i64).wrapping_shr(b as u32 & 63)) as u64,
                    RegRegOp::Or => a | b,
                    RegRegOp::And => a & b,
                    _ => unreachable!("word RegRegOp under non-word branch"),
                }
            };
            regs.write(rd, result);
        }
        Op::RegImm { kind, rd, rs1, imm } => {
            let a = regs.read(rs1);
            let result = if kind.is_word() {
                sign_extend_32((a as i32).wrapping_add(imm as i32))
            } else {
                match kind {
                    RegImmOp::Addi => a.wrapping_add(imm as u64),
                    RegImmOp::Slti => ((a as i64) < imm) as u64,
                    RegImmOp::Sltiu => (a < imm as u64) as u64,
                    RegImmOp::Xori => a ^ (imm as u64),
                    RegImmOp::Ori => a | (imm as u64),
                    RegImmOp::Andi => a & (imm as u64),
                    RegImmOp::Addiw => unreachable!("Addiw handled in word branch"),
                }
            };
            regs.write(rd, result);
        }
        Op::Shift { kind, rd, rs1, shamt } => {
            let a = regs.read(rs1);
            let arith = matches!(kind, ShiftOp::Srai | ShiftOp::Sraiw);
            let logical_right = matches!(kind, ShiftOp::Srli | ShiftOp::Srliw);
            let result = if kind.is_word() {
                let a32 = a as i32;
                let r: i32 = if arith {
                    a32.wrapping_shr(shamt)
                } else if logical_right {
                    ((a32 as u32).wrapping_shr(shamt)) as i32
                } else {
                    a32.wrapping_shl(shamt)
                };
                sign_extend_32(r)
            } else if arith {
                ((a as i64).wrapping_shr(shamt)) as u64
            } else if logical_right {
                a.wrapping_shr(shamt)
            } else {
                a.wrapping_shl(shamt)
            };
            regs.write(rd, result);
        }
        Op::Load { kind, rd, rs1, imm } => {
            let addr = regs.read(rs1).wrapping_add(imm as u64);
            let value = match kind {
                LoadOp::Lb => mem.read8(addr)? as i8 as i64 as u64,
                LoadOp::Lh => mem.read16(addr)? as i16 as i64 as u64,
                LoadOp::Lw => mem.read32(addr)? as i32 as i64 as u64,
                LoadOp::Ld => mem.read64(addr)?,
                LoadOp::Lbu => mem.read8(addr)? as u64,
                LoadOp::Lhu => mem.read16(addr)? as u64,
                LoadOp::Lwu => mem.read32(addr)? as u64,
            };
            regs.write(rd, value);
        }
        Op::Store { kind, rs1, rs2, imm } => {
            let addr = regs.read(rs1).wrapping_add(imm as u64);
            let value = regs.read(rs2);
            match kind {
                StoreOp::Sb => mem.write8(addr, value as u8)?,
                StoreOp::Sh => mem.write16(addr, value as u16)?,
                StoreOp::Sw => mem.write32(addr, value as u32)?,
                StoreOp::Sd => mem.write64(addr, value)?,
            }
        }
        Op::Branch { kind, rs1, rs2, imm } => {
            let a = regs.read(rs1);
            let b = regs.read(rs2);
            let taken = match kind {
                BranchOp::Beq => a == b,
                BranchOp::Bne => a != b,
                BranchOp::Blt => (a as i64) < (b as i64),
                BranchOp::Bge => (a as i64) >= (b as i64),
                BranchOp::Bltu => a < b,
                BranchOp::Bgeu => a >= b,
            };
            if taken {
                next_pc = pc.wrapping_add(imm as u64);
            }
        }
        Op::Lui { rd, imm } => {
            regs.write(rd, sign_extend_32(((imm as i32) << 12) as i32) as u64);
        }
        Op::Auipc { rd, imm } => {
            let value = pc.wrapping_add(sign_extend_32(((imm as i32) << 12) as i32));
            regs.write(rd, value);
        }
        Op::Jal { rd, imm } => {
            regs.write(rd, pc.wrapping_add(4));
            next_pc = pc.wrapping_add(imm as u64);
        }
        Op::Jalr { rd, rs1, imm } => {
            let target = regs.read(rs1).wrapping_add(imm as u64) & !1u64;
            regs.write(rd, pc.wrapping_add(4));
            next_pc = target;
        }
    }

    regs.set_pc(next_pc);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isa::decode::decode;

    fn run(word: u32, regs: &mut RegisterFile, mem: &mut Memory) {
        let op = decode(word).unwrap();
        execute(&op, regs, mem).unwrap();
    }

    #[test]
    fn addi_increments_and_advances_pc() {
        let mut regs = RegisterFile::new();
        let mut mem = Memory::new();
        regs.write(2, 5);
        run(0x00A10093, &mut regs, &mut mem); // addi x1, x2, 10
        assert_eq!(regs.read(1), 15);
        assert_eq!(regs.get_pc(), 4);
    }

    #[test]
    fn branch_taken_jumps_by_offset() {
        let mut regs = RegisterFile::new();
        let mut mem = Memory::new();
        regs.write(1, 7);
        regs.write(2, 7);
        regs.set_pc(0x100);
        run(0x00208463, &mut regs, &mut mem); // beq x1, x2, 8
        assert_eq!(regs.get_pc(), 0x108);
    }

    #[test]
    fn branch_not_taken_falls_through() {
        let mut regs = RegisterFile::new();
        let mut mem = Memory::new();
        regs.write(1, 7);
        regs.write(2, 9);
        regs.set_pc(0x100);
        run(0x00208463, &mut regs, &mut mem); // beq x1, x2, 8 (not equal)
        assert_eq!(regs.get_pc(), 0x104);
    }

    #[test]
    fn jal_links_and_jumps() {
        let mut regs = RegisterFile::new();
        let mut mem = Memory::new();
        regs.set_pc(0x200);
        run(0x100002EF, &mut regs, &mut mem); // jal x5, 16
        assert_eq!(regs.read(5), 0x204);
        assert_eq!(regs.get_pc(), 0x210);
    }

    #[test]
    fn jalr_clears_low_bit_of_target() {
        let mut regs = RegisterFile::new();
        let mut mem = Memory::new();
        regs.write(2, 0x41);
        regs.set_pc(0x300);
        run(0x00010067, &mut regs, &mut mem); // jalr x0, 0(x2)
        assert_eq!(regs.get_pc(), 0x40);
    }

    #[test]
    fn x0_destination_write_is_discarded() {
        let mut regs = RegisterFile::new();
        let mut mem = Memory::new();
        run(0x00A00013, &mut regs, &mut mem); // addi x0, x0, 10
        assert_eq!(regs.read(0), 0);
    }

    #[test]
    fn store_then_load_round_trips_sign_extension() {
        let mut regs = RegisterFile::new();
        let mut mem = Memory::new();
        regs.write(2, 0x10000);
        regs.write(1, (-5i64) as u64);
        run(0x00110023, &mut regs, &mut mem); // sb x1, 0(x2)
        run(0x00010183, &mut regs, &mut mem); // lb x3, 0(x2)
        assert_eq!(regs.read(3) as i64, -5);
    }

    #[test]
    fn addw_sign_extends_32_bit_overflow() {
        let mut regs = RegisterFile::new();
        let mut mem = Memory::new();
        regs.write(1, 0x7FFF_FFFF);
        regs.write(2, 1);
        run(0x002081BB, &mut regs, &mut mem); // addw x3, x1, x2
        assert_eq!(regs.read(3) as i64, -0x8000_0000i64);
    }

    #[test]
    fn lui_and_auipc_match_spec_formulas() {
        let mut regs = RegisterFile::new();
        let mut mem = Memory::new();
        regs.set_pc(0x1000);
        run(0x00001537, &mut regs, &mut mem); // lui x10, 1
        assert_eq!(regs.read(10), 0x1000);
        regs.set_pc(0x1000);
        run(0x00001597, &mut regs, &mut mem); // auipc x11, 1
        assert_eq!(regs.read(11), 0x2000);
    }
}
