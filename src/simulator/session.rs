//! Debug session (C9): owns the architectural state and the interactive
//! command loop's behavior. `rvsim` (C12) wires this to `rustyline` for
//! line editing; every command's *meaning* lives here so it can be
//! exercised directly from tests without going through a REPL.
//!
//! Grounded on `original_source/include/simulator.h` and
//! `original_source/src/simulator.cpp` (the `Simulator` class this stage is
//! distilled from), with the step/trace loop shaped after `emulate.rs`'s.

use super::callstack::CallStack;
use super::error::SimError;
use super::sourcemap::SourceMap;
use crate::assembler::{data, DataItem, LabelTable};
use crate::isa::{decode, exec, op::Op};
use crate::limits::{Limit, LimitExceeded, MAX_BREAKPOINTS};
use crate::memory::Memory;
use crate::registers::RegisterFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Loaded,
    Halted,
    AtBreakpoint,
    Finished,
    Error,
}

pub struct Session {
    regs: RegisterFile,
    mem: Memory,
    text_words: Vec<u32>,
    source_map: SourceMap,
    labels: LabelTable,
    call_stack: CallStack,
    breakpoints: Vec<usize>,
    state: SessionState,
    trace: bool,
    last_error: Option<String>,
}

impl Session {
    pub fn new(
        text_words: Vec<u32>,
        data_items: &[DataItem],
        labels: LabelTable,
        source_map: SourceMap,
        trace: bool,
    ) -> Result<Self, SimError> {
        let mut mem = Memory::new();
        data::load_data(data_items, &mut mem)?;
        for (i, word) in text_words.iter().enumerate() {
            mem.write32((i * 4) as u64, *word)?;
        }
        Ok(Self {
            regs: RegisterFile::new(),
            mem,
            text_words,
            source_map,
            labels,
            call_stack: CallStack::new(),
            breakpoints: Vec::new(),
            state: SessionState::Loaded,
            trace,
            last_error: None,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn text_end(&self) -> u64 {
        (self.text_words.len() as u64) * 4
    }

    fn current_line(&self) -> Option<usize> {
        self.source_map.line_for(self.regs.get_pc())
    }

    fn update_call_stack(&mut self, op: &Op, pc: u64) {
        match *op {
            Op::Jal { rd, imm } if CallStack::is_link_register(rd) => {
                let target = pc.wrapping_add(imm as u64);
                let name = self
                    .labels
                    .name_for(target)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("function_{target:#x}"));
                self.call_stack.push(name, self.current_line().unwrap_or(0));
            }
            Op::Jalr { rd, rs1, imm } if CallStack::is_canonical_return(rd, rs1, imm) => {
                self.call_stack.pop();
            }
            _ => {}
        }
    }

    /// Execute exactly one instruction, independent of any breakpoint.
    pub fn step(&mut self) -> Result<(), SimError> {
        if matches!(self.state, SessionState::Finished | SessionState::Error) {
            return Ok(());
        }
        let pc = self.regs.get_pc();
        if pc >= self.text_end() {
            self.state = SessionState::Finished;
            return Ok(());
        }
        let word = self.mem.read32(pc)?;
        let op = decode::decode(word)?;
        if self.trace {
            eprintln!("{pc:x}: {op}");
        }
        self.update_call_stack(&op, pc);
        if let Err(e) = exec::execute(&op, &mut self.regs, &mut self.mem) {
            self.state = SessionState::Error;
            let err: SimError = match e {
                exec::ExecutionError::Memory(m) => m.into(),
            };
            self.last_error = Some(err.to_string());
            return Err(err);
        }
        if let Some(line) = self.current_line() {
            self.call_stack.set_current_line(line);
        }
        self.state = if self.regs.get_pc() >= self.text_end() {
            SessionState::Finished
        } else {
            SessionState::Halted
        };
        Ok(())
    }

    /// Step repeatedly until finished, an error, or a breakpointed line is
    /// about to execute.
    pub fn run(&mut self) -> Result<(), SimError> {
        loop {
            if matches!(self.state, SessionState::Finished | SessionState::Error) {
                break;
            }
            let pc = self.regs.get_pc();
            if pc >= self.text_end() {
                self.state = SessionState::Finished;
                break;
            }
            if let Some(line) = self.source_map.line_for(pc) {
                if self.breakpoints.contains(&line) {
                    self.state = SessionState::AtBreakpoint;
                    break;
                }
            }
            self.step()?;
        }
        Ok(())
    }

    pub fn add_breakpoint(&mut self, line: usize) -> Result<(), SimError> {
        if self.breakpoints.contains(&line) {
            return Ok(());
        }
        if self.breakpoints.len() >= MAX_BREAKPOINTS {
            return Err(LimitExceeded { which: Limit::Breakpoints, bound: MAX_BREAKPOINTS }.into());
        }
        self.breakpoints.push(line);
        Ok(())
    }

    pub fn remove_breakpoint(&mut self, line: usize) {
        self.breakpoints.retain(|&l| l != line);
    }

    pub fn breakpoints(&self) -> &[usize] {
        &self.breakpoints
    }

    pub fn regs(&self) -> &RegisterFile {
        &self.regs
    }

    /// Seed a register before running, used by callers (and tests) to set
    /// up argument registers (`a0`, ...) before `run`.
    pub fn set_register(&mut self, index: u8, value: u64) {
        self.regs.write(index, value);
    }

    pub fn dump_regs(&self) -> String {
        self.regs.dump()
    }

    pub fn dump_mem(&self, addr: u64, count: u64) -> Result<String, SimError> {
        let mut out = String::new();
        for offset in 0..count {
            let a = addr + offset;
            let byte = self.mem.read8(a)?;
            out.push_str(&format!("Memory[0x{a:x}] = 0x{byte:02x}\n"));
        }
        Ok(out)
    }

    pub fn show_stack(&self) -> String {
        let mut out = String::new();
        for frame in self.call_stack.frames().iter().rev() {
            out.push_str(&format!("{} (line {})\n", frame.name, frame.line));
        }
        out
    }

    pub fn list_breakpoints(&self) -> String {
        if self.breakpoints.is_empty() {
            "no breakpoints set".to_string()
        } else {
            let mut lines: Vec<usize> = self.breakpoints.clone();
            lines.sort_unstable();
            lines.iter().map(|l| format!("line {l}")).collect::<Vec<_>>().join("\n")
        }
    }

    pub fn disassemble_text(&self) -> String {
        let mut out = String::new();
        for (i, word) in self.text_words.iter().enumerate() {
            let addr = (i as u64) * 4;
            match decode::decode(*word) {
                Ok(op) => out.push_str(&format!("0x{addr:x}: 0x{word:08x}  {op}\n")),
                Err(_) => out.push_str(&format!("0x{addr:x}: 0x{word:08x}  <illegal>\n")),
            }
        }
        out
    }

    pub fn dump_data(&self, data_end: u64) -> String {
        use crate::memory::DATA_BASE;
        use itertools::Itertools;
        let mut out = String::new();
        for row_addrs in &(DATA_BASE..data_end).chunks(8) {
            let addrs: Vec<u64> = row_addrs.collect();
            let row: Vec<u8> = addrs.iter().filter_map(|a| self.mem.read8(*a).ok()).collect();
            if row.iter().any(|b| *b != 0) {
                let bytes = row.iter().map(|b| format!("{b:02x}")).join(" ");
                let base = addrs[0];
                out.push_str(&format!("0x{base:x}: {bytes}\n"));
            }
        }
        out
    }

    pub fn help_text(&self) -> &'static str {
        "run - execute until finished, error, or breakpoint\n\
         step - execute one instruction\n\
         regs - dump all registers\n\
         mem <addr> <count> - read memory\n\
         break <line> / del break <line> - manage breakpoints\n\
         list-breaks - list breakpoints\n\
         show-stack - print the call stack\n\
         text - disassemble the text section\n\
         data - dump non-zero data memory\n\
         exit - leave the session\n\
         help - show this message"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler;
    use std::collections::HashMap;

    fn build(source: &str) -> Session {
        let scan = assembler::labels::scan(source).unwrap();
        let words = assembler::assemble(source).unwrap();
        let source_map = SourceMap::new(
            scan.source_lines.iter().map(|(pc, line)| (*pc, *line)).collect::<HashMap<_, _>>(),
        );
        Session::new(words, &scan.data_items, scan.labels, source_map, false).unwrap()
    }

    #[test]
    fn step_runs_one_instruction_and_advances_pc() {
        let mut session = build(".text\naddi x1, x0, 5\naddi x2, x0, 6\n");
        session.step().unwrap();
        assert_eq!(session.regs().read(1), 5);
        assert_eq!(session.state(), SessionState::Halted);
    }

    #[test]
    fn run_finishes_at_end_of_text() {
        let mut session = build(".text\naddi x1, x0, 5\naddi x2, x0, 6\n");
        session.run().unwrap();
        assert_eq!(session.state(), SessionState::Finished);
        assert_eq!(session.regs().read(1), 5);
        assert_eq!(session.regs().read(2), 6);
    }

    #[test]
    fn breakpoint_stops_before_the_line_executes() {
        let src = ".text\naddi x1, x0, 1\naddi x2, x0, 2\naddi x3, x0, 3\n";
        let mut session = build(src);
        session.add_breakpoint(3).unwrap();
        session.run().unwrap();
        assert_eq!(session.state(), SessionState::AtBreakpoint);
        assert_eq!(session.regs().read(1), 1);
        assert_eq!(session.regs().read(2), 0);
        assert_eq!(session.regs().read(3), 0);
    }

    #[test]
    fn more_than_five_breakpoints_is_rejected() {
        let mut session = build(".text\nnop\nnop\nnop\nnop\nnop\nnop\n");
        for line in 2..=6 {
            session.add_breakpoint(line).unwrap();
        }
        assert!(session.add_breakpoint(7).is_err());
    }

    #[test]
    fn call_and_return_push_and_pop_frames() {
        let src = ".text\njal ra, helper\naddi x0, x0, 0\nhelper: addi a0, a0, 1\nret\n";
        let mut session = build(src);
        session.step().unwrap(); // jal -> pushes "helper"
        assert_eq!(session.show_stack().lines().count(), 2);
        session.step().unwrap(); // addi inside helper
        session.step().unwrap(); // ret -> pops back to main
        assert_eq!(session.show_stack().lines().count(), 1);
    }

    #[test]
    fn memory_fault_moves_session_to_error_state() {
        let src = ".text\nlw a0, 0(a1)\n"; // still has .text; a1 is seeded out of range below
        let mut session = build(src);
        session.set_register(11, u64::MAX);
        let err = session.step();
        assert!(err.is_err());
        assert_eq!(session.state(), SessionState::Error);
        assert!(session.last_error().is_some());
    }
}
