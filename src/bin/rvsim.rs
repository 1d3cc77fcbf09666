//! Interactive RV64I simulator/debugger front-end (C12).
//!
//! Grounded on `emulate.rs`'s `clap`-parsed binary shape and trace-printing
//! step loop, and on `original_source/include/simulator.h` /
//! `src/simulator.cpp` for the command set itself, which lives in
//! [`rv64edu::simulator::Session`].

use clap::Parser;
use clap_num::maybe_hex;
use rv64edu::assembler::labels;
use rv64edu::assembler::AssembleError;
use rv64edu::simulator::{SimError, Session, SessionState, SourceMap};
use rustyline::DefaultEditor;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;

/// Union of everything that can go wrong loading a session, so `main` has a
/// single error type to report without losing the underlying cause.
#[derive(Error, Debug)]
enum LoadError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Assemble(#[from] AssembleError),
    #[error(transparent)]
    Sim(#[from] SimError),
}

/// Load a program and step through it interactively.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to the original assembly source, used to recover labels,
    /// breakpoint line numbers, and the `.data` section image.
    #[arg(long)]
    source: PathBuf,

    /// Path to the assembled hex machine code to load into text memory.
    #[arg(long)]
    hex: PathBuf,

    /// Echo every executed instruction's disassembly to stderr.
    #[arg(long)]
    trace: bool,

    /// Print the 16-byte memory region starting from this address before
    /// entering the command loop (use a `0x` prefix for hexadecimal).
    #[arg(long, value_parser = maybe_hex::<u64>)]
    dump_mem: Option<u64>,
}

fn parse_hex_words(text: &str) -> Vec<u32> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .filter_map(|l| u32::from_str_radix(l, 16).ok())
        .collect()
}

fn load_session(args: &Args) -> Result<Session, LoadError> {
    let source = fs::read_to_string(&args.source)?;
    let hex_text = fs::read_to_string(&args.hex)?;
    let scan = labels::scan(&source)?;
    let words = parse_hex_words(&hex_text);
    let source_map = SourceMap::new(
        scan.source_lines.iter().map(|(pc, line)| (*pc, *line)).collect::<HashMap<_, _>>(),
    );
    let session = Session::new(words, &scan.data_items, scan.labels, source_map, args.trace)?;
    Ok(session)
}

fn print_session_state(session: &Session) {
    match session.state() {
        SessionState::Finished => println!("Program finished."),
        SessionState::AtBreakpoint => println!("Stopped at breakpoint."),
        SessionState::Error => println!("Error: {}", session.last_error().unwrap_or("unknown")),
        SessionState::Halted | SessionState::Loaded => {}
    }
}

fn dispatch(session: &mut Session, line: &str) -> bool {
    let mut parts = line.split_whitespace();
    match parts.next() {
        None => {}
        Some("exit") => return true,
        Some("run") => {
            if let Err(e) = session.run() {
                println!("{e}");
            }
            print_session_state(session);
        }
        Some("step") => {
            if let Err(e) = session.step() {
                println!("{e}");
            }
            print_session_state(session);
        }
        Some("regs") => print!("{}", session.dump_regs()),
        Some("mem") => match (
            parts.next().and_then(|a| maybe_hex::<u64>(a).ok()),
            parts.next().and_then(|c| c.parse().ok()),
        ) {
            (Some(addr), Some(count)) => match session.dump_mem(addr, count) {
                Ok(text) => print!("{text}"),
                Err(e) => println!("{e}"),
            },
            _ => println!("usage: mem <addr> <count>"),
        },
        Some("break") => match parts.next().and_then(|l| l.parse().ok()) {
            Some(line) => {
                if let Err(e) = session.add_breakpoint(line) {
                    println!("{e}");
                }
            }
            None => println!("usage: break <line>"),
        },
        Some("del") => {
            if parts.next() == Some("break") {
                match parts.next().and_then(|l| l.parse().ok()) {
                    Some(line) => session.remove_breakpoint(line),
                    None => println!("usage: del break <line>"),
                }
            } else {
                println!("Unknown command");
            }
        }
        Some("list-breaks") => println!("{}", session.list_breakpoints()),
        Some("show-stack") => print!("{}", session.show_stack()),
        Some("text") => print!("{}", session.disassemble_text()),
        Some("data") => print!("{}", session.dump_data(0x20000)),
        Some("help") => println!("{}", session.help_text()),
        Some(_) => println!("Unknown command"),
    }
    false
}

fn main() -> ExitCode {
    let args = Args::parse();
    let mut session = match load_session(&args) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("rvsim: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(addr) = args.dump_mem {
        match session.dump_mem(addr, 16) {
            Ok(text) => print!("{text}"),
            Err(e) => eprintln!("rvsim: {e}"),
        }
    }

    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(e) => {
            eprintln!("rvsim: {e}");
            return ExitCode::FAILURE;
        }
    };

    loop {
        match editor.readline("(rvsim) ") {
            Ok(line) => {
                let _ = editor.add_history_entry(line.as_str());
                if dispatch(&mut session, &line) {
                    break;
                }
            }
            Err(_) => break,
        }
    }

    ExitCode::SUCCESS
}
