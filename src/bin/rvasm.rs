//! Two-pass RV64I assembler front-end (C12).
//!
//! Grounded on `elf2trace.rs`: a small `clap`-derive binary wired straight
//! to a library entry point, reporting errors and setting the process exit
//! code rather than panicking.

use clap::Parser;
use rv64edu::assembler::{self, AssembleError};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Assemble an RV64I source file into a hex machine-code stream.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to the assembly source file.
    #[arg(long)]
    input: PathBuf,

    /// Path to write the assembled hex output to. Defaults to
    /// `output.hex` beside the input file.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn default_output_path(input: &Path) -> PathBuf {
    input.parent().unwrap_or_else(|| Path::new(".")).join("output.hex")
}

fn run(args: Args) -> Result<(), AssembleError> {
    let source = fs::read_to_string(&args.input)?;
    let words = assembler::assemble(&source)?;
    let output_path = args.output.unwrap_or_else(|| default_output_path(&args.input));
    let hex_lines: String = words.iter().map(|w| format!("{w:08x}\n")).collect();
    fs::write(&output_path, hex_lines)?;
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("rvasm: {e}");
            ExitCode::FAILURE
        }
    }
}
