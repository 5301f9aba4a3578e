//! Hack Assembler - Main Entry Point
//!
//! A two-pass assembler for the Hack assembly language (`Nand2Tetris` Project 6).
//!
//! # Architecture
//! - **Pass 1**: Builds the symbol table by recording label positions
//! - **Pass 2**: Generates machine code, resolving all symbols
//!
//! # Usage
//! ```bash
//! hack-assembler <input.asm> [output.hack]
//! ```

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

use std::env;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::process;

mod code;
mod parser;
mod symbol_table;

use line_reader::LineReader;
use parser::{CommandType, Parser};
use symbol_table::SymbolTable;

const MAX_A_VALUE: u32 = (1 << 15) - 1;

/// Errors that abort assembly of the current file.
#[derive(Debug)]
enum AssembleError {
    Parser(parser::ParserError),
    Io(std::io::Error),
    /// A-instruction addresses must fit in 15 bits (`@value`, line, value).
    AddressOverflow(usize, u32),
    /// A C-instruction's dest/comp/jump field matched none of the fixed
    /// mnemonic tables (line, field name, the offending mnemonic).
    UnknownMnemonic(usize, &'static str, String),
}

impl fmt::Display for AssembleError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Parser(e) => write!(f, "{e}"),
            Self::Io(e) => write!(f, "{e}"),
            Self::AddressOverflow(line, value) => write!(
                f,
                "line {line}: A-instruction value {value} does not fit in 15 bits"
            ),
            Self::UnknownMnemonic(line, field, mnemonic) => write!(
                f,
                "line {line}: unrecognised {field} mnemonic '{mnemonic}'"
            ),
        }
    }
}

impl std::error::Error for AssembleError {}

impl From<parser::ParserError> for AssembleError {
    fn from(e: parser::ParserError) -> Self {
        Self::Parser(e)
    }
}

impl From<std::io::Error> for AssembleError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

type Result<T> = std::result::Result<T, AssembleError>;

/// First pass: Build symbol table with label addresses
///
/// Scans through all lines and records the ROM address of each label.
/// Label definitions (L-commands) don't generate code, so they don't
/// increment the ROM address counter.
fn first_pass(parser: &mut Parser, symbol_table: &mut SymbolTable) -> Result<()> {
    let mut rom_address = 0u16;

    while parser.advance() {
        match parser.command_type()? {
            CommandType::LCommand => {
                // Labels mark the next instruction's address
                let symbol = parser.symbol()?;
                symbol_table.add_entry(symbol, rom_address);
            }
            CommandType::ACommand | CommandType::CCommand => {
                // Actual instructions increment the address
                rom_address += 1;
            }
        }
    }

    Ok(())
}

/// Second pass: Generate machine code
///
/// Translates each instruction to binary:
/// - A-commands: Resolve symbols to addresses
/// - C-commands: Encode dest, comp, and jump fields
/// - L-commands: Skip (already processed in pass 1)
fn second_pass(
    parser: &mut Parser,
    symbol_table: &mut SymbolTable,
    writer: &mut BufWriter<File>,
) -> Result<()> {
    let mut ram_address = 16u16; // Variables start at RAM[16]

    while parser.advance() {
        match parser.command_type()? {
            CommandType::ACommand => {
                let symbol = parser.symbol()?;

                // Try to parse as number first, then lookup/insert as symbol
                let address = if let Ok(value) = symbol.parse::<u32>() {
                    if value > MAX_A_VALUE {
                        return Err(AssembleError::AddressOverflow(
                            parser.line_number(),
                            value,
                        ));
                    }
                    value as u16
                } else {
                    symbol_table.get_or_insert(symbol, &mut ram_address)
                };

                let instruction = code::encode_a_instruction(address);
                writeln!(writer, "{instruction}")?;
            }
            CommandType::CCommand => {
                let dest = parser.dest()?.unwrap_or("");
                let comp = parser.comp()?.unwrap_or("");
                let jump = parser.jump()?.unwrap_or("");

                let (dest_ok, comp_ok, jump_ok) = code::validate_mnemonics(dest, comp, jump);
                if !comp_ok {
                    return Err(AssembleError::UnknownMnemonic(
                        parser.line_number(),
                        "comp",
                        comp.to_string(),
                    ));
                }
                if !jump_ok {
                    return Err(AssembleError::UnknownMnemonic(
                        parser.line_number(),
                        "jump",
                        jump.to_string(),
                    ));
                }
                if !dest_ok {
                    return Err(AssembleError::UnknownMnemonic(
                        parser.line_number(),
                        "dest",
                        dest.to_string(),
                    ));
                }

                let instruction = code::encode_c_instruction(dest, comp, jump);
                writeln!(writer, "{instruction}")?;
            }
            CommandType::LCommand => {}
        }
    }

    writer.flush()?;
    Ok(())
}

/// Determines the output file path, substituting the `.hack` extension
/// for the input's extension rather than naively rewriting substrings.
fn output_path(input: &str, explicit_output: Option<&str>) -> String {
    if let Some(out) = explicit_output {
        return out.to_string();
    }
    let path = Path::new(input);
    path.with_extension("hack").to_string_lossy().into_owned()
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if !(2..=3).contains(&args.len()) {
        eprintln!("Usage: {} <input.asm> [output.hack]", args[0]);
        eprintln!();
        eprintln!("Examples:");
        eprintln!("  {} Add.asm", args[0]);
        eprintln!("  {} Add.asm Add.hack", args[0]);
        process::exit(1);
    }

    if let Err(e) = assemble(&args[1], args.get(2).map(String::as_str)) {
        eprintln!("{}: {e}", args[1]);
        process::exit(1);
    }
}

fn assemble(input_path: &str, explicit_output: Option<&str>) -> Result<()> {
    let file = File::open(input_path)?;
    let mut parser = Parser::new(LineReader::new(file)?);

    let mut symbol_table = SymbolTable::new();

    // Pass 1: Build symbol table
    first_pass(&mut parser, &mut symbol_table)?;
    parser.restart();

    // Pass 2: Generate machine code
    let output = output_path(input_path, explicit_output);
    let output_file = File::create(&output)?;
    let mut writer = BufWriter::new(output_file);

    second_pass(&mut parser, &mut symbol_table, &mut writer)?;

    println!("Assembly completed. Output written to {output}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_generation() {
        assert_eq!(output_path("test.asm", None), "test.hack");
        assert_eq!(output_path("test.asm", Some("custom.hack")), "custom.hack");
        assert_eq!(output_path("dir/file.asm", None), "dir/file.hack");
        assert_eq!(output_path("path/to/file.asm", None), "path/to/file.hack");
    }

    #[test]
    fn test_output_path_explicit() {
        assert_eq!(output_path("any.asm", Some("out.hack")), "out.hack");
        assert_eq!(
            output_path("any.asm", Some("path/to/out.hack")),
            "path/to/out.hack"
        );
    }

    #[test]
    fn unknown_comp_mnemonic_is_a_fatal_error() {
        let dir = env::temp_dir().join(format!("hack_asm_test_badcomp_{}", process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let asm_path = dir.join("Bad.asm");
        std::fs::write(&asm_path, "D=NOTREAL\n").unwrap();

        let err = assemble(asm_path.to_str().unwrap(), None).unwrap_err();
        assert!(matches!(err, AssembleError::UnknownMnemonic(_, "comp", _)));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn unknown_jump_mnemonic_is_a_fatal_error() {
        let dir = env::temp_dir().join(format!("hack_asm_test_badjump_{}", process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let asm_path = dir.join("Bad.asm");
        std::fs::write(&asm_path, "0;NOTREAL\n").unwrap();

        let err = assemble(asm_path.to_str().unwrap(), None).unwrap_err();
        assert!(matches!(err, AssembleError::UnknownMnemonic(_, "jump", _)));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_assembles_concrete_scenario() {
        use std::io::Read;

        let dir = env::temp_dir().join(format!("hack_asm_test_{}", process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let asm_path = dir.join("Add.asm");
        std::fs::write(&asm_path, "@2\nD=A\n@3\nD=D+A\n@0\nM=D\n").unwrap();

        assemble(asm_path.to_str().unwrap(), None).unwrap();

        let mut hack = String::new();
        File::open(dir.join("Add.hack"))
            .unwrap()
            .read_to_string(&mut hack)
            .unwrap();

        let expected = "0000000000000010\n\
                         1110110000010000\n\
                         0000000000000011\n\
                         1110000010010000\n\
                         0000000000000000\n\
                         1110001100001000\n";
        assert_eq!(hack, expected);

        std::fs::remove_dir_all(&dir).ok();
    }
}
