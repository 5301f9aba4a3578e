//! Hack VM Translator - Main Entry Point
//!
//! Lowers stack-machine VM commands (`Nand2Tetris` Project 7/8) to Hack
//! assembly.
//!
//! # Usage
//! ```bash
//! hack-vm-translate <input.vm|dir> [--no-init]
//! ```
//!
//! A single `.vm` file produces a sibling `.asm` file. A directory
//! concatenates every `.vm` file it contains (in filesystem-enumeration
//! order) into `<dir>/<dirname>.asm`. Bootstrap code (`SP=256; call
//! Sys.init 0`) is emitted by default; `--no-init` suppresses it.

use std::env;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process;

mod code_writer;
mod parser;

use code_writer::CodeWriter;
use line_reader::LineReader;
use parser::{CommandType, Parser, ParserError};

/// Errors that abort translation of the current input.
#[derive(Debug)]
enum TranslateError {
    /// A parser error, tagged with the 1-based source line it occurred on.
    Parser(usize, ParserError),
    Io(std::io::Error),
}

impl fmt::Display for TranslateError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Parser(line, e) => write!(f, "line {line}: {e}"),
            Self::Io(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for TranslateError {}

impl From<std::io::Error> for TranslateError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// `ParserError`s carry no line number of their own; `translate_file`
/// attaches the current line once the `?` has unwound to it.
impl From<ParserError> for TranslateError {
    fn from(e: ParserError) -> Self {
        Self::Parser(0, e)
    }
}

type Result<T> = std::result::Result<T, TranslateError>;

fn main() {
    let args: Vec<String> = env::args().collect();

    let mut input = None;
    let mut bootstrap = true;
    for arg in &args[1..] {
        match arg.as_str() {
            "--no-init" => bootstrap = false,
            _ if input.is_none() => input = Some(arg.as_str()),
            _ => {
                eprintln!("Usage: {} <input.vm|dir> [--no-init]", args[0]);
                process::exit(1);
            }
        }
    }

    let Some(input) = input else {
        eprintln!("Usage: {} <input.vm|dir> [--no-init]", args[0]);
        process::exit(1);
    };

    if let Err(e) = translate(input, bootstrap) {
        eprintln!("{input}: {e}");
        process::exit(1);
    }
}

/// Collects the `.vm` files to translate and the single output path, for
/// either a single-file or directory invocation per §6.
fn plan(input: &str) -> std::io::Result<(Vec<PathBuf>, PathBuf)> {
    let path = Path::new(input);

    if path.is_dir() {
        let mut vm_files: Vec<PathBuf> = std::fs::read_dir(path)?
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "vm"))
            .collect();
        vm_files.sort();

        let dir_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "out".to_string());
        let output = path.join(format!("{dir_name}.asm"));
        Ok((vm_files, output))
    } else {
        let output = path.with_extension("asm");
        Ok((vec![path.to_path_buf()], output))
    }
}

fn translate(input: &str, bootstrap: bool) -> Result<()> {
    let (vm_files, output_path) = plan(input)?;
    if vm_files.is_empty() {
        return Err(TranslateError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "no .vm files found",
        )));
    }

    let mut writer = CodeWriter::new(output_path.to_str().unwrap_or("out.asm"))?;

    if bootstrap {
        writer.write_init()?;
    }

    for vm_file in &vm_files {
        let file = File::open(vm_file)?;
        let mut parser = Parser::new(LineReader::new(file)?);
        writer.set_filename(vm_file.to_str().unwrap_or("Unknown"));
        translate_file(&mut parser, &mut writer)?;
    }

    writer.close()?;
    println!("Translation complete: {input} -> {}", output_path.display());
    Ok(())
}

fn translate_file(parser: &mut Parser, writer: &mut CodeWriter) -> Result<()> {
    while parser.advance() {
        let line = parser.line_number();
        translate_command(parser, writer).map_err(|e| match e {
            TranslateError::Parser(_, err) => TranslateError::Parser(line, err),
            io @ TranslateError::Io(_) => io,
        })?;
    }
    Ok(())
}

fn translate_command(parser: &mut Parser, writer: &mut CodeWriter) -> Result<()> {
    match parser.command_type().map_err(|e| TranslateError::Parser(0, e))? {
        CommandType::Arithmetic => {
            let command = parser.arg1().map_err(|e| TranslateError::Parser(0, e))?;
            writer.write_arithmetic(command)?;
        }
        CommandType::Push | CommandType::Pop => {
            let verb = if parser.command_type().map_err(|e| TranslateError::Parser(0, e))? == CommandType::Push {
                "push"
            } else {
                "pop"
            };
            let segment = parser.arg1().map_err(|e| TranslateError::Parser(0, e))?;
            let index = parser.arg2().map_err(|e| TranslateError::Parser(0, e))?;
            writer.write_push_pop(verb, segment, index.into())?;
        }
        CommandType::Label => {
            let name = parser.arg1().map_err(|e| TranslateError::Parser(0, e))?;
            writer.write_label(name)?;
        }
        CommandType::Goto => {
            let name = parser.arg1().map_err(|e| TranslateError::Parser(0, e))?;
            writer.write_goto(name)?;
        }
        CommandType::If => {
            let name = parser.arg1().map_err(|e| TranslateError::Parser(0, e))?;
            writer.write_if_goto(name)?;
        }
        CommandType::Function => {
            let name = parser.arg1().map_err(|e| TranslateError::Parser(0, e))?.to_string();
            let n_locals = parser.arg2().map_err(|e| TranslateError::Parser(0, e))?;
            writer.write_function(&name, n_locals)?;
        }
        CommandType::Call => {
            let name = parser.arg1().map_err(|e| TranslateError::Parser(0, e))?.to_string();
            let n_args = parser.arg2().map_err(|e| TranslateError::Parser(0, e))?;
            writer.write_call(&name, n_args)?;
        }
        CommandType::Return => writer.write_return()?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn translate_lines(lines: &[&str], bootstrap: bool) -> String {
        let dir = env::temp_dir().join(format!(
            "hack_vm_test_{}_{}",
            process::id(),
            lines.len()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let vm_path = dir.join("Test.vm");
        std::fs::write(&vm_path, lines.join("\n")).unwrap();

        translate(vm_path.to_str().unwrap(), bootstrap).unwrap();

        let mut asm = String::new();
        File::open(vm_path.with_extension("asm"))
            .unwrap()
            .read_to_string(&mut asm)
            .unwrap();

        std::fs::remove_dir_all(&dir).ok();
        asm
    }

    #[test]
    fn push_constant_add_targets_the_stack_top() {
        let asm = translate_lines(&["push constant 7", "push constant 8", "add"], false);
        assert!(asm.contains("D=A"));
        assert!(asm.contains("@SP"));
    }

    #[test]
    fn every_call_has_a_matching_return_label() {
        let asm = translate_lines(
            &[
                "function Mult.main 0",
                "push constant 3",
                "push constant 4",
                "call Math.multiply 2",
                "return",
            ],
            false,
        );
        assert!(asm.contains("@Math.multiply"));
        assert!(asm.contains("(Math.multiply$ret.1)"));
    }

    #[test]
    fn label_inside_function_is_scope_qualified() {
        let asm = translate_lines(
            &[
                "function Main.loop 0",
                "label START",
                "goto START",
            ],
            false,
        );
        assert!(asm.contains("(Main.loop$START)"));
        assert!(asm.contains("@Main.loop$START"));
    }

    #[test]
    fn bootstrap_emits_sp_init_and_sys_init_call() {
        let asm = translate_lines(&["function Sys.init 0", "return"], true);
        assert!(asm.contains("@256"));
        assert!(asm.contains("@Sys.init"));
    }

    #[test]
    fn pointer_index_out_of_range_is_a_fatal_error() {
        let dir = env::temp_dir().join(format!("hack_vm_test_badpointer_{}", process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let vm_path = dir.join("Bad.vm");
        std::fs::write(&vm_path, "push pointer 2\n").unwrap();

        let err = translate(vm_path.to_str().unwrap(), false).unwrap_err();
        assert!(matches!(err, TranslateError::Io(_)));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn temp_index_out_of_range_is_a_fatal_error() {
        let dir = env::temp_dir().join(format!("hack_vm_test_badtemp_{}", process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let vm_path = dir.join("Bad.vm");
        std::fs::write(&vm_path, "pop temp 8\n").unwrap();

        let err = translate(vm_path.to_str().unwrap(), false).unwrap_err();
        assert!(matches!(err, TranslateError::Io(_)));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn output_path_for_directory_concatenates_dirname() {
        let dir = env::temp_dir().join(format!("hack_vm_dir_test_{}", process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("Main.vm"), "function Main.main 0\nreturn\n").unwrap();

        let (files, output) = plan(dir.to_str().unwrap()).unwrap();
        assert_eq!(files.len(), 1);
        assert!(output.ends_with(format!(
            "{}.asm",
            dir.file_name().unwrap().to_string_lossy()
        )));

        std::fs::remove_dir_all(&dir).ok();
    }
}
