//! Jack Compiler - Main Entry Point
//!
//! Compiles Jack source (`Nand2Tetris` Project 10/11) to VM commands.
//!
//! # Architecture
//! - **Pass 1**: Silently walks the grammar, populating the class symbol
//!   table (statics, fields, method-entries)
//! - **Pass 2**: Walks it again, emitting VM code, building a fresh
//!   subroutine-local symbol table per subroutine
//!
//! # Usage
//! ```bash
//! jack-compile <input.jack|dir>
//! ```
//!
//! A single `.jack` file produces a sibling `.vm` file. A directory
//! compiles every `.jack` file it contains, one `.vm` file per class; a
//! prescan of every file's `class` header seeds the known-class-name set
//! each file needs to resolve `X.member(...)` calls (§4.5.3).

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

mod compiler;
mod error;
mod symbol_table;
mod token;
mod tokenizer;
mod vm_writer;

use compiler::{class_name_of, compile_class_tokens};
use error::CompileError;
use token::Spanned;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() != 2 {
        eprintln!("Usage: {} <input.jack|dir>", args[0]);
        process::exit(1);
    }

    if let Err(e) = compile(&args[1]) {
        eprintln!("{}: {e}", args[1]);
        process::exit(1);
    }
}

/// Collects the `.jack` files to compile for either a single-file or
/// directory invocation, mirroring the VM translator's `plan`.
fn plan(input: &str) -> std::io::Result<Vec<PathBuf>> {
    let path = Path::new(input);

    if path.is_dir() {
        let mut jack_files: Vec<PathBuf> = fs::read_dir(path)?
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "jack"))
            .collect();
        jack_files.sort();
        Ok(jack_files)
    } else {
        Ok(vec![path.to_path_buf()])
    }
}

struct Unit {
    path: PathBuf,
    tokens: Vec<Spanned>,
    class_name: String,
}

fn compile(input: &str) -> Result<(), CompileError> {
    let files = plan(input)?;
    if files.is_empty() {
        return Err(CompileError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "no .jack files found",
        )));
    }

    // Prescan: every file's class name must be known before any file is
    // compiled, so an unqualified `Foo.bar(...)` call in one class can
    // resolve `Foo` as a sibling class rather than an instance variable.
    let mut units = Vec::with_capacity(files.len());
    let mut known_classes = HashSet::new();
    for path in files {
        let source = fs::read_to_string(&path)?;
        let tokens = tokenizer::scan(&source)?;
        let class_name = class_name_of(&tokens).ok_or_else(|| {
            CompileError::syntax(1, format!("{}: missing 'class' declaration", path.display()))
        })?;
        known_classes.insert(class_name.clone());
        units.push(Unit { path, tokens, class_name });
    }

    for unit in units {
        let output = unit.path.with_extension("vm");
        compile_class_tokens(unit.tokens, &unit.class_name, &known_classes, &output)?;
        println!("Compiled {} -> {}", unit.path.display(), output.display());
    }
    Ok(())
}
