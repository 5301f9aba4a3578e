//! Jack Compiler for the `Nand2Tetris` platform
//!
//! Translates Jack source (`.jack`) to VM commands (`.vm`) in two passes
//! over the same buffered token stream: the first silently walks the
//! grammar to populate the class-level symbol table (statics, fields,
//! method-entries); the second walks it again, this time emitting VM
//! code, with a fresh local symbol table built per subroutine.
//!
//! # Architecture
//!
//! - [`tokenizer`]: Scans source text into a restartable token sequence
//! - [`token`]: The token and keyword vocabulary
//! - [`symbol_table`]: Two-level scoping (class, subroutine)
//! - [`vm_writer`]: Thin VM command emitter, silenced during pass 1
//! - [`compiler`]: The recursive-descent grammar walk driving both passes
//! - [`error`]: Lexical/syntax/semantic error taxonomy
//!
//! # Example
//!
//! ```rust
//! use jack_compiler::tokenizer::scan;
//! use jack_compiler::compiler::{class_name_of, compile_class_tokens};
//! use std::collections::HashSet;
//!
//! let source = "class Main { function void main() { return; } }";
//! let tokens = scan(source).unwrap();
//! let name = class_name_of(&tokens).unwrap();
//! assert_eq!(name, "Main");
//!
//! let out = std::env::temp_dir().join("jack_compiler_doctest.vm");
//! compile_class_tokens(tokens, &name, &HashSet::new(), &out).unwrap();
//! let vm = std::fs::read_to_string(&out).unwrap();
//! assert!(vm.starts_with("function Main.main 0"));
//! std::fs::remove_file(&out).ok();
//! ```

#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod compiler;
pub mod error;
pub mod symbol_table;
pub mod token;
pub mod tokenizer;
pub mod vm_writer;

pub use compiler::{class_name_of, compile_class_tokens};
pub use error::CompileError;
