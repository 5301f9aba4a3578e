//! Emits the VM commands of §3 as text, one per line.
//!
//! Serves the compiler's two passes: `silent()` discards everything (pass
//! 1, used only to populate the class symbol table), `emitting()` writes to
//! the sibling `.vm` file (pass 2). Closed deterministically by `close`,
//! mirroring the VM translator's `CodeWriter`.

use std::fs::File;
use std::io::{self, BufWriter, Write};

pub struct VmWriter {
    out: Option<BufWriter<File>>,
}

impl VmWriter {
    pub fn emitting(path: &std::path::Path) -> io::Result<Self> {
        Ok(Self { out: Some(BufWriter::new(File::create(path)?)) })
    }

    #[must_use]
    pub fn silent() -> Self {
        Self { out: None }
    }

    pub fn write_push(&mut self, segment: &str, index: u16) -> io::Result<()> {
        self.line(format_args!("push {segment} {index}"))
    }

    pub fn write_pop(&mut self, segment: &str, index: u16) -> io::Result<()> {
        self.line(format_args!("pop {segment} {index}"))
    }

    pub fn write_arithmetic(&mut self, command: &str) -> io::Result<()> {
        self.line(format_args!("{command}"))
    }

    pub fn write_label(&mut self, name: &str) -> io::Result<()> {
        self.line(format_args!("label {name}"))
    }

    pub fn write_goto(&mut self, name: &str) -> io::Result<()> {
        self.line(format_args!("goto {name}"))
    }

    pub fn write_if(&mut self, name: &str) -> io::Result<()> {
        self.line(format_args!("if-goto {name}"))
    }

    pub fn write_call(&mut self, name: &str, n_args: u16) -> io::Result<()> {
        self.line(format_args!("call {name} {n_args}"))
    }

    pub fn write_function(&mut self, name: &str, n_locals: u16) -> io::Result<()> {
        self.line(format_args!("function {name} {n_locals}"))
    }

    pub fn write_return(&mut self) -> io::Result<()> {
        self.line(format_args!("return"))
    }

    fn line(&mut self, args: std::fmt::Arguments) -> io::Result<()> {
        if let Some(out) = &mut self.out {
            writeln!(out, "{args}")?;
        }
        Ok(())
    }

    pub fn close(&mut self) -> io::Result<()> {
        if let Some(out) = &mut self.out {
            out.flush()?;
        }
        Ok(())
    }
}
