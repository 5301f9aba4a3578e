//! Error taxonomy for the Jack compiler, in the same shape as the
//! assembler's `AssembleError` and the VM translator's `TranslateError`:
//! a small enum identifying the file and, where possible, the source line.

use std::fmt;

#[derive(Debug)]
pub enum CompileError {
    /// Unexpected character, unterminated string/comment, integer overflow.
    Lexical { line: usize, message: String },
    /// Expected-token mismatch or malformed grammar production.
    Syntax { line: usize, message: String },
    /// Undefined identifier, method-call on a non-instance, and similar
    /// checks the grammar alone cannot reject.
    Semantic { line: usize, message: String },
    Io(std::io::Error),
}

impl CompileError {
    #[must_use]
    pub fn lexical(line: usize, message: impl Into<String>) -> Self {
        Self::Lexical { line, message: message.into() }
    }

    #[must_use]
    pub fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self::Syntax { line, message: message.into() }
    }

    #[must_use]
    pub fn semantic(line: usize, message: impl Into<String>) -> Self {
        Self::Semantic { line, message: message.into() }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Lexical { line, message } => write!(f, "line {line}: lexical error: {message}"),
            Self::Syntax { line, message } => write!(f, "line {line}: syntax error: {message}"),
            Self::Semantic { line, message } => write!(f, "line {line}: {message}"),
            Self::Io(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CompileError {}

impl From<std::io::Error> for CompileError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
