//! Parser module for Hack assembly language
//!
//! Provides zero-copy parsing with performance optimizations:
//! - Byte-level comment detection for speed
//! - Manual whitespace trimming to avoid allocations
//! - Aggressive inlining for hot paths
//!
//! Cleaning (comment stripping, blank-line skipping) is delegated to
//! [`line_reader::LineReader`], which both assembler passes share by
//! restarting the same reader rather than re-reading the file.

use std::fmt;

use line_reader::LineReader;

#[derive(Debug, PartialEq, Clone, Copy)]
#[allow(clippy::enum_variant_names)] // Command suffix is intentional and clear
pub enum CommandType {
    /// @Xxx where Xxx is either a symbol or a decimal number
    ACommand,
    /// dest=comp;jump
    CCommand,
    /// (Xxx) where Xxx is a symbol
    LCommand,
}

#[derive(Debug)]
pub enum ParserError {
    IoError(std::io::Error),
    InvalidState(&'static str),
}

impl std::error::Error for ParserError {}

impl fmt::Display for ParserError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::IoError(e) => write!(f, "IO error: {e}"),
            Self::InvalidState(msg) => write!(f, "Invalid state: {msg}"),
        }
    }
}

impl From<std::io::Error> for ParserError {
    fn from(error: std::io::Error) -> Self {
        Self::IoError(error)
    }
}

/// Parser for assembly lines, backed by a restartable [`LineReader`]
pub struct Parser {
    reader: LineReader,
    current_command_type: Option<CommandType>,
}

impl Parser {
    /// Takes ownership of an already-populated reader. The caller is
    /// expected to `restart()` a shared reader between passes rather
    /// than constructing a new one, so the file is cleaned only once.
    #[inline]
    #[must_use]
    pub fn new(reader: LineReader) -> Self {
        Self {
            reader,
            current_command_type: None,
        }
    }

    /// Rewinds to the first instruction, for a second assembly pass.
    #[inline]
    pub fn restart(&mut self) {
        self.reader.restart();
        self.current_command_type = None;
    }

    /// Advances to the next valid command
    #[inline]
    pub fn advance(&mut self) -> bool {
        if self.reader.has_next() {
            self.current_command_type = Some(Self::classify_command(self.reader.current()));
            true
        } else {
            self.current_command_type = None;
            false
        }
    }

    /// 1-based source line number of the current instruction, for diagnostics
    #[inline]
    #[must_use]
    pub fn line_number(&self) -> usize {
        self.reader.line_number()
    }

    /// Classifies command type based on first character
    #[inline]
    fn classify_command(line: &str) -> CommandType {
        let first_byte = line.as_bytes()[0];
        match first_byte {
            b'@' => CommandType::ACommand,
            b'(' => CommandType::LCommand,
            _ => CommandType::CCommand,
        }
    }

    /// Returns the current command type
    #[inline]
    pub fn command_type(&self) -> Result<CommandType, ParserError> {
        self.current_command_type
            .ok_or(ParserError::InvalidState("No current line available"))
    }

    /// Returns the symbol from A-command or L-command
    ///
    /// # Errors
    /// Returns error if called on C-command or if no command is available
    #[inline]
    pub fn symbol(&self) -> Result<&str, ParserError> {
        let line = self.reader.current();
        match self.current_command_type {
            Some(CommandType::ACommand) => Ok(&line[1..]),
            Some(CommandType::LCommand) => {
                let len = line.len();
                Ok(&line[1..len - 1])
            }
            Some(CommandType::CCommand) => {
                Err(ParserError::InvalidState("Called symbol() on C-command"))
            }
            None => Err(ParserError::InvalidState("No current line available")),
        }
    }

    /// Returns the dest part of a C-command
    ///
    /// Returns empty string if no dest part exists
    #[inline]
    pub fn dest(&self) -> Result<Option<&str>, ParserError> {
        match self.current_command_type {
            Some(CommandType::CCommand) => {
                let line = self.reader.current();
                if let Some(pos) = line.find('=') {
                    Ok(Some(&line[..pos]))
                } else {
                    Ok(Some(""))
                }
            }
            Some(_) => Ok(None),
            None => Err(ParserError::InvalidState("No current line available")),
        }
    }

    /// Returns the comp part of a C-command
    #[inline]
    pub fn comp(&self) -> Result<Option<&str>, ParserError> {
        match self.current_command_type {
            Some(CommandType::CCommand) => {
                let line = self.reader.current();
                let start = line.find('=').map_or(0, |pos| pos + 1);
                let end = line.find(';').unwrap_or(line.len());
                Ok(Some(&line[start..end]))
            }
            Some(_) => Ok(None),
            None => Err(ParserError::InvalidState("No current line available")),
        }
    }

    /// Returns the jump part of a C-command
    ///
    /// Returns empty string if no jump part exists
    #[inline]
    pub fn jump(&self) -> Result<Option<&str>, ParserError> {
        match self.current_command_type {
            Some(CommandType::CCommand) => {
                let line = self.reader.current();
                if let Some(pos) = line.find(';') {
                    Ok(Some(&line[pos + 1..]))
                } else {
                    Ok(Some(""))
                }
            }
            Some(_) => Ok(None),
            None => Err(ParserError::InvalidState("No current line available")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser_from(lines: &[&str]) -> Parser {
        Parser::new(LineReader::from_lines(lines.iter().copied()))
    }

    #[test]
    fn test_command_classification() {
        assert_eq!(Parser::classify_command("@100"), CommandType::ACommand);
        assert_eq!(Parser::classify_command("(LOOP)"), CommandType::LCommand);
        assert_eq!(Parser::classify_command("D=M"), CommandType::CCommand);
    }

    #[test]
    fn test_parser_advance() {
        let mut parser = parser_from(&["// comment", "", "@100", "D=M // inline comment"]);

        assert!(parser.advance());
        assert_eq!(parser.command_type().unwrap(), CommandType::ACommand);
        assert_eq!(parser.symbol().unwrap(), "100");

        assert!(parser.advance());
        assert_eq!(parser.command_type().unwrap(), CommandType::CCommand);
        assert_eq!(parser.dest().unwrap(), Some("D"));
        assert_eq!(parser.comp().unwrap(), Some("M"));

        assert!(!parser.advance());
    }

    #[test]
    fn test_c_command_parsing() {
        let mut parser = parser_from(&["MD=D+1;JMP"]);
        parser.advance();

        assert_eq!(parser.dest().unwrap(), Some("MD"));
        assert_eq!(parser.comp().unwrap(), Some("D+1"));
        assert_eq!(parser.jump().unwrap(), Some("JMP"));
    }

    #[test]
    fn test_c_command_no_dest() {
        let mut parser = parser_from(&["D+1;JMP"]);
        parser.advance();

        assert_eq!(parser.dest().unwrap(), Some(""));
        assert_eq!(parser.comp().unwrap(), Some("D+1"));
        assert_eq!(parser.jump().unwrap(), Some("JMP"));
    }

    #[test]
    fn test_c_command_no_jump() {
        let mut parser = parser_from(&["D=D+1"]);
        parser.advance();

        assert_eq!(parser.dest().unwrap(), Some("D"));
        assert_eq!(parser.comp().unwrap(), Some("D+1"));
        assert_eq!(parser.jump().unwrap(), Some(""));
    }

    #[test]
    fn test_l_command_parsing() {
        let mut parser = parser_from(&["(LOOP)"]);
        parser.advance();

        assert_eq!(parser.command_type().unwrap(), CommandType::LCommand);
        assert_eq!(parser.symbol().unwrap(), "LOOP");
    }

    #[test]
    fn test_whitespace_handling() {
        let mut parser = parser_from(&["   @100   ", "  D=M  // comment  "]);

        assert!(parser.advance());
        assert_eq!(parser.symbol().unwrap(), "100");

        assert!(parser.advance());
        assert_eq!(parser.dest().unwrap(), Some("D"));
    }

    #[test]
    fn test_restart_reruns_pass() {
        let mut parser = parser_from(&["@1", "@2"]);
        parser.advance();
        parser.advance();
        assert!(!parser.advance());

        parser.restart();
        assert!(parser.advance());
        assert_eq!(parser.symbol().unwrap(), "1");
    }
}
