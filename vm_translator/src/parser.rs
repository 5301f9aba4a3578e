use std::fmt;

use line_reader::LineReader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    Arithmetic,
    Push,
    Pop,
    Label,
    Goto,
    If,
    Function,
    Return,
    Call,
}

#[derive(Debug)]
pub enum ParserError {
    InvalidState(&'static str),
}

impl std::error::Error for ParserError {}

impl fmt::Display for ParserError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InvalidState(msg) => write!(f, "Invalid state: {msg}"),
        }
    }
}

/// Parser for VM commands, backed by a [`LineReader`].
///
/// Unlike the assembler's parser, a VM translation is single-pass: labels
/// and symbols are resolved later by the assembler, so there is no need to
/// restart the underlying reader.
pub struct Parser {
    reader: LineReader,
    /// Whitespace-separated tokens of the current command, cached to avoid
    /// re-splitting the line for every `arg1`/`arg2` call.
    cached_parts: Vec<String>,
}

impl Parser {
    #[must_use]
    pub fn new(reader: LineReader) -> Self {
        Self {
            reader,
            cached_parts: Vec::new(),
        }
    }

    /// Advances to the next command. Returns `false` once the source is
    /// exhausted.
    pub fn advance(&mut self) -> bool {
        if !self.reader.has_next() {
            return false;
        }
        self.cached_parts.clear();
        self.cached_parts.extend(
            self.reader
                .current()
                .split_whitespace()
                .map(str::to_string),
        );
        true
    }

    /// 1-based source line number of the current command, for diagnostics.
    #[must_use]
    pub fn line_number(&self) -> usize {
        self.reader.line_number()
    }

    /// Classifies the current command by its first whitespace-separated
    /// token, per the token-based recognition rule (not a substring search,
    /// which would misclassify a label such as `pushable`).
    pub fn command_type(&self) -> Result<CommandType, ParserError> {
        let first = self
            .cached_parts
            .first()
            .ok_or(ParserError::InvalidState("no current command"))?;
        Ok(match first.as_str() {
            "push" => CommandType::Push,
            "pop" => CommandType::Pop,
            "label" => CommandType::Label,
            "goto" => CommandType::Goto,
            "if-goto" => CommandType::If,
            "function" => CommandType::Function,
            "return" => CommandType::Return,
            "call" => CommandType::Call,
            _ => CommandType::Arithmetic,
        })
    }

    /// First argument: the arithmetic mnemonic itself, or the segment/label
    /// name for commands that take one.
    pub fn arg1(&self) -> Result<&str, ParserError> {
        match self.command_type()? {
            CommandType::Arithmetic => Ok(&self.cached_parts[0]),
            CommandType::Return => Err(ParserError::InvalidState("arg1 not valid for return")),
            _ => self
                .cached_parts
                .get(1)
                .map(String::as_str)
                .ok_or(ParserError::InvalidState("missing arg1")),
        }
    }

    /// Second argument: the index/`nArgs`/`nLocals` operand.
    pub fn arg2(&self) -> Result<u16, ParserError> {
        match self.command_type()? {
            CommandType::Push | CommandType::Pop | CommandType::Function | CommandType::Call => {
                let raw = self
                    .cached_parts
                    .get(2)
                    .ok_or(ParserError::InvalidState("missing arg2"))?;
                raw.parse()
                    .map_err(|_| ParserError::InvalidState("arg2 is not a non-negative integer"))
            }
            _ => Err(ParserError::InvalidState("arg2 not valid for this command")),
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
    fn classifies_every_command_form() {
        let mut parser = parser_from(&[
            "push constant 7",
            "pop local 2",
            "add",
            "label LOOP",
            "goto LOOP",
            "if-goto END",
            "function Main.run 2",
            "call Math.multiply 2",
            "return",
        ]);

        let expected = [
            CommandType::Push,
            CommandType::Pop,
            CommandType::Arithmetic,
            CommandType::Label,
            CommandType::Goto,
            CommandType::If,
            CommandType::Function,
            CommandType::Call,
            CommandType::Return,
        ];

        for want in expected {
            assert!(parser.advance());
            assert_eq!(parser.command_type().unwrap(), want);
        }
        assert!(!parser.advance());
    }

    #[test]
    fn reads_push_pop_operands() {
        let mut parser = parser_from(&["push argument 3"]);
        parser.advance();
        assert_eq!(parser.arg1().unwrap(), "argument");
        assert_eq!(parser.arg2().unwrap(), 3);
    }

    #[test]
    fn arithmetic_arg1_is_the_mnemonic() {
        let mut parser = parser_from(&["eq"]);
        parser.advance();
        assert_eq!(parser.arg1().unwrap(), "eq");
    }

    #[test]
    fn return_rejects_arg1() {
        let mut parser = parser_from(&["return"]);
        parser.advance();
        assert!(parser.arg1().is_err());
    }

    #[test]
    fn ignores_comments_and_blank_lines() {
        let mut parser = parser_from(&["// comment", "", "push constant 1 // inline"]);
        assert!(parser.advance());
        assert_eq!(parser.command_type().unwrap(), CommandType::Push);
        assert!(!parser.advance());
    }
}
