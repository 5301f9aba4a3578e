//! Jack tokenizer: scans a `.jack` source file into a buffered, restartable
//! sequence of tokens.
//!
//! Unlike [`line_reader::LineReader`], which the assembler and VM translator
//! share, Jack comments (`/* ... */`, `/** ... */`) and string literals can
//! span characters the line-based cleaner would mangle, so tokenizing works
//! one byte at a time over the whole source rather than line by line. The
//! whole file is scanned once up front (source files are small -- see the
//! spec's DESIGN NOTES on stream restart) and the result cursor exposes the
//! same `has_next`/`current`/`restart` shape as `LineReader`, so the
//! compiler's two-pass structure rewinds rather than re-scans.

use crate::error::CompileError;
use crate::token::{Keyword, Spanned, Token, SYMBOLS};

/// Scans `source` into a flat token sequence, or the first lexical error
/// encountered.
pub fn scan(source: &str) -> Result<Vec<Spanned>, CompileError> {
    let bytes: Vec<char> = source.chars().collect();
    let mut pos = 0usize;
    let mut line = 1usize;
    let mut tokens = Vec::new();

    while pos < bytes.len() {
        let c = bytes[pos];

        if c == '\n' {
            line += 1;
            pos += 1;
            continue;
        }
        if c.is_whitespace() {
            pos += 1;
            continue;
        }

        if c == '/' && bytes.get(pos + 1) == Some(&'/') {
            while pos < bytes.len() && bytes[pos] != '\n' {
                pos += 1;
            }
            continue;
        }

        if c == '/' && bytes.get(pos + 1) == Some(&'*') {
            let start_line = line;
            pos += 2;
            // `/**` is the same block-comment form as `/*`; it does not nest.
            let mut closed = false;
            while pos < bytes.len() {
                if bytes[pos] == '\n' {
                    line += 1;
                }
                if bytes[pos] == '*' && bytes.get(pos + 1) == Some(&'/') {
                    pos += 2;
                    closed = true;
                    break;
                }
                pos += 1;
            }
            if !closed {
                return Err(CompileError::lexical(start_line, "unterminated block comment"));
            }
            continue;
        }

        if c.is_ascii_digit() {
            let start = pos;
            while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                pos += 1;
            }
            let text: String = bytes[start..pos].iter().collect();
            let value: u32 = text
                .parse()
                .map_err(|_| CompileError::lexical(line, format!("malformed integer '{text}'")))?;
            if value > 32767 {
                return Err(CompileError::lexical(
                    line,
                    format!("integer constant {value} exceeds 32767"),
                ));
            }
            tokens.push(Spanned {
                token: Token::IntConst(value as u16),
                line,
            });
            continue;
        }

        if c == '"' {
            let start_line = line;
            pos += 1;
            let start = pos;
            while pos < bytes.len() && bytes[pos] != '"' && bytes[pos] != '\n' {
                pos += 1;
            }
            if pos >= bytes.len() || bytes[pos] != '"' {
                return Err(CompileError::lexical(start_line, "unterminated string constant"));
            }
            let text: String = bytes[start..pos].iter().collect();
            pos += 1; // closing quote
            tokens.push(Spanned {
                token: Token::StringConst(text),
                line: start_line,
            });
            continue;
        }

        if SYMBOLS.contains(c) {
            tokens.push(Spanned {
                token: Token::Symbol(c),
                line,
            });
            pos += 1;
            continue;
        }

        if c.is_ascii_alphabetic() || c == '_' {
            let start = pos;
            while pos < bytes.len() && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == '_') {
                pos += 1;
            }
            let text: String = bytes[start..pos].iter().collect();
            let token = match Keyword::lookup(&text) {
                Some(kw) => Token::Keyword(kw),
                None => Token::Identifier(text),
            };
            tokens.push(Spanned { token, line });
            continue;
        }

        return Err(CompileError::lexical(line, format!("unexpected character '{c}'")));
    }

    Ok(tokens)
}

/// A rewindable, one-token-lookahead cursor over an already-scanned token
/// sequence. The two-pass compiler restarts the same cursor between passes
/// rather than re-tokenizing.
pub struct Tokenizer {
    tokens: Vec<Spanned>,
    cursor: Option<usize>,
}

impl Tokenizer {
    #[must_use]
    pub fn new(tokens: Vec<Spanned>) -> Self {
        Self { tokens, cursor: None }
    }

    /// Advances to the next token and reports whether one was found.
    pub fn has_next(&mut self) -> bool {
        let next = self.cursor.map_or(0, |c| c + 1);
        if next < self.tokens.len() {
            self.cursor = Some(next);
            true
        } else {
            false
        }
    }

    /// The token last advanced to by `has_next`.
    ///
    /// # Panics
    /// Panics if called before any successful `has_next`.
    #[must_use]
    pub fn current(&self) -> &Token {
        let idx = self.cursor.expect("current() called before has_next()");
        &self.tokens[idx].token
    }

    /// The token one past `current`, without advancing, so the parser can
    /// disambiguate (e.g. identifier vs. `identifier[`) without backtracking.
    #[must_use]
    pub fn peek_next(&self) -> Option<&Token> {
        let idx = self.cursor.map_or(0, |c| c + 1);
        self.tokens.get(idx).map(|s| &s.token)
    }

    /// 1-based source line of the current token, for diagnostics.
    #[must_use]
    pub fn line_number(&self) -> usize {
        self.cursor
            .and_then(|c| self.tokens.get(c))
            .map_or(0, |s| s.line)
    }

    /// Rewinds the cursor for a second compilation pass over the same
    /// buffered tokens.
    pub fn restart(&mut self) {
        self.cursor = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_ok(src: &str) -> Vec<Token> {
        scan(src).unwrap().into_iter().map(|s| s.token).collect()
    }

    #[test]
    fn tokenizes_keywords_symbols_and_identifiers() {
        let tokens = scan_ok("class Main { }");
        assert_eq!(
            tokens,
            vec![
                Token::Keyword(Keyword::Class),
                Token::Identifier("Main".to_string()),
                Token::Symbol('{'),
                Token::Symbol('}'),
            ]
        );
    }

    #[test]
    fn identifier_prefixed_by_keyword_is_not_misclassified() {
        let tokens = scan_ok("var classes");
        assert_eq!(
            tokens,
            vec![
                Token::Keyword(Keyword::Var),
                Token::Identifier("classes".to_string()),
            ]
        );
    }

    #[test]
    fn skips_line_and_block_comments_including_doc_style() {
        let tokens = scan_ok("// hi\nlet /* inline */ x /** doc\n spanning */ = 1;");
        assert_eq!(
            tokens,
            vec![
                Token::Keyword(Keyword::Let),
                Token::Identifier("x".to_string()),
                Token::Symbol('='),
                Token::IntConst(1),
                Token::Symbol(';'),
            ]
        );
    }

    #[test]
    fn rejects_unterminated_block_comment() {
        assert!(scan("/* never closes").is_err());
    }

    #[test]
    fn rejects_unterminated_string() {
        assert!(scan("\"abc").is_err());
        assert!(scan("\"abc\ndef\"").is_err());
    }

    #[test]
    fn rejects_integer_overflow() {
        assert!(scan("32768").is_err());
        assert!(scan_ok("32767") == vec![Token::IntConst(32767)]);
    }

    #[test]
    fn string_constant_captures_raw_bytes() {
        let tokens = scan_ok("\"hello world\"");
        assert_eq!(tokens, vec![Token::StringConst("hello world".to_string())]);
    }

    #[test]
    fn cursor_supports_restart_for_two_pass_compilation() {
        let mut t = Tokenizer::new(scan("let x = 1;").unwrap());
        assert!(t.has_next());
        assert_eq!(*t.current(), Token::Keyword(Keyword::Let));
        assert!(t.has_next());
        assert_eq!(*t.current(), Token::Identifier("x".to_string()));

        t.restart();
        assert!(t.has_next());
        assert_eq!(*t.current(), Token::Keyword(Keyword::Let));
    }

    #[test]
    fn peek_next_looks_one_token_ahead_without_advancing() {
        let mut t = Tokenizer::new(scan("foo[1]").unwrap());
        t.has_next();
        assert_eq!(*t.current(), Token::Identifier("foo".to_string()));
        assert_eq!(t.peek_next(), Some(&Token::Symbol('[')));
        // current() is unaffected by peek_next()
        assert_eq!(*t.current(), Token::Identifier("foo".to_string()));
    }
}
