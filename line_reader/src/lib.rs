//! Shared source-line reader for the Hack toolchain
//!
//! Every stage below the Jack tokenizer (the assembler and the VM
//! translator) consumes its input as a sequence of logical lines: already
//! trimmed, already stripped of `// ...` comments, blank lines dropped.
//! [`LineReader`] is that sequence. It buffers the cleaned lines once up
//! front and then exposes a `has_next` / `current` cursor with a `restart`
//! operation, so a two-pass consumer (the assembler) can rewind without
//! re-reading or re-cleaning the source.

use std::io::{self, BufRead};

/// Strips a trailing `// ...` line comment and surrounding whitespace.
///
/// Comment markers inside double-quoted text are not special-cased here:
/// neither Hack assembly nor the VM language have quoted literals, so a
/// bare byte scan for `//` is sufficient and cheap.
fn clean(raw: &str) -> &str {
    let bytes = raw.as_bytes();
    for i in 0..bytes.len().saturating_sub(1) {
        if bytes[i] == b'/' && bytes[i + 1] == b'/' {
            return raw[..i].trim();
        }
    }
    raw.trim()
}

/// A rewindable cursor over the non-blank, comment-stripped lines of a
/// text stream.
///
/// The whole stream is read and cleaned eagerly in [`LineReader::new`];
/// `restart` then just resets the cursor rather than touching the
/// underlying source again.
pub struct LineReader {
    lines: Vec<String>,
    cursor: Option<usize>,
}

impl LineReader {
    /// Reads every line from `source`, drops blank and pure-comment
    /// lines, and strips trailing `// ...` comments from the rest.
    pub fn new<R: io::Read>(source: R) -> io::Result<Self> {
        let reader = io::BufReader::new(source);
        let mut lines = Vec::new();
        for line in reader.lines() {
            let line = line?;
            let cleaned = clean(&line);
            if !cleaned.is_empty() {
                lines.push(cleaned.to_string());
            }
        }
        Ok(Self { lines, cursor: None })
    }

    /// Builds a reader directly from pre-split lines, applying the same
    /// cleaning rules. Useful when the caller already has the source in
    /// memory (e.g. re-parsing a buffered `.jack` file).
    pub fn from_lines<I, S>(raw_lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let lines = raw_lines
            .into_iter()
            .filter_map(|line| {
                let cleaned = clean(line.as_ref());
                (!cleaned.is_empty()).then(|| cleaned.to_string())
            })
            .collect();
        Self { lines, cursor: None }
    }

    /// Advances to the next line, if any, and reports whether one was
    /// found. Must be called before the first [`LineReader::current`].
    pub fn has_next(&mut self) -> bool {
        let next = self.cursor.map_or(0, |c| c + 1);
        if next < self.lines.len() {
            self.cursor = Some(next);
            true
        } else {
            false
        }
    }

    /// The line last advanced to by `has_next`.
    ///
    /// # Panics
    /// Panics if called before any successful `has_next`, or after
    /// `has_next` returned false, at the caller's programming error.
    pub fn current(&self) -> &str {
        let idx = self.cursor.expect("current() called before has_next()");
        &self.lines[idx]
    }

    /// Rewinds the cursor so the next `has_next` yields the first line
    /// again. The cleaned lines are reused; the original source is never
    /// re-read.
    pub fn restart(&mut self) {
        self.cursor = None;
    }

    /// 1-based index of the line last returned by `current`, for error
    /// reporting.
    pub fn line_number(&self) -> usize {
        self.cursor.map_or(0, |c| c + 1)
    }

    /// Total number of cleaned lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_blank_and_comment_only_lines() {
        let src = "@2\n\n// full line comment\nD=A\n   \n@3\n";
        let mut reader = LineReader::new(src.as_bytes()).unwrap();

        assert!(reader.has_next());
        assert_eq!(reader.current(), "@2");
        assert!(reader.has_next());
        assert_eq!(reader.current(), "D=A");
        assert!(reader.has_next());
        assert_eq!(reader.current(), "@3");
        assert!(!reader.has_next());
    }

    #[test]
    fn strips_trailing_comments_and_whitespace() {
        let src = "  @100 // load address  \n";
        let mut reader = LineReader::new(src.as_bytes()).unwrap();
        assert!(reader.has_next());
        assert_eq!(reader.current(), "@100");
    }

    #[test]
    fn restart_replays_from_the_beginning() {
        let mut reader = LineReader::from_lines(["@1", "@2", "@3"]);
        reader.has_next();
        reader.has_next();
        assert_eq!(reader.current(), "@2");

        reader.restart();
        assert!(reader.has_next());
        assert_eq!(reader.current(), "@1");
    }

    #[test]
    fn line_number_is_one_based() {
        let mut reader = LineReader::from_lines(["@1", "@2"]);
        reader.has_next();
        assert_eq!(reader.line_number(), 1);
        reader.has_next();
        assert_eq!(reader.line_number(), 2);
    }
}
