//! Conversion between byte offsets and line/character positions.
//!
//! Positions follow the editor protocol convention: lines and characters are
//! 0-based and characters count UTF-16 code units, so a character outside
//! the Basic Multilingual Plane occupies two. `\n`, `\r\n` and a lone `\r`
//! each end a line.

use std::fmt;

use crate::span::Span;

/// A 0-based line and UTF-16 character offset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.character)
    }
}

/// A half-open range between two positions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

/// Line table of one source text.
#[derive(Debug, Clone)]
pub struct LineIndex {
    text: String,
    /// Byte offset of the first character of every line. Never empty.
    line_starts: Vec<usize>,
}

impl LineIndex {
    /// Build the line table for `text`.
    pub fn new(text: &str) -> Self {
        let bytes = text.as_bytes();
        let mut line_starts = vec![0];
        for (i, &byte) in bytes.iter().enumerate() {
            match byte {
                b'\n' => line_starts.push(i + 1),
                b'\r' if bytes.get(i + 1) != Some(&b'\n') => line_starts.push(i + 1),
                _ => {}
            }
        }

        Self {
            text: text.to_string(),
            line_starts,
        }
    }

    /// The indexed source text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of lines. An empty text has one empty line.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Position of byte `offset`.
    ///
    /// Offsets past the end clamp to the end of the text; offsets inside a
    /// multi-byte character round down to its start.
    pub fn position(&self, offset: usize) -> Position {
        let mut offset = offset.min(self.text.len());
        while !self.text.is_char_boundary(offset) {
            offset -= 1;
        }

        // line_starts[0] == 0, so at least one start is <= offset
        let line = self.line_starts.partition_point(|&start| start <= offset) - 1;
        let line_start = self.line_starts[line];
        let character = self.text[line_start..offset].encode_utf16().count();

        Position::new(saturate(line), saturate(character))
    }

    /// Range covered by `span`.
    pub fn range(&self, span: Span) -> Range {
        Range::new(self.position(span.start()), self.position(span.end()))
    }

    /// Byte offset of `position`.
    ///
    /// Returns `None` when the line does not exist, the character lies past
    /// the end of the line, or it falls between the two halves of a
    /// surrogate pair.
    pub fn offset(&self, position: Position) -> Option<usize> {
        let line = usize::try_from(position.line).ok()?;
        let target = usize::try_from(position.character).ok()?;
        let line_start = *self.line_starts.get(line)?;
        let line_end = self
            .line_starts
            .get(line + 1)
            .copied()
            .unwrap_or(self.text.len());
        let content = self.text[line_start..line_end].trim_end_matches(['\n', '\r']);

        let mut units = 0;
        for (i, c) in content.char_indices() {
            if units == target {
                return Some(line_start + i);
            }
            if units > target {
                return None;
            }
            units += c.len_utf16();
        }
        (units == target).then_some(line_start + content.len())
    }
}

fn saturate(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
