use compact_str::CompactString;

use crate::grammar::EOS;

/// Where a token or reduced value sits in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StreamPosition {
    /// Byte offset from the start of the stream
    pub offset: usize,
    /// Line number (0-based)
    pub line: usize,
    /// Byte offset from the start of the line
    pub line_offset: usize,
    /// Length in bytes
    pub length: usize,
}

impl StreamPosition {
    #[must_use]
    pub const fn new(offset: usize, line: usize, line_offset: usize, length: usize) -> Self {
        Self {
            offset,
            line,
            line_offset,
            length,
        }
    }

    #[must_use]
    pub const fn end(&self) -> usize {
        self.offset + self.length
    }

    /// A zero-length position right after this one
    #[must_use]
    pub const fn following(&self) -> Self {
        Self {
            offset: self.end(),
            line: self.line,
            line_offset: self.line_offset + self.length,
            length: 0,
        }
    }

    /// The position covering everything from `first` through `last`
    #[must_use]
    pub const fn span(first: &Self, last: &Self) -> Self {
        let length = last.end().saturating_sub(first.offset);
        Self {
            offset: first.offset,
            line: first.line,
            line_offset: first.line_offset,
            length,
        }
    }
}

/// One unit of scanner output.
#[derive(Debug, Clone, PartialEq)]
pub struct Token<V> {
    /// Terminal name, e.g. `NUM`
    pub kind: CompactString,
    pub value: Option<V>,
    pub position: Option<StreamPosition>,
}

impl<V> Token<V> {
    #[must_use]
    pub fn new(kind: impl Into<CompactString>) -> Self {
        Self {
            kind: kind.into(),
            value: None,
            position: None,
        }
    }

    /// The end-of-stream token
    #[must_use]
    pub fn eos() -> Self {
        Self::new(EOS)
    }

    #[must_use]
    pub fn with_value(mut self, value: V) -> Self {
        self.value = Some(value);
        self
    }

    #[must_use]
    pub fn at(mut self, position: StreamPosition) -> Self {
        self.position = Some(position);
        self
    }

    #[must_use]
    pub fn is_eos(&self) -> bool {
        self.kind == EOS
    }
}
