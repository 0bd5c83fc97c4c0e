//! Forward-only read cursors behind pending-read handles.
//!
//! A cursor owns an immutable backing value plus an offset. Reading
//! advances the offset; nothing is re-sliced or re-allocated, and there
//! is no way to rewind short of registering the value again.

use crate::types::END_OF_STRING_ARRAY;

/// Code-point cursor over one string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringCursor {
    text: String,
    /// Byte offset of the next unread code point. Always on a char boundary.
    offset: usize,
}

impl StringCursor {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            offset: 0,
        }
    }

    /// Consume and return the next code point, or `None` once exhausted.
    pub fn next_code_point(&mut self) -> Option<char> {
        let c = self.text[self.offset..].chars().next()?;
        self.offset += c.len_utf8();
        Some(c)
    }

    /// The unread tail of the string.
    pub fn remaining(&self) -> &str {
        &self.text[self.offset..]
    }

    pub fn is_exhausted(&self) -> bool {
        self.offset >= self.text.len()
    }
}

/// Whole-string cursor over an ordered sequence of strings.
///
/// The end-of-array marker is appended once at construction, so the
/// guest sees it as the last element and then on every later read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringArrayCursor {
    items: Vec<String>,
    position: usize,
}

impl StringArrayCursor {
    pub fn new<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut items: Vec<String> = items.into_iter().map(Into::into).collect();
        items.push(END_OF_STRING_ARRAY.to_string());
        Self { items, position: 0 }
    }

    /// Consume and return the next string, or the marker once exhausted.
    pub fn next_string(&mut self) -> &str {
        match self.items.get(self.position) {
            Some(item) => {
                self.position += 1;
                item.as_str()
            }
            None => END_OF_STRING_ARRAY,
        }
    }

    /// Unread items, including the marker while it has not been read.
    pub fn remaining(&self) -> &[String] {
        &self.items[self.position..]
    }

    pub fn is_exhausted(&self) -> bool {
        self.position >= self.items.len()
    }
}

/// A resource registered in the pending-read handle table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingRead {
    String(StringCursor),
    StringArray(StringArrayCursor),
}

impl PendingRead {
    pub fn as_string_mut(&mut self) -> Option<&mut StringCursor> {
        match self {
            Self::String(cursor) => Some(cursor),
            Self::StringArray(_) => None,
        }
    }

    pub fn as_string_array_mut(&mut self) -> Option<&mut StringArrayCursor> {
        match self {
            Self::StringArray(cursor) => Some(cursor),
            Self::String(_) => None,
        }
    }
}
