//! The authoritative in-memory document.

use crate::error::{CoreError, CoreResult};
use coscribe_protocol::{DocId, Operation};

/// One open document: identity, display name, content and version.
///
/// Content is an ordered sequence of lines; at least one line always
/// exists (an empty document is one empty line). The `version` counter
/// increases by exactly one per successfully applied operation and is
/// what staleness detection is measured against.
///
/// Columns count characters (Unicode scalar values), not bytes; mutators
/// convert to byte offsets before splicing.
///
/// Every mutator is atomic: validation happens before any mutation, so a
/// failed call leaves the document exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    id: DocId,
    name: String,
    lines: Vec<String>,
    version: u64,
}

impl Document {
    /// Creates an empty document: one empty line, version 0.
    pub fn new(id: DocId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            lines: vec![String::new()],
            version: 0,
        }
    }

    /// Creates a document with initial content, split on `\n`.
    pub fn with_content(id: DocId, name: impl Into<String>, content: &str) -> Self {
        let lines = content.split('\n').map(str::to_string).collect();
        Self {
            id,
            name: name.into(),
            lines,
            version: 0,
        }
    }

    /// Returns the document identifier.
    pub fn id(&self) -> &DocId {
        &self.id
    }

    /// Returns the current display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the current version.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns the number of lines. Always at least 1.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Returns a line by index.
    pub fn line(&self, line_idx: usize) -> Option<&str> {
        self.lines.get(line_idx).map(String::as_str)
    }

    /// Returns the character length of a line.
    pub fn line_len(&self, line_idx: usize) -> CoreResult<usize> {
        self.lines
            .get(line_idx)
            .map(|l| l.chars().count())
            .ok_or(CoreError::LineOutOfBounds {
                line_idx,
                line_count: self.lines.len(),
            })
    }

    /// Returns the flattened content with line breaks embedded.
    pub fn content(&self) -> String {
        self.lines.join("\n")
    }

    /// Inserts `ch` at the position, shifting later characters on the
    /// line right. Valid columns are `0..=line_len`.
    pub fn insert_char(&mut self, line_idx: usize, column_idx: usize, ch: char) -> CoreResult<()> {
        let offset = self.insertion_offset(line_idx, column_idx)?;
        self.lines[line_idx].insert(offset, ch);
        self.version += 1;
        Ok(())
    }

    /// Splits line `line_idx` at `column_idx`, inserting the tail as a
    /// new line immediately after.
    pub fn insert_line_break(&mut self, line_idx: usize, column_idx: usize) -> CoreResult<()> {
        let offset = self.insertion_offset(line_idx, column_idx)?;
        let tail = self.lines[line_idx].split_off(offset);
        self.lines.insert(line_idx + 1, tail);
        self.version += 1;
        Ok(())
    }

    /// Removes the character at the position. Valid columns are
    /// `0..line_len`.
    pub fn delete_char(&mut self, line_idx: usize, column_idx: usize) -> CoreResult<()> {
        let line = self.line_checked(line_idx)?;
        let offset = line
            .char_indices()
            .nth(column_idx)
            .map(|(i, _)| i)
            .ok_or(CoreError::ColumnOutOfBounds {
                line_idx,
                column_idx,
                line_len: line.chars().count(),
            })?;
        self.lines[line_idx].remove(offset);
        self.version += 1;
        Ok(())
    }

    /// Concatenates line `line_idx + 1` onto the end of line `line_idx`
    /// and removes it. Fails on the last line.
    pub fn delete_line_break(&mut self, line_idx: usize) -> CoreResult<()> {
        self.line_checked(line_idx)?;
        if line_idx + 1 >= self.lines.len() {
            return Err(CoreError::NoFollowingLine { line_idx });
        }
        let next = self.lines.remove(line_idx + 1);
        self.lines[line_idx].push_str(&next);
        self.version += 1;
        Ok(())
    }

    /// Replaces the display name. No positional validation.
    pub fn rename(&mut self, new_name: impl Into<String>) {
        self.name = new_name.into();
        self.version += 1;
    }

    /// Applies one operation, dispatching over the closed operation set.
    ///
    /// The version advances exactly once on success; on error the
    /// document is unchanged.
    pub fn apply(&mut self, op: &Operation) -> CoreResult<()> {
        match op {
            Operation::InsertChar {
                line_idx,
                column_idx,
                ch,
                ..
            } => self.insert_char(*line_idx, *column_idx, *ch),
            Operation::InsertLineBreak {
                line_idx,
                column_idx,
                ..
            } => self.insert_line_break(*line_idx, *column_idx),
            Operation::DeleteChar {
                line_idx,
                column_idx,
                ..
            } => self.delete_char(*line_idx, *column_idx),
            Operation::DeleteLineBreak { line_idx, .. } => self.delete_line_break(*line_idx),
            Operation::ChangeDocName { new_name, .. } => {
                self.rename(new_name.clone());
                Ok(())
            }
        }
    }

    fn line_checked(&self, line_idx: usize) -> CoreResult<&String> {
        self.lines.get(line_idx).ok_or(CoreError::LineOutOfBounds {
            line_idx,
            line_count: self.lines.len(),
        })
    }

    /// Byte offset for an insertion column, which may equal the line
    /// length (append position).
    fn insertion_offset(&self, line_idx: usize, column_idx: usize) -> CoreResult<usize> {
        let line = self.line_checked(line_idx)?;
        let mut chars = 0usize;
        for (offset, _) in line.char_indices() {
            if chars == column_idx {
                return Ok(offset);
            }
            chars += 1;
        }
        if chars == column_idx {
            Ok(line.len())
        } else {
            Err(CoreError::ColumnOutOfBounds {
                line_idx,
                column_idx,
                line_len: chars,
            })
        }
    }
}
