//! Column descriptors for the fixed-width record layouts.
//!
//! Both upstream formats address fields by character column. Each record type
//! is described by a table of [`FieldSpec`]s; a line is checked against the
//! span a field needs before it is sliced, so a short line surfaces as a
//! [`SeriesError::Format`] instead of an out-of-range slice.

use std::ops::Range;

use camino::Utf8Path;

use crate::error::SeriesError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Signed integer; the line must cover the whole field.
    Integer,
    /// Decimal that may be absent: blank, or cut off by the end of the line.
    OptionalDecimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub offset: usize,
    pub length: usize,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, offset: usize, length: usize, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            offset,
            length,
            kind,
        }
    }

    pub fn columns(&self) -> Range<usize> {
        self.offset..self.offset + self.length
    }

    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    /// Raw text of the field.
    ///
    /// `line_no` is 1-based and only used for error reporting.
    pub fn text<'a>(
        &self,
        line: &'a str,
        path: &Utf8Path,
        line_no: usize,
    ) -> Result<&'a str, SeriesError> {
        let width = char_width(line);
        match self.kind {
            FieldKind::Integer => {
                if width < self.end() {
                    return Err(SeriesError::format(
                        path,
                        format!(
                            "line {line_no} has {width} characters but {} spans columns {}..{}",
                            self.name,
                            self.offset,
                            self.end()
                        ),
                    ));
                }
                Ok(char_slice(line, self.columns()))
            }
            FieldKind::OptionalDecimal => {
                if width <= self.offset {
                    return Ok("");
                }
                Ok(char_slice(line, self.offset..self.end().min(width)))
            }
        }
    }

    pub fn integer(&self, line: &str, path: &Utf8Path, line_no: usize) -> Result<i32, SeriesError> {
        self.text(line, path, line_no)?
            .trim()
            .parse()
            .map_err(|_| SeriesError::parse(path, line_no, &self.name))
    }

    /// `None` when the field is blank.
    pub fn decimal(
        &self,
        line: &str,
        path: &Utf8Path,
        line_no: usize,
    ) -> Result<Option<f64>, SeriesError> {
        let text = self.text(line, path, line_no)?.trim();
        if text.is_empty() {
            return Ok(None);
        }
        text.parse()
            .map(Some)
            .map_err(|_| SeriesError::parse(path, line_no, &self.name))
    }
}

/// Number of character columns in `line`.
pub fn char_width(line: &str) -> usize {
    line.chars().count()
}

/// Character `columns` of `line`; columns past the end are dropped.
fn char_slice(line: &str, columns: Range<usize>) -> &str {
    let byte = |column: usize| {
        line.char_indices()
            .nth(column)
            .map_or(line.len(), |(index, _)| index)
    };
    let start = byte(columns.start);
    let end = byte(columns.end).max(start);
    &line[start..end]
}

/// Smallest line length that covers every required field of a layout.
pub fn required_width(fields: &[FieldSpec]) -> usize {
    fields
        .iter()
        .filter(|field| field.kind == FieldKind::Integer)
        .map(FieldSpec::end)
        .max()
        .unwrap_or(0)
}
