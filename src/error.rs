//! Shared error type for the compilation pipeline.
//!
//! Position-aware diagnostics follow the chibicc convention: the offending
//! source line, then a caret under the exact column, then the message.

use snafu::Snafu;

pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Debug, Snafu)]
pub enum CompileError {
  /// The tokenizer hit a character (or literal) it cannot classify.
  #[snafu(display("{line}\n{marker} {message}"))]
  Lex {
    loc: usize,
    line: String,
    marker: String,
    message: String,
  },

  /// The parser did not find what the grammar requires at `loc`.
  #[snafu(display("{line}\n{marker} {message}"))]
  Parse {
    loc: usize,
    line: String,
    marker: String,
    message: String,
  },

  #[snafu(display("usage: {program} <source>"))]
  Usage { program: String },
}

impl CompileError {
  /// Construct a lexical error anchored at a byte offset in the source.
  pub fn lex_at(source: &str, loc: usize, message: impl Into<String>) -> Self {
    let (loc, line, marker) = locate(source, loc);
    Self::Lex {
      loc,
      line,
      marker,
      message: message.into(),
    }
  }

  /// Construct a syntax error anchored at a byte offset in the source.
  pub fn parse_at(source: &str, loc: usize, message: impl Into<String>) -> Self {
    let (loc, line, marker) = locate(source, loc);
    Self::Parse {
      loc,
      line,
      marker,
      message: message.into(),
    }
  }

  pub fn usage(program: impl Into<String>) -> Self {
    Self::Usage {
      program: program.into(),
    }
  }

  /// Byte offset the diagnostic points at, if it has one.
  pub fn loc(&self) -> Option<usize> {
    match self {
      Self::Lex { loc, .. } | Self::Parse { loc, .. } => Some(*loc),
      Self::Usage { .. } => None,
    }
  }
}

/// Clamp `loc` into the source and return it with the enclosing line and a
/// caret marker aligned to the character column inside that line.
fn locate(source: &str, loc: usize) -> (usize, String, String) {
  let mut loc = loc.min(source.len());
  while !source.is_char_boundary(loc) {
    loc -= 1;
  }
  let start = source[..loc].rfind('\n').map_or(0, |idx| idx + 1);
  let end = source[loc..]
    .find('\n')
    .map_or(source.len(), |idx| loc + idx);
  let column = source[start..loc].chars().count();
  let marker = format!("{}^", " ".repeat(column));
  (loc, source[start..end].to_string(), marker)
}
