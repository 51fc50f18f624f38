//! Local-variable table shared by the parser and code generator.
//!
//! Entries are appended on first reference and never removed. Offsets are
//! handed out in first-reference order: the first local lives one word below
//! `rbp`, the second two words below, and so on.

/// Size in bytes of one stack slot.
pub const WORD_SIZE: i64 = 8;

/// Handle to an entry in [`Locals`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVar {
  pub name: String,
  pub offset: i64,
}

#[derive(Debug, Clone, Default)]
pub struct Locals {
  vars: Vec<LocalVar>,
}

impl Locals {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn find(&self, name: &str) -> Option<LocalId> {
    self
      .vars
      .iter()
      .position(|var| var.name.len() == name.len() && var.name == name)
      .map(LocalId)
  }

  /// Look the name up, creating a new entry with the next free offset when it
  /// has not been seen yet.
  pub fn declare(&mut self, name: &str) -> LocalId {
    if let Some(id) = self.find(name) {
      return id;
    }

    let offset = (self.vars.len() as i64 + 1) * WORD_SIZE;
    tracing::trace!(name, offset, "declared local");
    self.vars.push(LocalVar {
      name: name.to_string(),
      offset,
    });
    LocalId(self.vars.len() - 1)
  }

  pub fn get(&self, id: LocalId) -> &LocalVar {
    &self.vars[id.0]
  }

  pub fn len(&self) -> usize {
    self.vars.len()
  }

  pub fn is_empty(&self) -> bool {
    self.vars.is_empty()
  }

  /// Bytes needed to hold every declared local.
  pub fn size(&self) -> i64 {
    self.vars.len() as i64 * WORD_SIZE
  }
}
