//! Crate root: wires together the compilation pipeline.
//!
//! - `tokenizer` performs lexical analysis and produces a flat token stream.
//! - `parser` owns all syntactic knowledge and returns the statement list
//!   together with its `locals` table.
//! - `codegen` lowers the program into Intel-syntax x86-64 assembly.
//! - `error` carries the diagnostics shared by the other modules.

pub mod codegen;
pub mod error;
pub mod locals;
pub mod parser;
pub mod tokenizer;

pub use error::{CompileError, CompileResult};

/// Compile a source string into ordered lines of assembly.
pub fn compile(source: &str) -> CompileResult<Vec<String>> {
  let tokens = tokenizer::tokenize(source)?;
  tracing::debug!(tokens = tokens.len(), "tokenized source");
  let program = parser::parse(tokens, source)?;
  Ok(codegen::generate(&program))
}

/// Compile a source string into assembly text, one instruction per line.
pub fn generate_assembly(source: &str) -> CompileResult<String> {
  let mut asm = compile(source)?.join("\n");
  asm.push('\n');
  Ok(asm)
}
