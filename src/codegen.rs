//! Code generation: lower the parsed program into Intel-syntax x86-64 assembly.
//!
//! The emitter is a stack machine: every expression leaves exactly one value
//! on the stack, binary operators pop two and push one, and each top-level
//! statement's residual is popped into `rax` before the next one runs. Locals
//! live in the frame and are addressed as `rbp - offset`.

use crate::locals::Locals;
use crate::parser::{AstNode, BinaryOp, Program};

/// Static frame reservation: 26 single-letter locals, one word each.
pub const MIN_FRAME_SIZE: i64 = 208;

/// Bytes reserved below `rbp` for the program's locals, kept 16-byte aligned.
pub fn frame_size(locals: &Locals) -> i64 {
  let needed = (locals.size() + 15) / 16 * 16;
  needed.max(MIN_FRAME_SIZE)
}

/// Emit assembly for a whole program as ordered lines.
pub fn generate(program: &Program) -> Vec<String> {
  let stack_size = frame_size(&program.locals);
  let mut asm = Asm::default();

  asm.line(".intel_syntax noprefix");
  asm.line(".global main");
  asm.line("main:");

  asm.ins("push rbp");
  asm.ins("mov rbp, rsp");
  asm.ins(format!("sub rsp, {stack_size}"));

  for stmt in &program.body {
    emit_expr(stmt, program, &mut asm);
    asm.ins("pop rax");
  }

  if program.body.is_empty() {
    asm.ins("mov rax, 0");
  }

  emit_epilogue(&mut asm);
  asm.line(".section .note.GNU-stack,\"\",@progbits");

  tracing::debug!(stack_size, lines = asm.lines.len(), "generated assembly");
  asm.lines
}

#[derive(Default)]
struct Asm {
  lines: Vec<String>,
}

impl Asm {
  /// Directive or label, written flush left.
  fn line(&mut self, text: impl Into<String>) {
    self.lines.push(text.into());
  }

  fn ins(&mut self, text: impl AsRef<str>) {
    self.lines.push(format!("  {}", text.as_ref()));
  }
}

fn emit_epilogue(asm: &mut Asm) {
  asm.ins("mov rsp, rbp");
  asm.ins("pop rbp");
  asm.ins("ret");
}

/// Emit stack-based code for a single node.
fn emit_expr(node: &AstNode, program: &Program, asm: &mut Asm) {
  match node {
    AstNode::Num { value } => {
      if i32::try_from(*value).is_ok() {
        asm.ins(format!("push {value}"));
      } else {
        asm.ins(format!("mov rax, {value}"));
        asm.ins("push rax");
      }
    }
    AstNode::Var { .. } => {
      emit_addr(node, program, asm);
      asm.ins("pop rax");
      asm.ins("mov rax, [rax]");
      asm.ins("push rax");
    }
    AstNode::Assign { lhs, rhs } => {
      emit_addr(lhs, program, asm);
      emit_expr(rhs, program, asm);
      asm.ins("pop rdi");
      asm.ins("pop rax");
      asm.ins("mov [rax], rdi");
      asm.ins("push rdi");
    }
    AstNode::Return { expr } => {
      emit_expr(expr, program, asm);
      asm.ins("pop rax");
      emit_epilogue(asm);
    }
    AstNode::Binary { op, lhs, rhs } => {
      emit_expr(lhs, program, asm);
      emit_expr(rhs, program, asm);
      asm.ins("pop rdi");
      asm.ins("pop rax");
      match op {
        BinaryOp::Add => asm.ins("add rax, rdi"),
        BinaryOp::Sub => asm.ins("sub rax, rdi"),
        BinaryOp::Mul => asm.ins("imul rax, rdi"),
        BinaryOp::Div => {
          asm.ins("cqo");
          asm.ins("idiv rdi");
        }
        BinaryOp::Eq => emit_compare("sete", asm),
        BinaryOp::Ne => emit_compare("setne", asm),
        BinaryOp::Lt => emit_compare("setl", asm),
        BinaryOp::Le => emit_compare("setle", asm),
      }
      asm.ins("push rax");
    }
  }
}

fn emit_compare(set: &str, asm: &mut Asm) {
  asm.ins("cmp rax, rdi");
  asm.ins(format!("{set} al"));
  asm.ins("movzb rax, al");
}

/// Push the address of a variable.
fn emit_addr(node: &AstNode, program: &Program, asm: &mut Asm) {
  match node {
    AstNode::Var { local } => {
      let offset = program.locals.get(*local).offset;
      asm.ins("mov rax, rbp");
      asm.ins(format!("sub rax, {offset}"));
      asm.ins("push rax");
    }
    _ => panic!("not an lvalue"),
  }
}
