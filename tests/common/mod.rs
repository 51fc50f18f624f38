//! A tiny interpreter for the Intel-syntax subset the code generator emits,
//! so tests can check what a program computes without an assembler.

use std::collections::HashMap;

const STACK_TOP: i64 = 0x10_0000;
const RETURN_SENTINEL: i64 = -1;
const STEP_LIMIT: usize = 1_000_000;

#[derive(Default)]
struct Machine {
  regs: HashMap<String, i64>,
  memory: HashMap<i64, i64>,
  cmp: (i64, i64),
}

impl Machine {
  fn reg(&self, name: &str) -> i64 {
    match name {
      "al" => self.reg("rax") & 0xff,
      _ => *self.regs.get(name).unwrap_or(&0),
    }
  }

  fn set_reg(&mut self, name: &str, value: i64) {
    match name {
      "al" => {
        let rax = self.reg("rax");
        self.regs.insert("rax".into(), (rax & !0xff) | (value & 0xff));
      }
      _ => {
        self.regs.insert(name.into(), value);
      }
    }
  }

  fn value(&self, operand: &str) -> i64 {
    if let Some(inner) = operand.strip_prefix('[').and_then(|op| op.strip_suffix(']')) {
      let addr = self.reg(inner);
      return *self
        .memory
        .get(&addr)
        .unwrap_or_else(|| panic!("read of uninitialised address {addr:#x}"));
    }
    operand
      .parse::<i64>()
      .unwrap_or_else(|_| self.reg(operand))
  }

  fn push(&mut self, value: i64) {
    let rsp = self.reg("rsp") - 8;
    self.set_reg("rsp", rsp);
    self.memory.insert(rsp, value);
  }

  fn pop(&mut self) -> i64 {
    let rsp = self.reg("rsp");
    let value = *self
      .memory
      .get(&rsp)
      .unwrap_or_else(|| panic!("pop from empty slot {rsp:#x}"));
    self.set_reg("rsp", rsp + 8);
    value
  }
}

/// Run the `main` routine in `lines` and return `rax` at its final `ret`.
pub fn execute(lines: &[String]) -> i64 {
  let mut machine = Machine::default();
  machine.set_reg("rsp", STACK_TOP);
  machine.push(RETURN_SENTINEL);

  let mut pc = lines
    .iter()
    .position(|line| line == "main:")
    .expect("no main label")
    + 1;

  for _ in 0..STEP_LIMIT {
    let line = lines.get(pc).expect("fell off the end of the routine").trim();
    pc += 1;
    if line.starts_with('.') || line.ends_with(':') {
      continue;
    }

    let (op, rest) = line.split_once(' ').unwrap_or((line, ""));
    let args: Vec<&str> = rest.split(", ").filter(|arg| !arg.is_empty()).collect();

    match (op, args.as_slice()) {
      ("push", [src]) => {
        let value = machine.value(src);
        machine.push(value);
      }
      ("pop", [dst]) => {
        let value = machine.pop();
        machine.set_reg(dst, value);
      }
      ("mov", [dst, src]) => {
        let value = machine.value(src);
        if let Some(inner) = dst.strip_prefix('[').and_then(|op| op.strip_suffix(']')) {
          let addr = machine.reg(inner);
          machine.memory.insert(addr, value);
        } else {
          machine.set_reg(dst, value);
        }
      }
      ("add", [dst, src]) => {
        let value = machine.reg(dst).wrapping_add(machine.value(src));
        machine.set_reg(dst, value);
      }
      ("sub", [dst, src]) => {
        let value = machine.reg(dst).wrapping_sub(machine.value(src));
        machine.set_reg(dst, value);
      }
      ("imul", [dst, src]) => {
        let value = machine.reg(dst).wrapping_mul(machine.value(src));
        machine.set_reg(dst, value);
      }
      ("cqo", []) => {
        let rdx = if machine.reg("rax") < 0 { -1 } else { 0 };
        machine.set_reg("rdx", rdx);
      }
      ("idiv", [src]) => {
        let divisor = machine.value(src);
        assert_ne!(divisor, 0, "division by zero");
        let dividend = machine.reg("rax");
        machine.set_reg("rax", dividend.wrapping_div(divisor));
        machine.set_reg("rdx", dividend.wrapping_rem(divisor));
      }
      ("cmp", [lhs, rhs]) => {
        machine.cmp = (machine.value(lhs), machine.value(rhs));
      }
      ("sete" | "setne" | "setl" | "setle", [dst]) => {
        let (lhs, rhs) = machine.cmp;
        let flag = match op {
          "sete" => lhs == rhs,
          "setne" => lhs != rhs,
          "setl" => lhs < rhs,
          _ => lhs <= rhs,
        };
        machine.set_reg(dst, i64::from(flag));
      }
      ("movzb", [dst, src]) => {
        let value = machine.value(src) & 0xff;
        machine.set_reg(dst, value);
      }
      ("ret", []) => {
        let target = machine.pop();
        assert_eq!(target, RETURN_SENTINEL, "returned to a bogus address");
        assert_eq!(machine.reg("rsp"), STACK_TOP, "stack not balanced on return");
        return machine.reg("rax");
      }
      _ => panic!("unsupported instruction: {line}"),
    }
  }

  panic!("program did not return within {STEP_LIMIT} steps");
}

/// Compile `source` and run it, panicking on compile errors.
pub fn run(source: &str) -> i64 {
  let lines = stackcc::compile(source)
    .unwrap_or_else(|err| panic!("failed to compile {source:?}:\n{err}"));
  execute(&lines)
}
