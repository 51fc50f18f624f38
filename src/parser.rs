//! Recursive-descent parser producing one AST root per statement.
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! program    = stmt*
//! stmt       = expr ";" | "return" expr ";"
//! expr       = assign
//! assign     = equality ("=" assign)?
//! equality   = relational ("==" relational | "!=" relational)*
//! relational = add ("<" add | "<=" add | ">" add | ">=" add)*
//! add        = mul ("+" mul | "-" mul)*
//! mul        = unary ("*" unary | "/" unary)*
//! unary      = ("+" | "-")? primary
//! primary    = num | ident | "(" expr ")"
//! ```
//!
//! Every binary level except `assign` loops to build a left-deepening tree.
//! `>` and `>=` become `<` and `<=` with the operands swapped, and `-x`
//! becomes `0 - x`.

use crate::error::{CompileError, CompileResult};
use crate::locals::{LocalId, Locals};
use crate::tokenizer::{Token, TokenKind, describe_token, token_text};

/// Binary operators that survive into the AST.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
  Add,
  Sub,
  Mul,
  Div,
  Eq,
  Ne,
  Lt,
  Le,
}

/// Expression and statement tree produced by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AstNode {
  Num {
    value: i64,
  },
  Var {
    local: LocalId,
  },
  Binary {
    op: BinaryOp,
    lhs: Box<AstNode>,
    rhs: Box<AstNode>,
  },
  Assign {
    lhs: Box<AstNode>,
    rhs: Box<AstNode>,
  },
  Return {
    expr: Box<AstNode>,
  },
}

impl AstNode {
  pub fn number(value: i64) -> Self {
    Self::Num { value }
  }

  pub fn var(local: LocalId) -> Self {
    Self::Var { local }
  }

  pub fn binary(op: BinaryOp, lhs: AstNode, rhs: AstNode) -> Self {
    Self::Binary {
      op,
      lhs: Box::new(lhs),
      rhs: Box::new(rhs),
    }
  }

  pub fn assign(lhs: AstNode, rhs: AstNode) -> Self {
    Self::Assign {
      lhs: Box::new(lhs),
      rhs: Box::new(rhs),
    }
  }

  pub fn ret(expr: AstNode) -> Self {
    Self::Return {
      expr: Box::new(expr),
    }
  }
}

/// Statements in execution order plus the locals they reference.
#[derive(Debug, Clone)]
pub struct Program {
  pub body: Vec<AstNode>,
  pub locals: Locals,
}

/// Parse a whole program from the token stream.
pub fn parse(tokens: Vec<Token>, source: &str) -> CompileResult<Program> {
  let mut parser = Parser {
    stream: TokenStream::new(tokens, source),
    locals: Locals::new(),
  };

  let mut body = Vec::new();
  while !parser.stream.is_eof() {
    body.push(parser.stmt()?);
  }

  tracing::debug!(
    statements = body.len(),
    locals = parser.locals.len(),
    "parsed program"
  );

  Ok(Program {
    body,
    locals: parser.locals,
  })
}

struct Parser<'a> {
  stream: TokenStream<'a>,
  locals: Locals,
}

impl Parser<'_> {
  fn stmt(&mut self) -> CompileResult<AstNode> {
    let node = if self.stream.consume_keyword("return") {
      AstNode::ret(self.expr()?)
    } else {
      self.expr()?
    };
    self.stream.skip(";")?;
    Ok(node)
  }

  fn expr(&mut self) -> CompileResult<AstNode> {
    self.assign()
  }

  fn assign(&mut self) -> CompileResult<AstNode> {
    let start = self.stream.loc();
    let node = self.equality()?;

    if self.stream.equal("=") {
      if !matches!(node, AstNode::Var { .. }) {
        return Err(CompileError::parse_at(
          self.stream.source,
          start,
          "not an lvalue",
        ));
      }
      let rhs = self.assign()?;
      return Ok(AstNode::assign(node, rhs));
    }

    Ok(node)
  }

  fn equality(&mut self) -> CompileResult<AstNode> {
    let mut node = self.relational()?;

    loop {
      let op = if self.stream.equal("==") {
        BinaryOp::Eq
      } else if self.stream.equal("!=") {
        BinaryOp::Ne
      } else {
        break;
      };

      let rhs = self.relational()?;
      node = AstNode::binary(op, node, rhs);
    }

    Ok(node)
  }

  fn relational(&mut self) -> CompileResult<AstNode> {
    let mut node = self.add()?;

    loop {
      if self.stream.equal("<") {
        let rhs = self.add()?;
        node = AstNode::binary(BinaryOp::Lt, node, rhs);
      } else if self.stream.equal("<=") {
        let rhs = self.add()?;
        node = AstNode::binary(BinaryOp::Le, node, rhs);
      } else if self.stream.equal(">") {
        let rhs = self.add()?;
        node = AstNode::binary(BinaryOp::Lt, rhs, node);
      } else if self.stream.equal(">=") {
        let rhs = self.add()?;
        node = AstNode::binary(BinaryOp::Le, rhs, node);
      } else {
        break;
      }
    }

    Ok(node)
  }

  fn add(&mut self) -> CompileResult<AstNode> {
    let mut node = self.mul()?;

    loop {
      let op = if self.stream.equal("+") {
        BinaryOp::Add
      } else if self.stream.equal("-") {
        BinaryOp::Sub
      } else {
        break;
      };

      let rhs = self.mul()?;
      node = AstNode::binary(op, node, rhs);
    }

    Ok(node)
  }

  fn mul(&mut self) -> CompileResult<AstNode> {
    let mut node = self.unary()?;

    loop {
      let op = if self.stream.equal("*") {
        BinaryOp::Mul
      } else if self.stream.equal("/") {
        BinaryOp::Div
      } else {
        break;
      };

      let rhs = self.unary()?;
      node = AstNode::binary(op, node, rhs);
    }

    Ok(node)
  }

  fn unary(&mut self) -> CompileResult<AstNode> {
    if self.stream.equal("+") {
      return self.primary();
    }

    if self.stream.equal("-") {
      let operand = self.primary()?;
      return Ok(AstNode::binary(BinaryOp::Sub, AstNode::number(0), operand));
    }

    self.primary()
  }

  fn primary(&mut self) -> CompileResult<AstNode> {
    if self.stream.equal("(") {
      let node = self.expr()?;
      self.stream.skip(")")?;
      return Ok(node);
    }

    if let Some(name) = self.stream.consume_ident() {
      return Ok(AstNode::var(self.locals.declare(name)));
    }

    let value = self.stream.get_number()?;
    Ok(AstNode::number(value))
  }
}

/// Cursor over the token vector.
struct TokenStream<'a> {
  tokens: Vec<Token>,
  source: &'a str,
  pos: usize,
}

impl<'a> TokenStream<'a> {
  fn new(tokens: Vec<Token>, source: &'a str) -> Self {
    Self {
      tokens,
      source,
      pos: 0,
    }
  }

  fn peek(&self) -> Option<&Token> {
    self.tokens.get(self.pos)
  }

  /// Offset of the current token, or end of input past the last one.
  fn loc(&self) -> usize {
    self.peek().map_or(self.source.len(), |token| token.loc)
  }

  /// Consume the current token if it is the given punctuator.
  fn equal(&mut self, op: &str) -> bool {
    self.consume(TokenKind::Punctuator, op)
  }

  fn consume_keyword(&mut self, keyword: &str) -> bool {
    self.consume(TokenKind::Keyword, keyword)
  }

  fn consume(&mut self, kind: TokenKind, text: &str) -> bool {
    if let Some(token) = self.peek()
      && token.kind == kind
      && token.len == text.len()
      && token_text(token, self.source) == text
    {
      self.pos += 1;
      return true;
    }
    false
  }

  /// Consume an identifier token, returning its name.
  fn consume_ident(&mut self) -> Option<&'a str> {
    let source = self.source;
    let token = self.peek().filter(|token| token.kind == TokenKind::Ident)?;
    let name = token_text(token, source);
    self.pos += 1;
    Some(name)
  }

  fn skip(&mut self, s: &str) -> CompileResult<()> {
    if self.equal(s) {
      Ok(())
    } else {
      let got = describe_token(self.peek(), self.source);
      Err(CompileError::parse_at(
        self.source,
        self.loc(),
        format!("expected \"{s}\", but got \"{got}\""),
      ))
    }
  }

  fn get_number(&mut self) -> CompileResult<i64> {
    if let Some(token) = self.peek()
      && token.kind == TokenKind::Num
    {
      let value = token.value.ok_or_else(|| {
        CompileError::parse_at(
          self.source,
          token.loc,
          "internal error: numeric token missing value",
        )
      })?;
      self.pos += 1;
      return Ok(value);
    }

    let got = describe_token(self.peek(), self.source);
    Err(CompileError::parse_at(
      self.source,
      self.loc(),
      format!("expected a number, but got \"{got}\""),
    ))
  }

  fn is_eof(&self) -> bool {
    matches!(self.peek().map(|token| token.kind), Some(TokenKind::Eof) | None)
  }
}
