//! Recursive-descent translator.
//!
//! Grammar:
//!
//! ```text
//! Program    := "main" "(" ")" Block
//! Block      := "{" StmtSeq "}"
//! StmtSeq    := Stmt { Stmt }
//! Stmt       := Assign | IfStmt | WhileStmt
//! Assign     := id "=" Expr ";"
//! IfStmt     := "if" "(" Cond ")" Block
//! WhileStmt  := "while" "(" Cond ")" Block
//! Cond       := Expr RelOp Expr
//! Expr       := Term { ("+"|"-") Term }
//! Term       := Factor { ("*"|"/") Factor }
//! Factor     := id | number | "(" Expr ")"
//! ```

use crate::reader::{SyntaxClass, Token};

use super::quad::{ArithOp, Chain, QuadTable, Quadruple, RelOp, Target};
use super::{Expected, SemanticError, SyntaxError, TranslateError, TranslateResult};

pub(super) struct Translator<'t> {
    tokens: &'t [Token],
    position: usize,

    table: QuadTable,
    temporaries: usize,

    // Blocks and parentheses currently open.
    depth: usize,
    max_depth: usize,
}

impl<'t> Translator<'t> {
    pub(super) fn new(tokens: &'t [Token], table: QuadTable, max_depth: usize) -> Self {
        Translator {
            tokens,
            position: 0,
            table,
            temporaries: 0,
            depth: 0,
            max_depth,
        }
    }

    /// Translate the whole program.
    /// Returns the finished table, and the number of temporaries used.
    pub(super) fn run(mut self) -> TranslateResult<(QuadTable, usize)> {
        let chain = self.program()?;
        if self.current().is_some() {
            return Err(self.unexpected(Expected::EndOfInput));
        }
        let exit = self.table.next_index();
        self.table.resolve(chain, exit)?;
        Ok((self.table, self.temporaries))
    }

    fn current(&self) -> Option<&'t Token> {
        self.tokens.get(self.position)
    }

    fn current_class(&self) -> Option<SyntaxClass> {
        self.current().map(|token| token.class)
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn unexpected(&self, expected: Expected) -> TranslateError {
        SyntaxError::UnexpectedToken {
            expected,
            found: self.current().into(),
        }
        .into()
    }

    /// Consume a token of the given class, or fail.
    fn expect(&mut self, class: SyntaxClass) -> TranslateResult<&'t Token> {
        match self.current() {
            Some(token) if token.class == class => {
                self.advance();
                Ok(token)
            }
            _ => Err(self.unexpected(Expected::Class(class))),
        }
    }

    /// Run `parse` one level deeper, or fail if that passes the nesting limit.
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> TranslateResult<T>,
    ) -> TranslateResult<T> {
        if self.depth >= self.max_depth {
            return Err(TranslateError::NestingTooDeep {
                limit: self.max_depth,
                found: self.current().into(),
            });
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn fresh_temporary(&mut self) -> String {
        self.temporaries += 1;
        format!("T{}", self.temporaries)
    }

    fn program(&mut self) -> TranslateResult<Chain> {
        self.expect(SyntaxClass::Main)?;
        self.expect(SyntaxClass::LParen)?;
        self.expect(SyntaxClass::RParen)?;
        self.block()
    }

    fn block(&mut self) -> TranslateResult<Chain> {
        self.nested(|this| {
            this.expect(SyntaxClass::LBrace)?;
            let chain = this.statements()?;
            this.expect(SyntaxClass::RBrace)?;
            Ok(chain)
        })
    }

    fn at_statement(&self) -> bool {
        matches!(
            self.current_class(),
            Some(SyntaxClass::Identifier | SyntaxClass::If | SyntaxClass::While)
        )
    }

    /// The last statement's chain is left for the caller:
    /// what follows the sequence isn't known yet.
    fn statements(&mut self) -> TranslateResult<Chain> {
        let mut chain = self.statement()?;
        while self.at_statement() {
            let next = self.table.next_index();
            self.table.resolve(chain, next)?;
            chain = self.statement()?;
        }
        Ok(chain)
    }

    fn statement(&mut self) -> TranslateResult<Chain> {
        match self.current_class() {
            Some(SyntaxClass::Identifier) => self.assignment(),
            Some(SyntaxClass::If) => self.if_statement(),
            Some(SyntaxClass::While) => self.while_statement(),
            _ => Err(self.unexpected(Expected::Statement)),
        }
    }

    fn assignment(&mut self) -> TranslateResult<Chain> {
        let variable = self.expect(SyntaxClass::Identifier)?;
        self.expect(SyntaxClass::Assign)?;
        let value = self.expression()?;
        self.expect(SyntaxClass::Semicolon)?;
        self.table
            .emit(Quadruple::assign(value, variable.value.clone()))?;
        Ok(Chain::EMPTY)
    }

    fn if_statement(&mut self) -> TranslateResult<Chain> {
        self.expect(SyntaxClass::If)?;
        self.expect(SyntaxClass::LParen)?;
        let (on_true, on_false) = self.condition()?;
        let body_start = self.table.next_index();
        self.table.resolve(on_true, body_start)?;
        self.expect(SyntaxClass::RParen)?;

        let body = self.block()?;
        self.table.merge(body, on_false)
    }

    fn while_statement(&mut self) -> TranslateResult<Chain> {
        self.expect(SyntaxClass::While)?;
        let test = self.table.next_index();
        self.expect(SyntaxClass::LParen)?;
        let (on_true, on_false) = self.condition()?;
        let body_start = self.table.next_index();
        self.table.resolve(on_true, body_start)?;
        self.expect(SyntaxClass::RParen)?;

        let body = self.block()?;
        self.table.resolve(body, test)?;
        self.table.emit(Quadruple::jump(Target::Resolved(test)))?;
        Ok(on_false)
    }

    /// Emits the conditional jump (taken when the condition holds) and the
    /// unconditional jump after it, and returns both as single-element chains.
    fn condition(&mut self) -> TranslateResult<(Chain, Chain)> {
        let left = self.expression()?;
        let Some(op) = self.current_class().and_then(RelOp::from_class) else {
            return Err(SemanticError::InvalidRelationalOperator {
                found: self.current().into(),
            }
            .into());
        };
        self.advance();
        let right = self.expression()?;

        let on_true = self.table.emit(Quadruple::jump_if(op, left, right))?;
        let on_false = self
            .table
            .emit(Quadruple::jump(Target::Pending(Chain::EMPTY)))?;
        Ok((on_true.into(), on_false.into()))
    }

    /// Expression and term are the same left fold, at different precedence levels.
    fn expression(&mut self) -> TranslateResult<String> {
        self.binary(Self::term, |op| matches!(op, ArithOp::Add | ArithOp::Sub))
    }

    fn term(&mut self) -> TranslateResult<String> {
        self.binary(Self::factor, |op| matches!(op, ArithOp::Mul | ArithOp::Div))
    }

    fn binary(
        &mut self,
        operand: fn(&mut Self) -> TranslateResult<String>,
        at_level: fn(ArithOp) -> bool,
    ) -> TranslateResult<String> {
        let mut left = operand(self)?;
        while let Some(op) = self
            .current_class()
            .and_then(ArithOp::from_class)
            .filter(|op| at_level(*op))
        {
            self.advance();
            let right = operand(self)?;
            let result = self.fresh_temporary();
            self.table
                .emit(Quadruple::arith(op, left, right, result.clone()))?;
            left = result;
        }
        Ok(left)
    }

    fn factor(&mut self) -> TranslateResult<String> {
        match self.current() {
            Some(token) if matches!(token.class, SyntaxClass::Identifier | SyntaxClass::Number) => {
                self.advance();
                Ok(token.value.clone())
            }
            Some(token) if token.class == SyntaxClass::LParen => self.nested(|this| {
                this.advance();
                let value = this.expression()?;
                this.expect(SyntaxClass::RParen)?;
                Ok(value)
            }),
            _ => Err(self.unexpected(Expected::Factor)),
        }
    }
}
