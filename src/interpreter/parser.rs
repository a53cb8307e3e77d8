use crate::ast::{BinaryOp, Expr, ExprKind, Program, Stmt, StmtKind, UnaryOp};
use crate::diagnostic::Position;
use crate::error::{EmberError, Result};
use crate::token::{Literal, Token, TokenKind};
use std::rc::Rc;

/// Binding power of an operator position, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    None,
    Or,
    And,
    Not,
    Equality,
    Comparison,
    Term,
    Factor,
    Unary,
    Call,
}

fn infix_precedence(kind: TokenKind) -> Precedence {
    match kind {
        TokenKind::Or => Precedence::Or,
        TokenKind::And => Precedence::And,
        TokenKind::EqualEqual | TokenKind::BangEqual => Precedence::Equality,
        TokenKind::Less | TokenKind::LessEqual | TokenKind::Greater | TokenKind::GreaterEqual => {
            Precedence::Comparison
        }
        TokenKind::Plus | TokenKind::Minus => Precedence::Term,
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Precedence::Factor,
        TokenKind::LParen | TokenKind::LBracket => Precedence::Call,
        _ => Precedence::None,
    }
}

fn binary_op(kind: TokenKind) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Mod,
        TokenKind::EqualEqual => BinaryOp::Eq,
        TokenKind::BangEqual => BinaryOp::NotEq,
        TokenKind::Less => BinaryOp::Less,
        TokenKind::LessEqual => BinaryOp::LessEq,
        TokenKind::Greater => BinaryOp::Greater,
        TokenKind::GreaterEqual => BinaryOp::GreaterEq,
        TokenKind::And => BinaryOp::And,
        TokenKind::Or => BinaryOp::Or,
        _ => return None,
    };
    Some(op)
}

/// Recursive-descent statement parser with precedence climbing for expressions.
pub struct TokenParser {
    tokens: Vec<Token>,
    current: usize,
}

impl TokenParser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if !tokens.last().is_some_and(|token| token.is(TokenKind::Eof)) {
            let position = tokens.last().map(|token| token.position).unwrap_or_default();
            tokens.push(Token::new(TokenKind::Eof, "", position));
        }
        Self { tokens, current: 0 }
    }

    fn current_token(&self) -> &Token {
        // `new` guarantees a trailing EOF and `advance` never steps past it
        &self.tokens[self.current]
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current_token().is(kind)
    }

    fn advance(&mut self) -> Token {
        let token = self.current_token().clone();
        if !token.is(TokenKind::Eof) {
            self.current += 1;
        }
        token
    }

    fn expect(&mut self, kind: TokenKind, message: &str) -> Result<Token> {
        if self.check(kind) {
            return Ok(self.advance());
        }
        let token = self.current_token();
        Err(EmberError::syntax(
            format!("{}, got '{}'", message, token.describe()),
            token.position,
        ))
    }

    fn skip_newlines(&mut self) {
        while self.check(TokenKind::Newline) {
            self.advance();
        }
    }

    /// A statement ends at a NEWLINE or EOF; a block keyword may also follow directly.
    fn expect_newline(&mut self) -> Result<()> {
        match self.current_token().kind {
            TokenKind::Eof | TokenKind::End | TokenKind::Elif | TokenKind::Else => Ok(()),
            TokenKind::Newline => {
                self.advance();
                Ok(())
            }
            _ => {
                let token = self.current_token();
                Err(EmberError::syntax(
                    format!("Expected newline after statement, got '{}'", token.describe()),
                    token.position,
                ))
            }
        }
    }

    pub fn parse(&mut self) -> Result<Program> {
        let mut statements = Vec::new();
        self.skip_newlines();
        while !self.check(TokenKind::Eof) {
            statements.push(self.parse_statement()?);
            self.skip_newlines();
        }
        log::debug!("parsed {} top-level statements", statements.len());
        Ok(Program {
            statements,
            position: Position::start(),
        })
    }

    fn parse_statement(&mut self) -> Result<Stmt> {
        match self.current_token().kind {
            TokenKind::Let => self.parse_let_statement(),
            TokenKind::If => self.parse_if_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::Fn => self.parse_function_statement(),
            TokenKind::Return => self.parse_return_statement(),
            _ => {
                let expr = self.parse_expression()?;
                self.expect_newline()?;
                let position = expr.position;
                Ok(Stmt::new(StmtKind::Expr(expr), position))
            }
        }
    }

    /// Statements up to (not including) `end`, `elif`, `else` or EOF.
    fn parse_block(&mut self) -> Result<Vec<Stmt>> {
        let mut statements = Vec::new();
        self.skip_newlines();
        while !matches!(
            self.current_token().kind,
            TokenKind::End | TokenKind::Elif | TokenKind::Else | TokenKind::Eof
        ) {
            statements.push(self.parse_statement()?);
            self.skip_newlines();
        }
        Ok(statements)
    }

    fn parse_let_statement(&mut self) -> Result<Stmt> {
        let let_token = self.expect(TokenKind::Let, "Expected 'let'")?;
        let name_token = self.expect(TokenKind::Identifier, "Expected variable name after 'let'")?;
        let name: Rc<str> = Rc::from(name_token.lexeme.as_str());

        if self.check(TokenKind::LBracket) {
            self.advance();
            let index = self.parse_expression()?;
            self.expect(TokenKind::RBracket, "Expected ']' after index")?;
            self.expect(TokenKind::Equal, "Expected '=' in assignment")?;
            let value = self.parse_expression()?;
            self.expect_newline()?;
            return Ok(Stmt::new(
                StmtKind::IndexAssign {
                    target: name,
                    index,
                    value,
                },
                let_token.position,
            ));
        }

        self.expect(TokenKind::Equal, "Expected '=' after variable name")?;
        let value = self.parse_expression()?;
        self.expect_newline()?;
        Ok(Stmt::new(StmtKind::Let { name, value }, let_token.position))
    }

    fn parse_if_statement(&mut self) -> Result<Stmt> {
        let if_token = self.expect(TokenKind::If, "Expected 'if'")?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::Do, "Expected 'do' after if condition")?;
        self.expect_newline()?;
        let then_body = self.parse_block()?;

        let mut elif_clauses = Vec::new();
        while self.check(TokenKind::Elif) {
            self.advance();
            let elif_condition = self.parse_expression()?;
            self.expect(TokenKind::Do, "Expected 'do' after elif condition")?;
            self.expect_newline()?;
            let body = self.parse_block()?;
            elif_clauses.push((elif_condition, body));
        }

        let else_body = if self.check(TokenKind::Else) {
            self.advance();
            self.expect(TokenKind::Do, "Expected 'do' after else")?;
            self.expect_newline()?;
            Some(self.parse_block()?)
        } else {
            None
        };

        self.expect(TokenKind::End, "Expected 'end' to close if block")?;
        self.expect_newline()?;
        Ok(Stmt::new(
            StmtKind::If {
                condition,
                then_body,
                elif_clauses,
                else_body,
            },
            if_token.position,
        ))
    }

    fn parse_while_statement(&mut self) -> Result<Stmt> {
        let while_token = self.expect(TokenKind::While, "Expected 'while'")?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::Do, "Expected 'do' after while condition")?;
        self.expect_newline()?;
        let body = self.parse_block()?;
        self.expect(TokenKind::End, "Expected 'end' to close while block")?;
        self.expect_newline()?;
        Ok(Stmt::new(StmtKind::While { condition, body }, while_token.position))
    }

    fn parse_function_statement(&mut self) -> Result<Stmt> {
        let fn_token = self.expect(TokenKind::Fn, "Expected 'fn'")?;
        let name_token = self.expect(TokenKind::Identifier, "Expected function name after 'fn'")?;
        self.expect(TokenKind::LParen, "Expected '(' after function name")?;

        let mut params: Vec<Rc<str>> = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                let param = self.expect(TokenKind::Identifier, "Expected parameter name")?;
                params.push(Rc::from(param.lexeme.as_str()));
                if self.check(TokenKind::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }

        self.expect(TokenKind::RParen, "Expected ')' after parameters")?;
        self.expect(TokenKind::Do, "Expected 'do' after function signature")?;
        self.expect_newline()?;
        let body = self.parse_block()?;
        self.expect(TokenKind::End, "Expected 'end' to close function body")?;
        self.expect_newline()?;

        Ok(Stmt::new(
            StmtKind::Function {
                name: Rc::from(name_token.lexeme.as_str()),
                params: Rc::from(params),
                body: Rc::from(body),
            },
            fn_token.position,
        ))
    }

    fn parse_return_statement(&mut self) -> Result<Stmt> {
        let return_token = self.expect(TokenKind::Return, "Expected 'return'")?;
        let value = if self.check(TokenKind::Newline) || self.check(TokenKind::Eof) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_newline()?;
        Ok(Stmt::new(StmtKind::Return(value), return_token.position))
    }

    pub fn parse_expression(&mut self) -> Result<Expr> {
        self.parse_precedence(Precedence::None)
    }

    fn parse_precedence(&mut self, min: Precedence) -> Result<Expr> {
        let mut left = self.parse_prefix()?;
        loop {
            let precedence = infix_precedence(self.current_token().kind);
            if precedence <= min {
                break;
            }
            left = self.parse_infix(left, precedence)?;
        }
        Ok(left)
    }

    fn parse_prefix(&mut self) -> Result<Expr> {
        let token = self.advance();
        let position = token.position;
        let kind = match token.kind {
            TokenKind::Number => match token.literal {
                Some(Literal::Number(value, _)) => ExprKind::Number(value),
                _ => ExprKind::Number(token.lexeme.parse().unwrap_or_default()),
            },
            TokenKind::String => match token.literal {
                Some(Literal::String(value)) => ExprKind::String(value),
                _ => ExprKind::String(Rc::from(token.lexeme.as_str())),
            },
            TokenKind::True => ExprKind::Bool(true),
            TokenKind::False => ExprKind::Bool(false),
            TokenKind::Nil => ExprKind::Nil,
            TokenKind::Identifier => ExprKind::Identifier(Rc::from(token.lexeme.as_str())),
            TokenKind::LParen => {
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen, "Expected ')' after expression")?;
                return Ok(expr);
            }
            TokenKind::LBracket => {
                let elements = self.parse_comma_list(TokenKind::RBracket)?;
                self.expect(TokenKind::RBracket, "Expected ']' after list elements")?;
                ExprKind::List(elements)
            }
            TokenKind::Minus => ExprKind::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(self.parse_precedence(Precedence::Unary)?),
            },
            TokenKind::Not => ExprKind::Unary {
                op: UnaryOp::Not,
                operand: Box::new(self.parse_precedence(Precedence::Not)?),
            },
            _ => {
                return Err(EmberError::syntax(
                    format!("Unexpected token '{}'", token.describe()),
                    position,
                ));
            }
        };
        Ok(Expr::new(kind, position))
    }

    fn parse_infix(&mut self, left: Expr, precedence: Precedence) -> Result<Expr> {
        let token = self.advance();
        let position = token.position;
        let kind = match token.kind {
            TokenKind::LParen => {
                let args = self.parse_comma_list(TokenKind::RParen)?;
                self.expect(TokenKind::RParen, "Expected ')' after arguments")?;
                ExprKind::Call {
                    callee: Box::new(left),
                    args,
                }
            }
            TokenKind::LBracket => {
                let index = self.parse_expression()?;
                self.expect(TokenKind::RBracket, "Expected ']' after index")?;
                ExprKind::Index {
                    object: Box::new(left),
                    index: Box::new(index),
                }
            }
            kind => {
                let op = binary_op(kind).ok_or_else(|| {
                    EmberError::syntax(
                        format!("Unexpected token '{}'", token.describe()),
                        position,
                    )
                })?;
                // same precedence on the right keeps operators left-associative
                let right = self.parse_precedence(precedence)?;
                ExprKind::Binary {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                }
            }
        };
        Ok(Expr::new(kind, position))
    }

    /// Comma-separated expressions up to `close`, which is left unconsumed.
    fn parse_comma_list(&mut self, close: TokenKind) -> Result<Vec<Expr>> {
        let mut items = Vec::new();
        if self.check(close) {
            return Ok(items);
        }
        items.push(self.parse_expression()?);
        while self.check(TokenKind::Comma) {
            self.advance();
            items.push(self.parse_expression()?);
        }
        Ok(items)
    }
}

/// Parses a complete token stream into a program.
pub fn parse(tokens: Vec<Token>) -> Result<Program> {
    TokenParser::new(tokens).parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::lexer::tokenize;

    fn parse_source(source: &str) -> Result<Program> {
        parse(tokenize(source)?)
    }

    fn parse_ok(source: &str) -> Vec<Stmt> {
        parse_source(source).expect("Parse failed").statements
    }

    fn parse_err(source: &str) -> EmberError {
        parse_source(source).expect_err("Expected a syntax error")
    }

    fn single_expr(source: &str) -> Expr {
        match parse_ok(source).remove(0).kind {
            StmtKind::Expr(expr) => expr,
            other => panic!("Expected expression statement, got {:?}", other),
        }
    }

    /// Renders an expression fully parenthesised, to make grouping visible.
    fn shape(expr: &Expr) -> String {
        match &expr.kind {
            ExprKind::Number(n) => n.to_string(),
            ExprKind::String(s) => format!("{:?}", s),
            ExprKind::Bool(b) => b.to_string(),
            ExprKind::Nil => "nil".to_string(),
            ExprKind::Identifier(name) => name.to_string(),
            ExprKind::List(items) => {
                let items: Vec<String> = items.iter().map(shape).collect();
                format!("[{}]", items.join(", "))
            }
            ExprKind::Unary { op, operand } => format!("({} {})", op, shape(operand)),
            ExprKind::Binary { left, op, right } => {
                format!("({} {} {})", shape(left), op, shape(right))
            }
            ExprKind::Call { callee, args } => {
                let args: Vec<String> = args.iter().map(shape).collect();
                format!("{}({})", shape(callee), args.join(", "))
            }
            ExprKind::Index { object, index } => format!("{}[{}]", shape(object), shape(index)),
        }
    }

    fn shape_of(source: &str) -> String {
        shape(&single_expr(source))
    }

    #[test]
    fn test_empty_program() {
        let program = parse_source("\n\n# nothing\n").unwrap();
        assert!(program.statements.is_empty());
        assert_eq!(program.position, Position::new(1, 1));
    }

    #[test]
    fn test_arithmetic_precedence() {
        assert_eq!(shape_of("1 + 2 * 3"), "(1 + (2 * 3))");
        assert_eq!(shape_of("(1 + 2) * 3"), "((1 + 2) * 3)");
        assert_eq!(shape_of("10 - 4 % 3 / 2"), "(10 - ((4 % 3) / 2))");
    }

    #[test]
    fn test_left_associativity() {
        assert_eq!(shape_of("10 - 3 - 2"), "((10 - 3) - 2)");
        assert_eq!(shape_of("8 / 4 / 2"), "((8 / 4) / 2)");
        assert_eq!(shape_of("a or b or c"), "((a or b) or c)");
    }

    #[test]
    fn test_logical_precedence() {
        assert_eq!(shape_of("a or b and c"), "(a or (b and c))");
        assert_eq!(shape_of("not a == b"), "(not (a == b))");
        assert_eq!(shape_of("not a and b"), "((not a) and b)");
        assert_eq!(shape_of("a < b == c > d"), "((a < b) == (c > d))");
        assert_eq!(shape_of("x + 1 < y * 2"), "((x + 1) < (y * 2))");
    }

    #[test]
    fn test_unary_minus_binds_tighter_than_binary() {
        assert_eq!(shape_of("-a * b"), "((- a) * b)");
        assert_eq!(shape_of("- -a"), "(- (- a))");
        assert_eq!(shape_of("-f(x)"), "(- f(x))");
    }

    #[test]
    fn test_postfix_chains() {
        assert_eq!(shape_of("f(x)[0](y)"), "f(x)[0](y)");
        assert_eq!(shape_of("grid[1][2] + 1"), "(grid[1][2] + 1)");
        assert_eq!(shape_of("f()"), "f()");
        assert_eq!(shape_of("max(a, b + 1, [1, 2])"), "max(a, (b + 1), [1, 2])");
    }

    #[test]
    fn test_literals() {
        assert_eq!(shape_of("[]"), "[]");
        assert_eq!(shape_of("[1, \"two\", true, nil]"), "[1, \"two\", true, nil]");
        assert_eq!(single_expr("3.5").kind, ExprKind::Number(3.5));
    }

    #[test]
    fn test_positions() {
        let expr = single_expr("  1 + 2");
        assert_eq!(expr.position, Position::new(1, 5));
        if let ExprKind::Binary { left, right, .. } = &expr.kind {
            assert_eq!(left.position, Position::new(1, 3));
            assert_eq!(right.position, Position::new(1, 7));
        } else {
            panic!("Expected binary expression");
        }

        let call = single_expr("print(1)");
        assert_eq!(call.position, Position::new(1, 6));
    }

    #[test]
    fn test_let_statement() {
        let statements = parse_ok("let x = 1 + 2");
        assert_eq!(statements[0].position, Position::new(1, 1));
        match &statements[0].kind {
            StmtKind::Let { name, value } => {
                assert_eq!(name.as_ref(), "x");
                assert_eq!(shape(value), "(1 + 2)");
            }
            other => panic!("Expected let, got {:?}", other),
        }
    }

    #[test]
    fn test_index_assignment() {
        match &parse_ok("let items[i + 1] = 0")[0].kind {
            StmtKind::IndexAssign {
                target,
                index,
                value,
            } => {
                assert_eq!(target.as_ref(), "items");
                assert_eq!(shape(index), "(i + 1)");
                assert_eq!(shape(value), "0");
            }
            other => panic!("Expected index assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_if_elif_else() {
        let source = "if a do\n  x\nelif b do\n  y\nelif c do\n  z\nelse do\n  w\nend\n";
        match &parse_ok(source)[0].kind {
            StmtKind::If {
                condition,
                then_body,
                elif_clauses,
                else_body,
            } => {
                assert_eq!(shape(condition), "a");
                assert_eq!(then_body.len(), 1);
                assert_eq!(elif_clauses.len(), 2);
                assert_eq!(shape(&elif_clauses[1].0), "c");
                assert_eq!(else_body.as_ref().map(Vec::len), Some(1));
            }
            other => panic!("Expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_while_and_function() {
        let source = "fn count(n) do\n  while n > 0 do\n    let n = n - 1\n  end\n  return n\nend";
        match &parse_ok(source)[0].kind {
            StmtKind::Function { name, params, body } => {
                assert_eq!(name.as_ref(), "count");
                assert_eq!(params.len(), 1);
                assert_eq!(body.len(), 2);
                assert!(matches!(body[0].kind, StmtKind::While { .. }));
                assert!(matches!(body[1].kind, StmtKind::Return(Some(_))));
            }
            other => panic!("Expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_bare_return() {
        let source = "fn f() do\n  return\nend";
        match &parse_ok(source)[0].kind {
            StmtKind::Function { body, .. } => {
                assert!(matches!(body[0].kind, StmtKind::Return(None)));
            }
            other => panic!("Expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_newline_optional_before_block_end() {
        let statements = parse_ok("while x do\n  f() end");
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn test_missing_do() {
        let error = parse_err("if x\n  print(1)\nend");
        assert_eq!(error.kind, ErrorKind::Syntax);
        assert_eq!(error.message, "Expected 'do' after if condition, got '\\n'");
        assert_eq!(error.position, Position::new(1, 5));

        let error = parse_err("while x print(1)");
        assert_eq!(error.message, "Expected 'do' after while condition, got 'print'");
    }

    #[test]
    fn test_missing_end() {
        let error = parse_err("if x do\n  print(1)\n");
        assert_eq!(
            error.message,
            "Expected 'end' to close if block, got 'end of input'"
        );
        let error = parse_err("fn f() do\n  return 1\n");
        assert_eq!(
            error.message,
            "Expected 'end' to close function body, got 'end of input'"
        );
        let error = parse_err("while true do\n");
        assert_eq!(
            error.message,
            "Expected 'end' to close while block, got 'end of input'"
        );
    }

    #[test]
    fn test_two_statements_on_one_line() {
        let error = parse_err("let x = 1 let y = 2");
        assert_eq!(error.message, "Expected newline after statement, got 'let'");
        assert_eq!(error.position, Position::new(1, 11));
    }

    #[test]
    fn test_unexpected_token() {
        let error = parse_err("let x = * 2");
        assert_eq!(error.message, "Unexpected token '*'");
        assert_eq!(error.position, Position::new(1, 9));

        let error = parse_err("end");
        assert_eq!(error.message, "Unexpected token 'end'");
    }

    #[test]
    fn test_trailing_comma_rejected() {
        let error = parse_err("[1, 2,]");
        assert_eq!(error.message, "Unexpected token ']'");
    }

    #[test]
    fn test_unclosed_group() {
        let error = parse_err("(1 + 2");
        assert_eq!(error.message, "Expected ')' after expression, got '\\n'");
    }

    #[test]
    fn test_token_stream_without_eof() {
        let mut tokens = tokenize("x").unwrap();
        tokens.retain(|token| !token.is(TokenKind::Eof));
        let program = parse(tokens).unwrap();
        assert_eq!(program.statements.len(), 1);
    }
}
