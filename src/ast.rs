use std::fmt;
use std::rc::Rc;

use crate::diagnostic::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessEq => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEq => ">=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Neg => f.write_str("-"),
            UnaryOp::Not => f.write_str("not"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub position: Position,
}

impl Expr {
    pub fn new(kind: ExprKind, position: Position) -> Self {
        Self { kind, position }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Number(f64),
    String(Rc<str>),
    Bool(bool),
    Nil,
    List(Vec<Expr>),
    Identifier(Rc<str>),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub position: Position,
}

impl Stmt {
    pub fn new(kind: StmtKind, position: Position) -> Self {
        Self { kind, position }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Let {
        name: Rc<str>,
        value: Expr,
    },
    /// `let name[index] = value`
    IndexAssign {
        target: Rc<str>,
        index: Expr,
        value: Expr,
    },
    If {
        condition: Expr,
        then_body: Vec<Stmt>,
        elif_clauses: Vec<(Expr, Vec<Stmt>)>,
        else_body: Option<Vec<Stmt>>,
    },
    While {
        condition: Expr,
        body: Vec<Stmt>,
    },
    /// Bodies are shared with every closure created from the declaration.
    Function {
        name: Rc<str>,
        params: Rc<[Rc<str>]>,
        body: Rc<[Stmt]>,
    },
    Return(Option<Expr>),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Stmt>,
    pub position: Position,
}

/// Indented tree dump used by `--ast`.
pub fn dump_program(program: &Program) -> String {
    let mut out = String::from("Program\n");
    for stmt in &program.statements {
        dump_stmt(stmt, 1, &mut out);
    }
    out
}

fn line(out: &mut String, depth: usize, text: impl fmt::Display) {
    out.push_str(&"  ".repeat(depth));
    out.push_str(&text.to_string());
    out.push('\n');
}

fn dump_block(label: &str, body: &[Stmt], depth: usize, out: &mut String) {
    line(out, depth, label);
    for stmt in body {
        dump_stmt(stmt, depth + 1, out);
    }
}

fn dump_stmt(stmt: &Stmt, depth: usize, out: &mut String) {
    match &stmt.kind {
        StmtKind::Let { name, value } => {
            line(out, depth, format_args!("Let {}", name));
            dump_expr(value, depth + 1, out);
        }
        StmtKind::IndexAssign {
            target,
            index,
            value,
        } => {
            line(out, depth, format_args!("IndexAssign {}", target));
            dump_expr(index, depth + 1, out);
            dump_expr(value, depth + 1, out);
        }
        StmtKind::If {
            condition,
            then_body,
            elif_clauses,
            else_body,
        } => {
            line(out, depth, "If");
            dump_expr(condition, depth + 1, out);
            dump_block("Then", then_body, depth + 1, out);
            for (elif_condition, body) in elif_clauses {
                line(out, depth + 1, "Elif");
                dump_expr(elif_condition, depth + 2, out);
                dump_block("Then", body, depth + 2, out);
            }
            if let Some(body) = else_body {
                dump_block("Else", body, depth + 1, out);
            }
        }
        StmtKind::While { condition, body } => {
            line(out, depth, "While");
            dump_expr(condition, depth + 1, out);
            dump_block("Body", body, depth + 1, out);
        }
        StmtKind::Function { name, params, body } => {
            let params: Vec<&str> = params.iter().map(|p| p.as_ref()).collect();
            line(
                out,
                depth,
                format_args!("Function {}({})", name, params.join(", ")),
            );
            for stmt in body.iter() {
                dump_stmt(stmt, depth + 1, out);
            }
        }
        StmtKind::Return(value) => {
            line(out, depth, "Return");
            if let Some(value) = value {
                dump_expr(value, depth + 1, out);
            }
        }
        StmtKind::Expr(expr) => {
            line(out, depth, "ExprStmt");
            dump_expr(expr, depth + 1, out);
        }
    }
}

fn dump_expr(expr: &Expr, depth: usize, out: &mut String) {
    match &expr.kind {
        ExprKind::Number(n) => line(out, depth, format_args!("Number {}", n)),
        ExprKind::String(s) => line(out, depth, format_args!("String {:?}", s)),
        ExprKind::Bool(b) => line(out, depth, format_args!("Bool {}", b)),
        ExprKind::Nil => line(out, depth, "Nil"),
        ExprKind::Identifier(name) => line(out, depth, format_args!("Identifier {}", name)),
        ExprKind::List(elements) => {
            line(out, depth, "List");
            for element in elements {
                dump_expr(element, depth + 1, out);
            }
        }
        ExprKind::Unary { op, operand } => {
            line(out, depth, format_args!("Unary {}", op));
            dump_expr(operand, depth + 1, out);
        }
        ExprKind::Binary { left, op, right } => {
            line(out, depth, format_args!("Binary {}", op));
            dump_expr(left, depth + 1, out);
            dump_expr(right, depth + 1, out);
        }
        ExprKind::Call { callee, args } => {
            line(out, depth, "Call");
            dump_expr(callee, depth + 1, out);
            for arg in args {
                dump_expr(arg, depth + 1, out);
            }
        }
        ExprKind::Index { object, index } => {
            line(out, depth, "Index");
            dump_expr(object, depth + 1, out);
            dump_expr(index, depth + 1, out);
        }
    }
}
