use std::{collections::HashMap, rc::Rc};

/// Byte range into the source text, kept on every node so runtime errors
/// can point back at the offending spot.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn union(&self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl From<crate::parse::Span<'_>> for Span {
    fn from(sp: crate::parse::Span) -> Self {
        Span {
            start: sp.location_offset(),
            end: sp.location_offset() + sp.fragment().len(),
        }
    }
}

/// A value produced by evaluating an expression. Only numbers can be
/// stored in the environment; booleans exist transiently while a
/// condition is being folded.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Value {
    Num(f64),
    Bool(bool),
}

impl Value {
    /// Non-zero numbers and `true` pass a condition.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Num(x) => *x != 0.0,
            Value::Bool(b) => *b,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Num(x) => x.fmt(f),
            Value::Bool(b) => b.fmt(f),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
}

impl Op {
    pub fn name(&self) -> &'static str {
        match self {
            Op::Add => "+",
            Op::Sub => "-",
            Op::Mul => "*",
            Op::Div => "/",
            Op::Mod => "%",
            Op::And => "and",
            Op::Or => "or",
            Op::Lt => "<",
            Op::Gt => ">",
            Op::Le => "<=",
            Op::Ge => ">=",
            Op::Eq => "==",
            Op::Ne => "!=",
        }
    }

    /// Apply the operator to two already-evaluated values.
    ///
    /// `%` has the semantics of Rust's `f64` remainder: the sign of the
    /// result follows the left operand, so `-7 % 3` is `-1`.
    pub fn eval(&self, lhs: Value, rhs: Value, span: Span) -> Result<Value, EvalError> {
        let num = |v: Value| match v {
            Value::Num(x) => Ok(x),
            v => Err(EvalError::BadOpArg { op: *self, val: v, span }),
        };
        Ok(match self {
            Op::Add => Value::Num(num(lhs)? + num(rhs)?),
            Op::Sub => Value::Num(num(lhs)? - num(rhs)?),
            Op::Mul => Value::Num(num(lhs)? * num(rhs)?),
            Op::Div => {
                let (l, r) = (num(lhs)?, num(rhs)?);
                if r == 0.0 {
                    return Err(EvalError::DivisionByZero { span });
                }
                Value::Num(l / r)
            }
            Op::Mod => {
                let (l, r) = (num(lhs)?, num(rhs)?);
                if r == 0.0 {
                    return Err(EvalError::ModuloByZero { span });
                }
                Value::Num(l % r)
            }
            Op::And => Value::Bool(lhs.truthy() && rhs.truthy()),
            Op::Or => Value::Bool(lhs.truthy() || rhs.truthy()),
            Op::Lt => Value::Bool(num(lhs)? < num(rhs)?),
            Op::Gt => Value::Bool(num(lhs)? > num(rhs)?),
            Op::Le => Value::Bool(num(lhs)? <= num(rhs)?),
            Op::Ge => Value::Bool(num(lhs)? >= num(rhs)?),
            Op::Eq => Value::Bool(self.eval_eq(lhs, rhs, span)?),
            Op::Ne => Value::Bool(!self.eval_eq(lhs, rhs, span)?),
        })
    }

    fn eval_eq(&self, lhs: Value, rhs: Value, span: Span) -> Result<bool, EvalError> {
        match (lhs, rhs) {
            (Value::Num(l), Value::Num(r)) => Ok(l == r),
            (Value::Bool(l), Value::Bool(r)) => Ok(l == r),
            (_, r) => Err(EvalError::BadOpArg { op: *self, val: r, span }),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    Num(f64),
    Var(String),
    Not(Box<Expr>),
    Bin(Op, Box<Expr>, Box<Expr>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub e: ExprKind,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    pub statements: Vec<Stmt>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProcDef {
    pub name: String,
    pub params: Vec<String>,
    pub body: Block,
}

/// A turtle primitive as written in the source, argument still
/// unevaluated.
#[derive(Clone, Debug, PartialEq)]
pub enum Cmd {
    Forward(Expr),
    Back(Expr),
    Right(Expr),
    Left(Expr),
    PenUp,
    PenDown,
    Width(Expr),
}

#[derive(Clone, Debug, PartialEq)]
pub enum StmtKind {
    For {
        var: String,
        /// One to three range arguments, enforced by the parser.
        range: Vec<Expr>,
        body: Block,
    },
    Repeat {
        count: Expr,
        body: Block,
    },
    If {
        cond: Expr,
        body: Block,
    },
    While {
        cond: Expr,
        body: Block,
    },
    Def(Rc<ProcDef>),
    Call {
        name: String,
        args: Vec<Expr>,
    },
    Main(Block),
    Cmd(Cmd),
    Set {
        var: String,
        expr: Expr,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Stmt {
    pub s: StmtKind,
    pub span: Span,
}

#[derive(Clone, Debug, thiserror::Error, PartialEq)]
pub enum EvalError {
    #[error("unknown variable \"{name}\"")]
    UnknownVariable { name: String, span: Span },
    #[error("unknown procedure \"{name}\"")]
    UnknownProc { name: String, span: Span },
    #[error("wrong number of inputs to {name} (expected {expected}, found {found})")]
    WrongParams {
        name: String,
        expected: usize,
        found: usize,
        span: Span,
    },
    #[error("division by zero")]
    DivisionByZero { span: Span },
    #[error("modulo by zero")]
    ModuloByZero { span: Span },
    #[error("{} doesn't like {val} as input", .op.name())]
    BadOpArg { op: Op, val: Value, span: Span },
    #[error("{what} doesn't like {val} as input")]
    BadArg { what: String, val: Value, span: Span },
    #[error("range step must not be zero")]
    ZeroStep { span: Span },
}

impl EvalError {
    pub fn span(&self) -> Span {
        match self {
            EvalError::UnknownVariable { span, .. }
            | EvalError::UnknownProc { span, .. }
            | EvalError::WrongParams { span, .. }
            | EvalError::DivisionByZero { span }
            | EvalError::ModuloByZero { span }
            | EvalError::BadOpArg { span, .. }
            | EvalError::BadArg { span, .. }
            | EvalError::ZeroStep { span } => *span,
        }
    }
}

/// The single, flat variable/procedure environment. There is no lexical
/// scoping in the language: loop variables and procedure parameters are
/// ordinary entries, and the last write wins.
#[derive(Default)]
pub struct Env {
    vars: HashMap<String, f64>,
    procs: HashMap<String, Rc<ProcDef>>,
}

impl Env {
    pub fn lookup(&self, name: &str) -> Option<f64> {
        self.vars.get(name).copied()
    }

    pub fn bind(&mut self, name: &str, val: f64) {
        self.vars.insert(name.to_owned(), val);
    }

    pub fn lookup_proc(&self, name: &str) -> Option<Rc<ProcDef>> {
        self.procs.get(name).cloned()
    }

    pub fn def_proc(&mut self, def: Rc<ProcDef>) {
        // Redefinition overwrites the previous entry.
        self.procs.insert(def.name.clone(), def);
    }
}

impl Expr {
    pub fn eval(&self, env: &Env) -> Result<Value, EvalError> {
        match &self.e {
            ExprKind::Num(x) => Ok(Value::Num(*x)),
            ExprKind::Var(name) => {
                env.lookup(name)
                    .map(Value::Num)
                    .ok_or_else(|| EvalError::UnknownVariable {
                        name: name.clone(),
                        span: self.span,
                    })
            }
            ExprKind::Not(e) => Ok(Value::Bool(!e.eval(env)?.truthy())),
            ExprKind::Bin(op, lhs, rhs) => {
                let l = lhs.eval(env)?;
                let r = rhs.eval(env)?;
                op.eval(l, r, self.span)
            }
        }
    }

    /// Evaluate in a context that needs a number (command arguments,
    /// range bounds, call arguments, assignments). `what` names that
    /// context for the error message.
    pub fn eval_num(&self, env: &Env, what: &str) -> Result<f64, EvalError> {
        match self.eval(env)? {
            Value::Num(x) => Ok(x),
            v => Err(EvalError::BadArg {
                what: what.to_owned(),
                val: v,
                span: self.span,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sp() -> Span {
        Span { start: 0, end: 0 }
    }

    fn num(x: f64) -> Expr {
        Expr {
            e: ExprKind::Num(x),
            span: sp(),
        }
    }

    fn bin(op: Op, lhs: Expr, rhs: Expr) -> Expr {
        Expr {
            e: ExprKind::Bin(op, Box::new(lhs), Box::new(rhs)),
            span: sp(),
        }
    }

    #[test]
    fn flat_fold_shape_evaluates_left_to_right() {
        // (2 + 3) * 4, the shape the parser builds for `2 + 3 * 4`.
        let e = bin(Op::Mul, bin(Op::Add, num(2.0), num(3.0)), num(4.0));
        let env = Env::default();
        assert_eq!(e.eval(&env).unwrap(), Value::Num(20.0));
    }

    #[test]
    fn division_by_zero_errors() {
        let env = Env::default();
        let e = bin(Op::Div, num(5.0), num(0.0));
        assert!(matches!(
            e.eval(&env),
            Err(EvalError::DivisionByZero { .. })
        ));
        let e = bin(Op::Mod, num(5.0), num(0.0));
        assert!(matches!(e.eval(&env), Err(EvalError::ModuloByZero { .. })));
    }

    #[test]
    fn modulo_sign_follows_left_operand() {
        let env = Env::default();
        let e = bin(Op::Mod, num(-7.0), num(3.0));
        assert_eq!(e.eval(&env).unwrap(), Value::Num(-1.0));
        let e = bin(Op::Mod, num(7.0), num(-3.0));
        assert_eq!(e.eval(&env).unwrap(), Value::Num(1.0));
    }

    #[test]
    fn logical_ops_use_truthiness() {
        let env = Env::default();
        let e = bin(Op::And, num(1.0), num(0.0));
        assert_eq!(e.eval(&env).unwrap(), Value::Bool(false));
        let e = bin(Op::Or, num(0.0), num(2.0));
        assert_eq!(e.eval(&env).unwrap(), Value::Bool(true));
        // (1 < 2) and 5: the comparison result feeds the fold as a bool.
        let e = bin(Op::And, bin(Op::Lt, num(1.0), num(2.0)), num(5.0));
        assert_eq!(e.eval(&env).unwrap(), Value::Bool(true));
    }

    #[test]
    fn relational_ops_reject_booleans() {
        let env = Env::default();
        let t = Expr {
            e: ExprKind::Not(Box::new(num(1.0))),
            span: sp(),
        };
        let e = bin(Op::Lt, t, num(1.0));
        assert!(matches!(e.eval(&env), Err(EvalError::BadOpArg { .. })));
    }

    #[test]
    fn unknown_variable_is_an_error() {
        let env = Env::default();
        let e = Expr {
            e: ExprKind::Var("x".to_owned()),
            span: sp(),
        };
        assert!(matches!(
            e.eval(&env),
            Err(EvalError::UnknownVariable { .. })
        ));
    }

    #[test]
    fn bindings_overwrite() {
        let mut env = Env::default();
        env.bind("i", 1.0);
        env.bind("i", 2.0);
        assert_eq!(env.lookup("i"), Some(2.0));
    }
}
