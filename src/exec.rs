use crate::typ::{Block, Cmd, Env, EvalError, Expr, Span, Stmt, StmtKind, Value};

/// A turtle primitive with its argument already evaluated. This is what
/// a recording device stores and what the CLI prints.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum TurtleCmd {
    Forward(f64),
    Back(f64),
    Right(f64),
    Left(f64),
    PenUp,
    PenDown,
    Width(f64),
}

impl std::fmt::Display for TurtleCmd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TurtleCmd::Forward(d) => write!(f, "forward {d}"),
            TurtleCmd::Back(d) => write!(f, "back {d}"),
            TurtleCmd::Right(a) => write!(f, "right {a}"),
            TurtleCmd::Left(a) => write!(f, "left {a}"),
            TurtleCmd::PenUp => f.write_str("penup"),
            TurtleCmd::PenDown => f.write_str("pendown"),
            TurtleCmd::Width(w) => write!(f, "width {w}"),
        }
    }
}

/// The device boundary. The interpreter can drive anything with this
/// capability set; rendering is somebody else's problem.
pub trait Turtle {
    fn forward(&mut self, distance: f64);
    fn backward(&mut self, distance: f64);
    fn turn_right(&mut self, degrees: f64);
    fn turn_left(&mut self, degrees: f64);
    fn pen_up(&mut self);
    fn pen_down(&mut self);
    fn set_width(&mut self, width: f64);
}

/// A `Vec` of commands is the recording double.
impl Turtle for Vec<TurtleCmd> {
    fn forward(&mut self, distance: f64) {
        self.push(TurtleCmd::Forward(distance));
    }
    fn backward(&mut self, distance: f64) {
        self.push(TurtleCmd::Back(distance));
    }
    fn turn_right(&mut self, degrees: f64) {
        self.push(TurtleCmd::Right(degrees));
    }
    fn turn_left(&mut self, degrees: f64) {
        self.push(TurtleCmd::Left(degrees));
    }
    fn pen_up(&mut self) {
        self.push(TurtleCmd::PenUp);
    }
    fn pen_down(&mut self) {
        self.push(TurtleCmd::PenDown);
    }
    fn set_width(&mut self, width: f64) {
        self.push(TurtleCmd::Width(width));
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Pen {
    Up,
    Down,
}

/// Tree-walking statement executor. Owns the single environment and the
/// pen state; borrows the device for the duration of a run. Not meant to
/// be shared across threads.
pub struct Interp<'t> {
    env: Env,
    turtle: &'t mut dyn Turtle,
    pen: Pen,
}

impl<'t> Interp<'t> {
    pub fn new(turtle: &'t mut dyn Turtle) -> Self {
        Interp {
            env: Env::default(),
            turtle,
            // The pen starts on the paper.
            pen: Pen::Down,
        }
    }

    pub fn exec_block(&mut self, block: &Block) -> Result<(), EvalError> {
        for stmt in &block.statements {
            self.exec_stmt(stmt)?;
        }
        Ok(())
    }

    fn exec_stmt(&mut self, stmt: &Stmt) -> Result<(), EvalError> {
        match &stmt.s {
            StmtKind::For { var, range, body } => self.exec_for(var, range, body, stmt.span),
            StmtKind::Repeat { count, body } => {
                let n = count.eval_num(&self.env, "REPEAT")?;
                if n < 0.0 || n.trunc() != n {
                    return Err(EvalError::BadArg {
                        what: "REPEAT".to_owned(),
                        val: Value::Num(n),
                        span: count.span,
                    });
                }
                for _ in 0..n as u64 {
                    self.exec_block(body)?;
                }
                Ok(())
            }
            StmtKind::If { cond, body } => {
                if cond.eval(&self.env)?.truthy() {
                    self.exec_block(body)?;
                }
                Ok(())
            }
            StmtKind::While { cond, body } => {
                // An always-true condition loops forever; the language
                // imposes no iteration cap.
                while cond.eval(&self.env)?.truthy() {
                    self.exec_block(body)?;
                }
                Ok(())
            }
            StmtKind::Def(def) => {
                self.env.def_proc(def.clone());
                Ok(())
            }
            StmtKind::Call { name, args } => self.exec_call(name, args, stmt.span),
            StmtKind::Main(body) => self.exec_block(body),
            StmtKind::Cmd(cmd) => self.exec_cmd(cmd),
            StmtKind::Set { var, expr } => {
                let val = expr.eval_num(&self.env, "SET")?;
                self.env.bind(var, val);
                Ok(())
            }
        }
    }

    fn exec_for(
        &mut self,
        var: &str,
        range: &[Expr],
        body: &Block,
        span: Span,
    ) -> Result<(), EvalError> {
        let mut bounds = [0i64; 3];
        for (slot, expr) in bounds.iter_mut().zip(range) {
            *slot = expr.eval_num(&self.env, "range")? as i64;
        }
        // The parser guarantees one to three arguments.
        let (start, end, step) = match range.len() {
            1 => (0, bounds[0], 1),
            2 => (bounds[0], bounds[1], 1),
            _ => (bounds[0], bounds[1], bounds[2]),
        };
        if step == 0 {
            return Err(EvalError::ZeroStep { span });
        }
        // Half-open: the end bound is excluded in either direction.
        let mut i = start;
        while (step > 0 && i < end) || (step < 0 && i > end) {
            self.env.bind(var, i as f64);
            self.exec_block(body)?;
            i += step;
        }
        Ok(())
    }

    fn exec_call(&mut self, name: &str, args: &[Expr], span: Span) -> Result<(), EvalError> {
        let proc = self
            .env
            .lookup_proc(name)
            .ok_or_else(|| EvalError::UnknownProc {
                name: name.to_owned(),
                span,
            })?;
        if args.len() != proc.params.len() {
            return Err(EvalError::WrongParams {
                name: name.to_owned(),
                expected: proc.params.len(),
                found: args.len(),
                span,
            });
        }
        // Arguments are evaluated in the caller's environment before any
        // parameter is bound.
        let mut vals = Vec::with_capacity(args.len());
        for arg in args {
            vals.push(arg.eval_num(&self.env, name)?);
        }
        // Parameters land in the single flat environment, shadowing any
        // same-named variable destructively. They keep their last value
        // after the call returns.
        for (param, val) in proc.params.iter().zip(vals) {
            self.env.bind(param, val);
        }
        self.exec_block(&proc.body)
    }

    fn exec_cmd(&mut self, cmd: &Cmd) -> Result<(), EvalError> {
        match cmd {
            Cmd::Forward(e) => {
                let d = e.eval_num(&self.env, "FD")?;
                self.draw_pen_down();
                self.turtle.forward(d);
            }
            Cmd::Back(e) => {
                let d = e.eval_num(&self.env, "BK")?;
                self.draw_pen_down();
                self.turtle.backward(d);
            }
            Cmd::Right(e) => {
                let a = e.eval_num(&self.env, "RT")?;
                self.turtle.turn_right(a);
            }
            Cmd::Left(e) => {
                let a = e.eval_num(&self.env, "LT")?;
                self.turtle.turn_left(a);
            }
            Cmd::PenUp => {
                self.turtle.pen_up();
                self.pen = Pen::Up;
            }
            Cmd::PenDown => {
                self.turtle.pen_down();
                self.pen = Pen::Down;
            }
            Cmd::Width(e) => {
                let w = e.eval_num(&self.env, "WIDTH")?;
                self.turtle.set_width(w);
            }
        }
        Ok(())
    }

    /// FD and BK draw: a pen lifted by PU is lowered again before the
    /// move, so PU only affects turns and width changes until the next
    /// draw. A `pendown` is only issued when the pen is actually up.
    fn draw_pen_down(&mut self) {
        if self.pen == Pen::Up {
            self.turtle.pen_down();
            self.pen = Pen::Down;
        }
    }
}
