//! Parser and evaluator for a small brace-structured LOGO dialect.
//!
//! Programs are sequences of statements: turtle commands (`FD`, `BK`,
//! `RT`, `LT`, `PU`, `PD`, `WIDTH`), bounded `for`/`REPEAT` loops,
//! `if`/`while` over flat left-to-right condition chains, `def`-ined
//! procedures, `SET` assignments and a `main` block:
//!
//! ```text
//! def sq(n) {
//!     REPEAT 4 { FD n RT 90 }
//! }
//! main { sq(50) }
//! ```
//!
//! Evaluation walks the owned syntax tree against a single flat
//! variable/procedure environment and emits primitives to a [`Turtle`]
//! device; rendering is out of scope.

pub mod exec;
pub mod parse;
pub mod typ;

pub use exec::{Interp, Turtle, TurtleCmd};
pub use parse::ParseError;
pub use typ::{Env, EvalError, Expr, Value};

use typ::Block;

/// A parsed program, ready to run any number of times.
#[derive(Clone, Debug, PartialEq)]
pub struct Program {
    code: Block,
}

impl Program {
    pub fn parse(s: &str) -> Result<Program, ParseError> {
        match parse::program(s.into()) {
            Ok((_, code)) => Ok(Program { code }),
            Err(nom::Err::Error(e) | nom::Err::Failure(e)) => Err(ParseError::from_nom(&e)),
            Err(nom::Err::Incomplete(_)) => Err(ParseError {
                line: 1,
                column: 1,
                offset: 0,
            }),
        }
    }

    /// Execute against a turtle device. Each run gets a fresh
    /// environment, so running the same program twice produces the same
    /// command sequence.
    pub fn run(&self, turtle: &mut dyn Turtle) -> Result<(), EvalError> {
        Interp::new(turtle).exec_block(&self.code)
    }

    /// Execute against a recording device and return the command trace.
    pub fn trace(&self) -> Result<Vec<TurtleCmd>, EvalError> {
        let mut cmds = Vec::new();
        self.run(&mut cmds)?;
        Ok(cmds)
    }
}
