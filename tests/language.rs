use hlogo::{EvalError, Program, TurtleCmd};

fn trace(src: &str) -> Vec<TurtleCmd> {
    Program::parse(src).unwrap().trace().unwrap()
}

fn trace_err(src: &str) -> EvalError {
    Program::parse(src).unwrap().trace().unwrap_err()
}

#[test]
fn repeat_inside_main_issues_commands_in_order() {
    let cmds = trace("main { REPEAT 4 { FD 10 RT 90 } }");
    let expected: Vec<TurtleCmd> = (0..4)
        .flat_map(|_| [TurtleCmd::Forward(10.0), TurtleCmd::Right(90.0)])
        .collect();
    assert_eq!(cmds, expected);
}

#[test]
fn range_upper_bound_is_excluded() {
    let cmds = trace("for i in range(0, 5) { FD i }");
    let expected: Vec<TurtleCmd> = (0..5).map(|i| TurtleCmd::Forward(i as f64)).collect();
    assert_eq!(cmds, expected);
}

#[test]
fn range_honors_a_descending_step() {
    let cmds = trace("for i in range(10, 0, 0 - 2) { FD i }");
    let expected: Vec<TurtleCmd> = [10.0, 8.0, 6.0, 4.0, 2.0]
        .into_iter()
        .map(TurtleCmd::Forward)
        .collect();
    assert_eq!(cmds, expected);
}

#[test]
fn single_argument_range_starts_at_zero() {
    let cmds = trace("for i in range(3) { FD i }");
    assert_eq!(
        cmds,
        vec![
            TurtleCmd::Forward(0.0),
            TurtleCmd::Forward(1.0),
            TurtleCmd::Forward(2.0)
        ]
    );
}

#[test]
fn if_runs_the_body_only_when_truthy() {
    assert_eq!(trace("if 3 > 2 { FD 5 }"), vec![TurtleCmd::Forward(5.0)]);
    assert_eq!(trace("if 2 > 3 { FD 5 }"), vec![]);
}

#[test]
fn a_lifted_pen_is_lowered_by_the_next_move() {
    assert_eq!(
        trace("PU FD 10"),
        vec![
            TurtleCmd::PenUp,
            TurtleCmd::PenDown,
            TurtleCmd::Forward(10.0)
        ]
    );
}

#[test]
fn procedures_run_their_body_with_bound_parameters() {
    let cmds = trace("def sq(n) { REPEAT 4 { FD n RT 90 } } main { sq(50) }");
    let expected: Vec<TurtleCmd> = (0..4)
        .flat_map(|_| [TurtleCmd::Forward(50.0), TurtleCmd::Right(90.0)])
        .collect();
    assert_eq!(cmds, expected);
}

#[test]
fn call_arguments_are_evaluated_in_the_caller_environment() {
    let cmds = trace("SET d = 7 def go(n) { FD n } main { go(d * 2) }");
    assert_eq!(cmds, vec![TurtleCmd::Forward(14.0)]);
}

#[test]
fn division_by_zero_fails() {
    assert!(matches!(
        trace_err("FD 5 / 0"),
        EvalError::DivisionByZero { .. }
    ));
}

#[test]
fn unbound_variables_fail() {
    assert!(matches!(
        trace_err("FD x"),
        EvalError::UnknownVariable { name, .. } if name == "x"
    ));
}

#[test]
fn calling_before_defining_fails() {
    assert!(matches!(
        trace_err("main { sq(50) } def sq(n) { FD n }"),
        EvalError::UnknownProc { name, .. } if name == "sq"
    ));
}

#[test]
fn wrong_argument_count_fails() {
    assert!(matches!(
        trace_err("def f(a, b) { FD a } main { f(1, 2, 3) }"),
        EvalError::WrongParams {
            expected: 2,
            found: 3,
            ..
        }
    ));
}

#[test]
fn interpretation_is_deterministic() {
    let src = "def sq(n) { REPEAT 4 { FD n RT 90 } } main { sq(50) } for i in range(3) { LT i }";
    let program = Program::parse(src).unwrap();
    assert_eq!(program.trace().unwrap(), program.trace().unwrap());
    // Parsing is deterministic too.
    assert_eq!(Program::parse(src).unwrap(), Program::parse(src).unwrap());
}

#[test]
fn modulo_sign_follows_the_left_operand() {
    assert_eq!(trace("FD 0 - 7 % 3"), vec![TurtleCmd::Forward(-1.0)]);
    assert_eq!(trace("FD 7 % 3"), vec![TurtleCmd::Forward(1.0)]);
}

#[test]
fn division_is_not_truncating() {
    assert_eq!(trace("FD 7 / 2"), vec![TurtleCmd::Forward(3.5)]);
}

#[test]
fn condition_chains_fold_strictly_left_to_right() {
    // `0 or 2 >= 2` folds as `(0 or 2) >= 2`, so the comparison sees a
    // boolean on its left and rejects it.
    assert!(matches!(
        trace_err("if 0 or 2 >= 2 { RT 30 }"),
        EvalError::BadOpArg { .. }
    ));
    // Putting the comparison first keeps every step well-typed.
    assert_eq!(
        trace("if 2 >= 2 or 0 { RT 30 }"),
        vec![TurtleCmd::Right(30.0)]
    );
}

#[test]
fn while_reevaluates_its_condition() {
    let cmds = trace("SET x = 0 while x < 3 { FD x SET x = x + 1 }");
    assert_eq!(
        cmds,
        vec![
            TurtleCmd::Forward(0.0),
            TurtleCmd::Forward(1.0),
            TurtleCmd::Forward(2.0)
        ]
    );
}

#[test]
fn top_level_statements_run_in_document_order() {
    let cmds = trace("FD 1 main { FD 2 } FD 3");
    assert_eq!(
        cmds,
        vec![
            TurtleCmd::Forward(1.0),
            TurtleCmd::Forward(2.0),
            TurtleCmd::Forward(3.0)
        ]
    );
}
