use std::path::Path;

use hlogo::{EvalError, Program, TurtleCmd};

#[derive(Default, Clone)]
pub struct TestCase {
    input: String,
    expected: String,
}

fn trace_one(s: &str) -> Result<Vec<TurtleCmd>, EvalError> {
    Program::parse(s).unwrap().trace()
}

impl TestCase {
    /// Both sides are programs; their command traces must match.
    fn exec(&self) {
        let a = trace_one(&self.input).unwrap();
        let b = trace_one(&self.expected).unwrap();
        assert_eq!(a, b, "program: {}", self.input);
    }

    /// The input parses but fails at runtime with the expected message.
    fn exec_failure(&self) {
        let err = trace_one(&self.input).unwrap_err();
        assert_eq!(err.to_string(), self.expected.trim(), "program: {}", self.input);
    }
}

pub fn read_tests(path: impl AsRef<Path>) -> Vec<TestCase> {
    let text = std::fs::read_to_string(path).unwrap();
    let mut ret = Vec::new();
    let mut in_input = true;
    let mut cur = TestCase::default();

    fn separator_line(line: &str, ch: u8) -> bool {
        line.trim().len() >= 2 && line.trim().bytes().all(|c| c == ch)
    }

    for line in text.split_inclusive('\n') {
        if in_input {
            if separator_line(line, b'-') {
                in_input = false;
            } else {
                cur.input += line;
            }
        } else {
            if separator_line(line, b'=') {
                in_input = true;
                ret.push(std::mem::take(&mut cur));
            } else {
                cur.expected += line;
            }
        }
    }
    ret
}

#[test]
fn text_tests() {
    let tests = read_tests("tests/basic.txt");
    for test in tests {
        test.exec();
    }
}

#[test]
fn exec_failures() {
    let tests = read_tests("tests/exec-failures.txt");
    for test in tests {
        test.exec_failure();
    }
}
