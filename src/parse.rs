use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, anychar, char, multispace0},
    combinator::{all_consuming, consumed, map, not, recognize, value, verify},
    multi::{fold_many0, many0, many0_count, separated_list0, separated_list1},
    number::complete::double,
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

use crate::typ::{Block, Cmd, Expr, ExprKind, Op, ProcDef, Stmt, StmtKind};
use std::rc::Rc;

pub type Span<'a> = nom_locate::LocatedSpan<&'a str>;

/// Owned parse failure with a 1-based source position.
#[derive(Clone, Debug, thiserror::Error, PartialEq)]
#[error("syntax error at {line}:{column}")]
pub struct ParseError {
    pub line: u32,
    pub column: usize,
    pub offset: usize,
}

impl ParseError {
    pub(crate) fn from_nom(e: &nom::error::Error<Span<'_>>) -> Self {
        ParseError {
            line: e.input.location_line(),
            column: e.input.get_utf8_column(),
            offset: e.input.location_offset(),
        }
    }
}

/// Keywords never parse as identifiers; this is what keeps `main`,
/// command names and loop heads unambiguous.
const RESERVED: &[&str] = &[
    "for", "in", "range", "if", "while", "def", "main", "REPEAT", "FD", "BK", "RT", "LT", "PU",
    "PD", "WIDTH", "SET", "and", "or",
];

fn ws<'a, F: 'a, O>(inner: F) -> impl FnMut(Span<'a>) -> IResult<Span<'a>, O>
where
    F: FnMut(Span<'a>) -> IResult<Span<'a>, O>,
{
    delimited(multispace0, inner, multispace0)
}

fn with_span<'a, F: 'a>(inner: F) -> impl FnMut(Span<'a>) -> IResult<Span<'a>, Expr>
where
    F: FnMut(Span<'a>) -> IResult<Span<'a>, ExprKind>,
{
    map(consumed(inner), |(input, kind)| Expr {
        e: kind,
        span: input.into(),
    })
}

fn with_stmt<'a, F: 'a>(inner: F) -> impl FnMut(Span<'a>) -> IResult<Span<'a>, Stmt>
where
    F: FnMut(Span<'a>) -> IResult<Span<'a>, StmtKind>,
{
    map(consumed(inner), |(input, kind)| Stmt {
        s: kind,
        span: input.into(),
    })
}

fn ident_char(c: &char) -> bool {
    c.is_alphanumeric() || *c == '_'
}

/// Matches `kw` as a whole word: `FDX` is an identifier, not `FD`.
fn keyword<'a>(kw: &'static str) -> impl FnMut(Span<'a>) -> IResult<Span<'a>, Span<'a>> {
    ws(terminated(tag(kw), not(verify(anychar, ident_char))))
}

fn sym<'a>(ch: char) -> impl FnMut(Span<'a>) -> IResult<Span<'a>, char> {
    ws(char(ch))
}

fn ident(input: Span) -> IResult<Span, String> {
    verify(
        map(
            recognize(pair(
                alt((alpha1, tag("_"))),
                many0_count(alt((alphanumeric1, tag("_")))),
            )),
            |s: Span| s.fragment().to_string(),
        ),
        |s: &String| !RESERVED.contains(&s.as_str()),
    )(input)
}

fn ident_tok(input: Span) -> IResult<Span, String> {
    ws(ident)(input)
}

/// A numeric literal. `double` accepts the spellings `inf`, `infinity`
/// and `nan`; those stay identifiers here, so the literal must not
/// start with a letter once any sign is stripped. The trailing boundary
/// check stops `double` from eating the head of an identifier like
/// `infinity2`.
fn num_lit(input: Span) -> IResult<Span, f64> {
    map(
        terminated(
            verify(consumed(double), |(lit, _): &(Span, f64)| {
                let digits = lit.fragment().trim_start_matches(|c| c == '+' || c == '-');
                !digits.starts_with(|c: char| c.is_alphabetic())
            }),
            not(verify(anychar, ident_char)),
        ),
        |(_, x)| x,
    )(input)
}

fn num(input: Span) -> IResult<Span, Expr> {
    ws(with_span(map(num_lit, ExprKind::Num)))(input)
}

fn var(input: Span) -> IResult<Span, Expr> {
    ws(with_span(map(ident, ExprKind::Var)))(input)
}

fn bang(input: Span) -> IResult<Span, Expr> {
    ws(with_span(map(preceded(char('!'), atom), |e| {
        ExprKind::Not(Box::new(e))
    })))(input)
}

fn paren(input: Span) -> IResult<Span, Expr> {
    delimited(sym('('), condition, sym(')'))(input)
}

fn atom(input: Span) -> IResult<Span, Expr> {
    alt((paren, num, bang, var))(input)
}

fn arith_op(input: Span) -> IResult<Span, Op> {
    ws(alt((
        value(Op::Add, char('+')),
        value(Op::Sub, char('-')),
        value(Op::Mul, char('*')),
        value(Op::Div, char('/')),
        value(Op::Mod, char('%')),
    )))(input)
}

fn logical_op(input: Span) -> IResult<Span, Op> {
    alt((
        value(Op::And, keyword("and")),
        value(Op::Or, keyword("or")),
        value(Op::Eq, ws(tag("=="))),
        value(Op::Ne, ws(tag("!="))),
        value(Op::Ge, ws(tag(">="))),
        value(Op::Le, ws(tag("<="))),
        value(Op::Gt, ws(char('>'))),
        value(Op::Lt, ws(char('<'))),
    ))(input)
}

fn bin(lhs: Expr, op: Op, rhs: Expr) -> Expr {
    let span = lhs.span.union(rhs.span);
    Expr {
        e: ExprKind::Bin(op, Box::new(lhs), Box::new(rhs)),
        span,
    }
}

/// Arithmetic chains fold left to right with no precedence: `2 + 3 * 4`
/// is `(2 + 3) * 4`, matching the flat repetition in the grammar.
pub fn expr(input: Span) -> IResult<Span, Expr> {
    let (input, init) = atom(input)?;
    fold_many0(
        pair(arith_op, atom),
        move || init.clone(),
        |lhs, (op, rhs)| bin(lhs, op, rhs),
    )(input)
}

/// A condition is an expression chain joined by logical/relational
/// operators, folded left to right the same way: `a < b and c` is
/// `(a < b) and c`.
pub fn condition(input: Span) -> IResult<Span, Expr> {
    let (input, init) = expr(input)?;
    fold_many0(
        pair(logical_op, expr),
        move || init.clone(),
        |lhs, (op, rhs)| bin(lhs, op, rhs),
    )(input)
}

fn block(input: Span) -> IResult<Span, Block> {
    map(
        delimited(sym('{'), many0(statement), sym('}')),
        |statements| Block { statements },
    )(input)
}

fn for_loop(input: Span) -> IResult<Span, Stmt> {
    with_stmt(map(
        tuple((
            keyword("for"),
            ident_tok,
            keyword("in"),
            keyword("range"),
            delimited(
                sym('('),
                verify(separated_list1(sym(','), expr), |args: &Vec<Expr>| {
                    args.len() <= 3
                }),
                sym(')'),
            ),
            block,
        )),
        |(_, var, _, _, range, body)| StmtKind::For { var, range, body },
    ))(input)
}

fn repeat_stmt(input: Span) -> IResult<Span, Stmt> {
    with_stmt(map(
        preceded(keyword("REPEAT"), pair(expr, block)),
        |(count, body)| StmtKind::Repeat { count, body },
    ))(input)
}

fn if_stmt(input: Span) -> IResult<Span, Stmt> {
    with_stmt(map(
        preceded(keyword("if"), pair(condition, block)),
        |(cond, body)| StmtKind::If { cond, body },
    ))(input)
}

fn while_stmt(input: Span) -> IResult<Span, Stmt> {
    with_stmt(map(
        preceded(keyword("while"), pair(condition, block)),
        |(cond, body)| StmtKind::While { cond, body },
    ))(input)
}

fn func_def(input: Span) -> IResult<Span, Stmt> {
    with_stmt(map(
        preceded(
            keyword("def"),
            tuple((
                ident_tok,
                delimited(sym('('), separated_list0(sym(','), ident_tok), sym(')')),
                block,
            )),
        ),
        |(name, params, body)| StmtKind::Def(Rc::new(ProcDef { name, params, body })),
    ))(input)
}

fn func_call(input: Span) -> IResult<Span, Stmt> {
    with_stmt(map(
        pair(
            ident_tok,
            delimited(sym('('), separated_list0(sym(','), expr), sym(')')),
        ),
        |(name, args)| StmtKind::Call { name, args },
    ))(input)
}

fn main_block(input: Span) -> IResult<Span, Stmt> {
    with_stmt(map(preceded(keyword("main"), block), StmtKind::Main))(input)
}

fn assign(input: Span) -> IResult<Span, Stmt> {
    with_stmt(map(
        preceded(keyword("SET"), tuple((ident_tok, sym('='), expr))),
        |(var, _, expr)| StmtKind::Set { var, expr },
    ))(input)
}

fn command(input: Span) -> IResult<Span, Stmt> {
    with_stmt(map(
        alt((
            map(preceded(keyword("FD"), expr), Cmd::Forward),
            map(preceded(keyword("BK"), expr), Cmd::Back),
            map(preceded(keyword("RT"), expr), Cmd::Right),
            map(preceded(keyword("LT"), expr), Cmd::Left),
            value(Cmd::PenUp, keyword("PU")),
            value(Cmd::PenDown, keyword("PD")),
            map(preceded(keyword("WIDTH"), expr), Cmd::Width),
        )),
        StmtKind::Cmd,
    ))(input)
}

pub fn statement(input: Span) -> IResult<Span, Stmt> {
    ws(alt((
        for_loop,
        repeat_stmt,
        if_stmt,
        while_stmt,
        func_def,
        main_block,
        assign,
        command,
        func_call,
    )))(input)
}

pub fn program(input: Span) -> IResult<Span, Block> {
    all_consuming(terminated(
        map(many0(statement), |statements| Block { statements }),
        multispace0,
    ))(input)
}
