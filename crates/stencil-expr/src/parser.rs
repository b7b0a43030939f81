//! A `nom`-based recursive-descent parser for the embedded expression sublanguage.
use crate::ast::{BinaryOp, Expr, ForTarget, Literal, UnaryOp};
use crate::error::ExprParseError;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{escaped_transform, tag, take_while, take_while1},
    character::complete::{char, multispace0, none_of},
    combinator::{cut, map, recognize, value},
    multi::{many0, separated_list0},
    number::complete::double,
    sequence::{delimited, pair, preceded, terminated},
};

pub fn parse_expr(input: &str) -> Result<Expr, ExprParseError> {
    match ws(or_expr).parse(input.trim()) {
        Ok(("", expr)) => Ok(expr),
        Ok((rem, _)) => Err(ExprParseError::new(format!(
            "unexpected trailing input: '{rem}'"
        ))),
        Err(e) => Err(ExprParseError::new(format!("{e}"))),
    }
}

/// Parses the body of a `set IDENT = EXPR` statement.
pub fn parse_assignment(input: &str) -> Result<(String, Expr), ExprParseError> {
    let parser = (ws(identifier), ws(char('=')), ws(or_expr));
    match parser.parse(input.trim()) {
        Ok(("", (name, _, expr))) => Ok((name.to_string(), expr)),
        Ok((rem, _)) => Err(ExprParseError::new(format!(
            "unexpected trailing input in assignment: '{rem}'"
        ))),
        Err(e) => Err(ExprParseError::new(format!("{e}"))),
    }
}

/// Parses the target of a `for TARGET in EXPR` header, returning the target
/// and the remaining (un-parsed) iterable expression text.
pub fn parse_for_header(input: &str) -> Result<(ForTarget, Expr), ExprParseError> {
    let target_parser = alt((
        map((ws(identifier), ws(char(',')), ws(identifier)), |(k, _, v)| {
            ForTarget::Pair(k.to_string(), v.to_string())
        }),
        map(ws(identifier), |n| ForTarget::Single(n.to_string())),
    ));
    let mut full = (target_parser, ws(tag("in")), ws(or_expr));
    match full.parse(input.trim()) {
        Ok(("", (target, _, iter_expr))) => Ok((target, iter_expr)),
        Ok((rem, _)) => Err(ExprParseError::new(format!(
            "unexpected trailing input in for-header: '{rem}'"
        ))),
        Err(e) => Err(ExprParseError::new(format!("{e}"))),
    }
}

fn ws<'a, F, O, E>(inner: F) -> impl Parser<&'a str, Output = O, Error = E>
where
    F: Parser<&'a str, Output = O, Error = E>,
    E: nom::error::ParseError<&'a str>,
{
    delimited(multispace0, inner, multispace0)
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((nom::character::complete::alpha1, tag("_"))),
        take_while(|c: char| c.is_alphanumeric() || c == '_'),
    ))
    .parse(input)
}

// --- Precedence climbing, lowest to highest ---

fn or_expr(input: &str) -> IResult<&str, Expr> {
    let (input, first) = and_expr(input)?;
    let (input, rest) = many0(preceded(ws(tag("or")), and_expr)).parse(input)?;
    Ok((input, fold_binary(first, BinaryOp::Or, rest)))
}

fn and_expr(input: &str) -> IResult<&str, Expr> {
    let (input, first) = not_expr(input)?;
    let (input, rest) = many0(preceded(ws(tag("and")), not_expr)).parse(input)?;
    Ok((input, fold_binary(first, BinaryOp::And, rest)))
}

fn not_expr(input: &str) -> IResult<&str, Expr> {
    alt((
        map(preceded(ws(tag("not")), cmp_expr), |e| Expr::Unary {
            op: UnaryOp::Not,
            expr: Box::new(e),
        }),
        cmp_expr,
    ))
    .parse(input)
}

fn cmp_expr(input: &str) -> IResult<&str, Expr> {
    let (input, first) = add_expr(input)?;
    let (input, rest) = many0(pair(
        ws(alt((
            value(BinaryOp::Eq, tag("==")),
            value(BinaryOp::Ne, tag("!=")),
            value(BinaryOp::Le, tag("<=")),
            value(BinaryOp::Ge, tag(">=")),
            value(BinaryOp::Lt, tag("<")),
            value(BinaryOp::Gt, tag(">")),
        ))),
        add_expr,
    ))
    .parse(input)?;
    Ok((input, fold_binary_ops(first, rest)))
}

fn add_expr(input: &str) -> IResult<&str, Expr> {
    let (input, first) = mul_expr(input)?;
    let (input, rest) = many0(pair(
        ws(alt((
            value(BinaryOp::Add, tag("+")),
            value(BinaryOp::Sub, tag("-")),
        ))),
        mul_expr,
    ))
    .parse(input)?;
    Ok((input, fold_binary_ops(first, rest)))
}

fn mul_expr(input: &str) -> IResult<&str, Expr> {
    let (input, first) = unary_expr(input)?;
    let (input, rest) = many0(pair(
        ws(alt((
            value(BinaryOp::Mul, tag("*")),
            value(BinaryOp::Div, tag("/")),
            value(BinaryOp::Mod, tag("%")),
        ))),
        unary_expr,
    ))
    .parse(input)?;
    Ok((input, fold_binary_ops(first, rest)))
}

fn unary_expr(input: &str) -> IResult<&str, Expr> {
    alt((
        map(preceded(ws(char('-')), unary_expr), |e| Expr::Unary {
            op: UnaryOp::Neg,
            expr: Box::new(e),
        }),
        map(preceded(ws(char('!')), unary_expr), |e| Expr::Unary {
            op: UnaryOp::Not,
            expr: Box::new(e),
        }),
        postfix_expr,
    ))
    .parse(input)
}

fn postfix_expr(input: &str) -> IResult<&str, Expr> {
    let (input, base) = primary_expr(input)?;
    let (input, ops) = many0(alt((
        map(preceded(ws(char('.')), identifier), |n| PostfixOp::Attr(n.to_string())),
        map(
            delimited(ws(char('[')), cut(or_expr), ws(char(']'))),
            PostfixOp::Index,
        ),
        map(
            delimited(
                ws(char('(')),
                separated_list0(ws(char(',')), or_expr),
                ws(char(')')),
            ),
            PostfixOp::Call,
        ),
    )))
    .parse(input)?;
    Ok((input, ops.into_iter().fold(base, apply_postfix)))
}

enum PostfixOp {
    Attr(String),
    Index(Expr),
    Call(Vec<Expr>),
}

fn apply_postfix(base: Expr, op: PostfixOp) -> Expr {
    match op {
        PostfixOp::Attr(name) => Expr::Attr { base: Box::new(base), name },
        PostfixOp::Index(idx) => Expr::Index { base: Box::new(base), index: Box::new(idx) },
        PostfixOp::Call(args) => Expr::Call { callee: Box::new(base), args },
    }
}

fn primary_expr(input: &str) -> IResult<&str, Expr> {
    ws(alt((
        map(tag("null"), |_| Expr::Literal(Literal::Null)),
        map(tag("true"), |_| Expr::Literal(Literal::Bool(true))),
        map(tag("false"), |_| Expr::Literal(Literal::Bool(false))),
        map(number_literal, |n| Expr::Literal(Literal::Number(n))),
        map(string_literal, |s| Expr::Literal(Literal::Str(s))),
        list_literal,
        map(identifier, |s| Expr::Ident(s.to_string())),
        delimited(ws(char('(')), or_expr, ws(char(')'))),
    )))
    .parse(input)
}

fn number_literal(input: &str) -> IResult<&str, f64> {
    double(input)
}

fn string_literal(input: &str) -> IResult<&str, String> {
    alt((
        delimited(
            char('"'),
            escaped_string_body('"'),
            char('"'),
        ),
        delimited(
            char('\''),
            escaped_string_body('\''),
            char('\''),
        ),
    ))
    .parse(input)
}

fn escaped_string_body<'a>(
    quote: char,
) -> impl FnMut(&'a str) -> IResult<&'a str, String> {
    move |input: &'a str| {
        if input.starts_with(quote) {
            return Ok((input, String::new()));
        }
        alt((
            escaped_transform(
                none_of(match quote {
                    '"' => "\"\\",
                    _ => "'\\",
                }),
                '\\',
                alt((
                    value("\\", tag("\\")),
                    value("\"", tag("\"")),
                    value("'", tag("'")),
                    value("\n", tag("n")),
                    value("\t", tag("t")),
                )),
            ),
            value(String::new(), take_while(|_| false)),
        ))
        .parse(input)
    }
}

fn list_literal(input: &str) -> IResult<&str, Expr> {
    map(
        delimited(
            ws(char('[')),
            separated_list0(ws(char(',')), or_expr),
            ws(char(']')),
        ),
        Expr::List,
    )
    .parse(input)
}

fn fold_binary(first: Expr, op: BinaryOp, rest: Vec<Expr>) -> Expr {
    rest.into_iter().fold(first, |lhs, rhs| Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    })
}

fn fold_binary_ops(first: Expr, rest: Vec<(BinaryOp, Expr)>) -> Expr {
    rest.into_iter().fold(first, |lhs, (op, rhs)| Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    })
}

// Dequotes a `"..."` or `'...'` path argument as used by `extends`/`include`.
pub fn dequote(raw: &str) -> Result<String, ExprParseError> {
    let trimmed = raw.trim();
    let mut parser = alt((
        terminated(preceded(char('"'), escaped_string_body('"')), char('"')),
        terminated(preceded(char('\''), escaped_string_body('\'')), char('\'')),
    ));
    match parser.parse(trimmed) {
        Ok(("", s)) => Ok(s),
        _ => Err(ExprParseError::new(format!("expected a quoted path, got: {raw}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_arithmetic_precedence() {
        let e = parse_expr("1 + 2 * 3").unwrap();
        assert_eq!(
            e,
            Expr::Binary {
                op: BinaryOp::Add,
                lhs: Box::new(Expr::Literal(Literal::Number(1.0))),
                rhs: Box::new(Expr::Binary {
                    op: BinaryOp::Mul,
                    lhs: Box::new(Expr::Literal(Literal::Number(2.0))),
                    rhs: Box::new(Expr::Literal(Literal::Number(3.0))),
                }),
            }
        );
    }

    #[test]
    fn parses_comparison_and_boolean() {
        let e = parse_expr("n > 0 and n < 10").unwrap();
        matches!(e, Expr::Binary { op: BinaryOp::And, .. });
        let _ = e;
    }

    #[test]
    fn parses_attribute_and_index_and_call() {
        let e = parse_expr("user.name").unwrap();
        assert_eq!(
            e,
            Expr::Attr { base: Box::new(Expr::Ident("user".into())), name: "name".into() }
        );
        let e = parse_expr("items[0]").unwrap();
        assert!(matches!(e, Expr::Index { .. }));
        let e = parse_expr("range(3)").unwrap();
        assert!(matches!(e, Expr::Call { .. }));
    }

    #[test]
    fn parses_list_literal() {
        let e = parse_expr("[1, 2, 3]").unwrap();
        assert!(matches!(e, Expr::List(v) if v.len() == 3));
    }

    #[test]
    fn parses_assignment() {
        let (name, expr) = parse_assignment("x = 1 + 1").unwrap();
        assert_eq!(name, "x");
        assert!(matches!(expr, Expr::Binary { op: BinaryOp::Add, .. }));
    }

    #[test]
    fn parses_for_header_single_and_pair() {
        let (target, _) = parse_for_header("i in range(3)").unwrap();
        assert_eq!(target, ForTarget::Single("i".into()));
        let (target, _) = parse_for_header("k, v in items").unwrap();
        assert_eq!(target, ForTarget::Pair("k".into(), "v".into()));
    }

    #[test]
    fn dequotes_include_paths() {
        assert_eq!(dequote("\"header.html\"").unwrap(), "header.html");
        assert_eq!(dequote("'header.html'").unwrap(), "header.html");
    }
}
