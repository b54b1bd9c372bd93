//! Closure-text parser for predicates and member accessors
//!
//! Accepts Rust closure syntax (`|p, c| p.category_id == c.category_id`) and
//! arrow syntax (`(p, c) => p.category_id == c.category_id`, `p => p.name`).
//! The grammar is deliberately small: field accesses, literals, `as` casts,
//! comparisons, `&&`, `||` and parentheses.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_until},
    character::complete::{alpha1, alphanumeric1, char, digit1, multispace0, multispace1},
    combinator::{map, map_res, opt, recognize, value},
    error::ParseError,
    multi::{many0, separated_list1},
    sequence::{delimited, pair, preceded, terminated},
    IResult, Parser,
};
use serde_json::Value;

use super::ast::{BinaryOp, Lambda, PredicateExpr};
use super::errors::PredicateParseError;

pub fn ws<'a, O, E: ParseError<&'a str>, F>(inner: F) -> impl Parser<&'a str, Output = O, Error = E>
where
    F: Parser<&'a str, Output = O, Error = E>,
{
    delimited(multispace0, inner, multispace0)
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))
    .parse(input)
}

fn parameter_list(input: &str) -> IResult<&str, Vec<&str>> {
    separated_list1(ws(char(',')), ws(identifier)).parse(input)
}

fn closure_header(input: &str) -> IResult<&str, Vec<&str>> {
    delimited(char('|'), parameter_list, char('|')).parse(input)
}

fn arrow_header(input: &str) -> IResult<&str, Vec<&str>> {
    terminated(
        alt((
            delimited(char('('), parameter_list, char(')')),
            map(identifier, |p| vec![p]),
        )),
        ws(tag("=>")),
    )
    .parse(input)
}

fn number(input: &str) -> IResult<&str, Value> {
    map_res(
        recognize((opt(char('-')), digit1, opt(pair(char('.'), digit1)))),
        number_value,
    )
    .parse(input)
}

fn number_value(text: &str) -> Result<Value, String> {
    if text.contains('.') {
        let parsed = text.parse::<f64>().map_err(|e| e.to_string())?;
        serde_json::Number::from_f64(parsed)
            .map(Value::Number)
            .ok_or_else(|| format!("non-finite number {}", text))
    } else {
        text.parse::<i64>()
            .map(Value::from)
            .map_err(|e| e.to_string())
    }
}

fn string_literal(input: &str) -> IResult<&str, Value> {
    map(
        alt((
            delimited(char('\''), take_until("'"), char('\'')),
            delimited(char('"'), take_until("\""), char('"')),
        )),
        |s: &str| Value::String(s.to_string()),
    )
    .parse(input)
}

fn literal(input: &str) -> IResult<&str, PredicateExpr> {
    map(
        alt((
            number,
            string_literal,
            value(Value::Bool(true), tag("true")),
            value(Value::Bool(false), tag("false")),
            value(Value::Null, tag("null")),
        )),
        PredicateExpr::Literal,
    )
    .parse(input)
}

fn field_access(input: &str) -> IResult<&str, PredicateExpr> {
    map((identifier, char('.'), identifier), |(parameter, _, field)| {
        PredicateExpr::field(parameter, field)
    })
    .parse(input)
}

fn primary(input: &str) -> IResult<&str, PredicateExpr> {
    alt((
        delimited(ws(char('(')), expression, ws(char(')'))),
        field_access,
        literal,
    ))
    .parse(input)
}

// `x as i64 as i32` nests one Convert per cast
fn cast(input: &str) -> IResult<&str, PredicateExpr> {
    let (input, operand) = primary(input)?;
    let (input, targets) =
        many0(preceded((multispace1, tag("as"), multispace1), identifier)).parse(input)?;
    let expr = targets
        .into_iter()
        .fold(operand, |operand, target| PredicateExpr::Convert {
            target: target.to_string(),
            operand: Box::new(operand),
        });
    Ok((input, expr))
}

fn comparison_op(input: &str) -> IResult<&str, BinaryOp> {
    alt((
        value(BinaryOp::Eq, tag("==")),
        value(BinaryOp::Ne, tag("!=")),
        value(BinaryOp::Le, tag("<=")),
        value(BinaryOp::Ge, tag(">=")),
        value(BinaryOp::Lt, tag("<")),
        value(BinaryOp::Gt, tag(">")),
    ))
    .parse(input)
}

fn comparison(input: &str) -> IResult<&str, PredicateExpr> {
    let (input, left) = ws(cast).parse(input)?;
    let (input, tail) = opt(pair(ws(comparison_op), ws(cast))).parse(input)?;
    let expr = match tail {
        Some((op, right)) => PredicateExpr::binary(op, left, right),
        None => left,
    };
    Ok((input, expr))
}

fn and_expr(input: &str) -> IResult<&str, PredicateExpr> {
    let (input, first) = comparison(input)?;
    let (input, rest) = many0(preceded(ws(tag("&&")), comparison)).parse(input)?;
    Ok((input, fold_left(first, rest, BinaryOp::And)))
}

fn expression(input: &str) -> IResult<&str, PredicateExpr> {
    let (input, first) = and_expr(input)?;
    let (input, rest) = many0(preceded(ws(tag("||")), and_expr)).parse(input)?;
    Ok((input, fold_left(first, rest, BinaryOp::Or)))
}

fn fold_left(first: PredicateExpr, rest: Vec<PredicateExpr>, op: BinaryOp) -> PredicateExpr {
    rest.into_iter()
        .fold(first, |left, right| PredicateExpr::binary(op, left, right))
}

fn lambda(input: &str) -> IResult<&str, (Vec<&str>, PredicateExpr)> {
    (ws(alt((closure_header, arrow_header))), expression).parse(input)
}

/// Parses closure text into a [`Lambda`], keeping the original text.
pub fn parse_lambda(text: &str) -> Result<Lambda, PredicateParseError> {
    match lambda(text) {
        Ok((rest, (parameters, body))) => {
            let rest = rest.trim();
            if !rest.is_empty() {
                return Err(PredicateParseError::TrailingInput(rest.to_string()));
            }
            Ok(Lambda {
                parameters: parameters.into_iter().map(str::to_string).collect(),
                body,
                text: text.trim().to_string(),
            })
        }
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            Err(PredicateParseError::Syntax {
                position: text.len() - e.input.len(),
                near: e.input.chars().take(24).collect(),
            })
        }
        Err(nom::Err::Incomplete(_)) => Err(PredicateParseError::Syntax {
            position: text.len(),
            near: String::new(),
        }),
    }
}
