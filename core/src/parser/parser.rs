use super::ast::{
    BinaryOp, BoolOp, ComparisonOp, Expr, FormatSegment, Header, Line, Literal, Simple, Target,
    UnaryOp,
};
use super::error::{ParseError, convert_pest_error};
use lazy_static::lazy_static;
use pest::Parser;
use pest::iterators::{Pair, Pairs};
use pest::pratt_parser::{Assoc, Op, PrattParser};
use pest_derive::Parser;
use std::rc::Rc;

/// Deepest bracket nesting accepted on one line.
pub const MAX_NESTING: usize = 64;

/// Most operator characters accepted on one line.
pub const MAX_OPERATORS: usize = 512;

/// Most decimal places a `{x:.Nf}` format may ask for.
pub const MAX_PRECISION: usize = 100;

lazy_static! {
    // Note: precedence is defined lowest to highest.
    static ref PRATT_PARSER: PrattParser<Rule> = PrattParser::new()
        // (lowest precedence)
        .op(Op::prefix(Rule::lambda_op))                 // `(...) =>`

        // Logical operators.
        .op(Op::infix(Rule::or, Assoc::Left))            // `or`
        .op(Op::infix(Rule::and, Assoc::Left))           // `and`
        .op(Op::prefix(Rule::not))                       // `not`

        // Comparisons.
        .op(
            Op::infix(Rule::eq, Assoc::Left) |
            Op::infix(Rule::neq, Assoc::Left) |
            Op::infix(Rule::lt, Assoc::Left) |
            Op::infix(Rule::gt, Assoc::Left) |
            Op::infix(Rule::le, Assoc::Left) |
            Op::infix(Rule::ge, Assoc::Left) |
            Op::infix(Rule::in_op, Assoc::Left) |
            Op::infix(Rule::not_in, Assoc::Left)
        )

        // Arithmetic operators.
        .op(
            Op::infix(Rule::add, Assoc::Left) |
            Op::infix(Rule::sub, Assoc::Left)
        )                                               // `+`, `-`
        .op(
            Op::infix(Rule::mul, Assoc::Left) |
            Op::infix(Rule::div, Assoc::Left) |
            Op::infix(Rule::floor_div, Assoc::Left) |
            Op::infix(Rule::modulo, Assoc::Left)
        )                                               // `*`, `/`, `//`, `%`
        .op(Op::prefix(Rule::neg))                       // `-`
        .op(Op::infix(Rule::pow, Assoc::Right))          // `**` (right-assoc)

        // Postfix operators.
        .op(
            Op::postfix(Rule::call_op) |
            Op::postfix(Rule::slice_op) |
            Op::postfix(Rule::index_op) |
            Op::postfix(Rule::field_op)
        )
        // (highest precedence)
        ;
}

#[derive(Parser)]
#[grammar = "parser/canonical.pest"]
pub struct CanonicalParser;

type PestResult<T> = Result<T, pest::error::Error<Rule>>;

fn custom_error(pair: &Pair<'_, Rule>, message: impl Into<String>) -> pest::error::Error<Rule> {
    pest::error::Error::new_from_span(
        pest::error::ErrorVariant::CustomError {
            message: message.into(),
        },
        pair.as_span(),
    )
}

/// Keyword tokens carry no information once the enclosing rule has matched.
fn is_keyword(rule: Rule) -> bool {
    matches!(
        rule,
        Rule::kw_if
            | Rule::kw_elif
            | Rule::kw_else
            | Rule::kw_while
            | Rule::kw_for
            | Rule::kw_in
            | Rule::kw_fn
            | Rule::kw_class
            | Rule::kw_try
            | Rule::kw_catch
            | Rule::kw_finally
            | Rule::kw_return
            | Rule::kw_raise
            | Rule::kw_break
            | Rule::kw_continue
            | Rule::kw_pass
            | Rule::kw_import
            | Rule::kw_from
            | Rule::kw_global
    )
}

fn operands(pair: Pair<'_, Rule>) -> impl Iterator<Item = Pair<'_, Rule>> {
    pair.into_inner().filter(|p| !is_keyword(p.as_rule()))
}

fn next_operand<'i>(
    pairs: &mut impl Iterator<Item = Pair<'i, Rule>>,
    parent: &Pair<'i, Rule>,
) -> PestResult<Pair<'i, Rule>> {
    pairs
        .next()
        .ok_or_else(|| custom_error(parent, "missing expected pair in rule"))
}

pub fn parse_expr(pair: Pair<Rule>) -> PestResult<Expr> {
    match pair.as_rule() {
        Rule::expr_main | Rule::slice_start | Rule::slice_end | Rule::comp_if => {
            let mut inner = operands(pair.clone());
            parse_expr(next_operand(&mut inner, &pair)?)
        }

        Rule::expression => PRATT_PARSER
            .map_primary(parse_expr)
            .map_prefix(|op, rhs| {
                let op = match op.as_rule() {
                    Rule::neg => UnaryOp::Neg,
                    Rule::not => UnaryOp::Not,
                    Rule::lambda_op => {
                        let params = op
                            .into_inner()
                            .next()
                            .map(|params| params.into_inner().map(|p| p.as_str().to_string()).collect())
                            .unwrap_or_default();
                        return Ok(Expr::Lambda {
                            params,
                            body: Rc::new(rhs?),
                        });
                    }
                    _ => return Err(custom_error(&op, "unknown prefix operator")),
                };
                Ok(Expr::Unary {
                    op,
                    expr: Box::new(rhs?),
                })
            })
            .map_infix(|lhs, op, rhs| {
                let (left, right) = (Box::new(lhs?), Box::new(rhs?));
                let comparison = match op.as_rule() {
                    Rule::add => return Ok(binary(BinaryOp::Add, left, right)),
                    Rule::sub => return Ok(binary(BinaryOp::Sub, left, right)),
                    Rule::mul => return Ok(binary(BinaryOp::Mul, left, right)),
                    Rule::div => return Ok(binary(BinaryOp::Div, left, right)),
                    Rule::floor_div => return Ok(binary(BinaryOp::FloorDiv, left, right)),
                    Rule::modulo => return Ok(binary(BinaryOp::Mod, left, right)),
                    Rule::pow => return Ok(binary(BinaryOp::Pow, left, right)),
                    Rule::and => return Ok(Expr::Boolean { op: BoolOp::And, left, right }),
                    Rule::or => return Ok(Expr::Boolean { op: BoolOp::Or, left, right }),
                    Rule::eq => ComparisonOp::Eq,
                    Rule::neq => ComparisonOp::Neq,
                    Rule::lt => ComparisonOp::Lt,
                    Rule::gt => ComparisonOp::Gt,
                    Rule::le => ComparisonOp::Le,
                    Rule::ge => ComparisonOp::Ge,
                    Rule::in_op => ComparisonOp::In,
                    Rule::not_in => ComparisonOp::NotIn,
                    _ => return Err(custom_error(&op, "unknown binary operator")),
                };
                Ok(Expr::Comparison {
                    op: comparison,
                    left,
                    right,
                })
            })
            .map_postfix(|lhs, op| match op.as_rule() {
                Rule::call_op => {
                    let args = op.into_inner().map(parse_expr).collect::<PestResult<_>>()?;
                    Ok(Expr::Call {
                        callable: Box::new(lhs?),
                        args,
                    })
                }
                Rule::slice_op => {
                    let mut start = None;
                    let mut end = None;
                    for bound in op.into_inner() {
                        let rule = bound.as_rule();
                        let expr = Some(Box::new(parse_expr(bound)?));
                        if rule == Rule::slice_start {
                            start = expr;
                        } else {
                            end = expr;
                        }
                    }
                    Ok(Expr::Slice {
                        value: Box::new(lhs?),
                        start,
                        end,
                    })
                }
                Rule::index_op => {
                    let mut inner = op.clone().into_inner();
                    let index = parse_expr(next_operand(&mut inner, &op)?)?;
                    Ok(Expr::Index {
                        value: Box::new(lhs?),
                        index: Box::new(index),
                    })
                }
                Rule::field_op => {
                    let mut inner = op.clone().into_inner();
                    let field = next_operand(&mut inner, &op)?.as_str().to_string();
                    Ok(Expr::Field {
                        value: Box::new(lhs?),
                        field,
                    })
                }
                _ => Err(custom_error(&op, "unknown postfix operator")),
            })
            .parse(pair.into_inner()),

        Rule::grouped => {
            let mut inner = pair.clone().into_inner();
            parse_expr(next_operand(&mut inner, &pair)?)
        }

        Rule::tuple => Ok(Expr::Tuple(parse_all(pair.into_inner())?)),
        Rule::list => Ok(Expr::List(parse_all(pair.into_inner())?)),
        Rule::set => Ok(Expr::Set(parse_all(pair.into_inner())?)),

        Rule::dict => {
            let entries = pair
                .into_inner()
                .map(parse_dict_entry)
                .collect::<PestResult<_>>()?;
            Ok(Expr::Dict(entries))
        }

        Rule::list_comp => {
            let mut inner = operands(pair.clone());
            let element = parse_expr(next_operand(&mut inner, &pair)?)?;
            let targets = idents(next_operand(&mut inner, &pair)?);
            let iterable = parse_expr(next_operand(&mut inner, &pair)?)?;
            let condition = inner.next().map(parse_expr).transpose()?.map(Box::new);
            Ok(Expr::ListComp {
                element: Box::new(element),
                targets,
                iterable: Box::new(iterable),
                condition,
            })
        }

        Rule::integer => {
            let value = pair
                .as_str()
                .parse()
                .map_err(|_| custom_error(&pair, format!("The number {} is too large", pair.as_str())))?;
            Ok(Expr::Literal(Literal::Int(value)))
        }

        Rule::float => {
            let value = pair
                .as_str()
                .parse()
                .map_err(|_| custom_error(&pair, "invalid decimal literal"))?;
            Ok(Expr::Literal(Literal::Float(value)))
        }

        Rule::boolean => Ok(Expr::Literal(Literal::Bool(pair.as_str() == "true"))),

        Rule::none_lit => Ok(Expr::Literal(Literal::None)),

        Rule::string => {
            let text = pair.as_str();
            let quote_len = if text.starts_with("\"\"\"") || text.starts_with("'''") {
                3
            } else {
                1
            };
            let inner = &text[quote_len..text.len() - quote_len];
            Ok(Expr::Literal(Literal::Str(unescape(inner))))
        }

        Rule::fstring => {
            let segments = pair
                .into_inner()
                .map(|part| match part.as_rule() {
                    Rule::fs_text_dq | Rule::fs_text_sq => Ok(FormatSegment::Text(
                        unescape(part.as_str()).replace("{{", "{").replace("}}", "}"),
                    )),
                    _ => parse_format_expr(part),
                })
                .collect::<PestResult<_>>()?;
            Ok(Expr::FormatStr(segments))
        }

        Rule::ident => Ok(Expr::Ident(pair.as_str().to_string())),

        _ => Err(custom_error(&pair, format!("Unhandled rule: {:?}", pair.as_rule()))),
    }
}

fn binary(op: BinaryOp, left: Box<Expr>, right: Box<Expr>) -> Expr {
    Expr::Binary { op, left, right }
}

fn parse_all(pairs: Pairs<'_, Rule>) -> PestResult<Vec<Expr>> {
    pairs.map(parse_expr).collect()
}

fn parse_dict_entry(pair: Pair<Rule>) -> PestResult<(Expr, Expr)> {
    let mut inner = pair.clone().into_inner();
    let key = parse_expr(next_operand(&mut inner, &pair)?)?;
    let value = parse_expr(next_operand(&mut inner, &pair)?)?;
    Ok((key, value))
}

fn parse_format_expr(pair: Pair<Rule>) -> PestResult<FormatSegment> {
    let mut inner = pair.clone().into_inner();
    let expr = parse_expr(next_operand(&mut inner, &pair)?)?;
    let precision = match inner.next() {
        Some(format) => {
            let digits = format.as_str().trim_start_matches(":.").trim_end_matches('f');
            let precision: usize = digits
                .parse()
                .map_err(|_| custom_error(&format, "invalid format precision"))?;
            if precision > MAX_PRECISION {
                return Err(custom_error(
                    &format,
                    format!("format precision is limited to {} places", MAX_PRECISION),
                ));
            }
            Some(precision)
        }
        None => None,
    };
    Ok(FormatSegment::Expr {
        expr: Box::new(expr),
        precision,
    })
}

fn idents(pair: Pair<'_, Rule>) -> Vec<String> {
    pair.into_inner().map(|p| p.as_str().to_string()).collect()
}

/// Resolve backslash escapes inside a text literal.
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other @ ('\\' | '"' | '\'')) => out.push(other),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn parse_target(pair: Pair<Rule>) -> PestResult<Target> {
    let expr = PRATT_PARSER
        .map_primary(parse_expr)
        .map_prefix(|op, _| Err(custom_error(&op, "unexpected prefix in assignment target")))
        .map_infix(|_, op, _| Err(custom_error(&op, "unexpected operator in assignment target")))
        .map_postfix(|lhs, op| match op.as_rule() {
            Rule::index_op => {
                let mut inner = op.clone().into_inner();
                Ok(Expr::Index {
                    value: Box::new(lhs?),
                    index: Box::new(parse_expr(next_operand(&mut inner, &op)?)?),
                })
            }
            Rule::field_op => {
                let mut inner = op.clone().into_inner();
                Ok(Expr::Field {
                    value: Box::new(lhs?),
                    field: next_operand(&mut inner, &op)?.as_str().to_string(),
                })
            }
            Rule::call_op => Ok(Expr::Call {
                callable: Box::new(lhs?),
                args: op.into_inner().map(parse_expr).collect::<PestResult<_>>()?,
            }),
            _ => Err(custom_error(&op, "a slice cannot be assigned to")),
        })
        .parse(pair.clone().into_inner())?;

    match expr {
        Expr::Ident(name) => Ok(Target::Name(name)),
        Expr::Field { value, field } => Ok(Target::Field { value: *value, field }),
        Expr::Index { value, index } => Ok(Target::Index {
            value: *value,
            index: *index,
        }),
        _ => Err(custom_error(&pair, format!("`{}` cannot be assigned to", pair.as_str().trim()))),
    }
}

fn parse_expression_list(pair: Pair<Rule>) -> PestResult<Expr> {
    let mut items = parse_all(pair.into_inner())?;
    if items.len() == 1 {
        Ok(items.remove(0))
    } else {
        Ok(Expr::Tuple(items))
    }
}

fn parse_header(pair: Pair<Rule>) -> PestResult<Header> {
    let rule = pair.as_rule();
    let mut inner = operands(pair.clone());
    let header = match rule {
        Rule::if_header => Header::If(parse_expr(next_operand(&mut inner, &pair)?)?),
        Rule::elif_header => Header::Elif(parse_expr(next_operand(&mut inner, &pair)?)?),
        Rule::else_header => Header::Else,
        Rule::while_header => Header::While(parse_expr(next_operand(&mut inner, &pair)?)?),
        Rule::for_header => {
            let targets = idents(next_operand(&mut inner, &pair)?);
            let iterable = parse_expr(next_operand(&mut inner, &pair)?)?;
            Header::For { targets, iterable }
        }
        Rule::fn_header => {
            let name = next_operand(&mut inner, &pair)?.as_str().to_string();
            let params = inner.next().map(idents).unwrap_or_default();
            Header::Function { name, params }
        }
        Rule::class_header => Header::Class(next_operand(&mut inner, &pair)?.as_str().to_string()),
        Rule::try_header => Header::Try,
        Rule::catch_header => Header::Catch(
            inner
                .next()
                .map(|name| name.as_str().to_string())
                .unwrap_or_else(|| "error".to_string()),
        ),
        Rule::finally_header => Header::Finally,
        _ => return Err(custom_error(&pair, format!("Unhandled rule: {:?}", rule))),
    };
    Ok(header)
}

fn parse_simple(pair: Pair<Rule>) -> PestResult<Simple> {
    let rule = pair.as_rule();
    let mut inner = operands(pair.clone());
    let simple = match rule {
        Rule::return_stmt => Simple::Return(inner.next().map(parse_expression_list).transpose()?),
        Rule::raise_stmt => Simple::Raise(inner.next().map(parse_expr).transpose()?),
        Rule::break_stmt => Simple::Break,
        Rule::continue_stmt => Simple::Continue,
        Rule::pass_stmt => Simple::Pass,
        Rule::import_stmt => Simple::Import(inner.map(|p| p.as_str().to_string()).collect()),
        Rule::from_import => {
            let module = next_operand(&mut inner, &pair)?.as_str().to_string();
            let names = idents(next_operand(&mut inner, &pair)?);
            Simple::FromImport { module, names }
        }
        Rule::global_stmt => Simple::Global(idents(next_operand(&mut inner, &pair)?)),
        Rule::aug_assign => {
            let target = parse_target(next_operand(&mut inner, &pair)?)?;
            let op = match next_operand(&mut inner, &pair)?.as_str() {
                "+=" => BinaryOp::Add,
                "-=" => BinaryOp::Sub,
                "*=" => BinaryOp::Mul,
                _ => BinaryOp::Div,
            };
            let value = parse_expr(next_operand(&mut inner, &pair)?)?;
            Simple::AugAssign { target, op, value }
        }
        Rule::assign => {
            let targets = next_operand(&mut inner, &pair)?
                .into_inner()
                .map(parse_target)
                .collect::<PestResult<_>>()?;
            let value = parse_expression_list(next_operand(&mut inner, &pair)?)?;
            Simple::Assign { targets, value }
        }
        Rule::expr_stmt => Simple::Expr(parse_expr(next_operand(&mut inner, &pair)?)?),
        _ => return Err(custom_error(&pair, format!("Unhandled rule: {:?}", rule))),
    };
    Ok(simple)
}

/// Reject lines whose nesting or length would make parsing or evaluation
/// recurse too deeply. Text inside quotes is not counted.
fn check_complexity(source: &str) -> Result<(), ParseError> {
    let mut depth = 0usize;
    let mut operators = 0usize;
    let mut quote: Option<char> = None;
    let mut chars = source.chars();

    while let Some(ch) = chars.next() {
        if let Some(q) = quote {
            match ch {
                '\\' => {
                    chars.next();
                }
                c if c == q => quote = None,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' | '\'' => quote = Some(ch),
            '(' | '[' | '{' => {
                depth += 1;
                if depth > MAX_NESTING {
                    return Err(ParseError::too_deep(MAX_NESTING));
                }
            }
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            '+' | '-' | '*' | '/' | '%' | '<' | '>' | '=' | '.' | ',' => {
                operators += 1;
                if operators > MAX_OPERATORS {
                    return Err(ParseError::too_long(MAX_OPERATORS));
                }
            }
            _ => {}
        }
    }
    Ok(())
}

/// Parse one canonical line.
pub fn parse_line(source: &str) -> Result<Line, ParseError> {
    check_complexity(source)?;
    let mut pairs = CanonicalParser::parse(Rule::line, source).map_err(|e| convert_pest_error(e, source))?;
    let line = pairs
        .next()
        .ok_or_else(|| ParseError::other("empty line"))?;
    let statement = line
        .into_inner()
        .next()
        .ok_or_else(|| ParseError::other("empty line"))?;

    let parsed = match statement.as_rule() {
        Rule::if_header
        | Rule::elif_header
        | Rule::else_header
        | Rule::while_header
        | Rule::for_header
        | Rule::fn_header
        | Rule::class_header
        | Rule::try_header
        | Rule::catch_header
        | Rule::finally_header => parse_header(statement).map(Line::Header),
        _ => parse_simple(statement).map(Line::Simple),
    };
    parsed.map_err(|e| convert_pest_error(e, source))
}

/// Parse a single canonical expression.
pub fn parse_expression(source: &str) -> Result<Expr, ParseError> {
    check_complexity(source)?;
    let mut pairs =
        CanonicalParser::parse(Rule::expr_main, source).map_err(|e| convert_pest_error(e, source))?;
    let pair = pairs.next().ok_or_else(|| ParseError::other("empty expression"))?;
    parse_expr(pair).map_err(|e| convert_pest_error(e, source))
}
