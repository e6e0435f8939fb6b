//! Extractors for the two unsafe authoring shapes.
//!
//! The interpolation extractor walks a template body with a brace-depth
//! counter so nested expressions are lifted whole; the concatenation extractor
//! splits `'literal' + expr` with the usual nom combinators.

use nom::character::complete::char;
use nom::error::{Error, ErrorKind};
use nom::IResult;

use crate::error::{ParqError, ParqResult};

/// One interpolation occurrence within a template body.
///
/// Ordinals are dense and 1-based, in order of appearance. A repeated
/// expression text yields one hole per occurrence, never deduplicated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hole {
    pub expr: String,
    pub ordinal: usize,
}

/// A template body with every hole replaced by its positional placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateParts {
    pub query: String,
    pub holes: Vec<Hole>,
}

/// A concatenated argument split into literal and trailing expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcatParts {
    /// Quote character of the literal, preserved in the rewrite.
    pub quote: char,
    /// Literal content without its quotes, escapes intact.
    pub literal: String,
    pub expr: String,
}

/// Replace every `${expr}` hole in `body` with `$<ordinal>` and collect the
/// holes in order of appearance. `\$` is literal text, not a hole. A body
/// without holes passes through untouched.
pub fn extract_interpolations(body: &str) -> ParqResult<TemplateParts> {
    let mut query = String::with_capacity(body.len());
    let mut holes: Vec<Hole> = Vec::new();
    let mut iter = body.char_indices().peekable();

    while let Some((i, c)) = iter.next() {
        match c {
            '\\' => {
                query.push(c);
                if let Some((_, escaped)) = iter.next() {
                    query.push(escaped);
                }
            }
            '$' if matches!(iter.peek(), Some((_, '{'))) => {
                iter.next();
                let mut depth = 1usize;
                let mut expr = String::new();
                loop {
                    match iter.next() {
                        Some((_, '{')) => {
                            depth += 1;
                            expr.push('{');
                        }
                        Some((_, '}')) => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                            expr.push('}');
                        }
                        Some((_, ch)) => expr.push(ch),
                        None => {
                            return Err(ParqError::unbounded(i, "interpolation hole never closes"))
                        }
                    }
                }
                let expr = expr.trim().to_string();
                if expr.is_empty() {
                    return Err(ParqError::unsupported(i, "empty interpolation hole"));
                }
                if expr.contains(['\'', '"', '`']) {
                    return Err(ParqError::unsupported(
                        i,
                        "quote character inside hole expression",
                    ));
                }
                let ordinal = holes.len() + 1;
                query.push('$');
                query.push_str(&ordinal.to_string());
                holes.push(Hole { expr, ordinal });
            }
            _ => query.push(c),
        }
    }

    Ok(TemplateParts { query, holes })
}

/// Split a concatenated argument into its literal and the single trailing
/// expression. More than one `+`-chained segment is out of scope and refused.
pub fn extract_concatenation(arg: &str) -> ParqResult<ConcatParts> {
    let trimmed = arg.trim();
    let (rest, (quote, literal)) = string_literal(trimmed)
        .map_err(|_| ParqError::unsupported(0, "argument does not begin with a quoted literal"))?;
    let (expr, _) = plus(rest.trim_start())
        .map_err(|_| ParqError::unsupported(0, "literal is not followed by '+'"))?;

    let expr = expr.trim();
    if expr.is_empty() {
        return Err(ParqError::unsupported(0, "missing expression after '+'"));
    }
    if has_top_level_plus(expr) {
        return Err(ParqError::unsupported(
            0,
            "more than one concatenated segment",
        ));
    }

    Ok(ConcatParts {
        quote,
        literal: literal.to_string(),
        expr: expr.to_string(),
    })
}

/// Parse a single- or double-quoted literal, returning (quote, content).
fn string_literal(input: &str) -> IResult<&str, (char, &str)> {
    let quote = match input.chars().next() {
        Some(q @ ('\'' | '"')) => q,
        _ => return Err(nom::Err::Error(Error::new(input, ErrorKind::Char))),
    };
    let (input, _) = char(quote)(input)?;

    let mut esc = false;
    for (i, c) in input.char_indices() {
        if esc {
            esc = false;
            continue;
        }
        match c {
            '\\' => esc = true,
            c if c == quote => return Ok((&input[i + 1..], (quote, &input[..i]))),
            _ => {}
        }
    }
    Err(nom::Err::Error(Error::new(input, ErrorKind::TakeUntil)))
}

fn plus(input: &str) -> IResult<&str, char> {
    char('+')(input)
}

/// Whether `expr` contains a further `+` outside strings and brackets,
/// i.e. a second concatenated segment.
fn has_top_level_plus(expr: &str) -> bool {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut esc = false;
    for c in expr.chars() {
        if esc {
            esc = false;
            continue;
        }
        match quote {
            Some(q) => match c {
                '\\' => esc = true,
                c if c == q => quote = None,
                _ => {}
            },
            None => match c {
                '\'' | '"' | '`' => quote = Some(c),
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' => depth = depth.saturating_sub(1),
                '+' if depth == 0 => return true,
                _ => {}
            },
        }
    }
    false
}
