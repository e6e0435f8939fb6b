//! Call-site locator for dynamic query invocations.
//!
//! Finds occurrences of the configured query-execution callee and bounds each
//! call's argument with an explicit depth scanner (quote state, paren depth,
//! template-hole brace depth) rather than pattern matching, so nested
//! expressions never shift the span.

use regex::Regex;

use crate::error::{ParqError, ParqResult};
use crate::report::SkipKind;

/// Authoring shape of a located call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// Template literal with at least one `${...}` hole.
    Interpolated,
    /// Quoted literal concatenated with a trailing expression.
    Concatenated,
}

/// One dynamic-query invocation span within a source file.
#[derive(Debug, Clone)]
pub struct CallSite {
    /// Byte offset of the callee's first character.
    pub start: usize,
    /// Byte offset one past the closing parenthesis.
    pub end: usize,
    /// The callee text as written in the source.
    pub callee: String,
    /// Raw argument text between the parentheses.
    pub arg: String,
    pub kind: CallKind,
}

/// A dynamic call site that could not be classified into a rewritable shape.
#[derive(Debug, Clone)]
pub struct LocateSkip {
    pub position: usize,
    pub kind: SkipKind,
    pub message: String,
}

/// Locator output: candidate sites in order of appearance plus skipped sites.
/// Candidate spans never overlap.
#[derive(Debug, Default)]
pub struct Located {
    pub sites: Vec<CallSite>,
    pub skips: Vec<LocateSkip>,
}

/// Scanner for query-invocation call sites in one file's text.
pub struct Locator {
    pattern: Regex,
}

impl Locator {
    /// Create a locator for the given callee (e.g. `queryRunner.query`).
    pub fn new(callee: &str) -> Self {
        // regex::escape guarantees a valid pattern for any callee text.
        let pattern = Regex::new(&format!(r"{}\s*\(", regex::escape(callee))).unwrap();
        Self { pattern }
    }

    /// Locate every candidate call site in `text`, in order of appearance.
    pub fn locate(&self, text: &str) -> Located {
        let mut result = Located::default();
        let mut last_end = 0;

        for m in self.pattern.find_iter(text) {
            // Matches inside an already-claimed candidate span belong to its
            // argument text, not to a new invocation.
            if m.start() < last_end {
                continue;
            }
            // The regex crate has no lookbehind; reject matches where the
            // callee is the tail of a longer identifier.
            if let Some(prev) = text[..m.start()].chars().next_back() {
                if prev.is_alphanumeric() || prev == '_' || prev == '$' {
                    continue;
                }
            }

            let open = m.end() - 1;
            let bounds = match bound_argument(text, open) {
                Ok(b) => b,
                Err(e) => {
                    result.skips.push(LocateSkip {
                        position: m.start(),
                        kind: SkipKind::UnboundedSpan,
                        message: e.detail(),
                    });
                    // With no closing delimiter, everything after this point
                    // is inside the unknown region; rewriting there could
                    // corrupt the file.
                    break;
                }
            };

            let arg = &text[open + 1..bounds.close];
            match classify(arg, bounds.top_level_comma) {
                Classification::Candidate(kind) => {
                    let end = bounds.close + 1;
                    result.sites.push(CallSite {
                        start: m.start(),
                        end,
                        callee: text[m.start()..open].trim_end().to_string(),
                        arg: arg.to_string(),
                        kind,
                    });
                    last_end = end;
                }
                Classification::NotACandidate => {}
                Classification::Unsupported(message) => {
                    result.skips.push(LocateSkip {
                        position: m.start(),
                        kind: SkipKind::UnsupportedShape,
                        message,
                    });
                    // The skipped span must stay untouched, matches inside it
                    // included.
                    last_end = bounds.close + 1;
                }
            }
        }

        result
    }
}

/// 1-based line number of a byte offset in `text`.
pub fn line_of(text: &str, offset: usize) -> usize {
    text[..offset.min(text.len())]
        .bytes()
        .filter(|&b| b == b'\n')
        .count()
        + 1
}

/// Scanner context. Paren/Brace/Hole are code positions; the rest are string
/// states entered and left by their quote character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ctx {
    Paren,
    Brace,
    Hole,
    Single,
    Double,
    Template,
}

#[derive(Debug, Clone, Copy, Default)]
struct ScanFacts {
    /// Offset of the closing delimiter, relative to the scanned text.
    close: usize,
    /// A `,` was seen at argument top level (a second argument exists).
    top_level_comma: bool,
    /// Number of `${...}` holes opened at template top level.
    holes: usize,
}

/// Scan `text`, whose first character is the opening delimiter of `base`,
/// until that delimiter closes. Returns `None` when the input ends first or a
/// delimiter mismatches.
fn scan_delimited(text: &str, base: Ctx) -> Option<ScanFacts> {
    let open_len = text.chars().next()?.len_utf8();
    let mut stack = vec![base];
    let mut facts = ScanFacts::default();
    let mut iter = text[open_len..].char_indices().peekable();

    while let Some((off, c)) = iter.next() {
        let i = open_len + off;
        let ctx = *stack.last()?;
        match ctx {
            Ctx::Single | Ctx::Double | Ctx::Template => match c {
                '\\' => {
                    iter.next();
                }
                '\'' if ctx == Ctx::Single => {
                    stack.pop();
                }
                '"' if ctx == Ctx::Double => {
                    stack.pop();
                }
                '`' if ctx == Ctx::Template => {
                    stack.pop();
                    if stack.is_empty() {
                        facts.close = i;
                        return Some(facts);
                    }
                }
                '$' if ctx == Ctx::Template => {
                    if matches!(iter.peek(), Some((_, '{'))) {
                        iter.next();
                        if stack.len() == 1 {
                            facts.holes += 1;
                        }
                        stack.push(Ctx::Hole);
                    }
                }
                _ => {}
            },
            Ctx::Paren | Ctx::Brace | Ctx::Hole => match c {
                '\'' => stack.push(Ctx::Single),
                '"' => stack.push(Ctx::Double),
                '`' => stack.push(Ctx::Template),
                '(' => stack.push(Ctx::Paren),
                '{' => stack.push(Ctx::Brace),
                ')' => {
                    if ctx != Ctx::Paren {
                        return None;
                    }
                    stack.pop();
                    if stack.is_empty() {
                        facts.close = i;
                        return Some(facts);
                    }
                }
                '}' => {
                    if ctx == Ctx::Paren {
                        return None;
                    }
                    stack.pop();
                }
                ',' if stack.len() == 1 && ctx == Ctx::Paren => facts.top_level_comma = true,
                '/' => match iter.peek() {
                    Some((_, '/')) => {
                        for (_, n) in iter.by_ref() {
                            if n == '\n' {
                                break;
                            }
                        }
                    }
                    Some((_, '*')) => {
                        iter.next();
                        let mut star = false;
                        for (_, n) in iter.by_ref() {
                            if star && n == '/' {
                                break;
                            }
                            star = n == '*';
                        }
                    }
                    _ => {}
                },
                _ => {}
            },
        }
    }

    None
}

struct Bounds {
    /// Offset of the closing paren in the file text.
    close: usize,
    top_level_comma: bool,
}

/// Bound the argument of a call whose opening paren sits at `open`.
fn bound_argument(text: &str, open: usize) -> ParqResult<Bounds> {
    match scan_delimited(&text[open..], Ctx::Paren) {
        Some(facts) => Ok(Bounds {
            close: open + facts.close,
            top_level_comma: facts.top_level_comma,
        }),
        None => Err(ParqError::unbounded(
            open,
            "could not bound the argument (unbalanced quotes or parentheses)",
        )),
    }
}

enum Classification {
    Candidate(CallKind),
    NotACandidate,
    Unsupported(String),
}

/// Decide what a bounded argument is. Calls that already pass a second
/// argument, or contain no hole/concatenation, are not candidates.
fn classify(arg: &str, top_level_comma: bool) -> Classification {
    if top_level_comma {
        return Classification::NotACandidate;
    }

    let trimmed = arg.trim();
    match trimmed.chars().next() {
        Some('`') => match scan_delimited(trimmed, Ctx::Template) {
            Some(facts) => {
                let rest = trimmed[facts.close + 1..].trim();
                if !rest.is_empty() {
                    Classification::Unsupported(
                        "template literal followed by trailing content".to_string(),
                    )
                } else if facts.holes == 0 {
                    Classification::NotACandidate
                } else {
                    Classification::Candidate(CallKind::Interpolated)
                }
            }
            None => Classification::Unsupported("unterminated template literal".to_string()),
        },
        Some(q @ ('\'' | '"')) => match scan_string(trimmed, q) {
            Some(close) => {
                let rest = trimmed[close + 1..].trim_start();
                if rest.starts_with('+') {
                    Classification::Candidate(CallKind::Concatenated)
                } else {
                    Classification::NotACandidate
                }
            }
            None => Classification::Unsupported("unterminated string literal".to_string()),
        },
        _ => Classification::NotACandidate,
    }
}

/// Offset of the closing quote of a string literal starting at `text[0]`.
fn scan_string(text: &str, quote: char) -> Option<usize> {
    let mut esc = false;
    for (i, c) in text.char_indices().skip(1) {
        if esc {
            esc = false;
            continue;
        }
        match c {
            '\\' => esc = true,
            c if c == quote => return Some(i),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locate(text: &str) -> Located {
        Locator::new("queryRunner.query").locate(text)
    }

    #[test]
    fn test_interpolated_site() {
        let text = "await queryRunner.query(`SELECT * FROM users WHERE id = ${id}`);";
        let located = locate(text);
        assert_eq!(located.sites.len(), 1);
        assert_eq!(located.sites[0].kind, CallKind::Interpolated);
        assert_eq!(located.sites[0].callee, "queryRunner.query");
        assert!(located.skips.is_empty());
    }

    #[test]
    fn test_concatenated_site() {
        let text = "queryRunner.query('DELETE FROM t WHERE id = ' + id);";
        let located = locate(text);
        assert_eq!(located.sites.len(), 1);
        assert_eq!(located.sites[0].kind, CallKind::Concatenated);
        assert_eq!(located.sites[0].arg, "'DELETE FROM t WHERE id = ' + id");
    }

    #[test]
    fn test_already_parameterized_is_not_a_candidate() {
        let text = "queryRunner.query(`SELECT * FROM t WHERE id = $1`, [id]);";
        let located = locate(text);
        assert!(located.sites.is_empty());
        assert!(located.skips.is_empty());
    }

    #[test]
    fn test_template_without_holes_is_not_a_candidate() {
        let located = locate("queryRunner.query(`SELECT 1`);");
        assert!(located.sites.is_empty());
        assert!(located.skips.is_empty());
    }

    #[test]
    fn test_plain_literal_is_not_a_candidate() {
        let located = locate("queryRunner.query('SELECT 1');");
        assert!(located.sites.is_empty());
        assert!(located.skips.is_empty());
    }

    #[test]
    fn test_longer_identifier_is_rejected() {
        let located = locate("shadowqueryRunner.query(`x ${y}`);");
        assert!(located.sites.is_empty());
    }

    #[test]
    fn test_nested_braces_in_hole_are_bounded() {
        let text = "queryRunner.query(`SELECT ${cols.map((c) => { return c; })} FROM t`);";
        let located = locate(text);
        assert_eq!(located.sites.len(), 1);
        assert_eq!(located.sites[0].kind, CallKind::Interpolated);
    }

    #[test]
    fn test_unbalanced_argument_is_skipped() {
        let text = "queryRunner.query(`SELECT * FROM t WHERE name = '${name);";
        let located = locate(text);
        assert!(located.sites.is_empty());
        assert_eq!(located.skips.len(), 1);
        assert_eq!(located.skips[0].kind, SkipKind::UnboundedSpan);
    }

    #[test]
    fn test_sites_are_ordered_and_disjoint() {
        let text = "\
queryRunner.query(`UPDATE a SET x = ${x}`);
queryRunner.query('SELECT 1');
queryRunner.query('DROP TABLE ' + name);
";
        let located = locate(text);
        assert_eq!(located.sites.len(), 2);
        assert!(located.sites[0].end <= located.sites[1].start);
        assert_eq!(located.sites[0].kind, CallKind::Interpolated);
        assert_eq!(located.sites[1].kind, CallKind::Concatenated);
    }

    #[test]
    fn test_paren_inside_template_does_not_close_argument() {
        let text = "queryRunner.query(`SELECT count(*) FROM t WHERE id = ${id}`);";
        let located = locate(text);
        assert_eq!(located.sites.len(), 1);
        assert_eq!(
            located.sites[0].arg,
            "`SELECT count(*) FROM t WHERE id = ${id}`"
        );
    }

    #[test]
    fn test_line_of() {
        let text = "a\nb\nc";
        assert_eq!(line_of(text, 0), 1);
        assert_eq!(line_of(text, 2), 2);
        assert_eq!(line_of(text, 4), 3);
    }
}
