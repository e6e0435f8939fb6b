//! Rewriter: turns located call sites into parameterized invocations.
//!
//! Each rewrite is a pure function of one call site's extraction result, and
//! candidate spans never overlap, so replacements can be spliced back by
//! offset in any order.

use crate::error::{ParqError, ParqResult};
use crate::extract::{extract_concatenation, extract_interpolations};
use crate::locator::{line_of, CallKind, CallSite, Locator};
use crate::report::{SkipKind, SkipNote};

/// Result of rewriting one file's text in memory.
#[derive(Debug)]
pub struct RewriteOutcome {
    pub text: String,
    pub rewritten: usize,
    pub skips: Vec<SkipNote>,
}

/// Build the replacement text for one call site:
/// `callee(<query-with-placeholders>, [<arg1>, <arg2>, …])`.
///
/// The query keeps the original quoting style, and argument order matches
/// placeholder numbering exactly. Returns `Ok(None)` for the defensive case
/// of an interpolated site without holes, which is left untouched.
pub fn rewrite_site(site: &CallSite) -> ParqResult<Option<String>> {
    match site.kind {
        CallKind::Interpolated => {
            let parts = extract_interpolations(template_body(&site.arg))?;
            if parts.holes.is_empty() {
                return Ok(None);
            }
            let args: Vec<&str> = parts.holes.iter().map(|h| h.expr.as_str()).collect();
            Ok(Some(format!(
                "{}(`{}`, [{}])",
                site.callee,
                parts.query,
                args.join(", ")
            )))
        }
        CallKind::Concatenated => {
            let parts = extract_concatenation(&site.arg)?;
            Ok(Some(format!(
                "{callee}({q}{literal}$1{q}, [{expr}])",
                callee = site.callee,
                q = parts.quote,
                literal = parts.literal,
                expr = parts.expr,
            )))
        }
    }
}

/// Rewrite every candidate call site in `text`: locate, rewrite or skip each
/// site, then splice all replacements into the original in a single pass.
pub fn rewrite_source(text: &str, call: &str) -> RewriteOutcome {
    let located = Locator::new(call).locate(text);

    let mut skips: Vec<SkipNote> = located
        .skips
        .iter()
        .map(|s| SkipNote {
            line: line_of(text, s.position),
            kind: s.kind,
            message: s.message.clone(),
        })
        .collect();

    let mut out = String::with_capacity(text.len());
    let mut rewritten = 0;
    let mut cursor = 0;

    for site in &located.sites {
        match rewrite_site(site) {
            Ok(Some(replacement)) => {
                out.push_str(&text[cursor..site.start]);
                out.push_str(&replacement);
                cursor = site.end;
                rewritten += 1;
            }
            Ok(None) => {}
            Err(e) => skips.push(SkipNote {
                line: line_of(text, site.start),
                kind: match e {
                    ParqError::UnboundedSpan { .. } => SkipKind::UnboundedSpan,
                    _ => SkipKind::UnsupportedShape,
                },
                message: e.detail(),
            }),
        }
    }
    out.push_str(&text[cursor..]);
    skips.sort_by_key(|s| s.line);

    RewriteOutcome {
        text: out,
        rewritten,
        skips,
    }
}

/// Template body without its enclosing backticks.
fn template_body(arg: &str) -> &str {
    let trimmed = arg.trim();
    trimmed
        .strip_prefix('`')
        .and_then(|s| s.strip_suffix('`'))
        .unwrap_or(trimmed)
}
