//! # parq — the parameterized-query rewriter
//!
//! > **Stop interpolating. Bind your data.**
//!
//! parq scans migration source files for dynamically-built query invocations
//! and rewrites them into parameterized form.
//!
//! ## Quick Example
//!
//! ```rust
//! let source = "await queryRunner.query(`UPDATE t SET a=${x} WHERE id=${id}`);";
//! let outcome = parq::rewrite(source, "queryRunner.query");
//!
//! assert_eq!(
//!     outcome.text,
//!     "await queryRunner.query(`UPDATE t SET a=$1 WHERE id=$2`, [x, id]);"
//! );
//! ```
//!
//! ## Recognized Shapes
//!
//! | Shape          | Before                          | After                              |
//! |----------------|---------------------------------|------------------------------------|
//! | Interpolated   | `` query(`… ${a} … ${b} …`) ``  | `` query(`… $1 … $2 …`, [a, b]) `` |
//! | Concatenated   | `query('… = ' + expr)`          | `query('… = $1', [expr])`          |
//!
//! Calls that already pass a parameter list, or contain no hole or
//! concatenation, are not candidates, so running parq twice changes nothing.
//! Call sites it cannot bound or re-serialize safely are skipped and
//! reported, never guessed at.

pub mod config;
pub mod error;
pub mod extract;
pub mod locator;
pub mod pipeline;
pub mod report;
pub mod rewrite;

pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::*;
    pub use crate::locator::{CallKind, CallSite, Locator};
    pub use crate::pipeline::Pipeline;
    pub use crate::report::{FileReport, RunReport, SkipKind, SkipNote};
    pub use crate::rewrite::{rewrite_site, rewrite_source, RewriteOutcome};
}

/// Rewrite one file's text, returning the new text plus what was rewritten
/// and what was skipped.
///
/// # Example
///
/// ```
/// let outcome = parq::rewrite("queryRunner.query('SELECT 1');", "queryRunner.query");
/// assert_eq!(outcome.rewritten, 0);
/// ```
pub fn rewrite(source: &str, call: &str) -> rewrite::RewriteOutcome {
    rewrite::rewrite_source(source, call)
}
