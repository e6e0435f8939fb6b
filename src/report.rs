//! Run records: what was rewritten, what was skipped, what failed.

use serde::Serialize;
use std::path::PathBuf;

/// Why a call site was left unmodified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipKind {
    /// The argument could not be bounded (unbalanced delimiters).
    UnboundedSpan,
    /// Dynamic, but not one of the two rewritable shapes.
    UnsupportedShape,
}

impl std::fmt::Display for SkipKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipKind::UnboundedSpan => write!(f, "unbounded-span"),
            SkipKind::UnsupportedShape => write!(f, "unsupported-shape"),
        }
    }
}

/// One skipped call site, reported with its line in the source file.
#[derive(Debug, Clone, Serialize)]
pub struct SkipNote {
    pub line: usize,
    pub kind: SkipKind,
    pub message: String,
}

/// Outcome for one processed file.
#[derive(Debug, Serialize)]
pub struct FileReport {
    pub file: PathBuf,
    pub rewritten: usize,
    pub skipped: Vec<SkipNote>,
    pub changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileReport {
    /// Report for a file whose read or write failed.
    pub fn failed(file: PathBuf, error: String) -> Self {
        Self {
            file,
            rewritten: 0,
            skipped: Vec::new(),
            changed: false,
            error: Some(error),
        }
    }
}

/// Outcome for a whole run, one entry per visited file.
#[derive(Debug, Default, Serialize)]
pub struct RunReport {
    pub files: Vec<FileReport>,
}

impl RunReport {
    /// Files visited without an I/O failure.
    pub fn processed(&self) -> usize {
        self.files.iter().filter(|f| f.error.is_none()).count()
    }

    /// Call sites rewritten across all files.
    pub fn rewritten(&self) -> usize {
        self.files.iter().map(|f| f.rewritten).sum()
    }

    /// Call sites skipped across all files.
    pub fn skipped(&self) -> usize {
        self.files.iter().map(|f| f.skipped.len()).sum()
    }

    /// Files that failed to read or write.
    pub fn failed(&self) -> usize {
        self.files.len() - self.processed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counters() {
        let mut report = RunReport::default();
        report.files.push(FileReport {
            file: "a.ts".into(),
            rewritten: 2,
            skipped: vec![SkipNote {
                line: 3,
                kind: SkipKind::UnsupportedShape,
                message: "more than one concatenated segment".to_string(),
            }],
            changed: true,
            error: None,
        });
        report.files.push(FileReport::failed("b.ts".into(), "denied".to_string()));

        assert_eq!(report.processed(), 1);
        assert_eq!(report.rewritten(), 2);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.failed(), 1);
    }

    #[test]
    fn test_json_shape() {
        let note = SkipNote {
            line: 7,
            kind: SkipKind::UnboundedSpan,
            message: "unbalanced".to_string(),
        };
        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(json["kind"], "unbounded-span");
        assert_eq!(json["line"], 7);
    }
}
