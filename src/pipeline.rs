//! File pipeline: locate → extract → rewrite → persist, per file.
//!
//! Files are independent units of work; a read or write failure on one file
//! is recorded and the run continues. Writes go through a temp file in the
//! same directory and are renamed into place, so an interrupted run never
//! leaves a half-written migration behind.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::config::Config;
use crate::error::{ParqError, ParqResult};
use crate::report::{FileReport, RunReport};
use crate::rewrite::rewrite_source;

/// One rewriting pass over a directory of migration source files.
pub struct Pipeline {
    target: PathBuf,
    config: Config,
}

impl Pipeline {
    pub fn new(target: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            target: target.into(),
            config,
        }
    }

    /// Eligible files in the target directory: extension match, non-recursive,
    /// sorted so reports are deterministic.
    pub fn eligible_files(&self) -> ParqResult<Vec<PathBuf>> {
        let want = self.config.ext_normalized();
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.target)? {
            let path = entry?.path();
            let matches = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext == want)
                .unwrap_or(false);
            if matches && path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Process every eligible file. Errs only when the target directory
    /// itself cannot be listed; per-file failures land in the report.
    pub fn run(&self) -> ParqResult<RunReport> {
        let mut report = RunReport::default();
        for path in self.eligible_files()? {
            report.files.push(self.process_file(&path));
        }
        Ok(report)
    }

    fn process_file(&self, path: &Path) -> FileReport {
        match self.rewrite_file(path) {
            Ok(report) => report,
            Err(e) => FileReport::failed(path.to_path_buf(), e.to_string()),
        }
    }

    fn rewrite_file(&self, path: &Path) -> ParqResult<FileReport> {
        let text = fs::read_to_string(path)?;
        let outcome = rewrite_source(&text, &self.config.call);
        let changed = outcome.text != text;
        if !self.config.dry_run {
            atomic_write(path, &outcome.text)?;
        }
        Ok(FileReport {
            file: path.to_path_buf(),
            rewritten: outcome.rewritten,
            skipped: outcome.skips,
            changed,
            error: None,
        })
    }
}

/// Write `contents` to a temp file beside `path`, then rename it into place.
fn atomic_write(path: &Path, contents: &str) -> ParqResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.persist(path).map_err(|e| ParqError::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_run_rewrites_eligible_files() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(
            dir.path(),
            "1713000000000-AddUsers.ts",
            "await queryRunner.query(`INSERT INTO users (name) VALUES (${name})`);\n",
        );
        write(dir.path(), "notes.md", "queryRunner.query(`x ${y}`)");

        let report = Pipeline::new(dir.path(), Config::default()).run().unwrap();

        assert_eq!(report.files.len(), 1);
        assert_eq!(report.rewritten(), 1);
        let rewritten = fs::read_to_string(&a).unwrap();
        assert_eq!(
            rewritten,
            "await queryRunner.query(`INSERT INTO users (name) VALUES ($1)`, [name]);\n"
        );
    }

    #[test]
    fn test_no_candidate_file_is_still_reported() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.ts", "queryRunner.query('SELECT 1');\n");

        let report = Pipeline::new(dir.path(), Config::default()).run().unwrap();

        assert_eq!(report.processed(), 1);
        assert_eq!(report.rewritten(), 0);
        assert!(!report.files[0].changed);
    }

    #[test]
    fn test_dry_run_leaves_files_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let original = "queryRunner.query(`DELETE FROM t WHERE id = ${id}`);\n";
        let path = write(dir.path(), "a.ts", original);

        let config = Config {
            dry_run: true,
            ..Config::default()
        };
        let report = Pipeline::new(dir.path(), config).run().unwrap();

        assert_eq!(report.rewritten(), 1);
        assert!(report.files[0].changed);
        assert_eq!(fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn test_second_run_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "a.ts",
            "queryRunner.query(`UPDATE t SET a=${x}, b=${y} WHERE id=${id}`);\n",
        );

        let pipeline = Pipeline::new(dir.path(), Config::default());
        pipeline.run().unwrap();
        let after_first = fs::read_to_string(&path).unwrap();
        assert_eq!(
            after_first,
            "queryRunner.query(`UPDATE t SET a=$1, b=$2 WHERE id=$3`, [x, y, id]);\n"
        );

        let second = pipeline.run().unwrap();
        assert_eq!(second.rewritten(), 0);
        assert_eq!(fs::read_to_string(&path).unwrap(), after_first);
    }

    #[test]
    fn test_unreadable_file_does_not_abort_the_run() {
        let dir = tempfile::tempdir().unwrap();
        // Invalid UTF-8 makes the read fail; the run must keep going.
        fs::write(dir.path().join("a.ts"), [0xffu8, 0xfe]).unwrap();
        write(dir.path(), "b.ts", "queryRunner.query(`SELECT ${x}`);\n");

        let report = Pipeline::new(dir.path(), Config::default()).run().unwrap();

        assert_eq!(report.files.len(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.rewritten(), 1);
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("nope");
        assert!(Pipeline::new(&gone, Config::default()).run().is_err());
    }
}
