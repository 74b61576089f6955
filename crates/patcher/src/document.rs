//! Reading and atomically rewriting a dialect's source file
//!
//! A [`SourceDocument`] is the full line sequence of one file. Lines keep
//! their own terminators so that anything a pass does not touch is written
//! back byte for byte.

use crate::error::PatchError;
use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Build `<basename>.<extension>`.
///
/// The extension is appended, never substituted: `kernel.v2` becomes
/// `kernel.v2.nvvm`, not `kernel.nvvm`.
pub fn document_path(basename: &Path, extension: &str) -> PathBuf {
    let mut name = OsString::from(basename.as_os_str());
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

/// Split a line into its content and its terminator (`"\n"`, `"\r\n"` or `""`)
pub fn split_terminator(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}

/// The ordered lines of one file on disk
#[derive(Debug, Clone)]
pub struct SourceDocument {
    path: PathBuf,
    lines: Vec<String>,
}

impl SourceDocument {
    /// Read the document at `path`.
    ///
    /// Returns `Ok(None)` when the file does not exist; not every dialect is
    /// produced by every build.
    pub fn open(path: &Path) -> Result<Option<Self>, PatchError> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(Some(Self::from_text(path, &content))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PatchError::io(path, e)),
        }
    }

    /// Build a document from text without touching the filesystem
    pub fn from_text(path: impl Into<PathBuf>, content: &str) -> Self {
        SourceDocument {
            path: path.into(),
            lines: content.split_inclusive('\n').map(str::to_string).collect(),
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn set_lines(&mut self, lines: Vec<String>) {
        self.lines = lines;
    }

    /// Replace the file on disk with the current lines.
    ///
    /// The content goes to a temporary file next to the real file, which is
    /// synced and then renamed over it. A symlinked path is resolved first so
    /// the link survives and its target receives the new content. If any
    /// step fails the temporary file is removed on drop and the original
    /// stays intact.
    pub fn write_atomic(&self) -> Result<(), PatchError> {
        let target = fs::canonicalize(&self.path).unwrap_or_else(|_| self.path.clone());
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| PatchError::io(dir, e))?;

        for line in &self.lines {
            tmp.write_all(line.as_bytes())
                .map_err(|e| PatchError::io(tmp.path(), e))?;
        }
        tmp.flush().map_err(|e| PatchError::io(tmp.path(), e))?;

        // NamedTempFile is created 0600; keep the original's mode instead
        if let Ok(meta) = fs::metadata(&target) {
            tmp.as_file()
                .set_permissions(meta.permissions())
                .map_err(|e| PatchError::io(tmp.path(), e))?;
        }
        tmp.as_file()
            .sync_all()
            .map_err(|e| PatchError::io(tmp.path(), e))?;

        tmp.persist(&target)
            .map_err(|e| PatchError::io(&target, e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_document_path_appends_extension() {
        assert_eq!(
            document_path(Path::new("out/kernel"), "nvvm"),
            PathBuf::from("out/kernel.nvvm")
        );
        assert_eq!(
            document_path(Path::new("kernel.v2"), "cu"),
            PathBuf::from("kernel.v2.cu")
        );
    }

    #[test]
    fn test_split_terminator() {
        assert_eq!(split_terminator("a = b;\n"), ("a = b;", "\n"));
        assert_eq!(split_terminator("a = b;\r\n"), ("a = b;", "\r\n"));
        assert_eq!(split_terminator("a = b;"), ("a = b;", ""));
        assert_eq!(split_terminator("\n"), ("", "\n"));
    }

    #[test]
    fn test_from_text_keeps_terminators() {
        let doc = SourceDocument::from_text("k.cl", "one\r\ntwo\nthree");
        assert_eq!(doc.lines(), &["one\r\n", "two\n", "three"]);
        assert_eq!(doc.lines().concat(), "one\r\ntwo\nthree");
    }

    #[test]
    fn test_empty_document() {
        let doc = SourceDocument::from_text("k.cl", "");
        assert!(doc.lines().is_empty());
    }

    #[test]
    fn test_open_missing_is_none() {
        let temp = tempdir().unwrap();
        let result = SourceDocument::open(&temp.path().join("absent.nvvm")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_write_atomic_replaces_content() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("k.nvvm");
        fs::write(&path, "old line\nsecond\n").unwrap();

        let mut doc = SourceDocument::open(&path).unwrap().unwrap();
        doc.set_lines(vec!["new\n".to_string()]);
        doc.write_atomic().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new\n");
        // No temporary files left behind
        let entries: Vec<_> = fs::read_dir(temp.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_atomic_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempdir().unwrap();
        let path = temp.path().join("k.cu");
        fs::write(&path, "x\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        let doc = SourceDocument::open(&path).unwrap().unwrap();
        doc.write_atomic().unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_atomic_through_symlink() {
        use std::os::unix::fs::symlink;

        let temp = tempdir().unwrap();
        let real = temp.path().join("real.nvvm");
        let link = temp.path().join("k.nvvm");
        fs::write(&real, "old\n").unwrap();
        symlink(&real, &link).unwrap();

        let mut doc = SourceDocument::open(&link).unwrap().unwrap();
        doc.set_lines(vec!["new\n".to_string()]);
        doc.write_atomic().unwrap();

        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_to_string(&real).unwrap(), "new\n");
        assert_eq!(fs::read_to_string(&link).unwrap(), "new\n");
    }

    #[test]
    fn test_open_non_utf8_is_io_error() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("k.cl");
        fs::write(&path, b"// caf\xe9\nx = magic_a_id(y);\n").unwrap();

        let err = SourceDocument::open(&path).unwrap_err();
        match err {
            PatchError::Io { source, .. } => {
                assert_eq!(source.kind(), io::ErrorKind::InvalidData)
            }
            other => panic!("Expected Io error, got {:?}", other),
        }
    }
}
