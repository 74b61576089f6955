//! IR Patcher Library
//!
//! Resolves placeholder "magic" identity functions in the IR and kernel
//! source emitted by a device-kernel compiler, so the artifacts can be handed
//! to a runtime or linker.
//!
//! Four dialects are understood (see [`Dialect`]):
//!
//! - `ir-plain` / `ir-tagged`: `declare T @magic_*_id(T)` becomes an identity
//!   definition, and attribute groups and their `#N` references are stripped.
//!   On `ir-plain` a second pass replaces configured builtin declarations.
//! - `c-style-a` / `c-style-b`: `x = magic_*_id(y);` is inlined to `x = y;`.
//!
//! ```rust,ignore
//! use irpatch::{Dialect, Patcher, PatcherConfig};
//!
//! let patcher = Patcher::new(PatcherConfig::default());
//! let report = patcher.patch(Dialect::IrPlain, Path::new("build/kernel"))?;
//! println!("{} magic IDs patched", report.patched_magic_ids.len());
//! ```
//!
//! The file is rewritten only after every pass has succeeded in memory, via a
//! temporary file renamed over the original.

pub mod config;
pub mod dialect;
pub mod document;
pub mod error;
pub mod grammar;
pub mod passes;

pub use config::{BuiltinOverrideTable, ExtensionMap, PatcherConfig};
pub use dialect::{Dialect, DialectFamily};
pub use document::SourceDocument;
pub use error::PatchError;
pub use passes::PassOutput;

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// What happened to the target file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchStatus {
    /// The file does not exist; nothing was done
    Missing,
    /// The file was read but no pass changed it, so it was not rewritten
    Unchanged,
    /// The file was replaced with patched content
    Rewritten,
}

/// Summary of one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchReport {
    pub dialect: Dialect,
    pub path: PathBuf,
    pub status: PatchStatus,
    pub patched_magic_ids: Vec<String>,
    pub attribute_blocks_removed: usize,
    pub overrides_applied: Vec<String>,
}

impl PatchReport {
    fn new(dialect: Dialect, path: PathBuf, status: PatchStatus) -> Self {
        PatchReport {
            dialect,
            path,
            status,
            patched_magic_ids: Vec::new(),
            attribute_blocks_removed: 0,
            overrides_applied: Vec::new(),
        }
    }

    fn absorb(&mut self, pass: PassOutput) -> Vec<String> {
        self.patched_magic_ids.extend(pass.patched_magic_ids);
        self.attribute_blocks_removed += pass.attribute_blocks_removed;
        self.overrides_applied.extend(pass.overrides_applied);
        if pass.changed {
            self.status = PatchStatus::Rewritten;
        }
        pass.lines
    }
}

/// Runs the passes for a dialect over `<basename>.<ext>`
#[derive(Debug, Clone, Default)]
pub struct Patcher {
    config: PatcherConfig,
}

impl Patcher {
    pub fn new(config: PatcherConfig) -> Self {
        Patcher { config }
    }

    /// Path of the file `patch` would operate on
    pub fn target_path(&self, dialect: Dialect, basename: &Path) -> PathBuf {
        document::document_path(basename, self.config.extensions.get(dialect))
    }

    /// Patch by dialect tag.
    ///
    /// Returns `Ok(None)` for an unrecognized tag; that is not an error.
    pub fn patch_tag(&self, tag: &str, basename: &Path) -> Result<Option<PatchReport>, PatchError> {
        match Dialect::from_tag(tag) {
            Some(dialect) => self.patch(dialect, basename).map(Some),
            None => {
                debug!("Unrecognized dialect '{}', nothing to patch", tag);
                Ok(None)
            }
        }
    }

    /// Patch `<basename>.<ext>` for `dialect`.
    ///
    /// A missing file yields [`PatchStatus::Missing`]. On error the file is
    /// left exactly as it was.
    pub fn patch(&self, dialect: Dialect, basename: &Path) -> Result<PatchReport, PatchError> {
        let path = self.target_path(dialect, basename);
        let Some(mut doc) = SourceDocument::open(&path)? else {
            debug!("{} not found, skipping", path.display());
            return Ok(PatchReport::new(dialect, path, PatchStatus::Missing));
        };

        let mut report = PatchReport::new(dialect, path, PatchStatus::Unchanged);
        let lines = self.apply(dialect, doc.lines(), &mut report)?;

        if report.status == PatchStatus::Rewritten {
            doc.set_lines(lines);
            doc.write_atomic()?;
            debug!("Rewrote {}", report.path.display());
        }
        Ok(report)
    }

    /// Run every pass for `dialect` over in-memory lines
    pub fn apply(
        &self,
        dialect: Dialect,
        lines: &[String],
        report: &mut PatchReport,
    ) -> Result<Vec<String>, PatchError> {
        let mut lines = match dialect.family() {
            DialectFamily::Ir => {
                let cc = dialect
                    .is_tagged()
                    .then_some(self.config.calling_convention.as_str());
                report.absorb(passes::ir::resolve(lines, cc)?)
            }
            DialectFamily::Kernel => report.absorb(passes::kernel::resolve(lines)),
        };

        if dialect.applies_builtin_overrides() {
            lines = report.absorb(passes::overrides::inject(&lines, &self.config.overrides));
            for name in self.config.overrides.names() {
                if !report.overrides_applied.iter().any(|applied| applied == name) {
                    warn!("Builtin override {} matched no declaration", name);
                }
            }
        }
        Ok(lines)
    }

    /// Patch a document held in memory, returning the new text
    pub fn patch_text(&self, dialect: Dialect, text: &str) -> Result<(String, PatchReport), PatchError> {
        let doc = SourceDocument::from_text(PathBuf::new(), text);
        let mut report = PatchReport::new(dialect, PathBuf::new(), PatchStatus::Unchanged);
        let lines = self.apply(dialect, doc.lines(), &mut report)?;
        Ok((lines.concat(), report))
    }
}
