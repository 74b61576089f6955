//! Rewrite passes
//!
//! Every pass is a pure function from a line slice to a [`PassOutput`]; none
//! of them touch the filesystem. Lines carry their own terminators.
//!
//! - [`ir`] - magic-ID definitions and attribute stripping for LLVM-like IR
//! - [`kernel`] - magic-ID call inlining for C-like kernel source
//! - [`overrides`] - builtin declaration replacement for plain IR

pub mod ir;
pub mod kernel;
pub mod overrides;

/// Result of running one pass over a document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassOutput {
    pub lines: Vec<String>,
    /// Whether `lines` differs from the input
    pub changed: bool,
    /// Magic ID names resolved, in document order
    pub patched_magic_ids: Vec<String>,
    pub attribute_blocks_removed: usize,
    /// Builtin names whose declarations were replaced, in document order
    pub overrides_applied: Vec<String>,
}

impl PassOutput {
    fn with_capacity(n: usize) -> Self {
        PassOutput {
            lines: Vec::with_capacity(n),
            ..Default::default()
        }
    }

    /// Output that reproduces the input exactly
    fn unchanged(lines: &[String]) -> Self {
        PassOutput {
            lines: lines.to_vec(),
            ..Default::default()
        }
    }
}
